//! Data Transfer Objects (DTOs) for the matching server.
//!
//! DTOs are organized by protocol:
//! - `websocket`: WebSocket message DTOs (inbound client events and outbound
//!   notifications)

pub mod websocket;
