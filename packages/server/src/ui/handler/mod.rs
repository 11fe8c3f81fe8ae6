//! Request handlers.

pub mod http;
pub mod websocket;

pub use http::{debug_queue_state, debug_session_state, health_check};
pub use websocket::websocket_handler;
