//! Shared utilities for the musubi matching server.
//!
//! Cross-cutting concerns that do not belong to any single layer:
//! logging setup and time handling.

pub mod logger;
pub mod time;
