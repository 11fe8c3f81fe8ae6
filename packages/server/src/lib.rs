//! Mood-based pair matching and WebRTC signaling server library.
//!
//! Pairs anonymous users two at a time by self-reported mood and relays
//! WebRTC session negotiation (offer/answer/ICE) between the matched pair.
//! Media never passes through this server.

// layers
pub mod domain;
pub mod infrastructure;
pub mod ui;
pub mod usecase;

// matching scheduler (periodic + on-demand trigger)
pub mod scheduler;
