//! Art Talks relay server library.
//!
//! Exposes the relay server for use in tests and embedding. Clients open a
//! WebSocket on a path naming an artwork room, and every chat frame they send
//! is relayed verbatim to the other members of that room. The same server
//! answers the read-only artwork catalog API.

pub mod api;
pub mod broadcast;
pub mod catalog;
pub mod config;
pub mod lifecycle;
pub mod registry;
pub mod relay;
pub mod rooms;
pub mod router;
