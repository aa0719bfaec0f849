//! Shared protocol definitions for the Art Talks wire format.
//!
//! Chat traffic is UTF-8 JSON over WebSocket text frames. Inbound chat frames
//! are relayed verbatim, so [`chat`] only extracts the routing metadata it
//! needs; [`notice`] builds the relay's own `system` and `error` frames.

pub mod artwork;
pub mod chat;
pub mod notice;
