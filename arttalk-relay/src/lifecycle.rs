//! Connection lifecycle: open, inbound frame, close, and shutdown.
//!
//! [`RelayCore`] owns the connection registry and room store. Each method is
//! one complete relay step; the server runs every step under a single lock,
//! so steps never interleave.

use arttalk_proto::chat::{self, ChatFrame, FrameError};
use arttalk_proto::notice::Notice;
use axum::extract::ws::{CloseFrame, Message, Utf8Bytes, close_code};
use tokio::sync::mpsc;

use crate::broadcast::{self, BroadcastReport};
use crate::registry::{ConnectionId, ConnectionRegistry};
use crate::rooms::RoomStore;
use crate::router::{self, Binding};

/// Default maximum accepted inbound frame size in bytes (64 KB).
pub const DEFAULT_MAX_FRAME_SIZE: usize = 64 * 1024;

/// Close reason sent to every connection on shutdown.
pub const SHUTDOWN_REASON: &str = "Server shutting down";

/// What happened to one inbound frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Dispatch {
    /// The frame was relayed to the sender's room.
    Relayed {
        /// The room the frame was fanned out to.
        room_id: String,
        /// Per-recipient outcome.
        report: BroadcastReport,
    },
    /// The frame parsed but its type is not relayed.
    Ignored {
        /// The room the connection is bound to.
        room_id: String,
    },
    /// The frame was rejected and an `error` notice was sent back.
    Rejected,
    /// The connection is not registered.
    UnknownConnection,
}

/// Relay state for one process: every connection and every room.
#[derive(Debug)]
pub struct RelayCore {
    connections: ConnectionRegistry,
    rooms: RoomStore,
    max_frame_size: usize,
    closing: bool,
}

impl Default for RelayCore {
    fn default() -> Self {
        Self::new()
    }
}

impl RelayCore {
    /// Creates an empty relay with the default frame size limit.
    #[must_use]
    pub fn new() -> Self {
        Self::with_max_frame_size(DEFAULT_MAX_FRAME_SIZE)
    }

    /// Creates an empty relay with a custom frame size limit.
    #[must_use]
    pub fn with_max_frame_size(max_frame_size: usize) -> Self {
        Self {
            connections: ConnectionRegistry::new(),
            rooms: RoomStore::new(),
            max_frame_size,
            closing: false,
        }
    }

    /// Read access to the room store.
    #[must_use]
    pub const fn rooms(&self) -> &RoomStore {
        &self.rooms
    }

    /// Read access to the connection registry.
    #[must_use]
    pub const fn connections(&self) -> &ConnectionRegistry {
        &self.connections
    }

    /// Registers a new connection and sends it the welcome notice.
    ///
    /// The connection starts unbound; it joins a room with its first frame.
    /// Once [`Self::close_all`] has run, new connections are sent the
    /// going-away close frame right after the welcome.
    pub fn open(
        &mut self,
        path: impl Into<String>,
        outbound: mpsc::UnboundedSender<Message>,
    ) -> ConnectionId {
        let id = self.connections.insert(path, outbound);
        self.send_notice(id, &Notice::welcome());
        tracing::info!(conn_id = %id, "connection opened");
        if self.closing
            && let Some(connection) = self.connections.get_mut(id)
        {
            connection.begin_close(going_away());
        }
        id
    }

    /// Handles one inbound text frame from `conn`.
    pub fn inbound_text(&mut self, conn: ConnectionId, text: &str) -> Dispatch {
        if self.connections.get(conn).is_none() {
            return Dispatch::UnknownConnection;
        }
        match chat::decode_bounded(text, self.max_frame_size) {
            Ok(frame) => self.dispatch(conn, frame),
            Err(e) => self.reject(conn, &e),
        }
    }

    /// Handles one inbound binary frame from `conn`.
    ///
    /// Binary frames carrying UTF-8 text are handled like text frames.
    pub fn inbound_binary(&mut self, conn: ConnectionId, bytes: &[u8]) -> Dispatch {
        if self.connections.get(conn).is_none() {
            return Dispatch::UnknownConnection;
        }
        match chat::text_from_binary(bytes) {
            Ok(text) => self.inbound_text(conn, text),
            Err(e) => self.reject(conn, &e),
        }
    }

    /// Removes a closed connection from its room and from the registry.
    ///
    /// Remaining room members are not notified. Returns the room the
    /// connection was bound to, if any.
    pub fn close(&mut self, conn: ConnectionId) -> Option<String> {
        let room_id = router::unbind(&mut self.rooms, &mut self.connections, conn);
        if self.connections.remove(conn).is_some() {
            tracing::info!(conn_id = %conn, room_id = ?room_id, "connection closed");
        }
        room_id
    }

    /// Sends a going-away close frame to every open connection.
    ///
    /// Connections stay registered until their sockets finish closing.
    /// Returns how many close frames were queued.
    pub fn close_all(&mut self) -> usize {
        self.closing = true;
        let mut closed = 0;
        for connection in self.connections.iter_mut() {
            if connection.begin_close(going_away()) {
                tracing::info!(conn_id = %connection.id(), "sending close frame to connection");
                closed += 1;
            }
        }
        closed
    }

    fn dispatch(&mut self, conn: ConnectionId, frame: ChatFrame) -> Dispatch {
        let Some(binding) = router::bind(&mut self.rooms, &mut self.connections, conn) else {
            return Dispatch::UnknownConnection;
        };
        if let Binding::Joined { room_id } | Binding::Moved { to: room_id, .. } = &binding {
            tracing::info!(conn_id = %conn, room_id = %room_id, "connection joined room");
        }
        let room_id = binding.room_id().to_string();

        if !frame.kind.is_relayed() {
            tracing::debug!(
                conn_id = %conn,
                frame_type = ?frame.kind.as_tag(),
                "ignoring frame of unhandled type"
            );
            return Dispatch::Ignored { room_id };
        }

        tracing::debug!(
            conn_id = %conn,
            room_id = %room_id,
            frame_type = ?frame.kind,
            sender = ?frame.sender,
            "relaying frame"
        );

        let text = Utf8Bytes::from(frame.into_raw());
        let report = broadcast::broadcast(&self.rooms, &self.connections, &room_id, &text, Some(conn));
        if report.has_failures() {
            self.prune(&room_id, &report.failed);
        }
        Dispatch::Relayed { room_id, report }
    }

    /// Drops unreachable members from a room and unbinds them.
    fn prune(&mut self, room_id: &str, failed: &[ConnectionId]) {
        let pruned = self.rooms.prune(room_id, failed);
        for &conn in failed {
            if let Some(connection) = self.connections.get_mut(conn)
                && connection.room() == Some(room_id)
            {
                connection.set_room(None);
            }
        }
        tracing::info!(room_id = %room_id, count = pruned, "pruned unreachable members");
    }

    fn reject(&self, conn: ConnectionId, error: &FrameError) -> Dispatch {
        tracing::warn!(conn_id = %conn, error = %error, "rejecting malformed frame");
        self.send_notice(conn, &Notice::invalid_format());
        Dispatch::Rejected
    }

    fn send_notice(&self, conn: ConnectionId, notice: &Notice) {
        let text = match notice.encode() {
            Ok(t) => t,
            Err(e) => {
                tracing::error!(error = %e, "failed to encode notice");
                return;
            }
        };
        if let Err(e) = self.connections.send_to(conn, Message::Text(text.into())) {
            tracing::debug!(conn_id = %conn, error = %e, "notice not delivered");
        }
    }
}

fn going_away() -> Message {
    Message::Close(Some(CloseFrame {
        code: close_code::AWAY,
        reason: Utf8Bytes::from_static(SHUTDOWN_REASON),
    }))
}
