//! Connection registry: an arena of live WebSocket connections.
//!
//! Each connection is addressed by a [`ConnectionId`] handed out at open
//! time. Rooms hold these handles instead of transport references, so the
//! registry stays the single owner of every outbound channel.

use std::collections::HashMap;
use std::fmt;

use axum::extract::ws::Message;
use tokio::sync::mpsc;

/// Stable handle for a connection, unique for the lifetime of a registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ConnectionId(u64);

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "conn-{}", self.0)
    }
}

/// Whether a connection still accepts outbound frames.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportState {
    /// Frames are delivered.
    Open,
    /// A close frame has been queued; nothing else is sent.
    Closing,
}

/// Error returned when a frame cannot be queued for a connection.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum DeliveryError {
    /// No connection with that handle is registered.
    #[error("connection {0} is not registered")]
    UnknownConnection(ConnectionId),
    /// The connection is closing and accepts no further frames.
    #[error("connection {0} is closing")]
    Closing(ConnectionId),
    /// The socket writer has gone away.
    #[error("connection {0} has closed its transport")]
    ChannelClosed(ConnectionId),
}

/// A live client connection.
#[derive(Debug)]
pub struct Connection {
    id: ConnectionId,
    path: String,
    room: Option<String>,
    outbound: mpsc::UnboundedSender<Message>,
    state: TransportState,
}

impl Connection {
    /// The connection's handle.
    #[must_use]
    pub const fn id(&self) -> ConnectionId {
        self.id
    }

    /// The request path the connection was opened on.
    #[must_use]
    pub fn path(&self) -> &str {
        &self.path
    }

    /// The room the connection is currently bound to, if any.
    #[must_use]
    pub fn room(&self) -> Option<&str> {
        self.room.as_deref()
    }

    /// Current transport state.
    #[must_use]
    pub const fn state(&self) -> TransportState {
        self.state
    }

    /// Whether broadcasts should still be delivered to this connection.
    #[must_use]
    pub fn is_open(&self) -> bool {
        self.state == TransportState::Open && !self.outbound.is_closed()
    }

    pub(crate) fn set_room(&mut self, room: Option<String>) -> Option<String> {
        std::mem::replace(&mut self.room, room)
    }

    /// Queues a frame on the connection's writer channel.
    ///
    /// # Errors
    ///
    /// Returns [`DeliveryError::Closing`] once the connection is closing, or
    /// [`DeliveryError::ChannelClosed`] if the writer task has exited.
    pub fn send(&self, msg: Message) -> Result<(), DeliveryError> {
        if self.state == TransportState::Closing {
            return Err(DeliveryError::Closing(self.id));
        }
        self.outbound
            .send(msg)
            .map_err(|_| DeliveryError::ChannelClosed(self.id))
    }

    /// Queues a close frame and stops accepting further frames.
    ///
    /// Returns `false` if the connection was already closing or its writer
    /// had already exited.
    pub fn begin_close(&mut self, frame: Message) -> bool {
        if self.state == TransportState::Closing {
            return false;
        }
        self.state = TransportState::Closing;
        self.outbound.send(frame).is_ok()
    }
}

/// Arena of live connections keyed by [`ConnectionId`].
#[derive(Debug, Default)]
pub struct ConnectionRegistry {
    connections: HashMap<ConnectionId, Connection>,
    next_id: u64,
}

impl ConnectionRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a new, unbound connection and returns its handle.
    pub fn insert(
        &mut self,
        path: impl Into<String>,
        outbound: mpsc::UnboundedSender<Message>,
    ) -> ConnectionId {
        self.next_id += 1;
        let id = ConnectionId(self.next_id);
        self.connections.insert(
            id,
            Connection {
                id,
                path: path.into(),
                room: None,
                outbound,
                state: TransportState::Open,
            },
        );
        id
    }

    /// Removes a connection, returning it if it was registered.
    pub fn remove(&mut self, id: ConnectionId) -> Option<Connection> {
        self.connections.remove(&id)
    }

    /// Looks up a connection.
    #[must_use]
    pub fn get(&self, id: ConnectionId) -> Option<&Connection> {
        self.connections.get(&id)
    }

    /// Looks up a connection for mutation.
    pub fn get_mut(&mut self, id: ConnectionId) -> Option<&mut Connection> {
        self.connections.get_mut(&id)
    }

    /// Queues a frame for a single connection.
    ///
    /// # Errors
    ///
    /// Returns [`DeliveryError::UnknownConnection`] for an unregistered
    /// handle, otherwise the errors of [`Connection::send`].
    pub fn send_to(&self, id: ConnectionId, msg: Message) -> Result<(), DeliveryError> {
        self.connections
            .get(&id)
            .ok_or(DeliveryError::UnknownConnection(id))?
            .send(msg)
    }

    /// Number of registered connections.
    #[must_use]
    pub fn len(&self) -> usize {
        self.connections.len()
    }

    /// Whether no connections are registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.connections.is_empty()
    }

    /// Iterates over connections for mutation, in no particular order.
    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut Connection> {
        self.connections.values_mut()
    }
}
