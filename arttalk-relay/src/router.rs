//! Room routing: which room an inbound frame belongs to.
//!
//! The room is the final segment of the path the connection was opened on
//! (`/chat/7` is room `"7"`), or [`DEFAULT_ROOM`] when that segment is empty.
//! It is recomputed for every inbound frame and membership is moved whenever
//! the result differs from the connection's current room.

use crate::registry::{ConnectionId, ConnectionRegistry};
use crate::rooms::{LeaveOutcome, RoomStore};

/// Room used when the request path names none.
pub const DEFAULT_ROOM: &str = "general";

/// Derives a room identifier from a request path.
///
/// Any query string is ignored. The segment is used as-is, without percent
/// decoding.
#[must_use]
pub fn room_id_from_path(path: &str) -> &str {
    let path = path.split_once('?').map_or(path, |(p, _)| p);
    match path.rsplit('/').next() {
        Some(segment) if !segment.is_empty() => segment,
        _ => DEFAULT_ROOM,
    }
}

/// How a connection's membership changed after routing a frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Binding {
    /// Already a member of the target room.
    Unchanged {
        /// The current room.
        room_id: String,
    },
    /// First frame on an unbound connection.
    Joined {
        /// The room joined.
        room_id: String,
    },
    /// Moved from one room to another.
    Moved {
        /// The room left.
        from: String,
        /// The room joined.
        to: String,
        /// Whether the old room was deleted because it became empty.
        from_deleted: bool,
    },
}

impl Binding {
    /// The room the connection is bound to after routing.
    #[must_use]
    pub fn room_id(&self) -> &str {
        match self {
            Self::Unchanged { room_id } | Self::Joined { room_id } => room_id,
            Self::Moved { to, .. } => to,
        }
    }
}

/// Binds `conn` to the room implied by its request path.
///
/// Returns `None` if `conn` is not registered.
pub fn bind(
    rooms: &mut RoomStore,
    connections: &mut ConnectionRegistry,
    conn: ConnectionId,
) -> Option<Binding> {
    let connection = connections.get_mut(conn)?;
    let target = room_id_from_path(connection.path()).to_string();

    if connection.room() == Some(target.as_str()) {
        return Some(Binding::Unchanged { room_id: target });
    }

    let previous = connection.set_room(Some(target.clone()));
    let binding = match previous {
        Some(from) => {
            let from_deleted = rooms.leave(&from, conn) == LeaveOutcome::RoomDeleted;
            Binding::Moved {
                from,
                to: target.clone(),
                from_deleted,
            }
        }
        None => Binding::Joined {
            room_id: target.clone(),
        },
    };
    rooms.join(&target, conn);

    tracing::debug!(conn_id = %conn, binding = ?binding, "connection bound to room");
    Some(binding)
}

/// Removes `conn` from its bound room and marks it unbound.
///
/// Returns the room it was bound to, if any.
pub fn unbind(
    rooms: &mut RoomStore,
    connections: &mut ConnectionRegistry,
    conn: ConnectionId,
) -> Option<String> {
    let room_id = connections.get_mut(conn)?.set_room(None)?;
    rooms.leave(&room_id, conn);
    Some(room_id)
}
