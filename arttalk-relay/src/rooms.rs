//! Room store for the relay server.
//!
//! Maps a room identifier (an artwork id, or `"general"`) to the set of
//! connections discussing it. Rooms are created on first join and removed as
//! soon as their last member leaves, so every room in the store has at least
//! one member between relay operations.
//!
//! Room entries are ephemeral: lost on relay restart, same as connections.

use std::collections::{BTreeSet, HashMap};

use crate::registry::ConnectionId;

/// One discussion room and its current members.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Room {
    id: String,
    members: BTreeSet<ConnectionId>,
}

impl Room {
    fn new(id: &str) -> Self {
        Self {
            id: id.to_string(),
            members: BTreeSet::new(),
        }
    }

    /// The room identifier.
    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Member handles in ascending order.
    pub fn members(&self) -> impl Iterator<Item = ConnectionId> + '_ {
        self.members.iter().copied()
    }

    /// Whether `conn` is a member.
    #[must_use]
    pub fn contains(&self, conn: ConnectionId) -> bool {
        self.members.contains(&conn)
    }

    /// Number of members.
    #[must_use]
    pub fn len(&self) -> usize {
        self.members.len()
    }

    /// Whether the room has no members.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    /// Adds a member, returning `false` if it was already present.
    pub fn insert(&mut self, conn: ConnectionId) -> bool {
        self.members.insert(conn)
    }

    /// Removes a member, returning `false` if it was not present.
    pub fn remove(&mut self, conn: ConnectionId) -> bool {
        self.members.remove(&conn)
    }
}

/// Result of removing a connection from a room.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LeaveOutcome {
    /// The room or the membership did not exist.
    NotMember,
    /// The connection left; other members remain.
    Left,
    /// The connection was the last member and the room was deleted.
    RoomDeleted,
}

/// In-memory store of all rooms.
///
/// Owned by [`crate::lifecycle::RelayCore`]; independent stores never share
/// state.
#[derive(Debug, Default)]
pub struct RoomStore {
    rooms: HashMap<String, Room>,
}

impl RoomStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the room with this id, creating and registering an empty one
    /// if it does not exist yet.
    ///
    /// Callers must add a member before releasing the store, see [`Self::join`].
    pub fn get_or_create(&mut self, room_id: &str) -> &mut Room {
        self.rooms
            .entry(room_id.to_string())
            .or_insert_with(|| Room::new(room_id))
    }

    /// Deletes a room entry. No-op if the room is absent.
    pub fn remove(&mut self, room_id: &str) -> bool {
        self.rooms.remove(room_id).is_some()
    }

    /// Looks up a room.
    #[must_use]
    pub fn get(&self, room_id: &str) -> Option<&Room> {
        self.rooms.get(room_id)
    }

    /// Adds `conn` to a room, creating the room if needed.
    ///
    /// Returns `false` if `conn` was already a member.
    pub fn join(&mut self, room_id: &str, conn: ConnectionId) -> bool {
        self.get_or_create(room_id).insert(conn)
    }

    /// Removes `conn` from a room, deleting the room if it becomes empty.
    pub fn leave(&mut self, room_id: &str, conn: ConnectionId) -> LeaveOutcome {
        let Some(room) = self.rooms.get_mut(room_id) else {
            return LeaveOutcome::NotMember;
        };
        if !room.remove(conn) {
            return LeaveOutcome::NotMember;
        }
        if room.is_empty() {
            self.remove(room_id);
            LeaveOutcome::RoomDeleted
        } else {
            LeaveOutcome::Left
        }
    }

    /// Removes every connection in `conns` from a room, deleting the room if
    /// it becomes empty. Returns how many were actually members.
    pub fn prune(&mut self, room_id: &str, conns: &[ConnectionId]) -> usize {
        conns
            .iter()
            .filter(|&&conn| self.leave(room_id, conn) != LeaveOutcome::NotMember)
            .count()
    }

    /// Whether a room with this id exists.
    #[must_use]
    pub fn contains(&self, room_id: &str) -> bool {
        self.rooms.contains_key(room_id)
    }

    /// Number of rooms.
    #[must_use]
    pub fn len(&self) -> usize {
        self.rooms.len()
    }

    /// Whether the store holds no rooms.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rooms.is_empty()
    }

    /// Iterates over all rooms, in no particular order.
    pub fn iter(&self) -> impl Iterator<Item = &Room> {
        self.rooms.values()
    }
}
