//! Room broadcast fan-out.
//!
//! [`broadcast`] only reads relay state. Recipients that could not be
//! reached are returned in the [`BroadcastReport`] and the caller prunes
//! them from the room.

use axum::extract::ws::{Message, Utf8Bytes};

use crate::registry::{ConnectionId, ConnectionRegistry, DeliveryError, TransportState};
use crate::rooms::RoomStore;

/// Outcome of a single broadcast.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BroadcastReport {
    /// Members the frame was queued for, in delivery order.
    pub delivered: Vec<ConnectionId>,
    /// Members that are no longer reachable.
    pub failed: Vec<ConnectionId>,
}

impl BroadcastReport {
    /// Whether any recipient failed.
    #[must_use]
    pub fn has_failures(&self) -> bool {
        !self.failed.is_empty()
    }
}

/// Delivers `frame` to every open member of `room_id` except `exclude`.
///
/// An absent room yields an empty report. Members whose connection is
/// closing are skipped without being reported; members whose writer has gone
/// away, or that are no longer registered, are reported as failed and the
/// fan-out continues with the rest.
pub fn broadcast(
    rooms: &RoomStore,
    connections: &ConnectionRegistry,
    room_id: &str,
    frame: &Utf8Bytes,
    exclude: Option<ConnectionId>,
) -> BroadcastReport {
    let mut report = BroadcastReport::default();
    let Some(room) = rooms.get(room_id) else {
        return report;
    };

    for member in room.members() {
        if Some(member) == exclude {
            continue;
        }
        let result = match connections.get(member) {
            None => Err(DeliveryError::UnknownConnection(member)),
            Some(connection) if connection.state() == TransportState::Closing => continue,
            Some(connection) if !connection.is_open() => {
                Err(DeliveryError::ChannelClosed(member))
            }
            Some(connection) => connection.send(Message::Text(frame.clone())),
        };
        match result {
            Ok(()) => report.delivered.push(member),
            Err(e) => {
                tracing::warn!(
                    room_id = %room_id,
                    conn_id = %member,
                    error = %e,
                    "broadcast delivery failed"
                );
                report.failed.push(member);
            }
        }
    }

    report
}
