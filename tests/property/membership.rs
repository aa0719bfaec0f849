//! Property-based tests for room membership.
//!
//! Drives a [`RelayCore`] through random sequences of opens, frames,
//! hang-ups and closes, and checks after every step that:
//! 1. No room is ever empty.
//! 2. A connection belongs to at most one room, and the room it believes it
//!    is bound to lists it as a member.
//! 3. Every room member is a registered connection.
//! 4. A relayed frame only reaches other members of the sender's room.
//! 5. Room ids derived from paths are never empty and never contain `/`.

use std::collections::HashMap;

use arttalk_relay::lifecycle::{Dispatch, RelayCore};
use arttalk_relay::registry::ConnectionId;
use arttalk_relay::router::{DEFAULT_ROOM, room_id_from_path};
use axum::extract::ws::Message;
use proptest::prelude::*;
use tokio::sync::mpsc;

const PATHS: &[&str] = &["/chat/1", "/chat/2", "/chat/2?user=x", "/", "/discussion/1"];

const FRAMES: &[&str] = &[
    r#"{"type":"message","data":{"text":"hi"},"sender":"You"}"#,
    r#"{"type":"typing"}"#,
    r#"{"type":"stop_typing"}"#,
    r#"{"type":"presence"}"#,
    r#"{"data":{}}"#,
    "not json",
    "[1,2,3]",
];

#[derive(Debug, Clone)]
enum Op {
    Open(usize),
    Send(usize, usize),
    Hangup(usize),
    Close(usize),
}

fn arb_op() -> impl Strategy<Value = Op> {
    prop_oneof![
        (0..PATHS.len()).prop_map(Op::Open),
        (any::<usize>(), 0..FRAMES.len()).prop_map(|(c, f)| Op::Send(c, f)),
        any::<usize>().prop_map(Op::Hangup),
        any::<usize>().prop_map(Op::Close),
    ]
}

/// Test-side view of one connection.
struct Client {
    id: ConnectionId,
    path: &'static str,
    rx: Option<mpsc::UnboundedReceiver<Message>>,
}

fn check_invariants(core: &RelayCore, clients: &[Client]) -> Result<(), TestCaseError> {
    let mut memberships: HashMap<ConnectionId, usize> = HashMap::new();
    for room in core.rooms().iter() {
        prop_assert!(!room.is_empty(), "room {} is empty", room.id());
        for member in room.members() {
            prop_assert!(
                core.connections().get(member).is_some(),
                "room {} lists unregistered {member}",
                room.id()
            );
            *memberships.entry(member).or_default() += 1;
        }
    }

    for client in clients {
        let Some(connection) = core.connections().get(client.id) else {
            continue;
        };
        let count = memberships.get(&client.id).copied().unwrap_or_default();
        match connection.room() {
            Some(room_id) => {
                prop_assert_eq!(count, 1);
                prop_assert!(core.rooms().get(room_id).is_some_and(|r| r.contains(client.id)));
                prop_assert_eq!(room_id, room_id_from_path(client.path));
            }
            None => prop_assert_eq!(count, 0),
        }
    }
    Ok(())
}

fn drain(rx: &mut mpsc::UnboundedReceiver<Message>) {
    while rx.try_recv().is_ok() {}
}

proptest! {
    #[test]
    fn membership_invariants_hold(ops in prop::collection::vec(arb_op(), 1..60)) {
        let mut core = RelayCore::new();
        let mut clients: Vec<Client> = Vec::new();

        for op in ops {
            match op {
                Op::Open(p) => {
                    let (tx, rx) = mpsc::unbounded_channel();
                    let id = core.open(PATHS[p], tx);
                    clients.push(Client { id, path: PATHS[p], rx: Some(rx) });
                }
                Op::Send(c, f) if !clients.is_empty() => {
                    let sender = &clients[c % clients.len()];
                    let (sender_id, sender_path) = (sender.id, sender.path);
                    for client in &mut clients {
                        if let Some(rx) = client.rx.as_mut() {
                            drain(rx);
                        }
                    }

                    let dispatch = core.inbound_text(sender_id, FRAMES[f]);
                    if let Dispatch::Relayed { room_id, report } = &dispatch {
                        prop_assert_eq!(room_id.as_str(), room_id_from_path(sender_path));
                        for &to in &report.delivered {
                            prop_assert_ne!(to, sender_id);
                            let target = clients.iter().find(|cl| cl.id == to);
                            let target_in_room = target.is_some_and(|cl| {
                                room_id_from_path(cl.path) == room_id.as_str()
                            });
                            prop_assert!(target_in_room);
                        }
                        for &gone in &report.failed {
                            prop_assert!(!core.rooms().get(room_id).is_some_and(|r| r.contains(gone)));
                        }
                    }

                    // Only delivered peers saw the frame.
                    let delivered: Vec<ConnectionId> = match &dispatch {
                        Dispatch::Relayed { report, .. } => report.delivered.clone(),
                        _ => Vec::new(),
                    };
                    for client in &mut clients {
                        if client.id == sender_id {
                            continue;
                        }
                        if let Some(rx) = client.rx.as_mut() {
                            let got = rx.try_recv().is_ok();
                            prop_assert_eq!(got, delivered.contains(&client.id));
                        }
                    }
                }
                Op::Hangup(c) if !clients.is_empty() => {
                    let len = clients.len();
                    clients[c % len].rx = None;
                }
                Op::Close(c) if !clients.is_empty() => {
                    let client = clients.remove(c % clients.len());
                    core.close(client.id);
                    prop_assert!(core.connections().get(client.id).is_none());
                }
                _ => {}
            }
            check_invariants(&core, &clients)?;
        }

        for client in clients {
            core.close(client.id);
        }
        prop_assert!(core.rooms().is_empty());
        prop_assert!(core.connections().is_empty());
    }

    #[test]
    fn malformed_frames_never_change_membership(
        path in 0..PATHS.len(),
        junk in "[^{]{0,64}",
        repeats in 1usize..5,
    ) {
        let mut core = RelayCore::new();
        let (tx, mut rx) = mpsc::unbounded_channel();
        let id = core.open(PATHS[path], tx);
        drain(&mut rx);

        for _ in 0..repeats {
            prop_assert_eq!(core.inbound_text(id, &junk), Dispatch::Rejected);
        }
        prop_assert!(core.rooms().is_empty());
        prop_assert_eq!(core.connections().get(id).and_then(|c| c.room()), None);

        let mut notices = 0;
        while rx.try_recv().is_ok() {
            notices += 1;
        }
        prop_assert_eq!(notices, repeats);
    }

    #[test]
    fn room_id_is_final_nonempty_segment(path in "(/[a-z0-9%]{0,6}){0,4}(\\?[a-z=]{0,8})?") {
        let room_id = room_id_from_path(&path);
        prop_assert!(!room_id.is_empty());
        prop_assert!(!room_id.contains('/'));
        prop_assert!(!room_id.contains('?'));
        if room_id != DEFAULT_ROOM {
            let without_query = path.split('?').next().unwrap_or_default();
            let expected_suffix = format!("/{room_id}");
            prop_assert!(without_query.ends_with(&expected_suffix));
        }
    }
}
