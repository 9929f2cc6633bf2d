//! Scenario tests for the room state machine.

use std::time::Duration;

use videosync_core::{MemberId, PlaybackState, RoomAction, RoomState};
use videosync_proto::{QueuedVideo, ServerMessage, Video};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
struct At(Duration);

impl std::ops::Sub for At {
    type Output = Duration;

    fn sub(self, rhs: Self) -> Duration {
        self.0.saturating_sub(rhs.0)
    }
}

fn secs(s: u64) -> At {
    At(Duration::from_secs(s))
}

fn video(id: &str, duration: f64) -> QueuedVideo {
    QueuedVideo::new(Video::new(id, format!("Title {id}"), duration), "alice")
}

/// Messages delivered to `member` by a list of actions.
fn delivered_to(actions: &[RoomAction], member: MemberId) -> Vec<ServerMessage> {
    actions
        .iter()
        .filter_map(|action| match action {
            RoomAction::SendTo { member: to, message } if *to == member => Some(message.clone()),
            RoomAction::Broadcast { exclude, message } if *exclude != Some(member) => {
                Some(message.clone())
            },
            _ => None,
        })
        .collect()
}

/// Load `id` and run the settle step the runtime would perform.
fn enqueue_and_settle(room: &mut RoomState<At>, entry: QueuedVideo, now: At) {
    let actions = room.enqueue(entry, now);
    for action in actions {
        if let RoomAction::Settle { video_id } = action {
            room.start_loaded(&video_id, now);
        }
    }
}

#[test]
fn reorder_moves_front_entry_to_back() {
    let mut room = RoomState::new("lobby");
    enqueue_and_settle(&mut room, video("X", 300.0), secs(0));
    for id in ["A", "B", "C"] {
        room.enqueue(video(id, 60.0), secs(0));
    }

    let actions = room.reorder_queue(0, 2);

    let expected = vec![video("B", 60.0), video("C", 60.0), video("A", 60.0)];
    assert_eq!(
        actions,
        vec![RoomAction::Broadcast { exclude: None, message: ServerMessage::sync_queue(expected) }]
    );
}

#[test]
fn invalid_queue_edits_emit_nothing() {
    let mut room = RoomState::new("lobby");
    enqueue_and_settle(&mut room, video("X", 300.0), secs(0));
    room.enqueue(video("A", 60.0), secs(0));

    assert!(room.reorder_queue(0, 0).is_empty());
    assert!(room.reorder_queue(-1, 0).is_empty());
    assert!(room.reorder_queue(0, 5).is_empty());
    assert!(room.remove_from_queue(1).is_empty());
    assert!(room.remove_from_queue(-3).is_empty());
    assert_eq!(room.queue().len(), 1);
}

#[test]
fn drift_check_loads_next_after_overrun() {
    let mut room = RoomState::new("lobby");
    enqueue_and_settle(&mut room, video("X", 100.0), secs(0));
    room.enqueue(video("Y", 50.0), secs(0));
    room.play(MemberId(1), 95.0, secs(100));

    let actions = room.check_drift(secs(110));

    assert_eq!(
        actions,
        vec![
            RoomAction::Broadcast { exclude: None, message: ServerMessage::sync_queue(vec![]) },
            RoomAction::Broadcast { exclude: None, message: ServerMessage::load("Y") },
            RoomAction::Settle { video_id: "Y".into() },
        ]
    );
    assert_eq!(room.playback().video_id(), "Y");
}

#[test]
fn drift_check_within_duration_does_nothing() {
    let mut room = RoomState::new("lobby");
    enqueue_and_settle(&mut room, video("X", 100.0), secs(0));
    room.play(MemberId(1), 95.0, secs(100));

    assert!(room.check_drift(secs(104)).is_empty());
    assert_eq!(room.playback().video_id(), "X");
}

#[test]
fn drift_check_clears_when_queue_exhausted() {
    let mut room = RoomState::new("lobby");
    enqueue_and_settle(&mut room, video("X", 10.0), secs(0));

    let actions = room.check_drift(secs(11));

    assert_eq!(
        actions,
        vec![RoomAction::Broadcast { exclude: None, message: ServerMessage::load("") }]
    );
    assert_eq!(room.playback().state(), PlaybackState::Empty);
    assert!(room.check_drift(secs(100)).is_empty());
}

#[test]
fn joiner_receives_exact_init_and_no_own_join() {
    let mut room = RoomState::new("lobby");
    room.join(MemberId(1), "alice", secs(0));
    enqueue_and_settle(&mut room, video("X", 300.0), secs(0));
    room.enqueue(video("Y", 60.0), secs(0));
    room.pause(MemberId(1), 42.0, secs(5));

    let actions = room.join(MemberId(2), "bob", secs(50));
    let to_bob = delivered_to(&actions, MemberId(2));

    assert_eq!(to_bob.len(), 1);
    let ServerMessage::Init(init) = &to_bob[0] else {
        panic!("expected init, got {:?}", to_bob[0]);
    };
    assert_eq!(init.video_id, "X");
    assert!((init.video_pos - 42.0).abs() < f64::EPSILON);
    assert_eq!(init.playback_state, PlaybackState::Paused.code());
    assert_eq!(init.users, ["alice", "bob"]);
    assert_eq!(init.queue, vec![video("Y", 60.0)]);

    let to_alice = delivered_to(&actions, MemberId(1));
    assert_eq!(to_alice, vec![ServerMessage::join("bob")]);
}

#[test]
fn leave_is_announced_to_remaining_members() {
    let mut room = RoomState::new("lobby");
    room.join(MemberId(1), "alice", secs(0));
    room.join(MemberId(2), "bob", secs(0));

    let actions = room.leave(MemberId(2));

    assert_eq!(delivered_to(&actions, MemberId(1)), vec![ServerMessage::leave("bob")]);
    assert_eq!(room.member_names(), ["alice"]);
}

#[test]
fn pause_is_echoed_to_everyone_but_sender() {
    let mut room = RoomState::new("lobby");
    room.join(MemberId(1), "alice", secs(0));
    room.join(MemberId(2), "bob", secs(0));
    enqueue_and_settle(&mut room, video("X", 300.0), secs(0));

    let actions = room.pause(MemberId(1), 30.0, secs(30));

    assert!(delivered_to(&actions, MemberId(1)).is_empty());
    assert_eq!(delivered_to(&actions, MemberId(2)), vec![ServerMessage::pause(30.0)]);
    assert_eq!(room.playback().state(), PlaybackState::Paused);
}

#[test]
fn skip_with_queue_loads_next_video() {
    let mut room = RoomState::new("lobby");
    enqueue_and_settle(&mut room, video("X", 300.0), secs(0));
    room.enqueue(video("Y", 60.0), secs(0));

    let actions = room.load_next(secs(10));

    assert!(actions.contains(&RoomAction::Settle { video_id: "Y".into() }));
    assert_eq!(room.playback().state(), PlaybackState::Paused);
    assert!(room.queue().is_empty());

    room.start_loaded("Y", secs(11));
    assert_eq!(room.playback().state(), PlaybackState::Playing);
    assert!(room.playback().position(secs(11)).abs() < f64::EPSILON);
}
