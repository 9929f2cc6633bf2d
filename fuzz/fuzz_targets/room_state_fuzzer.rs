//! Fuzz target for RoomState operation sequences
//!
//! # Strategy
//!
//! Arbitrary interleavings of joins, leaves, playback reports, queue edits,
//! skips, settles and drift checks, with time moving forward by arbitrary
//! steps.
//!
//! # Invariants
//!
//! - Playback is Empty iff no video is loaded
//! - Monitor start/stop actions alternate, starting with a start
//! - Monitor runs iff the room has members
//! - Extrapolated position stays within [0, duration]
//! - Queue edits with invalid indices change nothing

#![no_main]

use std::time::Duration;

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use videosync_core::{MemberId, PlaybackState, RoomAction, RoomState};
use videosync_proto::{QueuedVideo, Video};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
struct At(Duration);

impl std::ops::Sub for At {
    type Output = Duration;

    fn sub(self, rhs: Self) -> Duration {
        self.0.saturating_sub(rhs.0)
    }
}

#[derive(Debug, Clone, Arbitrary)]
enum Op {
    Join { member: u8 },
    Leave { member: u8 },
    Play { member: u8, position: i16 },
    Pause { member: u8, position: i16 },
    Enqueue { duration: u16 },
    Reorder { from: i8, to: i8 },
    Remove { index: i8 },
    Skip,
    DriftCheck,
    Advance { millis: u16 },
}

fuzz_target!(|ops: Vec<Op>| {
    let mut room = RoomState::new("fuzz");
    let mut now = At(Duration::ZERO);
    let mut monitor_running = false;
    let mut next_video = 0u32;

    for op in ops {
        let actions = match op {
            Op::Join { member } => room.join(MemberId(member.into()), "member", now),
            Op::Leave { member } => room.leave(MemberId(member.into())),
            Op::Play { member, position } => {
                room.play(MemberId(member.into()), position.into(), now)
            },
            Op::Pause { member, position } => {
                room.pause(MemberId(member.into()), position.into(), now)
            },
            Op::Enqueue { duration } => {
                next_video += 1;
                let id = format!("v{next_video}");
                let video = Video::new(id.clone(), id, duration.into());
                room.enqueue(QueuedVideo::new(video, "member"), now)
            },
            Op::Reorder { from, to } => {
                let before = room.queue().snapshot();
                let actions = room.reorder_queue(from.into(), to.into());
                if actions.is_empty() {
                    assert_eq!(room.queue().snapshot(), before);
                }
                actions
            },
            Op::Remove { index } => {
                let before = room.queue().len();
                let actions = room.remove_from_queue(index.into());
                let expected = if actions.is_empty() { before } else { before - 1 };
                assert_eq!(room.queue().len(), expected);
                actions
            },
            Op::Skip => room.load_next(now),
            Op::DriftCheck => room.check_drift(now),
            Op::Advance { millis } => {
                now = At(now.0 + Duration::from_millis(millis.into()));
                Vec::new()
            },
        };

        for action in actions {
            match action {
                RoomAction::StartMonitor => {
                    assert!(!monitor_running, "monitor started twice");
                    monitor_running = true;
                },
                RoomAction::StopMonitor => {
                    assert!(monitor_running, "monitor stopped while not running");
                    monitor_running = false;
                },
                RoomAction::Settle { video_id } => {
                    room.start_loaded(&video_id, now);
                },
                RoomAction::SendTo { .. } | RoomAction::Broadcast { .. } => {},
            }
        }

        assert_eq!(monitor_running, room.member_count() > 0);
        let playback = room.playback();
        assert_eq!(playback.state() == PlaybackState::Empty, playback.current().is_none());
        if let Some(current) = playback.current() {
            let position = playback.position(now);
            assert!(position >= 0.0 && position <= current.video.duration);
        }
    }
});
