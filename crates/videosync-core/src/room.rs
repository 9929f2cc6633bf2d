//! Room state machine.
//!
//! Owns the member list, the [`Playback`] and the [`Queue`] of one room, and
//! turns each operation into a list of [`RoomAction`]s for the runtime to
//! execute. Nothing here performs I/O or sleeps: the caller supplies `now`,
//! delivers messages, and runs the settle delay requested by
//! [`RoomAction::Settle`].
//!
//! # Invariants
//!
//! - The runtime applies one operation at a time and executes its actions in
//!   order before starting the next operation. Every method assumes exclusive
//!   access; the state never exposes a half-applied operation.
//! - Member ids are unique within the room; joining twice is a no-op.
//! - `StopMonitor` is emitted exactly on the 1 → 0 membership transition and
//!   `StartMonitor` exactly on 0 → 1.

use std::time::Duration;

use serde::Serialize;
use videosync_proto::{InitPayload, QueuedVideo, ServerMessage, truncate_user_name};

use crate::{
    playback::{Playback, PlaybackState},
    queue::Queue,
};

/// Process-unique identifier of one member connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct MemberId(pub u64);

impl std::fmt::Display for MemberId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Actions returned by [`RoomState`] for the runtime to execute, in order.
#[derive(Debug, Clone, PartialEq)]
pub enum RoomAction {
    /// Deliver to a single member
    SendTo {
        /// Recipient
        member: MemberId,
        /// Message to deliver
        message: ServerMessage,
    },

    /// Deliver to every member except `exclude`
    Broadcast {
        /// Member to skip, usually the originator
        exclude: Option<MemberId>,
        /// Message to deliver
        message: ServerMessage,
    },

    /// Wait for the settle delay, then call [`RoomState::start_loaded`] with
    /// this id. Must run before any other operation on the room.
    Settle {
        /// Id of the video that was just loaded
        video_id: String,
    },

    /// Membership went from 0 to 1: the drift monitor must be running
    StartMonitor,

    /// Membership went from 1 to 0: the drift monitor must stop
    StopMonitor,
}

/// A member as the room sees it.
#[derive(Debug, Clone, PartialEq, Eq)]
struct MemberEntry {
    id: MemberId,
    name: String,
}

/// Read-only view of a room, for display outside the room engine.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RoomSnapshot {
    /// Room id
    pub id: String,
    /// Currently loaded video
    pub current_video: Option<QueuedVideo>,
    /// Play/pause state
    pub playback_state: PlaybackState,
    /// Extrapolated position in seconds
    pub position: f64,
    /// Member display names in join order
    pub members: Vec<String>,
    /// Pending videos
    pub queue: Vec<QueuedVideo>,
}

/// State of a single room.
///
/// Generic over `I` (Instant type) to support virtual time in tests.
#[derive(Debug, Clone)]
pub struct RoomState<I> {
    id: String,
    members: Vec<MemberEntry>,
    playback: Playback<I>,
    queue: Queue,
}

impl<I> RoomState<I>
where
    I: Copy + std::ops::Sub<Output = Duration>,
{
    /// Empty room with no members, nothing loaded, and an empty queue.
    pub fn new(id: impl Into<String>) -> Self {
        Self { id: id.into(), members: Vec::new(), playback: Playback::new(), queue: Queue::new() }
    }

    /// Room id.
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Playback model.
    pub fn playback(&self) -> &Playback<I> {
        &self.playback
    }

    /// Pending queue.
    pub fn queue(&self) -> &Queue {
        &self.queue
    }

    /// Number of members.
    pub fn member_count(&self) -> usize {
        self.members.len()
    }

    /// Whether `member` is in the room.
    pub fn is_member(&self, member: MemberId) -> bool {
        self.members.iter().any(|m| m.id == member)
    }

    /// Display name of `member`, if present.
    pub fn member_name(&self, member: MemberId) -> Option<&str> {
        self.members.iter().find(|m| m.id == member).map(|m| m.name.as_str())
    }

    /// Ids of all members in join order.
    pub fn member_ids(&self) -> impl Iterator<Item = MemberId> + '_ {
        self.members.iter().map(|m| m.id)
    }

    /// Display names of all members in join order.
    pub fn member_names(&self) -> Vec<String> {
        self.members.iter().map(|m| m.name.clone()).collect()
    }

    /// Add a member and greet it with an `init` snapshot.
    ///
    /// The display name is truncated here. The joiner gets `init` and is
    /// excluded from the `join` broadcast.
    pub fn join(&mut self, member: MemberId, name: &str, now: I) -> Vec<RoomAction> {
        if self.is_member(member) {
            return Vec::new();
        }

        let name = truncate_user_name(name);
        let was_empty = self.members.is_empty();
        self.members.push(MemberEntry { id: member, name: name.clone() });

        let mut actions = Vec::with_capacity(3);
        if was_empty {
            actions.push(RoomAction::StartMonitor);
        }
        actions.push(RoomAction::SendTo {
            member,
            message: ServerMessage::Init(self.init_payload(now)),
        });
        actions.push(RoomAction::Broadcast {
            exclude: Some(member),
            message: ServerMessage::join(name),
        });
        actions
    }

    /// Remove a member and tell the others.
    pub fn leave(&mut self, member: MemberId) -> Vec<RoomAction> {
        let Some(index) = self.members.iter().position(|m| m.id == member) else {
            return Vec::new();
        };
        let entry = self.members.remove(index);

        let mut actions = Vec::with_capacity(2);
        if self.members.is_empty() {
            actions.push(RoomAction::StopMonitor);
        }
        actions.push(RoomAction::Broadcast {
            exclude: Some(member),
            message: ServerMessage::leave(entry.name),
        });
        actions
    }

    /// A member resumed playback at `position`.
    ///
    /// Ignored when nothing is loaded.
    pub fn play(&mut self, from: MemberId, position: f64, now: I) -> Vec<RoomAction> {
        if !self.playback.report(PlaybackState::Playing, position, now) {
            return Vec::new();
        }
        vec![RoomAction::Broadcast {
            exclude: Some(from),
            message: ServerMessage::play(self.playback.last_position()),
        }]
    }

    /// A member paused playback at `position`.
    ///
    /// Ignored when nothing is loaded.
    pub fn pause(&mut self, from: MemberId, position: f64, now: I) -> Vec<RoomAction> {
        if !self.playback.report(PlaybackState::Paused, position, now) {
            return Vec::new();
        }
        vec![RoomAction::Broadcast {
            exclude: Some(from),
            message: ServerMessage::pause(self.playback.last_position()),
        }]
    }

    /// Append a resolved video. Starts it right away when nothing is loaded.
    pub fn enqueue(&mut self, entry: QueuedVideo, now: I) -> Vec<RoomAction> {
        self.queue.push(entry);
        if self.playback.state() == PlaybackState::Empty {
            self.load_next(now)
        } else {
            vec![self.sync_queue()]
        }
    }

    /// Move a queue entry. No-op for invalid indices.
    pub fn reorder_queue(&mut self, from: i64, to: i64) -> Vec<RoomAction> {
        if self.queue.reorder(from, to) { vec![self.sync_queue()] } else { Vec::new() }
    }

    /// Remove a queue entry. No-op for an invalid index.
    pub fn remove_from_queue(&mut self, index: i64) -> Vec<RoomAction> {
        match self.queue.remove(index) {
            Some(_) => vec![self.sync_queue()],
            None => Vec::new(),
        }
    }

    /// Advance to the next queued video.
    ///
    /// With an empty queue, clears playback (announcing an empty `load`) if a
    /// video was loaded, and does nothing otherwise. With a pending video,
    /// announces the shortened queue and the `load`, then asks the runtime to
    /// [`RoomAction::Settle`] before playback starts.
    pub fn load_next(&mut self, now: I) -> Vec<RoomAction> {
        let Some(next) = self.queue.pop_front() else {
            if self.playback.current().is_none() {
                return Vec::new();
            }
            self.playback.clear();
            return vec![RoomAction::Broadcast { exclude: None, message: ServerMessage::load("") }];
        };

        let video_id = next.video.id.clone();
        let sync = self.sync_queue();
        self.playback.load(next, now);

        vec![
            sync,
            RoomAction::Broadcast { exclude: None, message: ServerMessage::load(video_id.clone()) },
            RoomAction::Settle { video_id },
        ]
    }

    /// Finish a load: start playing from zero after the settle delay.
    ///
    /// Does nothing if `video_id` is no longer the current video.
    pub fn start_loaded(&mut self, video_id: &str, now: I) -> Vec<RoomAction> {
        if self.playback.current().is_none() || self.playback.video_id() != video_id {
            return Vec::new();
        }
        self.playback.report(PlaybackState::Playing, 0.0, now);
        vec![RoomAction::Broadcast { exclude: None, message: ServerMessage::play(0.0) }]
    }

    /// Periodic drift check: advance the queue if playback ran past the end
    /// of the current video.
    pub fn check_drift(&mut self, now: I) -> Vec<RoomAction> {
        if self.playback.has_overrun(now) { self.load_next(now) } else { Vec::new() }
    }

    /// Snapshot sent to a joining member.
    pub fn init_payload(&self, now: I) -> InitPayload {
        InitPayload {
            video_id: self.playback.video_id().to_string(),
            video_pos: self.playback.position(now),
            playback_state: self.playback.state().code(),
            users: self.member_names(),
            queue: self.queue.snapshot(),
        }
    }

    /// Read-only view for display.
    pub fn snapshot(&self, now: I) -> RoomSnapshot {
        RoomSnapshot {
            id: self.id.clone(),
            current_video: self.playback.current().cloned(),
            playback_state: self.playback.state(),
            position: self.playback.position(now),
            members: self.member_names(),
            queue: self.queue.snapshot(),
        }
    }

    fn sync_queue(&self) -> RoomAction {
        RoomAction::Broadcast {
            exclude: None,
            message: ServerMessage::sync_queue(self.queue.snapshot()),
        }
    }
}
