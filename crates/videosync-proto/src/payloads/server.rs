//! Server to client payloads.

use serde::{Deserialize, Serialize};

use crate::QueuedVideo;

/// Room snapshot sent once, to the joining member only.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InitPayload {
    /// Current video id, empty when nothing is loaded
    pub video_id: String,
    /// Extrapolated position at the time of the snapshot, in seconds
    pub video_pos: f64,
    /// Playback state code: 0 empty, 1 playing, 2 paused
    pub playback_state: u8,
    /// Display names of every member, the joiner included
    pub users: Vec<String>,
    /// Pending videos in play order
    pub queue: Vec<QueuedVideo>,
}

/// Display name of a member that joined or left.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserPayload {
    /// Display name
    pub user_name: String,
}

/// A new video was loaded, paused at zero.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoadPayload {
    /// Loaded video id; empty string means the queue ran out
    pub video_id: String,
}

/// Full replacement of the client's queue view.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SyncQueuePayload {
    /// Pending videos in play order
    pub queue: Vec<QueuedVideo>,
}
