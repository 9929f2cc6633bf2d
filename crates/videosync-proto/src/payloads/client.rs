//! Client to server payloads.
//!
//! Indices are signed on the wire: clients may send negative values, which the
//! room treats as out of range rather than as decode failures.

use serde::{Deserialize, Serialize};

/// Handshake payload; must be the first message on a connection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IntroducePayload {
    /// Requested display name (truncated by the server, never rejected).
    ///
    /// Older clients spell the field `username`.
    #[serde(alias = "username")]
    pub user_name: String,
}

/// Absolute playback position in seconds. Used by `play` and `pause` in both
/// directions.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PositionPayload {
    /// Position in seconds from the start of the current video
    pub position: f64,
}

/// Request to resolve a video and append it to the queue.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueueUrlPayload {
    /// Video URL or bare id
    pub url: String,
}

/// Move one queue entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReorderQueuePayload {
    /// Current index of the entry
    pub from: i64,
    /// Target index, interpreted against the queue after removal
    pub to: i64,
}

/// Drop one queue entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoveFromQueuePayload {
    /// Index of the entry to remove
    pub index: i64,
}
