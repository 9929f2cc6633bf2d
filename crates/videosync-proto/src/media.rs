//! Resolved video metadata.

use serde::{Deserialize, Serialize};

/// A video resolved by the metadata service.
///
/// Immutable once resolved. `duration` is in seconds; the room engine uses it
/// to clamp extrapolated positions and to detect overrun.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Video {
    /// Provider-specific video identifier
    pub id: String,
    /// Human-readable title
    pub title: String,
    /// Length in seconds
    pub duration: f64,
    /// Channel or uploader name, when the provider reports one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub channel: Option<String>,
    /// Thumbnail image URL, when the provider reports one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thumbnail: Option<String>,
}

impl Video {
    /// Video with only the required fields set.
    pub fn new(id: impl Into<String>, title: impl Into<String>, duration: f64) -> Self {
        Self { id: id.into(), title: title.into(), duration, channel: None, thumbnail: None }
    }
}

/// A queue entry: the resolved video plus who queued it.
///
/// Serialized flat, so clients see `{id, title, duration, ..., queuedBy}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueuedVideo {
    /// The resolved video
    #[serde(flatten)]
    pub video: Video,
    /// Display name of the member that queued the video
    #[serde(default)]
    pub queued_by: String,
}

impl QueuedVideo {
    /// Attribute `video` to the member named `queued_by`.
    pub fn new(video: Video, queued_by: impl Into<String>) -> Self {
        Self { video, queued_by: queued_by.into() }
    }

    /// Identifier of the underlying video.
    pub fn id(&self) -> &str {
        &self.video.id
    }
}
