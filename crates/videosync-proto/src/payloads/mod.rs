//! JSON-encoded protocol messages.
//!
//! Each message is an envelope `{"type": <tag>, "payload": <object>}`. The tag
//! set is closed and split by direction: clients send [`ClientMessage`]s, the
//! server pushes [`ServerMessage`]s. `play` and `pause` exist in both.
//!
//! # Invariants
//!
//! - Each tag maps to exactly one [`MessageType`], and each message variant to
//!   exactly one tag (enforced by match exhaustiveness in `kind()` and
//!   `decode()`).
//! - Client decoding never guesses: unknown tags, server-only tags, and payloads
//!   of the wrong shape are errors.

pub mod client;
pub mod server;

use serde::{Deserialize, Serialize, de::DeserializeOwned};

use self::{
    client::{
        IntroducePayload, PositionPayload, QueueUrlPayload, RemoveFromQueuePayload,
        ReorderQueuePayload,
    },
    server::{InitPayload, LoadPayload, SyncQueuePayload, UserPayload},
};
use crate::errors::{ProtocolError, Result};

/// Every tag the protocol knows, in both directions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MessageType {
    /// C→S handshake
    Introduce,
    /// C↔S resume playback at a position
    Play,
    /// C↔S pause playback at a position
    Pause,
    /// C→S resolve and enqueue a video
    QueueUrl,
    /// C→S move a queue entry
    ReorderQueue,
    /// C→S drop a queue entry
    RemoveFromQueue,
    /// C→S advance to the next queued video
    Skip,
    /// S→C snapshot for a joining member
    Init,
    /// S→C another member joined
    Join,
    /// S→C another member left
    Leave,
    /// S→C a video was loaded
    Load,
    /// S→C queue contents changed
    SyncQueue,
}

impl MessageType {
    /// All tags, client-to-server kinds first.
    pub const ALL: [Self; 12] = [
        Self::Introduce,
        Self::Play,
        Self::Pause,
        Self::QueueUrl,
        Self::ReorderQueue,
        Self::RemoveFromQueue,
        Self::Skip,
        Self::Init,
        Self::Join,
        Self::Leave,
        Self::Load,
        Self::SyncQueue,
    ];

    /// Wire tag for this type.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Introduce => "introduce",
            Self::Play => "play",
            Self::Pause => "pause",
            Self::QueueUrl => "queueurl",
            Self::ReorderQueue => "reorderqueue",
            Self::RemoveFromQueue => "removefromqueue",
            Self::Skip => "skip",
            Self::Init => "init",
            Self::Join => "join",
            Self::Leave => "leave",
            Self::Load => "load",
            Self::SyncQueue => "syncqueue",
        }
    }

    /// Parse a wire tag. Tags are case-sensitive.
    pub fn from_tag(tag: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.as_str() == tag)
    }

    /// Whether clients may send this type.
    pub fn is_client_to_server(self) -> bool {
        matches!(
            self,
            Self::Introduce
                | Self::Play
                | Self::Pause
                | Self::QueueUrl
                | Self::ReorderQueue
                | Self::RemoveFromQueue
                | Self::Skip
        )
    }
}

impl std::fmt::Display for MessageType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Raw envelope before the payload shape is known.
#[derive(Deserialize)]
struct Envelope {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    payload: serde_json::Value,
}

/// Messages a participant sends to the server.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", content = "payload", rename_all = "lowercase")]
pub enum ClientMessage {
    /// Handshake with the requested display name
    Introduce(IntroducePayload),
    /// Playback resumed (or seeked while playing)
    Play(PositionPayload),
    /// Playback paused (or seeked while paused)
    Pause(PositionPayload),
    /// Resolve a video and append it to the queue
    QueueUrl(QueueUrlPayload),
    /// Move a queue entry
    ReorderQueue(ReorderQueuePayload),
    /// Remove a queue entry
    RemoveFromQueue(RemoveFromQueuePayload),
    /// Skip the current video
    Skip,
}

impl ClientMessage {
    /// `introduce` with the requested display name.
    pub fn introduce(user_name: impl Into<String>) -> Self {
        Self::Introduce(IntroducePayload { user_name: user_name.into() })
    }

    /// `play` at `position` seconds.
    pub fn play(position: f64) -> Self {
        Self::Play(PositionPayload { position })
    }

    /// `pause` at `position` seconds.
    pub fn pause(position: f64) -> Self {
        Self::Pause(PositionPayload { position })
    }

    /// `queueurl` for a video URL or id.
    pub fn queue_url(url: impl Into<String>) -> Self {
        Self::QueueUrl(QueueUrlPayload { url: url.into() })
    }

    /// `reorderqueue` moving entry `from` to `to`.
    pub fn reorder_queue(from: i64, to: i64) -> Self {
        Self::ReorderQueue(ReorderQueuePayload { from, to })
    }

    /// `removefromqueue` for entry `index`.
    pub fn remove_from_queue(index: i64) -> Self {
        Self::RemoveFromQueue(RemoveFromQueuePayload { index })
    }

    /// Decode one text frame.
    ///
    /// `skip` carries no meaningful payload; any payload (or none) is accepted.
    pub fn decode(text: &str) -> Result<Self> {
        let envelope: Envelope =
            serde_json::from_str(text).map_err(ProtocolError::MalformedEnvelope)?;
        let kind = MessageType::from_tag(&envelope.kind)
            .ok_or(ProtocolError::UnknownType(envelope.kind))?;
        let payload = envelope.payload;

        match kind {
            MessageType::Introduce => payload_as(kind, payload).map(Self::Introduce),
            MessageType::Play => payload_as(kind, payload).map(Self::Play),
            MessageType::Pause => payload_as(kind, payload).map(Self::Pause),
            MessageType::QueueUrl => payload_as(kind, payload).map(Self::QueueUrl),
            MessageType::ReorderQueue => payload_as(kind, payload).map(Self::ReorderQueue),
            MessageType::RemoveFromQueue => payload_as(kind, payload).map(Self::RemoveFromQueue),
            MessageType::Skip => Ok(Self::Skip),
            MessageType::Init
            | MessageType::Join
            | MessageType::Leave
            | MessageType::Load
            | MessageType::SyncQueue => Err(ProtocolError::UnexpectedDirection(kind.as_str())),
        }
    }

    /// Encode as a JSON text frame.
    pub fn encode(&self) -> Result<String> {
        serde_json::to_string(self).map_err(ProtocolError::Encode)
    }

    /// Tag of this message.
    pub fn kind(&self) -> MessageType {
        match self {
            Self::Introduce(_) => MessageType::Introduce,
            Self::Play(_) => MessageType::Play,
            Self::Pause(_) => MessageType::Pause,
            Self::QueueUrl(_) => MessageType::QueueUrl,
            Self::ReorderQueue(_) => MessageType::ReorderQueue,
            Self::RemoveFromQueue(_) => MessageType::RemoveFromQueue,
            Self::Skip => MessageType::Skip,
        }
    }
}

/// Messages the server pushes to participants.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload", rename_all = "lowercase")]
pub enum ServerMessage {
    /// Room snapshot for a joining member
    Init(InitPayload),
    /// Playback resumed at a position
    Play(PositionPayload),
    /// Playback paused at a position
    Pause(PositionPayload),
    /// A member joined
    Join(UserPayload),
    /// A member left
    Leave(UserPayload),
    /// A new video was loaded (empty id: queue exhausted)
    Load(LoadPayload),
    /// Queue contents changed
    SyncQueue(SyncQueuePayload),
}

impl ServerMessage {
    /// `play` event at `position` seconds.
    pub fn play(position: f64) -> Self {
        Self::Play(PositionPayload { position })
    }

    /// `pause` event at `position` seconds.
    pub fn pause(position: f64) -> Self {
        Self::Pause(PositionPayload { position })
    }

    /// `join` event for `user_name`.
    pub fn join(user_name: impl Into<String>) -> Self {
        Self::Join(UserPayload { user_name: user_name.into() })
    }

    /// `leave` event for `user_name`.
    pub fn leave(user_name: impl Into<String>) -> Self {
        Self::Leave(UserPayload { user_name: user_name.into() })
    }

    /// `load` event for `video_id` (empty to signal an exhausted queue).
    pub fn load(video_id: impl Into<String>) -> Self {
        Self::Load(LoadPayload { video_id: video_id.into() })
    }

    /// `syncqueue` event carrying the full queue.
    pub fn sync_queue(queue: Vec<crate::QueuedVideo>) -> Self {
        Self::SyncQueue(SyncQueuePayload { queue })
    }

    /// Encode as a JSON text frame.
    pub fn encode(&self) -> Result<String> {
        serde_json::to_string(self).map_err(ProtocolError::Encode)
    }

    /// Decode a server message. Used by clients and tests.
    pub fn decode(text: &str) -> Result<Self> {
        serde_json::from_str(text).map_err(ProtocolError::MalformedEnvelope)
    }

    /// Tag of this message.
    pub fn kind(&self) -> MessageType {
        match self {
            Self::Init(_) => MessageType::Init,
            Self::Play(_) => MessageType::Play,
            Self::Pause(_) => MessageType::Pause,
            Self::Join(_) => MessageType::Join,
            Self::Leave(_) => MessageType::Leave,
            Self::Load(_) => MessageType::Load,
            Self::SyncQueue(_) => MessageType::SyncQueue,
        }
    }
}

fn payload_as<T: DeserializeOwned>(kind: MessageType, payload: serde_json::Value) -> Result<T> {
    serde_json::from_value(payload)
        .map_err(|source| ProtocolError::InvalidPayload { kind: kind.as_str(), source })
}
