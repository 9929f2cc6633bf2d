//! Wire protocol for videosync rooms.
//!
//! Every message on a room connection is a JSON object `{type, payload}`. The
//! `type` tag selects exactly one payload shape; the set of tags is closed, so
//! both directions are modelled as Rust enums and decoded with an exhaustive
//! match over [`MessageType`].
//!
//! # Components
//!
//! - [`ClientMessage`]: commands a participant sends to the server
//! - [`ServerMessage`]: events the server pushes to participants
//! - [`Video`] / [`QueuedVideo`]: resolved video metadata carried in queue and
//!   init payloads
//!
//! The codec is deliberately strict: an unknown tag, a payload of the wrong
//! shape, or a server-only tag arriving from a client is a [`ProtocolError`].
//! What the caller does with that error (close, kick) is a transport decision.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod errors;
pub mod media;
pub mod payloads;

pub use errors::{ProtocolError, Result};
pub use media::{QueuedVideo, Video};
pub use payloads::{
    ClientMessage, MessageType, ServerMessage, client::IntroducePayload, server::InitPayload,
};

/// Maximum length of a display name, in characters.
///
/// Longer names are truncated on join, never rejected.
pub const MAX_USER_NAME_CHARS: usize = 25;

/// Truncate a display name to [`MAX_USER_NAME_CHARS`] characters.
///
/// Counts `char`s rather than bytes so multi-byte names are never split inside
/// a code point.
pub fn truncate_user_name(name: &str) -> String {
    name.chars().take(MAX_USER_NAME_CHARS).collect()
}
