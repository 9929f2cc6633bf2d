//! Protocol error types.

use thiserror::Error;

/// Result alias for protocol operations.
pub type Result<T> = std::result::Result<T, ProtocolError>;

/// Errors produced while decoding or encoding protocol messages.
#[derive(Error, Debug)]
pub enum ProtocolError {
    /// Input was not a JSON envelope of the form `{type, payload}`.
    #[error("malformed envelope: {0}")]
    MalformedEnvelope(#[source] serde_json::Error),

    /// The `type` tag names no known message.
    #[error("unknown message type: {0:?}")]
    UnknownType(String),

    /// The tag is known but only travels server to client.
    #[error("message type {0} is not accepted from clients")]
    UnexpectedDirection(&'static str),

    /// The payload does not match the shape required by its tag.
    #[error("invalid payload for {kind}: {source}")]
    InvalidPayload {
        /// Tag of the message whose payload failed to decode
        kind: &'static str,
        /// Underlying JSON error
        #[source]
        source: serde_json::Error,
    },

    /// Serializing an outbound message failed.
    #[error("encode error: {0}")]
    Encode(#[source] serde_json::Error),
}
