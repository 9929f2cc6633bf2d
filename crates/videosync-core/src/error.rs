//! Error types for the room engine core.

use thiserror::Error;

/// Errors from resolving a video id or URL to metadata.
///
/// The room swallows all of these (queueing silently does nothing), but the
/// variants let the runtime log a useful reason.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ResolveError {
    /// Input is neither a recognised URL nor a bare video id
    #[error("unrecognised video reference: {0:?}")]
    InvalidReference(String),

    /// The provider has no video with this id
    #[error("video not found: {0}")]
    NotFound(String),

    /// The provider could not be reached or answered with an error status
    #[error("provider unavailable: {0}")]
    Unavailable(String),

    /// The provider answered, but the response could not be understood
    #[error("malformed provider response: {0}")]
    Malformed(String),
}
