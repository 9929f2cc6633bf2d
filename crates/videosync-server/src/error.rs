//! Server error types.

use thiserror::Error;

use crate::member::MemberId;

/// Errors that prevent the server from starting or serving.
#[derive(Error, Debug)]
pub enum ServerError {
    /// Configuration error (invalid bind address, missing API key, etc.).
    ///
    /// Fatal: fix the configuration and restart.
    #[error("configuration error: {0}")]
    Config(String),

    /// Transport/network error (bind failure, accept loop failure, etc.).
    #[error("transport error: {0}")]
    Transport(String),
}

impl From<std::io::Error> for ServerError {
    fn from(err: std::io::Error) -> Self {
        Self::Transport(err.to_string())
    }
}

/// Errors from submitting a command to a room.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RoomError {
    /// The room task has ended and no longer accepts commands.
    #[error("room {0} is closed")]
    Closed(String),
}

/// Errors from writing one message to one member.
///
/// Never fatal for the room: the failure is logged and delivery to the other
/// members continues.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum SendError {
    /// The member's connection is gone.
    #[error("member {0} is disconnected")]
    Disconnected(MemberId),

    /// The member did not accept the write within the send timeout.
    #[error("write to member {0} timed out")]
    Timeout(MemberId),
}
