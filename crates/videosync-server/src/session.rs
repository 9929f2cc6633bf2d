//! Connection protocol, independent of the socket type.
//!
//! A connection is admitted only if its first frame is `introduce`. After
//! that, each text frame is decoded and dispatched to the room. Anything the
//! server cannot act on (undecodable text, binary data, a server-only type, a
//! second `introduce`) gets the member kicked.

use thiserror::Error;
use tracing::debug;
use videosync_proto::{ClientMessage, MessageType, ProtocolError};

use crate::{
    error::RoomError,
    member::{Link, MemberId},
    room::RoomHandle,
};

/// Why a session was refused or ended.
#[derive(Error, Debug)]
pub enum SessionError {
    /// Frame could not be decoded
    #[error("undecodable frame: {0}")]
    Protocol(#[from] ProtocolError),

    /// Frame was not valid text
    #[error("binary frames are not supported")]
    Binary,

    /// First frame was not `introduce`
    #[error("expected introduce, got {0}")]
    NotIntroduced(MessageType),

    /// Message is not allowed once the member has joined
    #[error("unexpected {0} after join")]
    Unexpected(MessageType),

    /// The room stopped accepting commands
    #[error(transparent)]
    Room(#[from] RoomError),
}

/// An admitted member connection.
#[derive(Debug)]
pub struct Session {
    room: RoomHandle,
    member: MemberId,
}

impl Session {
    /// Admit a connection whose first frame is `first`.
    ///
    /// On success the member has joined the room and `init` is on its way
    /// through `link`. On failure nothing has been submitted to the room.
    pub async fn admit(room: RoomHandle, link: Link, first: &str) -> Result<Self, SessionError> {
        let member = link.member();
        match ClientMessage::decode(first)? {
            ClientMessage::Introduce(intro) => {
                room.join(member, intro.user_name, link).await?;
                Ok(Self { room, member })
            },
            other => Err(SessionError::NotIntroduced(other.kind())),
        }
    }

    /// Member id of this connection.
    pub fn member(&self) -> MemberId {
        self.member
    }

    /// Room this connection joined.
    pub fn room(&self) -> &RoomHandle {
        &self.room
    }

    /// Handle one inbound text frame.
    ///
    /// Returns an error after kicking the member when the frame is not
    /// acceptable; the caller should stop reading then.
    pub async fn handle_text(&self, text: &str) -> Result<(), SessionError> {
        match ClientMessage::decode(text) {
            Ok(message) => self.dispatch(message).await,
            Err(err) => self.kick(SessionError::Protocol(err)).await,
        }
    }

    /// Handle one inbound binary frame. Always kicks.
    pub async fn handle_binary(&self) -> Result<(), SessionError> {
        self.kick(SessionError::Binary).await
    }

    /// Leave the room. Harmless if the member was already kicked.
    pub async fn close(self) -> Result<(), RoomError> {
        self.room.leave(self.member).await
    }

    async fn dispatch(&self, message: ClientMessage) -> Result<(), SessionError> {
        let member = self.member;
        debug!(client = %member, kind = %message.kind(), "inbound message");

        match message {
            ClientMessage::Play(p) => self.room.play(member, p.position).await?,
            ClientMessage::Pause(p) => self.room.pause(member, p.position).await?,
            ClientMessage::QueueUrl(p) => self.room.queue_url(member, &p.url).await?,
            ClientMessage::ReorderQueue(p) => self.room.reorder(p.from, p.to).await?,
            ClientMessage::RemoveFromQueue(p) => self.room.remove(p.index).await?,
            ClientMessage::Skip => self.room.skip().await?,
            ClientMessage::Introduce(_) => {
                return self.kick(SessionError::Unexpected(MessageType::Introduce)).await;
            },
        }
        Ok(())
    }

    async fn kick(&self, reason: SessionError) -> Result<(), SessionError> {
        self.room.kick(self.member).await?;
        Err(reason)
    }
}
