//! In-process room member.

use videosync_proto::{ClientMessage, ServerMessage};
use videosync_server::{
    CloseSignal, LinkReceiver, MemberId, RoomError, RoomHandle, Session, SessionError, link,
};

/// Outbound buffer used for test members.
pub const TEST_BUFFER: usize = 64;

/// A member connected to a room without a socket.
///
/// Messages the room sends are collected from the link; inbound messages go
/// through the same [`Session`] the WebSocket transport uses.
#[derive(Debug)]
pub struct TestClient {
    session: Session,
    inbox: LinkReceiver,
    close: CloseSignal,
}

impl TestClient {
    /// Introduce `name` to `room` as `member`.
    pub async fn join(
        room: &RoomHandle,
        member: MemberId,
        name: &str,
    ) -> Result<Self, SessionError> {
        Self::join_with_buffer(room, member, name, TEST_BUFFER).await
    }

    /// Like [`TestClient::join`] with a custom outbound buffer.
    pub async fn join_with_buffer(
        room: &RoomHandle,
        member: MemberId,
        name: &str,
        buffer: usize,
    ) -> Result<Self, SessionError> {
        let (link, inbox) = link(member, buffer);
        let close = inbox.close_signal();
        let intro = ClientMessage::introduce(name).encode()?;
        let session = Session::admit(room.clone(), link, &intro).await?;
        Ok(Self { session, inbox, close })
    }

    /// Member id.
    pub fn member(&self) -> MemberId {
        self.session.member()
    }

    /// Send a message as this member.
    pub async fn send(&self, message: &ClientMessage) -> Result<(), SessionError> {
        self.session.handle_text(&message.encode()?).await
    }

    /// Send a raw text frame as this member.
    pub async fn send_raw(&self, text: &str) -> Result<(), SessionError> {
        self.session.handle_text(text).await
    }

    /// Everything the room has sent so far.
    ///
    /// Waits for the room to finish every operation submitted before this
    /// call, so the result is complete up to that point.
    pub async fn received(&mut self) -> Result<Vec<ServerMessage>, RoomError> {
        self.session.room().snapshot().await?;
        let mut messages = Vec::new();
        while let Some(message) = self.inbox.try_recv() {
            messages.push(message);
        }
        Ok(messages)
    }

    /// Whether the room closed this member's connection.
    pub fn is_kicked(&self) -> bool {
        self.close.is_closed()
    }

    /// Leave the room.
    pub async fn leave(self) -> Result<(), RoomError> {
        self.session.close().await
    }
}
