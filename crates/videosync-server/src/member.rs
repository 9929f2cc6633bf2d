//! Member connections as seen from a room.
//!
//! A [`Link`] is the room's half of one connection: a bounded queue of
//! outbound [`ServerMessage`]s plus a close signal. The transport owns the
//! matching [`LinkReceiver`], drains the queue into the socket, and closes the
//! socket once the signal fires.
//!
//! Dropping the [`Link`] (the member left or was kicked) ends the receiver's
//! message stream.

use std::{
    sync::atomic::{AtomicU64, Ordering},
    time::Duration,
};

use tokio::sync::{mpsc, watch};
pub use videosync_core::MemberId;
use videosync_proto::ServerMessage;

use crate::error::SendError;

/// Allocates process-unique member ids.
#[derive(Debug, Default)]
pub struct MemberIds {
    next: AtomicU64,
}

impl MemberIds {
    /// Allocator starting at 1.
    pub fn new() -> Self {
        Self { next: AtomicU64::new(1) }
    }

    /// Next unused id.
    pub fn allocate(&self) -> MemberId {
        MemberId(self.next.fetch_add(1, Ordering::Relaxed))
    }
}

/// Create a connected link pair with room for `buffer` pending messages.
pub fn link(member: MemberId, buffer: usize) -> (Link, LinkReceiver) {
    let (tx, rx) = mpsc::channel(buffer.max(1));
    let (close_tx, close_rx) = watch::channel(false);
    (
        Link { member, tx, close: close_tx },
        LinkReceiver { member, messages: rx, close: CloseSignal(close_rx) },
    )
}

/// Room-side handle to one member connection.
#[derive(Debug)]
pub struct Link {
    member: MemberId,
    tx: mpsc::Sender<ServerMessage>,
    close: watch::Sender<bool>,
}

impl Link {
    /// Member this link belongs to.
    pub fn member(&self) -> MemberId {
        self.member
    }

    /// Queue `message` for the member, waiting at most `timeout` for space.
    ///
    /// # Errors
    ///
    /// - `SendError::Disconnected` if the receiver is gone
    /// - `SendError::Timeout` if the buffer stayed full for `timeout`
    pub async fn send(&self, message: ServerMessage, timeout: Duration) -> Result<(), SendError> {
        match tokio::time::timeout(timeout, self.tx.send(message)).await {
            Ok(Ok(())) => Ok(()),
            Ok(Err(_)) => Err(SendError::Disconnected(self.member)),
            Err(_) => Err(SendError::Timeout(self.member)),
        }
    }

    /// Ask the transport to close the connection. Idempotent.
    pub fn close(&self) {
        self.close.send_replace(true);
    }
}

/// Transport-side half of a [`Link`].
#[derive(Debug)]
pub struct LinkReceiver {
    member: MemberId,
    messages: mpsc::Receiver<ServerMessage>,
    close: CloseSignal,
}

impl LinkReceiver {
    /// Member this link belongs to.
    pub fn member(&self) -> MemberId {
        self.member
    }

    /// Next outbound message; `None` once the room dropped the link.
    pub async fn recv(&mut self) -> Option<ServerMessage> {
        self.messages.recv().await
    }

    /// Next outbound message if one is already queued.
    pub fn try_recv(&mut self) -> Option<ServerMessage> {
        self.messages.try_recv().ok()
    }

    /// Clone of the close signal, for the task reading the socket.
    pub fn close_signal(&self) -> CloseSignal {
        self.close.clone()
    }
}

/// Fires when the room closes a member's connection.
#[derive(Debug, Clone)]
pub struct CloseSignal(watch::Receiver<bool>);

impl CloseSignal {
    /// Whether the room has asked for the connection to close.
    pub fn is_closed(&self) -> bool {
        *self.0.borrow()
    }

    /// Resolve once the connection should close.
    ///
    /// Also resolves when the room dropped the link without closing it.
    pub async fn closed(&mut self) {
        // An Err means the sender is gone, which is as final as a close.
        let _ = self.0.wait_for(|closed| *closed).await;
    }
}
