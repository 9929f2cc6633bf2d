//! HTTP and WebSocket transport.
//!
//! - `GET /socket/{room_id}` upgrades to a WebSocket carrying JSON text frames
//! - `GET /api/rooms/{room_id}` returns a JSON [`RoomSnapshot`]
//!
//! Each socket is split in two: a writer task drains the member's outbound
//! [`Link`](crate::member::Link) into the socket, and the upgrade task reads
//! frames and feeds them to the [`Session`]. Either side ending tears the
//! connection down and the member leaves the room.

use std::{sync::Arc, time::Duration};

use axum::{
    Json, Router,
    extract::{
        Path, State,
        ws::{Message, WebSocket, WebSocketUpgrade},
    },
    http::StatusCode,
    response::Response,
    routing::get,
};
use futures_util::{SinkExt, Stream, StreamExt};
use tracing::{Instrument, debug, info, info_span, warn};
use videosync_core::{Environment, RoomSnapshot};

use crate::{
    member::{MemberId, MemberIds, link},
    room::RoomHandle,
    room_manager::RoomManager,
    session::Session,
};

/// Shared state of every route.
struct AppState<E: Environment> {
    rooms: Arc<RoomManager<E>>,
    member_ids: Arc<MemberIds>,
}

impl<E: Environment> Clone for AppState<E> {
    fn clone(&self) -> Self {
        Self { rooms: Arc::clone(&self.rooms), member_ids: Arc::clone(&self.member_ids) }
    }
}

/// Routes serving rooms from `rooms`.
pub fn router<E: Environment>(rooms: Arc<RoomManager<E>>) -> Router {
    let state = AppState { rooms, member_ids: Arc::new(MemberIds::new()) };
    Router::new()
        .route("/socket/:room_id", get(socket_handler::<E>))
        .route("/api/rooms/:room_id", get(snapshot_handler::<E>))
        .with_state(state)
}

async fn socket_handler<E: Environment>(
    ws: WebSocketUpgrade,
    Path(room_id): Path<String>,
    State(state): State<AppState<E>>,
) -> Response {
    let member = state.member_ids.allocate();
    let room = state.rooms.get(&room_id).await;
    let config = state.rooms.config();
    let (buffer, introduce_timeout) = (config.outbound_buffer, config.introduce_timeout);

    let span = info_span!("client", client = %member, room = %room_id);
    ws.on_upgrade(move |socket| {
        serve_socket(socket, room, member, buffer, introduce_timeout).instrument(span)
    })
}

async fn snapshot_handler<E: Environment>(
    Path(room_id): Path<String>,
    State(state): State<AppState<E>>,
) -> Result<Json<RoomSnapshot>, StatusCode> {
    let room = state.rooms.get(&room_id).await;
    room.snapshot().await.map(Json).map_err(|_| StatusCode::SERVICE_UNAVAILABLE)
}

async fn serve_socket(
    socket: WebSocket,
    room: RoomHandle,
    member: MemberId,
    buffer: usize,
    introduce_timeout: Duration,
) {
    info!("client connected");
    let (mut sink, mut stream) = socket.split();

    let first = match tokio::time::timeout(introduce_timeout, first_text(&mut stream)).await {
        Ok(Some(first)) => first,
        Ok(None) => {
            info!("client left before introducing itself");
            return;
        },
        Err(_) => {
            info!("client did not introduce itself in time");
            let _ = sink.close().await;
            return;
        },
    };

    let (link, mut outbound) = link(member, buffer);
    let mut close = outbound.close_signal();
    let session = match Session::admit(room, link, &first).await {
        Ok(session) => session,
        Err(err) => {
            info!(error = %err, "refusing connection");
            // Peer may already be gone.
            let _ = sink.close().await;
            return;
        },
    };

    let writer = tokio::spawn(
        async move {
            while let Some(message) = outbound.recv().await {
                let text = match message.encode() {
                    Ok(text) => text,
                    Err(err) => {
                        warn!(error = %err, "failed to encode message");
                        continue;
                    },
                };
                if sink.send(Message::Text(text)).await.is_err() {
                    break;
                }
            }
            let _ = sink.close().await;
        }
        .in_current_span(),
    );

    loop {
        let frame = tokio::select! {
            frame = stream.next() => frame,
            () = close.closed() => break,
        };

        let result = match frame {
            Some(Ok(Message::Text(text))) => session.handle_text(&text).await,
            Some(Ok(Message::Binary(_))) => session.handle_binary().await,
            Some(Ok(Message::Ping(_) | Message::Pong(_))) => Ok(()),
            Some(Ok(Message::Close(_))) | None => break,
            Some(Err(err)) => {
                debug!(error = %err, "read error");
                break;
            },
        };

        if let Err(err) = result {
            info!(error = %err, "closing connection");
            break;
        }
    }

    if let Err(err) = session.close().await {
        warn!(error = %err, "failed to leave room");
    }
    if let Err(err) = writer.await {
        warn!(error = %err, "writer task failed");
    }
    info!("client disconnected");
}

/// First text frame, skipping pings. `None` if the socket closed or sent
/// anything else first.
async fn first_text<S>(stream: &mut S) -> Option<String>
where
    S: Stream<Item = Result<Message, axum::Error>> + Unpin,
{
    while let Some(frame) = stream.next().await {
        match frame {
            Ok(Message::Text(text)) => return Some(text),
            Ok(Message::Ping(_) | Message::Pong(_)) => {},
            Ok(Message::Binary(_) | Message::Close(_)) | Err(_) => return None,
        }
    }
    None
}
