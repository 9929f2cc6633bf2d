//! End-to-end tests over real WebSocket connections.

use std::{net::SocketAddr, sync::Arc, time::Duration};

use futures_util::{SinkExt, StreamExt};
use serde_json::{Value, json};
use tokio::net::TcpStream;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async, tungstenite::Message};
use videosync_harness::FakeVideoProvider;
use videosync_server::{RoomConfig, Server, ServerRuntimeConfig};

type Socket = WebSocketStream<MaybeTlsStream<TcpStream>>;

async fn start_server() -> SocketAddr {
    let provider = FakeVideoProvider::new().with("A", "Video A", 100.0);
    let config = ServerRuntimeConfig {
        bind_address: "127.0.0.1:0".to_string(),
        room: RoomConfig {
            settle_delay: Duration::from_millis(50),
            introduce_timeout: Duration::from_millis(500),
            ..RoomConfig::default()
        },
    };

    let server = Server::bind(config, Arc::new(provider)).await.unwrap();
    let addr = server.local_addr().unwrap();
    tokio::spawn(server.run_until(std::future::pending()));
    addr
}

async fn connect(addr: SocketAddr, room: &str) -> Socket {
    let (socket, _) = connect_async(format!("ws://{addr}/socket/{room}")).await.unwrap();
    socket
}

async fn send(socket: &mut Socket, value: Value) {
    socket.send(Message::Text(value.to_string())).await.unwrap();
}

/// Next text frame as JSON; `None` if the server closed the connection.
async fn next_json(socket: &mut Socket) -> Option<Value> {
    loop {
        let frame = tokio::time::timeout(Duration::from_secs(5), socket.next())
            .await
            .expect("timed out waiting for a frame");
        match frame {
            Some(Ok(Message::Text(text))) => return Some(serde_json::from_str(&text).unwrap()),
            Some(Ok(Message::Ping(_) | Message::Pong(_))) => {},
            Some(Ok(_) | Err(_)) | None => return None,
        }
    }
}

async fn introduce(socket: &mut Socket, name: &str) -> Value {
    send(socket, json!({ "type": "introduce", "payload": { "userName": name } })).await;
    next_json(socket).await.expect("init")
}

#[tokio::test]
async fn introduce_receives_init() {
    let addr = start_server().await;
    let mut alice = connect(addr, "lobby").await;

    let init = introduce(&mut alice, "alice").await;

    assert_eq!(
        init,
        json!({
            "type": "init",
            "payload": {
                "videoId": "",
                "videoPos": 0.0,
                "playbackState": 0,
                "users": ["alice"],
                "queue": []
            }
        })
    );
}

#[tokio::test]
async fn queued_video_reaches_every_member() {
    let addr = start_server().await;
    let mut alice = connect(addr, "movie-night").await;
    let mut bob = connect(addr, "movie-night").await;
    introduce(&mut alice, "alice").await;

    send(&mut bob, json!({ "type": "introduce", "payload": { "username": "bob" } })).await;
    let init = next_json(&mut bob).await.unwrap();
    assert_eq!(init["payload"]["users"], json!(["alice", "bob"]));
    assert_eq!(
        next_json(&mut alice).await,
        Some(json!({ "type": "join", "payload": { "userName": "bob" } }))
    );

    send(&mut alice, json!({ "type": "queueurl", "payload": { "url": "A" } })).await;

    for socket in [&mut alice, &mut bob] {
        assert_eq!(
            next_json(socket).await,
            Some(json!({ "type": "syncqueue", "payload": { "queue": [] } }))
        );
        assert_eq!(
            next_json(socket).await,
            Some(json!({ "type": "load", "payload": { "videoId": "A" } }))
        );
        assert_eq!(
            next_json(socket).await,
            Some(json!({ "type": "play", "payload": { "position": 0.0 } }))
        );
    }
}

#[tokio::test]
async fn garbage_after_join_closes_connection() {
    let addr = start_server().await;
    let mut alice = connect(addr, "lobby").await;
    let mut bob = connect(addr, "lobby").await;
    introduce(&mut alice, "alice").await;
    introduce(&mut bob, "bob").await;
    assert!(next_json(&mut alice).await.is_some());

    bob.send(Message::Text("definitely not json".to_string())).await.unwrap();

    assert_eq!(next_json(&mut bob).await, None);
    assert_eq!(
        next_json(&mut alice).await,
        Some(json!({ "type": "leave", "payload": { "userName": "bob" } }))
    );
}

#[tokio::test]
async fn first_message_must_be_introduce() {
    let addr = start_server().await;
    let mut socket = connect(addr, "lobby").await;

    send(&mut socket, json!({ "type": "play", "payload": { "position": 1.0 } })).await;

    assert_eq!(next_json(&mut socket).await, None);
}

#[tokio::test]
async fn silent_connection_is_closed() {
    let addr = start_server().await;
    let mut socket = connect(addr, "lobby").await;

    assert_eq!(next_json(&mut socket).await, None);

    let snapshot: Value = reqwest::get(format!("http://{addr}/api/rooms/lobby"))
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(snapshot["members"], json!([]));
}

#[tokio::test]
async fn snapshot_endpoint_reports_room() {
    let addr = start_server().await;
    let mut alice = connect(addr, "lobby").await;
    introduce(&mut alice, "alice").await;
    send(&mut alice, json!({ "type": "queueurl", "payload": { "url": "A" } })).await;
    for _ in 0..3 {
        next_json(&mut alice).await.unwrap();
    }

    let body: Value = reqwest::get(format!("http://{addr}/api/rooms/lobby"))
        .await
        .unwrap()
        .json()
        .await
        .unwrap();

    assert_eq!(body["id"], "lobby");
    assert_eq!(body["members"], json!(["alice"]));
    assert_eq!(body["playbackState"], "playing");
    assert_eq!(body["currentVideo"]["id"], "A");
    assert_eq!(body["currentVideo"]["queuedBy"], "alice");
    assert_eq!(body["queue"], json!([]));
}
