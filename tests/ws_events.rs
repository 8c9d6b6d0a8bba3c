//! WebSocket subscriptions, commands and event fan-out.

#![allow(clippy::panic, clippy::indexing_slicing)]

mod common;

use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use serde_json::{Value, json};
use tokio::net::TcpStream;
use tokio_test::assert_ok;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async};

use common::{TestServer, spawn_server};

type Socket = WebSocketStream<MaybeTlsStream<TcpStream>>;

async fn connect(server: &TestServer) -> Socket {
    let Ok((socket, _)) = connect_async(server.ws_url()).await else {
        panic!("ws connect failed");
    };
    socket
}

async fn command(socket: &mut Socket, id: &str, payload: Value) {
    let frame = json!({
        "id": id,
        "type": "command",
        "timestamp": chrono::Utc::now(),
        "payload": payload,
    });
    assert_ok!(socket.send(Message::text(frame.to_string())).await);
}

/// Reads frames until one satisfies `pred`, failing after two seconds.
async fn next_matching(socket: &mut Socket, pred: impl Fn(&Value) -> bool) -> Value {
    let wait = async {
        while let Some(frame) = socket.next().await {
            let Ok(Message::Text(text)) = frame else {
                continue;
            };
            let Ok(value) = serde_json::from_str::<Value>(text.as_str()) else {
                continue;
            };
            if pred(&value) {
                return value;
            }
        }
        panic!("socket closed before the expected frame");
    };
    let Ok(value) = tokio::time::timeout(Duration::from_secs(2), wait).await else {
        panic!("timed out waiting for frame");
    };
    value
}

fn response_to(id: &'static str) -> impl Fn(&Value) -> bool {
    move |v| v["id"] == id && (v["type"] == "response" || v["type"] == "error")
}

fn event_of(kind: &'static str) -> impl Fn(&Value) -> bool {
    move |v| v["type"] == "event" && v["payload"]["event_type"] == kind
}

#[tokio::test]
async fn match_and_message_are_pushed_to_subscribers() {
    let server = spawn_server(Duration::ZERO).await;
    let alice = server.register("Alice", 29, "woman").await;
    let bob = server.register("Bob", 31, "man").await;

    let mut socket = connect(&server).await;
    command(&mut socket, "s1", json!({ "command": "subscribe", "user_ids": [alice] })).await;
    let ack = next_matching(&mut socket, response_to("s1")).await;
    assert_eq!(ack["payload"]["count"], 1);
    assert_eq!(ack["payload"]["wildcard"], false);

    command(
        &mut socket,
        "w1",
        json!({ "command": "swipe", "actor_id": alice, "target_id": bob, "direction": "like" }),
    )
    .await;
    let swiped = next_matching(&mut socket, response_to("w1")).await;
    assert_eq!(swiped["type"], "response");
    assert_eq!(swiped["payload"]["accepted"], true);

    let (status, _) = server
        .post(
            "/api/v1/swipe",
            json!({ "actor_id": bob, "target_id": alice, "direction": "like" }),
        )
        .await;
    assert_eq!(status, reqwest::StatusCode::OK);

    let matched = next_matching(&mut socket, event_of("match_created")).await;
    let Some(conversation) = matched["payload"]["conversation_id"].as_str() else {
        panic!("match event without conversation: {matched}");
    };
    let conversation = conversation.to_string();

    let (status, _) = server
        .post(
            "/api/v1/messages",
            json!({ "conversation_id": conversation, "sender_id": bob, "text": "hey alice" }),
        )
        .await;
    assert_eq!(status, reqwest::StatusCode::ACCEPTED);

    let delivered = next_matching(&mut socket, event_of("message_created")).await;
    assert_eq!(delivered["payload"]["message"]["text"], "hey alice");

    command(
        &mut socket,
        "y1",
        json!({ "command": "sync", "conversation_id": conversation, "user_id": alice }),
    )
    .await;
    let synced = next_matching(&mut socket, response_to("y1")).await;
    assert_eq!(synced["payload"]["messages"].as_array().map(Vec::len), Some(1));
}

#[tokio::test]
async fn service_errors_come_back_as_error_frames() {
    let server = spawn_server(Duration::from_secs(60)).await;
    let alice = server.register("Alice", 29, "woman").await;
    let bob = server.register("Bob", 31, "man").await;
    let carol = server.register("Carol", 27, "woman").await;

    let mut socket = connect(&server).await;
    command(
        &mut socket,
        "a",
        json!({ "command": "swipe", "actor_id": alice, "target_id": bob, "direction": "pass" }),
    )
    .await;
    let first = next_matching(&mut socket, response_to("a")).await;
    assert_eq!(first["type"], "response");

    command(
        &mut socket,
        "b",
        json!({ "command": "swipe", "actor_id": alice, "target_id": carol, "direction": "like" }),
    )
    .await;
    let throttled = next_matching(&mut socket, response_to("b")).await;
    assert_eq!(throttled["type"], "error");
    assert_eq!(throttled["payload"]["code"], 4001);
    assert!(throttled["payload"]["retry_after_ms"].as_u64().is_some());

    command(&mut socket, "c", json!({ "command": "dance" })).await;
    let unknown = next_matching(&mut socket, response_to("c")).await;
    assert_eq!(unknown["payload"]["code"], 404);
}

#[tokio::test]
async fn unsubscribed_clients_see_nothing() {
    let server = spawn_server(Duration::ZERO).await;
    let alice = server.register("Alice", 29, "woman").await;
    let bob = server.register("Bob", 31, "man").await;

    let mut socket = connect(&server).await;
    command(&mut socket, "s", json!({ "command": "subscribe", "user_ids": [alice] })).await;
    let _ = next_matching(&mut socket, response_to("s")).await;
    command(&mut socket, "u", json!({ "command": "unsubscribe", "user_ids": [alice] })).await;
    let ack = next_matching(&mut socket, response_to("u")).await;
    assert_eq!(ack["payload"]["remaining_count"], 0);

    let (status, _) = server
        .post(
            "/api/v1/swipe",
            json!({ "actor_id": alice, "target_id": bob, "direction": "like" }),
        )
        .await;
    assert_eq!(status, reqwest::StatusCode::OK);

    let quiet = tokio::time::timeout(Duration::from_millis(200), socket.next()).await;
    assert!(quiet.is_err(), "unexpected frame after unsubscribe");
}
