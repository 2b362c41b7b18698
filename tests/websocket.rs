//! WebSocket sessions and bus fan-out against a running server.

use std::sync::Arc;
use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use serde_json::{json, Value};
use tokio_tungstenite::{connect_async, tungstenite::Message};

mod common;

use common::FakeDatabase;

async fn next_text<S>(stream: &mut S) -> String
where
    S: StreamExt<Item = Result<Message, tokio_tungstenite::tungstenite::Error>> + Unpin,
{
    loop {
        let message = tokio::time::timeout(Duration::from_secs(5), stream.next())
            .await
            .expect("timed out waiting for a frame")
            .expect("stream ended")
            .expect("read failed");
        if let Message::Text(text) = message {
            return text.as_str().to_string();
        }
    }
}

#[tokio::test]
async fn test_session_echoes_frames() {
    let server = common::start_server(Arc::new(FakeDatabase::default()), |_| {}).await;

    let (mut socket, _) = connect_async(server.ws_url("/?user=alice&type=all"))
        .await
        .unwrap();
    socket.send(Message::text("ping")).await.unwrap();
    assert_eq!(next_text(&mut socket).await, "ping");

    socket.close(None).await.unwrap();
    server.stop().await;
}

#[tokio::test]
async fn test_published_event_reaches_connected_clients() {
    let server = common::start_server(Arc::new(FakeDatabase::default()), |_| {}).await;

    let (mut alice, _) = connect_async(server.ws_url("/?user=alice")).await.unwrap();
    let (mut bob, _) = connect_async(server.ws_url("/live")).await.unwrap();

    // Sessions register after the handshake completes.
    alice.send(Message::text("hello")).await.unwrap();
    assert_eq!(next_text(&mut alice).await, "hello");
    bob.send(Message::text("hello")).await.unwrap();
    assert_eq!(next_text(&mut bob).await, "hello");

    let res = reqwest::Client::new()
        .put(server.url("/api/v1/events/posts"))
        .body(r#"{"id":7,"text":"fresh"}"#)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), reqwest::StatusCode::OK);
    assert_eq!(
        res.json::<Value>().await.unwrap(),
        json!({"published": "posts"})
    );

    let expected = json!({"subject": "posts", "payload": {"id": 7, "text": "fresh"}});
    for socket in [&mut alice, &mut bob] {
        let event: Value = serde_json::from_str(&next_text(socket).await).unwrap();
        assert_eq!(event, expected);
    }

    server.stop().await;
}

#[tokio::test]
async fn test_bus_events_without_http() {
    let server = common::start_server(Arc::new(FakeDatabase::default()), |_| {}).await;

    let (mut socket, _) = connect_async(server.ws_url("/")).await.unwrap();
    socket.send(Message::text("ready")).await.unwrap();
    assert_eq!(next_text(&mut socket).await, "ready");

    liveposts_edge::pubsub::Publisher::send(&server.bus, "notes", "plain text");
    let event: Value = serde_json::from_str(&next_text(&mut socket).await).unwrap();
    assert_eq!(event, json!({"subject": "notes", "payload": "plain text"}));

    server.stop().await;
}

#[tokio::test]
async fn test_shutdown_closes_sessions() {
    let server = common::start_server(Arc::new(FakeDatabase::default()), |_| {}).await;

    let (mut socket, _) = connect_async(server.ws_url("/?user=carol")).await.unwrap();
    socket.send(Message::text("hi")).await.unwrap();
    assert_eq!(next_text(&mut socket).await, "hi");

    server.stop().await;

    let closed = tokio::time::timeout(Duration::from_secs(5), async {
        loop {
            match socket.next().await {
                Some(Ok(Message::Close(_))) | None | Some(Err(_)) => break,
                Some(Ok(_)) => continue,
            }
        }
    })
    .await;
    assert!(closed.is_ok());
}
