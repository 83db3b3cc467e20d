#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]
#![allow(clippy::panic)]

use std::collections::HashMap;
use std::time::Duration;

use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::{Query, State};
use axum::response::IntoResponse;
use axum::routing::get;
use axum::Router;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use roomlink_client::app_state::AppState;
use roomlink_client::config::ClientConfig;

async fn room_ws(
    ws: WebSocketUpgrade,
    Query(q): Query<HashMap<String, String>>,
    State(closed): State<mpsc::UnboundedSender<String>>,
) -> impl IntoResponse {
    let room = q.get("roomId").cloned().unwrap_or_default();
    ws.on_upgrade(move |socket| serve_room(socket, room, closed))
}

async fn serve_room(mut socket: WebSocket, room: String, closed: mpsc::UnboundedSender<String>) {
    let frame = format!(r#"{{"id":"m1","roomId":"{room}","sender":"ana","content":"hello"}}"#);
    for text in [frame.clone(), frame, "plain text from the server".to_string()] {
        if socket.send(Message::Text(text)).await.is_err() {
            return;
        }
    }

    while let Some(Ok(msg)) = socket.recv().await {
        if let Message::Close(frame) = msg {
            let reason = frame.map(|f| f.reason.into_owned()).unwrap_or_default();
            let _ = closed.send(reason);
            return;
        }
    }
}

#[tokio::test]
async fn streams_a_room_over_a_real_socket() {
    let (closed_tx, mut closed_rx) = mpsc::unbounded_channel();
    let app = Router::new()
        .route("/ws", get(room_ws))
        .with_state(closed_tx);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    let mut cfg = ClientConfig::default();
    cfg.realtime.ws_base_url = format!("ws://{addr}");
    let state = AppState::new(cfg).expect("client init");
    let channel = state.channel();
    let mut rx = channel.subscribe();

    channel.connect_room("lobby 1", &CancellationToken::new()).await;

    let first = tokio::time::timeout(Duration::from_secs(5), rx.recv())
        .await
        .expect("first message")
        .expect("stream open");
    assert_eq!(first.id.as_deref(), Some("m1"));
    assert_eq!(first.room_id, "lobby 1");
    assert_eq!(first.sender, "ana");

    let second = tokio::time::timeout(Duration::from_secs(5), rx.recv())
        .await
        .expect("second message")
        .expect("stream open");
    assert_eq!(second.content, "plain text from the server");
    assert_eq!(second.room_id, "lobby 1");
    assert!(channel.is_connected());

    let labels = [("room", "lobby 1")];
    assert_eq!(channel.metrics().duplicates_dropped.get(&labels), 1);
    assert_eq!(channel.metrics().messages_published.get(&labels), 2);

    channel.disconnect(&CancellationToken::new()).await;
    assert!(!channel.is_connected());

    let reason = tokio::time::timeout(Duration::from_secs(5), closed_rx.recv())
        .await
        .expect("server saw close")
        .expect("reason");
    assert_eq!(reason, "client disconnect");
}
