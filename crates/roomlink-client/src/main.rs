//! roomlink client CLI
//!
//! - Usage: roomlink-client <room-id> [config.yaml]
//! - Streams one room and prints each message as a JSON line
//! - Throttled notices go to the log
//! - Ctrl-C disconnects gracefully

use std::time::Instant;

use tokio_util::sync::CancellationToken;
use tracing_subscriber::{fmt, EnvFilter};

use roomlink_client::notify::{LogNotifier, Notifier, ViewState};
use roomlink_client::{app_state, config};

#[tokio::main]
async fn main() {
    fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let mut args = std::env::args().skip(1);
    let Some(room) = args.next() else {
        eprintln!("usage: roomlink-client <room-id> [config.yaml]");
        std::process::exit(2);
    };
    let path = args.next().unwrap_or_else(|| "roomlink.yaml".to_string());

    let cfg = config::load_or_default(&path).expect("config load failed");
    let state = app_state::AppState::new(cfg).expect("client init failed");
    let channel = state.channel();
    tracing::info!(
        %room,
        base = %state.cfg().realtime.ws_base_url,
        scope = ?state.cfg().realtime.state_scope,
        "roomlink client starting"
    );

    let shutdown = CancellationToken::new();
    let mut messages = channel.subscribe();
    channel.connect_room(room.clone(), &shutdown).await;

    let mut gate = state.notification_gate();
    // no chat view in a terminal; every message counts as background
    let view = ViewState::default();
    let notifier = LogNotifier;

    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);

    loop {
        tokio::select! {
            _ = &mut ctrl_c => {
                tracing::info!(%room, "interrupt received; disconnecting");
                break;
            }
            recv = messages.recv() => match recv {
                Some(msg) => {
                    match serde_json::to_string(&msg) {
                        Ok(line) => println!("{line}"),
                        Err(e) => tracing::warn!(error = %e, "message encode failed"),
                    }
                    if let Some(notice) = gate.evaluate(&msg, &view, Instant::now()) {
                        if let Err(e) = notifier.show(&notice).await {
                            tracing::warn!(error = %e, "notice failed");
                        }
                    }
                }
                None => break,
            }
        }
    }

    channel.disconnect(&CancellationToken::new()).await;
    tracing::debug!("final metrics\n{}", channel.metrics().render());
}
