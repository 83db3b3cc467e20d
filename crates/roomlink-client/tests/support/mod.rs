//! Scripted transports for driving the realtime channel without a network.

#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]
#![allow(clippy::panic)]
#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::{mpsc, watch};

use roomlink_client::config::{RealtimeConfig, StateScope};
use roomlink_client::realtime::ChannelState;
use roomlink_client::transport::{Connector, Segment, Transport, TransportState};
use roomlink_core::error::{Result, RoomLinkError};

/// What the next transport does after a successful handshake.
pub enum Step {
    Segment(Segment),
    Fail(String),
    /// Change the state the transport reports, then keep reading.
    Report(TransportState),
}

/// How a scripted transport answers the close handshake.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CloseMode {
    Clean,
    Fail,
    Hang,
}

pub type Feed = mpsc::UnboundedSender<Step>;

enum Plan {
    Refuse(String),
    Accept(mpsc::UnboundedReceiver<Step>, CloseMode),
}

#[derive(Default)]
struct Log {
    urls: Vec<String>,
    closes: Vec<String>,
}

/// Connector that plays back a fixed list of handshake outcomes. Once the
/// list is exhausted, further handshakes never complete.
#[derive(Clone, Default)]
pub struct ScriptedConnector {
    plans: Arc<Mutex<VecDeque<Plan>>>,
    log: Arc<Mutex<Log>>,
}

impl ScriptedConnector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn refuse(&self, why: &str) {
        self.plans.lock().unwrap().push_back(Plan::Refuse(why.to_string()));
    }

    /// Queue a successful handshake and return the feed for its frames.
    pub fn accept(&self) -> Feed {
        self.accept_with(CloseMode::Clean)
    }

    pub fn accept_with(&self, close: CloseMode) -> Feed {
        let (tx, rx) = mpsc::unbounded_channel();
        self.plans.lock().unwrap().push_back(Plan::Accept(rx, close));
        tx
    }

    pub fn urls(&self) -> Vec<String> {
        self.log.lock().unwrap().urls.clone()
    }

    pub fn closes(&self) -> Vec<String> {
        self.log.lock().unwrap().closes.clone()
    }
}

#[async_trait]
impl Connector for ScriptedConnector {
    async fn connect(&self, url: &str) -> Result<Box<dyn Transport>> {
        self.log.lock().unwrap().urls.push(url.to_string());
        let plan = self.plans.lock().unwrap().pop_front();
        match plan {
            Some(Plan::Refuse(why)) => Err(RoomLinkError::Connect(why)),
            Some(Plan::Accept(rx, close)) => Ok(Box::new(ScriptedTransport {
                rx,
                close,
                log: Arc::clone(&self.log),
                state: TransportState::Open,
            })),
            None => std::future::pending().await,
        }
    }
}

struct ScriptedTransport {
    rx: mpsc::UnboundedReceiver<Step>,
    close: CloseMode,
    log: Arc<Mutex<Log>>,
    state: TransportState,
}

#[async_trait]
impl Transport for ScriptedTransport {
    async fn recv(&mut self) -> Result<Option<Segment>> {
        loop {
            match self.rx.recv().await {
                Some(Step::Segment(seg)) => return Ok(Some(seg)),
                Some(Step::Report(state)) => self.state = state,
                Some(Step::Fail(why)) => {
                    self.state = TransportState::Closed;
                    return Err(RoomLinkError::Transport(why));
                }
                None => {
                    self.state = TransportState::Closed;
                    return Ok(None);
                }
            }
        }
    }

    async fn close(&mut self, reason: &str) -> Result<()> {
        self.log.lock().unwrap().closes.push(reason.to_string());
        self.state = TransportState::Closing;
        match self.close {
            CloseMode::Clean => {
                self.state = TransportState::Closed;
                Ok(())
            }
            CloseMode::Fail => Err(RoomLinkError::Transport("close frame rejected".into())),
            CloseMode::Hang => std::future::pending().await,
        }
    }

    fn state(&self) -> TransportState {
        self.state
    }
}

pub fn text(feed: &Feed, s: &str) {
    feed.send(Step::Segment(Segment::text(s.to_string())))
        .unwrap_or_else(|_| panic!("transport gone"));
}

pub fn fragment(feed: &Feed, s: &str, fin: bool) {
    let seg = Segment::Text {
        data: s.to_string().into(),
        fin,
    };
    feed.send(Step::Segment(seg)).unwrap_or_else(|_| panic!("transport gone"));
}

pub fn config(scope: StateScope) -> RealtimeConfig {
    RealtimeConfig {
        ws_base_url: "ws://chat.test".into(),
        path: "/ws".into(),
        keepalive_interval: Duration::from_secs(20),
        close_timeout: Duration::from_millis(500),
        max_message_bytes: 64 * 1024,
        event_buffer: 64,
        state_scope: scope,
        backoff_min: Duration::from_millis(400),
        backoff_max: Duration::from_secs(10),
        dedupe_capacity: 2000,
    }
}

pub async fn wait_for<F>(rx: &mut watch::Receiver<ChannelState>, pred: F)
where
    F: Fn(&ChannelState) -> bool,
{
    let reached = tokio::time::timeout(Duration::from_secs(60), async {
        loop {
            if pred(&*rx.borrow_and_update()) {
                return;
            }
            if rx.changed().await.is_err() {
                panic!("state channel closed");
            }
        }
    })
    .await;
    reached.expect("state not reached in time");
}
