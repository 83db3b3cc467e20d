//! Realtime channel: one supervisory task per room subscription.
//!
//! The task connects, reads segments, reassembles and decodes them, drops
//! redeliveries, and publishes the rest to subscribers. Any transport failure
//! tears the connection down and retries after an exponential backoff; only
//! cancellation ends the task.
//!
//! Every subscriber owns a bounded queue. Publishing waits for room in each
//! open queue, so a slow subscriber slows the reader instead of losing
//! messages the dedupe cache has already recorded.
//!
//! Switching rooms is cancel-then-start: the previous task is cancelled and
//! awaited before the next one is spawned, so at most one transport is alive
//! and nothing from the old room is published once `connect_room` returns.

use std::sync::atomic::{AtomicU32, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use dashmap::DashMap;
use tokio::sync::{mpsc, watch, Mutex};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use roomlink_core::error::{Result, RoomLinkError};
use roomlink_core::protocol::{decode_frame, Decoded};
use roomlink_core::ChatMessage;

use crate::config::{RealtimeConfig, StateScope};
use crate::obs::ChannelMetrics;
use crate::transport::{
    Assembled, Connector, Endpoint, MessageAssembler, Segment, Transport, TransportState,
};

use super::backoff::ExponentialBackoff;
use super::dedupe::DedupeCache;
use super::types::{ChannelState, MessageStream};

const DISCONNECT_REASON: &str = "client disconnect";

/// Slack on top of the close timeout before a stopping task is aborted.
const STOP_GRACE: Duration = Duration::from_millis(500);

/// State owned by the running task and handed back when it stops.
#[derive(Debug)]
struct LoopState {
    dedupe: DedupeCache,
    attempt: u32,
}

impl LoopState {
    fn new(capacity: usize) -> Self {
        Self {
            dedupe: DedupeCache::new(capacity),
            attempt: 0,
        }
    }
}

#[derive(Debug)]
struct RunningLoop {
    room: String,
    stop: CancellationToken,
    task: JoinHandle<LoopState>,
}

#[derive(Debug, Default)]
struct Slot {
    running: Option<RunningLoop>,
    carry: Option<LoopState>,
}

impl Drop for Slot {
    fn drop(&mut self) {
        if let Some(running) = &self.running {
            running.stop.cancel();
        }
    }
}

struct Shared {
    cfg: RealtimeConfig,
    endpoint: Endpoint,
    connector: Arc<dyn Connector>,
    backoff: ExponentialBackoff,
    subscribers: DashMap<u64, mpsc::Sender<ChatMessage>>,
    next_subscriber: AtomicU64,
    state: watch::Sender<ChannelState>,
    /// Last state reported by the live transport.
    link: watch::Sender<TransportState>,
    attempts: AtomicU32,
    metrics: Arc<ChannelMetrics>,
}

impl Shared {
    fn set_state(&self, next: ChannelState) {
        tracing::debug!(room = next.room().unwrap_or("-"), state = next.as_str(), "channel state");
        self.state.send_replace(next);
    }
}

/// Marks one transport as live. Dropping it, including when the task is
/// aborted mid-await, releases the open-connections gauge.
struct LinkGuard<'a> {
    shared: &'a Shared,
    room: &'a str,
}

impl<'a> LinkGuard<'a> {
    fn open(shared: &'a Shared, room: &'a str, reported: TransportState) -> Self {
        shared.link.send_replace(reported);
        shared.metrics.open_connections.inc(&[("room", room)]);
        Self { shared, room }
    }
}

impl Drop for LinkGuard<'_> {
    fn drop(&mut self) {
        self.shared.link.send_replace(TransportState::Closed);
        self.shared.metrics.open_connections.dec(&[("room", self.room)]);
    }
}

/// Handle to a realtime channel. Clones share the same subscription.
#[derive(Clone)]
pub struct RealtimeChannel {
    shared: Arc<Shared>,
    slot: Arc<Mutex<Slot>>,
}

impl RealtimeChannel {
    /// Fails only when the configured base address cannot address a room.
    pub fn new(cfg: RealtimeConfig, connector: Arc<dyn Connector>) -> Result<Self> {
        let endpoint = Endpoint::new(&cfg.ws_base_url, &cfg.path)?;
        let (state, _) = watch::channel(ChannelState::Idle);
        let (link, _) = watch::channel(TransportState::Closed);
        Ok(Self {
            shared: Arc::new(Shared {
                backoff: ExponentialBackoff::new(cfg.backoff_min, cfg.backoff_max),
                cfg,
                endpoint,
                connector,
                subscribers: DashMap::new(),
                next_subscriber: AtomicU64::new(1),
                state,
                link,
                attempts: AtomicU32::new(0),
                metrics: Arc::new(ChannelMetrics::default()),
            }),
            slot: Arc::new(Mutex::new(Slot::default())),
        })
    }

    /// Subscribe to `room_id`, replacing any current subscription.
    ///
    /// Returns once the previous task has stopped and the new one is spawned;
    /// it does not wait for the handshake. Connection failures are retried
    /// inside the task and never reported here.
    pub async fn connect_room(&self, room_id: impl Into<String>, scope: &CancellationToken) {
        let room = room_id.into();
        let mut slot = self.slot.lock().await;

        self.stop_running(&mut slot, scope).await;

        let capacity = self.shared.cfg.dedupe_capacity;
        let state = match self.shared.cfg.state_scope {
            StateScope::Shared => slot.carry.take().unwrap_or_else(|| LoopState::new(capacity)),
            StateScope::PerRoom => {
                slot.carry = None;
                LoopState::new(capacity)
            }
        };
        self.shared.attempts.store(state.attempt, Ordering::Relaxed);

        let stop = scope.child_token();
        let task = tokio::spawn(supervise(
            Arc::clone(&self.shared),
            room.clone(),
            stop.clone(),
            state,
        ));

        tracing::info!(%room, "realtime subscription started");
        slot.running = Some(RunningLoop { room, stop, task });
    }

    /// Stop the current subscription.
    ///
    /// The task closes its transport gracefully within the configured close
    /// timeout; close errors are ignored. If `scope` is cancelled first the
    /// task is aborted instead.
    pub async fn disconnect(&self, scope: &CancellationToken) {
        let mut slot = self.slot.lock().await;
        self.stop_running(&mut slot, scope).await;
        self.shared.set_state(ChannelState::Closed);
    }

    /// True while the live transport reports itself open.
    pub fn is_connected(&self) -> bool {
        *self.shared.link.borrow() == TransportState::Open
    }

    /// Open a new subscriber queue holding up to `event_buffer` messages.
    /// It receives every message accepted after this call.
    pub fn subscribe(&self) -> MessageStream {
        let (tx, rx) = mpsc::channel(self.shared.cfg.event_buffer.max(1));
        let id = self.shared.next_subscriber.fetch_add(1, Ordering::Relaxed);
        self.shared.subscribers.insert(id, tx);
        rx
    }

    pub fn state(&self) -> ChannelState {
        self.shared.state.borrow().clone()
    }

    pub fn watch_state(&self) -> watch::Receiver<ChannelState> {
        self.shared.state.subscribe()
    }

    /// Consecutive failed attempts of the current subscription.
    pub fn attempts(&self) -> u32 {
        self.shared.attempts.load(Ordering::Relaxed)
    }

    pub fn current_room(&self) -> Option<String> {
        self.shared.state.borrow().room().map(str::to_string)
    }

    pub fn metrics(&self) -> Arc<ChannelMetrics> {
        Arc::clone(&self.shared.metrics)
    }

    async fn stop_running(&self, slot: &mut Slot, scope: &CancellationToken) {
        let Some(RunningLoop { room, stop, mut task }) = slot.running.take() else {
            return;
        };
        stop.cancel();

        let grace = self.shared.cfg.close_timeout + STOP_GRACE;
        let finished = tokio::select! {
            res = &mut task => Some(res),
            _ = tokio::time::sleep(grace) => None,
            _ = scope.cancelled() => None,
        };

        match finished {
            Some(Ok(state)) => slot.carry = Some(state),
            Some(Err(e)) => {
                let err = RoomLinkError::Internal(format!("realtime task failed: {e}"));
                tracing::error!(
                    %room,
                    code = err.code().as_str(),
                    error = %err,
                    "realtime task ended abnormally; dedupe window and attempt counter reset"
                );
            }
            None => {
                task.abort();
                // wait out a poll that may be in progress on another worker
                let _ = task.await;
                tracing::warn!(
                    %room,
                    scope = ?self.shared.cfg.state_scope,
                    "realtime task did not stop in time; aborted, dedupe window and attempt counter reset"
                );
            }
        }
        self.shared.metrics.disconnects.inc(&[("room", room.as_str())]);
        tracing::info!(%room, "realtime subscription stopped");
    }
}

enum Ended {
    Cancelled,
    Failed(RoomLinkError),
}

async fn supervise(
    shared: Arc<Shared>,
    room: String,
    stop: CancellationToken,
    mut state: LoopState,
) -> LoopState {
    let cfg = &shared.cfg;
    let metrics = &shared.metrics;
    let labels = [("room", room.as_str())];

    let url = shared.endpoint.room_url(&room);
    let mut assembler = MessageAssembler::new(cfg.max_message_bytes);

    loop {
        shared.set_state(ChannelState::Connecting {
            room: room.clone(),
            attempt: state.attempt,
        });
        metrics.connect_attempts.inc(&labels);
        tracing::info!(%room, %url, attempt = state.attempt, "realtime connecting");

        let started = Instant::now();
        let connected = tokio::select! {
            biased;
            _ = stop.cancelled() => break,
            res = shared.connector.connect(&url) => res,
        };

        let err = match connected {
            Ok(mut transport) => {
                metrics.handshake_duration.observe(&labels, started.elapsed());
                state.attempt = 0;
                shared.attempts.store(0, Ordering::Relaxed);
                shared.set_state(ChannelState::Open { room: room.clone() });
                let link = LinkGuard::open(&shared, &room, transport.state());
                tracing::info!(%room, "realtime connected");

                let ended = receive(
                    &shared,
                    &room,
                    &stop,
                    transport.as_mut(),
                    &mut assembler,
                    &mut state.dedupe,
                )
                .await;

                if assembler.is_partial() {
                    tracing::debug!(%room, "partial message discarded with its connection");
                }
                assembler.reset();

                match ended {
                    Ended::Cancelled => {
                        close_quietly(transport.as_mut(), &room, cfg.close_timeout).await;
                        drop(link);
                        break;
                    }
                    Ended::Failed(e) => {
                        drop(link);
                        e
                    }
                }
            }
            Err(e) => {
                metrics.connect_failures.inc(&labels);
                e
            }
        };

        let delay = shared.backoff.next_delay(state.attempt);
        state.attempt = state.attempt.saturating_add(1);
        shared.attempts.store(state.attempt, Ordering::Relaxed);
        shared.set_state(ChannelState::Reconnecting {
            room: room.clone(),
            attempt: state.attempt,
            delay,
        });
        metrics.backoff_wait.observe(&labels, delay);
        let delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX);
        if err.is_transient() {
            tracing::warn!(
                %room,
                attempt = state.attempt,
                delay_ms,
                code = err.code().as_str(),
                error = %err,
                "realtime channel failed; will retry"
            );
        } else {
            tracing::error!(
                %room,
                attempt = state.attempt,
                delay_ms,
                code = err.code().as_str(),
                error = %err,
                "realtime channel failed with a non-transient error; will retry"
            );
        }

        tokio::select! {
            biased;
            _ = stop.cancelled() => break,
            _ = tokio::time::sleep(delay) => {}
        }
    }

    shared.set_state(ChannelState::Closed);
    state
}

async fn receive(
    shared: &Shared,
    room: &str,
    stop: &CancellationToken,
    transport: &mut dyn Transport,
    assembler: &mut MessageAssembler,
    dedupe: &mut DedupeCache,
) -> Ended {
    let labels = [("room", room)];

    loop {
        let segment = tokio::select! {
            biased;
            _ = stop.cancelled() => return Ended::Cancelled,
            seg = transport.recv() => seg,
        };
        shared.link.send_replace(transport.state());

        let (data, fin) = match segment {
            Ok(Some(Segment::Text { data, fin })) => (data, fin),
            Ok(Some(Segment::Close { reason })) => {
                let reason = if reason.is_empty() { "no reason".to_string() } else { reason };
                return Ended::Failed(RoomLinkError::ClosedByPeer(reason));
            }
            Ok(None) => return Ended::Failed(RoomLinkError::ClosedByPeer("stream ended".into())),
            Err(e) => return Ended::Failed(e),
        };
        shared.metrics.frames_received.inc(&labels);

        match assembler.push(&data, fin) {
            Assembled::Pending => {}
            Assembled::Oversized { len } => {
                shared.metrics.oversized_dropped.inc(&labels);
                tracing::warn!(
                    %room,
                    len,
                    max = shared.cfg.max_message_bytes,
                    "dropping oversized message"
                );
            }
            Assembled::Complete(raw) => {
                if stop.is_cancelled() || !deliver(shared, room, &raw, dedupe, stop).await {
                    return Ended::Cancelled;
                }
            }
        }
    }
}

/// Decode, dedupe and publish one logical message. Returns false when
/// cancelled while waiting on a subscriber.
async fn deliver(
    shared: &Shared,
    room: &str,
    raw: &[u8],
    dedupe: &mut DedupeCache,
    stop: &CancellationToken,
) -> bool {
    let labels = [("room", room)];

    let msg = match decode_frame(raw, room) {
        Decoded::Chat(msg) => msg,
        Decoded::Ignored => {
            shared.metrics.frames_ignored.inc(&labels);
            tracing::debug!(%room, len = raw.len(), "non-chat frame ignored");
            return true;
        }
    };

    let key = msg.dedupe_key();
    if !dedupe.try_mark_seen(&key) {
        shared.metrics.duplicates_dropped.inc(&labels);
        tracing::debug!(%room, %key, "duplicate message dropped");
        return true;
    }

    shared.metrics.messages_published.inc(&labels);
    publish(shared, msg, stop).await
}

async fn publish(shared: &Shared, msg: ChatMessage, stop: &CancellationToken) -> bool {
    // no guard may be held across the sends below
    let subscribers: Vec<(u64, mpsc::Sender<ChatMessage>)> = shared
        .subscribers
        .iter()
        .map(|r| (*r.key(), r.value().clone()))
        .collect();

    for (id, tx) in subscribers {
        let sent = tokio::select! {
            biased;
            _ = stop.cancelled() => return false,
            res = tx.send(msg.clone()) => res,
        };
        if sent.is_err() {
            shared.subscribers.remove(&id);
            tracing::debug!(subscriber = id, "subscriber gone; removed");
        }
    }
    true
}

async fn close_quietly(transport: &mut dyn Transport, room: &str, limit: Duration) {
    let closed = match tokio::time::timeout(limit, transport.close(DISCONNECT_REASON)).await {
        Ok(res) => res,
        Err(_) => Err(RoomLinkError::Timeout),
    };
    if let Err(e) = closed {
        tracing::debug!(%room, code = e.code().as_str(), error = %e, "graceful close failed; dropping transport");
    }
}
