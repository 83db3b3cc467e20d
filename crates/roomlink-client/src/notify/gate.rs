use std::time::Instant;

use async_trait::async_trait;

use roomlink_core::error::Result;
use roomlink_core::ChatMessage;

use crate::config::NotificationSection;
use crate::transport::escape_component;

use super::throttle::{NotificationThrottler, ThrottleDecision};

/// What the user is currently looking at.
#[derive(Debug, Clone, Default)]
pub struct ViewState {
    pub active_room: Option<String>,
    pub chat_visible: bool,
}

impl ViewState {
    pub fn is_viewing(&self, room_id: &str) -> bool {
        self.chat_visible && self.active_room.as_deref() == Some(room_id)
    }
}

/// A notification ready to be rendered by a [`Notifier`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub room_id: String,
    pub sender: String,
    pub preview: String,
    pub deep_link: String,
}

/// Platform capability that renders notices (toast, tray, log line).
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn show(&self, notice: &Notice) -> Result<()>;
}

/// Notifier that writes notices to the log.
#[derive(Debug, Default)]
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn show(&self, notice: &Notice) -> Result<()> {
        tracing::info!(
            room = %notice.room_id,
            sender = %notice.sender,
            link = %notice.deep_link,
            "{}",
            notice.preview
        );
        Ok(())
    }
}

/// Decides which incoming messages become notices.
///
/// Owns the per-room throttle state; callers keep one gate per client and
/// pass it by `&mut`.
#[derive(Debug)]
pub struct NotificationGate {
    throttler: NotificationThrottler,
}

impl NotificationGate {
    pub fn new(throttler: NotificationThrottler) -> Self {
        Self { throttler }
    }

    pub fn from_config(cfg: &NotificationSection) -> Self {
        Self::new(NotificationThrottler::new(cfg.window(), cfg.burst_count))
    }

    pub fn evaluate(&mut self, msg: &ChatMessage, view: &ViewState, now: Instant) -> Option<Notice> {
        if view.is_viewing(&msg.room_id) {
            return None;
        }

        self.throttler.prune(now);
        let preview = match self.throttler.hit(&msg.room_id, now) {
            ThrottleDecision::Show => msg.content.clone(),
            ThrottleDecision::Suppress => return None,
            ThrottleDecision::Summary { count } => format!("{count} new messages"),
        };

        Some(Notice {
            room_id: msg.room_id.clone(),
            sender: msg.sender.clone(),
            preview,
            deep_link: deep_link(&msg.room_id),
        })
    }

    pub fn throttler_mut(&mut self) -> &mut NotificationThrottler {
        &mut self.throttler
    }
}

pub fn deep_link(room_id: &str) -> String {
    format!("roomlink://room/{}", escape_component(room_id))
}
