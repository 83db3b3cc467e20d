use std::time::Duration;

use serde::Deserialize;
use roomlink_core::error::{Result, RoomLinkError};

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ClientConfig {
    pub version: u32,

    #[serde(default)]
    pub realtime: RealtimeSection,

    #[serde(default)]
    pub notifications: NotificationSection,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            version: 1,
            realtime: RealtimeSection::default(),
            notifications: NotificationSection::default(),
        }
    }
}

impl ClientConfig {
    pub fn validate(&self) -> Result<()> {
        if self.version != 1 {
            return Err(RoomLinkError::InvalidConfig(format!(
                "unsupported config version {}",
                self.version
            )));
        }

        self.realtime.validate()?;
        self.notifications.validate()?;

        Ok(())
    }
}

/// Whether the dedupe cache and attempt counter survive a room switch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StateScope {
    /// One cache and counter for the lifetime of the channel.
    #[default]
    Shared,
    /// Fresh cache and counter for every `connect_room`.
    PerRoom,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RealtimeSection {
    #[serde(default = "default_ws_base_url")]
    pub ws_base_url: String,

    #[serde(default = "default_path")]
    pub path: String,

    #[serde(default = "default_keepalive_interval_ms")]
    pub keepalive_interval_ms: u64,

    #[serde(default = "default_close_timeout_ms")]
    pub close_timeout_ms: u64,

    #[serde(default = "default_max_message_bytes")]
    pub max_message_bytes: usize,

    #[serde(default = "default_event_buffer")]
    pub event_buffer: usize,

    #[serde(default)]
    pub state_scope: StateScope,

    #[serde(default)]
    pub backoff: BackoffSection,

    #[serde(default)]
    pub dedupe: DedupeSection,
}

impl Default for RealtimeSection {
    fn default() -> Self {
        Self {
            ws_base_url: default_ws_base_url(),
            path: default_path(),
            keepalive_interval_ms: default_keepalive_interval_ms(),
            close_timeout_ms: default_close_timeout_ms(),
            max_message_bytes: default_max_message_bytes(),
            event_buffer: default_event_buffer(),
            state_scope: StateScope::default(),
            backoff: BackoffSection::default(),
            dedupe: DedupeSection::default(),
        }
    }
}

impl RealtimeSection {
    pub fn validate(&self) -> Result<()> {
        let base = self.ws_base_url.trim();
        if !(base.starts_with("ws://") || base.starts_with("wss://")) {
            return Err(RoomLinkError::InvalidConfig(
                "realtime.ws_base_url must start with ws:// or wss://".into(),
            ));
        }
        if !(1000..=300_000).contains(&self.keepalive_interval_ms) {
            return Err(RoomLinkError::InvalidConfig(
                "realtime.keepalive_interval_ms must be between 1000 and 300000".into(),
            ));
        }
        if !(100..=30_000).contains(&self.close_timeout_ms) {
            return Err(RoomLinkError::InvalidConfig(
                "realtime.close_timeout_ms must be between 100 and 30000".into(),
            ));
        }
        if self.max_message_bytes < 1024 {
            return Err(RoomLinkError::InvalidConfig(
                "realtime.max_message_bytes must be at least 1024".into(),
            ));
        }
        if self.event_buffer == 0 {
            return Err(RoomLinkError::InvalidConfig(
                "realtime.event_buffer must be at least 1".into(),
            ));
        }

        self.backoff.validate()?;

        Ok(())
    }

    pub fn runtime(&self) -> RealtimeConfig {
        RealtimeConfig {
            ws_base_url: self.ws_base_url.trim().to_string(),
            path: self.path.trim().to_string(),
            keepalive_interval: Duration::from_millis(self.keepalive_interval_ms),
            close_timeout: Duration::from_millis(self.close_timeout_ms),
            max_message_bytes: self.max_message_bytes,
            event_buffer: self.event_buffer,
            state_scope: self.state_scope,
            backoff_min: Duration::from_millis(self.backoff.min_ms),
            backoff_max: Duration::from_millis(self.backoff.max_ms),
            dedupe_capacity: self.dedupe.capacity,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BackoffSection {
    #[serde(default = "default_backoff_min_ms")]
    pub min_ms: u64,

    #[serde(default = "default_backoff_max_ms")]
    pub max_ms: u64,
}

impl Default for BackoffSection {
    fn default() -> Self {
        Self {
            min_ms: default_backoff_min_ms(),
            max_ms: default_backoff_max_ms(),
        }
    }
}

impl BackoffSection {
    pub fn validate(&self) -> Result<()> {
        if self.min_ms == 0 {
            return Err(RoomLinkError::InvalidConfig(
                "realtime.backoff.min_ms must be at least 1".into(),
            ));
        }
        if self.max_ms < self.min_ms {
            return Err(RoomLinkError::InvalidConfig(
                "realtime.backoff.max_ms must not be less than min_ms".into(),
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DedupeSection {
    /// 0 disables deduplication.
    #[serde(default = "default_dedupe_capacity")]
    pub capacity: usize,
}

impl Default for DedupeSection {
    fn default() -> Self {
        Self {
            capacity: default_dedupe_capacity(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct NotificationSection {
    #[serde(default = "default_window_secs")]
    pub window_secs: u64,

    #[serde(default = "default_burst_count")]
    pub burst_count: u32,
}

impl Default for NotificationSection {
    fn default() -> Self {
        Self {
            window_secs: default_window_secs(),
            burst_count: default_burst_count(),
        }
    }
}

impl NotificationSection {
    pub fn validate(&self) -> Result<()> {
        if self.window_secs == 0 {
            return Err(RoomLinkError::InvalidConfig(
                "notifications.window_secs must be at least 1".into(),
            ));
        }
        if self.burst_count < 2 {
            return Err(RoomLinkError::InvalidConfig(
                "notifications.burst_count must be at least 2".into(),
            ));
        }
        Ok(())
    }

    pub fn window(&self) -> Duration {
        Duration::from_secs(self.window_secs)
    }
}

/// Runtime form of [`RealtimeSection`] consumed by the channel.
#[derive(Debug, Clone)]
pub struct RealtimeConfig {
    pub ws_base_url: String,
    pub path: String,
    pub keepalive_interval: Duration,
    pub close_timeout: Duration,
    pub max_message_bytes: usize,
    pub event_buffer: usize,
    pub state_scope: StateScope,
    pub backoff_min: Duration,
    pub backoff_max: Duration,
    pub dedupe_capacity: usize,
}

impl Default for RealtimeConfig {
    fn default() -> Self {
        RealtimeSection::default().runtime()
    }
}

fn default_ws_base_url() -> String {
    "ws://localhost:8081".into()
}
fn default_path() -> String {
    "/ws".into()
}
fn default_keepalive_interval_ms() -> u64 {
    20_000
}
fn default_close_timeout_ms() -> u64 {
    2_000
}
fn default_max_message_bytes() -> usize {
    1 << 20
}
fn default_event_buffer() -> usize {
    1024
}
fn default_backoff_min_ms() -> u64 {
    400
}
fn default_backoff_max_ms() -> u64 {
    10_000
}
fn default_dedupe_capacity() -> usize {
    2000
}
fn default_window_secs() -> u64 {
    8
}
fn default_burst_count() -> u32 {
    3
}
