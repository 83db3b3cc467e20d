//! Shared application state for the roomlink client.
//!
//! Wires config -> connector -> realtime channel, and hands out notification
//! gates built from the same config.

use std::sync::Arc;

use roomlink_core::error::Result;

use crate::config::ClientConfig;
use crate::notify::NotificationGate;
use crate::realtime::RealtimeChannel;
use crate::transport::{Connector, WsConnector};

#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
    channel: RealtimeChannel,
}

struct AppStateInner {
    cfg: ClientConfig,
}

impl AppState {
    /// Build state backed by the WebSocket transport.
    /// Returns Result so main can report a bad config instead of panicking.
    pub fn new(cfg: ClientConfig) -> Result<Self> {
        let keepalive = cfg.realtime.runtime().keepalive_interval;
        Self::with_connector(cfg, Arc::new(WsConnector::new(keepalive)))
    }

    /// Build state with a caller-supplied transport factory.
    pub fn with_connector(cfg: ClientConfig, connector: Arc<dyn Connector>) -> Result<Self> {
        cfg.validate()?;

        let channel = RealtimeChannel::new(cfg.realtime.runtime(), connector)?;
        tracing::debug!(
            base = %cfg.realtime.ws_base_url,
            path = %cfg.realtime.path,
            scope = ?cfg.realtime.state_scope,
            "client state initialized"
        );

        Ok(Self {
            inner: Arc::new(AppStateInner { cfg }),
            channel,
        })
    }

    pub fn cfg(&self) -> &ClientConfig {
        &self.inner.cfg
    }

    pub fn channel(&self) -> RealtimeChannel {
        self.channel.clone()
    }

    pub fn notification_gate(&self) -> NotificationGate {
        NotificationGate::from_config(&self.inner.cfg.notifications)
    }
}
