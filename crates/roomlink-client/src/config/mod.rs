//! Client config loader (strict parsing).

pub mod schema;

use std::fs;
use std::io::ErrorKind;

use roomlink_core::error::{Result, RoomLinkError};

pub use schema::{
    BackoffSection, ClientConfig, DedupeSection, NotificationSection, RealtimeConfig,
    RealtimeSection, StateScope,
};

pub fn load_from_file(path: &str) -> Result<ClientConfig> {
    let s = fs::read_to_string(path)
        .map_err(|e| RoomLinkError::InvalidConfig(format!("read config failed: {e}")))?;
    load_from_str(&s)
}

/// Like [`load_from_file`], but a missing file yields the built-in defaults.
pub fn load_or_default(path: &str) -> Result<ClientConfig> {
    match fs::read_to_string(path) {
        Ok(s) => load_from_str(&s),
        Err(e) if e.kind() == ErrorKind::NotFound => {
            tracing::info!(%path, "config file not found; using defaults");
            Ok(ClientConfig::default())
        }
        Err(e) => Err(RoomLinkError::InvalidConfig(format!("read config failed: {e}"))),
    }
}

pub fn load_from_str(s: &str) -> Result<ClientConfig> {
    let cfg: ClientConfig = serde_yaml::from_str(s)
        .map_err(|e| RoomLinkError::InvalidConfig(format!("invalid yaml: {e}")))?;
    cfg.validate()?;
    Ok(cfg)
}
