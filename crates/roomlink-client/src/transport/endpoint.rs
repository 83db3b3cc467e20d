//! Room endpoint address.
//!
//! `<base without trailing '/'><path with leading '/'>?roomId=<escaped id>`.
//! The room id is escaped like a URI data string: everything outside the
//! RFC 3986 unreserved set is percent-encoded.

use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};

use roomlink_core::error::{Result, RoomLinkError};

const DATA_STRING: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'~');

/// Validated base address; building a room address from it cannot fail.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoint {
    base: String,
    path: String,
}

impl Endpoint {
    pub fn new(ws_base_url: &str, path: &str) -> Result<Self> {
        let base = ws_base_url.trim().trim_end_matches('/');
        let host = base
            .strip_prefix("ws://")
            .or_else(|| base.strip_prefix("wss://"))
            .ok_or_else(|| {
                RoomLinkError::InvalidAddress(format!("{base:?} is not a ws:// or wss:// url"))
            })?;
        if host.is_empty() {
            return Err(RoomLinkError::InvalidAddress("ws base url has no host".into()));
        }

        let path = path.trim();
        let path = if path.starts_with('/') {
            path.to_string()
        } else {
            format!("/{path}")
        };

        Ok(Self {
            base: base.to_string(),
            path,
        })
    }

    pub fn room_url(&self, room_id: &str) -> String {
        format!("{}{}?roomId={}", self.base, self.path, escape_component(room_id))
    }
}

/// Percent-encode everything outside the unreserved set.
pub fn escape_component(s: &str) -> String {
    utf8_percent_encode(s, DATA_STRING).to_string()
}
