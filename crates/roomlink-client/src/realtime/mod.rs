//! Realtime runtime for the roomlink client.
//!
//! Backoff policy, dedupe cache, and the reconnecting room channel built on
//! top of them.

pub mod backoff;
pub mod channel;
pub mod dedupe;
pub mod types;

pub use backoff::ExponentialBackoff;
pub use channel::RealtimeChannel;
pub use dedupe::DedupeCache;
pub use types::{ChannelState, MessageStream};
