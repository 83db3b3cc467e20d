//! Lightweight in-process metrics (dependency-free).
//!
//! Channel counters are stored as atomics and rendered on demand in the
//! Prometheus text format; the CLI dumps them at shutdown.

pub mod metrics;

pub use metrics::ChannelMetrics;
