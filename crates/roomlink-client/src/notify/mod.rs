//! Notification gating.
//!
//! Turns channel messages into notices for rooms the user is not looking at,
//! throttled per room. Rendering is left to a [`Notifier`] implementation.

pub mod gate;
pub mod throttle;

pub use gate::{deep_link, LogNotifier, Notice, NotificationGate, Notifier, ViewState};
pub use throttle::{NotificationThrottler, ThrottleDecision};
