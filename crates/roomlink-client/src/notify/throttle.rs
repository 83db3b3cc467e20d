use std::collections::HashMap;
use std::time::{Duration, Instant};

/// What to do with one notification-worthy message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ThrottleDecision {
    /// First message of a window: show it as is.
    Show,
    /// Inside a burst, below the summary threshold.
    Suppress,
    /// Burst reached: show a summary covering `count` messages.
    Summary { count: u32 },
}

#[derive(Debug, Clone, Copy)]
struct Window {
    start: Instant,
    count: u32,
}

/// Per-room burst limiter for notifications.
///
/// Each room gets a fixed window starting at its first hit. Within a window the
/// first hit is shown, later hits are suppressed until `burst` is reached, and
/// from then on each hit is shown as a summary.
#[derive(Debug)]
pub struct NotificationThrottler {
    window: Duration,
    burst: u32,
    rooms: HashMap<String, Window>,
}

impl NotificationThrottler {
    pub fn new(window: Duration, burst: u32) -> Self {
        Self {
            window,
            burst: burst.max(2),
            rooms: HashMap::new(),
        }
    }

    pub fn hit(&mut self, room_id: &str, now: Instant) -> ThrottleDecision {
        let window = self.window;
        let entry = self
            .rooms
            .entry(room_id.to_string())
            .or_insert(Window { start: now, count: 0 });
        if now.saturating_duration_since(entry.start) > window {
            *entry = Window { start: now, count: 0 };
        }
        entry.count = entry.count.saturating_add(1);

        match entry.count {
            1 => ThrottleDecision::Show,
            n if n >= self.burst => ThrottleDecision::Summary { count: n },
            _ => ThrottleDecision::Suppress,
        }
    }

    /// Drop windows that have already expired.
    pub fn prune(&mut self, now: Instant) {
        let window = self.window;
        self.rooms
            .retain(|_, w| now.saturating_duration_since(w.start) <= window);
    }

    pub fn tracked_rooms(&self) -> usize {
        self.rooms.len()
    }
}

impl Default for NotificationThrottler {
    fn default() -> Self {
        Self::new(Duration::from_secs(8), 3)
    }
}
