use std::time::Duration;

use rand::Rng;

/// Doublings after which the delay stops growing.
const MAX_EXPONENT: u32 = 8;
const JITTER_MIN: f64 = 0.7;
const JITTER_MAX: f64 = 1.3;

/// Exponential reconnect delay with multiplicative jitter.
///
/// `min * 2^min(attempt, 8) * jitter`, capped at `max`. Jitter is uniform in
/// `[0.7, 1.3]`, so a delay may undershoot `min` by up to 30%; only the upper
/// bound is hard.
#[derive(Debug, Clone, Copy)]
pub struct ExponentialBackoff {
    min: Duration,
    max: Duration,
}

impl ExponentialBackoff {
    pub fn new(min: Duration, max: Duration) -> Self {
        Self {
            min,
            max: max.max(min),
        }
    }

    pub fn next_delay(&self, attempt: u32) -> Duration {
        let jitter = rand::thread_rng().gen_range(JITTER_MIN..=JITTER_MAX);
        self.delay_with_jitter(attempt, jitter)
    }

    /// Deterministic core of [`next_delay`](Self::next_delay).
    pub fn delay_with_jitter(&self, attempt: u32, jitter: f64) -> Duration {
        let jitter = jitter.clamp(JITTER_MIN, JITTER_MAX);
        let multiplier = f64::from(1_u32 << attempt.min(MAX_EXPONENT));
        let ms = self.min.as_secs_f64() * 1000.0 * multiplier * jitter;
        let capped = ms.min(self.max.as_secs_f64() * 1000.0);
        Duration::from_micros((capped * 1000.0).round() as u64)
    }
}

impl Default for ExponentialBackoff {
    fn default() -> Self {
        Self::new(Duration::from_millis(400), Duration::from_secs(10))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_near_min() {
        let b = ExponentialBackoff::default();
        assert_eq!(b.delay_with_jitter(0, 1.0), Duration::from_millis(400));
        assert_eq!(b.delay_with_jitter(0, 0.7), Duration::from_millis(280));
        assert_eq!(b.delay_with_jitter(0, 1.3), Duration::from_millis(520));
    }

    #[test]
    fn doubles_per_attempt() {
        let b = ExponentialBackoff::new(Duration::from_millis(100), Duration::from_secs(60));
        assert_eq!(b.delay_with_jitter(3, 1.0), Duration::from_millis(800));
        assert_eq!(b.delay_with_jitter(8, 1.0), Duration::from_millis(25_600));
    }

    #[test]
    fn exponent_is_clamped_at_eight() {
        let b = ExponentialBackoff::new(Duration::from_millis(10), Duration::from_secs(3600));
        for jitter in [0.7, 1.0, 1.3] {
            let at8 = b.delay_with_jitter(8, jitter);
            for a in [9, 12, 40, u32::MAX] {
                assert_eq!(b.delay_with_jitter(a, jitter), at8);
            }
        }
    }

    #[test]
    fn caps_at_max() {
        let b = ExponentialBackoff::default();
        assert_eq!(b.delay_with_jitter(8, 1.3), Duration::from_secs(10));
        assert_eq!(b.delay_with_jitter(5, 1.0), Duration::from_secs(10));
    }

    #[test]
    fn sampled_delays_stay_in_bounds() {
        let b = ExponentialBackoff::default();
        for a in 0..=8u32 {
            let lower = (400.0 * f64::from(1u32 << a) * 0.7).min(10_000.0);
            for _ in 0..200 {
                let d = b.next_delay(a).as_secs_f64() * 1000.0;
                assert!(d + 1e-3 >= lower, "attempt={a} delay={d}");
                assert!(d <= 10_000.0 + 1e-3, "attempt={a} delay={d}");
            }
        }
    }

    #[test]
    fn out_of_range_jitter_is_clamped() {
        let b = ExponentialBackoff::default();
        assert_eq!(b.delay_with_jitter(0, 5.0), b.delay_with_jitter(0, 1.3));
        assert_eq!(b.delay_with_jitter(0, -1.0), b.delay_with_jitter(0, 0.7));
    }
}
