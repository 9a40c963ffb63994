use serde::{Deserialize, Serialize};
use serde_valid::Validate;
use std::time::Duration;

/// Engine settings, typically read from a small JSON file.
///
/// Every field is optional in the file; missing fields take the defaults below.
/// ```json
/// { "pause_poll_ms": 100, "speed": 1.0, "jitter": 0.0, "event_buffer": 256 }
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, Validate, PartialEq)]
#[serde(default)]
pub struct Settings {
    /// How often a paused runner checks whether it was resumed or stopped.
    #[validate(minimum = 10)]
    #[validate(maximum = 10_000)]
    pub pause_poll_ms: u64,

    /// Playback speed multiplier: delays are divided by this value.
    #[validate(exclusive_minimum = 0.0)]
    #[validate(maximum = 100.0)]
    pub speed: f64,

    /// Random +/- fraction applied to each delay (0.0 disables jitter).
    #[validate(minimum = 0.0)]
    #[validate(maximum = 1.0)]
    pub jitter: f64,

    /// Capacity of the engine event channel.
    #[validate(minimum = 1)]
    pub event_buffer: usize,

    /// Log input instead of simulating it.
    pub dry_run: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            pause_poll_ms: 100,
            speed: 1.0,
            jitter: 0.0,
            event_buffer: 256,
            dry_run: false,
        }
    }
}

impl Settings {
    pub fn pause_poll(&self) -> Duration {
        Duration::from_millis(self.pause_poll_ms)
    }

    /// Wall-clock wait for an action delay after speed and jitter.
    ///
    /// Saturates at `Duration::MAX` for delays too large to represent.
    pub fn pace(&self, delay_secs: f64) -> Duration {
        let mut secs = delay_secs / self.speed;
        if self.jitter > 0.0 && secs.is_finite() && secs > 0.0 {
            let spread = secs * self.jitter;
            secs += rand::random_range(-spread..=spread);
        }
        if secs.is_nan() || secs <= 0.0 {
            return Duration::ZERO;
        }
        Duration::try_from_secs_f64(secs).unwrap_or(Duration::MAX)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pace_without_jitter_is_exact() {
        let s = Settings::default();
        assert_eq!(s.pace(0.5), Duration::from_millis(500));
        assert_eq!(s.pace(0.0), Duration::ZERO);

        let fast = Settings {
            speed: 2.0,
            ..Settings::default()
        };
        assert_eq!(fast.pace(1.0), Duration::from_millis(500));
    }

    #[test]
    fn pace_saturates_huge_delays() {
        let s = Settings::default();
        assert_eq!(s.pace(1e20), Duration::MAX);
        assert_eq!(s.pace(f64::MAX), Duration::MAX);

        let crawl = Settings {
            speed: 1e-300,
            jitter: 0.5,
            ..Settings::default()
        };
        assert_eq!(crawl.pace(1.0), Duration::MAX);
        assert_eq!(crawl.pace(0.0), Duration::ZERO);
    }

    #[test]
    fn pace_with_jitter_stays_in_bounds() {
        let s = Settings {
            jitter: 0.5,
            ..Settings::default()
        };
        for _ in 0..100 {
            let d = s.pace(1.0).as_secs_f64();
            assert!((0.5..=1.5).contains(&d), "{d} out of range");
        }
    }
}
