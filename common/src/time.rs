//! Time utilities and constants for fxwatch.

use chrono::{DateTime, Duration, Utc};

/// Timing constants.
pub mod constants {
    use super::Duration;

    /// Interval between scheduled refresh cycles (5 minutes).
    pub fn refresh_interval() -> Duration {
        Duration::minutes(5)
    }

    /// Minimum time between two notifications for one trigger signature (5 minutes).
    pub fn alarm_cooldown() -> Duration {
        Duration::minutes(5)
    }

    /// Upper bound for a single remote rate request (10 seconds).
    pub fn request_timeout() -> Duration {
        Duration::seconds(10)
    }
}

/// A timestamp with timezone (always UTC).
pub type Timestamp = DateTime<Utc>;

/// Get the current timestamp.
pub fn now() -> Timestamp {
    Utc::now()
}

/// Time left until `deadline`, clamped at zero.
pub fn remaining_until(deadline: Timestamp, now: Timestamp) -> Duration {
    let remaining = deadline - now;
    if remaining < Duration::zero() {
        Duration::zero()
    } else {
        remaining
    }
}

/// Duration extensions for convenient conversion.
pub trait DurationExt {
    fn as_std(&self) -> std::time::Duration;
}

impl DurationExt for Duration {
    fn as_std(&self) -> std::time::Duration {
        self.to_std().unwrap_or(std::time::Duration::ZERO)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_remaining_until() {
        let base = now();
        assert_eq!(
            remaining_until(base + Duration::seconds(30), base),
            Duration::seconds(30)
        );
        assert_eq!(remaining_until(base - Duration::seconds(5), base), Duration::zero());
    }

    #[test]
    fn test_as_std_clamps_negative() {
        assert_eq!(Duration::seconds(-1).as_std(), std::time::Duration::ZERO);
        assert_eq!(
            constants::refresh_interval().as_std(),
            std::time::Duration::from_secs(300)
        );
    }
}
