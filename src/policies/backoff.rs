//! # Backoff policy for relaunch delays.
//!
//! [`BackoffPolicy`] controls how long the supervisor waits after a failed
//! attempt before launching the tracker again. It is parameterized by:
//! - [`BackoffPolicy::first`] the delay after the first failure;
//! - [`BackoffPolicy::factor`] the multiplicative growth factor;
//! - [`BackoffPolicy::max`] the maximum delay cap.
//!
//! The delay after attempt `n` (1-based) is `first × factor^(n-1)`, clamped
//! to `max`. With the default `factor = 1.0` the delay is constant — the
//! tracker deployment runs a fixed inter-restart delay so the operator can
//! predict exactly when the camera pipeline comes back.
//!
//! # Example
//! ```rust
//! use std::time::Duration;
//! use trackvisor::BackoffPolicy;
//!
//! let backoff = BackoffPolicy {
//!     first: Duration::from_secs(1),
//!     max: Duration::from_secs(8),
//!     factor: 2.0,
//! };
//!
//! // After attempt 1 — uses `first`
//! assert_eq!(backoff.delay(1), Duration::from_secs(1));
//!
//! // After attempt 3 — first × factor^2 = 4s
//! assert_eq!(backoff.delay(3), Duration::from_secs(4));
//!
//! // After attempt 10 — 1s × 2^9 = 512s → capped at max=8s
//! assert_eq!(backoff.delay(10), Duration::from_secs(8));
//! ```

use std::time::Duration;

/// Relaunch delay policy.
#[derive(Clone, Copy, Debug)]
pub struct BackoffPolicy {
    /// Delay after the first failed attempt.
    pub first: Duration,
    /// Maximum delay cap.
    pub max: Duration,
    /// Multiplicative growth factor (`>= 1.0` recommended).
    pub factor: f64,
}

impl Default for BackoffPolicy {
    /// Returns a constant 5-second delay:
    /// - `first = 5s`;
    /// - `factor = 1.0`;
    /// - `max = 5s`.
    fn default() -> Self {
        Self::fixed(Duration::from_secs(5))
    }
}

impl BackoffPolicy {
    /// A constant delay: every retry waits exactly `delay`.
    pub fn fixed(delay: Duration) -> Self {
        Self {
            first: delay,
            max: delay,
            factor: 1.0,
        }
    }

    /// Computes the delay after the given attempt number (1-based).
    ///
    /// The base delay is `first × factor^(attempt-1)`, clamped to
    /// [`BackoffPolicy::max`]. Non-finite or negative intermediate values
    /// (possible with extreme factors) clamp to `max`.
    pub fn delay(&self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(1).min(i32::MAX as u32) as i32;
        let max_secs = self.max.as_secs_f64();
        let unclamped = self.first.as_secs_f64() * self.factor.powi(exponent);

        if !unclamped.is_finite() || unclamped < 0.0 || unclamped > max_secs {
            self.max
        } else {
            Duration::from_secs_f64(unclamped)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_attempt_uses_first_delay() {
        let policy = BackoffPolicy {
            first: Duration::from_millis(100),
            max: Duration::from_secs(30),
            factor: 2.0,
        };
        assert_eq!(policy.delay(1), Duration::from_millis(100));
    }

    #[test]
    fn exponential_growth() {
        let policy = BackoffPolicy {
            first: Duration::from_millis(100),
            max: Duration::from_secs(30),
            factor: 2.0,
        };

        assert_eq!(policy.delay(1), Duration::from_millis(100));
        assert_eq!(policy.delay(2), Duration::from_millis(200));
        assert_eq!(policy.delay(3), Duration::from_millis(400));
        assert_eq!(policy.delay(4), Duration::from_millis(800));
    }

    #[test]
    fn fixed_delay_is_constant() {
        let policy = BackoffPolicy::fixed(Duration::from_secs(5));
        for attempt in 1..20 {
            assert_eq!(
                policy.delay(attempt),
                Duration::from_secs(5),
                "attempt {} should wait a constant 5s",
                attempt
            );
        }
    }

    #[test]
    fn clamped_to_max() {
        let policy = BackoffPolicy {
            first: Duration::from_millis(100),
            max: Duration::from_secs(1),
            factor: 2.0,
        };
        assert_eq!(policy.delay(10), Duration::from_secs(1));
    }

    #[test]
    fn first_exceeding_max_clamps() {
        let policy = BackoffPolicy {
            first: Duration::from_secs(10),
            max: Duration::from_secs(5),
            factor: 2.0,
        };
        assert_eq!(policy.delay(1), Duration::from_secs(5));
    }

    #[test]
    fn huge_attempt_clamps_to_max() {
        let policy = BackoffPolicy {
            first: Duration::from_millis(100),
            max: Duration::from_secs(60),
            factor: 2.0,
        };
        assert_eq!(policy.delay(u32::MAX), Duration::from_secs(60));
    }
}
