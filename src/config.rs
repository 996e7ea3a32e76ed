//! # Global runtime configuration.
//!
//! Provides [`Config`], the settings the supervisor loop runs with: the
//! restart budget, the retry delay policy, and the event bus capacity.
//!
//! Paths (log sink, env file, template) are not part of `Config`; they are
//! resolved by the binary against the supervisor's own directory and handed
//! to [`TeeWriter`](crate::TeeWriter) and
//! [`RuntimeEnv`](crate::RuntimeEnv) directly.

use crate::policies::{BackoffPolicy, RestartBudget};

/// Configuration for the supervisor loop.
///
/// ## Field semantics
/// - `budget`: how many launch attempts are allowed before giving up
/// - `backoff`: delay between a failed attempt and the next launch
/// - `bus_capacity`: event bus ring buffer size (min 1; clamped)
#[derive(Clone, Copy, Debug)]
pub struct Config {
    /// Bounded launch-attempt budget.
    pub budget: RestartBudget,

    /// Delay policy between failed attempts.
    ///
    /// The default is a constant delay, which is what the tracker
    /// deployment uses; a growth factor is available for installations
    /// where a flapping camera should back off harder.
    pub backoff: BackoffPolicy,

    /// Capacity of the event bus broadcast ring buffer.
    ///
    /// Slow subscribers that lag behind more than `bus_capacity` events
    /// observe `Lagged` and skip older items. Minimum value is 1.
    pub bus_capacity: usize,
}

impl Config {
    /// Returns a bus capacity clamped to a minimum of 1.
    #[inline]
    pub fn bus_capacity_clamped(&self) -> usize {
        self.bus_capacity.max(1)
    }
}

impl Default for Config {
    /// Default configuration:
    ///
    /// - `budget = 10 attempts`
    /// - `backoff = BackoffPolicy::default()` (constant 5s)
    /// - `bus_capacity = 1024`
    fn default() -> Self {
        Self {
            budget: RestartBudget::default(),
            backoff: BackoffPolicy::default(),
            bus_capacity: 1024,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bus_capacity_is_clamped() {
        let cfg = Config {
            bus_capacity: 0,
            ..Config::default()
        };
        assert_eq!(cfg.bus_capacity_clamped(), 1);
    }
}
