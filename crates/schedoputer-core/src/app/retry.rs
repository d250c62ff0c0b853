//! Retry policy: decides backoff delays after a transient resource failure.

use std::time::Duration;

#[derive(Debug, Clone, PartialEq)]
pub struct RetryPolicy {
    /// Delay after the first failed attempt. Zero means "next tick".
    pub base_delay: Duration,

    pub multiplier: f64,

    /// Upper bound for any single delay.
    pub max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::immediate()
    }
}

impl RetryPolicy {
    /// No backoff: a released task is picked up again on the next tick.
    pub fn immediate() -> Self {
        Self {
            base_delay: Duration::ZERO,
            multiplier: 1.0,
            max_delay: Duration::ZERO,
        }
    }

    pub fn exponential(base_delay: Duration, multiplier: f64, max_delay: Duration) -> Self {
        Self {
            base_delay,
            multiplier,
            max_delay,
        }
    }

    /// Delay before the next attempt, given attempts already made (1-indexed).
    ///
    /// `base_delay * multiplier^(attempts - 1)`, capped at `max_delay`.
    pub fn next_delay(&self, attempts: u32) -> Duration {
        if self.base_delay.is_zero() {
            return Duration::ZERO;
        }
        let exponent = attempts.saturating_sub(1).min(i32::MAX as u32) as i32;
        let secs = self.base_delay.as_secs_f64() * self.multiplier.powi(exponent);
        if !secs.is_finite() || secs >= self.max_delay.as_secs_f64() {
            return self.max_delay;
        }
        Duration::from_secs_f64(secs.max(0.0))
    }

    pub fn is_immediate(&self) -> bool {
        self.base_delay.is_zero()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn default_policy_retries_immediately() {
        let policy = RetryPolicy::default();
        assert!(policy.is_immediate());
        assert_eq!(policy.next_delay(1), Duration::ZERO);
        assert_eq!(policy.next_delay(50), Duration::ZERO);
    }

    #[rstest]
    #[case::first(1, 2)]
    #[case::second(2, 4)]
    #[case::third(3, 8)]
    #[case::capped(6, 30)]
    #[case::far_past_cap(500, 30)]
    fn exponential_backoff_is_capped(#[case] attempts: u32, #[case] expected_secs: u64) {
        let policy = RetryPolicy::exponential(Duration::from_secs(2), 2.0, Duration::from_secs(30));
        assert_eq!(policy.next_delay(attempts), Duration::from_secs(expected_secs));
    }

    #[test]
    fn zero_attempts_uses_base_delay() {
        let policy = RetryPolicy::exponential(Duration::from_secs(2), 2.0, Duration::from_secs(30));
        assert_eq!(policy.next_delay(0), Duration::from_secs(2));
    }
}
