use std::time::Duration;

use tokio_retry::strategy::{jitter, ExponentialBackoff};

/// Bounded retry with exponential backoff and full jitter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts, including the first one.
    pub max_attempts: u32,
    pub initial_backoff: Duration,
    pub max_backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_backoff: Duration::from_millis(100),
            max_backoff: Duration::from_secs(1),
        }
    }
}

impl RetryPolicy {
    /// Delays between attempts: one fewer than `max_attempts`, doubling from
    /// `initial_backoff`, capped at `max_backoff`, each jittered downwards.
    pub fn delays(&self) -> impl Iterator<Item = Duration> {
        let retries = self.max_attempts.saturating_sub(1) as usize;
        let factor = (self.initial_backoff.as_millis() as u64 / 2).max(1);

        ExponentialBackoff::from_millis(2)
            .factor(factor)
            .max_delay(self.max_backoff)
            .map(jitter)
            .take(retries)
    }

    /// Upper bound on the time spent sleeping between attempts.
    pub fn max_total_backoff(&self) -> Duration {
        self.max_backoff * self.max_attempts.saturating_sub(1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_one_delay_per_retry() {
        let policy = RetryPolicy { max_attempts: 4, ..RetryPolicy::default() };
        assert_eq!(policy.delays().count(), 3);
    }

    #[test]
    fn test_single_attempt_never_sleeps() {
        let policy = RetryPolicy { max_attempts: 1, ..RetryPolicy::default() };
        assert_eq!(policy.delays().count(), 0);
        assert_eq!(policy.max_total_backoff(), Duration::ZERO);
    }

    #[test]
    fn test_delays_never_exceed_cap() {
        let policy = RetryPolicy {
            max_attempts: 10,
            initial_backoff: Duration::from_millis(200),
            max_backoff: Duration::from_millis(500),
        };
        assert!(policy.delays().all(|delay| delay <= Duration::from_millis(500)));
    }
}
