//! Retry decisions for transient upstream failures.

use std::time::Duration;

use conduit_core::{CallResult, DispatchConfig};

/// What to do after an attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryDecision {
    /// Wait, then make the next attempt.
    Retry(Duration),
    Stop,
}

/// Stateless exponential backoff over `status >= 500`.
///
/// With the defaults a call gets at most four attempts, waiting 2s, 4s and
/// 8s before attempts 2, 3 and 4. No jitter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Additional attempts after the first.
    pub max_retries: u32,
    /// Delay before the second attempt; doubles for each one after.
    pub initial_backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            initial_backoff: Duration::from_secs(2),
        }
    }
}

impl From<&DispatchConfig> for RetryPolicy {
    fn from(config: &DispatchConfig) -> Self {
        Self {
            max_retries: config.max_retries,
            initial_backoff: config.initial_backoff,
        }
    }
}

impl RetryPolicy {
    /// A policy that never retries.
    pub fn disabled() -> Self {
        Self {
            max_retries: 0,
            initial_backoff: Duration::ZERO,
        }
    }

    /// Decide after `attempt` (1-based) produced `result`.
    pub fn decide(&self, result: &CallResult, attempt: u32) -> RetryDecision {
        if !result.is_transient() || attempt > self.max_retries {
            return RetryDecision::Stop;
        }
        RetryDecision::Retry(self.delay_before(attempt + 1))
    }

    /// Delay inserted before attempt `n` (n >= 2).
    pub fn delay_before(&self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(2);
        self.initial_backoff
            .saturating_mul(2u32.saturating_pow(exponent))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    fn result(status: u16) -> CallResult {
        CallResult::from_upstream(status, String::new(), BTreeMap::new(), Duration::ZERO)
    }

    #[test]
    fn test_backoff_schedule() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.decide(&result(503), 1), RetryDecision::Retry(Duration::from_secs(2)));
        assert_eq!(policy.decide(&result(500), 2), RetryDecision::Retry(Duration::from_secs(4)));
        assert_eq!(policy.decide(&result(502), 3), RetryDecision::Retry(Duration::from_secs(8)));
        assert_eq!(policy.decide(&result(503), 4), RetryDecision::Stop);
    }

    #[test]
    fn test_below_500_never_retries() {
        let policy = RetryPolicy::default();
        for status in [200, 201, 302, 400, 404, 429, 499] {
            assert_eq!(policy.decide(&result(status), 1), RetryDecision::Stop, "status {status}");
        }
    }

    #[test]
    fn test_disabled_policy_stops_on_5xx() {
        assert_eq!(RetryPolicy::disabled().decide(&result(503), 1), RetryDecision::Stop);
    }

    #[test]
    fn test_from_config() {
        let config = DispatchConfig {
            max_retries: 1,
            initial_backoff: Duration::from_millis(100),
            ..Default::default()
        };
        let policy = RetryPolicy::from(&config);
        assert_eq!(policy.decide(&result(500), 1), RetryDecision::Retry(Duration::from_millis(100)));
        assert_eq!(policy.decide(&result(500), 2), RetryDecision::Stop);
    }
}
