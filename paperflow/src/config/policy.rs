//! Retry policy with configurable backoff and jitter.

use crate::errors::ConfigError;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Backoff strategy for retry delays.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BackoffStrategy {
    /// delay = base * 2^attempt
    #[default]
    Exponential,
    /// delay = base * (attempt + 1)
    Linear,
    /// delay = base (constant)
    Constant,
}

/// Jitter strategy to spread out retries from concurrent runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JitterStrategy {
    /// No jitter
    #[default]
    None,
    /// Random from 0 to delay
    Full,
    /// Half fixed, half random
    Equal,
}

/// Attempt count, backoff and per-attempt timeout shared by every stage.
///
/// The policy is immutable once a supervisor is built and is shared
/// read-only across all runs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetryPolicy {
    /// Retries after the first attempt. Total attempts = `max_retries + 1`.
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
    /// Base delay between attempts in seconds.
    #[serde(default = "default_base_delay")]
    pub base_delay_seconds: f64,
    /// Time budget for a single attempt in seconds.
    #[serde(default = "default_timeout")]
    pub timeout_seconds: f64,
    /// Upper bound on any single backoff delay in seconds.
    #[serde(default = "default_max_delay")]
    pub max_delay_seconds: f64,
    /// Backoff strategy.
    #[serde(default)]
    pub backoff: BackoffStrategy,
    /// Jitter strategy.
    #[serde(default)]
    pub jitter: JitterStrategy,
}

fn default_max_retries() -> u32 {
    3
}

fn default_base_delay() -> f64 {
    1.0
}

fn default_timeout() -> f64 {
    30.0
}

fn default_max_delay() -> f64 {
    60.0
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: default_max_retries(),
            base_delay_seconds: default_base_delay(),
            timeout_seconds: default_timeout(),
            max_delay_seconds: default_max_delay(),
            backoff: BackoffStrategy::default(),
            jitter: JitterStrategy::default(),
        }
    }
}

impl RetryPolicy {
    /// Creates a new policy with defaults.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the number of retries.
    #[must_use]
    pub fn with_max_retries(mut self, retries: u32) -> Self {
        self.max_retries = retries;
        self
    }

    /// Sets the base delay.
    #[must_use]
    pub fn with_base_delay_seconds(mut self, seconds: f64) -> Self {
        self.base_delay_seconds = seconds;
        self
    }

    /// Sets the per-attempt timeout.
    #[must_use]
    pub fn with_timeout_seconds(mut self, seconds: f64) -> Self {
        self.timeout_seconds = seconds;
        self
    }

    /// Sets the delay cap.
    #[must_use]
    pub fn with_max_delay_seconds(mut self, seconds: f64) -> Self {
        self.max_delay_seconds = seconds;
        self
    }

    /// Sets the backoff strategy.
    #[must_use]
    pub fn with_backoff(mut self, strategy: BackoffStrategy) -> Self {
        self.backoff = strategy;
        self
    }

    /// Sets the jitter strategy.
    #[must_use]
    pub fn with_jitter(mut self, strategy: JitterStrategy) -> Self {
        self.jitter = strategy;
        self
    }

    /// Total attempts a permanently failing operation receives.
    #[must_use]
    pub fn total_attempts(&self) -> u32 {
        self.max_retries.saturating_add(1)
    }

    /// Gets the per-attempt timeout as a Duration.
    #[must_use]
    pub fn timeout(&self) -> Duration {
        Duration::try_from_secs_f64(self.timeout_seconds).unwrap_or(Duration::MAX)
    }

    /// Calculates the delay to wait after the given 0-indexed attempt fails.
    #[must_use]
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        let base = self.base_delay_seconds;
        let raw = match self.backoff {
            BackoffStrategy::Exponential => {
                base * 2f64.powi(i32::try_from(attempt).unwrap_or(i32::MAX))
            }
            BackoffStrategy::Linear => base * f64::from(attempt.saturating_add(1)),
            BackoffStrategy::Constant => base,
        };
        let delay = raw.min(self.max_delay_seconds).max(0.0);
        if !delay.is_finite() {
            return Duration::MAX;
        }

        let jittered = match self.jitter {
            JitterStrategy::None => delay,
            JitterStrategy::Full => rand::thread_rng().gen_range(0.0..=delay),
            JitterStrategy::Equal => {
                let half = delay / 2.0;
                half + rand::thread_rng().gen_range(0.0..=half)
            }
        };

        Duration::try_from_secs_f64(jittered.max(0.0)).unwrap_or(Duration::MAX)
    }

    /// Checks that every value is in range.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.base_delay_seconds.is_finite() && self.base_delay_seconds > 0.0) {
            return Err(ConfigError::InvalidPolicy(format!(
                "base_delay_seconds must be positive, got {}",
                self.base_delay_seconds
            )));
        }
        if !(self.timeout_seconds.is_finite() && self.timeout_seconds > 0.0) {
            return Err(ConfigError::InvalidPolicy(format!(
                "timeout_seconds must be positive, got {}",
                self.timeout_seconds
            )));
        }
        if !self.max_delay_seconds.is_finite() || self.max_delay_seconds < self.base_delay_seconds {
            return Err(ConfigError::InvalidPolicy(format!(
                "max_delay_seconds ({}) must be at least base_delay_seconds ({})",
                self.max_delay_seconds, self.base_delay_seconds
            )));
        }
        for (name, seconds) in [
            ("timeout_seconds", self.timeout_seconds),
            ("max_delay_seconds", self.max_delay_seconds),
        ] {
            if Duration::try_from_secs_f64(seconds).is_err() {
                return Err(ConfigError::InvalidPolicy(format!(
                    "{name} is too large to represent as a duration, got {seconds}"
                )));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_policy_default() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.max_retries, 3);
        assert_eq!(policy.total_attempts(), 4);
        assert_eq!(policy.timeout(), Duration::from_secs(30));
        assert_eq!(policy.backoff, BackoffStrategy::Exponential);
        assert_eq!(policy.jitter, JitterStrategy::None);
        assert!(policy.validate().is_ok());
    }

    #[test]
    fn test_exponential_delays() {
        let policy = RetryPolicy::new().with_base_delay_seconds(0.25);

        assert_eq!(policy.delay_for_attempt(0), Duration::from_millis(250));
        assert_eq!(policy.delay_for_attempt(1), Duration::from_millis(500));
        assert_eq!(policy.delay_for_attempt(2), Duration::from_millis(1000));
    }

    #[test]
    fn test_linear_and_constant_delays() {
        let linear = RetryPolicy::new()
            .with_base_delay_seconds(1.0)
            .with_backoff(BackoffStrategy::Linear);
        assert_eq!(linear.delay_for_attempt(0), Duration::from_secs(1));
        assert_eq!(linear.delay_for_attempt(2), Duration::from_secs(3));

        let constant = RetryPolicy::new()
            .with_base_delay_seconds(1.0)
            .with_backoff(BackoffStrategy::Constant);
        assert_eq!(constant.delay_for_attempt(5), Duration::from_secs(1));
    }

    #[test]
    fn test_delay_capped_at_max() {
        let policy = RetryPolicy::new()
            .with_base_delay_seconds(1.0)
            .with_max_delay_seconds(5.0);

        assert_eq!(policy.delay_for_attempt(10), Duration::from_secs(5));
        assert_eq!(policy.delay_for_attempt(u32::MAX), Duration::from_secs(5));
    }

    #[test]
    fn test_full_jitter_bounds() {
        let policy = RetryPolicy::new()
            .with_base_delay_seconds(0.5)
            .with_backoff(BackoffStrategy::Constant)
            .with_jitter(JitterStrategy::Full);

        for _ in 0..50 {
            assert!(policy.delay_for_attempt(0) <= Duration::from_millis(500));
        }
    }

    #[test]
    fn test_equal_jitter_bounds() {
        let policy = RetryPolicy::new()
            .with_base_delay_seconds(1.0)
            .with_backoff(BackoffStrategy::Constant)
            .with_jitter(JitterStrategy::Equal);

        for _ in 0..50 {
            let delay = policy.delay_for_attempt(0);
            assert!(delay >= Duration::from_millis(500));
            assert!(delay <= Duration::from_secs(1));
        }
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        assert!(RetryPolicy::new().with_base_delay_seconds(0.0).validate().is_err());
        assert!(RetryPolicy::new().with_timeout_seconds(-1.0).validate().is_err());
        assert!(RetryPolicy::new().with_timeout_seconds(f64::NAN).validate().is_err());
        assert!(RetryPolicy::new()
            .with_base_delay_seconds(2.0)
            .with_max_delay_seconds(1.0)
            .validate()
            .is_err());
        assert!(RetryPolicy::new().with_max_retries(0).validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_unrepresentable_durations() {
        let err = RetryPolicy::new()
            .with_timeout_seconds(1e20)
            .validate()
            .unwrap_err();
        assert!(err.to_string().contains("timeout_seconds"));

        let err = RetryPolicy::new()
            .with_max_delay_seconds(1e20)
            .validate()
            .unwrap_err();
        assert!(err.to_string().contains("max_delay_seconds"));
    }

    #[test]
    fn test_huge_values_saturate_instead_of_panicking() {
        let policy = RetryPolicy::new()
            .with_base_delay_seconds(1e18)
            .with_max_delay_seconds(f64::MAX)
            .with_timeout_seconds(1e20);

        assert_eq!(policy.delay_for_attempt(u32::MAX), Duration::MAX);
        assert_eq!(policy.timeout(), Duration::MAX);

        let unbounded = RetryPolicy::new().with_max_delay_seconds(f64::INFINITY);
        assert_eq!(unbounded.delay_for_attempt(u32::MAX), Duration::MAX);
    }

    #[test]
    fn test_deserialize_partial() {
        let policy: RetryPolicy =
            serde_json::from_str(r#"{"max_retries": 1, "backoff": "linear"}"#).unwrap();
        assert_eq!(policy.max_retries, 1);
        assert_eq!(policy.backoff, BackoffStrategy::Linear);
        assert!((policy.timeout_seconds - 30.0).abs() < f64::EPSILON);
    }
}
