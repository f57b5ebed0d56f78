//! Failed-round breaker for the model API
//!
//! Counts proposal rounds whose API call ultimately failed (after retries).
//! Once `failure_threshold` rounds fail in a row the breaker opens and the
//! proposer refuses to call the API until `cooldown` has passed. The first
//! round after the cool-down is let through as a trial: success closes the
//! breaker, another failure re-opens it for a full cool-down.

use scout_core::config::ModelConfig;
use std::sync::Mutex;
use std::time::{Duration, Instant};

#[derive(Debug, Default)]
struct BreakerState {
    failed_rounds: u32,
    opened_at: Option<Instant>,
}

/// Per-proposer breaker over failed rounds
///
/// ```
/// use scout_agent::CircuitBreaker;
/// use std::time::Duration;
///
/// let breaker = CircuitBreaker::new(2, Duration::from_secs(60));
/// breaker.record_failure();
/// assert!(breaker.check().is_ok());
///
/// breaker.record_failure();
/// assert!(breaker.check().is_err());
/// ```
#[derive(Debug)]
pub struct CircuitBreaker {
    failure_threshold: u32,
    cooldown: Duration,
    state: Mutex<BreakerState>,
}

impl CircuitBreaker {
    pub fn new(failure_threshold: u32, cooldown: Duration) -> Self {
        Self {
            failure_threshold: failure_threshold.max(1),
            cooldown,
            state: Mutex::new(BreakerState::default()),
        }
    }

    /// Build from the `[model]` section
    pub fn from_config(config: &ModelConfig) -> Self {
        Self::new(
            config.failure_threshold,
            Duration::from_secs(config.cooldown_secs),
        )
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, BreakerState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// `Err(remaining)` while the breaker is open
    pub fn check(&self) -> Result<(), Duration> {
        match self.remaining_cooldown() {
            Some(remaining) => Err(remaining),
            None => Ok(()),
        }
    }

    /// Time left before a trial round is allowed, `None` when closed
    pub fn remaining_cooldown(&self) -> Option<Duration> {
        let state = self.lock();
        let opened_at = state.opened_at?;
        self.cooldown
            .checked_sub(opened_at.elapsed())
            .filter(|remaining| !remaining.is_zero())
    }

    pub fn is_open(&self) -> bool {
        self.remaining_cooldown().is_some()
    }

    /// A round got an answer from the API
    pub fn record_success(&self) {
        let mut state = self.lock();
        state.failed_rounds = 0;
        state.opened_at = None;
    }

    /// A round's API call failed for good.
    ///
    /// Returns `true` when this failure opened the breaker.
    pub fn record_failure(&self) -> bool {
        let mut state = self.lock();
        state.failed_rounds += 1;
        if state.failed_rounds >= self.failure_threshold {
            state.opened_at = Some(Instant::now());
            return true;
        }
        false
    }

    /// Failed rounds since the last success
    pub fn failed_rounds(&self) -> u32 {
        self.lock().failed_rounds
    }
}

impl Default for CircuitBreaker {
    fn default() -> Self {
        Self::from_config(&ModelConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread::sleep;

    #[test]
    fn test_defaults_follow_model_config() {
        let breaker = CircuitBreaker::default();
        assert_eq!(breaker.failure_threshold, 3);
        assert_eq!(breaker.cooldown, Duration::from_secs(60));
        assert!(breaker.check().is_ok());
        assert_eq!(breaker.remaining_cooldown(), None);
    }

    #[test]
    fn test_from_config() {
        let config = ModelConfig {
            failure_threshold: 5,
            cooldown_secs: 10,
            ..ModelConfig::default()
        };
        let breaker = CircuitBreaker::from_config(&config);
        for _ in 0..4 {
            assert!(!breaker.record_failure());
        }
        assert!(breaker.record_failure());

        let remaining = breaker.remaining_cooldown().unwrap();
        assert!(remaining <= Duration::from_secs(10));
        assert!(remaining > Duration::from_secs(9));
    }

    #[test]
    fn test_success_clears_failed_rounds() {
        let breaker = CircuitBreaker::new(3, Duration::from_secs(60));
        breaker.record_failure();
        breaker.record_failure();
        assert_eq!(breaker.failed_rounds(), 2);

        breaker.record_success();
        assert_eq!(breaker.failed_rounds(), 0);

        // Needs three fresh failures again
        breaker.record_failure();
        breaker.record_failure();
        assert!(!breaker.is_open());
    }

    #[test]
    fn test_trial_round_after_cooldown() {
        let breaker = CircuitBreaker::new(1, Duration::from_millis(50));
        assert!(breaker.record_failure());
        assert!(breaker.is_open());

        sleep(Duration::from_millis(80));
        assert!(breaker.check().is_ok());

        // Failed trial re-opens for a full cool-down
        assert!(breaker.record_failure());
        assert!(breaker.is_open());
    }

    #[test]
    fn test_zero_threshold_treated_as_one() {
        let breaker = CircuitBreaker::new(0, Duration::from_secs(1));
        assert!(breaker.check().is_ok());
        assert!(breaker.record_failure());
    }
}
