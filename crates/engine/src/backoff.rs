use rand::Rng;
use std::time::Duration;

use signupforge_core::RetryConfig;

/// Jitter is uniform in [0, 30%) of the base delay, so the actual wait for
/// attempt N lands in [base, base * 1.3].
pub const JITTER_FRACTION: f64 = 0.3;

/// Exponential backoff with a hard cap, derived from a validated config.
#[derive(Debug, Clone)]
pub struct BackoffSchedule {
    initial: Duration,
    max: Duration,
    multiplier: f64,
}

impl BackoffSchedule {
    pub fn from_config(config: &RetryConfig) -> Self {
        Self {
            initial: config.initial_delay(),
            max: config.max_delay(),
            multiplier: config.backoff_multiplier,
        }
    }

    /// Deterministic delay before jitter: min(initial * multiplier^(N-1), max).
    /// `attempt` is 1-based.
    pub fn base_delay(&self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(1).min(i32::MAX as u32) as i32;
        let raw = self.initial.as_millis() as f64 * self.multiplier.powi(exponent);
        let capped = raw.min(self.max.as_millis() as f64);
        Duration::from_millis(capped as u64)
    }

    /// The delay actually slept: base plus uniform random jitter.
    pub fn jittered_delay(&self, attempt: u32) -> Duration {
        let base = self.base_delay(attempt);
        let jitter = rand::thread_rng().gen_range(0.0..JITTER_FRACTION);
        base + Duration::from_millis((base.as_millis() as f64 * jitter) as u64)
    }
}
