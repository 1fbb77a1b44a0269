use serde::Deserialize;
use std::time::Duration;

use crate::error::ProvisionError;

/// Hard cap on attempts per run, independent of what the config asks for.
pub const MAX_ATTEMPT_CAP: u32 = 20;

/// Wall-clock budget bounds in minutes. Free-only collaborator stacks are
/// slower (longer poll intervals, lower vendor capacity), so they get a
/// higher floor.
pub const MIN_BUDGET_MINUTES: u64 = 5;
pub const MIN_BUDGET_MINUTES_FREE: u64 = 10;
pub const MAX_BUDGET_MINUTES: u64 = 60;

#[derive(Debug, Deserialize, Clone, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub retry: RetryConfig,
    #[serde(default)]
    pub verification: VerificationConfig,
    pub target: Option<TargetConfig>,
}

/// Parameters of one orchestration run. Immutable once the run starts.
#[derive(Debug, Deserialize, Clone)]
pub struct RetryConfig {
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
    #[serde(default = "default_budget_minutes")]
    pub budget_minutes: u64,
    #[serde(default = "default_initial_delay_ms")]
    pub initial_delay_ms: u64,
    #[serde(default = "default_max_delay_ms")]
    pub max_delay_ms: u64,
    #[serde(default = "default_backoff_multiplier")]
    pub backoff_multiplier: f64,
    /// Set when every collaborator in the stack is a free/degraded one.
    #[serde(default)]
    pub free_services_only: bool,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            budget_minutes: default_budget_minutes(),
            initial_delay_ms: default_initial_delay_ms(),
            max_delay_ms: default_max_delay_ms(),
            backoff_multiplier: default_backoff_multiplier(),
            free_services_only: false,
        }
    }
}

impl RetryConfig {
    /// Validate bounds. Called before any attempt starts; a bad config is the
    /// one condition that fails a run without producing an attempt log.
    pub fn validate(&self) -> Result<(), ProvisionError> {
        if self.max_attempts < 1 || self.max_attempts > MAX_ATTEMPT_CAP {
            return Err(ProvisionError::Configuration(format!(
                "max_attempts must be within [1, {}], got {}",
                MAX_ATTEMPT_CAP, self.max_attempts
            )));
        }

        let min_budget = if self.free_services_only {
            MIN_BUDGET_MINUTES_FREE
        } else {
            MIN_BUDGET_MINUTES
        };
        if self.budget_minutes < min_budget || self.budget_minutes > MAX_BUDGET_MINUTES {
            return Err(ProvisionError::Configuration(format!(
                "budget_minutes must be within [{}, {}], got {}",
                min_budget, MAX_BUDGET_MINUTES, self.budget_minutes
            )));
        }

        if self.initial_delay_ms == 0 {
            return Err(ProvisionError::Configuration(
                "initial_delay_ms must be positive".to_string(),
            ));
        }
        if self.initial_delay_ms > self.max_delay_ms {
            return Err(ProvisionError::Configuration(format!(
                "initial_delay_ms ({}) exceeds max_delay_ms ({})",
                self.initial_delay_ms, self.max_delay_ms
            )));
        }
        if self.backoff_multiplier <= 1.0 {
            return Err(ProvisionError::Configuration(format!(
                "backoff_multiplier must be > 1.0, got {}",
                self.backoff_multiplier
            )));
        }

        Ok(())
    }

    pub fn budget(&self) -> Duration {
        Duration::from_secs(self.budget_minutes * 60)
    }

    pub fn initial_delay(&self) -> Duration {
        Duration::from_millis(self.initial_delay_ms)
    }

    pub fn max_delay(&self) -> Duration {
        Duration::from_millis(self.max_delay_ms)
    }
}

/// Tuning for the verification poll loops (email link, SMS code).
#[derive(Debug, Deserialize, Clone)]
pub struct VerificationConfig {
    #[serde(default = "default_poll_interval_secs")]
    pub poll_interval_secs: u64,
    #[serde(default = "default_email_timeout_secs")]
    pub email_timeout_secs: u64,
    #[serde(default = "default_sms_timeout_secs")]
    pub sms_timeout_secs: u64,
}

impl Default for VerificationConfig {
    fn default() -> Self {
        Self {
            poll_interval_secs: default_poll_interval_secs(),
            email_timeout_secs: default_email_timeout_secs(),
            sms_timeout_secs: default_sms_timeout_secs(),
        }
    }
}

impl VerificationConfig {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs)
    }

    pub fn email_timeout(&self) -> Duration {
        Duration::from_secs(self.email_timeout_secs)
    }

    pub fn sms_timeout(&self) -> Duration {
        Duration::from_secs(self.sms_timeout_secs)
    }
}

/// Where the HTTP-backed account client submits signups.
#[derive(Debug, Deserialize, Clone)]
pub struct TargetConfig {
    pub signup_url: String,
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
    pub invite_code: Option<String>,
}

fn default_max_attempts() -> u32 { 10 }
fn default_budget_minutes() -> u64 { 30 }
fn default_initial_delay_ms() -> u64 { 30_000 }
fn default_max_delay_ms() -> u64 { 300_000 }
fn default_backoff_multiplier() -> f64 { 1.5 }
fn default_poll_interval_secs() -> u64 { 10 }
fn default_email_timeout_secs() -> u64 { 300 }
fn default_sms_timeout_secs() -> u64 { 180 }
fn default_request_timeout_secs() -> u64 { 30 }
fn default_user_agent() -> String {
    "Mozilla/5.0 (Windows NT 10.0; rv:109.0) Gecko/20100101 Firefox/115.0".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base() -> RetryConfig {
        RetryConfig {
            max_attempts: 5,
            budget_minutes: 30,
            initial_delay_ms: 1_000,
            max_delay_ms: 10_000,
            backoff_multiplier: 2.0,
            free_services_only: false,
        }
    }

    #[test]
    fn test_valid_config_passes() {
        assert!(base().validate().is_ok());
    }

    #[test]
    fn test_attempt_bounds() {
        let mut config = base();
        config.max_attempts = 0;
        assert!(config.validate().is_err());
        config.max_attempts = 21;
        assert!(config.validate().is_err());
        config.max_attempts = 1;
        assert!(config.validate().is_ok());
        config.max_attempts = 20;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_budget_bounds() {
        let mut config = base();
        config.budget_minutes = 4;
        assert!(config.validate().is_err());
        config.budget_minutes = 61;
        assert!(config.validate().is_err());
        config.budget_minutes = 5;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_free_services_raise_budget_floor() {
        let mut config = base();
        config.free_services_only = true;
        config.budget_minutes = 5;
        assert!(config.validate().is_err());
        config.budget_minutes = 10;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_delay_ordering() {
        let mut config = base();
        config.initial_delay_ms = 20_000;
        config.max_delay_ms = 10_000;
        assert!(config.validate().is_err());

        let mut config = base();
        config.initial_delay_ms = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_multiplier_must_grow() {
        let mut config = base();
        config.backoff_multiplier = 1.0;
        assert!(config.validate().is_err());
        config.backoff_multiplier = 0.5;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_toml_defaults() {
        let config: AppConfig = toml::from_str("").unwrap();
        assert_eq!(config.retry.max_attempts, 10);
        assert_eq!(config.retry.backoff_multiplier, 1.5);
        assert_eq!(config.verification.poll_interval_secs, 10);
        assert!(config.target.is_none());
    }
}
