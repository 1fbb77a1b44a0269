//! Terminal value of a run. Exactly one of the success/failure payloads is
//! populated, enforced by the enum; both carry the full attempt log and
//! statistics.

use serde::Serialize;
use url::Url;

use signupforge_core::{AccountData, Attempt, Credentials, RunStatistics};

use crate::context::RunContext;

/// What verification produced for the winning attempt. The SMS code is
/// best-effort and may be absent even on success.
#[derive(Debug, Clone, Default, Serialize)]
pub struct Verification {
    pub email_link: Option<Url>,
    pub sms_code: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum RunOutcome {
    Success {
        credentials: Credentials,
        account_data: Option<AccountData>,
        verification: Verification,
    },
    Failure {
        error: String,
    },
}

#[derive(Debug, Serialize)]
pub struct RunResult {
    #[serde(flatten)]
    pub outcome: RunOutcome,
    pub attempts: Vec<Attempt>,
    pub statistics: RunStatistics,
    pub elapsed_ms: u64,
}

impl RunResult {
    pub(crate) fn success(
        context: RunContext,
        credentials: Credentials,
        account_data: Option<AccountData>,
        verification: Verification,
    ) -> Self {
        let elapsed_ms = context.elapsed().as_millis() as u64;
        Self {
            outcome: RunOutcome::Success {
                credentials,
                account_data,
                verification,
            },
            attempts: context.attempts,
            statistics: context.stats,
            elapsed_ms,
        }
    }

    pub(crate) fn failure(context: RunContext, error: String) -> Self {
        let elapsed_ms = context.elapsed().as_millis() as u64;
        Self {
            outcome: RunOutcome::Failure { error },
            attempts: context.attempts,
            statistics: context.stats,
            elapsed_ms,
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self.outcome, RunOutcome::Success { .. })
    }

    /// One-line human summary.
    pub fn summary(&self) -> String {
        match &self.outcome {
            RunOutcome::Success { credentials, .. } => format!(
                "account created for {} after {} attempt(s) in {:.1}s",
                credentials.email,
                self.statistics.total_attempts,
                self.elapsed_ms as f64 / 1000.0
            ),
            RunOutcome::Failure { error } => format!(
                "run failed after {} attempt(s) in {:.1}s: {}",
                self.statistics.total_attempts,
                self.elapsed_ms as f64 / 1000.0,
                error
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_summary_and_serialization() {
        let context = RunContext::new(3, Duration::from_secs(300));
        let result = RunResult::failure(context, "failed after 0 attempts".to_string());

        assert!(!result.is_success());
        assert!(result.summary().contains("run failed"));

        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["outcome"], "failure");
        assert!(json.get("attempts").is_some());
        assert!(json.get("statistics").is_some());
    }
}
