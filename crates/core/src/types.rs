use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Coarse classification of why an attempt failed.
///
/// `is_retriable` is the single partition point the orchestrator consults:
/// most categories mean "this identity was burned, try a fresh one", while
/// malformed requests and unrecognized errors mean the run itself is broken
/// and more attempts would only repeat the same mistake.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RejectionCategory {
    EmailExists,
    PhoneUsed,
    InvalidEmail,
    InvalidPhone,
    DisposableDetected,
    RateLimited,
    Blocked,
    VerificationFailed,
    /// A collaborator ran out of capacity (no numbers in stock, inbox
    /// service down). Kept separate from target-side rejections so the
    /// histogram can tell vendor exhaustion from identity rejection.
    ServiceUnavailable,
    /// Network or timeout fault talking to any collaborator.
    Transport,
    MalformedRequest,
    Unknown,
}

impl RejectionCategory {
    pub fn is_retriable(&self) -> bool {
        !matches!(
            self,
            RejectionCategory::MalformedRequest | RejectionCategory::Unknown
        )
    }
}

/// The full identity submitted on one attempt.
#[derive(Debug, Clone, Serialize)]
pub struct Credentials {
    pub full_name: String,
    pub email: String,
    pub password: String,
    pub phone_number: Option<String>,
    pub phone_service: Option<String>,
}

/// Opaque payload the target returns for an accepted signup.
pub type AccountData = serde_json::Value;

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum AttemptOutcome {
    Success,
    Failed {
        reason: String,
        category: RejectionCategory,
    },
}

impl AttemptOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, AttemptOutcome::Success)
    }
}

/// One completed pass of acquire + submit + verify. Never mutated after the
/// orchestrator appends it to the log.
#[derive(Debug, Clone, Serialize)]
pub struct Attempt {
    /// 1-based position in the run.
    pub sequence: u32,
    pub email: String,
    pub phone_number: Option<String>,
    pub phone_service: Option<String>,
    pub started_at: DateTime<Utc>,
    pub duration_ms: u64,
    pub outcome: AttemptOutcome,
}

/// Aggregate counters for one run. Recomputed as attempts complete and
/// snapshotted into every progress event.
#[derive(Debug, Clone, Default, Serialize)]
pub struct RunStatistics {
    pub total_attempts: u32,
    pub successful_attempts: u32,
    pub failed_attempts: u32,
    pub rejection_counts: HashMap<RejectionCategory, u32>,
    pub average_attempt_ms: u64,
    pub average_backoff_ms: u64,
    pub last_error: Option<String>,
}

/// Where in an attempt the run currently is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RunPhase {
    Starting,
    AcquiringEmail,
    AcquiringPhone,
    Submitting,
    VerifyingEmail,
    VerifyingPhone,
    BackingOff,
    Finished,
}

/// Emitted synchronously to the progress sink during a run. Consumers must
/// not assume a fixed cardinality or timing.
#[derive(Debug, Clone, Serialize)]
pub struct ProgressEvent {
    pub attempt: u32,
    pub max_attempts: u32,
    pub phase: RunPhase,
    pub status: String,
    pub statistics: RunStatistics,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retriable_partition() {
        assert!(RejectionCategory::EmailExists.is_retriable());
        assert!(RejectionCategory::RateLimited.is_retriable());
        assert!(RejectionCategory::ServiceUnavailable.is_retriable());
        assert!(RejectionCategory::Transport.is_retriable());
        assert!(!RejectionCategory::MalformedRequest.is_retriable());
        assert!(!RejectionCategory::Unknown.is_retriable());
    }

    #[test]
    fn test_category_serializes_as_string() {
        let json = serde_json::to_string(&RejectionCategory::DisposableDetected).unwrap();
        assert_eq!(json, "\"disposable_detected\"");
    }

    #[test]
    fn test_histogram_round_trips_through_json() {
        let mut stats = RunStatistics::default();
        stats.rejection_counts.insert(RejectionCategory::EmailExists, 3);
        let json = serde_json::to_value(&stats).unwrap();
        assert_eq!(json["rejection_counts"]["email_exists"], 3);
    }
}
