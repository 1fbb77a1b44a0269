//! Per-run bookkeeping: the attempt log, accumulated statistics and budget
//! arithmetic. One context is owned exclusively by one run.

use std::time::{Duration, Instant};

use signupforge_core::{Attempt, AttemptOutcome, RunStatistics};

pub struct RunContext {
    started: Instant,
    budget: Duration,
    max_attempts: u32,
    pub attempts: Vec<Attempt>,
    pub stats: RunStatistics,
    attempt_ms_sum: u128,
    backoff_ms_sum: u128,
    backoff_count: u32,
}

impl RunContext {
    pub fn new(max_attempts: u32, budget: Duration) -> Self {
        Self {
            started: Instant::now(),
            budget,
            max_attempts,
            attempts: Vec::new(),
            stats: RunStatistics::default(),
            attempt_ms_sum: 0,
            backoff_ms_sum: 0,
            backoff_count: 0,
        }
    }

    pub fn elapsed(&self) -> Duration {
        self.started.elapsed()
    }

    pub fn remaining_budget(&self) -> Duration {
        self.budget.saturating_sub(self.elapsed())
    }

    /// The budget is only consulted between attempts; an in-flight attempt
    /// always runs to completion.
    pub fn can_continue(&self) -> bool {
        (self.attempts.len() as u32) < self.max_attempts && self.elapsed() < self.budget
    }

    pub fn next_attempt_number(&self) -> u32 {
        self.attempts.len() as u32 + 1
    }

    /// Append a completed attempt and fold it into the statistics. Records
    /// are never touched again after this.
    pub fn record(&mut self, attempt: Attempt) {
        self.attempt_ms_sum += u128::from(attempt.duration_ms);

        match &attempt.outcome {
            AttemptOutcome::Success => self.stats.successful_attempts += 1,
            AttemptOutcome::Failed { reason, category } => {
                self.stats.failed_attempts += 1;
                *self.stats.rejection_counts.entry(*category).or_insert(0) += 1;
                self.stats.last_error = Some(reason.clone());
            }
        }

        self.attempts.push(attempt);
        self.stats.total_attempts = self.attempts.len() as u32;
        self.stats.average_attempt_ms =
            (self.attempt_ms_sum / self.attempts.len() as u128) as u64;
    }

    pub fn record_backoff(&mut self, delay: Duration) {
        self.backoff_ms_sum += delay.as_millis();
        self.backoff_count += 1;
        self.stats.average_backoff_ms =
            (self.backoff_ms_sum / u128::from(self.backoff_count)) as u64;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use signupforge_core::RejectionCategory;

    fn failed_attempt(sequence: u32) -> Attempt {
        Attempt {
            sequence,
            email: format!("a{}@inbox.example", sequence),
            phone_number: None,
            phone_service: None,
            started_at: Utc::now(),
            duration_ms: 100,
            outcome: AttemptOutcome::Failed {
                reason: "email already exists".to_string(),
                category: RejectionCategory::EmailExists,
            },
        }
    }

    #[test]
    fn test_attempt_cap_stops_continuation() {
        let mut context = RunContext::new(2, Duration::from_secs(300));
        assert!(context.can_continue());
        context.record(failed_attempt(1));
        assert!(context.can_continue());
        context.record(failed_attempt(2));
        assert!(!context.can_continue());
    }

    #[test]
    fn test_budget_exhaustion_stops_continuation() {
        let context = RunContext::new(10, Duration::ZERO);
        assert!(!context.can_continue());
    }

    #[test]
    fn test_statistics_accumulate() {
        let mut context = RunContext::new(5, Duration::from_secs(300));
        context.record(failed_attempt(1));
        context.record(failed_attempt(2));

        assert_eq!(context.stats.total_attempts, 2);
        assert_eq!(context.stats.failed_attempts, 2);
        assert_eq!(context.stats.successful_attempts, 0);
        assert_eq!(
            context.stats.rejection_counts[&RejectionCategory::EmailExists],
            2
        );
        assert_eq!(context.stats.average_attempt_ms, 100);
        assert_eq!(
            context.stats.last_error.as_deref(),
            Some("email already exists")
        );
    }

    #[test]
    fn test_average_backoff() {
        let mut context = RunContext::new(5, Duration::from_secs(300));
        context.record_backoff(Duration::from_millis(1_000));
        context.record_backoff(Duration::from_millis(3_000));
        assert_eq!(context.stats.average_backoff_ms, 2_000);
    }
}
