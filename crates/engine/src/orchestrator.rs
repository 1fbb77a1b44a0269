//! The retry orchestrator: drives sequential provisioning attempts against
//! injected collaborators, with exponential backoff between failures, bounded
//! by an attempt cap and a wall-clock budget.
//!
//! One orchestrator instance serves one run; nothing is shared across
//! concurrent runs. Collaborator faults never escape `run` — they become
//! failed attempts in the log. The only `Err` a caller can see is a bad
//! config, raised before the first attempt.

use chrono::Utc;
use std::time::Duration;
use tokio::time::{sleep, Instant};
use tracing::{debug, info, warn};

use signupforge_core::{
    AccountData, Attempt, AttemptOutcome, Credentials, ProgressEvent, ProvisionError,
    RejectionCategory, RetryConfig, RunPhase, RunStatistics, VerificationConfig,
};

use crate::backoff::BackoffSchedule;
use crate::classifier::{categorize_error, classify};
use crate::context::RunContext;
use crate::identity;
use crate::poll::{PollOutcome, Poller};
use crate::providers::{AccountClient, CredentialProvider};
use crate::result::{RunResult, Verification};

/// Receives progress events synchronously during a run. Implementations are
/// expected to be cheap; a panicking sink is swallowed, never propagated.
pub trait ProgressSink: Send + Sync {
    fn on_progress(&self, event: &ProgressEvent);
}

/// Sink that discards everything.
pub struct NullSink;

impl ProgressSink for NullSink {
    fn on_progress(&self, _event: &ProgressEvent) {}
}

/// Adapter so a plain closure can serve as a sink.
pub struct FnSink<F>(pub F);

impl<F> ProgressSink for FnSink<F>
where
    F: Fn(&ProgressEvent) + Send + Sync,
{
    fn on_progress(&self, event: &ProgressEvent) {
        (self.0)(event)
    }
}

struct AttemptReport {
    email: String,
    phone_number: Option<String>,
    phone_service: Option<String>,
    disposition: AttemptDisposition,
}

enum AttemptDisposition {
    Accepted {
        credentials: Credentials,
        account_data: Option<AccountData>,
        verification: Verification,
    },
    Failed {
        reason: String,
        category: RejectionCategory,
    },
}

pub struct Orchestrator {
    config: RetryConfig,
    provider: Box<dyn CredentialProvider>,
    client: Box<dyn AccountClient>,
    poll_interval: Duration,
    email_timeout: Duration,
    sms_timeout: Duration,
}

impl Orchestrator {
    /// Collaborators are injected per run; the orchestrator never caches
    /// clients across runs.
    pub fn new(
        config: RetryConfig,
        verification: &VerificationConfig,
        provider: Box<dyn CredentialProvider>,
        client: Box<dyn AccountClient>,
    ) -> Self {
        Self {
            config,
            provider,
            client,
            poll_interval: verification.poll_interval(),
            email_timeout: verification.email_timeout(),
            sms_timeout: verification.sms_timeout(),
        }
    }

    #[cfg(test)]
    fn with_poll_timing(mut self, interval: Duration, email: Duration, sms: Duration) -> Self {
        self.poll_interval = interval;
        self.email_timeout = email;
        self.sms_timeout = sms;
        self
    }

    /// Run to completion. Returns `Err` only for an invalid config; every
    /// other outcome — success, exhausted budget, non-retriable rejection —
    /// arrives as a structured `RunResult`.
    pub async fn run(&self, sink: &dyn ProgressSink) -> Result<RunResult, ProvisionError> {
        self.config.validate()?;
        // A zero interval would turn the verification polls into busy spins.
        if self.poll_interval.is_zero() {
            return Err(ProvisionError::Configuration(
                "verification poll interval must be positive".to_string(),
            ));
        }
        Ok(self.run_inner(sink, self.config.budget()).await)
    }

    async fn run_inner(&self, sink: &dyn ProgressSink, budget: Duration) -> RunResult {
        let schedule = BackoffSchedule::from_config(&self.config);
        let mut context = RunContext::new(self.config.max_attempts, budget);

        info!(
            max_attempts = self.config.max_attempts,
            budget_secs = budget.as_secs(),
            "starting provisioning run"
        );

        while context.can_continue() {
            let attempt_no = context.next_attempt_number();
            self.emit(
                sink,
                &context.stats,
                attempt_no,
                RunPhase::Starting,
                format!("starting attempt {}/{}", attempt_no, self.config.max_attempts),
            );

            let started_at = Utc::now();
            let clock = Instant::now();
            let report = self.execute_attempt(sink, attempt_no, &context.stats).await;
            let duration_ms = clock.elapsed().as_millis() as u64;

            match report.disposition {
                AttemptDisposition::Accepted {
                    credentials,
                    account_data,
                    verification,
                } => {
                    context.record(Attempt {
                        sequence: attempt_no,
                        email: report.email,
                        phone_number: report.phone_number,
                        phone_service: report.phone_service,
                        started_at,
                        duration_ms,
                        outcome: AttemptOutcome::Success,
                    });
                    info!(
                        attempt = attempt_no,
                        email = %credentials.email,
                        "account created"
                    );
                    self.emit(
                        sink,
                        &context.stats,
                        attempt_no,
                        RunPhase::Finished,
                        "account created",
                    );
                    return RunResult::success(context, credentials, account_data, verification);
                }
                AttemptDisposition::Failed { reason, category } => {
                    warn!(attempt = attempt_no, %reason, ?category, "attempt failed");
                    context.record(Attempt {
                        sequence: attempt_no,
                        email: report.email,
                        phone_number: report.phone_number,
                        phone_service: report.phone_service,
                        started_at,
                        duration_ms,
                        outcome: AttemptOutcome::Failed {
                            reason: reason.clone(),
                            category,
                        },
                    });

                    if !category.is_retriable() {
                        warn!(?category, "non-retriable rejection, stopping run");
                        break;
                    }
                    if !context.can_continue() {
                        break;
                    }

                    let delay = schedule.jittered_delay(attempt_no);
                    if delay >= context.remaining_budget() {
                        debug!(
                            delay_ms = delay.as_millis() as u64,
                            "backoff would outlast the remaining budget, stopping run"
                        );
                        break;
                    }

                    self.emit(
                        sink,
                        &context.stats,
                        attempt_no,
                        RunPhase::BackingOff,
                        format!(
                            "waiting {:.1}s before attempt {}",
                            delay.as_secs_f64(),
                            attempt_no + 1
                        ),
                    );
                    context.record_backoff(delay);
                    sleep(delay).await;
                }
            }
        }

        let error = match &context.stats.last_error {
            Some(last) => format!(
                "failed after {} attempt(s): {}",
                context.stats.total_attempts, last
            ),
            None => "wall-clock budget exhausted before any attempt completed".to_string(),
        };
        warn!(%error, "provisioning run failed");
        self.emit(
            sink,
            &context.stats,
            context.stats.total_attempts,
            RunPhase::Finished,
            "run failed",
        );
        RunResult::failure(context, error)
    }

    /// One full pass: acquire credentials, submit, verify. Runs to completion
    /// once started; the budget is only consulted between attempts.
    async fn execute_attempt(
        &self,
        sink: &dyn ProgressSink,
        attempt_no: u32,
        stats: &RunStatistics,
    ) -> AttemptReport {
        self.emit(
            sink,
            stats,
            attempt_no,
            RunPhase::AcquiringEmail,
            "acquiring disposable mailbox",
        );
        let mailbox = match self.provider.acquire_email().await {
            Ok(mailbox) => mailbox,
            Err(e) => {
                return AttemptReport {
                    email: String::new(),
                    phone_number: None,
                    phone_service: None,
                    disposition: AttemptDisposition::Failed {
                        reason: e.to_string(),
                        category: categorize_error(&e),
                    },
                }
            }
        };
        info!(email = %mailbox.address, provider = %mailbox.provider, "mailbox acquired");

        // Phone acquisition is best-effort: no stock means we proceed
        // without a number, it is never an attempt failure by itself.
        self.emit(
            sink,
            stats,
            attempt_no,
            RunPhase::AcquiringPhone,
            "acquiring phone number",
        );
        let phone = match self.provider.acquire_phone().await {
            Ok(Some(handle)) => {
                info!(number = %handle.number, service = %handle.service, "phone acquired");
                Some(handle)
            }
            Ok(None) => {
                info!("no phone number available, proceeding without one");
                None
            }
            Err(e) => {
                warn!(error = %e, "phone acquisition failed, proceeding without one");
                None
            }
        };

        let email = mailbox.address.clone();
        let phone_number = phone.as_ref().map(|p| p.number.clone());
        let phone_service = phone.as_ref().map(|p| p.service.clone());

        let credentials = Credentials {
            full_name: identity::generate_full_name(),
            email: email.clone(),
            password: identity::generate_password(),
            phone_number: phone_number.clone(),
            phone_service: phone_service.clone(),
        };

        self.emit(
            sink,
            stats,
            attempt_no,
            RunPhase::Submitting,
            format!("submitting signup for {}", credentials.email),
        );
        let submission = match self.client.create_account(&credentials).await {
            Ok(submission) => submission,
            Err(e) => {
                return AttemptReport {
                    email,
                    phone_number,
                    phone_service,
                    disposition: AttemptDisposition::Failed {
                        reason: e.to_string(),
                        category: categorize_error(&e),
                    },
                }
            }
        };

        if !submission.accepted {
            let reason = submission
                .error_message
                .unwrap_or_else(|| "account creation failed".to_string());
            let category = classify(&reason, submission.response_body.as_deref());
            return AttemptReport {
                email,
                phone_number,
                phone_service,
                disposition: AttemptDisposition::Failed { reason, category },
            };
        }

        // The account is unusable without the email confirmation, so a
        // missing verification message burns this identity.
        self.emit(
            sink,
            stats,
            attempt_no,
            RunPhase::VerifyingEmail,
            "waiting for verification email",
        );
        let email_poller = Poller::new(self.poll_interval, self.email_timeout);
        let email_link = match email_poller
            .run(|| self.provider.fetch_verification_link(&mailbox))
            .await
        {
            PollOutcome::Received(link) => {
                info!(link = %link, "verification link received");
                Some(link)
            }
            PollOutcome::TimedOut => {
                return AttemptReport {
                    email,
                    phone_number,
                    phone_service,
                    disposition: AttemptDisposition::Failed {
                        reason: "no verification email received".to_string(),
                        category: RejectionCategory::VerificationFailed,
                    },
                }
            }
        };

        // SMS verification is best-effort, like the phone itself.
        let sms_code = match &phone {
            Some(handle) => {
                self.emit(
                    sink,
                    stats,
                    attempt_no,
                    RunPhase::VerifyingPhone,
                    "waiting for SMS code",
                );
                let sms_poller = Poller::new(self.poll_interval, self.sms_timeout);
                match sms_poller.run(|| self.provider.fetch_sms_code(handle)).await {
                    PollOutcome::Received(code) => Some(code),
                    PollOutcome::TimedOut => {
                        warn!("no SMS code received, continuing without it");
                        None
                    }
                }
            }
            None => None,
        };

        AttemptReport {
            email,
            phone_number,
            phone_service,
            disposition: AttemptDisposition::Accepted {
                credentials,
                account_data: submission.account_data,
                verification: Verification {
                    email_link,
                    sms_code,
                },
            },
        }
    }

    fn emit(
        &self,
        sink: &dyn ProgressSink,
        stats: &RunStatistics,
        attempt: u32,
        phase: RunPhase,
        status: impl Into<String>,
    ) {
        let event = ProgressEvent {
            attempt,
            max_attempts: self.config.max_attempts,
            phase,
            status: status.into(),
            statistics: stats.clone(),
        };
        // A misbehaving sink must not take the run down with it.
        let _ = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            sink.on_progress(&event)
        }));
    }
}
