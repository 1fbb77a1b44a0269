use anyhow::Result;
use tracing::info;

use signupforge_core::{AppConfig, ProgressEvent, RetryConfig, TargetConfig};
use signupforge_engine::{
    AccountClient, BackoffSchedule, FnSink, HttpAccountClient, Orchestrator,
    ScriptedAccountClient, ScriptedCredentialProvider,
};

/// Run the orchestrator end to end. The credential side is always scripted;
/// the account side is scripted too unless an HTTP endpoint is given.
#[allow(clippy::too_many_arguments)]
pub async fn demo(
    config: AppConfig,
    reject: u32,
    rejection: String,
    no_phone: bool,
    endpoint: Option<String>,
    max_attempts: Option<u32>,
    initial_delay_ms: Option<u64>,
    json: bool,
) -> Result<()> {
    let mut retry: RetryConfig = config.retry;
    if let Some(n) = max_attempts {
        retry.max_attempts = n;
    }
    if let Some(ms) = initial_delay_ms {
        retry.initial_delay_ms = ms;
    }

    let mut provider = ScriptedCredentialProvider::new("inbox.example");
    if no_phone {
        provider = provider.without_phone();
    }

    let client: Box<dyn AccountClient> = match endpoint {
        Some(signup_url) => {
            let target = match config.target {
                Some(mut target) => {
                    target.signup_url = signup_url;
                    target
                }
                None => TargetConfig {
                    signup_url,
                    request_timeout_secs: 30,
                    user_agent: "signupforge/0.1".to_string(),
                    invite_code: None,
                },
            };
            Box::new(HttpAccountClient::new(&target)?)
        }
        None => Box::new(ScriptedAccountClient::rejecting_first(reject, rejection)),
    };

    let engine = Orchestrator::new(retry, &config.verification, Box::new(provider), client);

    let sink = FnSink(|event: &ProgressEvent| {
        info!(
            attempt = event.attempt,
            max_attempts = event.max_attempts,
            phase = ?event.phase,
            "{}",
            event.status
        );
    });

    let result = engine.run(&sink).await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&result)?);
    } else {
        println!("{}", result.summary());
        for attempt in &result.attempts {
            println!(
                "  attempt {}: {} ({} ms)",
                attempt.sequence,
                match &attempt.outcome {
                    signupforge_core::AttemptOutcome::Success => "success".to_string(),
                    signupforge_core::AttemptOutcome::Failed { reason, category } =>
                        format!("{:?}: {}", category, reason),
                },
                attempt.duration_ms
            );
        }
    }

    Ok(())
}

/// Feed a message through the rejection classifier.
pub fn classify(message: &str, body: Option<&str>) {
    let category = signupforge_engine::classify(message, body);
    println!(
        "{:?} (retriable: {})",
        category,
        category.is_retriable()
    );
}

/// Print the deterministic (pre-jitter) backoff table for a config.
pub fn schedule(retry: &RetryConfig) {
    let schedule = BackoffSchedule::from_config(retry);
    println!(
        "backoff for initial={}ms max={}ms multiplier={}",
        retry.initial_delay_ms, retry.max_delay_ms, retry.backoff_multiplier
    );
    for attempt in 1..=retry.max_attempts {
        println!(
            "  after attempt {:>2}: {:>7} ms (+ up to 30% jitter)",
            attempt,
            schedule.base_delay(attempt).as_millis()
        );
    }
}
