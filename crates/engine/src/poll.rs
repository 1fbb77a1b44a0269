//! Bounded polling for verification messages.
//!
//! Collaborators expose single-shot probes ("is the link there yet?"); the
//! `Poller` turns one into a suspending call with a fixed inter-poll interval
//! and an overall timeout. Polling suspends the whole run — it never runs in
//! the background.

use std::future::Future;
use std::time::Duration;
use tokio::time::{sleep, Instant};
use tracing::{debug, warn};

use signupforge_core::ProvisionError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PollOutcome<T> {
    Received(T),
    TimedOut,
}

#[derive(Debug, Clone)]
pub struct Poller {
    interval: Duration,
    timeout: Duration,
}

impl Poller {
    pub fn new(interval: Duration, timeout: Duration) -> Self {
        Self { interval, timeout }
    }

    /// Probe until a value arrives or the timeout elapses. The probe runs at
    /// least once. Probe errors are logged and treated as "not yet" — a
    /// flaky inbox check should not abort the wait.
    pub async fn run<T, F, Fut>(&self, mut probe: F) -> PollOutcome<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<Option<T>, ProvisionError>>,
    {
        let deadline = Instant::now() + self.timeout;
        let mut checks = 0u32;

        loop {
            checks += 1;
            match probe().await {
                Ok(Some(value)) => {
                    debug!(checks, "poll received a value");
                    return PollOutcome::Received(value);
                }
                Ok(None) => {}
                Err(e) => warn!(checks, error = %e, "poll probe failed, will retry"),
            }

            if Instant::now() + self.interval > deadline {
                debug!(checks, "poll timed out");
                return PollOutcome::TimedOut;
            }
            sleep(self.interval).await;
        }
    }
}
