//! In-memory collaborators driven by a script of outcomes. Used by the demo
//! subcommand and by the engine's own tests; shaped like a real vendor client
//! so the orchestrator cannot tell the difference.

use async_trait::async_trait;
use rand::Rng;
use regex::Regex;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Mutex;
use tracing::debug;
use url::Url;

use signupforge_core::{Credentials, ProvisionError};

use crate::identity;

use super::{AccountClient, CredentialProvider, MailboxHandle, PhoneHandle, SubmissionOutcome};

/// Pull a verification link out of a message body: verify/confirm/activate
/// paths first, then any token-bearing URL.
pub fn extract_verification_link(body: &str) -> Option<Url> {
    let patterns = [
        r"https?://[^\s<>]*(?:verify|confirm|activate)[^\s<>]*",
        r"https?://[^\s<>]*[?&](?:token|code|key)=[A-Za-z0-9_-]+[^\s<>]*",
    ];

    for pattern in patterns {
        let re = Regex::new(pattern).ok()?;
        if let Some(found) = re.find(body) {
            let cleaned = found.as_str().trim_end_matches(&[')', ']', '.', ',', ';'][..]);
            if let Ok(url) = Url::parse(cleaned) {
                return Some(url);
            }
        }
    }

    None
}

/// Disposable-credential vendor stand-in. Emits addresses at a fixed domain
/// and delivers the verification link / SMS code after a configurable number
/// of probes.
pub struct ScriptedCredentialProvider {
    domain: String,
    phone_available: bool,
    /// Probes to answer "not yet" before the verification message appears.
    delivery_probes: u32,
    email_probes: AtomicU32,
    sms_probes: AtomicU32,
}

impl ScriptedCredentialProvider {
    pub fn new(domain: impl Into<String>) -> Self {
        Self {
            domain: domain.into(),
            phone_available: true,
            delivery_probes: 0,
            email_probes: AtomicU32::new(0),
            sms_probes: AtomicU32::new(0),
        }
    }

    pub fn without_phone(mut self) -> Self {
        self.phone_available = false;
        self
    }

    pub fn with_delivery_probes(mut self, probes: u32) -> Self {
        self.delivery_probes = probes;
        self
    }
}

#[async_trait]
impl CredentialProvider for ScriptedCredentialProvider {
    async fn acquire_email(&self) -> Result<MailboxHandle, ProvisionError> {
        let address = identity::generate_temp_address(&self.domain);
        debug!(%address, "scripted mailbox issued");
        Ok(MailboxHandle {
            poll_token: address.clone(),
            address,
            provider: "scripted".to_string(),
        })
    }

    async fn fetch_verification_link(
        &self,
        mailbox: &MailboxHandle,
    ) -> Result<Option<Url>, ProvisionError> {
        let probes = self.email_probes.fetch_add(1, Ordering::SeqCst) + 1;
        if probes <= self.delivery_probes {
            return Ok(None);
        }

        // Fabricate the message a real inbox poll would return and run it
        // through the same extraction path.
        let body = format!(
            "Welcome! Confirm your address: https://accounts.example/verify?token=tok-{}",
            mailbox.poll_token.len()
        );
        Ok(extract_verification_link(&body))
    }

    async fn acquire_phone(&self) -> Result<Option<PhoneHandle>, ProvisionError> {
        if !self.phone_available {
            debug!("scripted vendor has no numbers in stock");
            return Ok(None);
        }

        let mut rng = rand::thread_rng();
        let number = format!("+1555{:07}", rng.gen_range(0..10_000_000));
        Ok(Some(PhoneHandle {
            poll_id: number.clone(),
            number,
            service: "scripted".to_string(),
        }))
    }

    async fn fetch_sms_code(&self, _phone: &PhoneHandle) -> Result<Option<String>, ProvisionError> {
        let probes = self.sms_probes.fetch_add(1, Ordering::SeqCst) + 1;
        if probes <= self.delivery_probes {
            return Ok(None);
        }
        Ok(Some(format!("{:06}", rand::thread_rng().gen_range(0..1_000_000))))
    }
}

/// One scripted response from the target.
#[derive(Debug, Clone)]
pub enum ScriptedOutcome {
    Accept,
    Reject(String),
    TransportFail(String),
}

/// Account client that replays a queue of outcomes, then keeps returning the
/// last one once the queue is drained.
pub struct ScriptedAccountClient {
    script: Mutex<VecDeque<ScriptedOutcome>>,
    exhausted: ScriptedOutcome,
}

impl ScriptedAccountClient {
    pub fn new(script: Vec<ScriptedOutcome>) -> Self {
        let exhausted = script.last().cloned().unwrap_or(ScriptedOutcome::Accept);
        Self {
            script: Mutex::new(script.into()),
            exhausted,
        }
    }

    /// Reject the first `rejections` submissions with `message`, then accept.
    pub fn rejecting_first(rejections: u32, message: impl Into<String>) -> Self {
        let message = message.into();
        let mut script: Vec<ScriptedOutcome> = (0..rejections)
            .map(|_| ScriptedOutcome::Reject(message.clone()))
            .collect();
        script.push(ScriptedOutcome::Accept);
        Self::new(script)
    }
}

#[async_trait]
impl AccountClient for ScriptedAccountClient {
    async fn create_account(
        &self,
        credentials: &Credentials,
    ) -> Result<SubmissionOutcome, ProvisionError> {
        let outcome = self
            .script
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .pop_front()
            .unwrap_or_else(|| self.exhausted.clone());

        match outcome {
            ScriptedOutcome::Accept => Ok(SubmissionOutcome {
                accepted: true,
                account_data: Some(serde_json::json!({
                    "email": credentials.email,
                    "status": "active",
                })),
                error_message: None,
                response_body: None,
            }),
            ScriptedOutcome::Reject(message) => Ok(SubmissionOutcome {
                accepted: false,
                account_data: None,
                response_body: Some(format!(r#"{{"success":false,"error":"{}"}}"#, message)),
                error_message: Some(message),
            }),
            ScriptedOutcome::TransportFail(message) => Err(ProvisionError::Transport(message)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_verification_link() {
        let body = "Click here: https://site.example/confirm/abc123 to finish.";
        let link = extract_verification_link(body).unwrap();
        assert!(link.path().contains("confirm"));

        let body = "Your link (https://site.example/cb?token=xyz).";
        let link = extract_verification_link(body).unwrap();
        assert_eq!(link.query(), Some("token=xyz"));

        assert!(extract_verification_link("no links here").is_none());
    }

    #[tokio::test]
    async fn test_provider_issues_addresses_at_domain() {
        let provider = ScriptedCredentialProvider::new("inbox.example");
        let mailbox = provider.acquire_email().await.unwrap();
        assert!(mailbox.address.ends_with("@inbox.example"));
    }

    #[tokio::test]
    async fn test_delivery_probe_delay() {
        let provider = ScriptedCredentialProvider::new("inbox.example").with_delivery_probes(2);
        let mailbox = provider.acquire_email().await.unwrap();

        assert!(provider.fetch_verification_link(&mailbox).await.unwrap().is_none());
        assert!(provider.fetch_verification_link(&mailbox).await.unwrap().is_none());
        assert!(provider.fetch_verification_link(&mailbox).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_without_phone_reports_no_stock() {
        let provider = ScriptedCredentialProvider::new("inbox.example").without_phone();
        assert!(provider.acquire_phone().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_rejecting_first_script() {
        let client = ScriptedAccountClient::rejecting_first(2, "email already exists");
        let credentials = Credentials {
            full_name: "Quinn Mercer".to_string(),
            email: "quinn@inbox.example".to_string(),
            password: "pw".to_string(),
            phone_number: None,
            phone_service: None,
        };

        for _ in 0..2 {
            let outcome = client.create_account(&credentials).await.unwrap();
            assert!(!outcome.accepted);
        }
        let outcome = client.create_account(&credentials).await.unwrap();
        assert!(outcome.accepted);
        // Drained scripts repeat the final entry
        let outcome = client.create_account(&credentials).await.unwrap();
        assert!(outcome.accepted);
    }

    #[tokio::test]
    async fn test_poisoned_script_lock_still_serves() {
        let client = std::sync::Arc::new(ScriptedAccountClient::new(vec![
            ScriptedOutcome::Accept,
        ]));

        let poisoner = client.clone();
        let _ = std::thread::spawn(move || {
            let _guard = poisoner.script.lock().unwrap();
            panic!("poison the script lock");
        })
        .join();

        let credentials = Credentials {
            full_name: "Rowan Hayes".to_string(),
            email: "rowan@inbox.example".to_string(),
            password: "pw".to_string(),
            phone_number: None,
            phone_service: None,
        };
        let outcome = client.create_account(&credentials).await.unwrap();
        assert!(outcome.accepted);
    }
}
