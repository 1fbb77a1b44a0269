//! Collaborator interfaces and the two in-tree implementations.
//!
//! The orchestrator only ever talks through these traits; whether a signup is
//! submitted over a plain HTTP API or a scripted browser session is invisible
//! to it. All probe methods are single-shot — the engine's `Poller` supplies
//! the repeat-until-timeout behavior.

mod http;
mod scripted;

pub use http::HttpAccountClient;
pub use scripted::{
    extract_verification_link, ScriptedAccountClient, ScriptedCredentialProvider, ScriptedOutcome,
};

use async_trait::async_trait;
use url::Url;

use signupforge_core::{AccountData, Credentials, ProvisionError};

/// A provisioned disposable mailbox plus whatever token the vendor needs to
/// poll it later.
#[derive(Debug, Clone)]
pub struct MailboxHandle {
    pub address: String,
    pub poll_token: String,
    pub provider: String,
}

/// A provisioned SMS-capable number.
#[derive(Debug, Clone)]
pub struct PhoneHandle {
    pub number: String,
    pub poll_id: String,
    pub service: String,
}

/// Disposable email/phone vendor, consumed through a narrow contract.
#[async_trait]
pub trait CredentialProvider: Send + Sync {
    async fn acquire_email(&self) -> Result<MailboxHandle, ProvisionError>;

    /// Single inbox check. `None` means no verification message yet.
    async fn fetch_verification_link(
        &self,
        mailbox: &MailboxHandle,
    ) -> Result<Option<Url>, ProvisionError>;

    /// `Ok(None)` means the vendor has no numbers right now — a valid
    /// degraded path, not an error.
    async fn acquire_phone(&self) -> Result<Option<PhoneHandle>, ProvisionError>;

    /// Single SMS check. `None` means no code yet.
    async fn fetch_sms_code(&self, phone: &PhoneHandle) -> Result<Option<String>, ProvisionError>;
}

/// What the target said to one submission.
#[derive(Debug, Clone, Default)]
pub struct SubmissionOutcome {
    pub accepted: bool,
    pub account_data: Option<AccountData>,
    pub error_message: Option<String>,
    pub response_body: Option<String>,
}

/// Submits credentials to the target's signup flow.
#[async_trait]
pub trait AccountClient: Send + Sync {
    async fn create_account(
        &self,
        credentials: &Credentials,
    ) -> Result<SubmissionOutcome, ProvisionError>;
}
