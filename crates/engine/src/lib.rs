pub mod backoff;
pub mod classifier;
pub mod context;
pub mod identity;
pub mod orchestrator;
pub mod poll;
pub mod providers;
pub mod result;

pub use backoff::BackoffSchedule;
pub use classifier::classify;
pub use orchestrator::{FnSink, NullSink, Orchestrator, ProgressSink};
pub use providers::{
    AccountClient, CredentialProvider, HttpAccountClient, MailboxHandle, PhoneHandle,
    ScriptedAccountClient, ScriptedCredentialProvider, ScriptedOutcome, SubmissionOutcome,
};
pub use result::{RunOutcome, RunResult, Verification};
