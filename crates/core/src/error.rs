use thiserror::Error;

/// Error taxonomy for a provisioning run.
///
/// Only `Configuration` ever crosses the orchestrator boundary as an `Err`;
/// every other variant is captured into the per-attempt record and surfaces
/// through the final run result.
#[derive(Error, Debug)]
pub enum ProvisionError {
    #[error("configuration error: {0}")]
    Configuration(String),

    #[error("collaborator unavailable: {0}")]
    CollaboratorUnavailable(String),

    #[error("rejected by target: {0}")]
    Rejected(String),

    #[error("transport error: {0}")]
    Transport(String),

    #[error("timed out after {0}s")]
    Timeout(u64),
}
