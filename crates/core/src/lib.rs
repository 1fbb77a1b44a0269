pub mod config;
pub mod error;
pub mod types;

pub use config::{AppConfig, RetryConfig, TargetConfig, VerificationConfig};
pub use error::ProvisionError;
pub use types::*;
