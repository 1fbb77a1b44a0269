use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "signupforge", about = "Account-provisioning retry engine")]
pub struct Cli {
    /// Path to config file
    #[arg(short, long, default_value = "config/default.toml")]
    pub config: String,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run the retry engine against scripted collaborators
    Demo {
        /// Submissions to reject before the target accepts
        #[arg(long, default_value_t = 3)]
        reject: u32,

        /// Rejection message the scripted target returns
        #[arg(long, default_value = "email already exists")]
        rejection: String,

        /// Simulate a vendor with no phone numbers in stock
        #[arg(long)]
        no_phone: bool,

        /// Submit over HTTP to this signup endpoint instead of the
        /// scripted target
        #[arg(long)]
        endpoint: Option<String>,

        /// Maximum attempts (overrides config)
        #[arg(long)]
        max_attempts: Option<u32>,

        /// Initial backoff delay in milliseconds (overrides config)
        #[arg(long)]
        initial_delay_ms: Option<u64>,

        /// Print the full result as JSON
        #[arg(long)]
        json: bool,
    },
    /// Classify an error message the way the retry loop would
    Classify {
        /// Raw error message
        message: String,

        /// Optional raw response body
        #[arg(long)]
        body: Option<String>,
    },
    /// Print the jitter-free backoff schedule for the configured retry
    /// parameters
    Schedule,
}
