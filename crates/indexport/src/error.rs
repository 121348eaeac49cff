//! Error types for indexport.
//!
//! Every command surfaces its failure as an [`Error`]; the binary prints it
//! once and maps it to a process exit code with [`Error::exit_code`].

use thiserror::Error;

/// Result type alias for indexport operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while running a command.
#[derive(Error, Debug)]
pub enum Error {
    /// A required parameter is missing or a parameter value is invalid.
    #[error("Invalid arguments: {0}")]
    Validation(String),

    /// Malformed JSON, JSON Lines or CSV input.
    #[error("Parse error: {0}")]
    Parse(String),

    /// Invalid profile or client configuration.
    #[error("Configuration error: {0}")]
    Config(String),

    /// The search service answered with a non-success status.
    #[error("Service error {status}: {message}")]
    Service {
        /// HTTP status code returned by the service.
        status: u16,
        /// Response body or message returned by the service.
        message: String,
    },

    /// The service rejected the credentials.
    #[error("Authentication failed: {0}")]
    Authentication(String),

    /// The service is throttling requests; carries its `Retry-After` seconds.
    #[error("Rate limited{}", retry_hint(.0))]
    RateLimit(Option<u64>),

    /// A write task was not published before the configured deadline.
    #[error("Task {0} was not published in time")]
    TaskTimeout(u64),

    /// Transport level HTTP failure.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The user transformation failed.
    #[error("Transformation failed: {0}")]
    Transform(String),

    /// One or more import batches were rejected.
    #[error("{} of {total} batches failed (batches: {})", .failed.len(), format_ordinals(.failed))]
    BatchFailures {
        /// 0-based ordinals of the failed batches, in ascending order.
        failed: Vec<usize>,
        /// Number of batches dispatched.
        total: usize,
    },

    /// The command was interrupted by the user.
    #[error("Cancelled")]
    Interrupted,

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON (de)serialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// YAML parsing error.
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

impl Error {
    /// Process exit code for this error: 2 for an interrupt, 1 otherwise.
    #[must_use]
    pub const fn exit_code(&self) -> i32 {
        match self {
            Self::Interrupted => 2,
            _ => 1,
        }
    }

    /// Returns true for errors raised before any work was attempted.
    #[must_use]
    pub const fn is_usage(&self) -> bool {
        matches!(self, Self::Validation(_))
    }
}

fn retry_hint(retry_after: &Option<u64>) -> String {
    retry_after.map_or_else(String::new, |secs| format!(", retry after {secs}s"))
}

fn format_ordinals(ordinals: &[usize]) -> String {
    ordinals
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}
