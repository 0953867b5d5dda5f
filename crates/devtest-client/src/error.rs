//! Error types for devtest-client

use std::path::PathBuf;

use thiserror::Error;

/// Errors that abort a DevTest operation
#[derive(Error, Debug)]
pub enum DevTestError {
    /// A required input was empty or malformed
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Registry endpoint is not usable
    #[error("DevTest Registry endpoint is not configured: {0}")]
    InvalidConfig(String),

    /// Transport failure talking to the registry
    #[error("HTTP error: {0}")]
    Http(String),

    /// Registry answered with a status the operation does not accept
    #[error("Unexpected response status {status} from {url}: {body}")]
    UnexpectedStatus {
        url: String,
        status: u16,
        body: String,
    },

    /// DevTest answers 200 with an empty body when credentials are rejected
    #[error("Invalid credentials for {url}")]
    InvalidCredentials { url: String },

    /// Response body could not be interpreted
    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    /// Attachment or artifact does not exist
    #[error("File not found: {}", .0.display())]
    MissingFile(PathBuf),

    /// Run submission response carried no `id`
    #[error("Run submission returned no run id: {body}")]
    MissingRunId { body: String },

    /// Cancelled from outside while waiting or before a request
    #[error("Operation cancelled")]
    Cancelled,

    /// Optional poll ceiling reached before the run ended
    #[error("Run {run_id} still {last_status} after {attempts} status checks")]
    PollLimitExceeded {
        run_id: String,
        attempts: u32,
        last_status: String,
    },

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON parsing error
    #[error("JSON parsing error: {0}")]
    Json(#[from] serde_json::Error),
}

impl From<reqwest::Error> for DevTestError {
    fn from(err: reqwest::Error) -> Self {
        DevTestError::Http(err.to_string())
    }
}
