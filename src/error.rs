use thiserror::Error;

/// Message shown to the user whenever an acquisition fails. The detailed
/// cause only goes to the log.
pub const RETRY_MESSAGE: &str = "Failed to fetch jobs. Please try again.";

/// Failure while talking to the job backend (profiles, matching or live search).
#[derive(Debug, Error)]
pub enum AcquisitionError {
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("backend returned status {status}: {body}")]
    Status { status: u16, body: String },

    #[error("unexpected response shape: {0}")]
    Decode(#[from] serde_json::Error),
}

impl AcquisitionError {
    pub fn user_message(&self) -> &'static str {
        RETRY_MESSAGE
    }
}
