//! Error types for the outbound calls and the chat pipeline.

use reqwest::StatusCode;
use thiserror::Error;

/// Failure talking to the chat-completions endpoint.
#[derive(Error, Debug)]
pub enum LlmError {
    #[error("language model request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("language model returned status {status}: {body}")]
    Status { status: StatusCode, body: String },

    #[error("failed to decode language model response: {0}")]
    Decode(String),

    #[error("language model response contained no choices")]
    EmptyResponse,
}

/// Failure fetching current conditions from the forecast provider.
#[derive(Error, Debug)]
pub enum WeatherError {
    #[error("weather request timed out")]
    Timeout,

    #[error("weather request failed: {0}")]
    Request(reqwest::Error),

    #[error("weather provider returned status {status}: {body}")]
    Status { status: StatusCode, body: String },

    #[error("failed to decode weather response: {0}")]
    Decode(#[from] serde_json::Error),
}

impl From<reqwest::Error> for WeatherError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::Timeout
        } else {
            Self::Request(err)
        }
    }
}

/// Failures that escape the pipeline and reach the HTTP layer.
#[derive(Error, Debug)]
pub enum ChatError {
    #[error("chat message must not be empty")]
    EmptyMessage,

    #[error("internal error: {0}")]
    Internal(String),
}

impl ChatError {
    /// Text safe to show to the end user.
    pub fn user_message(&self) -> String {
        match self {
            Self::EmptyMessage => "Message must not be empty.".to_string(),
            Self::Internal(_) => {
                "An error occurred while processing your request. Please try again.".to_string()
            }
        }
    }

    /// Whether the caller sent a bad request, as opposed to a server fault.
    pub fn is_client_error(&self) -> bool {
        matches!(self, Self::EmptyMessage)
    }
}

/// Keeps provider error bodies short enough for a log line.
pub(crate) fn truncate_body(body: &str) -> String {
    const MAX: usize = 200;
    if body.len() > MAX {
        let mut end = MAX;
        while !body.is_char_boundary(end) {
            end -= 1;
        }
        format!("{}...", &body[..end])
    } else {
        body.to_string()
    }
}
