//! Error types for the Anthropic API client

use thiserror::Error;

/// Errors returned by [`crate::AnthropicClient`]
#[derive(Debug, Error)]
pub enum ClaudeError {
    /// `ANTHROPIC_API_KEY` is unset or blank
    #[error("ANTHROPIC_API_KEY is not set")]
    MissingApiKey,

    /// The request never got an HTTP response
    #[error("request to the Messages API failed: {0}")]
    RequestFailed(String),

    /// The response body did not match the expected shape
    #[error("could not parse Messages API response: {0}")]
    ResponseParseFailed(String),

    /// HTTP 429
    #[error("rate limited by the Messages API")]
    RateLimited,

    /// HTTP 401
    #[error("the Messages API rejected the API key")]
    Unauthorized,

    /// Any other non-success status
    #[error("Messages API returned {status}: {message}")]
    ApiError {
        /// HTTP status code
        status: u16,
        /// Response body
        message: String,
    },

    /// The event stream broke off or reported an error event
    #[error("reply stream failed: {0}")]
    StreamFailed(String),
}

impl ClaudeError {
    /// Whether retrying the same request later could succeed
    #[must_use]
    pub const fn is_transient(&self) -> bool {
        match self {
            Self::RequestFailed(_) | Self::RateLimited | Self::StreamFailed(_) => true,
            Self::ApiError { status, .. } => *status >= 500,
            Self::MissingApiKey | Self::ResponseParseFailed(_) | Self::Unauthorized => false,
        }
    }
}
