//! Model API error types.

use thiserror::Error;

/// Errors that can occur while talking to the Messages API.
#[derive(Debug, Error)]
pub enum LlmError {
    /// The endpoint could not be reached.
    #[error("failed to reach model endpoint '{endpoint}': {reason}")]
    Connection { endpoint: String, reason: String },

    /// The request timed out.
    #[error("model request timed out after {duration_secs}s")]
    Timeout { duration_secs: u64 },

    /// The API rejected the request with HTTP 429.
    #[error("model API rate limited the request")]
    RateLimited,

    /// The API returned a non-success status.
    #[error("model API error (HTTP {status}): {body}")]
    Api { status: u16, body: String },

    /// The response body could not be parsed.
    #[error("failed to parse model response: {reason}")]
    Parse { reason: String },
}
