//! Test error types.

use thiserror::Error;

/// Errors that can occur while building or inspecting test traffic.
#[derive(Debug, Error)]
pub enum TestError {
    /// Request building failed
    #[error("request build error: {0}")]
    RequestBuild(String),

    /// Header name or value is invalid
    #[error("invalid header: {0}")]
    InvalidHeader(String),

    /// JSON serialization/deserialization failed
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Form serialization failed
    #[error("form error: {0}")]
    Form(#[from] serde_urlencoded::ser::Error),

    /// Response body is not valid UTF-8
    #[error("body is not UTF-8: {0}")]
    Utf8(#[from] std::string::FromUtf8Error),
}
