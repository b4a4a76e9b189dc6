//! Outcome types for Strand chains.
//!
//! Every stage returns a [`Result`]. Errors flow outward through each unit
//! that was entered; units that do not interpret an error pass it through.
//!
//! | Variant | Origin | Default status |
//! |---|---|---|
//! | `Panic` | Recovery unit caught a panic | 500 |
//! | `Unauthorized` | Basic-auth unit declined the request | 401 |
//! | `Decode` | Binding unit could not decode the body | 400 |
//! | `NotFound` | Store lookup of a missing key | 404 |
//! | `Unsupported` | Response sink lacks a capability | 500 |
//! | `Io` | Writing the response failed | 500 |
//! | `Handler` | Application failure from a terminal handler | 500 |

use http::StatusCode;
use std::fmt;
use thiserror::Error;

/// Result type alias using [`Error`].
pub type Result<T> = std::result::Result<T, Error>;

/// Outcome of invoking a stage.
#[derive(Error, Debug)]
pub enum Error {
    /// A panic was intercepted and converted by the recovery unit.
    #[error(transparent)]
    Panic(#[from] PanicError),

    /// The request lacked valid credentials.
    #[error("unauthorized request")]
    Unauthorized,

    /// The request body could not be decoded.
    #[error("decode error: {0}")]
    Decode(String),

    /// A key was missing from a [`Store`](crate::Store).
    #[error("key not found in store: {0}")]
    NotFound(String),

    /// The response sink does not provide the named capability.
    #[error("response writer does not support {0}")]
    Unsupported(&'static str),

    /// Writing to the response sink failed.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Application error returned by a handler.
    #[error(transparent)]
    Handler(#[from] anyhow::Error),
}

impl Error {
    /// Creates a decode error from any displayable cause.
    #[must_use]
    pub fn decode(cause: impl fmt::Display) -> Self {
        Self::Decode(cause.to_string())
    }

    /// Returns true if this outcome is the basic-auth refusal.
    #[must_use]
    pub const fn is_unauthorized(&self) -> bool {
        matches!(self, Self::Unauthorized)
    }

    /// Returns true if this outcome was produced by panic recovery.
    #[must_use]
    pub const fn is_panic(&self) -> bool {
        matches!(self, Self::Panic(_))
    }

    /// Returns the status code an error translator would typically use.
    #[must_use]
    pub const fn status_code(&self) -> StatusCode {
        match self {
            Self::Unauthorized => StatusCode::UNAUTHORIZED,
            Self::Decode(_) => StatusCode::BAD_REQUEST,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Panic(_) | Self::Unsupported(_) | Self::Io(_) | Self::Handler(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

/// A panic converted into an inspectable value.
///
/// Displays as `panic: <value>`. The alternate form (`{:#}`) appends the
/// backtrace captured on the panicking thread.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PanicError {
    value: String,
    backtrace: Option<String>,
}

impl PanicError {
    /// Creates a panic error from the panic value and an optional backtrace.
    #[must_use]
    pub fn new(value: impl Into<String>, backtrace: Option<String>) -> Self {
        Self {
            value: value.into(),
            backtrace,
        }
    }

    /// The rendered panic payload.
    #[must_use]
    pub fn value(&self) -> &str {
        &self.value
    }

    /// The backtrace captured when the panic was raised, if any.
    #[must_use]
    pub fn backtrace(&self) -> Option<&str> {
        self.backtrace.as_deref()
    }
}

impl fmt::Display for PanicError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "panic: {}", self.value)?;
        if f.alternate() {
            if let Some(backtrace) = &self.backtrace {
                write!(f, "\n{backtrace}")?;
            }
        }
        Ok(())
    }
}

impl std::error::Error for PanicError {}
