//! Test response wrapper.

use bytes::Bytes;
use http::{header, HeaderMap, StatusCode};
use serde::de::DeserializeOwned;
use strand_core::{BufferedResponse, Error, ResponseWriter};

use crate::error::TestError;

/// What a handler wrote, together with the outcome it returned.
pub struct TestResponse {
    status: StatusCode,
    written: bool,
    headers: HeaderMap,
    body: Bytes,
    flushes: usize,
    outcome: Result<(), Error>,
}

impl TestResponse {
    /// Captures a finished [`BufferedResponse`] and the handler outcome.
    pub fn new(response: &BufferedResponse, outcome: Result<(), Error>) -> Self {
        let status = response.status();
        let written = response.is_written();
        let flushes = response.flush_count();
        Self {
            status,
            written,
            headers: response.headers().clone(),
            body: Bytes::copy_from_slice(response.body()),
            flushes,
            outcome,
        }
    }

    /// Returns the status code.
    #[must_use]
    pub const fn status(&self) -> StatusCode {
        self.status
    }

    /// Returns the status code as a u16.
    #[must_use]
    pub fn status_code(&self) -> u16 {
        self.status.as_u16()
    }

    /// Returns true if the handler wrote a status or body.
    #[must_use]
    pub const fn is_written(&self) -> bool {
        self.written
    }

    /// Returns a reference to the headers.
    #[must_use]
    pub const fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// Returns a header value as a string, if present and valid UTF-8.
    #[must_use]
    pub fn header(&self, name: impl header::AsHeaderName) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    /// Returns the raw body.
    #[must_use]
    pub const fn body(&self) -> &Bytes {
        &self.body
    }

    /// Returns the body as text.
    ///
    /// # Errors
    ///
    /// Returns an error if the body is not UTF-8.
    pub fn text(&self) -> Result<String, TestError> {
        Ok(String::from_utf8(self.body.to_vec())?)
    }

    /// Deserializes the body as JSON.
    ///
    /// # Errors
    ///
    /// Returns an error if the body is not valid JSON for `T`.
    pub fn json<T: DeserializeOwned>(&self) -> Result<T, TestError> {
        Ok(serde_json::from_slice(&self.body)?)
    }

    /// How many times the handler flushed.
    #[must_use]
    pub const fn flush_count(&self) -> usize {
        self.flushes
    }

    /// The outcome returned by the handler.
    pub const fn outcome(&self) -> &Result<(), Error> {
        &self.outcome
    }

    /// Returns the error the handler returned, if any.
    #[must_use]
    pub fn error(&self) -> Option<&Error> {
        self.outcome.as_ref().err()
    }

    /// Consumes the response, returning the outcome.
    pub fn into_outcome(self) -> Result<(), Error> {
        self.outcome
    }
}

impl std::fmt::Debug for TestResponse {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TestResponse")
            .field("status", &self.status)
            .field("headers", &self.headers)
            .field("body", &String::from_utf8_lossy(&self.body))
            .field("outcome", &self.outcome)
            .finish()
    }
}
