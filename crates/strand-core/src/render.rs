//! Response rendering helpers.
//!
//! Thin wrappers that set the content type, status and body in one call.

use http::header::{HeaderValue, CONTENT_TYPE};
use http::StatusCode;
use serde::Serialize;

use crate::error::{Error, Result};
use crate::writer::{ResponseWriter, ResponseWriterExt};

/// `application/json` content type.
pub const JSON: &str = "application/json";

/// `text/plain; charset=utf-8` content type.
pub const TEXT: &str = "text/plain; charset=utf-8";

/// Serializes `value` as JSON and writes it with `status`.
///
/// Serialization happens before anything is written, so a failure leaves
/// the sink untouched.
pub fn json<T: Serialize + ?Sized>(
    writer: &mut dyn ResponseWriter,
    status: StatusCode,
    value: &T,
) -> Result<()> {
    let body = serde_json::to_vec(value).map_err(|e| Error::Handler(e.into()))?;
    bytes(writer, status, JSON, &body)
}

/// Writes a plain-text body with `status`.
pub fn text(writer: &mut dyn ResponseWriter, status: StatusCode, body: &str) -> Result<()> {
    bytes(writer, status, TEXT, body.as_bytes())
}

/// Writes `body` with the given content type and status.
pub fn bytes(
    writer: &mut dyn ResponseWriter,
    status: StatusCode,
    content_type: &'static str,
    body: &[u8],
) -> Result<()> {
    writer
        .headers_mut()
        .insert(CONTENT_TYPE, HeaderValue::from_static(content_type));
    writer.write_header(status);
    writer.write_all(body)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::writer::BufferedResponse;

    #[test]
    fn test_json() {
        let mut w = BufferedResponse::new();
        json(&mut w, StatusCode::CREATED, &serde_json::json!({"id": 7})).unwrap();

        assert_eq!(w.status(), StatusCode::CREATED);
        assert_eq!(w.headers().get(CONTENT_TYPE).unwrap(), JSON);
        assert_eq!(w.body(), br#"{"id":7}"#);
    }

    #[test]
    fn test_text() {
        let mut w = BufferedResponse::new();
        text(&mut w, StatusCode::OK, "pong").unwrap();

        assert_eq!(w.headers().get(CONTENT_TYPE).unwrap(), TEXT);
        assert_eq!(w.body(), b"pong");
    }
}
