//! Access logging.
//!
//! [`Logger`] emits one structured record per request under the
//! [`ACCESS_LOG_TARGET`] target, after the downstream stage has finished:
//!
//! | Field         | Value                                               |
//! |---------------|-----------------------------------------------------|
//! | `method`      | Request method                                      |
//! | `url`         | Request URI, captured before handing the request on |
//! | `status`      | First status written, `200` if none was             |
//! | `remote_addr` | [`real_ip`] if resolved, else the transport peer    |
//! | `elapsed`     | Time spent downstream                               |
//! | `error`       | Downstream error, on failed requests only           |
//!
//! Successful requests log at `INFO`, failed ones at `WARN`.

use std::io;
use std::time::Instant;

use http::{HeaderMap, StatusCode};
use strand_core::{
    remote_addr, BoxFuture, CloseNotifier, Context, Error, Flusher, Hijacker, Request,
    ResponseWriter, Result,
};

use super::real_ip::real_ip;
use crate::middleware::{Middleware, Next};

/// Target of access log records.
pub const ACCESS_LOG_TARGET: &str = "strand::access";

/// A writer that remembers the status the inner stage sent.
///
/// The first explicit status wins; a body write without one counts as
/// `200 OK`. Optional capabilities of the wrapped writer stay reachable.
pub struct StatusRecorder<'w> {
    inner: &'w mut dyn ResponseWriter,
    status: Option<StatusCode>,
    written: bool,
}

impl<'w> StatusRecorder<'w> {
    /// Wraps `inner`.
    pub fn new(inner: &'w mut dyn ResponseWriter) -> Self {
        Self {
            inner,
            status: None,
            written: false,
        }
    }

    /// The recorded status, `200 OK` if none was written.
    #[must_use]
    pub fn status(&self) -> StatusCode {
        self.status.unwrap_or(StatusCode::OK)
    }

    /// Returns true once a status or body byte went through.
    #[must_use]
    pub const fn is_written(&self) -> bool {
        self.written
    }
}

impl ResponseWriter for StatusRecorder<'_> {
    fn headers(&self) -> &HeaderMap {
        self.inner.headers()
    }

    fn headers_mut(&mut self) -> &mut HeaderMap {
        self.inner.headers_mut()
    }

    fn write_header(&mut self, status: StatusCode) {
        self.inner.write_header(status);
        if !self.written {
            self.status = Some(status);
            self.written = true;
        }
    }

    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.written = true;
        self.inner.write(buf)
    }

    fn flusher(&mut self) -> Option<&mut dyn Flusher> {
        self.inner.flusher()
    }

    fn hijacker(&mut self) -> Option<&mut dyn Hijacker> {
        self.inner.hijacker()
    }

    fn close_notifier(&mut self) -> Option<&mut dyn CloseNotifier> {
        self.inner.close_notifier()
    }
}

/// Logs every request that passes through.
///
/// Place it inside [`RealIp`](super::RealIp) to log client addresses
/// resolved from forwarding headers.
#[derive(Debug, Clone, Copy)]
pub struct Logger {
    backtraces: bool,
}

impl Logger {
    /// Creates a logger that includes panic backtraces in the error field.
    #[must_use]
    pub const fn new() -> Self {
        Self { backtraces: true }
    }

    /// Sets whether panic backtraces are logged.
    #[must_use]
    pub const fn with_backtraces(mut self, enabled: bool) -> Self {
        self.backtraces = enabled;
        self
    }

    fn describe(&self, error: &Error) -> String {
        match error {
            Error::Panic(fault) if self.backtraces => format!("{fault:#}"),
            other => other.to_string(),
        }
    }
}

impl Default for Logger {
    fn default() -> Self {
        Self::new()
    }
}

impl Middleware for Logger {
    fn name(&self) -> &'static str {
        "logger"
    }

    fn process<'a>(
        &'a self,
        ctx: Context,
        writer: &'a mut dyn ResponseWriter,
        request: Request,
        next: Next<'a>,
    ) -> BoxFuture<'a, Result<()>> {
        Box::pin(async move {
            let method = request.method().clone();
            let url = request.uri().to_string();
            let peer = remote_addr(&request);

            let mut recorder = StatusRecorder::new(writer);
            let start = Instant::now();
            let outcome = next.run(ctx.clone(), &mut recorder, request).await;
            let elapsed = start.elapsed();
            let status = recorder.status().as_u16();

            let remote = match real_ip(&ctx) {
                "" => peer.map(|addr| addr.to_string()).unwrap_or_default(),
                ip => ip.to_string(),
            };

            match &outcome {
                Ok(()) => tracing::info!(
                    target: ACCESS_LOG_TARGET,
                    method = %method,
                    url = %url,
                    status,
                    remote_addr = %remote,
                    elapsed = ?elapsed,
                    "request completed"
                ),
                Err(error) => tracing::warn!(
                    target: ACCESS_LOG_TARGET,
                    method = %method,
                    url = %url,
                    status,
                    remote_addr = %remote,
                    elapsed = ?elapsed,
                    error = %self.describe(error),
                    "request failed"
                ),
            }
            outcome
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use strand_core::{BufferedResponse, ResponseWriterExt};

    #[test]
    fn test_recorder_first_status_wins() {
        let mut inner = BufferedResponse::new();
        let mut recorder = StatusRecorder::new(&mut inner);
        assert!(!recorder.is_written());

        recorder.write_header(StatusCode::BAD_REQUEST);
        recorder.write_header(StatusCode::OK);
        assert_eq!(recorder.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_recorder_body_implies_ok() {
        let mut inner = BufferedResponse::new();
        let mut recorder = StatusRecorder::new(&mut inner);
        recorder.write_all(b"hi").unwrap();
        recorder.write_header(StatusCode::NOT_FOUND);

        assert!(recorder.is_written());
        assert_eq!(recorder.status(), StatusCode::OK);
        assert_eq!(inner.body(), b"hi");
    }

    #[test]
    fn test_recorder_forwards_capabilities() {
        let mut inner = BufferedResponse::new();
        let closed = inner.close_handle();
        {
            let mut recorder = StatusRecorder::new(&mut inner);
            recorder.try_flush().unwrap();
            let token = recorder.try_close_notify().unwrap();
            closed.cancel();
            assert!(token.is_cancelled());
            assert!(recorder.hijacker().is_none());
        }
        assert_eq!(inner.flush_count(), 1);
    }

    #[test]
    fn test_describe_panic() {
        let fault = strand_core::PanicError::new("boom", Some("trace".into()));
        let error = Error::Panic(fault);
        assert_eq!(Logger::new().describe(&error), "panic: boom\ntrace");
        assert_eq!(
            Logger::new().with_backtraces(false).describe(&error),
            "panic: boom"
        );
    }
}
