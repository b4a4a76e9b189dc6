//! The response sink.
//!
//! Stages write responses through [`ResponseWriter`] rather than returning
//! them, so that an outer unit can observe what an inner one wrote by
//! interposing its own writer. Optional capabilities (flushing streamed
//! output, taking over the connection, learning that the client went away)
//! are exposed as accessors returning `Option`, so a wrapper can forward exactly
//! the capabilities its inner sink has and nothing more.

use bytes::{Bytes, BytesMut};
use http::{HeaderMap, StatusCode};
use http_body_util::Full;
use hyper::upgrade::OnUpgrade;
use std::io;
use tokio_util::sync::CancellationToken;

use crate::error::{Error, Result};

/// Sink for one response.
///
/// # Status semantics
///
/// The first status written wins. Writing body bytes without an explicit
/// status implies `200 OK`.
pub trait ResponseWriter: Send {
    /// Response headers written so far.
    fn headers(&self) -> &HeaderMap;

    /// Mutable response headers. Changes after the status is written have no effect.
    fn headers_mut(&mut self) -> &mut HeaderMap;

    /// Sets the response status.
    fn write_header(&mut self, status: StatusCode);

    /// Appends body bytes, returning how many were accepted.
    fn write(&mut self, buf: &[u8]) -> io::Result<usize>;

    /// Returns the flush capability, if the sink supports it.
    fn flusher(&mut self) -> Option<&mut dyn Flusher> {
        None
    }

    /// Returns the connection-takeover capability, if the sink supports it.
    fn hijacker(&mut self) -> Option<&mut dyn Hijacker> {
        None
    }

    /// Returns the close-notification capability, if the sink supports it.
    fn close_notifier(&mut self) -> Option<&mut dyn CloseNotifier> {
        None
    }
}

/// Flushes buffered response data to the client.
pub trait Flusher: Send {
    /// Flushes pending output.
    fn flush(&mut self) -> io::Result<()>;
}

/// Takes over the underlying connection.
pub trait Hijacker: Send {
    /// Returns the pending protocol upgrade for this connection.
    ///
    /// The upgrade resolves once a `101 Switching Protocols` response has
    /// been sent. It can be taken at most once.
    fn hijack(&mut self) -> Result<OnUpgrade>;
}

/// Reports that the client connection went away.
pub trait CloseNotifier: Send {
    /// Returns a token that is cancelled when the client disconnects.
    fn close_notify(&mut self) -> CancellationToken;
}

/// Convenience methods over the capability accessors.
pub trait ResponseWriterExt: ResponseWriter {
    /// Writes the whole buffer.
    fn write_all(&mut self, mut buf: &[u8]) -> Result<()> {
        while !buf.is_empty() {
            let written = self.write(buf)?;
            if written == 0 {
                return Err(Error::Io(io::Error::from(io::ErrorKind::WriteZero)));
            }
            buf = &buf[written..];
        }
        Ok(())
    }

    /// Flushes, or reports [`Error::Unsupported`] if the sink cannot.
    fn try_flush(&mut self) -> Result<()> {
        let flusher = self.flusher().ok_or(Error::Unsupported("flush"))?;
        flusher.flush()?;
        Ok(())
    }

    /// Hijacks, or reports [`Error::Unsupported`] if the sink cannot.
    fn try_hijack(&mut self) -> Result<OnUpgrade> {
        self.hijacker()
            .ok_or(Error::Unsupported("hijack"))?
            .hijack()
    }

    /// Subscribes to close notification, or reports [`Error::Unsupported`].
    fn try_close_notify(&mut self) -> Result<CancellationToken> {
        Ok(self
            .close_notifier()
            .ok_or(Error::Unsupported("close notification"))?
            .close_notify())
    }
}

impl<W: ResponseWriter + ?Sized> ResponseWriterExt for W {}

/// In-memory response sink.
///
/// Adapters run a handler against a `BufferedResponse` and convert it into
/// the transport's response type afterwards.
///
/// Nothing is streamed. The whole body is held until the handler returns,
/// and the flush capability only records that a flush was requested (see
/// [`flush_count`](Self::flush_count)). Handlers that need bytes on the wire
/// before they finish should hijack the connection instead.
#[derive(Debug, Default)]
pub struct BufferedResponse {
    status: Option<StatusCode>,
    headers: HeaderMap,
    body: BytesMut,
    flushes: usize,
    closed: CancellationToken,
    upgrade: Option<OnUpgrade>,
}

impl BufferedResponse {
    /// Creates an empty response with no status written.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Attaches a pending upgrade, enabling the hijack capability.
    #[must_use]
    pub fn with_upgrade(mut self, upgrade: OnUpgrade) -> Self {
        self.upgrade = Some(upgrade);
        self
    }

    /// The effective status: the first one written, or `200 OK`.
    #[must_use]
    pub fn status(&self) -> StatusCode {
        self.status.unwrap_or(StatusCode::OK)
    }

    /// Returns true once a status or body byte has been written.
    #[must_use]
    pub fn is_written(&self) -> bool {
        self.status.is_some()
    }

    /// Body bytes written so far.
    #[must_use]
    pub fn body(&self) -> &[u8] {
        &self.body
    }

    /// How many times a flush was requested. Flushing sends nothing early.
    #[must_use]
    pub fn flush_count(&self) -> usize {
        self.flushes
    }

    /// Marks the client connection as gone, notifying subscribers.
    pub fn close(&self) {
        self.closed.cancel();
    }

    /// Returns a handle that cancels close subscribers when triggered.
    #[must_use]
    pub fn close_handle(&self) -> CancellationToken {
        self.closed.clone()
    }

    /// Converts into an `http::Response`.
    #[must_use]
    pub fn into_response(self) -> http::Response<Full<Bytes>> {
        let mut response = http::Response::new(Full::new(self.body.freeze()));
        *response.status_mut() = self.status.unwrap_or(StatusCode::OK);
        *response.headers_mut() = self.headers;
        response
    }
}

impl ResponseWriter for BufferedResponse {
    fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    fn headers_mut(&mut self) -> &mut HeaderMap {
        &mut self.headers
    }

    fn write_header(&mut self, status: StatusCode) {
        if self.status.is_none() {
            self.status = Some(status);
        }
    }

    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        if self.status.is_none() {
            self.status = Some(StatusCode::OK);
        }
        self.body.extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flusher(&mut self) -> Option<&mut dyn Flusher> {
        Some(self)
    }

    fn hijacker(&mut self) -> Option<&mut dyn Hijacker> {
        if self.upgrade.is_some() {
            Some(self)
        } else {
            None
        }
    }

    fn close_notifier(&mut self) -> Option<&mut dyn CloseNotifier> {
        Some(self)
    }
}

impl Flusher for BufferedResponse {
    fn flush(&mut self) -> io::Result<()> {
        self.flushes += 1;
        Ok(())
    }
}

impl Hijacker for BufferedResponse {
    fn hijack(&mut self) -> Result<OnUpgrade> {
        self.upgrade.take().ok_or(Error::Unsupported("hijack"))
    }
}

impl CloseNotifier for BufferedResponse {
    fn close_notify(&mut self) -> CancellationToken {
        self.closed.child_token()
    }
}
