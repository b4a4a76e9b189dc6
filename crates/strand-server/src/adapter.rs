//! Bridges finalized handlers onto hyper.

use std::convert::Infallible;
use std::fmt;
use std::future::Future;
use std::net::SocketAddr;
use std::pin::Pin;
use std::sync::Arc;

use bytes::Bytes;
use http::{header, HeaderValue, StatusCode};
use http_body_util::{BodyExt, Full};
use hyper::body::{Body, Incoming};
use hyper::service::Service;
use hyper::upgrade::OnUpgrade;
use strand_core::{
    render, BoxedHandler, BufferedResponse, Context, Handler, RemoteAddr, ResponseWriter,
};

/// Response type handed back to hyper.
pub type HttpResponse = http::Response<Full<Bytes>>;

/// Runs a strand handler as a hyper [`Service`].
///
/// Per request, the adapter:
///
/// 1. collects the body into [`Bytes`]
/// 2. records the peer address as a [`RemoteAddr`] extension
/// 3. runs the handler against a [`BufferedResponse`] whose close
///    notification fires when the request future is dropped or finishes
/// 4. answers with [`Error::status_code`](strand_core::Error::status_code)
///    if the handler failed without writing anything
#[derive(Clone)]
pub struct HyperAdapter {
    handler: BoxedHandler,
    remote_addr: Option<SocketAddr>,
}

impl HyperAdapter {
    /// Wraps `handler`.
    pub fn new<H: Handler>(handler: H) -> Self {
        Self::from_boxed(Arc::new(handler))
    }

    /// Wraps an already-boxed handler.
    #[must_use]
    pub fn from_boxed(handler: BoxedHandler) -> Self {
        Self {
            handler,
            remote_addr: None,
        }
    }

    /// Binds the adapter to one connection's peer address.
    #[must_use]
    pub fn with_remote_addr(mut self, addr: SocketAddr) -> Self {
        self.remote_addr = Some(addr);
        self
    }

    /// Serves one request to completion.
    pub async fn handle<B>(&self, request: http::Request<B>) -> HttpResponse
    where
        B: Body<Data = Bytes>,
        B::Error: fmt::Display,
    {
        let (mut parts, body) = request.into_parts();
        let body = match body.collect().await {
            Ok(collected) => collected.to_bytes(),
            Err(err) => {
                tracing::warn!(error = %err, "failed to read request body");
                return status_response(StatusCode::BAD_REQUEST);
            }
        };

        let upgrade = parts.extensions.remove::<OnUpgrade>();
        if let Some(addr) = self.remote_addr {
            parts.extensions.insert(RemoteAddr(addr));
        }
        let request = http::Request::from_parts(parts, body);

        let mut writer = match upgrade {
            Some(upgrade) => BufferedResponse::new().with_upgrade(upgrade),
            None => BufferedResponse::new(),
        };
        let closed = writer.close_handle();
        let _closing = closed.clone().drop_guard();

        let ctx = Context::new().with_cancellation(closed);
        let outcome = self.handler.call(ctx, &mut writer, request).await;

        if let Err(err) = outcome {
            if writer.is_written() {
                tracing::debug!(error = %err, status = writer.status().as_u16(), "handler failed after responding");
            } else {
                let status = err.status_code();
                if status.is_server_error() {
                    tracing::error!(error = %err, "handler failed without a response");
                } else {
                    tracing::debug!(error = %err, status = status.as_u16(), "request declined without a response");
                }
                return status_response(status);
            }
        }
        writer.into_response()
    }
}

impl fmt::Debug for HyperAdapter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HyperAdapter")
            .field("remote_addr", &self.remote_addr)
            .finish_non_exhaustive()
    }
}

impl Service<hyper::Request<Incoming>> for HyperAdapter {
    type Response = HttpResponse;
    type Error = Infallible;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>> + Send>>;

    fn call(&self, request: hyper::Request<Incoming>) -> Self::Future {
        let adapter = self.clone();
        Box::pin(async move { Ok(adapter.handle(request).await) })
    }
}

fn status_response(status: StatusCode) -> HttpResponse {
    let mut writer = BufferedResponse::new();
    writer
        .headers_mut()
        .insert(header::CONTENT_TYPE, HeaderValue::from_static(render::TEXT));
    writer.write_header(status);
    let reason = status.canonical_reason().unwrap_or_default();
    let _ = writer.write(format!("{} {reason}", status.as_u16()).as_bytes());
    writer.into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;
    use strand_core::{handler_fn, remote_addr, Error, ResponseWriterExt};
    use tokio_util::sync::CancellationToken;

    fn request(body: &'static str) -> http::Request<Full<Bytes>> {
        http::Request::builder()
            .uri("/echo")
            .body(Full::new(Bytes::from_static(body.as_bytes())))
            .unwrap()
    }

    async fn body_of(response: HttpResponse) -> Bytes {
        response.into_body().collect().await.unwrap().to_bytes()
    }

    #[tokio::test]
    async fn test_body_and_remote_addr_reach_handler() {
        let adapter = HyperAdapter::new(handler_fn(|_ctx, w, req| {
            let peer = remote_addr(&req).map(|a| a.to_string()).unwrap_or_default();
            let body = req.into_body();
            Box::pin(async move {
                w.write_all(peer.as_bytes())?;
                w.write_all(b" ")?;
                w.write_all(&body)
            })
        }))
        .with_remote_addr("192.0.2.5:41000".parse().unwrap());

        let response = adapter.handle(request("ping")).await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_of(response).await, "192.0.2.5:41000 ping");
    }

    #[tokio::test]
    async fn test_unwritten_failure_is_500() {
        let adapter = HyperAdapter::new(handler_fn(|_ctx, _w, _req| {
            Box::pin(async { Err(Error::Io(std::io::Error::other("database unavailable"))) })
        }));

        let response = adapter.handle(request("")).await;
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body_of(response).await, "500 Internal Server Error");
    }

    #[tokio::test]
    async fn test_unwritten_decode_failure_is_400() {
        let adapter = HyperAdapter::new(handler_fn(|_ctx, _w, _req| {
            Box::pin(async { Err(Error::decode("expected value at line 1 column 2")) })
        }));

        let response = adapter.handle(request("{not json")).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(body_of(response).await, "400 Bad Request");
    }

    #[tokio::test]
    async fn test_unwritten_refusals_keep_their_status() {
        let denied = HyperAdapter::new(handler_fn(|_ctx, _w, _req| {
            Box::pin(async { Err(Error::Unauthorized) })
        }));
        assert_eq!(
            denied.handle(request("")).await.status(),
            StatusCode::UNAUTHORIZED
        );

        let missing = HyperAdapter::new(handler_fn(|_ctx, _w, _req| {
            Box::pin(async { Err(Error::NotFound("session".to_string())) })
        }));
        assert_eq!(
            missing.handle(request("")).await.status(),
            StatusCode::NOT_FOUND
        );
    }

    #[tokio::test]
    async fn test_written_failure_keeps_response() {
        let adapter = HyperAdapter::new(handler_fn(|_ctx, w, _req| {
            Box::pin(async move {
                w.write_header(StatusCode::UNAUTHORIZED);
                Err(Error::Unauthorized)
            })
        }));

        let response = adapter.handle(request("")).await;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_context_cancelled_after_request() {
        let seen: Arc<Mutex<Option<CancellationToken>>> = Arc::default();
        let slot = Arc::clone(&seen);
        let adapter = HyperAdapter::new(handler_fn(move |ctx, _w, _req| {
            let token = ctx.cancellation().cloned();
            assert!(token.as_ref().is_some_and(|t| !t.is_cancelled()));
            *slot.lock() = token;
            Box::pin(async { Ok(()) })
        }));

        adapter.handle(request("")).await;
        let token = seen.lock().take().unwrap();
        assert!(token.is_cancelled());
    }
}
