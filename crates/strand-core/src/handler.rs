//! The handler contract.
//!
//! [`Handler`] is the single invocation shape shared by every stage: the
//! stages produced by middleware and the terminal handler that writes the
//! actual response. Stages are stored type-erased as [`BoxedHandler`] so a
//! chain can hold stages of different concrete types.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use crate::context::Context;
use crate::error::Result;
use crate::request::Request;
use crate::writer::ResponseWriter;

/// A boxed, sendable future.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// A stage of request handling.
///
/// # Invariants
///
/// - A handler writes its response through `writer`, never by return value
/// - The returned outcome is what outer stages observe; a handler that
///   declines to produce a response should say so with an `Err`
pub trait Handler: Send + Sync + 'static {
    /// Handles one request.
    ///
    /// # Arguments
    ///
    /// * `ctx` - Request-scoped values seen by this stage
    /// * `writer` - The response sink
    /// * `request` - The inbound request
    fn call<'a>(
        &'a self,
        ctx: Context,
        writer: &'a mut dyn ResponseWriter,
        request: Request,
    ) -> BoxFuture<'a, Result<()>>;
}

/// A type-erased handler shared across concurrent requests.
pub type BoxedHandler = Arc<dyn Handler>;

impl Handler for BoxedHandler {
    fn call<'a>(
        &'a self,
        ctx: Context,
        writer: &'a mut dyn ResponseWriter,
        request: Request,
    ) -> BoxFuture<'a, Result<()>> {
        (**self).call(ctx, writer, request)
    }
}

/// A handler backed by a closure. Created by [`handler_fn`].
pub struct FnHandler<F>(F);

impl<F> Handler for FnHandler<F>
where
    F: for<'a> Fn(Context, &'a mut dyn ResponseWriter, Request) -> BoxFuture<'a, Result<()>>
        + Send
        + Sync
        + 'static,
{
    fn call<'a>(
        &'a self,
        ctx: Context,
        writer: &'a mut dyn ResponseWriter,
        request: Request,
    ) -> BoxFuture<'a, Result<()>> {
        (self.0)(ctx, writer, request)
    }
}

/// Builds a [`Handler`] from a closure.
///
/// # Example
///
/// ```
/// use http::StatusCode;
/// use strand_core::{handler_fn, ResponseWriterExt};
///
/// let hello = handler_fn(|_ctx, w, _req| {
///     Box::pin(async move {
///         w.write_header(StatusCode::OK);
///         w.write_all(b"hello")?;
///         Ok(())
///     })
/// });
/// # let _ = hello;
/// ```
pub fn handler_fn<F>(f: F) -> FnHandler<F>
where
    F: for<'a> Fn(Context, &'a mut dyn ResponseWriter, Request) -> BoxFuture<'a, Result<()>>
        + Send
        + Sync
        + 'static,
{
    FnHandler(f)
}
