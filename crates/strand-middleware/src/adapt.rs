//! Adapters for middleware that knows nothing about contexts or outcomes.
//!
//! Plain middleware works with [`PlainHandler`]s: handlers that take only a
//! writer and a request and return nothing. The adapters here let such code
//! sit inside a [`Chain`](crate::Chain) without losing what the chain
//! carries across it:
//!
//! - the [`Context`] seen by the downstream stage is the one the adapter
//!   received, even though the plain middleware never sees it
//! - the downstream outcome comes back out of the adapter, even though the
//!   plain middleware cannot return it
//!
//! If the plain middleware never calls its inner handler, the adapter
//! reports success.

use std::fmt;
use std::sync::Arc;

use parking_lot::Mutex;
use strand_core::{BoxFuture, BoxedHandler, Context, Request, ResponseWriter, Result};

use crate::middleware::{Middleware, Next};

/// A handler without context or outcome.
pub trait PlainHandler: Send + Sync + 'static {
    /// Serves one request.
    fn serve<'a>(&'a self, writer: &'a mut dyn ResponseWriter, request: Request) -> BoxFuture<'a, ()>;
}

/// A shared, type-erased [`PlainHandler`].
pub type BoxedPlainHandler = Arc<dyn PlainHandler>;

/// A plain handler backed by a closure. Created by [`plain_fn`].
pub struct PlainFn<F>(F);

impl<F> PlainHandler for PlainFn<F>
where
    F: for<'a> Fn(&'a mut dyn ResponseWriter, Request) -> BoxFuture<'a, ()> + Send + Sync + 'static,
{
    fn serve<'a>(&'a self, writer: &'a mut dyn ResponseWriter, request: Request) -> BoxFuture<'a, ()> {
        (self.0)(writer, request)
    }
}

/// Builds a [`PlainHandler`] from a closure.
pub fn plain_fn<F>(f: F) -> BoxedPlainHandler
where
    F: for<'a> Fn(&'a mut dyn ResponseWriter, Request) -> BoxFuture<'a, ()> + Send + Sync + 'static,
{
    Arc::new(PlainFn(f))
}

type Outcome = Arc<Mutex<Option<Result<()>>>>;

/// Runs the downstream stage under the captured context and stores its outcome.
struct Bridge {
    ctx: Context,
    next: BoxedHandler,
    outcome: Outcome,
}

impl Bridge {
    fn new(ctx: Context, next: BoxedHandler) -> (Self, Outcome) {
        let outcome = Outcome::default();
        let bridge = Self {
            ctx,
            next,
            outcome: Arc::clone(&outcome),
        };
        (bridge, outcome)
    }
}

impl PlainHandler for Bridge {
    fn serve<'a>(&'a self, writer: &'a mut dyn ResponseWriter, request: Request) -> BoxFuture<'a, ()> {
        Box::pin(async move {
            let result = self.next.call(self.ctx.clone(), writer, request).await;
            *self.outcome.lock() = Some(result);
        })
    }
}

fn take_outcome(outcome: &Outcome) -> Result<()> {
    outcome.lock().take().unwrap_or(Ok(()))
}

/// Adapts plain middleware of the form `handler -> handler`.
///
/// This is the shape of most generic HTTP middleware: it receives the
/// handler it wraps and returns a new one.
///
/// # Example
///
/// ```
/// use strand_core::ResponseWriterExt;
/// use strand_middleware::adapt::{self, plain_fn};
///
/// let banner = adapt::http("banner", |inner| {
///     plain_fn(move |w, req| {
///         let inner = inner.clone();
///         Box::pin(async move {
///             let _ = w.write_all(b"> ");
///             inner.serve(w, req).await;
///         })
///     })
/// });
/// # let _ = banner;
/// ```
pub fn http<F>(name: &'static str, wrap: F) -> Wrap<F>
where
    F: Fn(BoxedPlainHandler) -> BoxedPlainHandler + Send + Sync + 'static,
{
    Wrap { name, wrap }
}

/// Unit returned by [`http`].
pub struct Wrap<F> {
    name: &'static str,
    wrap: F,
}

impl<F> fmt::Debug for Wrap<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Wrap").field("name", &self.name).finish()
    }
}

impl<F> Middleware for Wrap<F>
where
    F: Fn(BoxedPlainHandler) -> BoxedPlainHandler + Send + Sync + 'static,
{
    fn name(&self) -> &'static str {
        self.name
    }

    fn process<'a>(
        &'a self,
        ctx: Context,
        writer: &'a mut dyn ResponseWriter,
        request: Request,
        next: Next<'a>,
    ) -> BoxFuture<'a, Result<()>> {
        Box::pin(async move {
            let (bridge, outcome) = Bridge::new(ctx, next.handler());
            let wrapped = (self.wrap)(Arc::new(bridge));
            wrapped.serve(writer, request).await;
            take_outcome(&outcome)
        })
    }
}

/// Adapts plain middleware that receives its inner handler per call.
///
/// The closure gets the writer, the request and the inner handler, and
/// decides whether to call it.
pub fn inline<F>(name: &'static str, func: F) -> Inline<F>
where
    F: for<'a> Fn(&'a mut dyn ResponseWriter, Request, BoxedPlainHandler) -> BoxFuture<'a, ()>
        + Send
        + Sync
        + 'static,
{
    Inline { name, func }
}

/// Unit returned by [`inline`].
pub struct Inline<F> {
    name: &'static str,
    func: F,
}

impl<F> fmt::Debug for Inline<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Inline").field("name", &self.name).finish()
    }
}

impl<F> Middleware for Inline<F>
where
    F: for<'a> Fn(&'a mut dyn ResponseWriter, Request, BoxedPlainHandler) -> BoxFuture<'a, ()>
        + Send
        + Sync
        + 'static,
{
    fn name(&self) -> &'static str {
        self.name
    }

    fn process<'a>(
        &'a self,
        ctx: Context,
        writer: &'a mut dyn ResponseWriter,
        request: Request,
        next: Next<'a>,
    ) -> BoxFuture<'a, Result<()>> {
        Box::pin(async move {
            let (bridge, outcome) = Bridge::new(ctx, next.handler());
            (self.func)(writer, request, Arc::new(bridge)).await;
            take_outcome(&outcome)
        })
    }
}
