//! The middleware unit and its continuation.
//!
//! A [`Middleware`] transforms the stage that follows it into a new stage.
//! Rather than returning a new handler, a unit receives the request together
//! with a [`Next`] continuation that invokes the downstream stage. The unit
//! may run work before and after calling it, call it more than once, or not
//! call it at all (short-circuiting).
//!
//! # Example
//!
//! ```
//! use strand_core::{BoxFuture, Context, Request, ResponseWriter, Result};
//! use strand_middleware::{Middleware, Next};
//!
//! struct Timing;
//!
//! impl Middleware for Timing {
//!     fn name(&self) -> &'static str {
//!         "timing"
//!     }
//!
//!     fn process<'a>(
//!         &'a self,
//!         ctx: Context,
//!         writer: &'a mut dyn ResponseWriter,
//!         request: Request,
//!         next: Next<'a>,
//!     ) -> BoxFuture<'a, Result<()>> {
//!         Box::pin(async move {
//!             let start = std::time::Instant::now();
//!             let outcome = next.run(ctx, writer, request).await;
//!             tracing::debug!(elapsed = ?start.elapsed(), "timed");
//!             outcome
//!         })
//!     }
//! }
//! ```

use std::sync::Arc;

use strand_core::{BoxFuture, BoxedHandler, Context, Handler, Request, ResponseWriter, Result};

/// A unit of request-handling logic that wraps the stage after it.
///
/// # Invariants
///
/// - A unit is shared by every request flowing through its chain, so any
///   state it keeps must be safe under concurrent use
/// - A unit that does not call `next` must write its own response or
///   report why it declined
/// - A unit should return the downstream outcome unless it deliberately
///   replaces it
pub trait Middleware: Send + Sync + 'static {
    /// Short name used in logs and chain listings.
    fn name(&self) -> &'static str;

    /// Handles one request, optionally delegating to `next`.
    ///
    /// # Arguments
    ///
    /// * `ctx` - Values bound by outer units
    /// * `writer` - The response sink
    /// * `request` - The inbound request
    /// * `next` - Invokes the downstream stage
    fn process<'a>(
        &'a self,
        ctx: Context,
        writer: &'a mut dyn ResponseWriter,
        request: Request,
        next: Next<'a>,
    ) -> BoxFuture<'a, Result<()>>;
}

/// A type-erased unit shared between chains.
pub type BoxedMiddleware = Arc<dyn Middleware>;

/// Boxes a unit for use with [`Chain::from_units`](crate::Chain::from_units).
pub fn boxed<M: Middleware>(unit: M) -> BoxedMiddleware {
    Arc::new(unit)
}

/// Continuation that invokes the stage after the current unit.
///
/// `Next` is `Copy`: a unit may run the downstream stage any number of
/// times, for example to retry.
#[derive(Clone, Copy)]
pub struct Next<'a> {
    stage: &'a BoxedHandler,
}

impl<'a> Next<'a> {
    pub(crate) const fn new(stage: &'a BoxedHandler) -> Self {
        Self { stage }
    }

    /// Runs the downstream stage.
    pub fn run<'b>(
        &self,
        ctx: Context,
        writer: &'b mut dyn ResponseWriter,
        request: Request,
    ) -> BoxFuture<'b, Result<()>>
    where
        'a: 'b,
    {
        self.stage.call(ctx, writer, request)
    }

    /// Returns an owned handle to the downstream stage.
    ///
    /// Adapters use this when the foreign code they bridge to needs a
    /// handler it can keep.
    #[must_use]
    pub fn handler(&self) -> BoxedHandler {
        Arc::clone(self.stage)
    }
}

impl std::fmt::Debug for Next<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Next").finish_non_exhaustive()
    }
}

/// A unit applied to a fixed downstream stage.
struct Stage {
    unit: BoxedMiddleware,
    next: BoxedHandler,
}

impl Handler for Stage {
    fn call<'a>(
        &'a self,
        ctx: Context,
        writer: &'a mut dyn ResponseWriter,
        request: Request,
    ) -> BoxFuture<'a, Result<()>> {
        self.unit.process(ctx, writer, request, Next::new(&self.next))
    }
}

/// Applies `unit` to `next`, producing the composed stage.
///
/// Composition only pairs the two; nothing runs until the result is called.
#[must_use]
pub fn compose(unit: BoxedMiddleware, next: BoxedHandler) -> BoxedHandler {
    Arc::new(Stage { unit, next })
}

/// A unit backed by a closure. Created by [`from_fn`].
pub struct FnMiddleware<F> {
    name: &'static str,
    func: F,
}

impl<F> FnMiddleware<F> {
    /// Creates a new function-based unit.
    pub const fn new(name: &'static str, func: F) -> Self {
        Self { name, func }
    }
}

impl<F> Middleware for FnMiddleware<F>
where
    F: for<'a> Fn(Context, &'a mut dyn ResponseWriter, Request, Next<'a>) -> BoxFuture<'a, Result<()>>
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
        (self.func)(ctx, writer, request, next)
    }
}

/// Builds a unit from a closure.
///
/// # Example
///
/// ```
/// use strand_middleware::from_fn;
///
/// let passthrough = from_fn("passthrough", |ctx, w, req, next| {
///     Box::pin(async move { next.run(ctx, w, req).await })
/// });
/// # let _ = passthrough;
/// ```
pub const fn from_fn<F>(name: &'static str, func: F) -> FnMiddleware<F>
where
    F: for<'a> Fn(Context, &'a mut dyn ResponseWriter, Request, Next<'a>) -> BoxFuture<'a, Result<()>>
        + Send
        + Sync
        + 'static,
{
    FnMiddleware::new(name, func)
}
