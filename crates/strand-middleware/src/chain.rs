//! Immutable middleware chains.
//!
//! A [`Chain`] is an ordered list of units. Extending a chain never changes
//! it; [`Chain::append`], [`Chain::extend`] and [`Chain::join`] return a new
//! chain, so a common base can be branched into several independent chains.
//!
//! ```text
//! Chain [A, B, C].then(h)  ==  A(B(C(h)))
//!
//! request → A → B → C → h
//! outcome ← A ← B ← C ←┘
//! ```
//!
//! The first unit in the chain is the outermost: it sees the request first
//! and the outcome last.

use std::fmt;
use std::sync::Arc;

use strand_core::{BoxedHandler, Handler};

use crate::middleware::{compose, BoxedMiddleware, Middleware};

/// An immutable, ordered list of middleware units.
///
/// Cloning a chain is cheap; the units are shared.
///
/// # Example
///
/// ```
/// use strand_middleware::{Chain, stages::{Logger, Recover, RealIp}};
///
/// let base = Chain::new().append(RealIp).append(Logger::new());
/// let guarded = base.append(Recover::new());
///
/// assert_eq!(base.len(), 2);
/// assert_eq!(guarded.names(), ["real_ip", "logger", "recover"]);
/// ```
#[derive(Clone)]
pub struct Chain {
    units: Arc<[BoxedMiddleware]>,
}

impl Chain {
    /// Creates an empty chain. Finalizing it returns the terminal unchanged.
    #[must_use]
    pub fn new() -> Self {
        Self::from_units(Vec::new())
    }

    /// Creates a chain from boxed units, outermost first.
    #[must_use]
    pub fn from_units(units: impl IntoIterator<Item = BoxedMiddleware>) -> Self {
        Self {
            units: units.into_iter().collect::<Vec<_>>().into(),
        }
    }

    /// Returns a new chain with `unit` added innermost.
    #[must_use]
    pub fn append<M: Middleware>(&self, unit: M) -> Self {
        self.extend([Arc::new(unit) as BoxedMiddleware])
    }

    /// Returns a new chain with `units` added innermost, in order.
    ///
    /// `chain.extend([a, b])` is equivalent to `chain.extend([a]).extend([b])`.
    #[must_use]
    pub fn extend(&self, units: impl IntoIterator<Item = BoxedMiddleware>) -> Self {
        Self::from_units(self.units.iter().cloned().chain(units))
    }

    /// Returns a new chain running `self` and then `other`.
    #[must_use]
    pub fn join(&self, other: &Self) -> Self {
        self.extend(other.units.iter().cloned())
    }

    /// Finalizes the chain around a terminal handler.
    ///
    /// Units are applied innermost first, so the first unit of the chain
    /// becomes the outermost stage of the result. The chain is unchanged
    /// and can be finalized again with another terminal.
    #[must_use]
    pub fn then<H: Handler>(&self, terminal: H) -> BoxedHandler {
        self.then_boxed(Arc::new(terminal))
    }

    /// Like [`then`](Self::then) for an already-boxed terminal.
    #[must_use]
    pub fn then_boxed(&self, terminal: BoxedHandler) -> BoxedHandler {
        self.units
            .iter()
            .rev()
            .fold(terminal, |next, unit| compose(Arc::clone(unit), next))
    }

    /// Number of units in the chain.
    #[must_use]
    pub fn len(&self) -> usize {
        self.units.len()
    }

    /// Returns true if the chain has no units.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.units.is_empty()
    }

    /// Unit names, outermost first.
    #[must_use]
    pub fn names(&self) -> Vec<&'static str> {
        self.units.iter().map(|unit| unit.name()).collect()
    }
}

impl Default for Chain {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Chain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Chain").field("units", &self.names()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::middleware::{boxed, from_fn};
    use bytes::Bytes;
    use parking_lot::Mutex;
    use strand_core::{handler_fn, BufferedResponse, Context, Request};

    type Trace = Arc<Mutex<Vec<String>>>;

    fn tracer(name: &'static str, trace: &Trace) -> BoxedMiddleware {
        let trace = Arc::clone(trace);
        boxed(from_fn(name, move |ctx, w, req, next| {
            let trace = Arc::clone(&trace);
            Box::pin(async move {
                trace.lock().push(format!("{name}:before"));
                let outcome = next.run(ctx, w, req).await;
                trace.lock().push(format!("{name}:after"));
                outcome
            })
        }))
    }

    fn terminal(trace: &Trace) -> impl Handler {
        let trace = Arc::clone(trace);
        handler_fn(move |_ctx, _w, _req| {
            trace.lock().push("handler".to_string());
            Box::pin(async { Ok(()) })
        })
    }

    fn request() -> Request {
        http::Request::builder().uri("/").body(Bytes::new()).unwrap()
    }

    #[tokio::test]
    async fn test_order_is_outermost_first() {
        let trace = Trace::default();
        let chain = Chain::new()
            .extend([tracer("a", &trace), tracer("b", &trace)])
            .extend([tracer("c", &trace)]);

        let handler = chain.then(terminal(&trace));
        handler
            .call(Context::new(), &mut BufferedResponse::new(), request())
            .await
            .unwrap();

        assert_eq!(
            *trace.lock(),
            [
                "a:before", "b:before", "c:before", "handler", "c:after", "b:after", "a:after"
            ]
        );
    }

    #[tokio::test]
    async fn test_empty_chain_is_terminal() {
        let trace = Trace::default();
        let handler = Chain::new().then(terminal(&trace));
        handler
            .call(Context::new(), &mut BufferedResponse::new(), request())
            .await
            .unwrap();
        assert_eq!(*trace.lock(), ["handler"]);
    }

    #[test]
    fn test_branches_are_independent() {
        let trace = Trace::default();
        let base = Chain::new().extend([tracer("base", &trace)]);
        let left = base.extend([tracer("left", &trace)]);
        let right = base.extend([tracer("right", &trace)]);

        assert_eq!(base.names(), ["base"]);
        assert_eq!(left.names(), ["base", "left"]);
        assert_eq!(right.names(), ["base", "right"]);
    }

    #[test]
    fn test_join() {
        let trace = Trace::default();
        let a = Chain::new().extend([tracer("a", &trace)]);
        let b = Chain::new().extend([tracer("b", &trace), tracer("c", &trace)]);
        assert_eq!(a.join(&b).names(), ["a", "b", "c"]);
        assert_eq!(a.len(), 1);
    }

    #[test]
    fn test_debug_lists_names() {
        let trace = Trace::default();
        let chain = Chain::new().extend([tracer("x", &trace)]);
        assert_eq!(format!("{chain:?}"), r#"Chain { units: ["x"] }"#);
    }
}
