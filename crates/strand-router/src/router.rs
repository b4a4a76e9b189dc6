//! Method and path dispatch onto chain-wrapped handlers.

use std::collections::HashMap;
use std::sync::Arc;

use http::header::{HeaderValue, ALLOW, CONTENT_TYPE};
use http::{Method, StatusCode};
use strand_core::{
    render, BoxFuture, BoxedHandler, Context, Handler, Request, ResponseWriter, ResponseWriterExt,
};
use strand_middleware::Chain;

use crate::error::RouteError;
use crate::params::{Params, ParamsKey};

const NOT_FOUND_BODY: &[u8] = b"404 page not found";
const METHOD_NOT_ALLOWED_BODY: &[u8] = b"405 method not allowed";

/// A route table whose entries are finalized chains.
///
/// Every route runs behind the router's base chain, plus any units given
/// when the route (or its [`Group`]) was registered. On a match the
/// captured path parameters are bound to the context, where [`param`]
/// and [`params`] read them back.
///
/// [`param`]: crate::param
/// [`params`]: crate::params
///
/// # Example
///
/// ```
/// use strand_core::{handler_fn, ResponseWriterExt};
/// use strand_middleware::Chain;
/// use strand_router::{param, Router};
///
/// let mut router = Router::new(Chain::new());
/// router
///     .get(
///         "/hello/{name}",
///         handler_fn(|ctx, w, _req| {
///             let greeting = format!("hello {}", param(&ctx, "name"));
///             Box::pin(async move { w.write_all(greeting.as_bytes()) })
///         }),
///     )
///     .unwrap();
/// ```
#[derive(Default)]
pub struct Router {
    routes: HashMap<Method, matchit::Router<BoxedHandler>>,
    chain: Chain,
    len: usize,
}

impl Router {
    /// Creates an empty router whose routes all run behind `chain`.
    #[must_use]
    pub fn new(chain: Chain) -> Self {
        Self {
            routes: HashMap::new(),
            chain,
            len: 0,
        }
    }

    /// The base chain.
    #[must_use]
    pub fn chain(&self) -> &Chain {
        &self.chain
    }

    /// Registers `terminal` for `method` and `path` behind the base chain.
    ///
    /// # Errors
    ///
    /// Fails if `path` is malformed or conflicts with an existing route.
    pub fn handle<H: Handler>(
        &mut self,
        method: Method,
        path: &str,
        terminal: H,
    ) -> Result<&mut Self, RouteError> {
        let handler = self.chain.then(terminal);
        self.insert(method, path, handler)?;
        Ok(self)
    }

    /// Registers `terminal` behind the base chain followed by `units`.
    ///
    /// # Errors
    ///
    /// Fails if `path` is malformed or conflicts with an existing route.
    pub fn handle_with<H: Handler>(
        &mut self,
        method: Method,
        path: &str,
        units: &Chain,
        terminal: H,
    ) -> Result<&mut Self, RouteError> {
        let handler = self.chain.join(units).then(terminal);
        self.insert(method, path, handler)?;
        Ok(self)
    }

    /// Registers a GET route.
    ///
    /// # Errors
    ///
    /// See [`Router::handle`].
    pub fn get<H: Handler>(&mut self, path: &str, terminal: H) -> Result<&mut Self, RouteError> {
        self.handle(Method::GET, path, terminal)
    }

    /// Registers a POST route.
    ///
    /// # Errors
    ///
    /// See [`Router::handle`].
    pub fn post<H: Handler>(&mut self, path: &str, terminal: H) -> Result<&mut Self, RouteError> {
        self.handle(Method::POST, path, terminal)
    }

    /// Registers a PUT route.
    ///
    /// # Errors
    ///
    /// See [`Router::handle`].
    pub fn put<H: Handler>(&mut self, path: &str, terminal: H) -> Result<&mut Self, RouteError> {
        self.handle(Method::PUT, path, terminal)
    }

    /// Registers a PATCH route.
    ///
    /// # Errors
    ///
    /// See [`Router::handle`].
    pub fn patch<H: Handler>(&mut self, path: &str, terminal: H) -> Result<&mut Self, RouteError> {
        self.handle(Method::PATCH, path, terminal)
    }

    /// Registers a DELETE route.
    ///
    /// # Errors
    ///
    /// See [`Router::handle`].
    pub fn delete<H: Handler>(&mut self, path: &str, terminal: H) -> Result<&mut Self, RouteError> {
        self.handle(Method::DELETE, path, terminal)
    }

    /// Registers an OPTIONS route.
    ///
    /// # Errors
    ///
    /// See [`Router::handle`].
    pub fn options<H: Handler>(&mut self, path: &str, terminal: H) -> Result<&mut Self, RouteError> {
        self.handle(Method::OPTIONS, path, terminal)
    }

    /// Opens a group of routes sharing a path prefix and extra units.
    pub fn group(&mut self, prefix: &str, units: &Chain) -> Group<'_> {
        let chain = self.chain.join(units);
        Group {
            router: self,
            prefix: prefix.trim_end_matches('/').to_string(),
            chain,
        }
    }

    /// Number of registered routes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.len
    }

    /// Returns true if no routes are registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Methods with a route matching `path`, in a stable order.
    #[must_use]
    pub fn allowed_methods(&self, path: &str) -> Vec<Method> {
        let mut methods: Vec<Method> = self
            .routes
            .iter()
            .filter(|(_, tree)| tree.at(path).is_ok())
            .map(|(method, _)| method.clone())
            .collect();
        methods.sort_by(|a, b| a.as_str().cmp(b.as_str()));
        methods
    }

    fn insert(&mut self, method: Method, path: &str, handler: BoxedHandler) -> Result<(), RouteError> {
        self.routes
            .entry(method.clone())
            .or_default()
            .insert(path, handler)
            .map_err(|source| RouteError::Insert {
                method: method.clone(),
                path: path.to_string(),
                source,
            })?;
        tracing::debug!(%method, path, "route registered");
        self.len += 1;
        Ok(())
    }

    fn lookup(&self, method: &Method, path: &str) -> Option<(BoxedHandler, Params)> {
        let matched = self.routes.get(method)?.at(path).ok()?;
        let params = matched.params.iter().collect();
        Some((Arc::clone(matched.value), params))
    }
}

impl std::fmt::Debug for Router {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Router")
            .field("chain", &self.chain)
            .field("routes", &self.len)
            .finish()
    }
}

impl Handler for Router {
    fn call<'a>(
        &'a self,
        ctx: Context,
        writer: &'a mut dyn ResponseWriter,
        request: Request,
    ) -> BoxFuture<'a, strand_core::Result<()>> {
        let path = request.uri().path().to_string();
        match self.lookup(request.method(), &path) {
            Some((handler, params)) => Box::pin(async move {
                handler
                    .call(ctx.with::<ParamsKey>(params), writer, request)
                    .await
            }),
            None => {
                let allowed = self.allowed_methods(&path);
                Box::pin(async move { unmatched(writer, &allowed) })
            }
        }
    }
}

fn unmatched(writer: &mut dyn ResponseWriter, allowed: &[Method]) -> strand_core::Result<()> {
    writer
        .headers_mut()
        .insert(CONTENT_TYPE, HeaderValue::from_static(render::TEXT));
    if allowed.is_empty() {
        writer.write_header(StatusCode::NOT_FOUND);
        return writer.write_all(NOT_FOUND_BODY);
    }

    let allow = allowed
        .iter()
        .map(Method::as_str)
        .collect::<Vec<_>>()
        .join(", ");
    if let Ok(value) = HeaderValue::from_str(&allow) {
        writer.headers_mut().insert(ALLOW, value);
    }
    writer.write_header(StatusCode::METHOD_NOT_ALLOWED);
    writer.write_all(METHOD_NOT_ALLOWED_BODY)
}

/// Routes registered under a shared prefix and chain. Created by
/// [`Router::group`].
pub struct Group<'r> {
    router: &'r mut Router,
    prefix: String,
    chain: Chain,
}

impl Group<'_> {
    /// The full path a route registered as `path` ends up under.
    #[must_use]
    pub fn path(&self, path: &str) -> String {
        format!("{}{path}", self.prefix)
    }

    /// Registers `terminal` behind the group's chain.
    ///
    /// # Errors
    ///
    /// Fails if the prefixed path is malformed or conflicts with an existing route.
    pub fn handle<H: Handler>(
        &mut self,
        method: Method,
        path: &str,
        terminal: H,
    ) -> Result<&mut Self, RouteError> {
        let full = self.path(path);
        let handler = self.chain.then(terminal);
        self.router.insert(method, &full, handler)?;
        Ok(self)
    }

    /// Registers a GET route.
    ///
    /// # Errors
    ///
    /// See [`Group::handle`].
    pub fn get<H: Handler>(&mut self, path: &str, terminal: H) -> Result<&mut Self, RouteError> {
        self.handle(Method::GET, path, terminal)
    }

    /// Registers a POST route.
    ///
    /// # Errors
    ///
    /// See [`Group::handle`].
    pub fn post<H: Handler>(&mut self, path: &str, terminal: H) -> Result<&mut Self, RouteError> {
        self.handle(Method::POST, path, terminal)
    }

    /// Registers a PUT route.
    ///
    /// # Errors
    ///
    /// See [`Group::handle`].
    pub fn put<H: Handler>(&mut self, path: &str, terminal: H) -> Result<&mut Self, RouteError> {
        self.handle(Method::PUT, path, terminal)
    }

    /// Registers a DELETE route.
    ///
    /// # Errors
    ///
    /// See [`Group::handle`].
    pub fn delete<H: Handler>(&mut self, path: &str, terminal: H) -> Result<&mut Self, RouteError> {
        self.handle(Method::DELETE, path, terminal)
    }

    /// Opens a nested group.
    pub fn group(&mut self, prefix: &str, units: &Chain) -> Group<'_> {
        Group {
            prefix: self.path(prefix.trim_end_matches('/')),
            chain: self.chain.join(units),
            router: &mut *self.router,
        }
    }
}
