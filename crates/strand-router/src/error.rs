//! Route registration errors.

use thiserror::Error;

/// Errors raised while building a route table.
#[derive(Debug, Error)]
pub enum RouteError {
    /// The pattern is malformed or conflicts with an existing route.
    #[error("invalid route `{method} {path}`: {source}")]
    Insert {
        /// Method the route was registered for
        method: http::Method,
        /// Full route pattern, group prefixes included
        path: String,
        /// Why the route table rejected it
        #[source]
        source: matchit::InsertError,
    },
}
