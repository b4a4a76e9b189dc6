//! # Strand Router
//!
//! Path routing for strand chains, built on the [`matchit`] radix tree.
//!
//! A [`Router`] is itself a [`Handler`](strand_core::Handler), so it can be
//! served directly or finalized behind another chain. Each route is a
//! finalized chain: the router's base units, then any group or per-route
//! units, then the terminal handler.
//!
//! Patterns use `{name}` for a segment and `{*name}` for the remainder of
//! the path. Captured values are bound to the request context:
//!
//! ```
//! use strand_core::{handler_fn, ResponseWriterExt};
//! use strand_middleware::stages::default_chain;
//! use strand_router::{param, Router};
//!
//! let mut router = Router::new(default_chain());
//! router
//!     .get("/files/{*path}", handler_fn(|ctx, w, _req| {
//!         let path = param(&ctx, "path").to_string();
//!         Box::pin(async move { w.write_all(path.as_bytes()) })
//!     }))
//!     .unwrap();
//! ```
//!
//! Requests that match no route get `404 page not found`. Requests whose
//! path matches under a different method get `405` with an `Allow` header.

#![doc(html_root_url = "https://docs.rs/strand-router/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod error;
mod params;
mod router;

pub use error::RouteError;
pub use params::{param, params, Params};
pub use router::{Group, Router};
