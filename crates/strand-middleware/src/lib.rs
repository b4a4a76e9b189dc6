//! # Strand Middleware
//!
//! Composable middleware chains for strand handlers.
//!
//! A [`Middleware`] unit wraps the stage after it. A [`Chain`] is an
//! immutable list of units which, finalized around a terminal handler with
//! [`Chain::then`], yields a single [`Handler`](strand_core::Handler):
//!
//! ```text
//! Chain [RealIp, Logger, Recover].then(h)
//!
//! request → RealIp → Logger → Recover → h
//! outcome ← RealIp ← Logger ← Recover ←┘
//! ```
//!
//! ## Example
//!
//! ```
//! use http::StatusCode;
//! use strand_core::handler_fn;
//! use strand_middleware::stages::{default_chain, BasicAuth};
//!
//! let admin = default_chain()
//!     .append(BasicAuth::new("admin", |user, pass| user == "root" && pass == "toor"))
//!     .then(handler_fn(|_ctx, w, _req| {
//!         Box::pin(async move {
//!             w.write_header(StatusCode::NO_CONTENT);
//!             Ok(())
//!         })
//!     }));
//! # let _ = admin;
//! ```

#![doc(html_root_url = "https://docs.rs/strand-middleware/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod adapt;
pub mod chain;
pub mod middleware;
pub mod stages;

pub use chain::Chain;
pub use middleware::{boxed, compose, from_fn, BoxedMiddleware, FnMiddleware, Middleware, Next};
pub use stages::default_chain;
