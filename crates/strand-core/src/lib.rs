//! # Strand Core
//!
//! Core types and traits shared by every Strand crate.
//!
//! - [`Context`] - Request-scoped, copy-on-write value store
//! - [`Handler`] - The one invocation contract shared by middleware stages and terminals
//! - [`ResponseWriter`] - The response sink and its optional capabilities
//! - [`Error`] - Outcome type flowing outward through the chain
//! - [`Store`] - Thread-safe key/value store for application-wide caching
//!
//! ## Handler Contract
//!
//! Every stage of a chain, including the terminal handler, has the shape
//!
//! ```text
//! (Context, &mut dyn ResponseWriter, Request) -> Result<(), Error>
//! ```
//!
//! so that wrapping is uniform regardless of position in the chain.

#![doc(html_root_url = "https://docs.rs/strand-core/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod context;
mod error;
mod handler;
pub mod render;
mod request;
pub mod store;
mod writer;

pub use context::{Context, ContextKey};
pub use error::{Error, PanicError, Result};
pub use handler::{handler_fn, BoxFuture, BoxedHandler, FnHandler, Handler};
pub use request::{remote_addr, RemoteAddr, Request, RequestHead};
pub use store::Store;
pub use writer::{
    BufferedResponse, CloseNotifier, Flusher, Hijacker, ResponseWriter, ResponseWriterExt,
};
