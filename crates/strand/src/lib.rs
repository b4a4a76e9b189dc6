//! # Strand
//!
//! Composable middleware chains for HTTP handlers, with a request-scoped
//! context that flows inward and an outcome that flows back out.
//!
//! - [`Context`](core::Context) carries typed, copy-on-write values
//! - [`Chain`](middleware::Chain) composes [`Middleware`](middleware::Middleware)
//!   units around a terminal [`Handler`](core::Handler)
//! - built-in units recover panics, log access, resolve client addresses,
//!   check Basic credentials, bind request bodies and render responses
//! - [`Router`](router::Router) dispatches onto chain-wrapped handlers
//! - [`Server`](server::Server) runs any handler on hyper
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use strand::prelude::*;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = ConfigLoader::new().with_env_prefix("STRAND").load()?;
//!     init_logging(&config.logging.log_config())?;
//!
//!     let mut router = Router::new(default_chain());
//!     router.get("/hello/{name}", handler_fn(|ctx, w, _req| {
//!         let greeting = format!("hello {}", param(&ctx, "name"));
//!         Box::pin(async move { w.write_all(greeting.as_bytes()) })
//!     }))?;
//!
//!     Server::new(config.server.server_config(), router).run().await?;
//!     Ok(())
//! }
//! ```
//!
//! ## Flow
//!
//! ```text
//! request → RealIp → Logger → Recover → LocalStore → handler
//! outcome ← RealIp ← Logger ← Recover ← LocalStore ←───┘
//! ```

#![doc(html_root_url = "https://docs.rs/strand/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub use strand_config as config;
pub use strand_core as core;
pub use strand_middleware as middleware;
pub use strand_router as router;
pub use strand_server as server;
pub use strand_telemetry as telemetry;

/// Common imports.
///
/// ```rust
/// use strand::prelude::*;
/// ```
pub mod prelude {
    pub use strand_config::{ConfigLoader, StrandConfig};
    pub use strand_core::{
        handler_fn, BoxFuture, BoxedHandler, Context, ContextKey, Error, Handler, Request,
        ResponseWriter, ResponseWriterExt, Store,
    };
    pub use strand_middleware::adapt::{self, plain_fn, PlainHandler};
    pub use strand_middleware::stages::{
        bound, default_chain, local_store, real_ip, shared_store, user, yield_data, BasicAuth,
        Bind, Logger, LocalStore, RealIp, Recover, Render, SharedStore,
    };
    pub use strand_middleware::{from_fn, Chain, Middleware, Next};
    pub use strand_router::{param, params, Router};
    pub use strand_server::{Server, ServerConfig};
    pub use strand_telemetry::{init_logging, LogConfig};
}
