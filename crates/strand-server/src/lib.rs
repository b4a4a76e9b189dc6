//! # Strand Server
//!
//! Runs finalized strand handlers on hyper.
//!
//! - [`HyperAdapter`] - a hyper `Service` around any [`Handler`](strand_core::Handler)
//! - [`Server`] - accept loop with graceful shutdown
//! - [`ServerConfig`] - bind address and shutdown timeout

#![doc(html_root_url = "https://docs.rs/strand-server/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod adapter;
mod config;
mod error;
mod server;
mod shutdown;

pub use adapter::{HttpResponse, HyperAdapter};
pub use config::{ServerConfig, ServerConfigBuilder, DEFAULT_HTTP_ADDR, DEFAULT_SHUTDOWN_TIMEOUT_SECS};
pub use error::ServerError;
pub use server::Server;
pub use shutdown::shutdown_signal;
