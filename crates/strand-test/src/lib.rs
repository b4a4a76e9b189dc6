//! # Strand Test
//!
//! Test utilities for strand handlers and chains. Requests run in memory
//! against a handler: no server, no sockets.
//!
//! - [`TestClient`] - Sends requests to a handler and captures what it wrote
//! - [`TestRequest`] - Fluent builder for [`Request`](strand_core::Request)s
//! - [`TestResponse`] - Status, headers and body, plus the handler outcome
//! - [`LogCapture`] - Collects log records for assertions
//!
//! ## Example
//!
//! ```
//! use http::StatusCode;
//! use strand_core::{handler_fn, Error};
//! use strand_test::TestClient;
//!
//! # tokio_test::block_on(async {
//! let client = TestClient::new(handler_fn(|_ctx, w, _req| {
//!     Box::pin(async move {
//!         w.write_header(StatusCode::UNAUTHORIZED);
//!         Err(Error::Unauthorized)
//!     })
//! }));
//!
//! let response = client.get("/private").send().await;
//! assert_eq!(response.status_code(), 401);
//! assert!(response.error().unwrap().is_unauthorized());
//! # });
//! ```

#![doc(html_root_url = "https://docs.rs/strand-test/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod client;
mod error;
mod logs;
mod request;
mod response;

pub use client::{TestClient, TestClientRequest};
pub use error::TestError;
pub use logs::LogCapture;
pub use request::{TestRequest, TestRequestBuilder};
pub use response::TestResponse;
