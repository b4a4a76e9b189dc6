//! HTTP server with graceful shutdown.
//!
//! Once shutdown begins the server stops accepting, asks every open
//! connection to finish its in-flight requests, and waits up to the
//! configured timeout for them before returning.

use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;

use hyper_util::rt::{TokioExecutor, TokioIo};
use hyper_util::server::conn::auto::Builder as ConnBuilder;
use hyper_util::server::graceful::GracefulShutdown;
use strand_core::{BoxedHandler, Handler};
use tokio::net::TcpListener;
use tracing::{debug, error, info, warn};

use crate::adapter::HyperAdapter;
use crate::config::ServerConfig;
use crate::error::ServerError;
use crate::shutdown::shutdown_signal;

/// Serves a finalized handler over HTTP/1.1 and HTTP/2.
///
/// ```rust,no_run
/// use strand_core::{handler_fn, ResponseWriterExt};
/// use strand_middleware::stages::default_chain;
/// use strand_server::{Server, ServerConfig};
///
/// # async fn run() -> Result<(), strand_server::ServerError> {
/// let app = default_chain().then(handler_fn(|_ctx, w, _req| {
///     Box::pin(async move { w.write_all(b"hello") })
/// }));
///
/// let config = ServerConfig::builder().http_addr("127.0.0.1:3000").build();
/// Server::from_boxed(config, app).run().await
/// # }
/// ```
pub struct Server {
    config: ServerConfig,
    handler: BoxedHandler,
}

impl Server {
    /// Creates a server for `handler`.
    pub fn new<H: Handler>(config: ServerConfig, handler: H) -> Self {
        Self::from_boxed(config, Arc::new(handler))
    }

    /// Creates a server for an already-boxed handler.
    #[must_use]
    pub fn from_boxed(config: ServerConfig, handler: BoxedHandler) -> Self {
        Self { config, handler }
    }

    /// Returns the server configuration.
    #[must_use]
    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    /// Runs until SIGINT or SIGTERM, then shuts down gracefully.
    ///
    /// # Errors
    ///
    /// Fails if the configured address is invalid or cannot be bound.
    pub async fn run(self) -> Result<(), ServerError> {
        self.run_with_shutdown(shutdown_signal()).await
    }

    /// Runs until `shutdown` resolves, then shuts down gracefully.
    ///
    /// # Errors
    ///
    /// Fails if the configured address is invalid or cannot be bound.
    pub async fn run_with_shutdown<F>(self, shutdown: F) -> Result<(), ServerError>
    where
        F: Future<Output = ()>,
    {
        let addr = self.config.socket_addr()?;
        let listener = TcpListener::bind(addr)
            .await
            .map_err(|source| ServerError::Bind { addr, source })?;
        self.serve(listener, shutdown).await
    }

    /// Serves connections from an already-bound listener.
    ///
    /// # Errors
    ///
    /// Fails if the listener's local address cannot be read.
    pub async fn serve<F>(self, listener: TcpListener, shutdown: F) -> Result<(), ServerError>
    where
        F: Future<Output = ()>,
    {
        info!(addr = %listener.local_addr()?, "strand listening");

        let builder = ConnBuilder::new(TokioExecutor::new());
        let graceful = GracefulShutdown::new();
        tokio::pin!(shutdown);

        loop {
            tokio::select! {
                biased;

                () = &mut shutdown => {
                    info!("shutdown signal received, draining connections");
                    break;
                }

                accepted = listener.accept() => {
                    let (stream, peer) = match accepted {
                        Ok(accepted) => accepted,
                        Err(err) => {
                            error!(error = %err, "accept error");
                            continue;
                        }
                    };
                    self.spawn_connection(&builder, &graceful, stream, peer);
                }
            }
        }

        drop(listener);
        tokio::select! {
            () = graceful.shutdown() => info!("all connections closed"),
            () = tokio::time::sleep(self.config.shutdown_timeout()) => {
                warn!(timeout = ?self.config.shutdown_timeout(), "shutdown timeout reached, dropping open connections");
            }
        }

        info!("strand stopped");
        Ok(())
    }

    fn spawn_connection(
        &self,
        builder: &ConnBuilder<TokioExecutor>,
        graceful: &GracefulShutdown,
        stream: tokio::net::TcpStream,
        peer: SocketAddr,
    ) {
        let service = HyperAdapter::from_boxed(Arc::clone(&self.handler)).with_remote_addr(peer);
        let connection = builder
            .serve_connection_with_upgrades(TokioIo::new(stream), service)
            .into_owned();
        let connection = graceful.watch(connection);

        tokio::spawn(async move {
            if let Err(err) = connection.await {
                debug!(%peer, error = %err, "connection error");
            }
        });
    }
}

impl std::fmt::Debug for Server {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Server")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}
