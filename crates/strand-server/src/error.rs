//! Server error types.

use thiserror::Error;

/// Errors that stop a server from starting.
#[derive(Debug, Error)]
pub enum ServerError {
    /// The configured address does not parse.
    #[error("invalid address '{addr}': {source}")]
    InvalidAddr {
        /// The address as configured
        addr: String,
        /// Parse failure
        #[source]
        source: std::net::AddrParseError,
    },

    /// The listener could not be bound.
    #[error("failed to bind to {addr}: {source}")]
    Bind {
        /// The address the bind was attempted on
        addr: std::net::SocketAddr,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// I/O error on an already-bound listener.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}
