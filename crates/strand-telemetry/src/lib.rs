//! # Strand Telemetry
//!
//! Logging initialisation for strand services, built on
//! `tracing-subscriber`.
//!
//! ```rust,ignore
//! use strand_telemetry::{init_logging, LogConfig, LogFormat};
//!
//! let config = LogConfig {
//!     format: LogFormat::Compact,
//!     ..LogConfig::default()
//! };
//! init_logging(&config).expect("logging");
//! ```

#![doc(html_root_url = "https://docs.rs/strand-telemetry/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod error;
pub mod logging;

pub use error::TelemetryError;
pub use logging::{create_env_filter, init_logging, LogConfig, LogFormat};

/// Result type for telemetry operations.
pub type TelemetryResult<T> = Result<T, TelemetryError>;
