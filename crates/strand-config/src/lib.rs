//! # Strand Config
//!
//! Typed configuration for strand services and their built-in units,
//! loaded in layers (defaults, then a TOML or JSON file, then environment)
//! with unknown fields rejected.
//!
//! ```toml
//! [server]
//! http_addr = "0.0.0.0:8080"
//! shutdown_timeout_secs = 30
//!
//! [logging]
//! level = "info"
//! format = "json"
//!
//! [basic_auth]
//! realm = "Restricted"
//!
//! [logger]
//! backtraces = true
//! ```
//!
//! Sections turn into what they configure:
//!
//! ```
//! use strand_config::StrandConfig;
//! use strand_middleware::Chain;
//!
//! let config = StrandConfig::production();
//! let chain = Chain::new()
//!     .append(config.logger.unit())
//!     .append(config.basic_auth.unit(|user, pass| user == "ops" && pass == "s3cret"));
//! assert_eq!(chain.names(), ["logger", "basic_auth"]);
//! ```

#![doc(html_root_url = "https://docs.rs/strand-config/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod config;
mod error;
mod loader;
mod schema;

pub use config::StrandConfig;
pub use error::ConfigError;
pub use loader::ConfigLoader;
pub use schema::{BasicAuthSection, LoggerSection, LoggingSection, ServerSection};
