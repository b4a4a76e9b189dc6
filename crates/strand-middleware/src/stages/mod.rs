//! Built-in middleware units.
//!
//! | Unit            | Purpose                                            |
//! |-----------------|----------------------------------------------------|
//! | [`RealIp`]      | Resolve the client address from forwarding headers |
//! | [`Logger`]      | One access log record per request                  |
//! | [`Recover`]     | Turn downstream panics into errors                 |
//! | [`LocalStore`]  | Fresh key/value store per request                  |
//! | [`SharedStore`] | One key/value store shared by all requests         |
//! | [`BasicAuth`]   | HTTP Basic authentication                          |
//! | [`Bind`]        | Decode the request body into a model               |
//! | [`Render`]      | Serialize data yielded by the handler              |

pub mod basic_auth;
pub mod bind;
pub mod local_store;
pub mod logger;
pub mod real_ip;
pub mod recover;
pub mod render;

pub use basic_auth::{user, BasicAuth};
pub use bind::{bound, Bind};
pub use local_store::{local_store, shared_store, LocalStore, SharedStore};
pub use logger::{Logger, StatusRecorder};
pub use real_ip::{real_ip, RealIp};
pub use recover::Recover;
pub use render::{yield_data, Render};

use crate::chain::Chain;

/// The standard chain: [`RealIp`], [`Logger`], [`Recover`], [`LocalStore`].
///
/// Address resolution runs first so the logger sees the client address, and
/// recovery sits inside the logger so panics are logged as failed requests.
#[must_use]
pub fn default_chain() -> Chain {
    Chain::new()
        .append(RealIp)
        .append(Logger::new())
        .append(Recover::new())
        .append(LocalStore)
}
