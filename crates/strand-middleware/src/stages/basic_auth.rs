//! HTTP Basic authentication.
//!
//! [`BasicAuth`] checks the `Authorization: Basic ...` credentials against a
//! verifier. On success the username is bound to the context and read back
//! with [`user`]. On failure it writes a `401 Unauthorized` response with a
//! `WWW-Authenticate` challenge and returns [`Error::Unauthorized`] without
//! calling the downstream stage.

use std::fmt;
use std::future;
use std::sync::Arc;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use http::header::{HeaderValue, AUTHORIZATION, WWW_AUTHENTICATE};
use http::StatusCode;
use strand_core::{BoxFuture, Context, ContextKey, Error, Request, ResponseWriter, Result};

use crate::middleware::{Middleware, Next};

/// Credential check: `(username, password) -> accepted`.
pub type Verifier = Arc<dyn Fn(&str, &str) -> bool + Send + Sync>;

struct UserKey;

impl ContextKey for UserKey {
    type Value = String;
}

/// Returns the authenticated username, or `""` if no [`BasicAuth`] accepted the request.
#[must_use]
pub fn user(ctx: &Context) -> &str {
    ctx.get::<UserKey>().map_or("", String::as_str)
}

/// Extracts `(username, password)` from a Basic `Authorization` header.
///
/// The scheme name is matched case-insensitively. Returns `None` for a
/// missing header, another scheme, bad base64, non-UTF-8 credentials, or a
/// decoded value without a `:` separator.
#[must_use]
pub fn credentials(request: &Request) -> Option<(String, String)> {
    let value = request.headers().get(AUTHORIZATION)?.to_str().ok()?;
    let (scheme, encoded) = value.split_once(' ')?;
    if !scheme.eq_ignore_ascii_case("basic") {
        return None;
    }

    let decoded = STANDARD.decode(encoded.trim()).ok()?;
    let decoded = String::from_utf8(decoded).ok()?;
    let (username, password) = decoded.split_once(':')?;
    Some((username.to_string(), password.to_string()))
}

/// Requires valid Basic credentials.
///
/// # Example
///
/// ```
/// use strand_middleware::stages::BasicAuth;
///
/// let auth = BasicAuth::new("admin area", |user, pass| user == "root" && pass == "hunter2");
/// assert_eq!(auth.challenge(), "Basic realm=admin%20area");
/// ```
#[derive(Clone)]
pub struct BasicAuth {
    realm: String,
    challenge: HeaderValue,
    verify: Verifier,
}

impl BasicAuth {
    /// Creates the unit for `realm`, checking credentials with `verify`.
    pub fn new<F>(realm: impl Into<String>, verify: F) -> Self
    where
        F: Fn(&str, &str) -> bool + Send + Sync + 'static,
    {
        let realm = realm.into();
        let challenge = format!("Basic realm={}", urlencoding::encode(&realm));
        let challenge =
            HeaderValue::from_str(&challenge).unwrap_or_else(|_| HeaderValue::from_static("Basic"));
        Self {
            realm,
            challenge,
            verify: Arc::new(verify),
        }
    }

    /// The protection realm.
    #[must_use]
    pub fn realm(&self) -> &str {
        &self.realm
    }

    /// The `WWW-Authenticate` value sent with rejections.
    #[must_use]
    pub fn challenge(&self) -> &str {
        self.challenge.to_str().unwrap_or("Basic")
    }
}

impl fmt::Debug for BasicAuth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BasicAuth")
            .field("realm", &self.realm)
            .finish_non_exhaustive()
    }
}

impl Middleware for BasicAuth {
    fn name(&self) -> &'static str {
        "basic_auth"
    }

    fn process<'a>(
        &'a self,
        ctx: Context,
        writer: &'a mut dyn ResponseWriter,
        request: Request,
        next: Next<'a>,
    ) -> BoxFuture<'a, Result<()>> {
        match credentials(&request) {
            Some((username, password)) if (self.verify)(&username, &password) => {
                next.run(ctx.with::<UserKey>(username), writer, request)
            }
            _ => {
                tracing::debug!(realm = %self.realm, uri = %request.uri(), "rejected credentials");
                writer
                    .headers_mut()
                    .insert(WWW_AUTHENTICATE, self.challenge.clone());
                writer.write_header(StatusCode::UNAUTHORIZED);
                Box::pin(future::ready(Err(Error::Unauthorized)))
            }
        }
    }
}
