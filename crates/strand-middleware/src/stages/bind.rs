//! Request body binding.
//!
//! [`Bind`] decodes the request body into a model type and binds the value
//! to the context, where [`bound`] reads it back. A body that fails to
//! decode stops the chain with [`Error::Decode`]; nothing is written.

use std::fmt;
use std::future;
use std::marker::PhantomData;

use serde::de::DeserializeOwned;
use strand_core::{BoxFuture, Context, ContextKey, Error, Request, ResponseWriter, Result};

use crate::middleware::{Middleware, Next};

/// Body encoding accepted by a [`Bind`] unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    /// `application/json`
    Json,
    /// `application/x-www-form-urlencoded`
    Form,
}

impl Format {
    fn decode<T: DeserializeOwned>(self, body: &[u8]) -> Result<T> {
        match self {
            Self::Json => serde_json::from_slice(body).map_err(Error::decode),
            Self::Form => serde_urlencoded::from_bytes(body).map_err(Error::decode),
        }
    }
}

struct Bound<T>(PhantomData<T>);

impl<T: Send + Sync + 'static> ContextKey for Bound<T> {
    type Value = T;
}

/// Returns the model bound by an upstream [`Bind<T>`].
#[must_use]
pub fn bound<T: Send + Sync + 'static>(ctx: &Context) -> Option<&T> {
    ctx.get::<Bound<T>>()
}

/// Decodes the request body into `T`.
///
/// # Example
///
/// ```
/// use serde::Deserialize;
/// use strand_middleware::stages::Bind;
///
/// #[derive(Deserialize)]
/// struct Login {
///     user: String,
///     password: String,
/// }
///
/// let bind = Bind::<Login>::form();
/// # let _ = bind;
/// ```
pub struct Bind<T> {
    format: Format,
    model: PhantomData<fn() -> T>,
}

impl<T> Bind<T> {
    /// Decodes JSON bodies.
    #[must_use]
    pub const fn json() -> Self {
        Self::new(Format::Json)
    }

    /// Decodes URL-encoded form bodies.
    #[must_use]
    pub const fn form() -> Self {
        Self::new(Format::Form)
    }

    /// Decodes bodies in `format`.
    #[must_use]
    pub const fn new(format: Format) -> Self {
        Self {
            format,
            model: PhantomData,
        }
    }

    /// The accepted body encoding.
    #[must_use]
    pub const fn format(&self) -> Format {
        self.format
    }
}

impl<T> Clone for Bind<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for Bind<T> {}

impl<T> fmt::Debug for Bind<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Bind")
            .field("model", &std::any::type_name::<T>())
            .field("format", &self.format)
            .finish()
    }
}

impl<T> Middleware for Bind<T>
where
    T: DeserializeOwned + Send + Sync + 'static,
{
    fn name(&self) -> &'static str {
        "bind"
    }

    fn process<'a>(
        &'a self,
        ctx: Context,
        writer: &'a mut dyn ResponseWriter,
        request: Request,
        next: Next<'a>,
    ) -> BoxFuture<'a, Result<()>> {
        match self.format.decode::<T>(request.body()) {
            Ok(model) => next.run(ctx.with::<Bound<T>>(model), writer, request),
            Err(error) => {
                tracing::debug!(format = ?self.format, %error, "body did not decode");
                Box::pin(future::ready(Err(error)))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chain::Chain;
    use bytes::Bytes;
    use parking_lot::Mutex;
    use serde::Deserialize;
    use std::sync::Arc;
    use strand_core::{handler_fn, BufferedResponse, Handler};

    #[derive(Debug, Clone, PartialEq, Deserialize)]
    struct Login {
        user: String,
        password: String,
    }

    fn request(body: &'static str) -> Request {
        http::Request::builder()
            .method("POST")
            .uri("/login")
            .body(Bytes::from_static(body.as_bytes()))
            .unwrap()
    }

    async fn bind_with(bind: Bind<Login>, body: &'static str) -> (Result<()>, Option<Login>) {
        let seen: Arc<Mutex<Option<Login>>> = Arc::default();
        let sink = Arc::clone(&seen);
        let handler = Chain::new().append(bind).then(handler_fn(move |ctx, _w, _req| {
            *sink.lock() = bound::<Login>(&ctx).cloned();
            Box::pin(async { Ok(()) })
        }));

        let outcome = handler
            .call(Context::new(), &mut BufferedResponse::new(), request(body))
            .await;
        let login = seen.lock().take();
        (outcome, login)
    }

    #[tokio::test]
    async fn test_bind_json() {
        let (outcome, login) =
            bind_with(Bind::json(), r#"{"user":"alice","password":"pw"}"#).await;
        outcome.unwrap();
        assert_eq!(login.unwrap().user, "alice");
    }

    #[tokio::test]
    async fn test_bind_form() {
        let (outcome, login) = bind_with(Bind::form(), "user=bob&password=p%20w").await;
        outcome.unwrap();
        assert_eq!(
            login,
            Some(Login {
                user: "bob".into(),
                password: "p w".into()
            })
        );
    }

    #[tokio::test]
    async fn test_bad_body_stops_chain() {
        let (outcome, login) = bind_with(Bind::json(), "{not json").await;
        assert!(matches!(outcome, Err(Error::Decode(_))));
        assert!(login.is_none());
    }

    #[test]
    fn test_bound_without_unit() {
        assert!(bound::<Login>(&Context::new()).is_none());
    }
}
