//! Deferred response rendering.
//!
//! Downstream handlers hand a status and a data value to [`yield_data`]
//! instead of writing a body. Once the downstream stage succeeds, [`Render`]
//! serializes the value with its serializer and writes it along with its
//! content type. If the downstream stage fails, nothing is rendered and the
//! error propagates.

use std::fmt;
use std::sync::Arc;

use http::header::{HeaderValue, CONTENT_TYPE};
use http::StatusCode;
use parking_lot::Mutex;
use serde::Serialize;
use serde_json::Value;
use strand_core::{
    render, BoxFuture, Context, ContextKey, Error, Request, ResponseWriter, ResponseWriterExt,
    Result,
};

use crate::middleware::{Middleware, Next};

/// Turns the yielded value into body bytes.
pub type Serializer = Arc<dyn Fn(&Value) -> Result<Vec<u8>> + Send + Sync>;

#[derive(Debug, Default)]
struct Yielded {
    status: Option<StatusCode>,
    data: Value,
}

struct RenderKey;

impl ContextKey for RenderKey {
    type Value = Arc<Mutex<Yielded>>;
}

/// Hands `data` to the enclosing [`Render`] unit, to be written with `status`.
///
/// A later call replaces an earlier one.
///
/// # Errors
///
/// Fails if `data` cannot be represented as JSON, or if no [`Render`] unit
/// encloses the caller.
pub fn yield_data<T: Serialize + ?Sized>(ctx: &Context, status: StatusCode, data: &T) -> Result<()> {
    let slot = ctx
        .get::<RenderKey>()
        .ok_or_else(|| Error::Handler(anyhow::anyhow!("no render unit encloses this handler")))?;
    let data = serde_json::to_value(data).map_err(|e| Error::Handler(e.into()))?;

    let mut slot = slot.lock();
    slot.status = Some(status);
    slot.data = data;
    Ok(())
}

/// Serializes yielded data into the response.
///
/// # Example
///
/// ```
/// use strand_middleware::stages::Render;
///
/// let json = Render::json();
/// assert_eq!(json.content_type(), "application/json");
/// ```
#[derive(Clone)]
pub struct Render {
    content_type: HeaderValue,
    serialize: Serializer,
}

impl Render {
    /// Renders with a custom serializer and content type.
    pub fn with_serializer<F>(content_type: &'static str, serialize: F) -> Self
    where
        F: Fn(&Value) -> Result<Vec<u8>> + Send + Sync + 'static,
    {
        Self {
            content_type: HeaderValue::from_static(content_type),
            serialize: Arc::new(serialize),
        }
    }

    /// Renders compact JSON.
    #[must_use]
    pub fn json() -> Self {
        Self::with_serializer(render::JSON, |value| {
            serde_json::to_vec(value).map_err(|e| Error::Handler(e.into()))
        })
    }

    /// Renders indented JSON.
    #[must_use]
    pub fn pretty_json() -> Self {
        Self::with_serializer(render::JSON, |value| {
            serde_json::to_vec_pretty(value).map_err(|e| Error::Handler(e.into()))
        })
    }

    /// Renders string values as plain text and anything else as its JSON text.
    #[must_use]
    pub fn text() -> Self {
        Self::with_serializer(render::TEXT, |value| {
            Ok(match value {
                Value::String(text) => text.clone().into_bytes(),
                Value::Null => Vec::new(),
                other => other.to_string().into_bytes(),
            })
        })
    }

    /// The content type written with rendered bodies.
    #[must_use]
    pub fn content_type(&self) -> &str {
        self.content_type.to_str().unwrap_or_default()
    }
}

impl fmt::Debug for Render {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Render")
            .field("content_type", &self.content_type)
            .finish_non_exhaustive()
    }
}

impl Middleware for Render {
    fn name(&self) -> &'static str {
        "render"
    }

    fn process<'a>(
        &'a self,
        ctx: Context,
        writer: &'a mut dyn ResponseWriter,
        request: Request,
        next: Next<'a>,
    ) -> BoxFuture<'a, Result<()>> {
        Box::pin(async move {
            let slot = Arc::new(Mutex::new(Yielded::default()));
            next.run(ctx.with::<RenderKey>(Arc::clone(&slot)), writer, request)
                .await?;

            let yielded = std::mem::take(&mut *slot.lock());
            let body = (self.serialize)(&yielded.data)?;

            writer
                .headers_mut()
                .insert(CONTENT_TYPE, self.content_type.clone());
            if let Some(status) = yielded.status {
                writer.write_header(status);
            }
            writer.write_all(&body)
        })
    }
}
