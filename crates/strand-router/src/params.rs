//! Path parameters captured by a route match.

use smallvec::SmallVec;
use strand_core::{Context, ContextKey};

/// Parameters stored inline before spilling to the heap.
const INLINE_PARAMS: usize = 4;

/// Named path parameters, in the order they appear in the route pattern.
///
/// # Example
///
/// ```rust
/// use strand_router::Params;
///
/// let mut params = Params::new();
/// params.push("user", "42");
///
/// assert_eq!(params.get("user"), Some("42"));
/// assert_eq!(params.get("unknown"), None);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Params {
    inner: SmallVec<[(String, String); INLINE_PARAMS]>,
}

impl Params {
    /// Creates an empty parameter set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a parameter.
    pub fn push(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.inner.push((name.into(), value.into()));
    }

    /// Returns the value for a parameter by name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&str> {
        self.inner
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }

    /// Returns true if there are no parameters.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    /// Returns the number of parameters.
    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.len()
    }

    /// Returns an iterator over `(name, value)` pairs.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.inner.iter().map(|(n, v)| (n.as_str(), v.as_str()))
    }
}

impl<'k, 'v> FromIterator<(&'k str, &'v str)> for Params {
    fn from_iter<I: IntoIterator<Item = (&'k str, &'v str)>>(iter: I) -> Self {
        Self {
            inner: iter
                .into_iter()
                .map(|(n, v)| (n.to_string(), v.to_string()))
                .collect(),
        }
    }
}

pub(crate) struct ParamsKey;

impl ContextKey for ParamsKey {
    type Value = Params;
}

/// Returns the parameters of the matched route, if the request was routed.
#[must_use]
pub fn params(ctx: &Context) -> Option<&Params> {
    ctx.get::<ParamsKey>()
}

/// Returns one route parameter, or `""` if it is absent.
#[must_use]
pub fn param<'c>(ctx: &'c Context, name: &str) -> &'c str {
    params(ctx).and_then(|p| p.get(name)).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_push_and_get() {
        let mut params = Params::new();
        assert!(params.is_empty());
        params.push("id", "7");
        params.push("slug", "hello");

        assert_eq!(params.len(), 2);
        assert_eq!(params.get("slug"), Some("hello"));
        assert_eq!(
            params.iter().collect::<Vec<_>>(),
            [("id", "7"), ("slug", "hello")]
        );
    }

    #[test]
    fn test_from_pairs() {
        let params: Params = [("a", "1"), ("b", "2")].into_iter().collect();
        assert_eq!(params.get("b"), Some("2"));
    }

    #[test]
    fn test_context_accessors() {
        let ctx = Context::new();
        assert!(params(&ctx).is_none());
        assert_eq!(param(&ctx, "id"), "");

        let ctx = ctx.with::<ParamsKey>([("id", "9")].into_iter().collect());
        assert_eq!(param(&ctx, "id"), "9");
        assert_eq!(param(&ctx, "other"), "");
    }
}
