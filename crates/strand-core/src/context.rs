//! Request-scoped value propagation.
//!
//! A [`Context`] is an immutable, persistent list of typed bindings. Adding a
//! binding never mutates the context it was derived from: it allocates a new
//! head node that points at the previous one. A stage that hands a derived
//! context onward therefore cannot leak values into sibling branches, and a
//! stage that is re-entered sees exactly the bindings its caller gave it.
//!
//! Keys are zero-sized marker types implementing [`ContextKey`]. Each
//! cross-cutting concern declares its own key, so call sites get compiler
//! checked access to the value type instead of an unchecked cast.

use std::any::{Any, TypeId};
use std::fmt;
use std::sync::Arc;

use tokio_util::sync::CancellationToken;

/// A typed key for values stored in a [`Context`].
///
/// # Example
///
/// ```
/// use strand_core::{Context, ContextKey};
///
/// struct TenantKey;
///
/// impl ContextKey for TenantKey {
///     type Value = String;
/// }
///
/// let ctx = Context::new().with::<TenantKey>("acme".to_string());
/// assert_eq!(ctx.get::<TenantKey>().map(String::as_str), Some("acme"));
/// ```
pub trait ContextKey: 'static {
    /// The type of value bound to this key.
    type Value: Send + Sync + 'static;
}

/// One binding in the persistent list.
struct Binding {
    key: TypeId,
    key_name: &'static str,
    value: Box<dyn Any + Send + Sync>,
    parent: Option<Arc<Binding>>,
}

/// Request-scoped store threaded through every stage of a chain.
///
/// Cloning a context is one reference-count increment; the bindings
/// themselves are shared and never modified.
#[derive(Clone, Default)]
pub struct Context {
    head: Option<Arc<Binding>>,
    cancellation: Option<CancellationToken>,
}

impl Context {
    /// Creates an empty context.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a new context carrying an additional binding for `K`.
    ///
    /// `self` is left untouched. A later binding for the same key shadows
    /// earlier ones in the returned context only.
    #[must_use]
    pub fn with<K: ContextKey>(&self, value: K::Value) -> Self {
        Self {
            head: Some(Arc::new(Binding {
                key: TypeId::of::<K>(),
                key_name: std::any::type_name::<K>(),
                value: Box::new(value),
                parent: self.head.clone(),
            })),
            cancellation: self.cancellation.clone(),
        }
    }

    /// Looks up the nearest binding for `K`.
    ///
    /// Returns `None` when the key was never bound on this lineage, or when
    /// the stored value is not a `K::Value`. Absence is a normal outcome.
    #[must_use]
    pub fn get<K: ContextKey>(&self) -> Option<&K::Value> {
        let key = TypeId::of::<K>();
        self.bindings()
            .find(|binding| binding.key == key)
            .and_then(|binding| binding.value.downcast_ref::<K::Value>())
    }

    /// Returns true if `K` is bound on this lineage.
    #[must_use]
    pub fn contains<K: ContextKey>(&self) -> bool {
        self.get::<K>().is_some()
    }

    /// Number of bindings visible from this context, shadowed ones included.
    #[must_use]
    pub fn len(&self) -> usize {
        self.bindings().count()
    }

    /// Returns true if no bindings are visible.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.head.is_none()
    }

    /// Returns a new context observing the given cancellation token.
    ///
    /// The chain never enforces cancellation; units may check it.
    #[must_use]
    pub fn with_cancellation(&self, token: CancellationToken) -> Self {
        Self {
            head: self.head.clone(),
            cancellation: Some(token),
        }
    }

    /// Returns the cancellation token, if the host attached one.
    #[must_use]
    pub fn cancellation(&self) -> Option<&CancellationToken> {
        self.cancellation.as_ref()
    }

    /// Returns true if the host cancelled this request.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.cancellation
            .as_ref()
            .is_some_and(CancellationToken::is_cancelled)
    }

    fn bindings(&self) -> impl Iterator<Item = &Binding> {
        std::iter::successors(self.head.as_deref(), |binding| binding.parent.as_deref())
    }
}

impl fmt::Debug for Context {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Context")
            .field(
                "keys",
                &self.bindings().map(|b| b.key_name).collect::<Vec<_>>(),
            )
            .field("cancelled", &self.is_cancelled())
            .finish()
    }
}
