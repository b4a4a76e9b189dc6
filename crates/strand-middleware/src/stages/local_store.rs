//! Store injection.
//!
//! [`LocalStore`] gives every request a fresh [`Store`], read back with
//! [`local_store`]. [`SharedStore`] binds one store for all requests, read
//! back with [`shared_store`].

use std::sync::Arc;

use strand_core::store::{self, Global, Local};
use strand_core::{BoxFuture, Context, Request, ResponseWriter, Result, Store};

use crate::middleware::{Middleware, Next};

/// Returns the per-request store bound by [`LocalStore`].
#[must_use]
pub fn local_store(ctx: &Context) -> Option<Arc<Store>> {
    store::local(ctx)
}

/// Returns the store bound by [`SharedStore`].
#[must_use]
pub fn shared_store(ctx: &Context) -> Option<Arc<Store>> {
    store::global(ctx)
}

/// Binds a new, empty store to each request.
#[derive(Debug, Clone, Copy, Default)]
pub struct LocalStore;

impl Middleware for LocalStore {
    fn name(&self) -> &'static str {
        "local_store"
    }

    fn process<'a>(
        &'a self,
        ctx: Context,
        writer: &'a mut dyn ResponseWriter,
        request: Request,
        next: Next<'a>,
    ) -> BoxFuture<'a, Result<()>> {
        next.run(ctx.with::<Local>(Arc::new(Store::new())), writer, request)
    }
}

/// Binds the same store to every request.
#[derive(Debug, Clone, Default)]
pub struct SharedStore {
    store: Arc<Store>,
}

impl SharedStore {
    /// Shares `store` with every request.
    #[must_use]
    pub const fn new(store: Arc<Store>) -> Self {
        Self { store }
    }

    /// The shared store.
    #[must_use]
    pub const fn store(&self) -> &Arc<Store> {
        &self.store
    }
}

impl Middleware for SharedStore {
    fn name(&self) -> &'static str {
        "shared_store"
    }

    fn process<'a>(
        &'a self,
        ctx: Context,
        writer: &'a mut dyn ResponseWriter,
        request: Request,
        next: Next<'a>,
    ) -> BoxFuture<'a, Result<()>> {
        next.run(ctx.with::<Global>(Arc::clone(&self.store)), writer, request)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chain::Chain;
    use bytes::Bytes;
    use parking_lot::Mutex;
    use strand_core::{handler_fn, BufferedResponse, Handler};

    fn request() -> Request {
        http::Request::builder().uri("/").body(Bytes::new()).unwrap()
    }

    #[tokio::test]
    async fn test_local_store_is_per_request() {
        let seen: Arc<Mutex<Vec<Arc<Store>>>> = Arc::default();
        let sink = Arc::clone(&seen);
        let handler = Chain::new().append(LocalStore).then(handler_fn(move |ctx, _w, _req| {
            let store = local_store(&ctx);
            if let Some(store) = &store {
                store.set("visited", true);
            }
            sink.lock().extend(store);
            Box::pin(async { Ok(()) })
        }));

        for _ in 0..2 {
            handler
                .call(Context::new(), &mut BufferedResponse::new(), request())
                .await
                .unwrap();
        }

        let seen = seen.lock();
        assert_eq!(seen.len(), 2);
        assert!(!Arc::ptr_eq(&seen[0], &seen[1]));
        assert!(seen.iter().all(|s| s.get::<bool>("visited").is_some()));
    }

    #[tokio::test]
    async fn test_shared_store_is_common() {
        let shared = Arc::new(Store::new());
        let handler = Chain::new()
            .append(SharedStore::new(Arc::clone(&shared)))
            .then(handler_fn(|ctx, _w, _req| {
                if let Some(store) = shared_store(&ctx) {
                    store.update(|map| {
                        let hits = map
                            .get("hits")
                            .and_then(|v| v.downcast_ref::<u32>())
                            .copied()
                            .unwrap_or(0);
                        map.insert("hits".into(), Arc::new(hits + 1));
                    });
                }
                Box::pin(async { Ok(()) })
            }));

        for _ in 0..3 {
            handler
                .call(Context::new(), &mut BufferedResponse::new(), request())
                .await
                .unwrap();
        }
        assert_eq!(*shared.get::<u32>("hits").unwrap(), 3);
    }
}
