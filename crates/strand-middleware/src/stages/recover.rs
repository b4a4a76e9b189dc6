//! Panic recovery.
//!
//! [`Recover`] runs the downstream stage and converts a panic anywhere
//! below it into [`Error::Panic`]. The panic payload becomes the error value
//! and the backtrace captured at the panic site is attached to it.
//!
//! Only panics pass through the optional handler. Ordinary errors returned
//! by downstream stages propagate unchanged.

use std::any::Any;
use std::backtrace::Backtrace;
use std::cell::RefCell;
use std::fmt;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::{Arc, Once};

use futures_util::future::poll_fn;
use futures_util::FutureExt;
use strand_core::{
    BoxFuture, Context, Error, PanicError, Request, RequestHead, ResponseWriter, Result,
};

use crate::middleware::{Middleware, Next};

/// Callback invoked after a panic has been caught, before the error is returned.
pub type PanicHandler = Arc<dyn Fn(&mut dyn ResponseWriter, &RequestHead, &PanicError) + Send + Sync>;

thread_local! {
    static LAST_BACKTRACE: RefCell<Option<String>> = const { RefCell::new(None) };
}

static HOOK: Once = Once::new();

/// Chains a panic hook that records the backtrace of the panicking thread.
///
/// The previous hook still runs afterwards.
fn install_backtrace_hook() {
    HOOK.call_once(|| {
        let previous = std::panic::take_hook();
        std::panic::set_hook(Box::new(move |info| {
            let backtrace = Backtrace::force_capture().to_string();
            LAST_BACKTRACE.with(|slot| *slot.borrow_mut() = Some(backtrace));
            previous(info);
        }));
    });
}

fn take_backtrace() -> Option<String> {
    LAST_BACKTRACE.with(|slot| slot.borrow_mut().take())
}

/// Renders a panic payload the way the panic message was written.
fn payload_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&'static str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "Box<dyn Any>".to_string()
    }
}

/// Converts downstream panics into [`Error::Panic`].
///
/// # Example
///
/// ```
/// use http::StatusCode;
/// use strand_middleware::stages::Recover;
///
/// let recover = Recover::with_handler(|w, _head, _fault| {
///     w.write_header(StatusCode::INTERNAL_SERVER_ERROR);
/// });
/// # let _ = recover;
/// ```
#[derive(Clone, Default)]
pub struct Recover {
    on_panic: Option<PanicHandler>,
}

impl Recover {
    /// Creates a unit that only converts panics into errors.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a unit that also calls `handler` for each caught panic.
    ///
    /// The handler may write a response; the panic error is still returned.
    #[must_use]
    pub fn with_handler<F>(handler: F) -> Self
    where
        F: Fn(&mut dyn ResponseWriter, &RequestHead, &PanicError) + Send + Sync + 'static,
    {
        Self {
            on_panic: Some(Arc::new(handler)),
        }
    }
}

impl fmt::Debug for Recover {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Recover")
            .field("has_handler", &self.on_panic.is_some())
            .finish()
    }
}

impl Middleware for Recover {
    fn name(&self) -> &'static str {
        "recover"
    }

    fn process<'a>(
        &'a self,
        ctx: Context,
        writer: &'a mut dyn ResponseWriter,
        request: Request,
        next: Next<'a>,
    ) -> BoxFuture<'a, Result<()>> {
        Box::pin(async move {
            install_backtrace_hook();
            let head = self
                .on_panic
                .is_some()
                .then(|| RequestHead::from_request(&request));

            // Cleared before every poll: the slot only holds traces raised
            // while polling downstream.
            let mut downstream = next.run(ctx, &mut *writer, request);
            let guarded = poll_fn(move |cx| {
                take_backtrace();
                downstream.as_mut().poll(cx)
            });
            let caught = AssertUnwindSafe(guarded).catch_unwind().await;

            let payload = match caught {
                Ok(outcome) => return outcome,
                Err(payload) => payload,
            };

            let fault = PanicError::new(payload_message(payload.as_ref()), take_backtrace());
            tracing::debug!(error = %fault, "recovered from panic");

            if let (Some(handler), Some(head)) = (&self.on_panic, &head) {
                handler(writer, head, &fault);
            }
            Err(Error::Panic(fault))
        })
    }
}
