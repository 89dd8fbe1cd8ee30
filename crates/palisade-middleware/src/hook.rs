//! Post-handler hook.
//!
//! A hook runs once after the user function succeeded, for side effects
//! only. Three conventions are accepted and normalized into one
//! `Result<(), InvocationError>` by [`PostHandler::run`]:
//!
//! - [`PostHandler::callback`]: the hook receives a [`Completion`] and
//!   reports through it, possibly from another task
//! - [`PostHandler::from_async`]: the hook returns a future
//! - [`PostHandler::from_sync`]: the hook returns a result directly
//!
//! Panics in any of them are caught and reported as user errors.
//!
//! # Example
//!
//! ```
//! use palisade_middleware::PostHandler;
//!
//! let flush = PostHandler::from_async(|| async {
//!     // flush buffered metrics, close connections...
//!     Ok::<_, std::io::Error>(())
//! });
//!
//! let audit = PostHandler::callback(|done| {
//!     std::thread::spawn(move || done.done());
//! });
//! # let _ = (flush, audit);
//! ```

use crate::invocation::into_user_error;
use crate::plugin::BoxFuture;
use futures_util::FutureExt;
use palisade_core::{BoxError, ErrorKind, InvocationError};
use std::fmt;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use tokio::sync::oneshot;

type CallbackHook = Arc<dyn Fn(Completion) + Send + Sync + 'static>;
type AsyncHook = Arc<dyn Fn() -> BoxFuture<'static, Result<(), BoxError>> + Send + Sync + 'static>;
type SyncHook = Arc<dyn Fn() -> Result<(), BoxError> + Send + Sync + 'static>;

/// Completion handle passed to callback-style hooks.
///
/// Consumed by the first report. Dropping it without reporting fails the
/// hook.
#[derive(Debug)]
pub struct Completion {
    tx: oneshot::Sender<Result<(), BoxError>>,
}

impl Completion {
    fn channel() -> (Self, oneshot::Receiver<Result<(), BoxError>>) {
        let (tx, rx) = oneshot::channel();
        (Self { tx }, rx)
    }

    /// Reports success.
    pub fn done(self) {
        self.finish(Ok(()));
    }

    /// Reports a failure.
    pub fn fail(self, error: impl Into<BoxError>) {
        self.finish(Err(error.into()));
    }

    /// Reports a result.
    pub fn finish(self, result: Result<(), BoxError>) {
        // The receiver is gone only if the invocation was dropped.
        let _ = self.tx.send(result);
    }
}

/// A post-handler hook.
#[derive(Clone)]
pub enum PostHandler {
    /// Reports through a [`Completion`].
    Callback(CallbackHook),
    /// Returns a future.
    Async(AsyncHook),
    /// Returns a result.
    Sync(SyncHook),
}

impl PostHandler {
    /// Creates a callback-style hook.
    pub fn callback<F>(hook: F) -> Self
    where
        F: Fn(Completion) + Send + Sync + 'static,
    {
        Self::Callback(Arc::new(hook))
    }

    /// Creates a hook from an async function.
    pub fn from_async<F, Fut, E>(hook: F) -> Self
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<(), E>> + Send + 'static,
        E: Into<BoxError>,
    {
        Self::Async(Arc::new(move || -> BoxFuture<'static, Result<(), BoxError>> {
            let fut = hook();
            Box::pin(async move { fut.await.map_err(Into::<BoxError>::into) })
        }))
    }

    /// Creates a hook from a synchronous function.
    pub fn from_sync<F, E>(hook: F) -> Self
    where
        F: Fn() -> Result<(), E> + Send + Sync + 'static,
        E: Into<BoxError>,
    {
        Self::Sync(Arc::new(move || hook().map_err(Into::<BoxError>::into)))
    }

    /// Returns the convention name, used in logs.
    pub const fn convention(&self) -> &'static str {
        match self {
            Self::Callback(_) => "callback",
            Self::Async(_) => "async",
            Self::Sync(_) => "sync",
        }
    }

    /// Runs the hook to completion.
    pub async fn run(&self) -> Result<(), InvocationError> {
        let outcome = match self {
            Self::Callback(hook) => {
                let (completion, rx) = Completion::channel();
                let hook = Arc::clone(hook);
                if let Err(panic) = std::panic::catch_unwind(AssertUnwindSafe(|| hook(completion)))
                {
                    return Err(InvocationError::from_panic(ErrorKind::User, &*panic));
                }
                match rx.await {
                    Ok(result) => result,
                    Err(_) => {
                        return Err(InvocationError::internal(
                            "post-handler hook dropped its completion without reporting",
                        ))
                    }
                }
            }
            Self::Async(hook) => {
                let hook = Arc::clone(hook);
                match AssertUnwindSafe(async move { hook().await })
                    .catch_unwind()
                    .await
                {
                    Ok(result) => result,
                    Err(panic) => return Err(InvocationError::from_panic(ErrorKind::User, &*panic)),
                }
            }
            Self::Sync(hook) => match std::panic::catch_unwind(AssertUnwindSafe(|| hook())) {
                Ok(result) => result,
                Err(panic) => return Err(InvocationError::from_panic(ErrorKind::User, &*panic)),
            },
        };

        outcome.map_err(into_user_error)
    }
}

impl fmt::Debug for PostHandler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("PostHandler").field(&self.convention()).finish()
    }
}
