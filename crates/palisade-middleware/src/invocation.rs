//! Per-invocation state.
//!
//! An [`Invocation`] carries the event, the context and the user function
//! through the plugins. It is created by the wrapped handler for every call
//! and dropped when the terminal result is produced.

use crate::plugin::BoxFuture;
use palisade_core::{BoxError, ErrorKind, Event, InvocationContext, InvocationError};
use serde_json::Value;
use std::fmt;
use std::future::Future;
use std::sync::Arc;

/// Future returned by a [`UserHandler`].
pub type HandlerFuture = BoxFuture<'static, Result<Value, InvocationError>>;

/// The user function wrapped by the pipeline.
///
/// Implemented for every `Fn(Event, InvocationContext) -> Future` whose
/// output is `Result<Value, E>` with `E` convertible to a boxed error.
/// Errors become [`ErrorKind::User`] unless they already are an
/// [`InvocationError`], in which case they pass through unchanged.
pub trait UserHandler: Send + Sync + 'static {
    /// Calls the function.
    fn call(&self, event: Event, context: InvocationContext) -> HandlerFuture;
}

impl<F, Fut, E> UserHandler for F
where
    F: Fn(Event, InvocationContext) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<Value, E>> + Send + 'static,
    E: Into<BoxError>,
{
    fn call(&self, event: Event, context: InvocationContext) -> HandlerFuture {
        let fut = self(event, context);
        Box::pin(async move { fut.await.map_err(into_user_error) })
    }
}

pub(crate) fn into_user_error<E: Into<BoxError>>(err: E) -> InvocationError {
    match err.into().downcast::<InvocationError>() {
        Ok(err) => *err,
        Err(other) => InvocationError::from_source(ErrorKind::User, other),
    }
}

/// State of one invocation as it flows through the plugins.
pub struct Invocation {
    event: Event,
    context: InvocationContext,
    handler: Arc<dyn UserHandler>,
    result: Option<Value>,
}

impl Invocation {
    /// Creates an invocation.
    #[must_use]
    pub fn new(event: Event, context: InvocationContext, handler: Arc<dyn UserHandler>) -> Self {
        Self {
            event,
            context,
            handler,
            result: None,
        }
    }

    /// Returns the event.
    #[must_use]
    pub const fn event(&self) -> &Event {
        &self.event
    }

    /// Returns the event for in-place mutation.
    pub fn event_mut(&mut self) -> &mut Event {
        &mut self.event
    }

    /// Returns the invocation context.
    #[must_use]
    pub const fn context(&self) -> &InvocationContext {
        &self.context
    }

    /// Returns the user function.
    #[must_use]
    pub fn handler(&self) -> Arc<dyn UserHandler> {
        Arc::clone(&self.handler)
    }

    /// Hands the event over to the user function, leaving an empty one.
    pub fn take_event(&mut self) -> Event {
        std::mem::take(&mut self.event)
    }

    /// Returns the result of the user function, once it has run.
    #[must_use]
    pub const fn result(&self) -> Option<&Value> {
        self.result.as_ref()
    }

    /// Stores the result of the user function.
    pub fn set_result(&mut self, result: Value) {
        self.result = Some(result);
    }

    /// Takes the result out of the invocation.
    pub fn take_result(&mut self) -> Option<Value> {
        self.result.take()
    }
}

impl fmt::Debug for Invocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Invocation")
            .field("event", &self.event)
            .field("context", &self.context)
            .field("result", &self.result)
            .finish_non_exhaustive()
    }
}
