//! Execution plugin: runs the user function.

use crate::invocation::Invocation;
use crate::plugin::{BoxFuture, Plugin, PluginKind, PluginState};
use futures_util::FutureExt;
use palisade_core::{ErrorKind, InvocationError};
use serde::Serialize;
use std::panic::AssertUnwindSafe;

/// Observable state of the execution plugin.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExecState {
    /// Always `true`.
    pub enabled: bool,
}

/// Hands the event to the user function and stores its result.
///
/// A panic inside the user function is reported as a user error.
#[derive(Debug, Default, Clone, Copy)]
pub struct ExecPlugin;

impl ExecPlugin {
    /// Creates the plugin.
    pub const fn new() -> Self {
        Self
    }
}

impl Plugin for ExecPlugin {
    fn kind(&self) -> PluginKind {
        PluginKind::Exec
    }

    fn is_enabled(&self) -> bool {
        true
    }

    fn state(&self) -> PluginState {
        PluginState::Exec(ExecState { enabled: true })
    }

    fn execute<'a>(
        &'a self,
        invocation: &'a mut Invocation,
    ) -> BoxFuture<'a, Result<(), InvocationError>> {
        Box::pin(async move {
            let handler = invocation.handler();
            let event = invocation.take_event();
            let context = invocation.context().clone();

            let outcome = AssertUnwindSafe(async move { handler.call(event, context).await })
                .catch_unwind()
                .await;

            let value = match outcome {
                Ok(result) => result?,
                Err(panic) => return Err(InvocationError::from_panic(ErrorKind::User, &*panic)),
            };

            invocation.set_result(value);
            Ok(())
        })
    }
}
