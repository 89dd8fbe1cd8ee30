//! The plugin trait and plugin kinds.
//!
//! Every step of the pipeline implements [`Plugin`]. The set of plugins is
//! closed: there is exactly one plugin per [`PluginKind`], and the kinds run
//! in the order returned by [`PluginKind::all`].
//!
//! # Example
//!
//! ```
//! use palisade_middleware::PluginKind;
//!
//! let kinds = PluginKind::all();
//! assert_eq!(kinds.len(), 4);
//! assert_eq!(kinds[0].name(), "jwt");
//! assert_eq!(kinds[3].name(), "exec");
//! ```

use crate::invocation::Invocation;
use crate::plugins::{ExecState, ProtectState, ValidationState};
use palisade_core::InvocationError;
use palisade_jwt::JwtState;
use serde::Serialize;
use std::fmt::Debug;
use std::future::Future;
use std::pin::Pin;

/// A boxed, sendable future.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// One step of the pipeline.
///
/// # Invariants
///
/// - `execute` MUST NOT be called when `is_enabled` is `false`
/// - A returned error rejects the invocation; later plugins do not run
/// - `state` is a pure projection of the configuration
pub trait Plugin: Send + Sync + Debug {
    /// Returns the kind of this plugin.
    fn kind(&self) -> PluginKind;

    /// Returns the plugin name, used in logs and metrics.
    fn name(&self) -> &'static str {
        self.kind().name()
    }

    /// Returns `true` when the plugin participates in invocations.
    fn is_enabled(&self) -> bool;

    /// Returns the observable configuration snapshot.
    fn state(&self) -> PluginState;

    /// Runs the plugin against the invocation.
    fn execute<'a>(
        &'a self,
        invocation: &'a mut Invocation,
    ) -> BoxFuture<'a, Result<(), InvocationError>>;
}

/// Pipeline plugin kinds, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
#[repr(u8)]
pub enum PluginKind {
    /// Step 1: token authentication and XSRF check
    Jwt = 1,
    /// Step 2: schema validation of the event
    Validation = 2,
    /// Step 3: SQL-injection protection
    Protect = 3,
    /// Step 4: the user function
    Exec = 4,
}

impl PluginKind {
    /// Returns the plugin name.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Jwt => "jwt",
            Self::Validation => "validation",
            Self::Protect => "protect",
            Self::Exec => "exec",
        }
    }

    /// Returns all kinds in execution order.
    #[must_use]
    pub const fn all() -> [Self; 4] {
        [Self::Jwt, Self::Validation, Self::Protect, Self::Exec]
    }
}

impl std::fmt::Display for PluginKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// The observable state of a plugin.
///
/// Serializes to the state shape of the wrapped plugin, with no tag.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum PluginState {
    /// State of the JWT plugin.
    Jwt(JwtState),
    /// State of the validation plugin.
    Validation(ValidationState),
    /// State of the protection plugin.
    Protect(ProtectState),
    /// State of the execution plugin.
    Exec(ExecState),
}

impl PluginState {
    /// Returns the kind this state belongs to.
    #[must_use]
    pub const fn kind(&self) -> PluginKind {
        match self {
            Self::Jwt(_) => PluginKind::Jwt,
            Self::Validation(_) => PluginKind::Validation,
            Self::Protect(_) => PluginKind::Protect,
            Self::Exec(_) => PluginKind::Exec,
        }
    }

    /// Returns the state as a JSON value.
    #[must_use]
    pub fn to_value(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or(serde_json::Value::Null)
    }
}
