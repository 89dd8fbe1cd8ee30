//! Access to environment variables.
//!
//! Configuration never reads `std::env` directly. It goes through an
//! [`Environment`], so tests can inject a [`MapEnv`] instead of mutating the
//! real process environment.

use parking_lot::RwLock;
use std::collections::HashMap;
use std::fmt::Debug;

/// Names of the environment variables consulted as fallbacks.
pub mod vars {
    /// JWT algorithm (e.g. `HS256`, `RS256`).
    pub const JWT_ALGORITHM: &str = "PALISADE_JWT_ALGORITHM";
    /// Shared secret for HS-family algorithms.
    pub const JWT_SECRET: &str = "PALISADE_JWT_SECRET";
    /// Public key for asymmetric algorithms.
    pub const JWT_PUBLIC_KEY: &str = "PALISADE_JWT_PUBKEY";
    /// Key for either family, consulted after the family-specific variable.
    pub const JWT_KEY: &str = "PALISADE_JWT_KEY";
    /// Enables the XSRF double-submit check.
    pub const JWT_USE_XSRF: &str = "PALISADE_JWT_USE_XSRF";
    /// Dotted path of the token inside the event.
    pub const JWT_TOKEN_PATH: &str = "PALISADE_JWT_TOKEN_PATH";
    /// Dotted path of the XSRF token inside the event.
    pub const JWT_XSRF_TOKEN_PATH: &str = "PALISADE_JWT_XSRF_TOKEN_PATH";
    /// Dotted path of the XSRF nonce inside the claims.
    pub const JWT_XSRF_CLAIM_PATH: &str = "PALISADE_JWT_XSRF_CLAIM_PATH";
    /// SQL protection mode (`report`, `fail`, `disabled`).
    pub const PROTECT_MODE: &str = "PALISADE_PROTECT_MODE";
}

/// A source and sink of environment variables.
pub trait Environment: Send + Sync + Debug {
    /// Returns the value of `name`. Empty values are reported as absent.
    fn var(&self, name: &str) -> Option<String>;

    /// Sets `name` to `value`.
    fn set_var(&self, name: &str, value: &str);
}

/// The real process environment.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessEnv;

impl Environment for ProcessEnv {
    fn var(&self, name: &str) -> Option<String> {
        std::env::var(name).ok().filter(|value| !value.is_empty())
    }

    fn set_var(&self, name: &str, value: &str) {
        std::env::set_var(name, value);
    }
}

/// An in-memory environment.
///
/// # Example
///
/// ```
/// use palisade_config::{Environment, MapEnv};
///
/// let env = MapEnv::new().with("PALISADE_JWT_ALGORITHM", "HS256");
/// assert_eq!(env.var("PALISADE_JWT_ALGORITHM").as_deref(), Some("HS256"));
///
/// env.set_var("ANSWER", "42");
/// assert_eq!(env.var("ANSWER").as_deref(), Some("42"));
/// ```
#[derive(Debug, Default)]
pub struct MapEnv {
    vars: RwLock<HashMap<String, String>>,
}

impl MapEnv {
    /// Creates an empty environment.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a variable.
    #[must_use]
    pub fn with(self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.vars.write().insert(name.into(), value.into());
        self
    }

    /// Removes a variable, returning its previous value.
    pub fn remove_var(&self, name: &str) -> Option<String> {
        self.vars.write().remove(name)
    }
}

impl Environment for MapEnv {
    fn var(&self, name: &str) -> Option<String> {
        self.vars
            .read()
            .get(name)
            .filter(|value| !value.is_empty())
            .cloned()
    }

    fn set_var(&self, name: &str, value: &str) {
        self.vars.write().insert(name.to_string(), value.to_string());
    }
}
