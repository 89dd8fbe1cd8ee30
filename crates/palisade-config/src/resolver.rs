//! Merging of explicit options, environment fallbacks and defaults.
//!
//! Precedence is per field: an explicit option wins, then the environment
//! variable, then the built-in default. Empty strings count as absent at
//! every level.
//!
//! Writing the `env` block into the environment is a separate step
//! ([`ConfigResolver::apply_env`]) so that pure resolution never has side
//! effects.

use crate::env::{vars, Environment, ProcessEnv};
use crate::options::{PipelineOptions, ProtectMode, ProtectOptions, Toggle};
use crate::ConfigError;
use palisade_core::TokenPath;
use std::collections::BTreeMap;
use std::sync::Arc;

/// Top-level pipeline flags after resolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PipelineSettings {
    /// Empty the stack of errors delivered to the callback.
    pub strip_errors: bool,
    /// Log invocation failures.
    pub log_uncaught_exceptions: bool,
}

impl Default for PipelineSettings {
    fn default() -> Self {
        Self {
            strip_errors: true,
            log_uncaught_exceptions: true,
        }
    }
}

/// Resolves configuration values against an [`Environment`].
///
/// # Example
///
/// ```
/// use palisade_config::{ConfigResolver, MapEnv};
/// use std::sync::Arc;
///
/// let env = MapEnv::new().with("PALISADE_JWT_ALGORITHM", "HS512");
/// let resolver = ConfigResolver::new(Arc::new(env));
///
/// assert_eq!(
///     resolver.string(None, "PALISADE_JWT_ALGORITHM").as_deref(),
///     Some("HS512")
/// );
/// assert_eq!(
///     resolver.string(Some("HS256"), "PALISADE_JWT_ALGORITHM").as_deref(),
///     Some("HS256")
/// );
/// ```
#[derive(Debug, Clone)]
pub struct ConfigResolver {
    env: Arc<dyn Environment>,
}

impl ConfigResolver {
    /// Creates a resolver over the given environment.
    #[must_use]
    pub fn new(env: Arc<dyn Environment>) -> Self {
        Self { env }
    }

    /// Creates a resolver over the process environment.
    #[must_use]
    pub fn from_process() -> Self {
        Self::new(Arc::new(ProcessEnv))
    }

    /// Returns the underlying environment.
    #[must_use]
    pub fn environment(&self) -> &Arc<dyn Environment> {
        &self.env
    }

    /// Writes every entry of an `env` block into the environment.
    ///
    /// Existing variables not named in `vars` are left alone; named ones are
    /// overwritten. Every entry is checked before anything is written, so an
    /// invalid block leaves the environment untouched.
    pub fn apply_env(&self, vars: &BTreeMap<String, String>) -> Result<(), ConfigError> {
        for (name, value) in vars {
            check_env_entry(name, value)?;
        }
        for (name, value) in vars {
            tracing::debug!(var = %name, "setting environment variable");
            self.env.set_var(name, value);
        }
        Ok(())
    }

    /// Resolves a string: explicit value, then `var`.
    #[must_use]
    pub fn string(&self, explicit: Option<&str>, var: &str) -> Option<String> {
        self.first_string(&[explicit], &[var])
    }

    /// Resolves a string from several explicit candidates, then several
    /// variables, in order.
    #[must_use]
    pub fn first_string(&self, explicit: &[Option<&str>], vars: &[&str]) -> Option<String> {
        explicit
            .iter()
            .flatten()
            .find(|value| !value.is_empty())
            .map(|value| (*value).to_string())
            .or_else(|| vars.iter().find_map(|var| self.env.var(var)))
    }

    /// Resolves a boolean flag.
    pub fn flag(
        &self,
        explicit: Option<&Toggle>,
        field: &str,
        var: &str,
        default: bool,
    ) -> Result<bool, ConfigError> {
        if let Some(toggle) = explicit {
            return toggle.resolve(field);
        }
        match self.env.var(var) {
            Some(value) => parse_bool(&value)
                .ok_or_else(|| ConfigError::env_parse_error(var, "expected boolean")),
            None => Ok(default),
        }
    }

    /// Resolves a dotted path.
    pub fn path(
        &self,
        explicit: Option<&str>,
        field: &str,
        var: &str,
        default: &[&str],
    ) -> Result<TokenPath, ConfigError> {
        match self.string(explicit, var) {
            Some(raw) => {
                TokenPath::parse(&raw).map_err(|source| ConfigError::invalid_path(field, source))
            }
            None => TokenPath::from_segments(default.iter().copied())
                .map_err(|source| ConfigError::invalid_path(field, source)),
        }
    }

    /// Resolves the SQL protection mode: explicit, then
    /// `PALISADE_PROTECT_MODE`, then `report`.
    pub fn protect_mode(&self, options: &ProtectOptions) -> Result<ProtectMode, ConfigError> {
        if let Some(mode) = options.mode {
            return Ok(mode);
        }
        match self.env.var(vars::PROTECT_MODE) {
            Some(value) => ProtectMode::parse(&value).ok_or_else(|| {
                ConfigError::env_parse_error(vars::PROTECT_MODE, format!("unknown mode '{value}'"))
            }),
            None => Ok(ProtectMode::default()),
        }
    }

    /// Resolves the top-level flags. Both default to `true`.
    pub fn settings(&self, options: &PipelineOptions) -> Result<PipelineSettings, ConfigError> {
        let defaults = PipelineSettings::default();
        Ok(PipelineSettings {
            strip_errors: options
                .strip_errors
                .as_ref()
                .map_or(Ok(defaults.strip_errors), |t| t.resolve("stripErrors"))?,
            log_uncaught_exceptions: options
                .log_uncaught_exceptions
                .as_ref()
                .map_or(Ok(defaults.log_uncaught_exceptions), |t| {
                    t.resolve("logUncaughtExceptions")
                })?,
        })
    }
}

impl Default for ConfigResolver {
    fn default() -> Self {
        Self::from_process()
    }
}

/// Rejects names and values the operating system cannot store.
fn check_env_entry(name: &str, value: &str) -> Result<(), ConfigError> {
    let field = || format!("env.{name}");
    if name.is_empty() {
        return Err(ConfigError::invalid_value("env", "variable name is empty"));
    }
    if name.contains('=') {
        return Err(ConfigError::invalid_value(field(), "variable name contains '='"));
    }
    if name.contains('\0') {
        return Err(ConfigError::invalid_value(field(), "variable name contains NUL"));
    }
    if value.contains('\0') {
        return Err(ConfigError::invalid_value(field(), "value contains NUL"));
    }
    Ok(())
}

/// Parse a boolean from a string.
#[must_use]
pub fn parse_bool(s: &str) -> Option<bool> {
    match s.trim().to_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Some(true),
        "false" | "0" | "no" | "off" => Some(false),
        _ => None,
    }
}
