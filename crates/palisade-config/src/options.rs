//! Explicit configuration options.
//!
//! These types mirror the configuration surface accepted by the pipeline.
//! Every field is optional: anything left unset falls back to an environment
//! variable (where one exists) and then to a built-in default. Resolution
//! happens in [`ConfigResolver`](crate::ConfigResolver) and in the JWT crate;
//! the types here are pure data.
//!
//! Options can be built in code or loaded from JSON/TOML text:
//!
//! ```
//! use palisade_config::PipelineOptions;
//!
//! let json = r#"{
//!     "jwt": { "algorithm": "HS256", "secret": "my-secret" },
//!     "protect": { "mode": "fail" },
//!     "stripErrors": "no"
//! }"#;
//!
//! let options = PipelineOptions::from_str(json, "json").unwrap();
//! assert_eq!(options.jwt.algorithm.as_deref(), Some("HS256"));
//! ```

use crate::{parse_bool, ConfigError};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;

/// A boolean option that also accepts boolean-like strings (`"yes"`, `"no"`,
/// `"on"`, `"off"`, `"1"`, `"0"`, `"true"`, `"false"`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Toggle {
    /// A JSON/TOML boolean.
    Bool(bool),
    /// A boolean-like string.
    Text(String),
}

impl Toggle {
    /// Interprets the toggle, naming `field` on failure.
    pub fn resolve(&self, field: &str) -> Result<bool, ConfigError> {
        match self {
            Self::Bool(value) => Ok(*value),
            Self::Text(text) => parse_bool(text).ok_or_else(|| {
                ConfigError::invalid_value(field, format!("expected boolean, got '{text}'"))
            }),
        }
    }
}

impl From<bool> for Toggle {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<&str> for Toggle {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

/// SQL-injection protection mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ProtectMode {
    /// Log detections, never block.
    #[default]
    Report,
    /// Reject the invocation on detection.
    Fail,
    /// Do not scan.
    Disabled,
}

impl ProtectMode {
    /// Returns the mode name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Report => "report",
            Self::Fail => "fail",
            Self::Disabled => "disabled",
        }
    }

    /// Parses a mode name, case-insensitively.
    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        match value.to_lowercase().as_str() {
            "report" => Some(Self::Report),
            "fail" => Some(Self::Fail),
            "disabled" | "off" => Some(Self::Disabled),
            _ => None,
        }
    }
}

impl fmt::Display for ProtectMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Options for the JWT authentication plugin.
///
/// ```
/// use palisade_config::JwtOptions;
///
/// let options = JwtOptions::new()
///     .algorithm("HS256")
///     .secret("super-secret")
///     .token("headers.Authorization")
///     .xsrf(true);
///
/// assert_eq!(options.token.as_deref(), Some("headers.Authorization"));
/// ```
#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct JwtOptions {
    /// Explicit enable switch. `false` disables the plugin unconditionally.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enabled: Option<Toggle>,

    /// Signature algorithm name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub algorithm: Option<String>,

    /// Shared secret (HS family).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub secret: Option<String>,

    /// Public key or certificate (asymmetric families).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub public_key: Option<String>,

    /// Key for either family, used when the family-specific option is unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key: Option<String>,

    /// Dotted path of the token in the event.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,

    /// Enables the XSRF double-submit check.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub xsrf: Option<Toggle>,

    /// Dotted path of the XSRF token in the event.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub xsrf_token: Option<String>,

    /// Dotted path of the XSRF nonce in the decoded claims.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub xsrf_claim: Option<String>,
}

const REDACTED: &str = "<redacted>";

impl fmt::Debug for JwtOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let redact = |value: &Option<String>| value.as_ref().map(|_| REDACTED);
        f.debug_struct("JwtOptions")
            .field("enabled", &self.enabled)
            .field("algorithm", &self.algorithm)
            .field("secret", &redact(&self.secret))
            .field("public_key", &redact(&self.public_key))
            .field("key", &redact(&self.key))
            .field("token", &self.token)
            .field("xsrf", &self.xsrf)
            .field("xsrf_token", &self.xsrf_token)
            .field("xsrf_claim", &self.xsrf_claim)
            .finish()
    }
}

impl JwtOptions {
    /// Creates empty options.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Options that disable the plugin.
    #[must_use]
    pub fn disabled() -> Self {
        Self::new().enabled(false)
    }

    /// Sets the explicit enable switch.
    #[must_use]
    pub fn enabled(mut self, enabled: impl Into<Toggle>) -> Self {
        self.enabled = Some(enabled.into());
        self
    }

    /// Sets the algorithm.
    #[must_use]
    pub fn algorithm(mut self, algorithm: impl Into<String>) -> Self {
        self.algorithm = Some(algorithm.into());
        self
    }

    /// Sets the HS secret.
    #[must_use]
    pub fn secret(mut self, secret: impl Into<String>) -> Self {
        self.secret = Some(secret.into());
        self
    }

    /// Sets the public key.
    #[must_use]
    pub fn public_key(mut self, key: impl Into<String>) -> Self {
        self.public_key = Some(key.into());
        self
    }

    /// Sets the family-neutral key.
    #[must_use]
    pub fn key(mut self, key: impl Into<String>) -> Self {
        self.key = Some(key.into());
        self
    }

    /// Sets the token path.
    #[must_use]
    pub fn token(mut self, path: impl Into<String>) -> Self {
        self.token = Some(path.into());
        self
    }

    /// Enables or disables the XSRF check.
    #[must_use]
    pub fn xsrf(mut self, xsrf: impl Into<Toggle>) -> Self {
        self.xsrf = Some(xsrf.into());
        self
    }

    /// Sets the XSRF token path.
    #[must_use]
    pub fn xsrf_token(mut self, path: impl Into<String>) -> Self {
        self.xsrf_token = Some(path.into());
        self
    }

    /// Sets the XSRF claim path.
    #[must_use]
    pub fn xsrf_claim(mut self, path: impl Into<String>) -> Self {
        self.xsrf_claim = Some(path.into());
        self
    }
}

/// Options for the schema validation plugin.
///
/// `schema` maps top-level event keys to JSON Schema documents.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct ValidationOptions {
    /// Explicit enable switch. Defaults to "enabled when a schema is given".
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enabled: Option<Toggle>,

    /// JSON Schema per top-level event key.
    #[serde(default)]
    pub schema: BTreeMap<String, Value>,

    /// Keys that are allowed but not validated.
    #[serde(default)]
    pub ignore: Vec<String>,

    /// Keys that must be present.
    #[serde(default)]
    pub required: Vec<String>,
}

impl ValidationOptions {
    /// Creates empty options.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a schema for a top-level key.
    #[must_use]
    pub fn field(mut self, key: impl Into<String>, schema: Value) -> Self {
        self.schema.insert(key.into(), schema);
        self
    }

    /// Adds a required top-level key with its schema.
    #[must_use]
    pub fn required_field(mut self, key: impl Into<String>, schema: Value) -> Self {
        let key = key.into();
        self.required.push(key.clone());
        self.schema.insert(key, schema);
        self
    }

    /// Adds an ignored key.
    #[must_use]
    pub fn ignore(mut self, key: impl Into<String>) -> Self {
        self.ignore.push(key.into());
        self
    }
}

/// Options for the SQL-injection protection plugin.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct ProtectOptions {
    /// Protection mode.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mode: Option<ProtectMode>,
}

impl ProtectOptions {
    /// Options with an explicit mode.
    #[must_use]
    pub fn mode(mode: ProtectMode) -> Self {
        Self { mode: Some(mode) }
    }
}

/// Complete pipeline configuration.
///
/// ```
/// use palisade_config::{JwtOptions, PipelineOptions, ProtectMode, ProtectOptions};
///
/// let options = PipelineOptions::new()
///     .with_jwt(JwtOptions::new().algorithm("HS256").secret("s3cr3t"))
///     .with_protect(ProtectOptions::mode(ProtectMode::Fail))
///     .with_env("APP_STAGE", "prod")
///     .strip_errors(false);
///
/// assert_eq!(options.env.get("APP_STAGE").map(String::as_str), Some("prod"));
/// ```
#[derive(Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct PipelineOptions {
    /// JWT plugin options.
    #[serde(default)]
    pub jwt: JwtOptions,

    /// Validation plugin options.
    #[serde(default)]
    pub validation: ValidationOptions,

    /// Protection plugin options.
    #[serde(default)]
    pub protect: ProtectOptions,

    /// Environment variables written into the environment on configure.
    #[serde(default)]
    pub env: BTreeMap<String, String>,

    /// Strip stacks from errors delivered to the callback (default `true`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub strip_errors: Option<Toggle>,

    /// Log invocation failures (default `true`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub log_uncaught_exceptions: Option<Toggle>,
}

impl fmt::Debug for PipelineOptions {
    // Only `env` names are printed.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PipelineOptions")
            .field("jwt", &self.jwt)
            .field("validation", &self.validation)
            .field("protect", &self.protect)
            .field("env", &self.env.keys().collect::<Vec<_>>())
            .field("strip_errors", &self.strip_errors)
            .field("log_uncaught_exceptions", &self.log_uncaught_exceptions)
            .finish()
    }
}

impl PipelineOptions {
    /// Creates empty options.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses options from text.
    ///
    /// `format` is `"json"` or `"toml"`.
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(content: &str, format: &str) -> Result<Self, ConfigError> {
        match format.to_lowercase().as_str() {
            "json" => Ok(serde_json::from_str(content)?),
            "toml" => Ok(toml::from_str(content)?),
            _ => Err(ConfigError::UnsupportedFormat(format.to_string())),
        }
    }

    /// Builds options from a JSON value.
    pub fn from_value(value: Value) -> Result<Self, ConfigError> {
        Ok(serde_json::from_value(value)?)
    }

    /// Sets the JWT options.
    #[must_use]
    pub fn with_jwt(mut self, jwt: JwtOptions) -> Self {
        self.jwt = jwt;
        self
    }

    /// Sets the validation options.
    #[must_use]
    pub fn with_validation(mut self, validation: ValidationOptions) -> Self {
        self.validation = validation;
        self
    }

    /// Sets the protection options.
    #[must_use]
    pub fn with_protect(mut self, protect: ProtectOptions) -> Self {
        self.protect = protect;
        self
    }

    /// Adds an environment variable to write on configure.
    #[must_use]
    pub fn with_env(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.insert(name.into(), value.into());
        self
    }

    /// Sets the `stripErrors` flag.
    #[must_use]
    pub fn strip_errors(mut self, strip: impl Into<Toggle>) -> Self {
        self.strip_errors = Some(strip.into());
        self
    }

    /// Sets the `logUncaughtExceptions` flag.
    #[must_use]
    pub fn log_uncaught_exceptions(mut self, log: impl Into<Toggle>) -> Self {
        self.log_uncaught_exceptions = Some(log.into());
        self
    }
}
