//! Resolved JWT configuration.

use crate::{normalize_public_key, Algorithm};
use palisade_config::{vars, ConfigError, ConfigResolver, JwtOptions};
use palisade_core::{ClaimPath, TokenPath};
use std::fmt;

const DEFAULT_TOKEN_PATH: [&str; 2] = ["headers", "jwt"];
const DEFAULT_XSRF_TOKEN_PATH: [&str; 2] = ["headers", "xsrf"];
const DEFAULT_XSRF_CLAIM_PATH: [&str; 1] = ["nonce"];

/// JWT configuration after merging options, environment and defaults.
///
/// The state is fixed once resolved; reconfiguration resolves a new value.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum JwtConfig {
    /// Validation is off; events pass through untouched.
    #[default]
    Disabled,
    /// Validation is on.
    Enabled(JwtSettings),
}

/// Settings of an enabled validator.
#[derive(Clone, PartialEq, Eq)]
pub struct JwtSettings {
    /// Signature algorithm.
    pub algorithm: Algorithm,
    /// Secret (HS family) or PEM public key (other families).
    pub key: String,
    /// Location of the token in the event.
    pub token_path: TokenPath,
    /// Whether the XSRF double-submit check runs.
    pub xsrf: bool,
    /// Location of the XSRF token in the event.
    pub xsrf_token_path: TokenPath,
    /// Location of the XSRF nonce in the decoded claims.
    pub xsrf_claim_path: ClaimPath,
}

impl fmt::Debug for JwtSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("JwtSettings")
            .field("algorithm", &self.algorithm)
            .field("key", &"<redacted>")
            .field("token_path", &self.token_path)
            .field("xsrf", &self.xsrf)
            .field("xsrf_token_path", &self.xsrf_token_path)
            .field("xsrf_claim_path", &self.xsrf_claim_path)
            .finish()
    }
}

impl JwtConfig {
    /// Resolves the configuration.
    ///
    /// Per field, an explicit option wins over its `PALISADE_JWT_*`
    /// variable, which wins over the default. An explicit `enabled: false`
    /// disables validation whatever else is set. Otherwise validation is on
    /// exactly when an algorithm is resolved.
    ///
    /// # Errors
    ///
    /// - [`ConfigError::MissingField`] naming `secret` (HS family) or
    ///   `publicKey` (other families) when no key is found, or `algorithm`
    ///   when `enabled: true` is given without one
    /// - [`ConfigError::InvalidValue`] for an unknown algorithm or a
    ///   malformed boolean
    /// - [`ConfigError::InvalidPath`] for an unparsable path option
    pub fn resolve(options: &JwtOptions, resolver: &ConfigResolver) -> Result<Self, ConfigError> {
        let explicitly_enabled = options
            .enabled
            .as_ref()
            .map(|toggle| toggle.resolve("enabled"))
            .transpose()?;

        if explicitly_enabled == Some(false) {
            tracing::debug!("jwt validation explicitly disabled");
            return Ok(Self::Disabled);
        }

        let Some(algorithm) = resolver.string(options.algorithm.as_deref(), vars::JWT_ALGORITHM)
        else {
            if explicitly_enabled == Some(true) {
                return Err(ConfigError::missing_field("algorithm"));
            }
            return Ok(Self::Disabled);
        };
        let algorithm: Algorithm = algorithm.parse()?;

        let key = if algorithm.is_symmetric() {
            resolver.first_string(
                &[options.secret.as_deref(), options.key.as_deref()],
                &[vars::JWT_SECRET, vars::JWT_KEY],
            )
        } else {
            resolver
                .first_string(
                    &[options.public_key.as_deref(), options.key.as_deref()],
                    &[vars::JWT_PUBLIC_KEY, vars::JWT_KEY],
                )
                .map(|key| normalize_public_key(&key))
        };
        let key = key.ok_or_else(|| ConfigError::missing_field(algorithm.key_field()))?;

        let settings = JwtSettings {
            algorithm,
            key,
            token_path: resolver.path(
                options.token.as_deref(),
                "token",
                vars::JWT_TOKEN_PATH,
                &DEFAULT_TOKEN_PATH,
            )?,
            xsrf: resolver.flag(options.xsrf.as_ref(), "xsrf", vars::JWT_USE_XSRF, false)?,
            xsrf_token_path: resolver.path(
                options.xsrf_token.as_deref(),
                "xsrfToken",
                vars::JWT_XSRF_TOKEN_PATH,
                &DEFAULT_XSRF_TOKEN_PATH,
            )?,
            xsrf_claim_path: resolver.path(
                options.xsrf_claim.as_deref(),
                "xsrfClaim",
                vars::JWT_XSRF_CLAIM_PATH,
                &DEFAULT_XSRF_CLAIM_PATH,
            )?,
        };

        tracing::debug!(
            algorithm = %settings.algorithm,
            token_path = %settings.token_path,
            xsrf = settings.xsrf,
            "jwt validation enabled"
        );

        Ok(Self::Enabled(settings))
    }

    /// Returns `true` when validation is on.
    #[must_use]
    pub const fn is_enabled(&self) -> bool {
        matches!(self, Self::Enabled(_))
    }

    /// Returns the settings of an enabled configuration.
    #[must_use]
    pub const fn settings(&self) -> Option<&JwtSettings> {
        match self {
            Self::Enabled(settings) => Some(settings),
            Self::Disabled => None,
        }
    }
}
