//! The JWT validation entry point.

use crate::{Algorithm, JsonWebTokenVerifier, JwtConfig, JwtError, TokenVerifier};
use palisade_config::{ConfigError, ConfigResolver, JwtOptions};
use palisade_core::Event;
use serde::Serialize;
use serde_json::Value;
use std::fmt;
use std::sync::Arc;

/// Event key that receives the decoded claims.
pub const CLAIMS_KEY: &str = "jwt";

const BEARER_PREFIX: &str = "Bearer ";

/// Read-only view of a validator's configuration.
///
/// Serializes to `{"enabled": false}` when disabled and to
/// `{"enabled": true, "algorithm", "key", "tokenName", "xsrf", ...}` when
/// enabled. The XSRF names are only present when XSRF checking is on.
#[derive(Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct JwtState {
    /// Whether validation runs.
    pub enabled: bool,
    /// Signature algorithm.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub algorithm: Option<Algorithm>,
    /// Key material.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub key: Option<String>,
    /// Last segment of the token path.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token_name: Option<String>,
    /// Whether XSRF checking runs.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub xsrf: Option<bool>,
    /// Last segment of the XSRF token path.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub xsrf_token_name: Option<String>,
    /// Last segment of the XSRF claim path.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub xsrf_claim_name: Option<String>,
}

impl fmt::Debug for JwtState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("JwtState")
            .field("enabled", &self.enabled)
            .field("algorithm", &self.algorithm)
            .field("key", &self.key.as_ref().map(|_| "<redacted>"))
            .field("token_name", &self.token_name)
            .field("xsrf", &self.xsrf)
            .field("xsrf_token_name", &self.xsrf_token_name)
            .field("xsrf_claim_name", &self.xsrf_claim_name)
            .finish()
    }
}

impl JwtState {
    const fn disabled() -> Self {
        Self {
            enabled: false,
            algorithm: None,
            key: None,
            token_name: None,
            xsrf: None,
            xsrf_token_name: None,
            xsrf_claim_name: None,
        }
    }
}

/// Validates the token carried by an event.
///
/// # Example
///
/// ```
/// use palisade_config::{ConfigResolver, JwtOptions, MapEnv};
/// use palisade_core::Event;
/// use palisade_jwt::JwtValidator;
/// use std::sync::Arc;
///
/// let resolver = ConfigResolver::new(Arc::new(MapEnv::new()));
/// let validator = JwtValidator::new(&JwtOptions::disabled(), &resolver).unwrap();
///
/// let mut event = Event::new();
/// validator.validate(&mut event).unwrap();
/// assert!(event.is_empty());
/// ```
#[derive(Debug, Clone)]
pub struct JwtValidator {
    config: JwtConfig,
    verifier: Arc<dyn TokenVerifier>,
}

impl JwtValidator {
    /// Resolves `options` and uses [`JsonWebTokenVerifier`].
    pub fn new(options: &JwtOptions, resolver: &ConfigResolver) -> Result<Self, ConfigError> {
        Self::with_verifier(options, resolver, Arc::new(JsonWebTokenVerifier::new()))
    }

    /// Resolves `options` and uses a custom verifier.
    pub fn with_verifier(
        options: &JwtOptions,
        resolver: &ConfigResolver,
        verifier: Arc<dyn TokenVerifier>,
    ) -> Result<Self, ConfigError> {
        Ok(Self::from_config(JwtConfig::resolve(options, resolver)?, verifier))
    }

    /// Builds a validator from an already resolved configuration.
    #[must_use]
    pub fn from_config(config: JwtConfig, verifier: Arc<dyn TokenVerifier>) -> Self {
        Self { config, verifier }
    }

    /// A validator that never runs.
    #[must_use]
    pub fn disabled() -> Self {
        Self::from_config(JwtConfig::Disabled, Arc::new(JsonWebTokenVerifier::new()))
    }

    /// Returns `true` when validation runs.
    #[must_use]
    pub const fn is_enabled(&self) -> bool {
        self.config.is_enabled()
    }

    /// Returns the resolved configuration.
    #[must_use]
    pub const fn config(&self) -> &JwtConfig {
        &self.config
    }

    /// Returns the observable state.
    #[must_use]
    pub fn state(&self) -> JwtState {
        let Some(settings) = self.config.settings() else {
            return JwtState::disabled();
        };

        let (xsrf_token_name, xsrf_claim_name) = if settings.xsrf {
            (
                Some(settings.xsrf_token_path.last().to_string()),
                Some(settings.xsrf_claim_path.last().to_string()),
            )
        } else {
            (None, None)
        };

        JwtState {
            enabled: true,
            algorithm: Some(settings.algorithm),
            key: Some(settings.key.clone()),
            token_name: Some(settings.token_path.last().to_string()),
            xsrf: Some(settings.xsrf),
            xsrf_token_name,
            xsrf_claim_name,
        }
    }

    /// Validates the event's token and stores the claims under `jwt`.
    ///
    /// Does nothing when disabled. A leading `"Bearer "` is stripped from
    /// the token before decoding. With XSRF on, the XSRF check runs after a
    /// successful decode. The raw token is left in place.
    ///
    /// # Errors
    ///
    /// [`JwtError::MissingToken`] / [`JwtError::MissingXsrfToken`] when a
    /// token is absent or not a string; verifier errors are returned as is.
    pub fn validate(&self, event: &mut Event) -> Result<(), JwtError> {
        let Some(settings) = self.config.settings() else {
            return Ok(());
        };

        let token = event
            .read(&settings.token_path)
            .and_then(Value::as_str)
            .ok_or_else(|| JwtError::MissingToken {
                path: settings.token_path.clone(),
            })?;
        let token = token.strip_prefix(BEARER_PREFIX).unwrap_or(token);

        let claims = self
            .verifier
            .decode(token, settings.algorithm, &settings.key)?;

        if settings.xsrf {
            let presented = event
                .read(&settings.xsrf_token_path)
                .and_then(Value::as_str)
                .ok_or_else(|| JwtError::MissingXsrfToken {
                    path: settings.xsrf_token_path.clone(),
                })?;
            self.verifier
                .validate_xsrf(&claims, presented, &settings.xsrf_claim_path)?;
        }

        tracing::debug!(claims = claims.len(), "jwt validated");
        event.insert(CLAIMS_KEY, Value::Object(claims));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use palisade_config::MapEnv;
    use serde_json::json;

    fn resolver() -> ConfigResolver {
        ConfigResolver::new(Arc::new(MapEnv::new()))
    }

    #[test]
    fn test_disabled_state() {
        let state = JwtValidator::disabled().state();
        assert_eq!(serde_json::to_value(state).unwrap(), json!({ "enabled": false }));
    }

    #[test]
    fn test_state_debug_redacts_key() {
        let validator = JwtValidator::new(
            &JwtOptions::new().algorithm("HS256").secret("TOP-SECRET-VALUE"),
            &resolver(),
        )
        .unwrap();
        let printed = format!("{:?}", validator.state());
        assert!(!printed.contains("TOP-SECRET-VALUE"));
        assert!(printed.contains("<redacted>"));
    }

    #[test]
    fn test_enabled_state_without_xsrf() {
        let validator =
            JwtValidator::new(&JwtOptions::new().algorithm("HS256").secret("s"), &resolver())
                .unwrap();
        assert_eq!(
            serde_json::to_value(validator.state()).unwrap(),
            json!({
                "enabled": true,
                "algorithm": "HS256",
                "key": "s",
                "tokenName": "jwt",
                "xsrf": false
            })
        );
    }

    #[test]
    fn test_enabled_state_with_xsrf() {
        let options = JwtOptions::new()
            .algorithm("HS256")
            .secret("s")
            .xsrf(true)
            .xsrf_claim("app.nonce");
        let state = JwtValidator::new(&options, &resolver()).unwrap().state();
        assert_eq!(state.xsrf_token_name.as_deref(), Some("xsrf"));
        assert_eq!(state.xsrf_claim_name.as_deref(), Some("nonce"));
    }

    #[test]
    fn test_missing_token() {
        let validator =
            JwtValidator::new(&JwtOptions::new().algorithm("HS256").secret("s"), &resolver())
                .unwrap();
        let mut event = Event::try_from(json!({ "headers": { "jwt": 42 } })).unwrap();
        assert!(matches!(
            validator.validate(&mut event),
            Err(JwtError::MissingToken { .. })
        ));
        assert!(!event.contains_key(CLAIMS_KEY));
    }
}
