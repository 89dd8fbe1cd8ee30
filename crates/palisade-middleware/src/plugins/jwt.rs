//! Token authentication plugin.

use crate::invocation::Invocation;
use crate::plugin::{BoxFuture, Plugin, PluginKind, PluginState};
use palisade_config::{ConfigError, ConfigResolver, JwtOptions};
use palisade_core::InvocationError;
use palisade_jwt::{JwtValidator, TokenVerifier};
use std::sync::Arc;

/// Runs [`JwtValidator::validate`] against the event.
///
/// Validation failures are reported as `AuthenticationError`, with the
/// [`JwtError`](palisade_jwt::JwtError) as source.
#[derive(Debug, Clone)]
pub struct JwtPlugin {
    validator: JwtValidator,
}

impl JwtPlugin {
    /// Resolves the plugin from options and the environment.
    pub fn configure(
        options: &JwtOptions,
        resolver: &ConfigResolver,
        verifier: Arc<dyn TokenVerifier>,
    ) -> Result<Self, ConfigError> {
        Ok(Self::new(JwtValidator::with_verifier(options, resolver, verifier)?))
    }

    /// Wraps an existing validator.
    #[must_use]
    pub const fn new(validator: JwtValidator) -> Self {
        Self { validator }
    }

    /// Returns the validator.
    #[must_use]
    pub const fn validator(&self) -> &JwtValidator {
        &self.validator
    }
}

impl Plugin for JwtPlugin {
    fn kind(&self) -> PluginKind {
        PluginKind::Jwt
    }

    fn is_enabled(&self) -> bool {
        self.validator.is_enabled()
    }

    fn state(&self) -> PluginState {
        PluginState::Jwt(self.validator.state())
    }

    fn execute<'a>(
        &'a self,
        invocation: &'a mut Invocation,
    ) -> BoxFuture<'a, Result<(), InvocationError>> {
        Box::pin(async move {
            self.validator
                .validate(invocation.event_mut())
                .map_err(InvocationError::from)
        })
    }
}
