//! The fixed set of configured plugins.

use crate::plugin::{Plugin, PluginKind, PluginState};
use crate::plugins::{ExecPlugin, JwtPlugin, ProtectPlugin, ValidationPlugin};
use palisade_config::{ConfigError, ConfigResolver, PipelineOptions};
use palisade_jwt::TokenVerifier;
use std::sync::Arc;

/// One configured instance of every plugin kind.
///
/// The registry is immutable; reconfiguration builds a new one.
#[derive(Debug)]
pub struct PluginRegistry {
    jwt: JwtPlugin,
    validation: ValidationPlugin,
    protect: ProtectPlugin,
    exec: ExecPlugin,
}

impl PluginRegistry {
    /// Configures every plugin from `options`.
    ///
    /// Fails on the first plugin whose configuration is invalid.
    pub fn configure(
        options: &PipelineOptions,
        resolver: &ConfigResolver,
        verifier: Arc<dyn TokenVerifier>,
    ) -> Result<Self, ConfigError> {
        let jwt = JwtPlugin::configure(&options.jwt, resolver, verifier)?;
        let validation = ValidationPlugin::configure(&options.validation)?;
        let protect = ProtectPlugin::configure(&options.protect, resolver)?;

        tracing::debug!(
            jwt = jwt.is_enabled(),
            validation = validation.is_enabled(),
            protect = %protect.mode(),
            "plugins configured"
        );

        Ok(Self {
            jwt,
            validation,
            protect,
            exec: ExecPlugin::new(),
        })
    }

    /// Returns the plugin of the given kind.
    pub fn get(&self, kind: PluginKind) -> &dyn Plugin {
        match kind {
            PluginKind::Jwt => &self.jwt,
            PluginKind::Validation => &self.validation,
            PluginKind::Protect => &self.protect,
            PluginKind::Exec => &self.exec,
        }
    }

    /// Returns the JWT plugin.
    pub const fn jwt(&self) -> &JwtPlugin {
        &self.jwt
    }

    /// Iterates the plugins in execution order.
    pub fn iter(&self) -> impl Iterator<Item = &dyn Plugin> + '_ {
        PluginKind::all().into_iter().map(|kind| self.get(kind))
    }

    /// Returns the state of every plugin, in execution order.
    pub fn states(&self) -> Vec<PluginState> {
        self.iter().map(Plugin::state).collect()
    }
}
