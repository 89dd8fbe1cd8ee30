//! Schema validation plugin.
//!
//! Each top-level event key listed in the options' `schema` map is validated
//! against its JSON Schema. Keys in `ignore` are accepted as they are, keys
//! in `required` must be present, and any other key is rejected. The claims
//! key written by the JWT plugin is always accepted.

use crate::invocation::Invocation;
use crate::plugin::{BoxFuture, Plugin, PluginKind, PluginState};
use jsonschema::Validator;
use palisade_config::{ConfigError, ValidationOptions};
use palisade_core::{Event, InvocationError};
use palisade_jwt::CLAIMS_KEY;
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};

/// Observable state of the validation plugin.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidationState {
    /// Whether validation runs.
    pub enabled: bool,
    /// Validated keys, sorted.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub keys: Option<Vec<String>>,
    /// Ignored keys, in configuration order.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ignored: Option<Vec<String>>,
}

/// Validates the event against per-key JSON Schemas.
#[derive(Debug, Default)]
pub struct ValidationPlugin {
    enabled: bool,
    schemas: BTreeMap<String, Validator>,
    ignored: Vec<String>,
    required: BTreeSet<String>,
}

impl ValidationPlugin {
    /// Compiles the schemas in `options`.
    ///
    /// The plugin is enabled when at least one schema is given, unless
    /// `enabled` says otherwise.
    pub fn configure(options: &ValidationOptions) -> Result<Self, ConfigError> {
        let enabled = match &options.enabled {
            Some(toggle) => toggle.resolve("validation.enabled")?,
            None => !options.schema.is_empty(),
        };
        if !enabled {
            return Ok(Self::default());
        }

        let mut schemas = BTreeMap::new();
        for (key, schema) in &options.schema {
            let validator = jsonschema::validator_for(schema).map_err(|e| {
                ConfigError::invalid_value(format!("validation.schema.{key}"), e.to_string())
            })?;
            schemas.insert(key.clone(), validator);
        }

        for key in &options.required {
            if !schemas.contains_key(key) {
                return Err(ConfigError::invalid_value(
                    "validation.required",
                    format!("'{key}' has no schema"),
                ));
            }
        }

        tracing::debug!(keys = schemas.len(), "validation enabled");

        Ok(Self {
            enabled,
            schemas,
            ignored: options.ignore.clone(),
            required: options.required.iter().cloned().collect(),
        })
    }

    /// Checks the event, returning the first violation.
    pub fn check(&self, event: &Event) -> Result<(), InvocationError> {
        if let Some(missing) = self.required.iter().find(|key| !event.contains_key(key)) {
            return Err(InvocationError::validation(format!("'{missing}' is required")));
        }

        for (key, value) in event.iter() {
            if let Some(validator) = self.schemas.get(key) {
                if let Some(error) = validator.iter_errors(value).next() {
                    return Err(InvocationError::validation(format!("'{key}': {error}")));
                }
            } else if key != CLAIMS_KEY && !self.ignored.contains(key) {
                return Err(InvocationError::validation(format!("'{key}' is not allowed")));
            }
        }

        Ok(())
    }
}

impl Plugin for ValidationPlugin {
    fn kind(&self) -> PluginKind {
        PluginKind::Validation
    }

    fn is_enabled(&self) -> bool {
        self.enabled
    }

    fn state(&self) -> PluginState {
        PluginState::Validation(if self.enabled {
            ValidationState {
                enabled: true,
                keys: Some(self.schemas.keys().cloned().collect()),
                ignored: Some(self.ignored.clone()),
            }
        } else {
            ValidationState {
                enabled: false,
                keys: None,
                ignored: None,
            }
        })
    }

    fn execute<'a>(
        &'a self,
        invocation: &'a mut Invocation,
    ) -> BoxFuture<'a, Result<(), InvocationError>> {
        Box::pin(async move { self.check(invocation.event()) })
    }
}
