//! SQL-injection protection plugin.
//!
//! Every string value in the event is matched against a small set of
//! injection signatures. In `report` mode a detection is logged and counted;
//! in `fail` mode it rejects the invocation with a protection error.

use crate::invocation::Invocation;
use crate::plugin::{BoxFuture, Plugin, PluginKind, PluginState};
use palisade_config::{ConfigError, ConfigResolver, ProtectMode, ProtectOptions};
use palisade_core::{Event, InvocationError};
use regex::RegexSet;
use serde::Serialize;
use serde_json::Value;

/// Signature names and patterns, matched case-insensitively.
const SIGNATURES: &[(&str, &str)] = &[
    ("tautology", r"(?i)'\s*or\s+('[^']*'|\d+)\s*=\s*('|\d)"),
    ("union-select", r"(?i)\bunion(\s+all)?\s+select\b"),
    (
        "stacked-query",
        r"(?i);\s*(drop|delete|insert|update|alter|create|truncate|exec)\b",
    ),
    ("comment-terminator", r"(?i)'\s*(--|#|/\*)"),
    ("time-delay", r"(?i)\b(sleep|benchmark|pg_sleep)\s*\("),
];

/// A signature match inside the event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SqlDetection {
    /// Dotted location of the offending value (array indices included).
    pub path: String,
    /// Name of the matching signature.
    pub signature: &'static str,
}

/// Matches string values against injection signatures.
#[derive(Debug, Clone)]
pub struct SqlScanner {
    set: RegexSet,
}

impl SqlScanner {
    /// Compiles the signature set.
    pub fn new() -> Result<Self, regex::Error> {
        let set = RegexSet::new(SIGNATURES.iter().map(|(_, pattern)| *pattern))?;
        Ok(Self { set })
    }

    /// Returns the name of the first signature matching `input`.
    pub fn matches(&self, input: &str) -> Option<&'static str> {
        self.set
            .matches(input)
            .iter()
            .next()
            .map(|index| SIGNATURES[index].0)
    }

    /// Scans every string in the event, in key order.
    pub fn scan(&self, event: &Event) -> Vec<SqlDetection> {
        let mut found = Vec::new();
        for (key, value) in event.iter() {
            self.scan_value(key.clone(), value, &mut found);
        }
        found
    }

    fn scan_value(&self, path: String, value: &Value, found: &mut Vec<SqlDetection>) {
        match value {
            Value::String(s) => {
                if let Some(signature) = self.matches(s) {
                    found.push(SqlDetection { path, signature });
                }
            }
            Value::Array(items) => {
                for (index, item) in items.iter().enumerate() {
                    self.scan_value(format!("{path}.{index}"), item, found);
                }
            }
            Value::Object(map) => {
                for (key, item) in map {
                    self.scan_value(format!("{path}.{key}"), item, found);
                }
            }
            Value::Null | Value::Bool(_) | Value::Number(_) => {}
        }
    }
}

/// State of the SQL scan.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SqlState {
    /// Whether the scan runs.
    pub enabled: bool,
    /// The active mode.
    pub mode: ProtectMode,
}

/// Observable state of the protection plugin.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProtectState {
    /// SQL-injection scan.
    pub sql: SqlState,
}

/// Rejects or reports events carrying SQL-injection signatures.
#[derive(Debug, Clone)]
pub struct ProtectPlugin {
    mode: ProtectMode,
    scanner: SqlScanner,
}

impl ProtectPlugin {
    /// Resolves the mode (explicit option, then `PALISADE_PROTECT_MODE`, then
    /// `report`) and compiles the scanner.
    pub fn configure(
        options: &ProtectOptions,
        resolver: &ConfigResolver,
    ) -> Result<Self, ConfigError> {
        let mode = resolver.protect_mode(options)?;
        let scanner = SqlScanner::new()
            .map_err(|e| ConfigError::invalid_value("protect.signatures", e.to_string()))?;
        Ok(Self { mode, scanner })
    }

    /// Returns the active mode.
    pub const fn mode(&self) -> ProtectMode {
        self.mode
    }

    /// Scans the event and applies the mode.
    pub fn check(&self, event: &Event) -> Result<(), InvocationError> {
        if self.mode == ProtectMode::Disabled {
            return Ok(());
        }

        let detections = self.scanner.scan(event);
        let Some(first) = detections.first() else {
            return Ok(());
        };

        for detection in &detections {
            palisade_telemetry::metrics::record_sql_detection(self.mode.as_str());
            tracing::warn!(
                path = %detection.path,
                signature = detection.signature,
                mode = %self.mode,
                "possible SQL injection"
            );
        }

        match self.mode {
            ProtectMode::Fail => Err(InvocationError::protection(format!(
                "possible SQL injection in '{}'",
                first.path
            ))),
            ProtectMode::Report | ProtectMode::Disabled => Ok(()),
        }
    }
}

impl Plugin for ProtectPlugin {
    fn kind(&self) -> PluginKind {
        PluginKind::Protect
    }

    fn is_enabled(&self) -> bool {
        self.mode != ProtectMode::Disabled
    }

    fn state(&self) -> PluginState {
        PluginState::Protect(ProtectState {
            sql: SqlState {
                enabled: self.is_enabled(),
                mode: self.mode,
            },
        })
    }

    fn execute<'a>(
        &'a self,
        invocation: &'a mut Invocation,
    ) -> BoxFuture<'a, Result<(), InvocationError>> {
        Box::pin(async move { self.check(invocation.event()) })
    }
}
