//! Pipeline metrics.
//!
//! Metrics are recorded through the `metrics` facade. Nothing is exported by
//! this crate: the host installs whatever recorder it uses, and without one
//! the calls are no-ops.
//!
//! # Standard Metrics
//!
//! | Metric | Type | Labels | Description |
//! |--------|------|--------|-------------|
//! | `palisade_invocations_total` | Counter | `outcome` | Terminal outcomes |
//! | `palisade_invocation_duration_seconds` | Histogram | `outcome` | Invocation latency |
//! | `palisade_plugin_rejections_total` | Counter | `plugin`, `kind` | Invocations rejected by a plugin |
//! | `palisade_sql_detections_total` | Counter | `mode` | SQL-injection signatures found |
//! | `palisade_hook_failures_total` | Counter | - | Post-handler hook failures |

use metrics::{counter, describe_counter, describe_histogram, histogram};
use std::time::Duration;

/// Terminal outcome of an invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Outcome {
    /// The user function produced a result.
    Success,
    /// The invocation was rejected or failed.
    Failure,
}

impl Outcome {
    /// Returns the label value.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Success => "success",
            Self::Failure => "failure",
        }
    }
}

/// Registers descriptions for all pipeline metrics.
///
/// Call once after installing a recorder.
pub fn describe_metrics() {
    describe_counter!(
        "palisade_invocations_total",
        "Total number of invocations by terminal outcome"
    );

    describe_histogram!(
        "palisade_invocation_duration_seconds",
        "Invocation duration in seconds"
    );

    describe_counter!(
        "palisade_plugin_rejections_total",
        "Total invocations rejected by a plugin"
    );

    describe_counter!(
        "palisade_sql_detections_total",
        "Total SQL-injection signatures found in events"
    );

    describe_counter!(
        "palisade_hook_failures_total",
        "Total post-handler hook failures"
    );
}

/// Records a terminal outcome.
///
/// Updates `palisade_invocations_total` and
/// `palisade_invocation_duration_seconds`.
pub fn record_invocation(outcome: Outcome, duration: Duration) {
    counter!("palisade_invocations_total", "outcome" => outcome.as_str()).increment(1);

    histogram!("palisade_invocation_duration_seconds", "outcome" => outcome.as_str())
        .record(duration.as_secs_f64());
}

/// Records a plugin rejection.
///
/// * `plugin` - The plugin name (e.g. "jwt")
/// * `kind` - The error kind name (e.g. "AuthenticationError")
pub fn record_plugin_rejection(plugin: &'static str, kind: &'static str) {
    counter!(
        "palisade_plugin_rejections_total",
        "plugin" => plugin,
        "kind" => kind
    )
    .increment(1);
}

/// Records a SQL-injection detection under the active protection mode.
pub fn record_sql_detection(mode: &'static str) {
    counter!("palisade_sql_detections_total", "mode" => mode).increment(1);
}

/// Records a failed post-handler hook.
pub fn record_hook_failure() {
    counter!("palisade_hook_failures_total").increment(1);
}
