//! Observability for the Palisade handler pipeline.
//!
//! - **Logging**: `tracing-subscriber` setup with an env filter and JSON or
//!   pretty output ([`init_logging`])
//! - **Metrics**: counters and histograms recorded through the `metrics`
//!   facade ([`metrics`])
//!
//! The pipeline crates log through `tracing` and record through the
//! functions in [`metrics`]; this crate only decides where that goes.
//!
//! # Example
//!
//! ```rust,ignore
//! use palisade_telemetry::{init_logging, LogConfig};
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     init_logging(&LogConfig::production())?;
//!     palisade_telemetry::metrics::describe_metrics();
//!     Ok(())
//! }
//! ```

#![doc(html_root_url = "https://docs.rs/palisade-telemetry/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod error;
pub mod logging;
pub mod metrics;

pub use error::TelemetryError;
pub use logging::{create_env_filter, init_logging, LogConfig, LOG_FILTER_ENV};
pub use metrics::Outcome;

/// Result type for telemetry operations.
pub type TelemetryResult<T> = Result<T, TelemetryError>;
