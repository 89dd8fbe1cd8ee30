//! Configuration for the Palisade handler pipeline.
//!
//! This crate owns every configuration concern of the pipeline:
//!
//! - [`PipelineOptions`] and the per-plugin option types, loadable from
//!   JSON or TOML text and strict about unknown fields
//! - the [`Environment`] seam, with [`ProcessEnv`] for production and
//!   [`MapEnv`] for tests
//! - [`ConfigResolver`], which merges explicit options, environment
//!   variables and defaults (explicit always wins)
//! - [`ConfigError`], raised synchronously at construction time
//!
//! # Example
//!
//! ```
//! use palisade_config::{ConfigResolver, MapEnv, PipelineOptions};
//! use std::sync::Arc;
//!
//! # fn main() -> Result<(), palisade_config::ConfigError> {
//! let options = PipelineOptions::from_str(
//!     r#"{ "env": { "STAGE": "dev" }, "stripErrors": false }"#,
//!     "json",
//! )?;
//!
//! let env = Arc::new(MapEnv::new());
//! let resolver = ConfigResolver::new(env.clone());
//! resolver.apply_env(&options.env)?;
//!
//! let settings = resolver.settings(&options)?;
//! assert!(!settings.strip_errors);
//! assert!(settings.log_uncaught_exceptions);
//! # Ok(())
//! # }
//! ```
//!
//! # Environment Variables
//!
//! Each JWT option falls back to a `PALISADE_JWT_*` variable when it is not
//! given explicitly; see [`vars`] for the full list.

#![doc(html_root_url = "https://docs.rs/palisade-config/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod env;
mod error;
mod options;
mod resolver;

pub use env::{vars, Environment, MapEnv, ProcessEnv};
pub use error::ConfigError;
pub use options::{
    JwtOptions, PipelineOptions, ProtectMode, ProtectOptions, Toggle, ValidationOptions,
};
pub use resolver::{parse_bool, ConfigResolver, PipelineSettings};
