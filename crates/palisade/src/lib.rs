//! # Palisade
//!
//! **Security pipeline for serverless function handlers**
//!
//! Palisade wraps a handler with a fixed chain of plugins and normalizes
//! every outcome into one terminal result:
//!
//! - 🔑 **JWT authentication** – HS/RS/PS/ES/EdDSA tokens, read from any
//!   event path, with an optional XSRF double-submit check
//! - 📐 **Schema validation** – JSON Schema per top-level event key
//! - 🛡️ **SQL-injection protection** – report or reject suspicious input
//! - 🪝 **Post-handler hook** – callback, async or sync, never able to
//!   replace a successful result
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use palisade::prelude::*;
//! use serde_json::{json, Value};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let options = PipelineOptions::new()
//!         .with_jwt(JwtOptions::new().algorithm("HS256").secret("change-me"))
//!         .with_protect(ProtectOptions::mode(ProtectMode::Fail));
//!
//!     let pipeline = Pipeline::new(&options)?;
//!     pipeline.after(PostHandler::from_sync(|| Ok::<_, std::io::Error>(())));
//!
//!     let handler = pipeline.handler(|event: Event, _ctx: InvocationContext| async move {
//!         Ok::<Value, InvocationError>(json!({ "user": event.get("jwt") }))
//!     });
//!
//!     handler
//!         .call(Event::new(), InvocationContext::new(), |result| {
//!             println!("{result:?}");
//!         })
//!         .await;
//!     Ok(())
//! }
//! ```
//!
//! ## Architecture
//!
//! ```text
//! event → jwt → validation → protect → exec → post-handler hook → result
//! ```
//!
//! Configuration merges explicit options, `PALISADE_*` environment variables
//! and defaults, in that order, per field.

#![doc(html_root_url = "https://docs.rs/palisade/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

// Re-export core types
pub use palisade_core as core;

// Re-export configuration types
pub use palisade_config as config;

// Re-export token validation types
pub use palisade_jwt as jwt;

// Re-export pipeline types
pub use palisade_middleware as middleware;

// Re-export telemetry setup
pub use palisade_telemetry as telemetry;

/// Prelude module for convenient imports.
///
/// # Example
///
/// ```rust
/// use palisade::prelude::*;
///
/// let options = PipelineOptions::new().with_protect(ProtectOptions::mode(ProtectMode::Report));
/// assert!(options.jwt.algorithm.is_none());
/// ```
pub mod prelude {
    pub use palisade_core::{
        ErrorKind, Event, InvocationContext, InvocationError, InvocationResult, RequestId,
        TokenPath,
    };

    pub use palisade_config::{
        ConfigError, JwtOptions, PipelineOptions, ProtectMode, ProtectOptions, Toggle,
        ValidationOptions,
    };

    pub use palisade_jwt::{Algorithm, JwtError, TokenVerifier};

    pub use palisade_middleware::{
        Completion, Pipeline, PipelineBuilder, PluginKind, PluginState, PostHandler,
        WrappedHandler,
    };

    pub use palisade_telemetry::{init_logging, LogConfig};
}
