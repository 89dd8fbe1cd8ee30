//! # Palisade Middleware
//!
//! Plugin pipeline and handler wrapper for Palisade.
//!
//! A [`Pipeline`] wraps a user function with a fixed chain of plugins. The
//! order cannot be changed; individual plugins are enabled or disabled by
//! configuration.
//!
//! ## Plugins
//!
//! ```text
//! event → jwt → validation → protect → exec (user function) → post-handler hook
//!                                                       ↓
//!                               exactly one terminal result
//! ```
//!
//! | Step | Plugin     | Purpose                                        |
//! |------|------------|------------------------------------------------|
//! | 1    | jwt        | Token authentication and XSRF double-submit    |
//! | 2    | validation | JSON Schema validation of top-level event keys |
//! | 3    | protect    | SQL-injection detection (report or fail)       |
//! | 4    | exec       | Runs the user function                         |
//!
//! ## Example
//!
//! ```
//! use palisade_config::{MapEnv, PipelineOptions};
//! use palisade_core::{Event, InvocationContext, InvocationError};
//! use palisade_middleware::{Pipeline, PluginKind};
//! use serde_json::{json, Value};
//! use std::sync::Arc;
//!
//! # tokio_test::block_on(async {
//! let pipeline = Pipeline::with_environment(&PipelineOptions::new(), Arc::new(MapEnv::new()))?;
//! let handler = pipeline.handler(|event: Event, _ctx: InvocationContext| async move {
//!     Ok::<Value, InvocationError>(json!({ "keys": event.len() }))
//! });
//!
//! let result = handler.invoke(Event::new(), InvocationContext::new()).await;
//! assert_eq!(result.unwrap(), json!({ "keys": 0 }));
//! assert_eq!(PluginKind::all()[3].name(), "exec");
//! # Ok::<(), palisade_config::ConfigError>(())
//! # }).unwrap();
//! ```

#![doc(html_root_url = "https://docs.rs/palisade-middleware/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod hook;
pub mod invocation;
pub mod pipeline;
pub mod plugin;
pub mod plugins;
pub mod registry;

// Re-export main types at crate root
pub use hook::{Completion, PostHandler};
pub use invocation::{HandlerFuture, Invocation, UserHandler};
pub use pipeline::{Pipeline, PipelineBuilder, WrappedHandler};
pub use plugin::{BoxFuture, Plugin, PluginKind, PluginState};
pub use plugins::{
    ExecPlugin, ExecState, JwtPlugin, ProtectPlugin, ProtectState, SqlDetection, SqlScanner,
    SqlState, ValidationPlugin, ValidationState,
};
pub use registry::PluginRegistry;
