//! # Palisade Core
//!
//! Core types shared by every crate of the Palisade handler pipeline.
//!
//! This crate provides the foundational types used throughout Palisade:
//!
//! - [`Event`] - The inbound invocation payload, mutated in place by plugins
//! - [`TokenPath`] - Dotted addresses into nested event mappings
//! - [`InvocationContext`] - Per-invocation context (request ID, timing)
//! - [`InvocationError`] - The error delivered to the terminal callback

#![doc(html_root_url = "https://docs.rs/palisade-core/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod context;
mod error;
mod event;
pub mod path;

pub use context::{InvocationContext, RequestId};
pub use error::{BoxError, ErrorKind, InvocationError, InvocationResult};
pub use event::{Event, EventError};
pub use path::{ClaimPath, PathError, TokenPath};
