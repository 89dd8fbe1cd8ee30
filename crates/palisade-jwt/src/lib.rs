//! # Palisade JWT
//!
//! Token authentication for the Palisade handler pipeline.
//!
//! A [`JwtValidator`] is resolved once from [`JwtOptions`](palisade_config::JwtOptions)
//! and the environment, then validates each inbound event:
//!
//! 1. read the token at the configured path (default `headers.jwt`),
//!    stripping a leading `"Bearer "`
//! 2. verify it through a [`TokenVerifier`] (by default
//!    [`JsonWebTokenVerifier`], backed by `jsonwebtoken`)
//! 3. when XSRF checking is on, compare the presented XSRF token with the
//!    nonce inside the claims
//! 4. store the claims under `event.jwt`
//!
//! # Example
//!
//! ```
//! use palisade_config::{ConfigResolver, JwtOptions, MapEnv};
//! use palisade_jwt::{Algorithm, JwtValidator};
//! use std::sync::Arc;
//!
//! let env = MapEnv::new()
//!     .with("PALISADE_JWT_ALGORITHM", "HS256")
//!     .with("PALISADE_JWT_SECRET", "super-secret");
//! let resolver = ConfigResolver::new(Arc::new(env));
//!
//! let validator = JwtValidator::new(&JwtOptions::new(), &resolver).unwrap();
//! let state = validator.state();
//! assert!(state.enabled);
//! assert_eq!(state.algorithm, Some(Algorithm::HS256));
//! ```

#![doc(html_root_url = "https://docs.rs/palisade-jwt/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod algorithm;
mod config;
mod error;
mod pem;
mod validator;
mod verifier;
mod xsrf;

pub use algorithm::Algorithm;
pub use config::{JwtConfig, JwtSettings};
pub use error::JwtError;
pub use pem::normalize_public_key;
pub use validator::{JwtState, JwtValidator, CLAIMS_KEY};
pub use verifier::{JsonWebTokenVerifier, TokenVerifier, DEFAULT_LEEWAY_SECS};
pub use xsrf::validate_xsrf;
