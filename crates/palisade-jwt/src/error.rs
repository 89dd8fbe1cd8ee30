//! JWT validation errors.

use palisade_core::{ErrorKind, InvocationError, TokenPath};
use thiserror::Error;

/// Errors raised while validating a token.
///
/// Every variant is an authentication failure from the caller's point of
/// view; the pipeline reports it as `AuthenticationError`.
#[derive(Error, Debug)]
pub enum JwtError {
    /// No string token at the configured path.
    #[error("missing jwt token at '{path}'")]
    MissingToken {
        /// Where the token was expected.
        path: TokenPath,
    },

    /// No string XSRF token at the configured path.
    #[error("missing xsrf token")]
    MissingXsrfToken {
        /// Where the XSRF token was expected.
        path: TokenPath,
    },

    /// The decoded claims have no value at the XSRF claim path.
    #[error("xsrf claim missing")]
    XsrfClaimMissing {
        /// The claim path that was read.
        claim: TokenPath,
    },

    /// The presented XSRF token does not match the claim.
    #[error("xsrf token mismatch")]
    XsrfMismatch,

    /// Signature, format or time-based verification failed.
    #[error("token verification failed: {0}")]
    Verification(#[from] jsonwebtoken::errors::Error),

    /// The configured key could not be loaded for the algorithm.
    #[error("invalid verification key: {0}")]
    InvalidKey(#[source] jsonwebtoken::errors::Error),

    /// Rejection reported by a custom verifier.
    #[error("{0}")]
    Rejected(String),
}

impl JwtError {
    /// Creates a rejection with a custom message.
    pub fn rejected(message: impl Into<String>) -> Self {
        Self::Rejected(message.into())
    }
}

impl From<JwtError> for InvocationError {
    #[track_caller]
    fn from(err: JwtError) -> Self {
        Self::from_source(ErrorKind::Authentication, err)
    }
}
