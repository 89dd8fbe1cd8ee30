//! Token decoding and verification primitives.

use crate::{xsrf, Algorithm, JwtError};
use jsonwebtoken::{decode, DecodingKey, Validation};
use palisade_core::ClaimPath;
use serde_json::{Map, Value};
use std::fmt::Debug;

/// Clock skew tolerated on `exp` and `nbf`, in seconds.
pub const DEFAULT_LEEWAY_SECS: u64 = 60;

/// The cryptographic collaborators of [`JwtValidator`](crate::JwtValidator).
///
/// `decode` verifies a token and returns its claims. `validate_xsrf`
/// compares a presented XSRF token against the decoded claims and has a
/// default implementation; override it to change the comparison.
pub trait TokenVerifier: Send + Sync + Debug {
    /// Verifies `token` with `algorithm` and `key` and returns the claims.
    fn decode(
        &self,
        token: &str,
        algorithm: Algorithm,
        key: &str,
    ) -> Result<Map<String, Value>, JwtError>;

    /// Checks the presented XSRF token against the claims.
    fn validate_xsrf(
        &self,
        claims: &Map<String, Value>,
        presented: &str,
        claim_path: &ClaimPath,
    ) -> Result<(), JwtError> {
        xsrf::validate_xsrf(claims, presented, claim_path)
    }
}

/// [`TokenVerifier`] backed by the `jsonwebtoken` crate.
///
/// `exp` and `nbf` are checked when present, with [`DEFAULT_LEEWAY_SECS`] of
/// skew. No claim is required and the audience is not checked.
#[derive(Debug, Clone)]
pub struct JsonWebTokenVerifier {
    leeway: u64,
}

impl JsonWebTokenVerifier {
    /// Creates a verifier with the default leeway.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            leeway: DEFAULT_LEEWAY_SECS,
        }
    }

    /// Sets the clock skew leeway in seconds.
    #[must_use]
    pub const fn with_leeway(mut self, leeway: u64) -> Self {
        self.leeway = leeway;
        self
    }

    fn decoding_key(algorithm: Algorithm, key: &str) -> Result<DecodingKey, JwtError> {
        use Algorithm::{EdDSA, ES256, ES384, PS256, PS384, PS512, RS256, RS384, RS512};

        let loaded = match algorithm {
            RS256 | RS384 | RS512 | PS256 | PS384 | PS512 => {
                DecodingKey::from_rsa_pem(key.as_bytes())
            }
            ES256 | ES384 => DecodingKey::from_ec_pem(key.as_bytes()),
            EdDSA => DecodingKey::from_ed_pem(key.as_bytes()),
            _ => return Ok(DecodingKey::from_secret(key.as_bytes())),
        };
        loaded.map_err(JwtError::InvalidKey)
    }
}

impl Default for JsonWebTokenVerifier {
    fn default() -> Self {
        Self::new()
    }
}

impl TokenVerifier for JsonWebTokenVerifier {
    fn decode(
        &self,
        token: &str,
        algorithm: Algorithm,
        key: &str,
    ) -> Result<Map<String, Value>, JwtError> {
        let decoding_key = Self::decoding_key(algorithm, key)?;

        let mut validation = Validation::new(algorithm.to_jsonwebtoken());
        validation.required_spec_claims.clear();
        validation.validate_aud = false;
        validation.validate_nbf = true;
        validation.leeway = self.leeway;

        let data = decode::<Map<String, Value>>(token, &decoding_key, &validation).map_err(
            |e| {
                tracing::debug!(error = %e, %algorithm, "token verification failed");
                JwtError::Verification(e)
            },
        )?;

        Ok(data.claims)
    }
}
