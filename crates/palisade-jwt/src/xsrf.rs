//! XSRF double-submit verification.

use crate::JwtError;
use palisade_core::{path, ClaimPath};
use serde_json::{Map, Value};
use subtle::ConstantTimeEq;

/// Checks that the claim at `claim_path` equals the presented token.
///
/// Non-string claims are compared through their JSON text, so a numeric
/// nonce `42` matches a presented `"42"`. The comparison runs in constant
/// time.
///
/// # Errors
///
/// [`JwtError::XsrfClaimMissing`] when the claim is absent,
/// [`JwtError::XsrfMismatch`] when it differs from `presented`.
pub fn validate_xsrf(
    claims: &Map<String, Value>,
    presented: &str,
    claim_path: &ClaimPath,
) -> Result<(), JwtError> {
    let expected = match path::read(claims, claim_path) {
        None | Some(Value::Null) => {
            return Err(JwtError::XsrfClaimMissing {
                claim: claim_path.clone(),
            })
        }
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
    };

    if bool::from(expected.as_bytes().ct_eq(presented.as_bytes())) {
        Ok(())
    } else {
        tracing::debug!(claim = %claim_path, "xsrf token mismatch");
        Err(JwtError::XsrfMismatch)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn claims(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            _ => unreachable!("test claims must be an object"),
        }
    }

    #[test]
    fn test_matching_nonce() {
        let claims = claims(json!({ "nonce": "abc" }));
        let path = ClaimPath::parse("nonce").unwrap();
        assert!(validate_xsrf(&claims, "abc", &path).is_ok());
    }

    #[test]
    fn test_nested_claim() {
        let claims = claims(json!({ "app-data": { "my-xsrf-token": "t0k" } }));
        let path = ClaimPath::parse("app-data.my-xsrf-token").unwrap();
        assert!(validate_xsrf(&claims, "t0k", &path).is_ok());
    }

    #[test]
    fn test_mismatch() {
        let claims = claims(json!({ "nonce": "abc" }));
        let path = ClaimPath::parse("nonce").unwrap();
        assert!(matches!(
            validate_xsrf(&claims, "abd", &path),
            Err(JwtError::XsrfMismatch)
        ));
        assert!(matches!(
            validate_xsrf(&claims, "", &path),
            Err(JwtError::XsrfMismatch)
        ));
    }

    #[test]
    fn test_missing_claim() {
        let claims = claims(json!({ "sub": "user" }));
        let path = ClaimPath::parse("nonce").unwrap();
        assert!(matches!(
            validate_xsrf(&claims, "abc", &path),
            Err(JwtError::XsrfClaimMissing { .. })
        ));
    }

    #[test]
    fn test_numeric_claim() {
        let claims = claims(json!({ "nonce": 42 }));
        let path = ClaimPath::parse("nonce").unwrap();
        assert!(validate_xsrf(&claims, "42", &path).is_ok());
    }
}
