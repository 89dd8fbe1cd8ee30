//! Integration tests for `JwtValidator::validate`.
//!
//! The cryptographic primitives are replaced by a recording stub so each test
//! can assert exactly what the validator delegated, and in which order.

use palisade_config::{ConfigResolver, JwtOptions, MapEnv};
use palisade_core::{ClaimPath, Event};
use palisade_jwt::{Algorithm, JwtError, JwtValidator, TokenVerifier};
use parking_lot::Mutex;
use serde_json::{json, Map, Value};
use std::sync::Arc;

/// A call made to the stub.
#[derive(Debug, Clone, PartialEq)]
enum Call {
    Decode {
        token: String,
        algorithm: Algorithm,
        key: String,
    },
    Xsrf {
        claims: Map<String, Value>,
        presented: String,
        claim_path: Vec<String>,
    },
}

/// Records every call and answers with canned results.
#[derive(Debug)]
struct RecordingVerifier {
    calls: Mutex<Vec<Call>>,
    claims: Map<String, Value>,
    fail_decode: bool,
    fail_xsrf: bool,
}

impl RecordingVerifier {
    /// A stub whose decode returns `claims`.
    fn returning(claims: Value) -> Self {
        let Value::Object(claims) = claims else {
            panic!("claims must be an object");
        };
        Self {
            calls: Mutex::new(Vec::new()),
            claims,
            fail_decode: false,
            fail_xsrf: false,
        }
    }

    fn failing_decode(mut self) -> Self {
        self.fail_decode = true;
        self
    }

    fn failing_xsrf(mut self) -> Self {
        self.fail_xsrf = true;
        self
    }

    fn calls(&self) -> Vec<Call> {
        self.calls.lock().clone()
    }
}

impl TokenVerifier for RecordingVerifier {
    fn decode(
        &self,
        token: &str,
        algorithm: Algorithm,
        key: &str,
    ) -> Result<Map<String, Value>, JwtError> {
        self.calls.lock().push(Call::Decode {
            token: token.to_string(),
            algorithm,
            key: key.to_string(),
        });
        if self.fail_decode {
            return Err(JwtError::rejected("bad signature"));
        }
        Ok(self.claims.clone())
    }

    fn validate_xsrf(
        &self,
        claims: &Map<String, Value>,
        presented: &str,
        claim_path: &ClaimPath,
    ) -> Result<(), JwtError> {
        self.calls.lock().push(Call::Xsrf {
            claims: claims.clone(),
            presented: presented.to_string(),
            claim_path: claim_path.segments().to_vec(),
        });
        if self.fail_xsrf {
            return Err(JwtError::XsrfMismatch);
        }
        Ok(())
    }
}

/// Builds a validator over an empty environment and the given stub.
fn validator(options: JwtOptions, stub: &Arc<RecordingVerifier>) -> JwtValidator {
    let resolver = ConfigResolver::new(Arc::new(MapEnv::new()));
    JwtValidator::with_verifier(&options, &resolver, stub.clone()).unwrap()
}

fn event(value: Value) -> Event {
    Event::try_from(value).unwrap()
}

fn decoded() -> Value {
    json!({ "claim1": 1, "claim2": 2 })
}

#[test]
fn test_disabled_makes_no_calls() {
    let stub = Arc::new(RecordingVerifier::returning(decoded()));
    let validator = validator(JwtOptions::new(), &stub);

    let mut e = Event::new();
    validator.validate(&mut e).unwrap();

    assert!(e.is_empty());
    assert!(stub.calls().is_empty());
}

#[test]
fn test_enabled_without_xsrf() {
    let stub = Arc::new(RecordingVerifier::returning(json!({ "a": 1 })));
    let validator = validator(
        JwtOptions::new()
            .algorithm("HS256")
            .key("super-secret")
            .token("headers.jwt"),
        &stub,
    );

    let mut e = event(json!({ "headers": { "jwt": "X" } }));
    validator.validate(&mut e).unwrap();

    assert_eq!(e.get("jwt"), Some(&json!({ "a": 1 })));
    assert_eq!(e.read(&"headers.jwt".parse().unwrap()), Some(&json!("X")));
    assert_eq!(
        stub.calls(),
        vec![Call::Decode {
            token: "X".into(),
            algorithm: Algorithm::HS256,
            key: "super-secret".into(),
        }]
    );
}

#[test]
fn test_bearer_prefix_stripped() {
    let stub = Arc::new(RecordingVerifier::returning(decoded()));
    let validator = validator(
        JwtOptions::new()
            .algorithm("HS256")
            .key("super-secret")
            .token("headers.Authorization"),
        &stub,
    );

    let mut e = event(json!({ "headers": { "Authorization": "Bearer jwt-here" } }));
    validator.validate(&mut e).unwrap();

    assert!(matches!(
        &stub.calls()[0],
        Call::Decode { token, .. } if token == "jwt-here"
    ));
    assert_eq!(e.get("jwt"), Some(&decoded()));
}

#[test]
fn test_bearer_prefix_is_exact() {
    let stub = Arc::new(RecordingVerifier::returning(decoded()));
    let validator = validator(JwtOptions::new().algorithm("HS256").secret("s"), &stub);

    for raw in ["bearer jwt-here", "Bearerjwt-here", "jwt-here", " Bearer jwt-here"] {
        let mut e = event(json!({ "headers": { "jwt": raw } }));
        validator.validate(&mut e).unwrap();
    }

    let tokens: Vec<String> = stub
        .calls()
        .into_iter()
        .filter_map(|call| match call {
            Call::Decode { token, .. } => Some(token),
            Call::Xsrf { .. } => None,
        })
        .collect();
    assert_eq!(
        tokens,
        vec!["bearer jwt-here", "Bearerjwt-here", "jwt-here", " Bearer jwt-here"]
    );
}

#[test]
fn test_xsrf_called_after_decode_with_exact_arguments() {
    let stub = Arc::new(RecordingVerifier::returning(decoded()));
    let validator = validator(
        JwtOptions::new()
            .algorithm("HS256")
            .key("super-secret")
            .xsrf(true)
            .xsrf_token("headers.xsrf"),
        &stub,
    );

    let mut e = event(json!({ "headers": { "jwt": "jwt-here", "xsrf": "xsrfTokenHere" } }));
    validator.validate(&mut e).unwrap();

    let Value::Object(claims) = decoded() else {
        unreachable!()
    };
    assert_eq!(
        stub.calls(),
        vec![
            Call::Decode {
                token: "jwt-here".into(),
                algorithm: Algorithm::HS256,
                key: "super-secret".into(),
            },
            Call::Xsrf {
                claims,
                presented: "xsrfTokenHere".into(),
                claim_path: vec!["nonce".into()],
            },
        ]
    );
    assert_eq!(e.get("jwt"), Some(&decoded()));
}

#[test]
fn test_decode_failure_skips_xsrf_and_propagates() {
    let stub = Arc::new(RecordingVerifier::returning(decoded()).failing_decode());
    let validator = validator(
        JwtOptions::new().algorithm("HS256").secret("s").xsrf(true),
        &stub,
    );

    let mut e = event(json!({ "headers": { "jwt": "jwt-here", "xsrf": "x" } }));
    let err = validator.validate(&mut e).unwrap_err();

    assert!(matches!(err, JwtError::Rejected(ref m) if m == "bad signature"));
    assert_eq!(stub.calls().len(), 1);
    assert!(!e.contains_key("jwt"));
}

#[test]
fn test_xsrf_failure_propagates() {
    let stub = Arc::new(RecordingVerifier::returning(decoded()).failing_xsrf());
    let validator = validator(
        JwtOptions::new().algorithm("HS256").secret("s").xsrf(true),
        &stub,
    );

    let mut e = event(json!({ "headers": { "jwt": "jwt-here", "xsrf": "x" } }));
    assert!(matches!(
        validator.validate(&mut e),
        Err(JwtError::XsrfMismatch)
    ));
}

#[test]
fn test_missing_xsrf_token() {
    let stub = Arc::new(RecordingVerifier::returning(decoded()));
    let validator = validator(
        JwtOptions::new().algorithm("HS256").secret("s").xsrf(true),
        &stub,
    );

    let mut e = event(json!({ "headers": { "jwt": "jwt-here" } }));
    assert!(matches!(
        validator.validate(&mut e),
        Err(JwtError::MissingXsrfToken { .. })
    ));
    assert_eq!(stub.calls().len(), 1);
}

#[test]
fn test_missing_token_makes_no_calls() {
    let stub = Arc::new(RecordingVerifier::returning(decoded()));
    let validator = validator(JwtOptions::new().algorithm("HS256").secret("s"), &stub);

    let mut e = event(json!({ "headers": {} }));
    assert!(matches!(
        validator.validate(&mut e),
        Err(JwtError::MissingToken { .. })
    ));
    assert!(stub.calls().is_empty());
}

#[test]
fn test_real_verifier_with_xsrf() {
    use jsonwebtoken::{encode, EncodingKey, Header};

    let token = encode(
        &Header::new(jsonwebtoken::Algorithm::HS384),
        &json!({ "sub": "user-1", "nonce": "n0nce" }),
        &EncodingKey::from_secret(b"my-super-secret"),
    )
    .unwrap();

    let resolver = ConfigResolver::new(Arc::new(MapEnv::new()));
    let validator = JwtValidator::new(
        &JwtOptions::new()
            .algorithm("HS384")
            .secret("my-super-secret")
            .token("headers.Authorization")
            .xsrf(true),
        &resolver,
    )
    .unwrap();

    let mut e = event(json!({
        "headers": { "Authorization": format!("Bearer {token}"), "xsrf": "n0nce" }
    }));
    validator.validate(&mut e).unwrap();
    assert_eq!(e.read(&"jwt.sub".parse().unwrap()), Some(&json!("user-1")));

    let mut forged = event(json!({
        "headers": { "Authorization": format!("Bearer {token}"), "xsrf": "other" }
    }));
    assert!(matches!(
        validator.validate(&mut forged),
        Err(JwtError::XsrfMismatch)
    ));
}
