//! End-to-end pipeline integration tests.
//!
//! These tests drive wrapped handlers through the whole plugin chain:
//!
//! 1. JWT - token authentication and XSRF check
//! 2. Validation - schema validation of the event
//! 3. Protect - SQL-injection detection
//! 4. Exec - the user function
//!
//! followed by the post-handler hook and error normalization.

use jsonwebtoken::{encode, EncodingKey, Header};
use palisade_config::{
    Environment, JwtOptions, MapEnv, PipelineOptions, ProtectMode, ProtectOptions,
    ValidationOptions,
};
use palisade_core::{ErrorKind, Event, InvocationContext, InvocationError};
use palisade_middleware::{Completion, Pipeline, PluginKind, PostHandler, WrappedHandler};
use serde_json::{json, Value};
use std::io;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

const SECRET: &str = "e2e-secret";

fn pipeline(options: &PipelineOptions) -> Pipeline {
    Pipeline::with_environment(options, Arc::new(MapEnv::new())).unwrap()
}

async fn ok_handler(_event: Event, _ctx: InvocationContext) -> Result<Value, InvocationError> {
    Ok(json!("ok"))
}

async fn bang_handler(_event: Event, _ctx: InvocationContext) -> Result<Value, io::Error> {
    Err(io::Error::other("bang"))
}

fn event(value: Value) -> Event {
    Event::try_from(value).unwrap()
}

/// Invokes through the callback form and asserts it fired exactly once.
async fn call_once(handler: &WrappedHandler, e: Event) -> Result<Value, InvocationError> {
    let calls = AtomicUsize::new(0);
    let mut delivered = None;
    handler
        .call(e, InvocationContext::new(), |result| {
            calls.fetch_add(1, Ordering::SeqCst);
            delivered = Some(result);
        })
        .await;
    assert_eq!(calls.load(Ordering::SeqCst), 1);
    delivered.unwrap()
}

fn token(claims: &Value) -> String {
    encode(
        &Header::default(),
        claims,
        &EncodingKey::from_secret(SECRET.as_bytes()),
    )
    .unwrap()
}

// ============================================================================
// Terminal result
// ============================================================================

#[tokio::test]
async fn test_success_delivers_result() {
    let handler = pipeline(&PipelineOptions::new()).handler(ok_handler);
    assert_eq!(call_once(&handler, Event::new()).await.unwrap(), json!("ok"));
}

#[tokio::test]
async fn test_user_error_is_stripped_by_default() {
    let handler = pipeline(&PipelineOptions::new()).handler(bang_handler);

    let err = call_once(&handler, Event::new()).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::User);
    assert_eq!(err.message(), "bang");
    assert!(err.stack().is_empty());
}

#[tokio::test]
async fn test_user_error_keeps_stack_without_stripping() {
    let options = PipelineOptions::new().strip_errors(false);
    let handler = pipeline(&options).handler(bang_handler);

    let err = call_once(&handler, Event::new()).await.unwrap_err();
    assert_eq!(err.message(), "bang");
    assert!(!err.stack().is_empty());
}

#[tokio::test]
async fn test_flags_accept_boolean_strings() {
    let options = PipelineOptions::new()
        .strip_errors("no")
        .log_uncaught_exceptions("off");
    let p = pipeline(&options);
    assert!(!p.strip_errors());
    assert!(!p.log_uncaught_exceptions());

    let err = call_once(&p.handler(bang_handler), Event::new())
        .await
        .unwrap_err();
    assert!(!err.stack().is_empty());
}

#[tokio::test]
async fn test_user_panic_is_user_error() {
    let handler = pipeline(&PipelineOptions::new()).handler(
        |e: Event, _c: InvocationContext| async move {
            if e.is_empty() {
                panic!("user code exploded");
            }
            Ok::<_, InvocationError>(Value::Null)
        },
    );

    let err = call_once(&handler, Event::new()).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::User);
    assert_eq!(err.message(), "user code exploded");
}

#[tokio::test]
async fn test_context_reaches_user_function() {
    let handler = pipeline(&PipelineOptions::new()).handler(
        |_e: Event, ctx: InvocationContext| async move {
            Ok::<_, InvocationError>(json!(ctx.function_name()))
        },
    );

    let ctx = InvocationContext::new().with_function_name("greet");
    assert_eq!(
        handler.invoke(Event::new(), ctx).await.unwrap(),
        json!("greet")
    );
}

// ============================================================================
// Post-handler hook
// ============================================================================

fn hooks() -> Vec<(&'static str, PostHandler)> {
    vec![
        ("async ok", PostHandler::from_async(|| async { Ok::<_, io::Error>(()) })),
        (
            "async reject",
            PostHandler::from_async(|| async { Err::<(), _>(io::Error::other("rejected")) }),
        ),
        ("callback ok", PostHandler::callback(Completion::done)),
        (
            "callback error",
            PostHandler::callback(|done| done.fail(io::Error::other("callback failure"))),
        ),
        ("callback dropped", PostHandler::callback(drop)),
        (
            "sync error",
            PostHandler::from_sync(|| Err::<(), _>(io::Error::other("sync failure"))),
        ),
        (
            "sync panic",
            PostHandler::from_sync(|| -> Result<(), io::Error> { panic!("hook exploded") }),
        ),
    ]
}

#[tokio::test]
async fn test_hook_failures_never_replace_success() {
    for (name, hook) in hooks() {
        let p = pipeline(&PipelineOptions::new());
        p.after(hook);

        let result = call_once(&p.handler(ok_handler), Event::new()).await;
        assert_eq!(result.unwrap(), json!("ok"), "hook: {name}");
    }
}

#[tokio::test]
async fn test_hook_runs_once_after_success_only() {
    let runs = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&runs);
    let p = pipeline(&PipelineOptions::new());
    p.after(PostHandler::from_sync(move || {
        counter.fetch_add(1, Ordering::SeqCst);
        Ok::<_, io::Error>(())
    }));

    call_once(&p.handler(ok_handler), Event::new()).await.unwrap();
    assert_eq!(runs.load(Ordering::SeqCst), 1);

    call_once(&p.handler(bang_handler), Event::new())
        .await
        .unwrap_err();
    assert_eq!(runs.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_hook_survives_configure() {
    let runs = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&runs);
    let p = pipeline(&PipelineOptions::new());
    p.after(PostHandler::from_sync(move || {
        counter.fetch_add(1, Ordering::SeqCst);
        Ok::<_, io::Error>(())
    }));

    p.configure(&PipelineOptions::new().strip_errors(false))
        .unwrap();
    p.after(None::<PostHandler>);
    assert!(p.has_post_handler());

    call_once(&p.handler(ok_handler), Event::new()).await.unwrap();
    assert_eq!(runs.load(Ordering::SeqCst), 1);
}

// ============================================================================
// Configuration and state
// ============================================================================

fn full_options() -> PipelineOptions {
    PipelineOptions::new()
        .with_jwt(
            JwtOptions::new()
                .algorithm("HS256")
                .secret(SECRET)
                .token("headers.Authorization")
                .xsrf(true),
        )
        .with_validation(
            ValidationOptions::new()
                .field("name", json!({ "type": "string" }))
                .ignore("age"),
        )
        .with_protect(ProtectOptions::mode(ProtectMode::Fail))
        .with_env("MEANING_OF_LIFE", "42")
}

#[test]
fn test_states_with_configuration() {
    let env = Arc::new(MapEnv::new());
    let p = Pipeline::with_environment(&full_options(), env.clone()).unwrap();

    assert_eq!(
        p.plugin_state(PluginKind::Jwt).to_value(),
        json!({
            "enabled": true,
            "algorithm": "HS256",
            "key": SECRET,
            "tokenName": "Authorization",
            "xsrf": true,
            "xsrfTokenName": "xsrf",
            "xsrfClaimName": "nonce",
        })
    );
    assert_eq!(
        p.plugin_state(PluginKind::Validation).to_value(),
        json!({ "enabled": true, "keys": ["name"], "ignored": ["age"] })
    );
    assert_eq!(
        p.plugin_state(PluginKind::Protect).to_value(),
        json!({ "sql": { "enabled": true, "mode": "fail" } })
    );
    assert_eq!(
        p.plugin_state(PluginKind::Exec).to_value(),
        json!({ "enabled": true })
    );
    assert_eq!(env.var("MEANING_OF_LIFE").as_deref(), Some("42"));
}

#[test]
fn test_empty_reconfigure_resets_state_but_keeps_env() {
    let env = Arc::new(MapEnv::new());
    let p = Pipeline::with_environment(&full_options(), env.clone()).unwrap();

    p.configure(&PipelineOptions::new()).unwrap();

    let states: Vec<Value> = p.states().iter().map(|s| s.to_value()).collect();
    assert_eq!(
        states,
        vec![
            json!({ "enabled": false }),
            json!({ "enabled": false }),
            json!({ "sql": { "enabled": true, "mode": "report" } }),
            json!({ "enabled": true }),
        ]
    );
    assert!(p.strip_errors());
    assert!(p.log_uncaught_exceptions());
    assert_eq!(env.var("MEANING_OF_LIFE").as_deref(), Some("42"));
}

#[test]
fn test_env_block_feeds_plugin_resolution() {
    let env = Arc::new(MapEnv::new());
    let options = PipelineOptions::new()
        .with_env("PALISADE_JWT_ALGORITHM", "HS512")
        .with_env("PALISADE_JWT_SECRET", "from-env");
    let p = Pipeline::with_environment(&options, env).unwrap();

    let state = p.plugin_state(PluginKind::Jwt).to_value();
    assert_eq!(state["algorithm"], "HS512");
    assert_eq!(state["key"], "from-env");
}

#[test]
fn test_later_env_value_overwrites() {
    let env = Arc::new(MapEnv::new());
    let p = Pipeline::with_environment(&PipelineOptions::new().with_env("STAGE", "dev"), env.clone())
        .unwrap();
    p.configure(&PipelineOptions::new().with_env("STAGE", "prod"))
        .unwrap();
    assert_eq!(env.var("STAGE").as_deref(), Some("prod"));
}

#[test]
fn test_unstorable_env_block_fails_configuration() {
    for (name, value) in [("", "1"), ("BAD=NAME", "1"), ("PALISADE_NUL", "a\0b")] {
        let options = PipelineOptions::new().with_env(name, value);
        let err = Pipeline::new(&options).unwrap_err();
        assert!(err.to_string().contains("env"), "{err}");
    }
}

#[test]
fn test_options_from_toml() {
    let options = PipelineOptions::from_str(
        r#"
        stripErrors = "no"

        [protect]
        mode = "fail"

        [jwt]
        algorithm = "HS384"
        secret = "toml-secret"
        "#,
        "toml",
    )
    .unwrap();
    let p = pipeline(&options);

    assert!(!p.strip_errors());
    assert_eq!(
        p.plugin_state(PluginKind::Jwt).to_value()["algorithm"],
        "HS384"
    );
    assert_eq!(
        p.plugin_state(PluginKind::Protect).to_value()["sql"]["mode"],
        "fail"
    );
}

// ============================================================================
// Plugin rejections
// ============================================================================

#[tokio::test]
async fn test_jwt_round_trip_with_xsrf() {
    let mut options = full_options();
    options.validation.ignore.push("headers".to_string());
    let p = pipeline(&options);
    let handler = p.handler(|e: Event, _c: InvocationContext| async move {
        Ok::<_, InvocationError>(e.get("jwt").cloned().unwrap_or_default())
    });

    let t = token(&json!({ "sub": "user-1", "nonce": "n0nce" }));
    let ok = event(json!({
        "headers": { "Authorization": format!("Bearer {t}"), "xsrf": "n0nce" },
        "name": "Ada",
        "age": 36,
    }));
    let claims = call_once(&handler, ok).await.unwrap();
    assert_eq!(claims["sub"], "user-1");
}

#[tokio::test]
async fn test_jwt_rejections_skip_user_function() {
    let runs = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&runs);
    let p = pipeline(&full_options());
    let handler = p.handler(move |_e: Event, _c: InvocationContext| {
        counter.fetch_add(1, Ordering::SeqCst);
        async { Ok::<_, InvocationError>(json!("ok")) }
    });

    let t = token(&json!({ "sub": "user-1", "nonce": "n0nce" }));
    let cases = [
        json!({ "headers": {} }),
        json!({ "headers": { "Authorization": "Bearer not-a-jwt", "xsrf": "n0nce" } }),
        json!({ "headers": { "Authorization": format!("Bearer {t}"), "xsrf": "forged" } }),
        json!({ "headers": { "Authorization": format!("Bearer {t}") } }),
    ];

    for case in cases {
        let err = call_once(&handler, event(case.clone())).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Authentication, "event: {case}");
    }
    assert_eq!(runs.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_validation_rejects() {
    let options = PipelineOptions::new().with_validation(
        ValidationOptions::new()
            .required_field("name", json!({ "type": "string", "minLength": 1 }))
            .ignore("headers"),
    );
    let handler = pipeline(&options).handler(ok_handler);

    let missing = call_once(&handler, event(json!({ "headers": {} })))
        .await
        .unwrap_err();
    assert_eq!(missing.kind(), ErrorKind::Validation);
    assert_eq!(missing.message(), "'name' is required");

    let unknown = call_once(&handler, event(json!({ "name": "Ada", "role": "admin" })))
        .await
        .unwrap_err();
    assert_eq!(unknown.message(), "'role' is not allowed");

    let invalid = call_once(&handler, event(json!({ "name": 7 })))
        .await
        .unwrap_err();
    assert_eq!(invalid.kind(), ErrorKind::Validation);

    assert_eq!(
        call_once(&handler, event(json!({ "name": "Ada" }))).await.unwrap(),
        json!("ok")
    );
}

#[tokio::test]
async fn test_protect_modes() {
    let injection = json!({ "query": "1; DROP TABLE users" });

    let report = pipeline(&PipelineOptions::new()).handler(ok_handler);
    assert_eq!(
        call_once(&report, event(injection.clone())).await.unwrap(),
        json!("ok")
    );

    let fail = pipeline(&PipelineOptions::new().with_protect(ProtectOptions::mode(ProtectMode::Fail)))
        .handler(ok_handler);
    let err = call_once(&fail, event(injection.clone())).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Protection);
    assert!(err.stack().is_empty());

    let env = Arc::new(MapEnv::new().with("PALISADE_PROTECT_MODE", "disabled"));
    let disabled = Pipeline::with_environment(&PipelineOptions::new(), env)
        .unwrap()
        .handler(ok_handler);
    assert!(call_once(&disabled, event(injection)).await.is_ok());
}

#[tokio::test]
async fn test_configure_applies_to_existing_handlers() {
    let p = pipeline(&PipelineOptions::new());
    let handler = p.handler(ok_handler);
    let injection = event(json!({ "q": "x' or 1=1" }));

    assert!(call_once(&handler, injection.clone()).await.is_ok());

    p.configure(&PipelineOptions::new().with_protect(ProtectOptions::mode(ProtectMode::Fail)))
        .unwrap();
    assert_eq!(
        call_once(&handler, injection).await.unwrap_err().kind(),
        ErrorKind::Protection
    );
}

#[tokio::test]
async fn test_concurrent_invocations_are_independent() {
    let p = pipeline(&PipelineOptions::new());
    let handler = p.handler(|e: Event, _c: InvocationContext| async move {
        tokio::task::yield_now().await;
        Ok::<_, InvocationError>(e.get("n").cloned().unwrap_or_default())
    });

    let tasks: Vec<_> = (0..16)
        .map(|n| {
            let handler = handler.clone();
            tokio::spawn(async move {
                handler
                    .invoke(event(json!({ "n": n })), InvocationContext::new())
                    .await
            })
        })
        .collect();

    for (n, task) in tasks.into_iter().enumerate() {
        assert_eq!(task.await.unwrap().unwrap(), json!(n));
    }
}
