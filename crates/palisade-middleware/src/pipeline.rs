//! Fixed-order plugin pipeline.
//!
//! A [`Pipeline`] owns the configured plugins, the top-level flags and the
//! optional post-handler hook. [`Pipeline::handler`] wraps a user function
//! into a [`WrappedHandler`] that, per invocation:
//!
//! 1. runs the enabled plugins in [`PluginKind`] order, stopping at the
//!    first failure (the exec plugin runs the user function last)
//! 2. on success, runs the post-handler hook; hook failures are logged and
//!    never replace the result
//! 3. on failure, logs the error when `logUncaughtExceptions` is on and
//!    empties its stack when `stripErrors` is on
//! 4. delivers exactly one terminal result
//!
//! Configuration is snapshotted at the start of each invocation, so
//! [`Pipeline::configure`] and [`Pipeline::after`] never affect invocations
//! already in flight.

use crate::hook::PostHandler;
use crate::invocation::{Invocation, UserHandler};
use crate::plugin::{Plugin, PluginKind, PluginState};
use crate::registry::PluginRegistry;
use futures_util::FutureExt;
use palisade_config::{ConfigError, ConfigResolver, Environment, PipelineOptions, PipelineSettings};
use palisade_core::{ErrorKind, Event, InvocationContext, InvocationError};
use palisade_jwt::{JsonWebTokenVerifier, TokenVerifier};
use palisade_telemetry::metrics::{self, Outcome};
use parking_lot::RwLock;
use serde_json::Value;
use std::fmt;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use tracing::{Instrument, Level};

/// Everything an invocation needs, replaced wholesale on reconfiguration.
#[derive(Debug)]
struct PipelineState {
    registry: Arc<PluginRegistry>,
    settings: PipelineSettings,
    post_handler: Option<PostHandler>,
}

#[derive(Debug)]
struct Inner {
    resolver: ConfigResolver,
    verifier: Arc<dyn TokenVerifier>,
    state: RwLock<Arc<PipelineState>>,
}

/// The plugin pipeline.
///
/// Cheap to clone; clones share configuration.
///
/// # Example
///
/// ```
/// use palisade_config::{JwtOptions, MapEnv, PipelineOptions};
/// use palisade_middleware::{Pipeline, PluginKind};
/// use std::sync::Arc;
///
/// let options = PipelineOptions::new()
///     .with_jwt(JwtOptions::new().algorithm("HS256").secret("s3cr3t"));
/// let pipeline = Pipeline::with_environment(&options, Arc::new(MapEnv::new())).unwrap();
///
/// assert_eq!(pipeline.plugin_state(PluginKind::Jwt).to_value()["enabled"], true);
/// assert!(pipeline.strip_errors());
/// ```
#[derive(Clone)]
pub struct Pipeline {
    inner: Arc<Inner>,
}

impl Pipeline {
    /// Creates a pipeline over the process environment.
    pub fn new(options: &PipelineOptions) -> Result<Self, ConfigError> {
        Self::builder().options(options.clone()).build()
    }

    /// Creates a pipeline over the given environment.
    pub fn with_environment(
        options: &PipelineOptions,
        environment: Arc<dyn Environment>,
    ) -> Result<Self, ConfigError> {
        Self::builder()
            .options(options.clone())
            .environment(environment)
            .build()
    }

    /// Creates a builder.
    pub fn builder() -> PipelineBuilder {
        PipelineBuilder::new()
    }

    /// Replaces the plugins and flags with a fresh resolution of `options`.
    ///
    /// The `env` block is written to the environment first and is never
    /// reverted, even when resolution then fails. An `env` block with a name
    /// or value the environment cannot hold is rejected before anything is
    /// written. On failure the previous
    /// configuration stays active. The post-handler hook is kept.
    pub fn configure(&self, options: &PipelineOptions) -> Result<(), ConfigError> {
        let inner = &self.inner;
        inner.resolver.apply_env(&options.env)?;

        let registry =
            PluginRegistry::configure(options, &inner.resolver, Arc::clone(&inner.verifier))?;
        let settings = inner.resolver.settings(options)?;

        let mut state = inner.state.write();
        let post_handler = state.post_handler.clone();
        *state = Arc::new(PipelineState {
            registry: Arc::new(registry),
            settings,
            post_handler,
        });
        drop(state);

        tracing::debug!(
            strip_errors = settings.strip_errors,
            log_uncaught_exceptions = settings.log_uncaught_exceptions,
            "pipeline configured"
        );
        Ok(())
    }

    /// Replaces the post-handler hook. `None` leaves the current hook.
    pub fn after(&self, hook: impl Into<Option<PostHandler>>) -> &Self {
        if let Some(hook) = hook.into() {
            let mut state = self.inner.state.write();
            *state = Arc::new(PipelineState {
                registry: Arc::clone(&state.registry),
                settings: state.settings,
                post_handler: Some(hook),
            });
        }
        self
    }

    /// Wraps a user function.
    pub fn handler<H: UserHandler>(&self, handler: H) -> WrappedHandler {
        WrappedHandler {
            pipeline: self.clone(),
            handler: Arc::new(handler),
        }
    }

    /// Returns whether delivered errors are stripped of their stack.
    pub fn strip_errors(&self) -> bool {
        self.snapshot().settings.strip_errors
    }

    /// Returns whether invocation failures are logged.
    pub fn log_uncaught_exceptions(&self) -> bool {
        self.snapshot().settings.log_uncaught_exceptions
    }

    /// Returns whether a post-handler hook is set.
    pub fn has_post_handler(&self) -> bool {
        self.snapshot().post_handler.is_some()
    }

    /// Returns the state of one plugin.
    pub fn plugin_state(&self, kind: PluginKind) -> PluginState {
        self.snapshot().registry.get(kind).state()
    }

    /// Returns the state of every plugin, in execution order.
    pub fn states(&self) -> Vec<PluginState> {
        self.snapshot().registry.states()
    }

    /// Returns the resolver, and through it the environment.
    pub fn resolver(&self) -> &ConfigResolver {
        &self.inner.resolver
    }

    fn snapshot(&self) -> Arc<PipelineState> {
        Arc::clone(&self.inner.state.read())
    }
}

impl fmt::Debug for Pipeline {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.snapshot();
        let plugins: Vec<_> = state
            .registry
            .iter()
            .map(|plugin| (plugin.name(), plugin.is_enabled()))
            .collect();
        f.debug_struct("Pipeline")
            .field("settings", &state.settings)
            .field("plugins", &plugins)
            .field("post_handler", &state.post_handler)
            .finish_non_exhaustive()
    }
}

/// Builder for [`Pipeline`].
#[derive(Default)]
pub struct PipelineBuilder {
    options: PipelineOptions,
    environment: Option<Arc<dyn Environment>>,
    verifier: Option<Arc<dyn TokenVerifier>>,
    post_handler: Option<PostHandler>,
}

impl PipelineBuilder {
    /// Creates a builder with empty options, the process environment and
    /// the default token verifier.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the options.
    pub fn options(mut self, options: PipelineOptions) -> Self {
        self.options = options;
        self
    }

    /// Sets the environment.
    pub fn environment(mut self, environment: Arc<dyn Environment>) -> Self {
        self.environment = Some(environment);
        self
    }

    /// Replaces the token verifier.
    pub fn verifier(mut self, verifier: Arc<dyn TokenVerifier>) -> Self {
        self.verifier = Some(verifier);
        self
    }

    /// Sets the post-handler hook.
    pub fn post_handler(mut self, hook: PostHandler) -> Self {
        self.post_handler = Some(hook);
        self
    }

    /// Applies the `env` block and resolves every plugin.
    pub fn build(self) -> Result<Pipeline, ConfigError> {
        let resolver = self
            .environment
            .map_or_else(ConfigResolver::from_process, ConfigResolver::new);
        let verifier: Arc<dyn TokenVerifier> = match self.verifier {
            Some(verifier) => verifier,
            None => Arc::new(JsonWebTokenVerifier::default()),
        };

        resolver.apply_env(&self.options.env)?;
        let registry = PluginRegistry::configure(&self.options, &resolver, Arc::clone(&verifier))?;
        let settings = resolver.settings(&self.options)?;

        Ok(Pipeline {
            inner: Arc::new(Inner {
                resolver,
                verifier,
                state: RwLock::new(Arc::new(PipelineState {
                    registry: Arc::new(registry),
                    settings,
                    post_handler: self.post_handler,
                })),
            }),
        })
    }
}

impl fmt::Debug for PipelineBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PipelineBuilder")
            .field("options", &self.options)
            .field("post_handler", &self.post_handler)
            .finish_non_exhaustive()
    }
}

/// A user function wrapped by a [`Pipeline`].
#[derive(Clone)]
pub struct WrappedHandler {
    pipeline: Pipeline,
    handler: Arc<dyn UserHandler>,
}

impl WrappedHandler {
    /// Runs one invocation and returns its terminal result.
    pub async fn invoke(
        &self,
        event: Event,
        context: InvocationContext,
    ) -> Result<Value, InvocationError> {
        let state = self.pipeline.snapshot();
        let span = tracing::info_span!(
            "invocation",
            request_id = %context.request_id(),
            function = context.function_name().unwrap_or_default(),
        );

        async move {
            let mut invocation = Invocation::new(event, context, Arc::clone(&self.handler));
            let result = run_plugins(state.registry.iter(), &mut invocation)
                .await
                .and_then(|()| {
                    invocation
                        .take_result()
                        .ok_or_else(|| InvocationError::internal("user function produced no result"))
                });

            let elapsed = invocation.context().elapsed();
            match result {
                Ok(value) => {
                    if let Some(hook) = &state.post_handler {
                        run_post_handler(hook).await;
                    }
                    metrics::record_invocation(Outcome::Success, elapsed);
                    tracing::debug!(duration_ms = elapsed.as_millis(), "invocation succeeded");
                    Ok(value)
                }
                Err(err) => {
                    metrics::record_invocation(Outcome::Failure, elapsed);
                    Err(normalize_error(err, state.settings))
                }
            }
        }
        .instrument(span)
        .await
    }

    /// Runs one invocation and hands its result to `callback`.
    ///
    /// The callback is consumed, so it runs exactly once.
    pub async fn call<F>(&self, event: Event, context: InvocationContext, callback: F)
    where
        F: FnOnce(Result<Value, InvocationError>),
    {
        callback(self.invoke(event, context).await);
    }

    /// Returns the pipeline this handler runs through.
    pub const fn pipeline(&self) -> &Pipeline {
        &self.pipeline
    }
}

impl fmt::Debug for WrappedHandler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WrappedHandler")
            .field("pipeline", &self.pipeline)
            .finish_non_exhaustive()
    }
}

/// Runs the enabled plugins in order, stopping at the first failure.
///
/// A panic escaping a plugin is reported as an internal error.
async fn run_plugins<'p>(
    plugins: impl IntoIterator<Item = &'p dyn Plugin>,
    invocation: &mut Invocation,
) -> Result<(), InvocationError> {
    for plugin in plugins {
        if !plugin.is_enabled() {
            tracing::trace!(plugin = plugin.name(), "plugin disabled, skipping");
            continue;
        }

        tracing::debug!(plugin = plugin.name(), "running plugin");
        let outcome = AssertUnwindSafe(plugin.execute(invocation))
            .catch_unwind()
            .await;

        let err = match outcome {
            Ok(Ok(())) => continue,
            Ok(Err(err)) => err,
            Err(panic) => InvocationError::from_panic(ErrorKind::Internal, &*panic),
        };

        if plugin.kind() != PluginKind::Exec {
            metrics::record_plugin_rejection(plugin.name(), err.kind().name());
            tracing::debug!(plugin = plugin.name(), error = %err, "plugin rejected invocation");
        }
        return Err(err);
    }
    Ok(())
}

async fn run_post_handler(hook: &PostHandler) {
    if let Err(err) = hook.run().await {
        metrics::record_hook_failure();
        tracing::warn!(
            convention = hook.convention(),
            error_kind = err.kind().name(),
            error = %err,
            "post-handler hook failed"
        );
    }
}

/// Log level for a delivered failure: user and internal failures are errors, plugin rejections warnings.
const fn failure_level(kind: ErrorKind) -> Level {
    match kind {
        ErrorKind::User | ErrorKind::Internal => Level::ERROR,
        _ => Level::WARN,
    }
}

fn normalize_error(err: InvocationError, settings: PipelineSettings) -> InvocationError {
    if settings.log_uncaught_exceptions {
        if failure_level(err.kind()) == Level::ERROR {
            tracing::error!(
                error_kind = err.kind().name(),
                error = %err,
                stack = ?err.stack(),
                "invocation failed"
            );
        } else {
            tracing::warn!(
                error_kind = err.kind().name(),
                error = %err,
                "invocation rejected"
            );
        }
    }
    if settings.strip_errors {
        err.stripped()
    } else {
        err
    }
}
