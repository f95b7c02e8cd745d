//! Builder API for constructing sessions.
//!
//! [`LoadBuilder`] gathers the caller-owned collaborators and the session
//! configuration, validates them, and starts the session inside the
//! caller's cancellation scope.

pub mod error;

pub use error::BuildError;

use crate::config::SessionConfig;
use crate::session::Session;
use crate::source::{failure_handler, FailureHandler, Fetch, Observe};
use std::fmt::Debug;
use std::future::Future;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// Fluent builder for a [`Session`].
///
/// # Example
///
/// ```rust
/// use std::time::Duration;
/// use tidemark::builder::LoadBuilder;
/// use tidemark::source::WatchSource;
/// use tokio_util::sync::CancellationToken;
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() {
/// let (_cache, rx) = tokio::sync::watch::channel(None::<String>);
/// let scope = CancellationToken::new();
///
/// let session = LoadBuilder::new()
///     .name("profile")
///     .grace_period(Duration::from_secs(1))
///     .observe(WatchSource::new(rx))
///     .fetch(|| async { Ok::<_, String>("fresh".to_string()) })
///     .on_failure(|error: String| async move { eprintln!("refresh failed: {error}") })
///     .build(&scope)
///     .unwrap();
///
/// session.refresh();
/// scope.cancel();
/// # }
/// ```
pub struct LoadBuilder<T, E> {
    observe: Option<Box<dyn Observe<T>>>,
    fetch: Option<Box<dyn Fetch<T, E>>>,
    on_failure: Option<FailureHandler<E>>,
    config: SessionConfig,
}

impl<T, E> LoadBuilder<T, E>
where
    T: Clone + Send + Sync + 'static,
    E: Clone + Debug + Send + Sync + 'static,
{
    /// Create a new builder with the default configuration.
    pub fn new() -> Self {
        Self {
            observe: None,
            fetch: None,
            on_failure: None,
            config: SessionConfig::default(),
        }
    }

    /// Set the observed cache source (required).
    pub fn observe(mut self, source: impl Observe<T>) -> Self {
        self.observe = Some(Box::new(source));
        self
    }

    /// Set the remote fetch operation (required).
    pub fn fetch(mut self, operation: impl Fetch<T, E>) -> Self {
        self.fetch = Some(Box::new(operation));
        self
    }

    /// Run `handler` once for every failed fetch (optional).
    pub fn on_failure<F, Fut>(mut self, handler: F) -> Self
    where
        F: Fn(E) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        self.on_failure = Some(failure_handler(handler));
        self
    }

    /// Use an already boxed failure handler (optional).
    pub fn failure_handler(mut self, handler: FailureHandler<E>) -> Self {
        self.on_failure = Some(handler);
        self
    }

    /// Replace the whole configuration.
    pub fn config(mut self, config: SessionConfig) -> Self {
        self.config = config;
        self
    }

    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.config.name = name.into();
        self
    }

    pub fn grace_period(mut self, grace_period: Duration) -> Self {
        self.config.grace_period = grace_period;
        self
    }

    pub fn history_limit(mut self, limit: usize) -> Self {
        self.config.history_limit = limit;
        self
    }

    /// Validate the inputs and start the session under `scope`.
    ///
    /// Cancelling `scope` later tears the session down. Must be called from
    /// within a Tokio runtime.
    pub fn build(self, scope: &CancellationToken) -> Result<Session<T, E>, BuildError> {
        let observe = self.observe.ok_or(BuildError::MissingObserve)?;
        let fetch = self.fetch.ok_or(BuildError::MissingFetch)?;

        let violations = self.config.violations();
        if !violations.is_empty() {
            return Err(BuildError::InvalidConfig(violations));
        }

        let handle = tokio::runtime::Handle::try_current().map_err(|_| BuildError::NoRuntime)?;

        Ok(Session::start(
            handle,
            scope,
            self.config,
            observe,
            fetch,
            self.on_failure,
        ))
    }
}

impl<T, E> Default for LoadBuilder<T, E>
where
    T: Clone + Send + Sync + 'static,
    E: Clone + Debug + Send + Sync + 'static,
{
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ConfigViolation;
    use futures::stream;

    fn empty_source() -> impl Observe<u32> {
        || stream::iter(vec![None::<u32>])
    }

    async fn ok_fetch() -> Result<u32, String> {
        Ok(1)
    }

    #[tokio::test]
    async fn builder_requires_observe() {
        let scope = CancellationToken::new();
        let result = LoadBuilder::<u32, String>::new().fetch(ok_fetch).build(&scope);

        assert!(matches!(result, Err(BuildError::MissingObserve)));
    }

    #[tokio::test]
    async fn builder_requires_fetch() {
        let scope = CancellationToken::new();
        let result = LoadBuilder::<u32, String>::new()
            .observe(empty_source())
            .build(&scope);

        assert!(matches!(result, Err(BuildError::MissingFetch)));
    }

    #[tokio::test]
    async fn builder_rejects_invalid_config() {
        let scope = CancellationToken::new();
        let result = LoadBuilder::<u32, String>::new()
            .observe(empty_source())
            .fetch(ok_fetch)
            .name("")
            .history_limit(0)
            .build(&scope);

        match result {
            Err(BuildError::InvalidConfig(violations)) => {
                assert_eq!(
                    violations,
                    vec![ConfigViolation::EmptyName, ConfigViolation::ZeroHistoryLimit]
                );
            }
            Err(other) => panic!("Expected InvalidConfig, got {other}"),
            Ok(_) => panic!("Expected InvalidConfig, got a session"),
        }
    }

    #[test]
    fn builder_requires_runtime() {
        let scope = CancellationToken::new();
        let result = LoadBuilder::<u32, String>::new()
            .observe(empty_source())
            .fetch(ok_fetch)
            .build(&scope);

        assert!(matches!(result, Err(BuildError::NoRuntime)));
    }

    #[tokio::test]
    async fn fluent_api_builds_session() {
        let scope = CancellationToken::new();
        let session = LoadBuilder::<u32, String>::new()
            .observe(empty_source())
            .fetch(ok_fetch)
            .name("counter")
            .build(&scope)
            .unwrap();

        assert_eq!(session.name(), "counter");
        assert!(!session.is_closed());
        scope.cancel();
    }
}
