//! The live session handle.
//!
//! A session ties one observed cache source and one fetch operation
//! together for as long as the caller's cancellation scope lives. It owns
//! the status cell, the trigger queue and the broadcast cell; callers can
//! only subscribe to the derived state and request refreshes.

mod broadcast;

pub use broadcast::StateSubscription;

use crate::config::SessionConfig;
use crate::core::{Phase, RefreshStatus, Resource, StatusHistory, StatusTransition};
use crate::effects;
use crate::snapshot::{SessionMetadata, SessionSnapshot};
use crate::source::{FailureHandler, Fetch, Observe};
use crate::trigger::{self, TriggerSender};
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use std::fmt::Debug;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use thiserror::Error;
use tokio::runtime::Handle;
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;
use tracing::Instrument;
use uuid::Uuid;

/// Errors returned by session operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum SessionError {
    #[error("Session scope has been cancelled")]
    Closed,
}

/// Fetch attempt counters.
#[derive(Debug, Default)]
pub(crate) struct Counters {
    pub(crate) started: AtomicU64,
    pub(crate) succeeded: AtomicU64,
    pub(crate) failed: AtomicU64,
}

/// State shared between the handle and the session's tasks.
pub(crate) struct Shared<T, E> {
    pub(crate) id: Uuid,
    pub(crate) config: SessionConfig,
    pub(crate) created_at: DateTime<Utc>,
    pub(crate) scope: CancellationToken,
    pub(crate) handle: Handle,
    pub(crate) span: tracing::Span,
    pub(crate) status: watch::Sender<RefreshStatus<E>>,
    pub(crate) state: watch::Sender<Resource<T, E>>,
    pub(crate) source: Box<dyn Observe<T>>,
    pub(crate) fetcher: Box<dyn Fetch<T, E>>,
    pub(crate) on_failure: Option<FailureHandler<E>>,
    pub(crate) counters: Counters,
    pub(crate) history: Mutex<StatusHistory<RefreshStatus<E>>>,
    pub(crate) updated_at: Mutex<DateTime<Utc>>,
    pub(crate) registry: Mutex<broadcast::Registry>,
}

impl<T, E> Shared<T, E>
where
    T: Clone + Send + Sync + 'static,
    E: Clone + Debug + Send + Sync + 'static,
{
    /// Write a new status, recording the transition if it is a real change.
    ///
    /// Every `Failed` write counts as a change so repeated failures stay
    /// observable. Last write wins when fetches complete concurrently.
    pub(crate) fn transition(&self, next: RefreshStatus<E>, attempt: u64) {
        self.status.send_if_modified(|current| {
            let unchanged = matches!(
                (&*current, &next),
                (RefreshStatus::Idle, RefreshStatus::Idle)
                    | (RefreshStatus::Loading, RefreshStatus::Loading)
            );
            if unchanged {
                return false;
            }

            tracing::debug!(
                parent: &self.span,
                from = current.name(),
                to = next.name(),
                attempt,
                "status transition"
            );
            let from = std::mem::replace(current, next.clone());
            self.history.lock().push(StatusTransition {
                from,
                to: next,
                timestamp: Utc::now(),
                attempt,
            });
            true
        });
    }

    pub(crate) fn publish(&self, resource: Resource<T, E>) {
        self.state.send_replace(resource);
        *self.updated_at.lock() = Utc::now();
    }
}

/// Live handle combining an observed cache with remote refreshes.
///
/// Created by [`load`](crate::load) or [`LoadBuilder`](crate::builder::LoadBuilder).
/// Cloning the handle is cheap; all clones drive the same session.
pub struct Session<T, E> {
    shared: Arc<Shared<T, E>>,
    trigger: TriggerSender,
}

impl<T, E> Clone for Session<T, E> {
    fn clone(&self) -> Self {
        Self {
            shared: Arc::clone(&self.shared),
            trigger: self.trigger.clone(),
        }
    }
}

impl<T, E> Session<T, E>
where
    T: Clone + Send + Sync + 'static,
    E: Clone + Debug + Send + Sync + 'static,
{
    pub(crate) fn start(
        handle: Handle,
        scope: &CancellationToken,
        config: SessionConfig,
        source: Box<dyn Observe<T>>,
        fetcher: Box<dyn Fetch<T, E>>,
        on_failure: Option<FailureHandler<E>>,
    ) -> Self {
        let id = Uuid::new_v4();
        let span = tracing::debug_span!("session", session = %id, name = %config.name);
        let (status, _) = watch::channel(RefreshStatus::Idle);
        let (state, _) = watch::channel(Resource::default());
        let history = StatusHistory::with_limit(config.history_limit);
        let now = Utc::now();

        let shared = Arc::new(Shared {
            id,
            config,
            created_at: now,
            scope: scope.child_token(),
            handle,
            span,
            status,
            state,
            source,
            fetcher,
            on_failure,
            counters: Counters::default(),
            history: Mutex::new(history),
            updated_at: Mutex::new(now),
            registry: Mutex::new(broadcast::Registry::default()),
        });

        let (trigger, triggers) = trigger::channel();

        // The implicit first trigger is applied eagerly so the first state
        // any subscriber can see already reflects an in-flight load.
        trigger.signal();
        shared.transition(RefreshStatus::Idle.on_trigger(), 1);

        let consumer = effects::consume_triggers(Arc::clone(&shared), triggers)
            .instrument(shared.span.clone());
        shared.handle.spawn(consumer);

        tracing::debug!(parent: &shared.span, "session started");
        Self { shared, trigger }
    }

    /// Request a refresh.
    ///
    /// Returns immediately. A request made while another one is still
    /// pending is merged into it. Does nothing once the session is closed.
    pub fn refresh(&self) {
        let queued = self.trigger.signal();
        tracing::trace!(parent: &self.shared.span, queued, "refresh requested");
    }

    /// Subscribe to the derived resource state.
    ///
    /// The subscription first yields the most recent value, then every
    /// later one. The first subscriber starts observing the cache source.
    pub fn subscribe(&self) -> Result<StateSubscription<T, E>, SessionError> {
        broadcast::subscribe(&self.shared)
    }

    /// Alias of [`subscribe`](Self::subscribe).
    pub fn state(&self) -> Result<StateSubscription<T, E>, SessionError> {
        self.subscribe()
    }

    /// The most recently published resource.
    ///
    /// Only kept current while at least one subscription is alive.
    pub fn current(&self) -> Resource<T, E> {
        self.shared.state.borrow().clone()
    }

    /// Current refresh status.
    pub fn status(&self) -> RefreshStatus<E> {
        self.shared.status.borrow().clone()
    }

    /// Number of fetches started so far.
    pub fn fetch_count(&self) -> u64 {
        self.shared.counters.started.load(Ordering::SeqCst)
    }

    /// Retained status transitions, oldest first.
    pub fn history(&self) -> StatusHistory<RefreshStatus<E>> {
        self.shared.history.lock().clone()
    }

    /// Number of live subscriptions.
    pub fn subscriber_count(&self) -> usize {
        self.shared.registry.lock().subscribers
    }

    pub fn id(&self) -> Uuid {
        self.shared.id
    }

    pub fn name(&self) -> &str {
        &self.shared.config.name
    }

    pub fn config(&self) -> &SessionConfig {
        &self.shared.config
    }

    /// Whether the owning scope has been cancelled.
    pub fn is_closed(&self) -> bool {
        self.shared.scope.is_cancelled()
    }

    /// Wait until the owning scope is cancelled.
    pub async fn closed(&self) {
        self.shared.scope.cancelled().await
    }

    /// Capture a read-only view of the session for diagnostics.
    pub fn snapshot(&self) -> SessionSnapshot<T, E> {
        let shared = &self.shared;
        let metadata = SessionMetadata {
            created_at: shared.created_at,
            updated_at: *shared.updated_at.lock(),
            fetch_started: shared.counters.started.load(Ordering::SeqCst),
            fetch_succeeded: shared.counters.succeeded.load(Ordering::SeqCst),
            fetch_failed: shared.counters.failed.load(Ordering::SeqCst),
            subscribers: self.subscriber_count(),
        };

        SessionSnapshot {
            id: shared.id,
            name: shared.config.name.clone(),
            taken_at: Utc::now(),
            resource: self.current(),
            status: self.status(),
            history: self.history(),
            metadata,
        }
    }
}
