//! Shared, latest-value, reference-counted broadcast of the resource state.
//!
//! The broadcast cell is a `watch` channel that always holds the most recent
//! resource. A registry counts live subscriptions: the first one starts the
//! combiner task, and once the last one is dropped the combiner is stopped
//! after the configured grace period unless someone subscribes again.

use super::{SessionError, Shared};
use crate::core::Resource;
use crate::effects;
use futures::Stream;
use std::fmt::Debug;
use std::sync::Arc;
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;
use tracing::Instrument;

/// Subscriber bookkeeping guarded by the session's registry lock.
#[derive(Debug, Default)]
pub(crate) struct Registry {
    pub(crate) subscribers: usize,
    /// Bumped on every subscribe so a pending grace timer can tell whether
    /// someone came and went while it was sleeping.
    generation: u64,
    combiner: Option<CancellationToken>,
}

pub(crate) fn subscribe<T, E>(
    shared: &Arc<Shared<T, E>>,
) -> Result<StateSubscription<T, E>, SessionError>
where
    T: Clone + Send + Sync + 'static,
    E: Clone + Debug + Send + Sync + 'static,
{
    if shared.scope.is_cancelled() {
        return Err(SessionError::Closed);
    }

    let mut registry = shared.registry.lock();
    registry.subscribers += 1;
    registry.generation += 1;

    if registry.combiner.is_none() {
        let stop = shared.scope.child_token();
        registry.combiner = Some(stop.clone());

        let span = tracing::debug_span!(parent: &shared.span, "combiner");
        let task = effects::run_combiner(Arc::clone(shared), stop).instrument(span);
        shared.handle.spawn(task);
    }
    drop(registry);

    Ok(StateSubscription {
        rx: shared.state.subscribe(),
        delivered: false,
        guard: SubscriberGuard {
            shared: Arc::clone(shared),
        },
    })
}

/// Decrements the subscriber count on drop and schedules the combiner stop.
struct SubscriberGuard<T, E>
where
    T: Clone + Send + Sync + 'static,
    E: Clone + Debug + Send + Sync + 'static,
{
    shared: Arc<Shared<T, E>>,
}

impl<T, E> Drop for SubscriberGuard<T, E>
where
    T: Clone + Send + Sync + 'static,
    E: Clone + Debug + Send + Sync + 'static,
{
    fn drop(&mut self) {
        let mut registry = self.shared.registry.lock();
        registry.subscribers = registry.subscribers.saturating_sub(1);
        if registry.subscribers > 0 {
            return;
        }

        let grace = self.shared.config.grace_period;
        if grace.is_zero() {
            if let Some(stop) = registry.combiner.take() {
                stop.cancel();
            }
            return;
        }

        let generation = registry.generation;
        drop(registry);

        let shared = Arc::clone(&self.shared);
        self.shared.handle.spawn(async move {
            tokio::select! {
                _ = shared.scope.cancelled() => return,
                _ = tokio::time::sleep(grace) => {}
            }

            let mut registry = shared.registry.lock();
            if registry.subscribers == 0 && registry.generation == generation {
                if let Some(stop) = registry.combiner.take() {
                    tracing::debug!(parent: &shared.span, ?grace, "no subscribers, stopping combiner");
                    stop.cancel();
                }
            }
        });
    }
}

/// A live subscription to a session's resource state.
///
/// Dropping the subscription releases it.
pub struct StateSubscription<T, E>
where
    T: Clone + Send + Sync + 'static,
    E: Clone + Debug + Send + Sync + 'static,
{
    rx: watch::Receiver<Resource<T, E>>,
    delivered: bool,
    guard: SubscriberGuard<T, E>,
}

impl<T, E> StateSubscription<T, E>
where
    T: Clone + Send + Sync + 'static,
    E: Clone + Debug + Send + Sync + 'static,
{
    /// The latest value, without waiting.
    pub fn borrow(&self) -> Resource<T, E> {
        self.rx.borrow().clone()
    }

    /// Next value for this subscriber.
    ///
    /// The first call returns the current value immediately; later calls
    /// wait for a change. Returns `None` once the session is closed.
    pub async fn next(&mut self) -> Option<Resource<T, E>> {
        if !self.delivered {
            self.delivered = true;
            return Some(self.rx.borrow_and_update().clone());
        }
        self.changed().await
    }

    /// Wait for the value to change and return it.
    ///
    /// Intermediate values published while this subscriber was not
    /// polling are skipped; only the latest one is returned.
    pub async fn changed(&mut self) -> Option<Resource<T, E>> {
        self.delivered = true;
        let scope = self.guard.shared.scope.clone();
        let changed = tokio::select! {
            biased;
            _ = scope.cancelled() => return None,
            changed = self.rx.changed() => changed,
        };
        changed.ok()?;
        Some(self.rx.borrow_and_update().clone())
    }

    /// Wait until a value satisfies `predicate`, checking the current one first.
    pub async fn wait_for<F>(&mut self, mut predicate: F) -> Option<Resource<T, E>>
    where
        F: FnMut(&Resource<T, E>) -> bool,
    {
        self.delivered = true;
        {
            let current = self.rx.borrow_and_update();
            if predicate(&current) {
                return Some(current.clone());
            }
        }
        loop {
            let value = self.changed().await?;
            if predicate(&value) {
                return Some(value);
            }
        }
    }

    /// Turn the subscription into a `Stream` of resource values.
    pub fn into_stream(self) -> impl Stream<Item = Resource<T, E>> + Send + 'static {
        futures::stream::unfold(self, |mut subscription| async move {
            let value = subscription.next().await?;
            Some((value, subscription))
        })
    }
}
