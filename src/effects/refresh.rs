//! Trigger consumption and fetch execution.

use crate::session::Shared;
use crate::trigger::TriggerReceiver;
use std::fmt::Debug;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use tracing::Instrument;

/// Consume refresh triggers until the scope ends or every sender is gone.
///
/// Each trigger moves the status to `Loading` and starts the fetch as its
/// own task. The loop does not wait for that task before taking the next
/// trigger, so fetches started by back-to-back triggers may overlap and
/// the status ends up as whichever outcome is written last.
pub(crate) async fn consume_triggers<T, E>(shared: Arc<Shared<T, E>>, mut triggers: TriggerReceiver)
where
    T: Clone + Send + Sync + 'static,
    E: Clone + Debug + Send + Sync + 'static,
{
    loop {
        let signal = tokio::select! {
            biased;
            _ = shared.scope.cancelled() => {
                tracing::debug!("scope cancelled, trigger consumer exiting");
                break;
            }
            signal = triggers.recv() => signal,
        };

        if signal.is_none() {
            tracing::debug!("session handles dropped, trigger consumer exiting");
            break;
        }

        let attempt = shared.counters.started.fetch_add(1, Ordering::SeqCst) + 1;
        let next = shared.status.borrow().on_trigger();
        shared.transition(next, attempt);

        let span = tracing::debug_span!("fetch", attempt);
        shared
            .handle
            .spawn(run_fetch(Arc::clone(&shared), attempt).instrument(span));
    }
}

/// Run one fetch and apply its outcome to the status cell.
async fn run_fetch<T, E>(shared: Arc<Shared<T, E>>, attempt: u64)
where
    T: Clone + Send + Sync + 'static,
    E: Clone + Debug + Send + Sync + 'static,
{
    tracing::debug!("fetch started");

    let outcome = tokio::select! {
        biased;
        _ = shared.scope.cancelled() => {
            tracing::debug!("fetch cancelled with its scope");
            return;
        }
        outcome = shared.fetcher.fetch() => outcome,
    };

    let next = shared.status.borrow().on_outcome(&outcome);
    shared.transition(next, attempt);

    match outcome {
        Ok(_) => {
            shared.counters.succeeded.fetch_add(1, Ordering::SeqCst);
            tracing::debug!("fetch succeeded");
        }
        Err(error) => {
            shared.counters.failed.fetch_add(1, Ordering::SeqCst);
            tracing::warn!(?error, "fetch failed");
            notify_failure(&shared, error);
        }
    }
}

/// Hand the error to the failure callback on its own task.
fn notify_failure<T, E>(shared: &Shared<T, E>, error: E)
where
    T: Clone + Send + Sync + 'static,
    E: Clone + Debug + Send + Sync + 'static,
{
    let Some(handler) = shared.on_failure.as_ref() else {
        return;
    };

    let callback = handler(error);
    let scope = shared.scope.clone();
    shared.handle.spawn(
        async move {
            tokio::select! {
                _ = scope.cancelled() => {}
                _ = callback => {}
            }
        }
        .in_current_span(),
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::LoadBuilder;
    use crate::core::RefreshStatus;
    use futures::stream;
    use std::sync::atomic::AtomicUsize;
    use std::time::Duration;
    use tokio_util::sync::CancellationToken;

    async fn wait_until(mut check: impl FnMut() -> bool) {
        tokio::time::timeout(Duration::from_secs(2), async {
            while !check() {
                tokio::time::sleep(Duration::from_millis(5)).await;
            }
        })
        .await
        .expect("condition not reached in time");
    }

    #[tokio::test]
    async fn first_trigger_runs_fetch_without_refresh() {
        let scope = CancellationToken::new();
        let session = LoadBuilder::<u32, String>::new()
            .observe(|| stream::iter(vec![Some(1u32)]))
            .fetch(|| async { Ok::<u32, String>(1) })
            .build(&scope)
            .unwrap();

        wait_until(|| session.status() == RefreshStatus::Idle).await;
        assert_eq!(session.fetch_count(), 1);
        scope.cancel();
    }

    #[tokio::test]
    async fn failure_callback_runs_once_per_failure() {
        let scope = CancellationToken::new();
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);

        let session = LoadBuilder::<u32, String>::new()
            .observe(|| stream::iter(vec![None::<u32>]))
            .fetch(|| async { Err::<u32, String>("offline".to_string()) })
            .on_failure(move |_error: String| {
                let counter = Arc::clone(&counter);
                async move {
                    counter.fetch_add(1, Ordering::SeqCst);
                }
            })
            .build(&scope)
            .unwrap();

        wait_until(|| calls.load(Ordering::SeqCst) == 1).await;
        assert_eq!(session.status(), RefreshStatus::Failed("offline".to_string()));

        session.refresh();
        wait_until(|| calls.load(Ordering::SeqCst) == 2).await;
        assert_eq!(session.fetch_count(), 2);
        scope.cancel();
    }

    #[tokio::test]
    async fn slow_failure_callback_does_not_block_status() {
        let scope = CancellationToken::new();
        let session = LoadBuilder::<u32, String>::new()
            .observe(|| stream::iter(vec![None::<u32>]))
            .fetch(|| async { Err::<u32, String>("server".to_string()) })
            .on_failure(|_error: String| std::future::pending::<()>())
            .build(&scope)
            .unwrap();

        wait_until(|| session.status().error().is_some()).await;

        session.refresh();
        wait_until(|| session.fetch_count() == 2).await;
        wait_until(|| session.status().error().is_some()).await;
        scope.cancel();
    }

    #[tokio::test]
    async fn cancelling_scope_abandons_in_flight_fetch() {
        let scope = CancellationToken::new();
        let session = LoadBuilder::<u32, String>::new()
            .observe(|| stream::iter(vec![None::<u32>]))
            .fetch(|| std::future::pending::<Result<u32, String>>())
            .build(&scope)
            .unwrap();

        wait_until(|| session.fetch_count() == 1).await;
        scope.cancel();
        tokio::time::sleep(Duration::from_millis(20)).await;

        assert!(session.is_closed());
        assert_eq!(session.status(), RefreshStatus::Loading);

        session.refresh();
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert_eq!(session.fetch_count(), 1);
    }
}
