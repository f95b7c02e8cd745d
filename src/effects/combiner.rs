//! The combiner task: feeds the observed source and the status cell into
//! [`combine`](crate::core::combine) and publishes the result.

use crate::core::combine;
use crate::session::Shared;
use futures::StreamExt;
use std::fmt::Debug;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// Run until `stop` fires.
///
/// Nothing is published until the observed source has produced its first
/// item in this run; after that every item and every status change
/// republishes. If the source ends, the last observed value is kept and
/// status changes keep flowing.
pub(crate) async fn run_combiner<T, E>(shared: Arc<Shared<T, E>>, stop: CancellationToken)
where
    T: Clone + Send + Sync + 'static,
    E: Clone + Debug + Send + Sync + 'static,
{
    tracing::debug!("combiner started");

    let mut observed = shared.source.observe().fuse();
    let mut source_open = true;
    let mut status = shared.status.subscribe();
    let mut latest: Option<Option<T>> = None;

    loop {
        tokio::select! {
            biased;
            _ = stop.cancelled() => break,
            changed = status.changed() => {
                if changed.is_err() {
                    break;
                }
            }
            item = observed.next(), if source_open => match item {
                Some(value) => latest = Some(value),
                None => {
                    tracing::debug!("observed source ended");
                    source_open = false;
                    continue;
                }
            },
        }

        // A replacement combiner may already be running.
        if stop.is_cancelled() {
            break;
        }

        if let Some(value) = &latest {
            let resource = combine(&*status.borrow_and_update(), value.clone());
            shared.publish(resource);
        }
    }

    tracing::debug!("combiner stopped");
}
