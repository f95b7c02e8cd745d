//! Caller-owned collaborators of a session.
//!
//! A session only reads the observed source and invokes the fetch
//! operation; both stay owned by the caller. These traits are the seams
//! through which they are plugged in.

use futures::future::BoxFuture;
use futures::stream::BoxStream;
use futures::{FutureExt, Stream, StreamExt};
use std::future::Future;
use std::sync::Arc;
use tokio::sync::watch;

/// A source of locally cached values.
///
/// `observe` is called every time the session starts combining, so each
/// call must return a fresh stream that first emits the current value and
/// then every subsequent change. `None` means nothing is cached yet.
pub trait Observe<T>: Send + Sync + 'static {
    fn observe(&self) -> BoxStream<'static, Option<T>>;
}

impl<T, F, S> Observe<T> for F
where
    F: Fn() -> S + Send + Sync + 'static,
    S: Stream<Item = Option<T>> + Send + 'static,
{
    fn observe(&self) -> BoxStream<'static, Option<T>> {
        self().boxed()
    }
}

/// Observes a `watch` channel holding the cached value.
///
/// This is the usual shape of an in-memory or database-backed cache that
/// publishes its current row through a watch channel.
///
/// ```rust
/// use futures::StreamExt;
/// use tidemark::source::{Observe, WatchSource};
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() {
/// let (tx, rx) = tokio::sync::watch::channel(Some("cached"));
/// let source = WatchSource::new(rx);
///
/// let mut stream = source.observe();
/// assert_eq!(stream.next().await, Some(Some("cached")));
///
/// tx.send_replace(None);
/// assert_eq!(stream.next().await, Some(None));
/// # }
/// ```
#[derive(Clone, Debug)]
pub struct WatchSource<T> {
    rx: watch::Receiver<Option<T>>,
}

impl<T> WatchSource<T> {
    pub fn new(rx: watch::Receiver<Option<T>>) -> Self {
        Self { rx }
    }
}

impl<T> From<watch::Receiver<Option<T>>> for WatchSource<T> {
    fn from(rx: watch::Receiver<Option<T>>) -> Self {
        Self::new(rx)
    }
}

impl<T> Observe<T> for WatchSource<T>
where
    T: Clone + Send + Sync + 'static,
{
    fn observe(&self) -> BoxStream<'static, Option<T>> {
        futures::stream::unfold((self.rx.clone(), true), |(mut rx, first)| async move {
            if !first && rx.changed().await.is_err() {
                return None;
            }
            let value = rx.borrow_and_update().clone();
            Some((value, (rx, false)))
        })
        .boxed()
    }
}

/// The remote refresh operation.
///
/// Must report failures as typed `Err` values; a panic inside the returned
/// future is a programming error and is not caught by the session.
pub trait Fetch<T, E>: Send + Sync + 'static {
    fn fetch(&self) -> BoxFuture<'static, Result<T, E>>;
}

impl<T, E, F, Fut> Fetch<T, E> for F
where
    F: Fn() -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<T, E>> + Send + 'static,
{
    fn fetch(&self) -> BoxFuture<'static, Result<T, E>> {
        self().boxed()
    }
}

/// Callback run once for every failed fetch.
pub type FailureHandler<E> = Arc<dyn Fn(E) -> BoxFuture<'static, ()> + Send + Sync>;

/// Box an async closure into a [`FailureHandler`].
pub fn failure_handler<E, F, Fut>(handler: F) -> FailureHandler<E>
where
    F: Fn(E) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = ()> + Send + 'static,
{
    Arc::new(move |error| handler(error).boxed())
}
