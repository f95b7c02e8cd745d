//! Tidemark: one observable resource state from a cache and a remote refresh
//!
//! Presentation layers usually read data from a local cache that is kept up
//! to date by a remote fetch. The two change independently: the cache can
//! be written by anyone, and a fetch can be in flight, succeed or fail.
//! Tidemark folds both into a single [`Resource`] stream that never drops
//! known data just because a refresh is running or failed.
//!
//! # Core Concepts
//!
//! - **Resource**: `Success` / `Loading` / `Failure`, each carrying the last
//!   known value
//! - **RefreshStatus**: `Idle` / `Loading` / `Failed`, the outcome of the
//!   latest fetch
//! - **Trigger**: a coalescing request to run the fetch again
//! - **Session**: the live handle, scoped to a `CancellationToken`
//!
//! # Example
//!
//! ```rust
//! use tidemark::source::WatchSource;
//! use tidemark::{load, Resource};
//! use tokio::sync::watch;
//! use tokio_util::sync::CancellationToken;
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() {
//! let (cache, rx) = watch::channel(None::<String>);
//! let scope = CancellationToken::new();
//!
//! let session = load(&scope, WatchSource::new(rx), move || {
//!     let cache = cache.clone();
//!     async move {
//!         cache.send_replace(Some("Hello".to_string()));
//!         Ok::<_, String>("Hello".to_string())
//!     }
//! })
//! .unwrap();
//!
//! let mut state = session.subscribe().unwrap();
//! let ready = state.wait_for(Resource::is_success).await;
//! assert_eq!(ready, Some(Resource::Success { data: "Hello".to_string() }));
//!
//! scope.cancel();
//! # }
//! ```

pub mod builder;
pub mod config;
pub mod core;
mod effects;
pub mod network;
pub mod session;
pub mod snapshot;
pub mod source;
pub mod trigger;

// Re-export commonly used types
pub use builder::{BuildError, LoadBuilder};
pub use config::SessionConfig;
pub use crate::core::{RefreshStatus, Resource};
pub use network::{safe_call, NetworkError};
pub use session::{Session, SessionError, StateSubscription};

use source::{Fetch, Observe};
use std::fmt::Debug;
use tokio_util::sync::CancellationToken;

/// Start a session with the default configuration.
///
/// The first fetch is started right away. Cancelling `scope` stops the
/// session. Performs no I/O itself; fails only outside a Tokio runtime.
pub fn load<T, E>(
    scope: &CancellationToken,
    observe: impl Observe<T>,
    fetch: impl Fetch<T, E>,
) -> Result<Session<T, E>, BuildError>
where
    T: Clone + Send + Sync + 'static,
    E: Clone + Debug + Send + Sync + 'static,
{
    LoadBuilder::new().observe(observe).fetch(fetch).build(scope)
}
