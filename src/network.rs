//! Typed network errors and the `safe_call` wrapper.
//!
//! Fetch operations are expected to hand the session typed results. Remote
//! calls usually fail with arbitrary error types, so `safe_call` runs a call
//! and folds whatever it fails with into the closed [`NetworkError`] set.

use serde::{Deserialize, Serialize};
use std::error::Error as StdError;
use std::future::Future;
use std::io;
use thiserror::Error;
use tokio_util::sync::CancellationToken;

/// Closed set of remote call failures.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
#[serde(tag = "kind", content = "detail", rename_all = "snake_case")]
pub enum NetworkError {
    #[error("request timed out")]
    Timeout,

    #[error("too many requests")]
    RateLimited,

    #[error("no internet connection")]
    NoInternet,

    #[error("server error")]
    Server,

    #[error("malformed payload")]
    Serialization,

    #[error("unknown network error: {0}")]
    Unknown(String),

    /// The surrounding scope was cancelled. Not a failure of the remote.
    #[error("call cancelled")]
    Cancelled,
}

impl NetworkError {
    /// Classify an arbitrary error by walking its source chain.
    ///
    /// The first error in the chain with a known type decides the kind;
    /// anything unrecognized becomes `Unknown` carrying the top-level message.
    pub fn classify(error: &(dyn StdError + 'static)) -> Self {
        let mut current: Option<&(dyn StdError + 'static)> = Some(error);
        while let Some(err) = current {
            if let Some(kind) = Self::classify_one(err) {
                return kind;
            }
            current = err.source();
        }
        Self::Unknown(error.to_string())
    }

    fn classify_one(err: &(dyn StdError + 'static)) -> Option<Self> {
        if let Some(known) = err.downcast_ref::<NetworkError>() {
            return Some(known.clone());
        }
        if err.is::<tokio::time::error::Elapsed>() {
            return Some(Self::Timeout);
        }
        if let Some(status) = err.downcast_ref::<HttpStatusError>() {
            return status.classify();
        }
        if err.is::<serde_json::Error>() {
            return Some(Self::Serialization);
        }
        if let Some(io_err) = err.downcast_ref::<io::Error>() {
            return Self::classify_io(io_err);
        }
        None
    }

    fn classify_io(err: &io::Error) -> Option<Self> {
        match err.kind() {
            io::ErrorKind::TimedOut => Some(Self::Timeout),
            io::ErrorKind::ConnectionRefused
            | io::ErrorKind::ConnectionReset
            | io::ErrorKind::ConnectionAborted
            | io::ErrorKind::NotConnected
            | io::ErrorKind::AddrNotAvailable
            | io::ErrorKind::BrokenPipe => Some(Self::NoInternet),
            io::ErrorKind::InvalidData | io::ErrorKind::UnexpectedEof => {
                Some(Self::Serialization)
            }
            _ => None,
        }
    }

    /// Whether retrying the same call later could plausibly succeed.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            Self::Timeout | Self::RateLimited | Self::NoInternet | Self::Server
        )
    }
}

/// A non-success HTTP status returned by a remote.
///
/// Transport layers that surface raw status codes wrap them in this type so
/// `classify` can tell rate limiting and server faults apart.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("http status {status}")]
pub struct HttpStatusError {
    pub status: u16,
}

impl HttpStatusError {
    pub fn new(status: u16) -> Self {
        Self { status }
    }

    fn classify(&self) -> Option<NetworkError> {
        match self.status {
            408 | 504 => Some(NetworkError::Timeout),
            429 => Some(NetworkError::RateLimited),
            500..=599 => Some(NetworkError::Server),
            _ => None,
        }
    }
}

/// Run a remote call, turning any failure into a [`NetworkError`].
///
/// Cancellation wins: if `cancel` fires while the call is pending the call is
/// dropped and `Cancelled` is returned, and a failure that arrives after the
/// token fired is reported as `Cancelled` rather than classified.
///
/// ```rust
/// use tidemark::network::{safe_call, HttpStatusError, NetworkError};
/// use tokio_util::sync::CancellationToken;
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() {
/// let cancel = CancellationToken::new();
/// let result: Result<(), NetworkError> =
///     safe_call(&cancel, async { Err(HttpStatusError::new(429)) }).await;
/// assert_eq!(result, Err(NetworkError::RateLimited));
/// # }
/// ```
#[tracing::instrument(level = "debug", skip_all)]
pub async fn safe_call<T, Err, Fut>(
    cancel: &CancellationToken,
    call: Fut,
) -> Result<T, NetworkError>
where
    Fut: Future<Output = Result<T, Err>>,
    Err: StdError + 'static,
{
    let outcome = tokio::select! {
        biased;
        _ = cancel.cancelled() => return Err(NetworkError::Cancelled),
        outcome = call => outcome,
    };

    outcome.map_err(|err| {
        if cancel.is_cancelled() {
            return NetworkError::Cancelled;
        }
        let kind = NetworkError::classify(&err);
        tracing::debug!(error = %err, ?kind, "remote call failed");
        kind
    })
}
