//! The public, externally observed resource value.

use super::phase::Phase;
use serde::{Deserialize, Serialize};
use std::fmt::Debug;

/// Tri-state view of a cached data stream that is refreshed remotely.
///
/// Exactly one variant is active at a time. `Loading` and `Failure` carry the
/// most recently observed value, so a transient failure never hides data the
/// caller already had.
///
/// # Example
///
/// ```rust
/// use tidemark::Resource;
///
/// let loading: Resource<&str, String> = Resource::Loading { data: Some("cached") };
/// assert_eq!(loading.data(), Some(&"cached"));
/// assert!(loading.is_loading());
///
/// let failed: Resource<&str, String> = Resource::Failure {
///     data: None,
///     error: "offline".to_string(),
/// };
/// assert_eq!(failed.error(), Some(&"offline".to_string()));
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Resource<T, E> {
    /// Authoritative, current value.
    Success { data: T },

    /// A fetch is in flight.
    Loading { data: Option<T> },

    /// The last fetch attempt failed.
    Failure { data: Option<T>, error: E },
}

impl<T, E> Resource<T, E> {
    /// The most recently known value, if any.
    pub fn data(&self) -> Option<&T> {
        match self {
            Self::Success { data } => Some(data),
            Self::Loading { data } | Self::Failure { data, .. } => data.as_ref(),
        }
    }

    /// Consume the resource, returning the most recently known value.
    pub fn into_data(self) -> Option<T> {
        match self {
            Self::Success { data } => Some(data),
            Self::Loading { data } | Self::Failure { data, .. } => data,
        }
    }

    /// The error of the last failed fetch, if this is a `Failure`.
    pub fn error(&self) -> Option<&E> {
        match self {
            Self::Failure { error, .. } => Some(error),
            _ => None,
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success { .. })
    }

    pub fn is_loading(&self) -> bool {
        matches!(self, Self::Loading { .. })
    }

    pub fn is_failure(&self) -> bool {
        matches!(self, Self::Failure { .. })
    }

    /// Transform the carried data, keeping the variant and error untouched.
    pub fn map<U, F>(self, f: F) -> Resource<U, E>
    where
        F: FnOnce(T) -> U,
    {
        match self {
            Self::Success { data } => Resource::Success { data: f(data) },
            Self::Loading { data } => Resource::Loading { data: data.map(f) },
            Self::Failure { data, error } => Resource::Failure {
                data: data.map(f),
                error,
            },
        }
    }

    /// Transform the error of a `Failure`, keeping the data untouched.
    pub fn map_err<F2, F>(self, f: F) -> Resource<T, F2>
    where
        F: FnOnce(E) -> F2,
    {
        match self {
            Self::Success { data } => Resource::Success { data },
            Self::Loading { data } => Resource::Loading { data },
            Self::Failure { data, error } => Resource::Failure {
                data,
                error: f(error),
            },
        }
    }
}

impl<T, E> Default for Resource<T, E> {
    /// A freshly created session starts as `Loading` with nothing cached.
    fn default() -> Self {
        Self::Loading { data: None }
    }
}

impl<T, E> Phase for Resource<T, E>
where
    T: Clone + Debug + Send + Sync,
    E: Clone + Debug + Send + Sync,
{
    fn name(&self) -> &str {
        match self {
            Self::Success { .. } => "Success",
            Self::Loading { .. } => "Loading",
            Self::Failure { .. } => "Failure",
        }
    }

    fn is_settled(&self) -> bool {
        !self.is_loading()
    }

    fn is_error(&self) -> bool {
        self.is_failure()
    }
}
