//! Pure combination of the refresh status and the latest observed value.

use super::resource::Resource;
use super::status::RefreshStatus;

/// Derive the visible resource from the two latest inputs.
///
/// | Status      | Observed  | Resource              |
/// |-------------|-----------|-----------------------|
/// | `Idle`      | `Some(v)` | `Success(v)`          |
/// | `Idle`      | `None`    | `Loading(None)`       |
/// | `Loading`   | any       | `Loading(observed)`   |
/// | `Failed(e)` | any       | `Failure(observed, e)`|
///
/// Deterministic and side-effect free. The observed value always flows
/// through untouched, so a status change alone never clears data.
///
/// # Example
///
/// ```rust
/// use tidemark::core::{combine, RefreshStatus};
/// use tidemark::Resource;
///
/// let failed: RefreshStatus<&str> = RefreshStatus::Failed("offline");
/// assert_eq!(
///     combine(&failed, Some("cached")),
///     Resource::Failure { data: Some("cached"), error: "offline" },
/// );
/// ```
pub fn combine<T, E: Clone>(status: &RefreshStatus<E>, observed: Option<T>) -> Resource<T, E> {
    match (status, observed) {
        (RefreshStatus::Idle, Some(data)) => Resource::Success { data },
        (RefreshStatus::Idle, None) => Resource::Loading { data: None },
        (RefreshStatus::Loading, data) => Resource::Loading { data },
        (RefreshStatus::Failed(error), data) => Resource::Failure {
            data,
            error: error.clone(),
        },
    }
}
