//! Refresh status state machine.
//!
//! Tracks the outcome of the most recent fetch attempt. Transitions are pure
//! functions returning the next status; the session applies them to its
//! status cell.

use super::phase::Phase;
use serde::{Deserialize, Serialize};
use std::fmt::Debug;

/// Outcome of the most recent fetch attempt.
///
/// ```text
///            trigger              Ok(_)
///   Idle ─────────────► Loading ─────────► Idle
///    ▲                   │  ▲
///    │                   │  │ trigger
///    │          Err(e)   ▼  │
///    └───── (trigger) ─ Failed(e)
/// ```
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", content = "error", rename_all = "snake_case")]
pub enum RefreshStatus<E> {
    /// No fetch in flight and the last one (if any) succeeded.
    #[default]
    Idle,

    /// A fetch has been started and has not reported back yet.
    Loading,

    /// The last fetch to report back failed.
    Failed(E),
}

impl<E: Clone> RefreshStatus<E> {
    /// Status after a trigger is consumed. Always `Loading`.
    pub fn on_trigger(&self) -> Self {
        Self::Loading
    }

    /// Status after a fetch reports its outcome.
    ///
    /// The fetched value itself is not retained; the observed source is
    /// expected to reflect a successful write.
    pub fn on_outcome<T>(&self, outcome: &Result<T, E>) -> Self {
        match outcome {
            Ok(_) => Self::Idle,
            Err(error) => Self::Failed(error.clone()),
        }
    }
}

impl<E> RefreshStatus<E> {
    pub fn is_loading(&self) -> bool {
        matches!(self, Self::Loading)
    }

    pub fn error(&self) -> Option<&E> {
        match self {
            Self::Failed(error) => Some(error),
            _ => None,
        }
    }
}

impl<E: Clone + Debug + Send + Sync> Phase for RefreshStatus<E> {
    fn name(&self) -> &str {
        match self {
            Self::Idle => "Idle",
            Self::Loading => "Loading",
            Self::Failed(_) => "Failed",
        }
    }

    fn is_settled(&self) -> bool {
        !self.is_loading()
    }

    fn is_error(&self) -> bool {
        matches!(self, Self::Failed(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_status_is_idle() {
        let status: RefreshStatus<String> = RefreshStatus::default();
        assert_eq!(status, RefreshStatus::Idle);
    }

    #[test]
    fn trigger_enters_loading_from_any_status() {
        let idle: RefreshStatus<&str> = RefreshStatus::Idle;
        let failed: RefreshStatus<&str> = RefreshStatus::Failed("timeout");

        assert_eq!(idle.on_trigger(), RefreshStatus::Loading);
        assert_eq!(failed.on_trigger(), RefreshStatus::Loading);
        assert_eq!(RefreshStatus::<&str>::Loading.on_trigger(), RefreshStatus::Loading);
    }

    #[test]
    fn success_returns_to_idle() {
        let status: RefreshStatus<&str> = RefreshStatus::Loading;
        let outcome: Result<u32, &str> = Ok(7);

        assert_eq!(status.on_outcome(&outcome), RefreshStatus::Idle);
    }

    #[test]
    fn error_is_captured_in_failed() {
        let status: RefreshStatus<&str> = RefreshStatus::Loading;
        let outcome: Result<u32, &str> = Err("no internet");

        let next = status.on_outcome(&outcome);

        assert_eq!(next, RefreshStatus::Failed("no internet"));
        assert_eq!(next.error(), Some(&"no internet"));
    }

    #[test]
    fn phase_flags_follow_variant() {
        assert!(RefreshStatus::<&str>::Idle.is_settled());
        assert!(!RefreshStatus::<&str>::Loading.is_settled());
        assert!(RefreshStatus::Failed("x").is_error());
        assert_eq!(RefreshStatus::Failed("x").name(), "Failed");
    }

    #[test]
    fn status_serializes_with_error_payload() {
        let status: RefreshStatus<String> = RefreshStatus::Failed("rate limited".to_string());
        let json = serde_json::to_string(&status).unwrap();
        let back: RefreshStatus<String> = serde_json::from_str(&json).unwrap();
        assert_eq!(back, status);
    }
}
