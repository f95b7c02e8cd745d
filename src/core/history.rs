//! Status transition history tracking.
//!
//! Provides immutable, bounded tracking of status transitions over time.

use super::phase::Phase;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::time::Duration;

/// Default number of transitions a history keeps.
pub const DEFAULT_HISTORY_LIMIT: usize = 32;

/// Record of a single status transition.
///
/// # Example
///
/// ```rust
/// use tidemark::core::{RefreshStatus, StatusTransition};
/// use chrono::Utc;
///
/// let transition: StatusTransition<RefreshStatus<String>> = StatusTransition {
///     from: RefreshStatus::Idle,
///     to: RefreshStatus::Loading,
///     timestamp: Utc::now(),
///     attempt: 1,
/// };
/// assert_eq!(transition.attempt, 1);
/// ```
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct StatusTransition<S> {
    /// The phase being transitioned from
    pub from: S,
    /// The phase being transitioned to
    pub to: S,
    /// When the transition occurred
    pub timestamp: DateTime<Utc>,
    /// The fetch attempt that caused the transition
    pub attempt: u64,
}

/// Ordered, bounded history of status transitions.
///
/// History is immutable - `record` returns a new history with the
/// transition appended. Once `limit` transitions are stored, the oldest
/// one is evicted.
///
/// # Example
///
/// ```rust
/// use tidemark::core::{RefreshStatus, StatusHistory, StatusTransition};
/// use chrono::Utc;
///
/// let history = StatusHistory::with_limit(8);
///
/// let history = history.record(StatusTransition {
///     from: RefreshStatus::<String>::Idle,
///     to: RefreshStatus::Loading,
///     timestamp: Utc::now(),
///     attempt: 1,
/// });
/// let history = history.record(StatusTransition {
///     from: RefreshStatus::Loading,
///     to: RefreshStatus::Failed("offline".to_string()),
///     timestamp: Utc::now(),
///     attempt: 1,
/// });
///
/// assert_eq!(history.get_path().len(), 3); // Idle -> Loading -> Failed
/// assert_eq!(history.failures(), 1);
/// ```
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct StatusHistory<S> {
    transitions: VecDeque<StatusTransition<S>>,
    limit: usize,
}

impl<S: Phase> Default for StatusHistory<S> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S: Phase> StatusHistory<S> {
    /// Create a new empty history with the default limit.
    pub fn new() -> Self {
        Self::with_limit(DEFAULT_HISTORY_LIMIT)
    }

    /// Create a new empty history keeping at most `limit` transitions.
    ///
    /// A limit of zero is raised to one.
    pub fn with_limit(limit: usize) -> Self {
        Self {
            transitions: VecDeque::new(),
            limit: limit.max(1),
        }
    }

    /// Record a transition, returning a new history.
    ///
    /// Does not mutate the existing history.
    pub fn record(&self, transition: StatusTransition<S>) -> Self {
        let mut next = self.clone();
        next.push(transition);
        next
    }

    pub(crate) fn push(&mut self, transition: StatusTransition<S>) {
        if self.transitions.len() == self.limit {
            self.transitions.pop_front();
        }
        self.transitions.push_back(transition);
    }

    /// Get the path of phases traversed.
    ///
    /// Returns the `from` of the oldest retained transition, then the `to`
    /// of each transition in order.
    pub fn get_path(&self) -> Vec<&S> {
        let mut path = Vec::with_capacity(self.transitions.len() + 1);
        if let Some(first) = self.transitions.front() {
            path.push(&first.from);
        }
        path.extend(self.transitions.iter().map(|t| &t.to));
        path
    }

    /// Time between the oldest and newest retained transitions.
    ///
    /// Returns `None` if there are no transitions.
    pub fn duration(&self) -> Option<Duration> {
        let (first, last) = (self.transitions.front()?, self.transitions.back()?);
        last.timestamp
            .signed_duration_since(first.timestamp)
            .to_std()
            .ok()
    }

    /// Number of retained transitions that entered an error phase.
    pub fn failures(&self) -> usize {
        self.transitions.iter().filter(|t| t.to.is_error()).count()
    }

    /// Most recent transition, if any.
    pub fn last(&self) -> Option<&StatusTransition<S>> {
        self.transitions.back()
    }

    /// All retained transitions, oldest first.
    pub fn transitions(&self) -> impl ExactSizeIterator<Item = &StatusTransition<S>> {
        self.transitions.iter()
    }

    pub fn len(&self) -> usize {
        self.transitions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.transitions.is_empty()
    }

    pub fn limit(&self) -> usize {
        self.limit
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::RefreshStatus;

    type Status = RefreshStatus<String>;

    fn transition(from: Status, to: Status, attempt: u64) -> StatusTransition<Status> {
        StatusTransition {
            from,
            to,
            timestamp: Utc::now(),
            attempt,
        }
    }

    #[test]
    fn new_history_is_empty() {
        let history: StatusHistory<Status> = StatusHistory::new();
        assert!(history.is_empty());
        assert!(history.get_path().is_empty());
        assert!(history.duration().is_none());
        assert_eq!(history.limit(), DEFAULT_HISTORY_LIMIT);
    }

    #[test]
    fn record_is_immutable() {
        let history = StatusHistory::new();

        let new_history = history.record(transition(Status::Idle, Status::Loading, 1));

        assert_eq!(history.len(), 0);
        assert_eq!(new_history.len(), 1);
    }

    #[test]
    fn get_path_returns_phase_sequence() {
        let history = StatusHistory::new()
            .record(transition(Status::Idle, Status::Loading, 1))
            .record(transition(Status::Loading, Status::Idle, 1));

        let path = history.get_path();
        assert_eq!(path, vec![&Status::Idle, &Status::Loading, &Status::Idle]);
    }

    #[test]
    fn limit_evicts_oldest() {
        let mut history = StatusHistory::with_limit(2);
        for attempt in 1..=3 {
            history = history.record(transition(Status::Idle, Status::Loading, attempt));
        }

        let attempts: Vec<u64> = history.transitions().map(|t| t.attempt).collect();
        assert_eq!(attempts, vec![2, 3]);
    }

    #[test]
    fn zero_limit_keeps_one() {
        let history = StatusHistory::with_limit(0)
            .record(transition(Status::Idle, Status::Loading, 1))
            .record(transition(Status::Loading, Status::Idle, 1));

        assert_eq!(history.len(), 1);
        assert_eq!(history.last().map(|t| &t.to), Some(&Status::Idle));
    }

    #[test]
    fn failures_counts_error_transitions() {
        let history = StatusHistory::new()
            .record(transition(Status::Idle, Status::Loading, 1))
            .record(transition(
                Status::Loading,
                Status::Failed("timeout".to_string()),
                1,
            ))
            .record(transition(
                Status::Failed("timeout".to_string()),
                Status::Loading,
                2,
            ))
            .record(transition(Status::Loading, Status::Idle, 2));

        assert_eq!(history.failures(), 1);
    }

    #[test]
    fn duration_calculates_elapsed_time() {
        let start = Utc::now();
        let history = StatusHistory::new()
            .record(StatusTransition {
                from: Status::Idle,
                to: Status::Loading,
                timestamp: start,
                attempt: 1,
            })
            .record(StatusTransition {
                from: Status::Loading,
                to: Status::Idle,
                timestamp: start + chrono::Duration::milliseconds(25),
                attempt: 1,
            });

        assert_eq!(history.duration(), Some(Duration::from_millis(25)));
    }

    #[test]
    fn history_serializes_correctly() {
        let history = StatusHistory::with_limit(4).record(transition(
            Status::Loading,
            Status::Failed("server".to_string()),
            3,
        ));

        let json = serde_json::to_string(&history).unwrap();
        let deserialized: StatusHistory<Status> = serde_json::from_str(&json).unwrap();

        assert_eq!(deserialized.len(), 1);
        assert_eq!(deserialized.limit(), 4);
        assert_eq!(deserialized.last(), history.last());
    }
}
