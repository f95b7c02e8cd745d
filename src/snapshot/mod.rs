//! Read-only diagnostics snapshots of a session.
//!
//! A snapshot captures everything needed to explain what a session is doing
//! right now: the resource it publishes, its refresh status, the recent
//! status history and fetch counters. Snapshots serialize with serde for
//! logging and debugging; there is no way to restore a session from one.

use crate::core::{RefreshStatus, Resource, StatusHistory};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Counters and timestamps tracked by a session.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionMetadata {
    /// When the session was created
    pub created_at: DateTime<Utc>,

    /// When a resource was last published
    pub updated_at: DateTime<Utc>,

    pub fetch_started: u64,
    pub fetch_succeeded: u64,
    pub fetch_failed: u64,

    /// Live subscriptions at the time of the snapshot
    pub subscribers: usize,
}

impl SessionMetadata {
    /// Fetches that have not reported an outcome yet.
    ///
    /// Includes fetches abandoned when the scope was cancelled.
    pub fn fetch_in_flight(&self) -> u64 {
        self.fetch_started
            .saturating_sub(self.fetch_succeeded + self.fetch_failed)
    }
}

/// Point-in-time view of a session.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SessionSnapshot<T, E> {
    pub id: Uuid,
    pub name: String,
    pub taken_at: DateTime<Utc>,
    pub resource: Resource<T, E>,
    pub status: RefreshStatus<E>,
    pub history: StatusHistory<RefreshStatus<E>>,
    pub metadata: SessionMetadata,
}

impl<T: Serialize, E: Serialize> SessionSnapshot<T, E> {
    /// Render the snapshot as pretty-printed JSON.
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}
