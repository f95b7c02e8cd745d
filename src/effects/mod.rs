//! The tasks that drive a session.
//!
//! This is the imperative shell around the pure core: it consumes refresh
//! triggers, runs fetches, applies their outcomes to the status cell, and
//! republishes the combined resource whenever either input changes.
//!
//! # Tasks
//!
//! - **Trigger consumer**: one per session, lives as long as its scope
//! - **Fetch**: one per consumed trigger, may overlap with each other
//! - **Failure callback**: one per failed fetch, never awaited by the fetch
//! - **Combiner**: runs only while the session has subscribers

mod combiner;
mod refresh;

pub(crate) use combiner::run_combiner;
pub(crate) use refresh::consume_triggers;
