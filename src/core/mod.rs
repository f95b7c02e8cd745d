//! Core types and logic.
//!
//! This module contains the pure part of the engine:
//! - The public `Resource` value and the internal `RefreshStatus` machine
//! - The `combine` function deriving one from the other
//! - Bounded, immutable status history
//!
//! Nothing in this module spawns tasks or touches channels; the session
//! drives these functions from its tasks.

mod combine;
mod history;
mod phase;
mod resource;
mod status;

pub use combine::combine;
pub use history::{StatusHistory, StatusTransition, DEFAULT_HISTORY_LIMIT};
pub use phase::Phase;
pub use resource::Resource;
pub use status::RefreshStatus;
