//! Session configuration and its validation.
//!
//! Validation uses Stillwater's `Validation` type to accumulate every
//! violation instead of stopping at the first one.

use serde::{Deserialize, Serialize};
use std::time::Duration;
use stillwater::validation::Validation;
use stillwater::NonEmptyVec;
use thiserror::Error;

use crate::core::DEFAULT_HISTORY_LIMIT;

/// How long the combiner keeps running after the last subscriber leaves.
pub const DEFAULT_GRACE_PERIOD: Duration = Duration::from_secs(5);

/// Upper bound accepted for the grace period.
pub const MAX_GRACE_PERIOD: Duration = Duration::from_secs(60 * 60);

/// Problems found while validating a [`SessionConfig`].
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ConfigViolation {
    #[error("Session name must not be empty")]
    EmptyName,

    #[error("History limit must be at least 1")]
    ZeroHistoryLimit,

    #[error("Grace period ({actual:?}) exceeds maximum ({max:?})")]
    GracePeriodTooLong { max: Duration, actual: Duration },
}

/// Tunables of a single session.
///
/// ```rust
/// use std::time::Duration;
/// use tidemark::config::SessionConfig;
///
/// let config: SessionConfig = serde_json::from_str(r#"{ "name": "profile" }"#).unwrap();
/// assert_eq!(config.name, "profile");
/// assert_eq!(config.grace_period, Duration::from_secs(5));
/// assert!(config.validate().is_success());
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Label used in logs and snapshots.
    pub name: String,

    /// Delay before the combiner stops once nobody is subscribed.
    pub grace_period: Duration,

    /// Number of status transitions kept for diagnostics.
    pub history_limit: usize,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            name: "resource".to_string(),
            grace_period: DEFAULT_GRACE_PERIOD,
            history_limit: DEFAULT_HISTORY_LIMIT,
        }
    }
}

impl SessionConfig {
    /// Check every rule, accumulating ALL violations.
    pub fn validate(&self) -> Validation<(), NonEmptyVec<ConfigViolation>> {
        let checks = vec![
            self.check_name(),
            self.check_history_limit(),
            self.check_grace_period(),
        ];

        Validation::all_vec(checks).map(|_| ())
    }

    /// Violations as a plain list; empty when the config is valid.
    pub fn violations(&self) -> Vec<ConfigViolation> {
        match self.validate() {
            Validation::Success(_) => Vec::new(),
            Validation::Failure(errors) => errors.iter().cloned().collect(),
        }
    }

    fn check_name(&self) -> Validation<(), NonEmptyVec<ConfigViolation>> {
        if self.name.trim().is_empty() {
            Validation::fail(ConfigViolation::EmptyName)
        } else {
            Validation::success(())
        }
    }

    fn check_history_limit(&self) -> Validation<(), NonEmptyVec<ConfigViolation>> {
        if self.history_limit == 0 {
            Validation::fail(ConfigViolation::ZeroHistoryLimit)
        } else {
            Validation::success(())
        }
    }

    fn check_grace_period(&self) -> Validation<(), NonEmptyVec<ConfigViolation>> {
        if self.grace_period > MAX_GRACE_PERIOD {
            Validation::fail(ConfigViolation::GracePeriodTooLong {
                max: MAX_GRACE_PERIOD,
                actual: self.grace_period,
            })
        } else {
            Validation::success(())
        }
    }
}
