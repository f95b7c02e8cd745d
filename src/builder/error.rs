//! Errors raised while building a session.

use crate::config::ConfigViolation;
use thiserror::Error;

/// Errors that can occur when building a session with [`LoadBuilder`].
///
/// [`LoadBuilder`]: crate::builder::LoadBuilder
#[derive(Debug, Error)]
pub enum BuildError {
    #[error("Observed source not specified. Call .observe(source) before .build()")]
    MissingObserve,

    #[error("Fetch operation not specified. Call .fetch(operation) before .build()")]
    MissingFetch,

    #[error("Invalid session config: {}", format_violations(.0))]
    InvalidConfig(Vec<ConfigViolation>),

    #[error("No Tokio runtime available. Sessions must be created inside a runtime")]
    NoRuntime,
}

fn format_violations(violations: &[ConfigViolation]) -> String {
    violations
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_config_lists_every_violation() {
        let error = BuildError::InvalidConfig(vec![
            ConfigViolation::EmptyName,
            ConfigViolation::ZeroHistoryLimit,
        ]);

        assert_eq!(
            error.to_string(),
            "Invalid session config: Session name must not be empty; History limit must be at least 1"
        );
    }
}
