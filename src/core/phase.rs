//! The `Phase` trait shared by the status machine and the resource type.
//!
//! Both the internal refresh status and the public resource value describe
//! where a logical data stream currently stands. This trait exposes that
//! position through pure inspection methods so history, logging and
//! diagnostics can treat them uniformly.

use std::fmt::Debug;

/// Trait for values that describe the phase of a refreshable data stream.
///
/// All methods are pure - no side effects.
///
/// # Required Traits
///
/// - `Clone`: Phases must be cloneable for history tracking
/// - `Debug`: Phases must be debuggable for diagnostics
/// - `Send` + `Sync`: Phases cross task boundaries inside a session
///
/// # Example
///
/// ```rust
/// use tidemark::core::Phase;
///
/// #[derive(Clone, Debug)]
/// enum Upload {
///     Queued,
///     Sending,
///     Done,
///     Rejected,
/// }
///
/// impl Phase for Upload {
///     fn name(&self) -> &str {
///         match self {
///             Self::Queued => "Queued",
///             Self::Sending => "Sending",
///             Self::Done => "Done",
///             Self::Rejected => "Rejected",
///         }
///     }
///
///     fn is_settled(&self) -> bool {
///         matches!(self, Self::Done | Self::Rejected)
///     }
///
///     fn is_error(&self) -> bool {
///         matches!(self, Self::Rejected)
///     }
/// }
///
/// assert!(Upload::Done.is_settled());
/// assert!(!Upload::Sending.is_settled());
/// ```
pub trait Phase: Clone + Debug + Send + Sync {
    /// Get the phase's name for display/logging.
    fn name(&self) -> &str;

    /// Check if no work is in flight for this phase.
    ///
    /// A settled phase only changes again when something external happens:
    /// a new trigger, or a new value from the observed source.
    ///
    /// Default implementation returns `false`.
    fn is_settled(&self) -> bool {
        false
    }

    /// Check if this phase reports a failure.
    ///
    /// Default implementation returns `false`.
    fn is_error(&self) -> bool {
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Clone, PartialEq, Debug)]
    enum TestPhase {
        Waiting,
        Working,
        Finished,
        Broken,
    }

    impl Phase for TestPhase {
        fn name(&self) -> &str {
            match self {
                Self::Waiting => "Waiting",
                Self::Working => "Working",
                Self::Finished => "Finished",
                Self::Broken => "Broken",
            }
        }

        fn is_settled(&self) -> bool {
            matches!(self, Self::Finished | Self::Broken)
        }

        fn is_error(&self) -> bool {
            matches!(self, Self::Broken)
        }
    }

    #[derive(Clone, Debug)]
    struct Bare;

    impl Phase for Bare {
        fn name(&self) -> &str {
            "Bare"
        }
    }

    #[test]
    fn phase_name_returns_correct_value() {
        assert_eq!(TestPhase::Waiting.name(), "Waiting");
        assert_eq!(TestPhase::Working.name(), "Working");
        assert_eq!(TestPhase::Finished.name(), "Finished");
        assert_eq!(TestPhase::Broken.name(), "Broken");
    }

    #[test]
    fn is_settled_identifies_quiet_phases() {
        assert!(!TestPhase::Waiting.is_settled());
        assert!(!TestPhase::Working.is_settled());
        assert!(TestPhase::Finished.is_settled());
        assert!(TestPhase::Broken.is_settled());
    }

    #[test]
    fn is_error_identifies_error_phases() {
        assert!(!TestPhase::Working.is_error());
        assert!(!TestPhase::Finished.is_error());
        assert!(TestPhase::Broken.is_error());
    }

    #[test]
    fn defaults_are_unsettled_and_healthy() {
        assert!(!Bare.is_settled());
        assert!(!Bare.is_error());
    }
}
