//! Configuration errors of a semantics check.
//!
//! Contract violations found by a check are never errors: they are logged
//! with the reporter and summarised in a [`crate::Verdict`]. The errors here
//! are raised before any check runs, when the check itself is set up
//! wrongly. Each message states the problem and how to fix it.

use std::fmt;

use crate::allocation::shifter::ShiftEnvironment;
use crate::config::ConfigError;

// ---------------------------------------------------------------------------
// SemanticsError
// ---------------------------------------------------------------------------

/// A check could not be run as requested.
#[derive(Debug)]
pub enum SemanticsError {
    /// An allocation check was given no provider descriptors.
    NoProviders,

    /// The number of nested predictions does not match the depth of a
    /// provider chain.
    LevelMismatch {
        /// Nested levels of the chain (its depth minus the top level).
        expected: usize,
        /// Nested predictions supplied.
        supplied: usize,
    },

    /// A provider chain has no levels.
    EmptyChain {
        /// Type name of the chain.
        provider: &'static str,
    },

    /// A different shift environment is already in effect.
    EnvironmentInstalled {
        /// The environment in effect.
        existing: ShiftEnvironment,
    },

    /// The shift configuration could not be loaded.
    Config(ConfigError),
}

// ---------------------------------------------------------------------------
// Display
// ---------------------------------------------------------------------------

impl fmt::Display for SemanticsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoProviders => {
                write!(
                    f,
                    "no provider descriptors supplied for an allocation check.\n  To fix: pass at least one AllocationInfo, or use semantics::check_semantics for types without providers."
                )
            }
            Self::LevelMismatch { expected, supplied } => {
                write!(
                    f,
                    "provider chain has {expected} nested level(s) but {supplied} nested prediction(s) were supplied.\n  To fix: supply exactly one set of predictions per nested level, outermost first."
                )
            }
            Self::EmptyChain { provider } => {
                write!(
                    f,
                    "provider chain '{provider}' has no levels.\n  To fix: use a chain with at least one level."
                )
            }
            Self::EnvironmentInstalled { existing } => {
                write!(
                    f,
                    "a different shift environment is already in effect (active: {}).\n  To fix: install the environment once, before the first check runs, or pass it to each descriptor with AllocationInfo::with_environment.",
                    existing.is_active()
                )
            }
            Self::Config(err) => {
                write!(
                    f,
                    "shift configuration error: {err}\n  To fix: edit the config file and correct the issue."
                )
            }
        }
    }
}

// ---------------------------------------------------------------------------
// std::error::Error
// ---------------------------------------------------------------------------

impl std::error::Error for SemanticsError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Config(err) => Some(err),
            _ => None,
        }
    }
}

// ---------------------------------------------------------------------------
// From impls
// ---------------------------------------------------------------------------

impl From<ConfigError> for SemanticsError {
    fn from(err: ConfigError) -> Self {
        Self::Config(err)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
