//! Value-semantics checks.
//!
//! A type under test implements [`Regular`]. Given two instances which
//! compare unequal and a mutator, [`check_semantics`] drives the canonical
//! operation sequence (precondition, copy, copy-assign, move, move-assign,
//! swap, mutation) and reports every broken invariant.
//!
//! Types that cannot be copied implement only [`MoveOnly`] and are checked
//! with [`check_move_only_semantics`], which takes a pair of clones built by
//! the caller to compare against.
//!
//! The same state machine serves resource-instrumented checks: those plug
//! an [`Actions`] implementation into it (see [`crate::allocation`]).

pub mod actions;
pub(crate) mod machine;

use std::cmp::Ordering;
use std::fmt;

use serde::Serialize;

use crate::logger::Reporter;

pub use actions::{Actions, NullActions};

// ---------------------------------------------------------------------------
// MoveOnly / Regular
// ---------------------------------------------------------------------------

/// A type that can be moved, move-assigned, swapped and compared for
/// equality, but not necessarily copied.
///
/// Each operation defaults to what Rust does natively.
pub trait MoveOnly: PartialEq + fmt::Debug + Sized {
    /// Move construction.
    #[must_use]
    fn move_construct(source: Self) -> Self {
        source
    }

    /// Move assignment: make `self` hold the value of `source`.
    fn move_assign(&mut self, source: Self) {
        *self = source;
    }

    /// Exchange the values of `self` and `other`.
    fn swap_values(&mut self, other: &mut Self) {
        std::mem::swap(self, other);
    }
}

/// A type with value semantics: copyable, movable, assignable, swappable and
/// equality comparable.
///
/// Copy construction is [`Clone::clone`]. Types whose operations interact
/// with a resource provider override the defaults to model provider
/// propagation.
pub trait Regular: MoveOnly + Clone {
    /// Copy assignment: make `self` equal to `source`.
    fn copy_assign(&mut self, source: &Self) {
        self.clone_from(source);
    }
}

macro_rules! impl_regular {
    ($($t:ty),* $(,)?) => {
        $(
            impl MoveOnly for $t {}
            impl Regular for $t {}
        )*
    };
}

impl_regular!(
    bool, char, i8, i16, i32, i64, i128, isize, u8, u16, u32, u64, u128, usize, f32, f64, String,
);

impl<T: PartialEq + fmt::Debug> MoveOnly for Vec<T> {}
impl<T: PartialEq + fmt::Debug> MoveOnly for Option<T> {}
impl<T: PartialEq + fmt::Debug> MoveOnly for Box<T> {}
impl<T: Clone + PartialEq + fmt::Debug> Regular for Vec<T> {}
impl<T: Clone + PartialEq + fmt::Debug> Regular for Option<T> {}
impl<T: Clone + PartialEq + fmt::Debug> Regular for Box<T> {}

// ---------------------------------------------------------------------------
// Comparison flavours
// ---------------------------------------------------------------------------

/// The comparison operator being checked for consistency.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Comparison {
    Equality,
    Inequality,
    LessThan,
    GreaterThan,
    Leq,
    Geq,
    ThreeWay,
}

impl fmt::Display for Comparison {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Equality => write!(f, "operator=="),
            Self::Inequality => write!(f, "operator!="),
            Self::LessThan => write!(f, "operator<"),
            Self::GreaterThan => write!(f, "operator>"),
            Self::Leq => write!(f, "operator<="),
            Self::Geq => write!(f, "operator>="),
            Self::ThreeWay => write!(f, "partial_cmp"),
        }
    }
}

// ---------------------------------------------------------------------------
// Verdict
// ---------------------------------------------------------------------------

/// Outcome of one run of the canonical operation sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case", tag = "verdict")]
pub enum Verdict {
    /// No check failed.
    Passed,
    /// The preconditions did not hold; nothing beyond them was checked.
    PreconditionViolated {
        /// Failures recorded during the run.
        failures: usize,
    },
    /// At least one check failed after the preconditions held.
    Failed {
        /// Failures recorded during the run.
        failures: usize,
    },
}

impl Verdict {
    /// True if the run recorded no failure.
    #[must_use]
    pub const fn passed(&self) -> bool {
        matches!(self, Self::Passed)
    }

    /// Number of failures recorded during the run.
    #[must_use]
    pub const fn failures(&self) -> usize {
        match self {
            Self::Passed => 0,
            Self::PreconditionViolated { failures } | Self::Failed { failures } => *failures,
        }
    }

    /// Fold in failures recorded before the run started.
    #[must_use]
    pub(crate) const fn with_prior_failures(self, prior: usize) -> Self {
        match self {
            Self::Passed if prior == 0 => Self::Passed,
            Self::Passed => Self::Failed { failures: prior },
            Self::PreconditionViolated { failures } => Self::PreconditionViolated {
                failures: failures + prior,
            },
            Self::Failed { failures } => Self::Failed {
                failures: failures + prior,
            },
        }
    }
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Passed => write!(f, "passed"),
            Self::PreconditionViolated { failures } => {
                write!(f, "precondition violated ({failures} failure(s))")
            }
            Self::Failed { failures } => write!(f, "failed ({failures} failure(s))"),
        }
    }
}

// ---------------------------------------------------------------------------
// Entry points
// ---------------------------------------------------------------------------

/// Label used for the outermost scope of a check: the caller's description
/// followed by the type under test.
pub(crate) fn describe<T>(description: &str) -> String {
    format!("{description}\n[{}]", std::any::type_name::<T>())
}

/// Check the value semantics of `T` using two unequal instances.
///
/// `mutator` must change the value of any instance it is applied to; it is
/// used to detect aliasing between copies.
pub fn check_semantics<T: Regular>(
    description: &str,
    reporter: &dyn Reporter,
    x: &T,
    y: &T,
    mutator: impl Fn(&mut T),
) -> Verdict {
    let _span = tracing::debug_span!("check_semantics", description).entered();
    let _sentry = crate::logger::Sentinel::new(reporter, &describe::<T>(description));
    machine::run(
        reporter,
        &mut NullActions,
        &machine::EqualityPreconditions,
        x,
        y,
        &mutator,
    )
}

/// As [`check_semantics`], additionally checking that the ordering operators
/// are consistent and that `x` relates to `y` as `order` states.
///
/// `order` must be [`Ordering::Less`] or [`Ordering::Greater`].
pub fn check_ordered_semantics<T: Regular + PartialOrd>(
    description: &str,
    reporter: &dyn Reporter,
    x: &T,
    y: &T,
    order: Ordering,
    mutator: impl Fn(&mut T),
) -> Verdict {
    let _span = tracing::debug_span!("check_ordered_semantics", description).entered();
    let _sentry = crate::logger::Sentinel::new(reporter, &describe::<T>(description));
    machine::run(
        reporter,
        &mut NullActions,
        &machine::OrderedPreconditions { order },
        x,
        y,
        &mutator,
    )
}

/// Check the semantics of a type lacking copy operations.
///
/// `x_clone` and `y_clone` must equal `x` and `y`; they are built by the
/// caller since `T` cannot copy itself, and are only ever compared against.
/// `x` and `y` are consumed by the run.
pub fn check_move_only_semantics<T: MoveOnly>(
    description: &str,
    reporter: &dyn Reporter,
    x: T,
    y: T,
    x_clone: &T,
    y_clone: &T,
    mutator: impl Fn(&mut T),
) -> Verdict {
    let _span = tracing::debug_span!("check_move_only_semantics", description).entered();
    let _sentry = crate::logger::Sentinel::new(reporter, &describe::<T>(description));
    machine::run_move_only(
        reporter,
        &mut NullActions,
        &machine::EqualityPreconditions,
        x,
        y,
        x_clone,
        y_clone,
        &mutator,
    )
}
