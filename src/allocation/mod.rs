//! Allocation-aware semantics checks.
//!
//! These run the same canonical operation sequence as
//! [`crate::semantics::check_semantics`], with [`actions::AllocationActions`]
//! plugged in: around every step, each provider slot of the type under test
//! is snapshotted and the acquisitions made are compared with the slot's
//! predictions.
//!
//! Predictions are supplied per provider slot through descriptors
//! ([`AllocationInfo`] for a single provider, [`ScopedAllocationInfo`] for a
//! chain). Before any check runs, descriptors are flattened into one slot per
//! provider level and their predictions shifted for the environment.

pub mod actions;
pub mod checker;
pub mod info;
pub mod prediction;
pub mod provider;
pub mod shifter;

use std::cmp::Ordering;

pub use actions::AllocationActions;
pub use checker::{AllocationChecker, DualAllocationChecker};
pub use info::{AllocationInfo, AllocationSlot, Descriptor, ScopedAllocationInfo, Slot};
pub use prediction::{
    AllocationPredictions, AssignmentPredictions, ContainerCounts, IndividualPredictions, Level,
    MoveOnlyPredictions, Prediction,
};
pub use provider::{
    CopyPropagatingProvider, CountingProvider, NonPropagatingProvider, Propagation,
    PropagatingProvider, ScopedCountingProvider, ScopedProvider, SharedCountingProvider,
};
pub use shifter::{EquivalenceClass, OverheadTable, ShiftEnvironment, Shifter, Side};

use self::checker::checkers;
use self::prediction::events;
use crate::checks::{check, check_same};
use crate::error::SemanticsError;
use crate::logger::{FailureKind, Reporter, Sentinel};
use crate::semantics::machine::{self, EqualityPreconditions, OrderedPreconditions};
use crate::semantics::{describe, MoveOnly, Regular, Verdict};

/// A type that can be copied or moved onto freshly made providers.
pub trait ParaConstructible: Regular {
    /// Copy of `self` whose providers are new, with no acquisitions yet.
    #[must_use]
    fn para_copy(&self) -> Self;

    /// `source`, moved onto new providers.
    #[must_use]
    fn para_move(source: Self) -> Self;
}

fn prepare_slots<T>(descriptors: &[&dyn Descriptor<T>]) -> Result<Vec<Slot<T>>, SemanticsError> {
    let slots = info::flatten_all(descriptors)?;
    if slots.is_empty() {
        return Err(SemanticsError::NoProviders);
    }
    tracing::debug!(
        descriptors = descriptors.len(),
        slots = slots.len(),
        "flattened provider descriptors"
    );
    Ok(slots)
}

// ---------------------------------------------------------------------------
// Entry points
// ---------------------------------------------------------------------------

/// Check the value semantics of `T` and the acquisitions every operation
/// makes from each described provider.
///
/// # Errors
/// [`SemanticsError::NoProviders`] if `descriptors` flatten to nothing;
/// [`SemanticsError::Config`] if a descriptor without its own environment
/// meets a malformed shift configuration. No check is run in either case.
pub fn check_semantics<T: Regular>(
    description: &str,
    reporter: &dyn Reporter,
    x: &T,
    y: &T,
    mutator: impl Fn(&mut T),
    descriptors: &[&dyn Descriptor<T>],
) -> Result<Verdict, SemanticsError> {
    let slots = prepare_slots(descriptors)?;
    let _span = tracing::debug_span!("check_semantics", description).entered();
    let _sentry = Sentinel::new(reporter, &describe::<T>(description));

    Ok(machine::run(
        reporter,
        &mut AllocationActions::new(slots),
        &EqualityPreconditions,
        x,
        y,
        &mutator,
    ))
}

/// As [`check_semantics`], additionally checking the ordering operators and
/// that `x` relates to `y` as `order` states.
///
/// # Errors
/// As [`check_semantics`].
pub fn check_ordered_semantics<T: Regular + PartialOrd>(
    description: &str,
    reporter: &dyn Reporter,
    x: &T,
    y: &T,
    order: Ordering,
    mutator: impl Fn(&mut T),
    descriptors: &[&dyn Descriptor<T>],
) -> Result<Verdict, SemanticsError> {
    let slots = prepare_slots(descriptors)?;
    let _span = tracing::debug_span!("check_ordered_semantics", description).entered();
    let _sentry = Sentinel::new(reporter, &describe::<T>(description));

    Ok(machine::run(
        reporter,
        &mut AllocationActions::new(slots),
        &OrderedPreconditions { order },
        x,
        y,
        &mutator,
    ))
}

/// Check the semantics of a `T` lacking copy operations, together with the
/// acquisitions its moves, swap and mutation make from each described
/// provider.
///
/// Predictions are written as [`MoveOnlyPredictions`] and converted into the
/// descriptor's [`AllocationPredictions`]. `x_clone` and `y_clone` must
/// equal `x` and `y` and are only compared against.
///
/// # Errors
/// As [`check_semantics`].
#[allow(clippy::too_many_arguments)]
pub fn check_move_only_semantics<T: MoveOnly>(
    description: &str,
    reporter: &dyn Reporter,
    x: T,
    y: T,
    x_clone: &T,
    y_clone: &T,
    mutator: impl Fn(&mut T),
    descriptors: &[&dyn Descriptor<T>],
) -> Result<Verdict, SemanticsError> {
    let slots = prepare_slots(descriptors)?;
    let _span = tracing::debug_span!("check_move_only_semantics", description).entered();
    let _sentry = Sentinel::new(reporter, &describe::<T>(description));

    Ok(machine::run_move_only(
        reporter,
        &mut AllocationActions::new(slots),
        &EqualityPreconditions,
        x,
        y,
        x_clone,
        y_clone,
        &mutator,
    ))
}

/// Build `x` and `y` from factories, check the acquisitions their
/// construction made, run [`check_semantics`] on them and hand them back.
///
/// The factories must build every instance on fresh providers.
///
/// # Errors
/// As [`check_semantics`]. Neither factory is called in that case.
pub fn check_semantics_from<T: Regular>(
    description: &str,
    reporter: &dyn Reporter,
    make_x: impl FnOnce() -> T,
    make_y: impl FnOnce() -> T,
    mutator: impl Fn(&mut T),
    descriptors: &[&dyn Descriptor<T>],
) -> Result<(T, T, Verdict), SemanticsError> {
    let slots = prepare_slots(descriptors)?;
    let _span = tracing::debug_span!("check_semantics_from", description).entered();
    let sentry = Sentinel::new(reporter, &describe::<T>(description));

    let x = make_x();
    let y = make_y();
    check_initialization(reporter, &slots, &x, &y);
    let initialization_failures = sentry.failures_since_entry();

    let verdict = machine::run(
        reporter,
        &mut AllocationActions::new(slots),
        &EqualityPreconditions,
        &x,
        &y,
        &mutator,
    );

    Ok((x, y, verdict.with_prior_failures(initialization_failures)))
}

/// Para-copy and para-move `y`, checking the results and the acquisitions
/// made from the new providers. Usually run after [`check_semantics`] has
/// passed.
///
/// # Errors
/// As [`check_semantics`].
pub fn check_para_constructor_allocations<T: ParaConstructible>(
    description: &str,
    reporter: &dyn Reporter,
    y: &T,
    mutator: impl Fn(&mut T),
    descriptors: &[&dyn Descriptor<T>],
) -> Result<Verdict, SemanticsError> {
    let slots = prepare_slots(descriptors)?;
    let _span = tracing::debug_span!("check_para_constructor_allocations", description).entered();
    let sentry = Sentinel::new(reporter, &describe::<T>(description));

    check_para_copy_and_move(reporter, &slots, y, &mutator);

    Ok(if sentry.failure_detected() {
        Verdict::Failed {
            failures: sentry.failures_since_entry(),
        }
    } else {
        Verdict::Passed
    })
}

// ---------------------------------------------------------------------------
// Supplementary checks
// ---------------------------------------------------------------------------

fn check_initialization<T>(reporter: &dyn Reporter, slots: &[Slot<T>], x: &T, y: &T) {
    for slot in slots {
        let predictions = slot.predictions();
        let checker = AllocationChecker::from_count(slot.clone(), 0);
        checker.check(
            "Unexpected allocation detected for initialization (x)",
            reporter,
            x,
            predictions.x.copy.convert::<events::Initialization>(),
        );
        checker.check(
            "Unexpected allocation detected for initialization (y)",
            reporter,
            y,
            predictions.y.copy.convert::<events::Initialization>(),
        );
    }
}

fn check_para_copy_and_move<T: ParaConstructible>(
    reporter: &dyn Reporter,
    slots: &[Slot<T>],
    y: &T,
    mutator: &dyn Fn(&mut T),
) {
    tracing::debug!("state: para-copy");
    let u = y.para_copy();
    if check_same("Inconsistent para-copy construction", reporter, &u, y) {
        for slot in slots {
            AllocationChecker::from_count(slot.clone(), 0).check(
                "Unexpected allocation detected for para-copy construction",
                reporter,
                &u,
                slot.predictions().y.para_copy,
            );
        }
    }

    tracing::debug!("state: para-move");
    let mut v = T::para_move(u);
    if !check_same("Inconsistent para-move construction", reporter, &v, y) {
        return;
    }
    for slot in slots {
        AllocationChecker::from_count(slot.clone(), 0).check(
            "Unexpected allocation detected for para-move construction",
            reporter,
            &v,
            slot.predictions().y.para_move,
        );
    }

    let pending = checkers(slots, &v);
    mutator(&mut v);
    for checker in pending {
        let prediction = checker.slot().predictions().y.mutation;
        checker.check(
            "Unexpected allocation detected for mutation after para-move construction",
            reporter,
            &v,
            prediction,
        );
    }
    check(
        "Mutation is not doing anything following para-move construction",
        reporter,
        FailureKind::Semantics,
        v != *y,
    );
}
