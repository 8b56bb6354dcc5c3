//! Checkers: snapshots of provider state, compared with predictions after
//! the operation they bracket.
//!
//! Every comparison is relative. A checker records the acquisition count
//! before an operation; afterwards the count of the instance under scrutiny
//! minus that snapshot must equal the shifted prediction.

use std::fmt::Write as _;

use super::info::{AllocationSlot, Slot};
use super::prediction::{events, Event, Prediction};
use super::provider::Propagation;
use crate::logger::{FailureKind, Reporter};

// ---------------------------------------------------------------------------
// Core comparison
// ---------------------------------------------------------------------------

/// Hint for the common ways an accounting failure comes about.
fn advice(obtained: i32, predicted: i32, propagation: Propagation) -> Option<String> {
    if predicted == 0 && obtained > 0 {
        Some(format!(
            "an operation predicted not to acquire did so; if it copies through \
             the provider, check the propagation flags ({propagation})"
        ))
    } else if predicted > 0 && obtained == 0 {
        Some(
            "no acquisition was observed; the operation may be stealing resources \
             or sharing the provider rather than copying"
                .to_owned(),
        )
    } else if obtained != 0 && obtained.checked_rem(predicted) == Some(0) {
        Some(format!(
            "obtained is {}x the prediction; for a nested level, check the \
             sub-container counts",
            obtained / predicted
        ))
    } else {
        None
    }
}

fn check_allocation<T, E: Event>(
    detail: &str,
    reporter: &dyn Reporter,
    slot: &dyn AllocationSlot<T>,
    container: &T,
    previous: i32,
    prediction: Prediction<E>,
) -> bool {
    reporter.log_check();

    let obtained = slot.count(container) - previous;
    if obtained == prediction.value() {
        return true;
    }

    let mut message = format!(
        "{}\n{detail}\n  Propagation: {}\n  Obtained : {obtained}\n  Predicted: {}",
        slot.provider_name(),
        slot.propagation(),
        prediction.value(),
    );
    if prediction.shift() != 0 {
        let _ = write!(
            message,
            " (unshifted {}, shift {})",
            prediction.unshifted(),
            prediction.shift()
        );
    }
    if let Some(advice) = advice(
        obtained - prediction.shift(),
        prediction.unshifted(),
        slot.propagation(),
    ) {
        let _ = write!(message, "\n  Advice: {advice}");
    }

    reporter.log_failure(FailureKind::Accounting, &message);
    false
}

// ---------------------------------------------------------------------------
// AllocationChecker
// ---------------------------------------------------------------------------

/// Snapshot of a single instance's provider.
pub struct AllocationChecker<T> {
    slot: Slot<T>,
    prior: i32,
}

impl<T> AllocationChecker<T> {
    /// Snapshot the provider of `value`.
    pub fn new(slot: Slot<T>, value: &T) -> Self {
        let prior = slot.count(value);
        Self { slot, prior }
    }

    /// A checker whose snapshot is `prior`, typically zero for an instance
    /// built with fresh providers.
    pub const fn from_count(slot: Slot<T>, prior: i32) -> Self {
        Self { slot, prior }
    }

    #[must_use]
    pub const fn prior(&self) -> i32 {
        self.prior
    }

    #[must_use]
    pub fn slot(&self) -> &dyn AllocationSlot<T> {
        &*self.slot
    }

    /// Compare the acquisitions made since the snapshot with `prediction`.
    pub fn check<E: Event>(
        &self,
        detail: &str,
        reporter: &dyn Reporter,
        container: &T,
        prediction: Prediction<E>,
    ) -> bool {
        check_allocation(detail, reporter, &*self.slot, container, self.prior, prediction)
    }
}

// ---------------------------------------------------------------------------
// DualAllocationChecker
// ---------------------------------------------------------------------------

/// Snapshot of a cooperating pair: both acquisition counts plus whether the
/// two providers compared equal.
pub struct DualAllocationChecker<T> {
    slot: Slot<T>,
    first: i32,
    second: i32,
    providers_equal: bool,
}

impl<T> DualAllocationChecker<T> {
    pub fn new(slot: Slot<T>, x: &T, y: &T) -> Self {
        Self {
            first: slot.count(x),
            second: slot.count(y),
            providers_equal: slot.providers_equal(x, y),
            slot,
        }
    }

    #[must_use]
    pub const fn first_count(&self) -> i32 {
        self.first
    }

    #[must_use]
    pub const fn second_count(&self) -> i32 {
        self.second
    }

    #[must_use]
    pub const fn providers_equal(&self) -> bool {
        self.providers_equal
    }

    #[must_use]
    pub fn slot(&self) -> &dyn AllocationSlot<T> {
        &*self.slot
    }

    /// Checker for the first instance alone.
    #[must_use]
    pub fn first(&self) -> AllocationChecker<T> {
        AllocationChecker::from_count(self.slot.clone(), self.first)
    }

    /// Checker for the second instance alone.
    #[must_use]
    pub fn second(&self) -> AllocationChecker<T> {
        AllocationChecker::from_count(self.slot.clone(), self.second)
    }

    /// Assert that neither instance acquired anything during an `E` event.
    pub fn check_no_allocation<E: Event>(
        &self,
        detail: &str,
        reporter: &dyn Reporter,
        x: &T,
        y: &T,
    ) -> bool {
        let none = Prediction::<E>::new(0);
        let x_ok = check_allocation(
            &format!("{detail}\nUnexpected allocation detected (x)"),
            reporter,
            &*self.slot,
            x,
            self.first,
            none,
        );
        let y_ok = check_allocation(
            &format!("{detail}\nUnexpected allocation detected (y)"),
            reporter,
            &*self.slot,
            y,
            self.second,
            none,
        );
        x_ok && y_ok
    }

    /// After `x = y`. A propagating assignment moves `x` onto `y`'s provider,
    /// so `x` is measured from `y`'s snapshot and `y` sees the same
    /// acquisitions as a spectator. Otherwise `x` acquires from its own
    /// provider and `y` must be untouched.
    pub fn check_copy_assign_y_to_x(&self, reporter: &dyn Reporter, x: &T, y: &T) {
        let predictions = self.slot.predictions().assign_y_to_x;
        let slot = &*self.slot;

        if slot.propagation().copy_assignment {
            let x_prediction = predictions.with_propagation;
            check_allocation(
                "Unexpected allocation detected for propagating copy assignment (x)",
                reporter,
                slot,
                x,
                self.second,
                x_prediction,
            );
            check_allocation(
                "Unexpected allocation detected for propagating copy assignment (y)",
                reporter,
                slot,
                y,
                self.second,
                x_prediction.convert::<events::Spectator>(),
            );
        } else {
            check_allocation(
                "Unexpected allocation detected for copy assignment (x)",
                reporter,
                slot,
                x,
                self.first,
                predictions.without_propagation,
            );
            check_allocation(
                "Unexpected allocation detected for copy assignment (y)",
                reporter,
                slot,
                y,
                self.second,
                Prediction::<events::Spectator>::new(0),
            );
        }
    }

    /// After `x = move(y)`. With equal providers, or a propagating move, `x`
    /// now owns `y`'s resources; otherwise the move degenerates to an
    /// element-wise copy into `x`'s own provider.
    pub fn check_move_assign_y_to_x(&self, reporter: &dyn Reporter, x: &T) {
        let predictions = self.slot.predictions().assign_y_to_x;
        let slot = &*self.slot;

        if self.providers_equal || slot.propagation().move_assignment {
            check_allocation(
                "Unexpected allocation detected for propagating move assignment (x)",
                reporter,
                slot,
                x,
                self.second,
                predictions.move_,
            );
        } else {
            check_allocation(
                "Unexpected allocation detected for move assignment (x)",
                reporter,
                slot,
                x,
                self.first,
                predictions.move_without_propagation,
            );
        }
    }

    /// After swapping the pair and mutating `lhs`. The snapshots follow the
    /// providers when swap propagates.
    pub fn check_mutation_after_swap(&self, reporter: &dyn Reporter, lhs: &T, rhs: &T) {
        let (lh_count, rh_count) = if self.slot.propagation().swap {
            (self.second, self.first)
        } else {
            (self.first, self.second)
        };
        let slot = &*self.slot;

        check_allocation(
            "Unexpected allocation detected following mutation after swap (y)",
            reporter,
            slot,
            lhs,
            lh_count,
            slot.predictions().y.mutation,
        );
        check_allocation(
            "Unexpected allocation detected following mutation after swap (x)",
            reporter,
            slot,
            rhs,
            rh_count,
            Prediction::<events::Spectator>::new(0),
        );
    }
}

/// Snapshot every slot for `value`.
pub fn checkers<T>(slots: &[Slot<T>], value: &T) -> Vec<AllocationChecker<T>> {
    slots
        .iter()
        .map(|slot| AllocationChecker::new(slot.clone(), value))
        .collect()
}

/// Snapshot every slot for the pair `x`, `y`.
pub fn dual_checkers<T>(slots: &[Slot<T>], x: &T, y: &T) -> Vec<DualAllocationChecker<T>> {
    slots
        .iter()
        .map(|slot| DualAllocationChecker::new(slot.clone(), x, y))
        .collect()
}
