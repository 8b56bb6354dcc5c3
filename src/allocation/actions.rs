//! Allocation actions: the capability set that adds resource accounting to
//! the canonical operation sequence.
//!
//! Each `pre_*` hook snapshots every provider slot; the matching `post_*`
//! hook consumes those snapshots and compares the deltas with the slot's
//! shifted predictions.

use super::checker::{checkers, dual_checkers, AllocationChecker, DualAllocationChecker};
use super::info::Slot;
use super::prediction::{events, Prediction};
use crate::checks::check;
use crate::logger::{FailureKind, Reporter};
use crate::semantics::{Actions, Comparison, MoveOnly};

pub struct AllocationActions<T> {
    slots: Vec<Slot<T>>,
    singles: Vec<AllocationChecker<T>>,
    duals: Vec<DualAllocationChecker<T>>,
}

impl<T> AllocationActions<T> {
    #[must_use]
    pub const fn new(slots: Vec<Slot<T>>) -> Self {
        Self {
            slots,
            singles: Vec::new(),
            duals: Vec::new(),
        }
    }

    #[must_use]
    pub fn slots(&self) -> &[Slot<T>] {
        &self.slots
    }

    fn snapshot(&mut self, value: &T) {
        self.singles = checkers(&self.slots, value);
    }

    fn snapshot_pair(&mut self, x: &T, y: &T) {
        self.duals = dual_checkers(&self.slots, x, y);
    }

    /// True when every slot propagates on both move assignment and swap.
    fn swap_steals(&self) -> bool {
        self.slots.iter().all(|s| {
            let p = s.propagation();
            p.move_assignment && p.swap
        })
    }
}

impl<T: MoveOnly> Actions<T> for AllocationActions<T> {
    fn pre_comparison(&mut self, x: &T) {
        self.snapshot(x);
    }

    fn post_comparison(
        &mut self,
        reporter: &dyn Reporter,
        comparison: Comparison,
        x: &T,
        tag: &str,
    ) -> bool {
        let detail = format!("Unexpected allocation detected for {comparison} {tag}");
        let mut ok = true;
        for checker in std::mem::take(&mut self.singles) {
            ok &= checker.check(&detail, reporter, x, Prediction::<events::Comparison>::new(0));
        }
        ok
    }

    fn pre_copy(&mut self, x: &T, y: &T) {
        self.snapshot_pair(x, y);
    }

    fn post_copy(&mut self, reporter: &dyn Reporter, x_copy: &T, y_copy: &T) {
        for dual in std::mem::take(&mut self.duals) {
            let predictions = *dual.slot().predictions();
            dual.first().check(
                "Unexpected allocation detected for copy construction (x)",
                reporter,
                x_copy,
                predictions.x.copy,
            );
            dual.second().check(
                "Unexpected allocation detected for copy construction (y)",
                reporter,
                y_copy,
                predictions.y.copy,
            );
        }
    }

    fn pre_copy_assign(&mut self, target: &T, source: &T) {
        self.snapshot_pair(target, source);
    }

    fn post_copy_assign(&mut self, reporter: &dyn Reporter, target: &T, source: &T) {
        for dual in std::mem::take(&mut self.duals) {
            dual.check_copy_assign_y_to_x(reporter, target, source);
        }
    }

    fn pre_move(&mut self, source: &T) {
        self.snapshot(source);
    }

    fn post_move(&mut self, reporter: &dyn Reporter, moved: &T) {
        for checker in std::mem::take(&mut self.singles) {
            let prediction = checker.slot().predictions().y.move_;
            checker.check(
                "Unexpected allocation detected for move construction",
                reporter,
                moved,
                prediction,
            );
        }
    }

    fn pre_move_assign(&mut self, target: &T, source: &T) {
        self.snapshot_pair(target, source);
    }

    fn post_move_assign(
        &mut self,
        reporter: &dyn Reporter,
        target: &mut T,
        y: &T,
        mutator: &dyn Fn(&mut T),
    ) {
        for dual in std::mem::take(&mut self.duals) {
            dual.check_move_assign_y_to_x(reporter, target);
        }

        self.snapshot(target);
        mutator(target);
        for checker in std::mem::take(&mut self.singles) {
            let prediction = checker.slot().predictions().y.mutation;
            checker.check(
                "Unexpected allocation detected for mutation after move assignment",
                reporter,
                target,
                prediction,
            );
        }

        check(
            "Mutation is not doing anything following move assignment",
            reporter,
            FailureKind::Semantics,
            target != y,
        );
    }

    fn swap_enabled(&self) -> bool {
        self.slots
            .iter()
            .all(|s| s.propagation().swap || s.is_always_equal())
    }

    fn pre_swap(&mut self, x: &T, y: &T) {
        self.snapshot_pair(x, y);
    }

    fn post_swap(
        &mut self,
        reporter: &dyn Reporter,
        x: &mut T,
        y: &T,
        y_clone: &T,
        mutator: &dyn Fn(&mut T),
    ) {
        let duals = std::mem::take(&mut self.duals);

        if self.swap_steals() {
            for dual in &duals {
                dual.check_no_allocation::<events::Swap>("Swap", reporter, y, x);
            }
        }

        mutator(x);
        for dual in &duals {
            dual.check_mutation_after_swap(reporter, x, y);
        }

        check(
            "Mutation is not doing anything following swap",
            reporter,
            FailureKind::Semantics,
            x != y_clone,
        );
    }
}
