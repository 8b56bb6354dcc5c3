//! Hook points of the canonical operation sequence.
//!
//! The state machine calls a `pre_*` hook immediately before an operation
//! and the matching `post_*` hook immediately after it, passing the
//! instances involved. Every hook defaults to doing nothing, so an
//! implementation only provides the capabilities it needs: [`NullActions`]
//! provides none, allocation actions provide all of them.

use super::{Comparison, MoveOnly};
use crate::logger::Reporter;

/// Capability set plugged into the canonical operation sequence.
#[allow(unused_variables)]
pub trait Actions<T: MoveOnly> {
    /// Called once, before the preconditions are checked.
    fn prepare(&mut self, x: &T, y: &T) {}

    /// Called before a comparison operator is applied to `x`.
    fn pre_comparison(&mut self, x: &T) {}

    /// Called after a comparison operator was applied to `x`. Returning
    /// `false` marks the comparison inconsistent, which fails the
    /// preconditions.
    fn post_comparison(
        &mut self,
        reporter: &dyn Reporter,
        comparison: Comparison,
        x: &T,
        tag: &str,
    ) -> bool {
        true
    }

    /// Called before `x` and `y` are copy-constructed.
    fn pre_copy(&mut self, x: &T, y: &T) {}

    /// Called after `x_copy` and `y_copy` were copy-constructed from the
    /// instances given to [`Actions::prepare`].
    fn post_copy(&mut self, reporter: &dyn Reporter, x_copy: &T, y_copy: &T) {}

    /// Called before `target` is copy-assigned from `source`.
    fn pre_copy_assign(&mut self, target: &T, source: &T) {}

    /// Called after a copy assignment that produced the expected value.
    fn post_copy_assign(&mut self, reporter: &dyn Reporter, target: &T, source: &T) {}

    /// Called before `source` is moved into a new instance.
    fn pre_move(&mut self, source: &T) {}

    /// Called after a move construction that produced the expected value.
    fn post_move(&mut self, reporter: &dyn Reporter, moved: &T) {}

    /// Called before `target` is move-assigned from `source`.
    fn pre_move_assign(&mut self, target: &T, source: &T) {}

    /// Called after a move assignment that produced the expected value.
    /// `target` is free to be mutated.
    fn post_move_assign(
        &mut self,
        reporter: &dyn Reporter,
        target: &mut T,
        y: &T,
        mutator: &dyn Fn(&mut T),
    ) {
    }

    /// Whether the swap state is entered at all.
    fn swap_enabled(&self) -> bool {
        true
    }

    /// Called before `x` and `y` are swapped.
    fn pre_swap(&mut self, x: &T, y: &T) {}

    /// Called after a swap which exchanged the values correctly. `x` now
    /// holds the value of `y_clone` and is free to be mutated.
    fn post_swap(
        &mut self,
        reporter: &dyn Reporter,
        x: &mut T,
        y: &T,
        y_clone: &T,
        mutator: &dyn Fn(&mut T),
    ) {
    }
}

/// Actions for plain value types: no extra checks at any step.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullActions;

impl<T: MoveOnly> Actions<T> for NullActions {}
