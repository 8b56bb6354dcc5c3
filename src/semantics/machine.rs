//! The canonical operation sequence.
//!
//! States, in order: precondition, copy, copy-assign, move-construct,
//! move-assign, swap, mutation. A failed precondition aborts the sequence;
//! any other failure is recorded and the sequence carries on with the next
//! state that does not depend on the failed one.
//!
//! Move-only types run a shorter sequence ([`run_move_only`]): precondition,
//! swap, move-construct, move-assign, mutation.

use std::cmp::Ordering;

use super::{Actions, Comparison, MoveOnly, Regular, Verdict};
use crate::checks::{check, check_same};
use crate::logger::{FailureKind, Reporter, Sentinel};

// ---------------------------------------------------------------------------
// Preconditions
// ---------------------------------------------------------------------------

/// Precondition policy for a run: equality only, or equality plus ordering.
pub trait Preconditions<T: MoveOnly> {
    fn check<A: Actions<T>>(&self, reporter: &dyn Reporter, actions: &mut A, x: &T, y: &T) -> bool;
}

/// `==` and `!=` must be reflexively consistent and `x != y`.
pub struct EqualityPreconditions;

impl<T: MoveOnly> Preconditions<T> for EqualityPreconditions {
    fn check<A: Actions<T>>(&self, reporter: &dyn Reporter, actions: &mut A, x: &T, y: &T) -> bool {
        check_equality_preconditions(reporter, actions, x, y)
    }
}

/// Equality preconditions, plus consistency of the ordering operators and
/// `x` relating to `y` as `order` states.
pub struct OrderedPreconditions {
    pub order: Ordering,
}

impl<T: MoveOnly + PartialOrd> Preconditions<T> for OrderedPreconditions {
    fn check<A: Actions<T>>(&self, reporter: &dyn Reporter, actions: &mut A, x: &T, y: &T) -> bool {
        if !check_equality_preconditions(reporter, actions, x, y) {
            return false;
        }

        if !check(
            "Precondition - for checking semantics, order must be Ordering::Less or Ordering::Greater",
            reporter,
            FailureKind::Precondition,
            self.order != Ordering::Equal,
        ) {
            return false;
        }

        if !check_ordering_consistency(reporter, actions, x, y) {
            return false;
        }

        let (holds, relation) = match self.order {
            Ordering::Less => (x < y, "x < y"),
            _ => (x > y, "x > y"),
        };
        check(
            &format!("Precondition - for ordered semantics, it is assumed that {relation}"),
            reporter,
            FailureKind::Precondition,
            holds,
        )
    }
}

fn check_comparison_consistency<T, A>(
    reporter: &dyn Reporter,
    comparison: Comparison,
    actions: &mut A,
    x: &T,
    y: &T,
    op: impl Fn(&T) -> bool,
) -> bool
where
    T: MoveOnly,
    A: Actions<T>,
{
    let sentry = Sentinel::new(reporter, "");
    let mut consistent = true;
    for (value, tag) in [(x, "(x)"), (y, "(y)")] {
        actions.pre_comparison(value);
        if check(
            &format!("{comparison} is inconsistent {tag}"),
            reporter,
            FailureKind::Precondition,
            op(value),
        ) {
            consistent &= actions.post_comparison(reporter, comparison, value, tag);
        }
    }
    consistent && !sentry.failure_detected()
}

#[allow(clippy::eq_op)]
fn check_equality_preconditions<T: MoveOnly, A: Actions<T>>(
    reporter: &dyn Reporter,
    actions: &mut A,
    x: &T,
    y: &T,
) -> bool {
    let eq =
        check_comparison_consistency(reporter, Comparison::Equality, actions, x, y, |v| v == v);
    let neq = check_comparison_consistency(
        reporter,
        Comparison::Inequality,
        actions,
        x,
        y,
        |v| !(v != v),
    );

    eq && neq
        && check(
            "Precondition - for checking semantics, x and y are assumed to be different",
            reporter,
            FailureKind::Precondition,
            x != y,
        )
}

#[allow(clippy::eq_op)]
fn check_ordering_operators<T, A>(reporter: &dyn Reporter, actions: &mut A, x: &T, y: &T) -> bool
where
    T: MoveOnly + PartialOrd,
    A: Actions<T>,
{
    let sentry = Sentinel::new(reporter, "");

    check_comparison_consistency(reporter, Comparison::LessThan, actions, x, y, |v| !(v < v));
    check_comparison_consistency(reporter, Comparison::Leq, actions, x, y, |v| v <= v);
    check_comparison_consistency(reporter, Comparison::GreaterThan, actions, x, y, |v| !(v > v));
    check_comparison_consistency(reporter, Comparison::Geq, actions, x, y, |v| v >= v);
    check_comparison_consistency(reporter, Comparison::ThreeWay, actions, x, y, |v| {
        v.partial_cmp(v) == Some(Ordering::Equal)
    });

    !sentry.failure_detected()
}

fn check_ordering_consistency<T, A>(reporter: &dyn Reporter, actions: &mut A, x: &T, y: &T) -> bool
where
    T: MoveOnly + PartialOrd,
    A: Actions<T>,
{
    if !check_ordering_operators(reporter, actions, x, y) {
        return false;
    }

    let (lo, hi) = if x < y { (x, y) } else { (y, x) };
    let sentry = Sentinel::new(reporter, "");
    let kind = FailureKind::Precondition;

    check("operator> and operator< are inconsistent", reporter, kind, hi > lo);
    check("operator< and operator<= are inconsistent", reporter, kind, lo <= hi);
    check("operator< and operator>= are inconsistent", reporter, kind, hi >= lo);
    check(
        "operator< and partial_cmp are inconsistent",
        reporter,
        kind,
        lo.partial_cmp(hi) == Some(Ordering::Less),
    );

    !sentry.failure_detected()
}

// ---------------------------------------------------------------------------
// Individual states
// ---------------------------------------------------------------------------

fn check_copy_assign<T: Regular, A: Actions<T>>(
    reporter: &dyn Reporter,
    actions: &mut A,
    z: &mut T,
    y: &T,
) -> bool {
    actions.pre_copy_assign(z, y);
    z.copy_assign(y);
    if check_same("Inconsistent copy assignment (from y)", reporter, z, y) {
        actions.post_copy_assign(reporter, z, y);
        return true;
    }
    false
}

fn check_move_construction<T: MoveOnly, A: Actions<T>>(
    reporter: &dyn Reporter,
    actions: &mut A,
    z: T,
    y: &T,
) -> Option<T> {
    actions.pre_move(&z);
    let w = T::move_construct(z);
    if !check_same("Inconsistent move construction", reporter, &w, y) {
        return None;
    }
    actions.post_move(reporter, &w);
    Some(w)
}

fn check_move_assign<T: MoveOnly, A: Actions<T>>(
    reporter: &dyn Reporter,
    actions: &mut A,
    target: &mut T,
    source: T,
    y: &T,
    mutator: &dyn Fn(&mut T),
) -> bool {
    actions.pre_move_assign(target, &source);
    target.move_assign(source);
    if check_same("Inconsistent move assignment (from y)", reporter, target, y) {
        actions.post_move_assign(reporter, target, y, mutator);
        return true;
    }
    false
}

/// Swap `a`, holding the value of `x`, with `b`, holding the value of `y`.
/// On success `a` has been handed to the swap hook and may be mutated.
fn check_swap<T: MoveOnly, A: Actions<T>>(
    reporter: &dyn Reporter,
    actions: &mut A,
    a: &mut T,
    b: &mut T,
    x: &T,
    y: &T,
    mutator: &dyn Fn(&mut T),
) -> bool {
    actions.pre_swap(a, b);
    a.swap_values(b);

    let swap_y = check_same("Inconsistent swap (y)", reporter, b, x);
    let swap_x = check_same("Inconsistent swap (x)", reporter, a, y);

    if swap_x && swap_y {
        actions.post_swap(reporter, a, b, y, mutator);
        return true;
    }
    false
}

fn check_mutation<T: Regular>(reporter: &dyn Reporter, y: &T, mutator: &dyn Fn(&mut T)) {
    let mut v = y.clone();
    mutator(&mut v);

    if check(
        "Either mutation is not doing anything following copy construction \
         or value semantics are broken, with mutation of an object also changing \
         the object from which it was copied",
        reporter,
        FailureKind::Semantics,
        v != *y,
    ) {
        v.copy_assign(y);
        if check_same("Inconsistent copy assignment (from mutated y)", reporter, &v, y) {
            mutator(&mut v);
            check(
                "Either mutation is not doing anything following copy assignment \
                 or value semantics are broken, with mutation of an object also changing \
                 the object from which it was assigned",
                reporter,
                FailureKind::Semantics,
                v != *y,
            );
        }
    }
}

// ---------------------------------------------------------------------------
// The sequence
// ---------------------------------------------------------------------------

/// Run the canonical operation sequence on `x` and `y`.
pub fn run<T, A, P>(
    reporter: &dyn Reporter,
    actions: &mut A,
    preconditions: &P,
    x: &T,
    y: &T,
    mutator: &dyn Fn(&mut T),
) -> Verdict
where
    T: Regular,
    A: Actions<T>,
    P: Preconditions<T>,
{
    let sentry = Sentinel::new(reporter, "");

    actions.prepare(x, y);
    if !preconditions.check(reporter, actions, x, y) {
        tracing::debug!("preconditions violated, abandoning sequence");
        return Verdict::PreconditionViolated {
            failures: sentry.failures_since_entry(),
        };
    }

    tracing::debug!("state: copy");
    actions.pre_copy(x, y);
    let mut z = x.clone();
    let consistent_copy = check_same("Inconsistent copy constructor (x)", reporter, &z, x);
    if consistent_copy {
        let y_copy = y.clone();
        actions.post_copy(reporter, &z, &y_copy);
    }

    tracing::debug!("state: copy-assign");
    let consistent_copy_assign = check_copy_assign(reporter, actions, &mut z, y);

    // z == y here whenever copy assignment is consistent, even if copy
    // construction is not.
    if consistent_copy_assign {
        tracing::debug!("state: move-construct");
        check_move_construction(reporter, actions, z, y);
    }

    if consistent_copy {
        tracing::debug!("state: move-assign");
        let mut w = x.clone();
        check_move_assign(reporter, actions, &mut w, y.clone(), y, mutator);

        if actions.swap_enabled() {
            tracing::debug!("state: swap");
            check_swap(reporter, actions, &mut x.clone(), &mut y.clone(), x, y, mutator);
        }

        if consistent_copy_assign {
            tracing::debug!("state: mutation");
            check_mutation(reporter, y, mutator);
        }
    }

    outcome(&sentry)
}

fn outcome(sentry: &Sentinel<'_>) -> Verdict {
    if sentry.failure_detected() {
        Verdict::Failed {
            failures: sentry.failures_since_entry(),
        }
    } else {
        Verdict::Passed
    }
}

fn check_clones<T: MoveOnly>(
    reporter: &dyn Reporter,
    x: &T,
    y: &T,
    x_clone: &T,
    y_clone: &T,
) -> bool {
    let message = |var: &str| {
        format!(
            "Precondition - for checking move-only semantics, {var} and {var}_clone are assumed to be equal"
        )
    };
    check(&message("x"), reporter, FailureKind::Precondition, x == x_clone)
        && check(&message("y"), reporter, FailureKind::Precondition, y == y_clone)
}

/// Run the move-only sequence, consuming `x` and `y`.
///
/// When the swap state runs, `x` and `y` leave it exchanged with `x` mutated,
/// so the move states then carry the value of `x_clone` from `y` back into
/// `x`. Otherwise they carry the value of `y_clone`.
#[allow(clippy::too_many_arguments)]
pub fn run_move_only<T, A, P>(
    reporter: &dyn Reporter,
    actions: &mut A,
    preconditions: &P,
    mut x: T,
    mut y: T,
    x_clone: &T,
    y_clone: &T,
    mutator: &dyn Fn(&mut T),
) -> Verdict
where
    T: MoveOnly,
    A: Actions<T>,
    P: Preconditions<T>,
{
    let sentry = Sentinel::new(reporter, "");

    actions.prepare(&x, &y);
    if !preconditions.check(reporter, actions, &x, &y)
        || !check_clones(reporter, &x, &y, x_clone, y_clone)
    {
        tracing::debug!("preconditions violated, abandoning sequence");
        return Verdict::PreconditionViolated {
            failures: sentry.failures_since_entry(),
        };
    }

    let mut carried = y_clone;
    if actions.swap_enabled() {
        tracing::debug!("state: swap");
        if !check_swap(reporter, actions, &mut x, &mut y, x_clone, y_clone, mutator) {
            return outcome(&sentry);
        }
        carried = x_clone;
    }

    tracing::debug!("state: move-construct");
    let Some(z) = check_move_construction(reporter, actions, y, carried) else {
        return outcome(&sentry);
    };

    tracing::debug!("state: move-assign");
    if check_move_assign(reporter, actions, &mut x, z, carried, mutator) {
        tracing::debug!("state: mutation");
        mutator(&mut x);
        check(
            "Mutation is not doing anything to the move-assigned instance",
            reporter,
            FailureKind::Semantics,
            x != *carried,
        );
    }

    outcome(&sentry)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
