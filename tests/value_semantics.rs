mod common;
use common::*;

use proptest::prelude::*;
use semcheck::semantics::check_semantics;
use semcheck::{FailureKind, TestLogger, Verdict};

#[test]
fn well_behaved_vector_passes() {
    let _telemetry = semcheck::telemetry::init();
    let logger = TestLogger::new();
    let verdict = check_semantics("vec", &logger, &vec![1], &vec![5, 6], push_plain);
    assert_eq!(verdict, Verdict::Passed, "{:?}", logger.failure_messages());

    let results = logger.results();
    assert!(results.is_clean());
    assert!(results.checks > 0);
    assert_eq!(logger.depth(), 0, "every scope must be closed");
}

#[test]
fn strings_and_options_pass() {
    let logger = TestLogger::new();
    let verdict = check_semantics(
        "string",
        &logger,
        &"lorem".to_owned(),
        &"ipsum".to_owned(),
        |s: &mut String| s.push('!'),
    );
    assert!(verdict.passed());

    let verdict = check_semantics("option", &logger, &None, &Some(3), |o: &mut Option<i32>| {
        *o = Some(o.map_or(0, |v| v + 1));
    });
    assert!(verdict.passed(), "{:?}", logger.failure_messages());
}

#[test]
fn equal_instances_violate_preconditions() {
    let logger = TestLogger::new();
    let verdict = check_semantics("equal", &logger, &vec![1], &vec![1], push_plain);
    assert_eq!(verdict, Verdict::PreconditionViolated { failures: 1 });
    assert!(logger.failure_messages()[0].contains("assumed to be different"));
}

#[test]
fn broken_copy_is_reported() {
    let logger = TestLogger::new();
    let verdict = check_semantics(
        "broken copy",
        &logger,
        &BrokenCopy(vec![1]),
        &BrokenCopy(vec![5, 6]),
        |v: &mut BrokenCopy| v.0.push(1),
    );
    assert!(matches!(verdict, Verdict::Failed { .. }));
    assert!(
        logger
            .failure_messages()
            .iter()
            .any(|m| m.contains("Inconsistent copy constructor"))
    );
}

#[test]
fn broken_move_is_reported() {
    let _telemetry = semcheck::telemetry::init();
    let logger = TestLogger::new();
    let verdict = check_semantics(
        "broken move",
        &logger,
        &BrokenMove(vec![1]),
        &BrokenMove(vec![5, 6]),
        |v: &mut BrokenMove| v.0.push(1),
    );
    assert_eq!(verdict, Verdict::Failed { failures: 1 });
    assert!(logger.failure_messages()[0].contains("Inconsistent move construction"));
}

#[test]
fn broken_swap_is_reported() {
    let logger = TestLogger::new();
    let verdict = check_semantics(
        "broken swap",
        &logger,
        &BrokenSwap(vec![1]),
        &BrokenSwap(vec![5, 6]),
        |v: &mut BrokenSwap| v.0.push(1),
    );
    assert_eq!(verdict, Verdict::Failed { failures: 2 });
    let text = logger.failure_messages().join("\n");
    assert!(text.contains("Inconsistent swap (y)"));
    assert!(text.contains("Inconsistent swap (x)"));
}

#[test]
fn broken_copy_assign_is_reported() {
    let logger = TestLogger::new();
    let verdict = check_semantics(
        "broken copy assign",
        &logger,
        &BrokenCopyAssign(vec![1]),
        &BrokenCopyAssign(vec![5, 6]),
        |v: &mut BrokenCopyAssign| v.0.push(1),
    );
    assert!(!verdict.passed());
    assert!(
        logger.failure_messages()[0].contains("Inconsistent copy assignment (from y)"),
        "{:?}",
        logger.failure_messages()
    );
}

#[test]
fn broken_move_assign_is_reported() {
    let logger = TestLogger::new();
    let verdict = check_semantics(
        "broken move assign",
        &logger,
        &BrokenMoveAssign(vec![1]),
        &BrokenMoveAssign(vec![5, 6]),
        |v: &mut BrokenMoveAssign| v.0.push(1),
    );
    assert_eq!(verdict, Verdict::Failed { failures: 1 });
    assert!(logger.failure_messages()[0].contains("Inconsistent move assignment"));
}

#[test]
fn broken_equality_is_a_precondition_violation() {
    let logger = TestLogger::new();
    let verdict = check_semantics(
        "broken eq",
        &logger,
        &BrokenEq(vec![1]),
        &BrokenEq(vec![5, 6]),
        |v: &mut BrokenEq| v.0.push(1),
    );
    assert!(matches!(verdict, Verdict::PreconditionViolated { .. }));
    assert!(logger.failure_messages()[0].contains("operator== is inconsistent (x)"));
    assert_eq!(logger.results().semantic_failures, 0);
}

#[test]
fn broken_inequality_is_a_precondition_violation() {
    let logger = TestLogger::new();
    let verdict = check_semantics(
        "broken ne",
        &logger,
        &BrokenNe(vec![1]),
        &BrokenNe(vec![5, 6]),
        |v: &mut BrokenNe| v.0.push(1),
    );
    assert!(matches!(verdict, Verdict::PreconditionViolated { .. }));
    assert!(
        logger
            .failures()
            .iter()
            .all(|f| f.kind == FailureKind::Precondition)
    );
    assert!(logger.failure_messages()[0].contains("operator!= is inconsistent"));
}

#[test]
fn aliasing_copies_are_caught_by_mutation() {
    let logger = TestLogger::new();
    let verdict = check_semantics(
        "aliasing",
        &logger,
        &Aliasing::new(&[1]),
        &Aliasing::new(&[5, 6]),
        push_aliased,
    );
    assert!(matches!(verdict, Verdict::Failed { .. }));
    assert!(
        logger.failure_messages()[0].contains("mutation is not doing anything following copy construction")
    );
}

#[test]
fn failures_are_scoped_under_the_description() {
    let logger = TestLogger::new();
    check_semantics(
        "widget semantics",
        &logger,
        &BrokenMove(vec![1]),
        &BrokenMove(vec![5, 6]),
        |v: &mut BrokenMove| v.0.push(1),
    );
    let record = &logger.failures()[0];
    assert!(record.scope[0].starts_with("widget semantics"));
    assert!(record.scope[0].contains("BrokenMove"));
}

#[test]
fn y_is_untouched_by_the_sequence() {
    let logger = TestLogger::new();
    let y = vec![5, 6];
    let before = y.clone();
    check_semantics("round trip", &logger, &vec![1], &y, push_plain);
    assert_eq!(y, before);
}

proptest! {
    #[test]
    fn prop_distinct_vectors_pass(
        x in proptest::collection::vec(any::<i32>(), 0..8),
        y in proptest::collection::vec(any::<i32>(), 0..8),
    ) {
        prop_assume!(x != y);
        let logger = TestLogger::new();
        let verdict = check_semantics("random vec", &logger, &x, &y, push_plain);
        prop_assert_eq!(verdict, Verdict::Passed);
    }

    #[test]
    fn prop_runs_are_idempotent(
        x in proptest::collection::vec(any::<i32>(), 0..8),
        y in proptest::collection::vec(any::<i32>(), 0..8),
    ) {
        let first = TestLogger::new();
        let second = TestLogger::new();
        let grow = |v: &mut BrokenSwap| v.0.push(1);
        let (x2, y2) = (BrokenSwap(x.clone()), BrokenSwap(y.clone()));
        let a = check_semantics("first", &first, &x2, &y2, grow);
        let b = check_semantics("second", &second, &BrokenSwap(x), &BrokenSwap(y), grow);
        prop_assert_eq!(a, b);
        prop_assert_eq!(first.results(), second.results());
    }
}
