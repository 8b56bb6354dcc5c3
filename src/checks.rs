//! Elementary checks shared by every part of the engine.
//!
//! Each check logs itself with the reporter, records a failure of the given
//! kind when it does not hold, and returns whether it held. None of them
//! panic.

use std::fmt;

use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::logger::{FailureKind, Reporter};

/// Check a boolean condition.
pub fn check(
    description: &str,
    reporter: &dyn Reporter,
    kind: FailureKind,
    condition: bool,
) -> bool {
    reporter.log_check();
    if !condition {
        reporter.log_failure(kind, description);
    }
    condition
}

/// Check that `obtained == predicted`, reporting both values on failure.
pub fn check_equality<T>(
    description: &str,
    reporter: &dyn Reporter,
    kind: FailureKind,
    obtained: &T,
    predicted: &T,
) -> bool
where
    T: PartialEq + fmt::Debug + ?Sized,
{
    reporter.log_check();
    let holds = obtained == predicted;
    if !holds {
        reporter.log_failure(
            kind,
            &format!("{description}\n  Obtained : {obtained:?}\n  Predicted: {predicted:?}"),
        );
    }
    holds
}

/// Shorthand for a semantics equality check, the most common case.
pub fn check_same<T>(
    description: &str,
    reporter: &dyn Reporter,
    obtained: &T,
    predicted: &T,
) -> bool
where
    T: PartialEq + fmt::Debug + ?Sized,
{
    check_equality(description, reporter, FailureKind::Semantics, obtained, predicted)
}

/// Check that `value` survives a JSON round trip unchanged.
///
/// A value that fails to serialize or deserialize counts as inconsistent.
pub fn check_serialization<T>(description: &str, reporter: &dyn Reporter, value: &T) -> bool
where
    T: Serialize + DeserializeOwned + PartialEq + fmt::Debug,
{
    let round_trip = serde_json::to_string(value).and_then(|json| serde_json::from_str::<T>(&json));
    match round_trip {
        Ok(restored) => check_same(
            &format!("{description}\nInconsistent (de)serialization"),
            reporter,
            &restored,
            value,
        ),
        Err(e) => check(
            &format!("{description}\n(De)serialization failed: {e}"),
            reporter,
            FailureKind::Semantics,
            false,
        ),
    }
}
