//! Contract checks for value semantics and resource accounting.
//!
//! Given two unequal instances of a type and a mutator, the checks drive a
//! canonical sequence of copy, copy-assign, move, move-assign, swap and
//! mutation operations and verify that the type behaves like a value:
//!
//! - [`semantics::check_semantics`] checks value semantics alone;
//! - [`semantics::check_move_only_semantics`] checks types that can be
//!   moved but not copied;
//! - [`allocation::check_semantics`] additionally checks that each operation
//!   acquires exactly the predicted number of times from every resource
//!   provider the type uses.
//!
//! Failures are recorded with a [`logger::Reporter`]; a check returns a
//! [`Verdict`] and never panics on a broken contract.

pub mod allocation;
pub mod checks;
pub mod config;
pub mod error;
pub mod logger;
pub mod semantics;
pub mod telemetry;

pub use error::SemanticsError;
pub use logger::{FailureKind, FailureRecord, Reporter, Sentinel, TestLogger, TestResults};
pub use semantics::{MoveOnly, Regular, Verdict};
