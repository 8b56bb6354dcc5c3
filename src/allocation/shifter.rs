//! Prediction shifting.
//!
//! Some environments make extra acquisitions the test author did not write
//! down: instrumented builds that allocate bookkeeping for every container,
//! or providers reached through a handle that is itself heap allocated.
//! The shifter adds that overhead to each prediction so the author only
//! ever writes the unshifted numbers.

use std::sync::OnceLock;

use serde::{Deserialize, Serialize};

use super::prediction::{
    AllocationPredictions, AssignmentPredictions, Event, EventKind, IndividualPredictions, Level,
    Prediction,
};
use super::provider::Propagation;
use crate::config::ShiftConfig;
use crate::error::SemanticsError;

/// Classification of providers that governs how predictions are shifted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum EquivalenceClass {
    /// The provider is held by value inside the container.
    #[default]
    DirectValue,
    /// The provider is reached through a handle; propagating assignment
    /// acquires extra handle units.
    IndirectHandle,
}

/// Which of the two instances a prediction refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Side {
    X,
    Y,
}

// ---------------------------------------------------------------------------
// Overhead table
// ---------------------------------------------------------------------------

/// Extra acquisitions per propagating copy assignment through a handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(deny_unknown_fields, default)]
pub struct HandleUnits {
    pub no_copy_propagation: i32,
    pub move_propagation: i32,
    pub swap_propagation: i32,
    pub no_propagation: i32,
}

impl Default for HandleUnits {
    fn default() -> Self {
        Self {
            no_copy_propagation: 1,
            move_propagation: 2,
            swap_propagation: 1,
            no_propagation: 3,
        }
    }
}

impl HandleUnits {
    /// Units for a provider with the given propagation policy.
    #[must_use]
    pub const fn for_propagation(&self, propagation: Propagation) -> i32 {
        if !propagation.copy_assignment {
            self.no_copy_propagation
        } else if propagation.move_assignment {
            self.move_propagation
        } else if propagation.swap {
            self.swap_propagation
        } else {
            self.no_propagation
        }
    }
}

/// Multipliers applied when the shift environment is active.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(deny_unknown_fields, default)]
pub struct OverheadTable {
    /// Acquisitions per container for bookkeeping.
    pub per_container: i32,
    /// Acquisitions made by a top-level move.
    pub top_level_move: i32,
    pub handle_units: HandleUnits,
}

impl Default for OverheadTable {
    fn default() -> Self {
        Self {
            per_container: 1,
            top_level_move: 1,
            handle_units: HandleUnits::default(),
        }
    }
}

// ---------------------------------------------------------------------------
// Environment
// ---------------------------------------------------------------------------

/// Whether, and how much, environment overhead applies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
pub struct ShiftEnvironment {
    /// The build performs per-container bookkeeping acquisitions.
    pub bookkeeping: bool,
    /// Instrumentation level of the build; zero disables shifting.
    pub instrumentation_level: u32,
    pub table: OverheadTable,
}

static CURRENT: OnceLock<ShiftEnvironment> = OnceLock::new();

impl ShiftEnvironment {
    /// An environment in which every shift is the identity.
    #[must_use]
    pub fn inactive() -> Self {
        Self::default()
    }

    /// Overhead applies only with bookkeeping on and a non-zero level.
    #[must_use]
    pub const fn is_active(&self) -> bool {
        self.bookkeeping && self.instrumentation_level > 0
    }

    /// Make `self` the process-wide environment.
    ///
    /// # Errors
    /// Returns [`SemanticsError::EnvironmentInstalled`] if an environment was
    /// already installed or already read through [`ShiftEnvironment::current`].
    pub fn install(self) -> Result<(), SemanticsError> {
        let existing = *CURRENT.get_or_init(|| self);
        if existing == self {
            tracing::debug!(active = self.is_active(), "shift environment installed");
            Ok(())
        } else {
            Err(SemanticsError::EnvironmentInstalled { existing })
        }
    }

    /// The process-wide environment.
    ///
    /// Unless one was installed, it is read from the file named by
    /// `SEMCHECK_SHIFT_CONFIG`; without that variable it is inactive.
    ///
    /// # Errors
    /// Returns [`SemanticsError::Config`] if that file cannot be read or
    /// parsed. Nothing is cached on failure, so every later call reports the
    /// same error until an environment is installed.
    pub fn current() -> Result<&'static Self, SemanticsError> {
        if let Some(environment) = CURRENT.get() {
            return Ok(environment);
        }
        let environment = ShiftConfig::from_env()?.environment();
        Ok(CURRENT.get_or_init(|| environment))
    }
}

// ---------------------------------------------------------------------------
// Shifter
// ---------------------------------------------------------------------------

/// Shifts the predictions of one provider slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Shifter {
    pub class: EquivalenceClass,
    pub level: Level,
    pub propagation: Propagation,
    pub environment: ShiftEnvironment,
}

impl Shifter {
    /// The shifted prediction is `unshifted + overhead`; any shift already
    /// carried by `prediction` is replaced.
    ///
    /// `side` names the instance a copy or para-move prediction refers to;
    /// `None` means no overhead for those events.
    #[must_use]
    pub fn shift<E: Event>(&self, prediction: Prediction<E>, side: Option<Side>) -> Prediction<E> {
        Prediction::with_shift(prediction.unshifted(), self.overhead(E::KIND, side))
    }

    fn overhead(&self, kind: EventKind, side: Option<Side>) -> i32 {
        if !self.environment.is_active() {
            return 0;
        }

        let table = &self.environment.table;
        let counts = self.level.counts();
        let top = self.level.is_top();
        let per = table.per_container;
        let per_side = |side: Option<Side>| match side {
            Some(Side::X) => counts.num_x * per,
            Some(Side::Y) => counts.num_y * per,
            None => 0,
        };

        match (self.class, kind) {
            (_, EventKind::Comparison | EventKind::Spectator | EventKind::Swap) => 0,
            (_, EventKind::Copy | EventKind::ParaMove | EventKind::Initialization) => {
                per_side(side)
            }
            (_, EventKind::Move | EventKind::MoveAssign) => {
                if top {
                    table.top_level_move
                } else {
                    0
                }
            }
            (_, EventKind::ParaCopy) => counts.num_y * per,
            (_, EventKind::Mutation) => counts.post_mutation * per,
            (EquivalenceClass::DirectValue, EventKind::Assign) => counts.num_y * per,
            (EquivalenceClass::IndirectHandle, EventKind::Assign) => {
                counts.num_y * table.handle_units.for_propagation(self.propagation)
            }
            (EquivalenceClass::DirectValue, EventKind::AssignNoProp) => {
                if top {
                    0
                } else {
                    counts.num_y * per
                }
            }
            (EquivalenceClass::IndirectHandle, EventKind::AssignNoProp) => counts.num_y * per,
            (_, EventKind::MoveAssignNoProp) => {
                if !top && counts.num_y > counts.num_x {
                    counts.num_y * per
                } else {
                    0
                }
            }
        }
    }

    /// Shift every prediction of a slot.
    #[must_use]
    pub fn shift_all(&self, predictions: &AllocationPredictions) -> AllocationPredictions {
        AllocationPredictions {
            x: self.shift_individual(&predictions.x, Side::X),
            y: self.shift_individual(&predictions.y, Side::Y),
            assign_y_to_x: self.shift_assignment(&predictions.assign_y_to_x),
            level: predictions.level,
        }
    }

    fn shift_individual(&self, p: &IndividualPredictions, side: Side) -> IndividualPredictions {
        IndividualPredictions {
            copy: self.shift(p.copy, Some(side)),
            mutation: self.shift(p.mutation, None),
            para_copy: self.shift(p.para_copy, None),
            para_move: self.shift(p.para_move, Some(side)),
            move_: self.shift(p.move_, None),
        }
    }

    fn shift_assignment(&self, p: &AssignmentPredictions) -> AssignmentPredictions {
        AssignmentPredictions {
            without_propagation: self.shift(p.without_propagation, None),
            with_propagation: self.shift(p.with_propagation, None),
            move_without_propagation: self.shift(p.move_without_propagation, None),
            move_: self.shift(p.move_, None),
        }
    }
}
