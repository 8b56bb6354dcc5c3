//! Acquisition predictions.
//!
//! A [`Prediction`] is the number of acquisitions an operation is expected
//! to make, tagged with the event it belongs to. The tag is a zero-sized
//! marker type from [`events`], so a copy prediction cannot be passed where
//! a mutation prediction is expected. Each prediction carries two numbers:
//! the unshifted value the test author wrote and the shifted value after
//! environment overhead has been applied (see [`super::shifter`]).

use std::fmt;
use std::marker::PhantomData;

use serde::Serialize;

// ---------------------------------------------------------------------------
// Events
// ---------------------------------------------------------------------------

/// Runtime identity of an event marker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum EventKind {
    Copy,
    Move,
    Mutation,
    ParaCopy,
    ParaMove,
    Assign,
    AssignNoProp,
    MoveAssign,
    MoveAssignNoProp,
    Initialization,
    Comparison,
    Spectator,
    Swap,
}

impl EventKind {
    /// Null events never acquire anything and are never shifted.
    #[must_use]
    pub const fn is_null(self) -> bool {
        matches!(self, Self::Comparison | Self::Spectator | Self::Swap)
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Copy => "copy",
            Self::Move => "move",
            Self::Mutation => "mutation",
            Self::ParaCopy => "para-copy",
            Self::ParaMove => "para-move",
            Self::Assign => "propagating copy assignment",
            Self::AssignNoProp => "copy assignment",
            Self::MoveAssign => "propagating move assignment",
            Self::MoveAssignNoProp => "move assignment",
            Self::Initialization => "initialization",
            Self::Comparison => "comparison",
            Self::Spectator => "spectator",
            Self::Swap => "swap",
        };
        f.write_str(name)
    }
}

/// A compile-time event tag.
pub trait Event: 'static {
    const KIND: EventKind;
}

/// Event marker types. They are uninhabited and only ever used as type
/// parameters of [`Prediction`].
pub mod events {
    use super::{Event, EventKind};

    macro_rules! event_markers {
        ($($(#[$meta:meta])* $name:ident),* $(,)?) => {
            $(
                $(#[$meta])*
                #[derive(Debug)]
                pub enum $name {}

                impl Event for $name {
                    const KIND: EventKind = EventKind::$name;
                }
            )*
        };
    }

    event_markers!(
        /// Copy construction.
        Copy,
        /// Move construction.
        Move,
        /// Mutation through the caller's mutator.
        Mutation,
        /// Copy construction with freshly made providers.
        ParaCopy,
        /// Move construction with freshly made providers.
        ParaMove,
        /// Copy assignment where the provider propagates.
        Assign,
        /// Copy assignment where the provider does not propagate.
        AssignNoProp,
        /// Move assignment that steals the source's resources.
        MoveAssign,
        /// Move assignment that degenerates to an element-wise copy.
        MoveAssignNoProp,
        /// Construction of the initial instances.
        Initialization,
        Comparison,
        Spectator,
        Swap,
    );
}

// ---------------------------------------------------------------------------
// Prediction
// ---------------------------------------------------------------------------

/// Expected acquisition delta for one event.
pub struct Prediction<E> {
    unshifted: i32,
    shifted: i32,
    _event: PhantomData<fn() -> E>,
}

impl<E: Event> Prediction<E> {
    /// An unshifted prediction.
    #[must_use]
    pub const fn new(unshifted: i32) -> Self {
        Self::with_shift(unshifted, 0)
    }

    /// A prediction whose shifted value is `unshifted + delta`.
    #[must_use]
    pub const fn with_shift(unshifted: i32, delta: i32) -> Self {
        Self {
            unshifted,
            shifted: unshifted + delta,
            _event: PhantomData,
        }
    }

    /// The shifted prediction: what is actually expected to be observed.
    #[must_use]
    pub const fn value(&self) -> i32 {
        self.shifted
    }

    /// The prediction as written by the test author.
    #[must_use]
    pub const fn unshifted(&self) -> i32 {
        self.unshifted
    }

    /// `value() - unshifted()`.
    #[must_use]
    pub const fn shift(&self) -> i32 {
        self.shifted - self.unshifted
    }

    /// The event this prediction belongs to.
    #[must_use]
    pub const fn kind(&self) -> EventKind {
        E::KIND
    }

    /// Re-tag as another event, keeping both numbers.
    #[must_use]
    pub const fn convert<F: Event>(self) -> Prediction<F> {
        Prediction {
            unshifted: self.unshifted,
            shifted: self.shifted,
            _event: PhantomData,
        }
    }
}

impl<E> Clone for Prediction<E> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<E> Copy for Prediction<E> {}

impl<E> PartialEq for Prediction<E> {
    fn eq(&self, other: &Self) -> bool {
        self.unshifted == other.unshifted && self.shifted == other.shifted
    }
}

impl<E> Eq for Prediction<E> {}

impl<E: Event> Default for Prediction<E> {
    fn default() -> Self {
        Self::new(0)
    }
}

impl<E: Event> From<i32> for Prediction<E> {
    fn from(unshifted: i32) -> Self {
        Self::new(unshifted)
    }
}

impl<E: Event> fmt::Debug for Prediction<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Prediction")
            .field("event", &E::KIND)
            .field("unshifted", &self.unshifted)
            .field("shifted", &self.shifted)
            .finish()
    }
}

impl<E: Event> fmt::Display for Prediction<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.shift() == 0 {
            write!(f, "{}", self.shifted)
        } else {
            write!(f, "{} (unshifted {})", self.shifted, self.unshifted)
        }
    }
}

pub type CopyPrediction = Prediction<events::Copy>;
pub type MovePrediction = Prediction<events::Move>;
pub type MutationPrediction = Prediction<events::Mutation>;
pub type ParaCopyPrediction = Prediction<events::ParaCopy>;
pub type ParaMovePrediction = Prediction<events::ParaMove>;
pub type AssignPrediction = Prediction<events::Assign>;
pub type AssignNoPropPrediction = Prediction<events::AssignNoProp>;
pub type MoveAssignPrediction = Prediction<events::MoveAssign>;
pub type MoveAssignNoPropPrediction = Prediction<events::MoveAssignNoProp>;
pub type InitializationPrediction = Prediction<events::Initialization>;

// ---------------------------------------------------------------------------
// Aggregates
// ---------------------------------------------------------------------------

/// Predictions for the operations performed on a single instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IndividualPredictions {
    pub copy: CopyPrediction,
    pub mutation: MutationPrediction,
    pub para_copy: ParaCopyPrediction,
    pub para_move: ParaMovePrediction,
    pub move_: MovePrediction,
}

impl IndividualPredictions {
    /// Para-copy and para-move default to `copy`; move defaults to zero.
    #[must_use]
    pub const fn new(copy: i32, mutation: i32) -> Self {
        Self {
            copy: Prediction::new(copy),
            mutation: Prediction::new(mutation),
            para_copy: Prediction::new(copy),
            para_move: Prediction::new(copy),
            move_: Prediction::new(0),
        }
    }

    #[must_use]
    pub const fn with_para_copy(mut self, para_copy: i32) -> Self {
        self.para_copy = Prediction::new(para_copy);
        self
    }

    #[must_use]
    pub const fn with_para_move(mut self, para_move: i32) -> Self {
        self.para_move = Prediction::new(para_move);
        self
    }

    #[must_use]
    pub const fn with_move(mut self, moves: i32) -> Self {
        self.move_ = Prediction::new(moves);
        self
    }
}

/// Predictions for assigning `y` to `x`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AssignmentPredictions {
    pub without_propagation: AssignNoPropPrediction,
    pub with_propagation: AssignPrediction,
    pub move_without_propagation: MoveAssignNoPropPrediction,
    pub move_: MoveAssignPrediction,
}

impl AssignmentPredictions {
    /// The copy-like move prediction defaults to `without_propagation`; the
    /// stealing move prediction defaults to zero.
    #[must_use]
    pub const fn new(without_propagation: i32, with_propagation: i32) -> Self {
        Self {
            without_propagation: Prediction::new(without_propagation),
            with_propagation: Prediction::new(with_propagation),
            move_without_propagation: Prediction::new(without_propagation),
            move_: Prediction::new(0),
        }
    }

    #[must_use]
    pub const fn with_move_without_propagation(mut self, n: i32) -> Self {
        self.move_without_propagation = Prediction::new(n);
        self
    }

    #[must_use]
    pub const fn with_move(mut self, n: i32) -> Self {
        self.move_ = Prediction::new(n);
        self
    }
}

/// Sub-container counts of a nested level.
///
/// `num_x` and `num_y` are the number of sub-containers at this level held
/// by `x` and `y`; `post_mutation` the number held by `y` after mutation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct ContainerCounts {
    pub num_x: i32,
    pub num_y: i32,
    pub post_mutation: i32,
}

impl ContainerCounts {
    /// The counts used for the top level.
    pub const TOP: Self = Self::new(1, 1, 0);

    #[must_use]
    pub const fn new(num_x: i32, num_y: i32, post_mutation: i32) -> Self {
        Self {
            num_x,
            num_y,
            post_mutation,
        }
    }
}

/// Whether a set of predictions belongs to the top level of a provider chain
/// or to a nested level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Level {
    Top,
    Nested(ContainerCounts),
}

impl Level {
    #[must_use]
    pub const fn is_top(&self) -> bool {
        matches!(self, Self::Top)
    }

    #[must_use]
    pub const fn counts(&self) -> ContainerCounts {
        match self {
            Self::Top => ContainerCounts::TOP,
            Self::Nested(counts) => *counts,
        }
    }
}

/// Everything predicted for one provider slot during a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AllocationPredictions {
    pub x: IndividualPredictions,
    pub y: IndividualPredictions,
    pub assign_y_to_x: AssignmentPredictions,
    pub level: Level,
}

impl AllocationPredictions {
    /// Top-level predictions.
    #[must_use]
    pub const fn new(
        x: IndividualPredictions,
        y: IndividualPredictions,
        assign_y_to_x: AssignmentPredictions,
    ) -> Self {
        Self {
            x,
            y,
            assign_y_to_x,
            level: Level::Top,
        }
    }

    /// Predictions for a nested level holding `counts` sub-containers.
    #[must_use]
    pub const fn nested(
        x: IndividualPredictions,
        y: IndividualPredictions,
        assign_y_to_x: AssignmentPredictions,
        counts: ContainerCounts,
    ) -> Self {
        Self {
            x,
            y,
            assign_y_to_x,
            level: Level::Nested(counts),
        }
    }

    /// The same numbers tagged with another level.
    #[must_use]
    pub const fn at_level(mut self, level: Level) -> Self {
        self.level = level;
        self
    }
}

/// Predictions for a type that can be moved but not copied.
///
/// Only move construction, move assignment, swap and mutation happen to such
/// a type, so no copy numbers are written down.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MoveOnlyPredictions {
    pub mutation: MutationPrediction,
    pub move_: MovePrediction,
    pub move_without_propagation: MoveAssignNoPropPrediction,
    pub move_assign: MoveAssignPrediction,
}

impl MoveOnlyPredictions {
    /// `move_without_propagation` is the copy-like move assignment made
    /// when the providers differ and do not propagate. Move construction and
    /// stealing move assignment default to zero.
    #[must_use]
    pub const fn new(mutation: i32, move_without_propagation: i32) -> Self {
        Self {
            mutation: Prediction::new(mutation),
            move_: Prediction::new(0),
            move_without_propagation: Prediction::new(move_without_propagation),
            move_assign: Prediction::new(0),
        }
    }

    #[must_use]
    pub const fn with_move(mut self, moves: i32) -> Self {
        self.move_ = Prediction::new(moves);
        self
    }

    #[must_use]
    pub const fn with_move_assign(mut self, n: i32) -> Self {
        self.move_assign = Prediction::new(n);
        self
    }
}

impl From<MoveOnlyPredictions> for AllocationPredictions {
    /// Copy events never occur on the move-only path; their numbers are zero.
    fn from(p: MoveOnlyPredictions) -> Self {
        let individual = IndividualPredictions {
            mutation: p.mutation,
            move_: p.move_,
            ..IndividualPredictions::new(0, 0)
        };
        let assign_y_to_x = AssignmentPredictions {
            move_without_propagation: p.move_without_propagation,
            move_: p.move_assign,
            ..AssignmentPredictions::new(0, 0)
        };
        Self::new(individual, individual, assign_y_to_x)
    }
}
