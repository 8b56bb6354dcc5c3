//! Counting resource providers.
//!
//! A provider is whatever an instance draws its resources from. The engine
//! never touches real resources: it only reads the acquisition count a
//! provider exposes, and compares providers for equality.

use std::cell::Cell;
use std::fmt;
use std::rc::Rc;

use serde::Serialize;

use super::shifter::EquivalenceClass;

// ---------------------------------------------------------------------------
// Propagation
// ---------------------------------------------------------------------------

/// Which operations replace the destination's provider with the source's.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
pub struct Propagation {
    pub copy_assignment: bool,
    pub move_assignment: bool,
    pub swap: bool,
}

impl Propagation {
    pub const NONE: Self = Self::new(false, false, false);
    pub const ALL: Self = Self::new(true, true, true);

    #[must_use]
    pub const fn new(copy_assignment: bool, move_assignment: bool, swap: bool) -> Self {
        Self {
            copy_assignment,
            move_assignment,
            swap,
        }
    }
}

impl fmt::Display for Propagation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "copy-assignment: {}, move-assignment: {}, swap: {}",
            self.copy_assignment, self.move_assignment, self.swap
        )
    }
}

// ---------------------------------------------------------------------------
// CountingProvider
// ---------------------------------------------------------------------------

/// A resource provider which counts the acquisitions made through it.
///
/// Clones of a provider share its counters. Two providers compare equal when
/// resources acquired through one may be released through the other.
pub trait CountingProvider: Clone + PartialEq + fmt::Debug + 'static {
    /// Propagation policy of this provider type.
    const PROPAGATION: Propagation;

    /// Whether every instance of this provider type compares equal.
    const IS_ALWAYS_EQUAL: bool = false;

    /// Equivalence class used when shifting predictions. A descriptor may
    /// override it.
    const EQUIVALENCE_CLASS: EquivalenceClass = EquivalenceClass::DirectValue;

    /// Record an acquisition of `n` units. Acquiring zero units is not an
    /// acquisition.
    fn acquire(&self, n: usize);

    /// Record a release of `n` units.
    fn release(&self, n: usize);

    /// Number of acquisitions made so far.
    fn acquisitions(&self) -> i32;

    /// Number of releases made so far.
    fn releases(&self) -> i32;
}

/// Reference provider: counters shared through `Rc`, equality by identity,
/// propagation fixed by const parameters.
pub struct SharedCountingProvider<const COPY: bool, const MOVE: bool, const SWAP: bool> {
    acquisitions: Rc<Cell<i32>>,
    releases: Rc<Cell<i32>>,
}

/// Propagates on copy assignment, move assignment and swap.
pub type PropagatingProvider = SharedCountingProvider<true, true, true>;

/// Never propagates.
pub type NonPropagatingProvider = SharedCountingProvider<false, false, false>;

/// Propagates on copy assignment only.
pub type CopyPropagatingProvider = SharedCountingProvider<true, false, false>;

impl<const COPY: bool, const MOVE: bool, const SWAP: bool>
    SharedCountingProvider<COPY, MOVE, SWAP>
{
    /// A provider with fresh counters.
    #[must_use]
    pub fn new() -> Self {
        Self {
            acquisitions: Rc::new(Cell::new(0)),
            releases: Rc::new(Cell::new(0)),
        }
    }
}

impl<const COPY: bool, const MOVE: bool, const SWAP: bool> Default
    for SharedCountingProvider<COPY, MOVE, SWAP>
{
    fn default() -> Self {
        Self::new()
    }
}

impl<const COPY: bool, const MOVE: bool, const SWAP: bool> Clone
    for SharedCountingProvider<COPY, MOVE, SWAP>
{
    fn clone(&self) -> Self {
        Self {
            acquisitions: Rc::clone(&self.acquisitions),
            releases: Rc::clone(&self.releases),
        }
    }
}

impl<const COPY: bool, const MOVE: bool, const SWAP: bool> PartialEq
    for SharedCountingProvider<COPY, MOVE, SWAP>
{
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.acquisitions, &other.acquisitions)
    }
}

impl<const COPY: bool, const MOVE: bool, const SWAP: bool> fmt::Debug
    for SharedCountingProvider<COPY, MOVE, SWAP>
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SharedCountingProvider")
            .field("acquisitions", &self.acquisitions.get())
            .field("releases", &self.releases.get())
            .finish()
    }
}

impl<const COPY: bool, const MOVE: bool, const SWAP: bool> CountingProvider
    for SharedCountingProvider<COPY, MOVE, SWAP>
{
    const PROPAGATION: Propagation = Propagation::new(COPY, MOVE, SWAP);

    fn acquire(&self, n: usize) {
        if n > 0 {
            self.acquisitions.set(self.acquisitions.get() + 1);
        }
    }

    fn release(&self, n: usize) {
        if n > 0 {
            self.releases.set(self.releases.get() + 1);
        }
    }

    fn acquisitions(&self) -> i32 {
        self.acquisitions.get()
    }

    fn releases(&self) -> i32 {
        self.releases.get()
    }
}

// ---------------------------------------------------------------------------
// Chained providers
// ---------------------------------------------------------------------------

/// A chain of providers, one per level of a nested structure. Level 0 is
/// the outermost.
pub trait ScopedProvider: Clone + 'static {
    /// Provider type used at every level.
    type Level: CountingProvider;

    /// Number of levels.
    const DEPTH: usize;

    /// The provider at level `i`, `i < DEPTH`.
    fn level(&self, i: usize) -> Self::Level;
}

/// Fixed-depth chain of `N` providers of the same type.
#[derive(Debug, Clone, PartialEq)]
pub struct ScopedCountingProvider<P, const N: usize> {
    levels: [P; N],
}

impl<P: CountingProvider, const N: usize> ScopedCountingProvider<P, N> {
    #[must_use]
    pub const fn from_levels(levels: [P; N]) -> Self {
        Self { levels }
    }

    /// The provider at level `i`.
    ///
    /// # Panics
    /// Panics if `i >= N`.
    #[must_use]
    pub const fn at(&self, i: usize) -> &P {
        &self.levels[i]
    }
}

impl<P: CountingProvider + Default, const N: usize> Default for ScopedCountingProvider<P, N> {
    fn default() -> Self {
        Self {
            levels: std::array::from_fn(|_| P::default()),
        }
    }
}

impl<P: CountingProvider, const N: usize> ScopedProvider for ScopedCountingProvider<P, N> {
    type Level = P;

    const DEPTH: usize = N;

    fn level(&self, i: usize) -> P {
        self.levels[i].clone()
    }
}
