//! Provider descriptors.
//!
//! A descriptor tells the engine how to reach one provider of an instance
//! and what each operation is predicted to acquire from it. Flat
//! descriptors ([`AllocationInfo`]) describe a single provider; scoped
//! descriptors ([`ScopedAllocationInfo`]) describe a chain and are unpacked
//! into one flat descriptor per level before any checker is built.

use std::any::type_name;
use std::fmt;
use std::rc::Rc;

use super::prediction::{AllocationPredictions, ContainerCounts, Level};
use super::provider::{CountingProvider, Propagation, ScopedProvider};
use super::shifter::{EquivalenceClass, ShiftEnvironment, Shifter};
use crate::error::SemanticsError;

// ---------------------------------------------------------------------------
// AllocationSlot
// ---------------------------------------------------------------------------

/// A flattened, shifted provider slot with the provider type erased.
///
/// This is what checkers are built from.
pub trait AllocationSlot<T> {
    /// Type name of the provider, used in failure messages.
    fn provider_name(&self) -> &'static str;

    /// Acquisitions made so far by the provider of `value`.
    fn count(&self, value: &T) -> i32;

    /// Whether `x` and `y` currently hold equal providers.
    fn providers_equal(&self, x: &T, y: &T) -> bool;

    fn propagation(&self) -> Propagation;

    fn is_always_equal(&self) -> bool;

    /// Shifted predictions of this slot.
    fn predictions(&self) -> &AllocationPredictions;
}

/// Shared handle to a slot. Checkers clone it freely.
pub type Slot<T> = Rc<dyn AllocationSlot<T>>;

/// Anything that can be flattened into provider slots.
pub trait Descriptor<T> {
    /// One shifted slot per provider level, outermost first.
    ///
    /// # Errors
    /// Fails if a level without its own environment cannot resolve
    /// [`ShiftEnvironment::current`].
    fn flatten(&self) -> Result<Vec<Slot<T>>, SemanticsError>;
}

// ---------------------------------------------------------------------------
// AllocationInfo
// ---------------------------------------------------------------------------

/// A getter reaching one provider of `T`, together with its predictions.
pub struct AllocationInfo<T, P> {
    getter: Rc<dyn Fn(&T) -> P>,
    predictions: AllocationPredictions,
    class: EquivalenceClass,
    environment: Option<ShiftEnvironment>,
}

impl<T: 'static, P: CountingProvider> AllocationInfo<T, P> {
    /// `getter` must not have side effects.
    pub fn new(getter: impl Fn(&T) -> P + 'static, predictions: AllocationPredictions) -> Self {
        Self {
            getter: Rc::new(getter),
            predictions,
            class: P::EQUIVALENCE_CLASS,
            environment: None,
        }
    }

    /// Shift with `class` instead of the provider type's default.
    #[must_use]
    pub const fn with_equivalence_class(mut self, class: EquivalenceClass) -> Self {
        self.class = class;
        self
    }

    /// Shift in `environment` instead of [`ShiftEnvironment::current`].
    #[must_use]
    pub const fn with_environment(mut self, environment: ShiftEnvironment) -> Self {
        self.environment = Some(environment);
        self
    }

    pub fn provider(&self, value: &T) -> P {
        (self.getter)(value)
    }

    pub fn count(&self, value: &T) -> i32 {
        self.provider(value).acquisitions()
    }

    /// Unshifted predictions.
    #[must_use]
    pub const fn predictions(&self) -> &AllocationPredictions {
        &self.predictions
    }

    #[must_use]
    pub const fn equivalence_class(&self) -> EquivalenceClass {
        self.class
    }

    /// # Errors
    /// Propagates a [`ShiftEnvironment::current`] failure when no
    /// environment was given with [`AllocationInfo::with_environment`].
    pub fn shifter(&self) -> Result<Shifter, SemanticsError> {
        let environment = match self.environment {
            Some(environment) => environment,
            None => *ShiftEnvironment::current()?,
        };
        Ok(Shifter {
            class: self.class,
            level: self.predictions.level,
            propagation: P::PROPAGATION,
            environment,
        })
    }

    fn slot(&self) -> Result<Slot<T>, SemanticsError> {
        let shifted = self.shifter()?.shift_all(&self.predictions);
        Ok(Rc::new(ShiftedSlot {
            info: self.clone(),
            shifted,
        }))
    }
}

impl<T, P> Clone for AllocationInfo<T, P> {
    fn clone(&self) -> Self {
        Self {
            getter: Rc::clone(&self.getter),
            predictions: self.predictions,
            class: self.class,
            environment: self.environment,
        }
    }
}

impl<T, P> fmt::Debug for AllocationInfo<T, P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AllocationInfo")
            .field("provider", &type_name::<P>())
            .field("predictions", &self.predictions)
            .field("class", &self.class)
            .finish_non_exhaustive()
    }
}

impl<T: 'static, P: CountingProvider> Descriptor<T> for AllocationInfo<T, P> {
    fn flatten(&self) -> Result<Vec<Slot<T>>, SemanticsError> {
        Ok(vec![self.slot()?])
    }
}

struct ShiftedSlot<T, P> {
    info: AllocationInfo<T, P>,
    shifted: AllocationPredictions,
}

impl<T: 'static, P: CountingProvider> AllocationSlot<T> for ShiftedSlot<T, P> {
    fn provider_name(&self) -> &'static str {
        type_name::<P>()
    }

    fn count(&self, value: &T) -> i32 {
        self.info.count(value)
    }

    fn providers_equal(&self, x: &T, y: &T) -> bool {
        self.info.provider(x) == self.info.provider(y)
    }

    fn propagation(&self) -> Propagation {
        P::PROPAGATION
    }

    fn is_always_equal(&self) -> bool {
        P::IS_ALWAYS_EQUAL
    }

    fn predictions(&self) -> &AllocationPredictions {
        &self.shifted
    }
}

// ---------------------------------------------------------------------------
// ScopedAllocationInfo
// ---------------------------------------------------------------------------

/// Nested-level predictions paired with the sub-container counts of that
/// level.
pub type NestedPredictions = (AllocationPredictions, ContainerCounts);

/// A getter reaching a provider chain, with predictions for every level.
pub struct ScopedAllocationInfo<T, S> {
    getter: Rc<dyn Fn(&T) -> S>,
    levels: Vec<AllocationPredictions>,
    class: Option<EquivalenceClass>,
    environment: Option<ShiftEnvironment>,
}

impl<T: 'static, S: ScopedProvider> ScopedAllocationInfo<T, S> {
    /// `outer` predicts the top level; `nested` predicts each deeper level
    /// in order, with its sub-container counts.
    ///
    /// # Errors
    /// [`SemanticsError::EmptyChain`] if the chain has no levels;
    /// [`SemanticsError::LevelMismatch`] unless `nested` has exactly one
    /// entry per level below the top.
    pub fn new(
        getter: impl Fn(&T) -> S + 'static,
        outer: AllocationPredictions,
        nested: Vec<NestedPredictions>,
    ) -> Result<Self, SemanticsError> {
        if S::DEPTH == 0 {
            return Err(SemanticsError::EmptyChain {
                provider: type_name::<S>(),
            });
        }
        if nested.len() != S::DEPTH - 1 {
            return Err(SemanticsError::LevelMismatch {
                expected: S::DEPTH - 1,
                supplied: nested.len(),
            });
        }

        let levels = std::iter::once(outer.at_level(Level::Top))
            .chain(
                nested
                    .into_iter()
                    .map(|(p, counts)| p.at_level(Level::Nested(counts))),
            )
            .collect();

        Ok(Self {
            getter: Rc::new(getter),
            levels,
            class: None,
            environment: None,
        })
    }

    /// Shift every level with `class`.
    #[must_use]
    pub const fn with_equivalence_class(mut self, class: EquivalenceClass) -> Self {
        self.class = Some(class);
        self
    }

    #[must_use]
    pub const fn with_environment(mut self, environment: ShiftEnvironment) -> Self {
        self.environment = Some(environment);
        self
    }

    /// Number of levels.
    #[must_use]
    pub const fn depth(&self) -> usize {
        S::DEPTH
    }

    /// Flat descriptor for level `i`, or `None` if `i >= depth()`.
    pub fn unpack(&self, i: usize) -> Option<AllocationInfo<T, S::Level>> {
        let predictions = *self.levels.get(i)?;
        let getter = Rc::clone(&self.getter);
        let mut info = AllocationInfo::new(move |value: &T| getter(value).level(i), predictions);
        if let Some(class) = self.class {
            info = info.with_equivalence_class(class);
        }
        if let Some(environment) = self.environment {
            info = info.with_environment(environment);
        }
        Some(info)
    }

    /// Every level, outermost first.
    pub fn unpack_all(&self) -> Vec<AllocationInfo<T, S::Level>> {
        (0..S::DEPTH).filter_map(|i| self.unpack(i)).collect()
    }
}

impl<T, S> Clone for ScopedAllocationInfo<T, S> {
    fn clone(&self) -> Self {
        Self {
            getter: Rc::clone(&self.getter),
            levels: self.levels.clone(),
            class: self.class,
            environment: self.environment,
        }
    }
}

impl<T: 'static, S: ScopedProvider> Descriptor<T> for ScopedAllocationInfo<T, S> {
    fn flatten(&self) -> Result<Vec<Slot<T>>, SemanticsError> {
        let slots = self
            .unpack_all()
            .iter()
            .map(AllocationInfo::slot)
            .collect::<Result<Vec<_>, _>>()?;
        tracing::debug!(
            chain = type_name::<S>(),
            levels = slots.len(),
            "unpacked provider chain"
        );
        Ok(slots)
    }
}

/// Flatten every descriptor, in order.
///
/// # Errors
/// Stops at the first descriptor that fails to flatten.
pub fn flatten_all<T>(descriptors: &[&dyn Descriptor<T>]) -> Result<Vec<Slot<T>>, SemanticsError> {
    let mut slots = Vec::new();
    for descriptor in descriptors {
        slots.extend(descriptor.flatten()?);
    }
    Ok(slots)
}
