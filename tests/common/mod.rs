//! Shared test subjects for semcheck integration tests.
//!
//! `CountedVec` behaves like a vector drawing its storage from a counting
//! provider: one acquisition per non-empty buffer it allocates. `NestedVec`
//! is a vector of such vectors drawing from a two-level provider chain, and
//! `MoveOnlyVec` a counted vector that cannot be copied. The `Broken*` types
//! each break exactly one operation.

#![allow(dead_code)]

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use semcheck::allocation::{
    AllocationInfo, AllocationPredictions, AssignmentPredictions, ContainerCounts,
    CountingProvider, IndividualPredictions, MoveOnlyPredictions, NonPropagatingProvider,
    ParaConstructible, ScopedAllocationInfo, ScopedCountingProvider, ShiftEnvironment,
};
use semcheck::{MoveOnly, Regular};

// ---------------------------------------------------------------------------
// CountedVec
// ---------------------------------------------------------------------------

pub struct CountedVec<P> {
    data: Vec<i32>,
    capacity: usize,
    provider: P,
}

impl<P: CountingProvider> CountedVec<P> {
    pub fn new(data: Vec<i32>, provider: P) -> Self {
        provider.acquire(data.len());
        Self {
            capacity: data.len(),
            data,
            provider,
        }
    }

    pub fn provider(&self) -> P {
        self.provider.clone()
    }

    pub fn push(&mut self, value: i32) {
        if self.data.len() == self.capacity {
            let capacity = (2 * self.capacity).max(1);
            self.reallocate(capacity);
        }
        self.data.push(value);
    }

    pub fn values(&self) -> &[i32] {
        &self.data
    }

    fn reallocate(&mut self, capacity: usize) {
        self.provider.release(self.capacity);
        self.provider.acquire(capacity);
        self.capacity = capacity;
    }
}

impl<P: CountingProvider> Clone for CountedVec<P> {
    fn clone(&self) -> Self {
        Self::new(self.data.clone(), self.provider.clone())
    }
}

impl<P> PartialEq for CountedVec<P> {
    fn eq(&self, other: &Self) -> bool {
        self.data == other.data
    }
}

impl<P> fmt::Debug for CountedVec<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(&self.data).finish()
    }
}

impl<P: CountingProvider> Regular for CountedVec<P> {
    fn copy_assign(&mut self, source: &Self) {
        if P::PROPAGATION.copy_assignment && self.provider != source.provider {
            self.provider.release(self.capacity);
            self.provider = source.provider.clone();
            self.capacity = 0;
        }
        if source.data.len() > self.capacity {
            self.reallocate(source.data.len());
        }
        self.data.clone_from(&source.data);
    }
}

impl<P: CountingProvider> MoveOnly for CountedVec<P> {
    fn move_assign(&mut self, source: Self) {
        if P::PROPAGATION.move_assignment || self.provider == source.provider {
            self.provider.release(self.capacity);
            *self = source;
        } else {
            if source.data.len() > self.capacity {
                self.reallocate(source.data.len());
            }
            self.data = source.data;
        }
    }

    fn swap_values(&mut self, other: &mut Self) {
        if P::PROPAGATION.swap {
            std::mem::swap(self, other);
        } else {
            std::mem::swap(&mut self.data, &mut other.data);
            std::mem::swap(&mut self.capacity, &mut other.capacity);
        }
    }
}

impl<P: CountingProvider + Default> ParaConstructible for CountedVec<P> {
    fn para_copy(&self) -> Self {
        Self::new(self.data.clone(), P::default())
    }

    fn para_move(source: Self) -> Self {
        Self::new(source.data, P::default())
    }
}

pub fn counted<P: CountingProvider + Default>(data: &[i32]) -> CountedVec<P> {
    CountedVec::new(data.to_vec(), P::default())
}

pub fn push_value<P: CountingProvider>(v: &mut CountedVec<P>) {
    v.push(42);
}

/// Predictions for `x = {1}`, `y = {5, 6}`: every copy, reallocating
/// assignment and push past capacity acquires once.
pub const fn standard_predictions() -> AllocationPredictions {
    AllocationPredictions::new(
        IndividualPredictions::new(1, 1),
        IndividualPredictions::new(1, 1),
        AssignmentPredictions::new(1, 1),
    )
}

pub fn counted_info<P: CountingProvider>(
    predictions: AllocationPredictions,
) -> AllocationInfo<CountedVec<P>, P> {
    AllocationInfo::new(CountedVec::provider, predictions)
        .with_environment(ShiftEnvironment::inactive())
}

// ---------------------------------------------------------------------------
// ComparisonCopier: comparisons acquire
// ---------------------------------------------------------------------------

#[derive(Clone)]
pub struct ComparisonCopier(pub CountedVec<NonPropagatingProvider>);

impl PartialEq for ComparisonCopier {
    fn eq(&self, other: &Self) -> bool {
        let copy = self.0.clone();
        copy == other.0
    }
}

impl fmt::Debug for ComparisonCopier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(&self.0, f)
    }
}

impl Regular for ComparisonCopier {
    fn copy_assign(&mut self, source: &Self) {
        self.0.copy_assign(&source.0);
    }
}

impl MoveOnly for ComparisonCopier {
    fn move_assign(&mut self, source: Self) {
        self.0.move_assign(source.0);
    }

    fn swap_values(&mut self, other: &mut Self) {
        self.0.swap_values(&mut other.0);
    }
}

/// Counted vector ordered lexicographically.
#[derive(Clone, PartialEq)]
pub struct OrderedCounted(pub CountedVec<NonPropagatingProvider>);

impl PartialOrd for OrderedCounted {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        self.0.values().partial_cmp(other.0.values())
    }
}

impl fmt::Debug for OrderedCounted {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(&self.0, f)
    }
}

impl Regular for OrderedCounted {
    fn copy_assign(&mut self, source: &Self) {
        self.0.copy_assign(&source.0);
    }
}

impl MoveOnly for OrderedCounted {
    fn move_assign(&mut self, source: Self) {
        self.0.move_assign(source.0);
    }

    fn swap_values(&mut self, other: &mut Self) {
        self.0.swap_values(&mut other.0);
    }
}

// ---------------------------------------------------------------------------
// MoveOnlyVec
// ---------------------------------------------------------------------------

/// A counted vector with its copy operations taken away.
pub struct MoveOnlyVec<P>(CountedVec<P>);

impl<P: CountingProvider + Default> MoveOnlyVec<P> {
    pub fn new(data: &[i32]) -> Self {
        Self(counted(data))
    }
}

impl<P: CountingProvider> MoveOnlyVec<P> {
    pub fn provider(&self) -> P {
        self.0.provider()
    }
}

impl<P> PartialEq for MoveOnlyVec<P> {
    fn eq(&self, other: &Self) -> bool {
        self.0 == other.0
    }
}

impl<P> fmt::Debug for MoveOnlyVec<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(&self.0, f)
    }
}

impl<P: CountingProvider> MoveOnly for MoveOnlyVec<P> {
    fn move_assign(&mut self, source: Self) {
        self.0.move_assign(source.0);
    }

    fn swap_values(&mut self, other: &mut Self) {
        self.0.swap_values(&mut other.0);
    }
}

pub fn push_move_only<P: CountingProvider>(v: &mut MoveOnlyVec<P>) {
    v.0.push(42);
}

pub fn move_only_info<P: CountingProvider>(
    predictions: MoveOnlyPredictions,
) -> AllocationInfo<MoveOnlyVec<P>, P> {
    AllocationInfo::new(MoveOnlyVec::provider, predictions.into())
        .with_environment(ShiftEnvironment::inactive())
}

// ---------------------------------------------------------------------------
// NestedVec
// ---------------------------------------------------------------------------

pub type Chain = ScopedCountingProvider<NonPropagatingProvider, 2>;

/// A vector of rows. The row buffer draws from level 0 of the chain, each
/// non-empty row from level 1.
pub struct NestedVec {
    rows: Vec<Vec<i32>>,
    row_capacity: usize,
    chain: Chain,
}

impl NestedVec {
    pub fn new(rows: Vec<Vec<i32>>, chain: Chain) -> Self {
        chain.at(0).acquire(rows.len());
        for row in &rows {
            chain.at(1).acquire(row.len());
        }
        Self {
            row_capacity: rows.len(),
            rows,
            chain,
        }
    }

    pub fn chain(&self) -> Chain {
        self.chain.clone()
    }

    pub fn push_row(&mut self, row: Vec<i32>) {
        if self.rows.len() == self.row_capacity {
            self.row_capacity = (2 * self.row_capacity).max(1);
            self.chain.at(0).acquire(self.row_capacity);
        }
        self.chain.at(1).acquire(row.len());
        self.rows.push(row);
    }

    fn assign_rows(&mut self, source: &[Vec<i32>]) {
        if source.len() > self.row_capacity {
            self.row_capacity = source.len();
            self.chain.at(0).acquire(self.row_capacity);
            for row in source {
                self.chain.at(1).acquire(row.len());
            }
        } else {
            for (i, row) in source.iter().enumerate() {
                let reusable = self.rows.get(i).is_some_and(|r| r.len() >= row.len());
                if !reusable {
                    self.chain.at(1).acquire(row.len());
                }
            }
        }
        self.rows = source.to_vec();
    }
}

impl Clone for NestedVec {
    fn clone(&self) -> Self {
        Self::new(self.rows.clone(), self.chain.clone())
    }
}

impl PartialEq for NestedVec {
    fn eq(&self, other: &Self) -> bool {
        self.rows == other.rows
    }
}

impl fmt::Debug for NestedVec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(&self.rows).finish()
    }
}

impl Regular for NestedVec {
    fn copy_assign(&mut self, source: &Self) {
        self.assign_rows(&source.rows);
    }
}

impl MoveOnly for NestedVec {
    fn move_assign(&mut self, source: Self) {
        if self.chain == source.chain {
            *self = source;
        } else {
            self.assign_rows(&source.rows);
        }
    }

    fn swap_values(&mut self, other: &mut Self) {
        std::mem::swap(&mut self.rows, &mut other.rows);
        std::mem::swap(&mut self.row_capacity, &mut other.row_capacity);
    }
}

pub fn nested(rows: &[&[i32]]) -> NestedVec {
    NestedVec::new(rows.iter().map(|r| r.to_vec()).collect(), Chain::default())
}

pub fn push_row(v: &mut NestedVec) {
    v.push_row(vec![9]);
}

/// Descriptor for `x = [[1]]`, `y = [[5, 6], [7]]`. Level 1 gets `y`'s copy
/// prediction `2`: one per non-empty row.
pub fn nested_info(level_one_copy: i32) -> ScopedAllocationInfo<NestedVec, Chain> {
    let outer = AllocationPredictions::new(
        IndividualPredictions::new(1, 1),
        IndividualPredictions::new(1, 1),
        AssignmentPredictions::new(1, 0),
    );
    let inner = AllocationPredictions::new(
        IndividualPredictions::new(1, 1),
        IndividualPredictions::new(level_one_copy, 1),
        AssignmentPredictions::new(2, 0),
    );
    ScopedAllocationInfo::new(
        NestedVec::chain,
        outer,
        vec![(inner, ContainerCounts::new(1, 2, 3))],
    )
    .map(|info| info.with_environment(ShiftEnvironment::inactive()))
    .expect("chain depth matches the nested predictions")
}

// ---------------------------------------------------------------------------
// Broken value types
// ---------------------------------------------------------------------------

macro_rules! broken_vec {
    ($name:ident) => {
        #[derive(PartialEq)]
        pub struct $name(pub Vec<i32>);

        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                fmt::Debug::fmt(&self.0, f)
            }
        }
    };
}

broken_vec!(BrokenCopy);
broken_vec!(BrokenMove);
broken_vec!(BrokenSwap);
broken_vec!(BrokenCopyAssign);
broken_vec!(BrokenMoveAssign);

/// Copies drop the last element.
impl Clone for BrokenCopy {
    fn clone(&self) -> Self {
        let mut data = self.0.clone();
        data.pop();
        Self(data)
    }
}
impl Regular for BrokenCopy {
    fn copy_assign(&mut self, source: &Self) {
        self.0.clone_from(&source.0);
    }
}
impl MoveOnly for BrokenCopy {}

impl Clone for BrokenMove {
    fn clone(&self) -> Self {
        Self(self.0.clone())
    }
}
impl Regular for BrokenMove {}
impl MoveOnly for BrokenMove {
    fn move_construct(_source: Self) -> Self {
        Self(Vec::new())
    }
}

impl Clone for BrokenSwap {
    fn clone(&self) -> Self {
        Self(self.0.clone())
    }
}
impl Regular for BrokenSwap {}
impl MoveOnly for BrokenSwap {
    fn swap_values(&mut self, _other: &mut Self) {}
}

impl Clone for BrokenCopyAssign {
    fn clone(&self) -> Self {
        Self(self.0.clone())
    }
}
impl Regular for BrokenCopyAssign {
    fn copy_assign(&mut self, source: &Self) {
        self.0.extend_from_slice(&source.0);
    }
}
impl MoveOnly for BrokenCopyAssign {}

impl Clone for BrokenMoveAssign {
    fn clone(&self) -> Self {
        Self(self.0.clone())
    }
}
impl Regular for BrokenMoveAssign {}
impl MoveOnly for BrokenMoveAssign {
    fn move_assign(&mut self, _source: Self) {}
}

/// `==` never holds.
#[derive(Clone)]
pub struct BrokenEq(pub Vec<i32>);

impl PartialEq for BrokenEq {
    fn eq(&self, _other: &Self) -> bool {
        false
    }
}

impl fmt::Debug for BrokenEq {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(&self.0, f)
    }
}

impl Regular for BrokenEq {}
impl MoveOnly for BrokenEq {}

/// `!=` agrees with `==`.
#[derive(Clone)]
pub struct BrokenNe(pub Vec<i32>);

impl PartialEq for BrokenNe {
    fn eq(&self, other: &Self) -> bool {
        self.0 == other.0
    }

    #[allow(clippy::partialeq_ne_impl)]
    fn ne(&self, other: &Self) -> bool {
        self.0 == other.0
    }
}

impl fmt::Debug for BrokenNe {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(&self.0, f)
    }
}

impl Regular for BrokenNe {}
impl MoveOnly for BrokenNe {}

/// Copies share storage with their source.
#[derive(Clone, PartialEq)]
pub struct Aliasing(pub Rc<RefCell<Vec<i32>>>);

impl Aliasing {
    pub fn new(data: &[i32]) -> Self {
        Self(Rc::new(RefCell::new(data.to_vec())))
    }
}

impl fmt::Debug for Aliasing {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(&*self.0.borrow(), f)
    }
}

impl Regular for Aliasing {}
impl MoveOnly for Aliasing {}

pub fn push_aliased(v: &mut Aliasing) {
    v.0.borrow_mut().push(42);
}

pub fn push_plain(v: &mut Vec<i32>) {
    v.push(42);
}
