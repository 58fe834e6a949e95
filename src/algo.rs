//! Heap sort engines and the configuration-driven dispatcher.
//!
//! Every engine implements [`HeapEngine`]: `heapify` builds a max-heap in the engine's
//! layout and `drain` turns that heap into an ascending sequence. [`HeapSorter`] picks
//! an engine from a validated [`HeapSortConfig`] and monomorphizes the hot loops for
//! the configured arity and layout.

use std::cmp::Ordering;
use std::marker::PhantomData;

use crate::addressing::{
    Addressing, ClusteredAddressing, FlatAddressing, HybridAddressing, RootlessAddressing,
};
use crate::cached::CachedEngine;
use crate::cascade::CascadeEngine;
use crate::config::{HeapSortConfig, Layout, Strategy};
use crate::core::{ByOrdering, Comparator, Natural};
use crate::error::ConfigResult;
use crate::pipeline::PipelinedEngine;
use crate::sift::{self, AheadSimple, SiftDown, Straight};

/// A heap sort split into its two phases.
pub trait HeapEngine {
    /// Rearranges `v` into a max-heap in this engine's layout.
    fn heapify<T: Copy, C: Comparator<T>>(&self, v: &mut [T], cmp: &mut C);

    /// Sorts a heap produced by [`HeapEngine::heapify`] ascending.
    fn drain<T: Copy, C: Comparator<T>>(&self, v: &mut [T], cmp: &mut C);

    /// Sorts `v` ascending by `cmp`.
    fn sort<T: Copy, C: Comparator<T>>(&self, v: &mut [T], cmp: &mut C) {
        self.heapify(v, cmp);
        self.drain(v, cmp);
    }
}

/// Heap sort with one sift-down per extraction, for any addressing scheme.
///
/// # Examples
///
/// ```
/// use heapcascade::addressing::ClusteredAddressing;
/// use heapcascade::algo::{HeapEngine, SiftEngine};
/// use heapcascade::core::Natural;
/// use heapcascade::sift::Straight;
///
/// let engine = SiftEngine::<_, Straight>::new(ClusteredAddressing::<2>::new(2));
/// let mut data = vec![5, 3, 8, 1, 9, 2];
/// engine.sort(&mut data, &mut Natural);
/// assert_eq!(data, vec![1, 2, 3, 5, 8, 9]);
/// ```
#[derive(Clone, Copy, Debug)]
pub struct SiftEngine<A, S> {
    addressing: A,
    _strategy: PhantomData<S>,
}

impl<A: Addressing, S: SiftDown> SiftEngine<A, S> {
    pub fn new(addressing: A) -> Self {
        Self {
            addressing,
            _strategy: PhantomData,
        }
    }

    pub fn addressing(&self) -> &A {
        &self.addressing
    }
}

impl<A: Addressing, S: SiftDown> HeapEngine for SiftEngine<A, S> {
    fn heapify<T: Copy, C: Comparator<T>>(&self, v: &mut [T], cmp: &mut C) {
        sift::heapify::<T, A, S, C>(v, &self.addressing, cmp);
    }

    fn drain<T: Copy, C: Comparator<T>>(&self, v: &mut [T], cmp: &mut C) {
        sift::drain::<T, A, S, C>(v, &self.addressing, cmp);
    }
}

/// Configured heap sort.
///
/// The configuration is checked once in [`HeapSorter::new`]; sorting never fails.
///
/// # Examples
///
/// ```
/// use heapcascade::{HeapSortConfig, HeapSorter, Layout, Strategy};
///
/// let sorter = HeapSorter::new(
///     HeapSortConfig::new()
///         .arity(4)
///         .layout(Layout::Clustered { levels: 3 })
///         .strategy(Strategy::Cascading),
/// )
/// .unwrap();
///
/// let mut data = vec![5, 3, 8, 1, 9, 2];
/// sorter.sort(&mut data);
/// assert_eq!(data, vec![1, 2, 3, 5, 8, 9]);
/// ```
#[derive(Clone, Copy, Debug)]
pub struct HeapSorter {
    config: HeapSortConfig,
}

impl HeapSorter {
    /// Validates `config` and builds a sorter for it.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`](crate::error::ConfigError) describing the first
    /// unsupported setting.
    pub fn new(config: HeapSortConfig) -> ConfigResult<Self> {
        config.validate()?;
        log::debug!("heap sorter configured: {config}");
        Ok(Self { config })
    }

    pub fn config(&self) -> &HeapSortConfig {
        &self.config
    }

    /// Sorts `v` ascending by [`Ord`].
    pub fn sort<T: Ord + Copy>(&self, v: &mut [T]) {
        self.sort_with(v, &mut Natural);
    }

    /// Sorts `v` ascending by a `slice::sort_by`-style closure.
    pub fn sort_by<T, F>(&self, v: &mut [T], compare: F)
    where
        T: Copy,
        F: FnMut(&T, &T) -> Ordering,
    {
        self.sort_with(v, &mut ByOrdering(compare));
    }

    /// Sorts `v` ascending by `cmp`.
    pub fn sort_with<T: Copy, C: Comparator<T>>(&self, v: &mut [T], cmp: &mut C) {
        log::trace!("sorting {} elements ({})", v.len(), self.config);
        if let Layout::Hybrid { levels } = self.config.layout {
            return run(HybridAddressing::new(levels), &self.config, v, cmp);
        }
        match self.config.arity {
            2 => sort_arity::<2, T, C>(&self.config, v, cmp),
            3 => sort_arity::<3, T, C>(&self.config, v, cmp),
            4 => sort_arity::<4, T, C>(&self.config, v, cmp),
            8 => sort_arity::<8, T, C>(&self.config, v, cmp),
            other => unreachable!("arity {other} passed validation"),
        }
    }
}

fn sort_arity<const K: usize, T: Copy, C: Comparator<T>>(
    config: &HeapSortConfig,
    v: &mut [T],
    cmp: &mut C,
) {
    match config.effective_layout() {
        Layout::Flat => run(FlatAddressing::<K>::new(config.base), config, v, cmp),
        Layout::Clustered { levels } => run(ClusteredAddressing::<K>::new(levels), config, v, cmp),
        Layout::Rootless { levels } => run(RootlessAddressing::<K>::new(levels), config, v, cmp),
        Layout::Hybrid { levels } => unreachable!("hybrid:{levels} is dispatched before the arity"),
    }
}

fn run<A: Addressing, T: Copy, C: Comparator<T>>(
    addressing: A,
    config: &HeapSortConfig,
    v: &mut [T],
    cmp: &mut C,
) {
    match config.strategy {
        Strategy::Straight => SiftEngine::<A, Straight>::new(addressing).sort(v, cmp),
        Strategy::AheadSimple => SiftEngine::<A, AheadSimple>::new(addressing).sort(v, cmp),
        Strategy::Cascading => CascadeEngine::new(addressing).sort(v, cmp),
        Strategy::Cached => CachedEngine.sort(v, cmp),
        Strategy::Pipelined => PipelinedEngine::with_top_levels(config.top_levels).sort(v, cmp),
    }
}

/// Sorts a slice ascending with the default engine (pipelined binary heap).
///
/// # Arguments
///
/// * `v` - The slice to sort in place.
///
/// # Examples
///
/// ```
/// use heapcascade::heap_sort;
///
/// let mut data = vec![5, 3, 8, 1, 9, 2];
/// heap_sort(&mut data);
/// assert_eq!(data, vec![1, 2, 3, 5, 8, 9]);
/// ```
pub fn heap_sort<T: Ord + Copy>(v: &mut [T]) {
    heap_sort_with(v, &mut Natural);
}

/// Sorts a slice with a `slice::sort_by`-style closure using the default engine.
///
/// # Examples
///
/// ```
/// use heapcascade::heap_sort_by;
///
/// let mut data = vec![1, 4, 2, 3];
/// heap_sort_by(&mut data, |a, b| b.cmp(a));
/// assert_eq!(data, vec![4, 3, 2, 1]);
/// ```
pub fn heap_sort_by<T, F>(v: &mut [T], compare: F)
where
    T: Copy,
    F: FnMut(&T, &T) -> Ordering,
{
    heap_sort_with(v, &mut ByOrdering(compare));
}

/// Sorts a slice with an explicit [`Comparator`] using the default engine.
pub fn heap_sort_with<T: Copy, C: Comparator<T>>(v: &mut [T], cmp: &mut C) {
    PipelinedEngine::default().sort(v, cmp);
}
