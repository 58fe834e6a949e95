//! Pipelined binary heap sort.
//!
//! The lockstep cascade in [`crate::cascade`] starts every sift-down at the root and
//! pays a full comparison round per level. This engine splits the tree in two:
//!
//! - **Top region** (`top_levels` levels, a few thousand nodes): hot in cache. Every
//!   extraction descends it immediately, ahead-simple style, down to the *frontier*
//!   level `top_levels - 2`. It goes one level further, to the region's last level,
//!   when that frontier node has nothing in flight below it.
//! - **Below the frontier**: cold. A value that settles low in the top region may
//!   still have to sink further. It becomes an in-flight operation that advances one
//!   level per extraction, oldest first, while later extractions proceed above it.
//!
//! Each frontier node is the *prefix* of the operations inside its subtree, and
//! [`PrefixCounters`] tracks how many there are:
//!
//! - **one**: the operation owns the subtree and advances hole-carrying. It pulls
//!   leaders up without comparing against its value and places the value by
//!   backtracking once it reaches a leaf.
//! - **more than one**: every operation there advances swap-carrying, so each keeps its
//!   value in the array and a newer one can never overtake an older one.
//!
//! When an extraction claims a frontier node whose subtree is owned by a single
//! hole-carrying operation, that operation is finalized on the spot by backtracking
//! its value into its path. Then the new operation joins, and both continue
//! swap-carrying. A backtrack never climbs above the slot where carrying began, so it
//! cannot reach values owned by the top region.
//!
//! Heapify and the last `top_size` extractions, once the queue is flushed, use plain
//! straight sift-downs.
//!
//! Positions in this module are one-based (root at 1, children of `p` at `2p` and
//! `2p + 1`). [`OneBased`] translates them to slice indices.

use std::ops::{Index, IndexMut};

use crate::addressing::{Base, FlatAddressing};
use crate::algo::HeapEngine;
use crate::cascade::PipelineQueue;
use crate::core::Comparator;
use crate::error::{ConfigError, ConfigResult};
use crate::geometry::{cluster_level_size, cluster_size};
use crate::sift::{self, Straight};

/// Top region depth used by the default configuration.
pub const DEFAULT_TOP_LEVELS: usize = 12;

/// Counters collected during one pipelined drain.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PipelineStats {
    /// Extractions served while the heap was larger than the top region.
    pub ticks: usize,
    /// Sift-downs handed to the pipeline.
    pub started: usize,
    /// Hole-carrying operations finalized early because a newer one joined them.
    pub collisions: usize,
    /// Largest number of sift-downs in flight at once.
    pub peak_in_flight: usize,
}

/// One-based window over a slice.
struct OneBased<'a, T> {
    v: &'a mut [T],
}

impl<T> OneBased<'_, T> {
    #[inline(always)]
    fn swap(&mut self, a: usize, b: usize) {
        self.v.swap(a - 1, b - 1);
    }
}

impl<T> Index<usize> for OneBased<'_, T> {
    type Output = T;

    #[inline(always)]
    fn index(&self, position: usize) -> &T {
        &self.v[position - 1]
    }
}

impl<T> IndexMut<usize> for OneBased<'_, T> {
    #[inline(always)]
    fn index_mut(&mut self, position: usize) -> &mut T {
        &mut self.v[position - 1]
    }
}

/// In-flight operations per frontier node.
pub struct PrefixCounters {
    counts: Vec<u8>,
    first: usize,
}

impl PrefixCounters {
    /// Counters for the frontier level `level`, all zero.
    pub fn new(level: usize) -> Self {
        let first = cluster_level_size(level, 2);
        Self {
            counts: vec![0; first],
            first,
        }
    }

    #[inline(always)]
    pub fn get(&self, prefix: usize) -> u8 {
        self.counts[prefix - self.first]
    }

    /// Bumps the counter and returns its previous value.
    #[inline(always)]
    pub fn increment(&mut self, prefix: usize) -> u8 {
        let count = &mut self.counts[prefix - self.first];
        let previous = *count;
        *count += 1;
        previous
    }

    #[inline(always)]
    pub fn decrement(&mut self, prefix: usize) {
        let count = &mut self.counts[prefix - self.first];
        debug_assert!(*count > 0, "prefix {prefix} released twice");
        *count -= 1;
    }

    pub fn is_clear(&self) -> bool {
        self.counts.iter().all(|&c| c == 0)
    }
}

/// A sift-down below the frontier.
///
/// Swap-carrying: the value sits at `index`. Hole-carrying: `index` is a hole, the
/// value is `item`, and the slots from `anchor` down to the hole hold leaders pulled up
/// by one level each.
#[derive(Clone, Copy)]
struct Operation<T> {
    index: usize,
    prefix: usize,
    anchor: usize,
    item: T,
    carrying: bool,
}

/// Larger child of `parent` within `1..=end`, ties to the right.
#[inline(always)]
fn leader_child<T, C: Comparator<T>>(
    a: &OneBased<'_, T>,
    parent: usize,
    end: usize,
    cmp: &mut C,
) -> Option<usize> {
    let left = 2 * parent;
    if left > end {
        return None;
    }
    let right = left + 1;
    if right <= end && !cmp.below(&a[right], &a[left]) {
        Some(right)
    } else {
        Some(left)
    }
}

/// Writes a hole-carrying operation's value into its path and makes it swap-carrying.
///
/// The value rises while the slot above it holds something smaller, but never above
/// `anchor`. Afterwards `index` holds either the value itself, which may still have
/// to sink, or the slot's original value, in which case the next swap step settles.
#[inline]
fn finalize<T: Copy, C: Comparator<T>>(a: &mut OneBased<'_, T>, op: &mut Operation<T>, cmp: &mut C) {
    debug_assert!(op.carrying);
    let mut index = op.index;
    while index != op.anchor && cmp.below(&a[index / 2], &op.item) {
        a[index] = a[index / 2];
        index /= 2;
    }
    a[index] = op.item;
    op.carrying = false;
}

/// One hole-carrying level. Returns `true` once the value is placed.
#[inline]
fn step_carrying<T: Copy, C: Comparator<T>>(
    a: &mut OneBased<'_, T>,
    op: &mut Operation<T>,
    end: usize,
    cmp: &mut C,
) -> bool {
    if !op.carrying {
        op.item = a[op.index];
        op.anchor = op.index;
        op.carrying = true;
    }
    match leader_child(a, op.index, end, cmp) {
        Some(child) => {
            a[op.index] = a[child];
            op.index = child;
            false
        }
        None => {
            finalize(a, op, cmp);
            true
        }
    }
}

/// One swap-carrying level. Returns `true` once the value is in place.
#[inline]
fn step_swapping<T: Copy, C: Comparator<T>>(
    a: &mut OneBased<'_, T>,
    op: &mut Operation<T>,
    end: usize,
    cmp: &mut C,
) -> bool {
    debug_assert!(!op.carrying);
    match leader_child(a, op.index, end, cmp) {
        Some(child) if cmp.below(&a[op.index], &a[child]) => {
            a.swap(op.index, child);
            op.index = child;
            false
        }
        _ => true,
    }
}

/// Per-drain scheduler state.
struct Pipeline<T> {
    queue: PipelineQueue<Operation<T>>,
    counters: PrefixCounters,
    frontier_level: usize,
    frontier_start: usize,
    below_start: usize,
    stats: PipelineStats,
}

impl<T: Copy> Pipeline<T> {
    fn new(top_levels: usize, filler: T) -> Self {
        let frontier_level = top_levels - 2;
        Self {
            queue: PipelineQueue::new(Operation {
                index: 0,
                prefix: 0,
                anchor: 0,
                item: filler,
                carrying: false,
            }),
            counters: PrefixCounters::new(frontier_level),
            frontier_level,
            frontier_start: cluster_level_size(frontier_level, 2),
            below_start: cluster_level_size(frontier_level + 1, 2),
            stats: PipelineStats::default(),
        }
    }

    /// Finalizes hole-carrying operations whose hole is the slot about to leave the
    /// heap, so the swap moves a real value to the root.
    fn retire_at<C: Comparator<T>>(&mut self, a: &mut OneBased<'_, T>, position: usize, cmp: &mut C) {
        self.queue.service(|op| {
            if op.carrying && op.index == position {
                finalize(a, op, cmp);
            }
            false
        });
    }

    /// Sifts the new root through the top region and queues it if it may sink further.
    fn start<C: Comparator<T>>(&mut self, a: &mut OneBased<'_, T>, end: usize, cmp: &mut C) {
        let item = a[1];
        let mut index = 1;
        for _ in 0..self.frontier_level {
            let Some(child) = leader_child(a, index, end, cmp) else {
                break;
            };
            a[index] = a[child];
            index = child;
        }

        let prefix = index;
        let at_frontier = index >= self.frontier_start;
        let occupied = at_frontier && self.counters.get(prefix) > 0;
        if at_frontier && !occupied {
            if let Some(child) = leader_child(a, index, end, cmp) {
                a[index] = a[child];
                index = child;
            }
        }

        while index > 1 && cmp.below(&a[index / 2], &item) {
            a[index] = a[index / 2];
            index /= 2;
        }
        a[index] = item;

        // Anywhere else the value is settled: above the frontier everything below was
        // pulled up past it, and at an unoccupied frontier node the descent already
        // compared it against the leader below.
        let claims = if occupied {
            index == prefix
        } else {
            index >= self.below_start
        };
        if !claims {
            return;
        }

        if self.counters.increment(prefix) == 1 {
            let owner = self.queue.slots().find(|&slot| self.queue.get(slot).prefix == prefix);
            debug_assert!(owner.is_some(), "prefix {prefix} counted without an owner");
            if let Some(slot) = owner {
                let op = self.queue.get_mut(slot);
                if op.carrying {
                    finalize(a, op, cmp);
                    self.stats.collisions += 1;
                }
            }
        }

        self.queue.push_back(Operation {
            index,
            prefix,
            anchor: index,
            item,
            carrying: false,
        });
        self.stats.started += 1;
        self.stats.peak_in_flight = self.stats.peak_in_flight.max(self.queue.len());
    }

    /// Advances every in-flight operation by one level within `1..=end`.
    fn advance<C: Comparator<T>>(&mut self, a: &mut OneBased<'_, T>, end: usize, cmp: &mut C) {
        let counters = &mut self.counters;
        let below_start = self.below_start;

        self.queue.service(|op| {
            let settled = if op.index > end {
                // Swapped to the root by the last extraction.
                debug_assert!(!op.carrying);
                true
            } else if counters.get(op.prefix) == 1 && op.index >= below_start {
                step_carrying(a, op, end, cmp)
            } else {
                debug_assert!(!op.carrying, "shared subtree with a hole-carrying operation");
                step_swapping(a, op, end, cmp)
            };

            if settled {
                counters.decrement(op.prefix);
            }
            settled
        });
    }
}

/// Binary heap sort with a pipelined drain.
///
/// # Examples
///
/// ```
/// use heapcascade::core::Natural;
/// use heapcascade::pipeline::PipelinedEngine;
/// use heapcascade::HeapEngine;
///
/// let engine = PipelinedEngine::new(4).unwrap();
/// let mut data: Vec<u32> = (0..1000).map(|i| (i * 7919) % 1000).collect();
/// let stats = engine.sort_with_stats(&mut data, &mut Natural);
///
/// assert!(data.windows(2).all(|w| w[0] <= w[1]));
/// assert!(stats.started > 0);
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PipelinedEngine {
    top_levels: usize,
}

impl Default for PipelinedEngine {
    fn default() -> Self {
        Self {
            top_levels: DEFAULT_TOP_LEVELS,
        }
    }
}

impl PipelinedEngine {
    /// Engine whose top region spans `top_levels` levels (3..=24).
    pub fn new(top_levels: usize) -> ConfigResult<Self> {
        if !(3..=24).contains(&top_levels) {
            return Err(ConfigError::TopLevelsOutOfRange(top_levels));
        }
        Ok(Self { top_levels })
    }

    /// For depths already checked by [`HeapSortConfig::validate`](crate::config::HeapSortConfig::validate).
    pub(crate) fn with_top_levels(top_levels: usize) -> Self {
        debug_assert!((3..=24).contains(&top_levels));
        Self { top_levels }
    }

    pub fn top_levels(&self) -> usize {
        self.top_levels
    }

    /// Elements in the top region. Heaps up to this size are drained directly.
    pub fn top_size(&self) -> usize {
        cluster_size(self.top_levels, 2)
    }

    /// Heapify followed by [`PipelinedEngine::drain_with_stats`].
    pub fn sort_with_stats<T: Copy, C: Comparator<T>>(
        &self,
        v: &mut [T],
        cmp: &mut C,
    ) -> PipelineStats {
        self.heapify(v, cmp);
        self.drain_with_stats(v, cmp)
    }

    /// Drains a heap built by [`HeapEngine::heapify`], returning pipeline counters.
    pub fn drain_with_stats<T: Copy, C: Comparator<T>>(
        &self,
        v: &mut [T],
        cmp: &mut C,
    ) -> PipelineStats {
        let count = v.len();
        if count < 2 {
            return PipelineStats::default();
        }

        let top_size = self.top_size();
        let mut next = count;
        let mut stats = PipelineStats::default();

        if next > top_size {
            let mut pipeline = Pipeline::new(self.top_levels, v[0]);
            let mut a = OneBased { v: &mut *v };

            while next > top_size {
                pipeline.retire_at(&mut a, next, cmp);
                a.swap(1, next);
                let end = next - 1;
                pipeline.start(&mut a, end, cmp);
                pipeline.advance(&mut a, end, cmp);
                pipeline.stats.ticks += 1;
                next -= 1;
            }

            while !pipeline.queue.is_empty() {
                pipeline.advance(&mut a, next, cmp);
            }
            debug_assert!(pipeline.counters.is_clear());
            stats = pipeline.stats;
        }

        let flat = FlatAddressing::<2>::new(Base::One);
        sift::drain::<T, _, Straight, C>(&mut v[..next], &flat, cmp);
        stats
    }
}

impl HeapEngine for PipelinedEngine {
    fn heapify<T: Copy, C: Comparator<T>>(&self, v: &mut [T], cmp: &mut C) {
        let flat = FlatAddressing::<2>::new(Base::One);
        sift::heapify::<T, _, Straight, C>(v, &flat, cmp);
    }

    fn drain<T: Copy, C: Comparator<T>>(&self, v: &mut [T], cmp: &mut C) {
        let stats = self.drain_with_stats(v, cmp);
        if stats.ticks > 0 {
            log::debug!("pipelined drain of {} elements: {:?}", v.len(), stats);
        }
    }
}
