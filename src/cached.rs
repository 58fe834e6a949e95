//! Binary heap sort that caches child-vs-child comparisons.
//!
//! In a binary drain, every level costs two comparisons: the children against each
//! other, then the leader against the sifted value. The first is usually the same
//! question the previous drain step already answered. This engine stores those
//! answers and only asks again for pairs it has written to.
//!
//! Layout: a forest of rootless clusters, each holding three levels of a binary tree
//! (2 + 4 + 8 = 14 slots). Cluster 0 holds the two top nodes of the heap. Both children
//! of a last-level node form the top pair of one child cluster. The seven sibling
//! pairs of a cluster map to seven bits of one [`ComparisonCache`] byte:
//!
//! ```text
//! pair j = slots (2j, 2j + 1) of the cluster; bit j set  <=>  slot 2j + 1 leads
//! ```
//!
//! A drain step reads the leader path from the bits, moves three leaders up per
//! cluster with a single comparison against the sifted value, then refreshes exactly
//! the three pairs it wrote. Before each step, the pairs at and after the extracted
//! slot are masked to "left leads", so a bit never points at a slot outside the heap.

use crate::algo::HeapEngine;
use crate::core::Comparator;
use crate::geometry::{cluster_level_size, cluster_size};

/// Levels of the binary tree stored in one cluster.
pub const CLUSTER_LEVELS: usize = 3;

/// Slots in one rootless cluster.
pub const CLUSTER_SIZE: usize = cluster_size(CLUSTER_LEVELS + 1, 2) - 1;

/// First slot of a cluster's last level.
const LAST_LEVEL_START: usize = cluster_size(CLUSTER_LEVELS, 2) - 1;

/// Child clusters per cluster, one per last-level node.
const FANOUT: usize = cluster_level_size(CLUSTER_LEVELS, 2);

/// Cached sibling-pair outcomes, one byte per cluster.
pub struct ComparisonCache {
    bits: Vec<u8>,
}

impl ComparisonCache {
    /// Computes every pair of a heap laid out by [`CachedEngine::heapify`].
    pub fn build<T, C: Comparator<T>>(v: &[T], cmp: &mut C) -> Self {
        let count = v.len();
        let bits = (0..count.div_ceil(CLUSTER_SIZE))
            .map(|cluster| cluster_pairs(v, count, cluster, cmp))
            .collect();
        Self { bits }
    }

    /// Clusters covered.
    pub fn len(&self) -> usize {
        self.bits.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bits.is_empty()
    }

    /// Raw bits of one cluster.
    pub fn cluster_bits(&self, cluster: usize) -> u8 {
        self.bits[cluster]
    }

    /// Whether every stored bit matches the pair it caches in the live heap `0..count`.
    ///
    /// A stale bit sends a drain down the wrong child, so this must hold between any
    /// two drain steps.
    pub fn is_coherent<T, C: Comparator<T>>(&self, v: &[T], count: usize, cmp: &mut C) -> bool {
        (0..self.len())
            .all(|cluster| self.cluster_bits(cluster) == cluster_pairs(v, count, cluster, cmp))
    }

    /// Local slot leading pair `pair` of `cluster`.
    #[inline(always)]
    fn leader(&self, cluster: usize, pair: usize) -> usize {
        2 * pair + ((self.bits[cluster] >> pair) & 1) as usize
    }

    /// Forgets every pair at or after the pair containing `slot`.
    #[inline(always)]
    fn truncate(&mut self, slot: usize) {
        let pair = (slot % CLUSTER_SIZE) / 2;
        self.bits[slot / CLUSTER_SIZE] &= (1u8 << pair) - 1;
    }

    /// Recomputes three pairs of one cluster within the live heap `0..count`.
    #[inline(always)]
    fn refresh<T, C: Comparator<T>>(
        &mut self,
        v: &[T],
        count: usize,
        cluster: usize,
        pairs: [usize; 3],
        cmp: &mut C,
    ) {
        let base = cluster * CLUSTER_SIZE;
        let mut bits = self.bits[cluster];
        for pair in pairs {
            let bit = right_leads(v, count, base + 2 * pair, cmp);
            bits = (bits & !(1 << pair)) | (bit << pair);
        }
        self.bits[cluster] = bits;
    }
}

/// Bits of every pair of one cluster within the live heap `0..count`.
fn cluster_pairs<T, C: Comparator<T>>(v: &[T], count: usize, cluster: usize, cmp: &mut C) -> u8 {
    let base = cluster * CLUSTER_SIZE;
    (0..CLUSTER_SIZE / 2).fold(0, |bits, pair| bits | right_leads(v, count, base + 2 * pair, cmp) << pair)
}

/// 1 when the right slot of the pair starting at `left` is live and not below the left.
#[inline(always)]
fn right_leads<T, C: Comparator<T>>(v: &[T], count: usize, left: usize, cmp: &mut C) -> u8 {
    let right = left + 1;
    (right < count && !cmp.below(&v[right], &v[left])) as u8
}

/// First child of `slot` in the cluster forest. The second child follows it.
#[inline(always)]
fn first_child(slot: usize) -> usize {
    let cluster = slot / CLUSTER_SIZE;
    let local = slot % CLUSTER_SIZE;
    if local < LAST_LEVEL_START {
        cluster * CLUSTER_SIZE + (local + 1) * 2
    } else {
        (cluster * FANOUT + (local - LAST_LEVEL_START) + 1) * CLUSTER_SIZE
    }
}

/// Straight sift-down in the cluster forest, without the cache.
fn sift_down_uncached<T: Copy, C: Comparator<T>>(
    v: &mut [T],
    mut node: usize,
    count: usize,
    cmp: &mut C,
) {
    loop {
        let left = first_child(node);
        if left >= count {
            break;
        }
        let right = left + 1;
        let child = if right < count && !cmp.below(&v[right], &v[left]) {
            right
        } else {
            left
        };
        if !cmp.below(&v[node], &v[child]) {
            break;
        }
        v.swap(node, child);
        node = child;
    }
}

/// Moves the maximum of the live heap `0..next` plus `next` itself into `next` and
/// sifts the value that was there back in. Requires `next >= 2`.
fn extract<T: Copy, C: Comparator<T>>(
    v: &mut [T],
    cache: &mut ComparisonCache,
    next: usize,
    cmp: &mut C,
) {
    debug_assert!(next >= 2);
    let count = next;
    let item = v[next];

    let mut cluster = 0;
    let mut base = 0;
    let mut m1 = cache.leader(0, 0);
    v[next] = v[m1];

    // Leaders on levels two and three of the current cluster.
    let (m2, m3) = loop {
        let m2 = cache.leader(cluster, m1 + 1);
        let m3 = cache.leader(cluster, m2 + 1);

        let child_cluster = cluster * FANOUT + (m3 - LAST_LEVEL_START) + 1;
        let child_base = child_cluster * CLUSTER_SIZE;
        if child_base >= count {
            break (m2, m3);
        }
        let c1 = cache.leader(child_cluster, 0);
        if !cmp.below(&item, &v[child_base + c1]) {
            break (m2, m3);
        }

        // The child cluster exists, so this one is full.
        v[base + m1] = v[base + m2];
        v[base + m2] = v[base + m3];
        v[base + m3] = v[child_base + c1];
        cache.refresh(v, count, cluster, [0, m1 + 1, m2 + 1], cmp);

        cluster = child_cluster;
        base = child_base;
        m1 = c1;
    };

    let mut hole = m1;
    if base + m2 < count && !cmp.below(&v[base + m2], &item) {
        v[base + m1] = v[base + m2];
        hole = m2;
        if base + m3 < count && !cmp.below(&v[base + m3], &item) {
            v[base + m2] = v[base + m3];
            hole = m3;
        }
    }
    v[base + hole] = item;
    cache.refresh(v, count, cluster, [0, m1 + 1, m2 + 1], cmp);
}

/// Binary heap sort over the cluster forest with a [`ComparisonCache`].
///
/// `drain` expects a heap built by this engine's `heapify`; the layout differs from
/// the flat binary heap.
///
/// # Examples
///
/// ```
/// use heapcascade::cached::CachedEngine;
/// use heapcascade::core::Natural;
/// use heapcascade::HeapEngine;
///
/// let mut data = vec![5, 3, 8, 1, 9, 2, 7, 7, 0];
/// CachedEngine.sort(&mut data, &mut Natural);
/// assert_eq!(data, vec![0, 1, 2, 3, 5, 7, 7, 8, 9]);
/// ```
#[derive(Clone, Copy, Debug, Default)]
pub struct CachedEngine;

impl CachedEngine {
    /// [`HeapEngine::drain`] that calls `inspect(v, cache, next)` after each extraction,
    /// where `0..next` is the heap still to be drained.
    pub fn drain_inspect<T, C, F>(&self, v: &mut [T], cmp: &mut C, mut inspect: F)
    where
        T: Copy,
        C: Comparator<T>,
        F: FnMut(&[T], &ComparisonCache, usize),
    {
        let count = v.len();
        if count < 2 {
            return;
        }

        let mut cache = ComparisonCache::build(v, cmp);
        for next in (2..count).rev() {
            cache.truncate(next);
            extract(v, &mut cache, next, cmp);
            inspect(v, &cache, next);
        }
        // The two top nodes have no common parent in the forest.
        if cmp.below(&v[1], &v[0]) {
            v.swap(0, 1);
        }
    }
}

impl HeapEngine for CachedEngine {
    fn heapify<T: Copy, C: Comparator<T>>(&self, v: &mut [T], cmp: &mut C) {
        let count = v.len();
        for node in (0..count).rev() {
            sift_down_uncached(v, node, count, cmp);
        }
    }

    fn drain<T: Copy, C: Comparator<T>>(&self, v: &mut [T], cmp: &mut C) {
        self.drain_inspect(v, cmp, |_, _, _| {});
    }
}
