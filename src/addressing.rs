//! Addressing schemes: how a logical `arity`-ary tree is laid out in a slice.
//!
//! - [`FlatAddressing`]: the classic implicit heap, numbered from 0 or from 1.
//! - [`ClusteredAddressing`]: fixed-depth subtrees stored in contiguous blocks, so one
//!   descent touches one block for several levels before jumping to a child block.
//! - [`RootlessAddressing`]: blocks that start at a sibling group instead of a subtree
//!   root, so all children of a node always share one block.
//! - [`HybridAddressing`]: a flat ternary top cluster over small two-level blocks whose
//!   levels have arities 3 and 4.
//!
//! Engines never do index arithmetic themselves. They walk the tree with an
//! [`Addressing::Cursor`], which lets the clustered scheme carry its block bookkeeping
//! from parent to child instead of recomputing it at every level.

use std::fmt;
use std::str::FromStr;

use crate::error::ConfigError;
use crate::geometry::HeapGeometry;

/// Children of a node: `first, first + stride, ..., first + (arity - 1) * stride`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ChildSpan {
    pub first: usize,
    pub stride: usize,
}

impl ChildSpan {
    /// Slot of the `k`-th child.
    #[inline(always)]
    pub fn nth(&self, k: usize) -> usize {
        self.first + k * self.stride
    }
}

/// Parent/child geometry of one heap layout.
///
/// Slots are always buffer indices, `0..count`. The root is slot 0 in every scheme.
/// Child slots are strictly greater than their parent, so walking slots backwards
/// visits every subtree before its root.
pub trait Addressing {
    /// Position state carried while walking the tree.
    type Cursor: Copy;

    /// Largest branching factor of any node.
    fn arity(&self) -> usize;

    /// Number of children the cursor's node can have. Never more than `arity`.
    #[inline(always)]
    fn degree(&self, _cursor: &Self::Cursor) -> usize {
        self.arity()
    }

    fn root(&self) -> Self::Cursor;

    /// Builds a cursor for an arbitrary slot from scratch.
    fn locate(&self, slot: usize) -> Self::Cursor;

    /// Buffer index the cursor points at.
    fn slot(&self, cursor: &Self::Cursor) -> usize;

    /// Child slots of the cursor's node. They may lie beyond the live heap; callers
    /// bound them against the current count.
    fn children(&self, cursor: &Self::Cursor) -> ChildSpan;

    /// Cursor of the `k`-th child.
    fn descend(&self, cursor: &Self::Cursor, k: usize) -> Self::Cursor;

    /// Cursor of slot `slot(cursor) - 1`, or `None` at the root.
    fn predecessor(&self, cursor: &Self::Cursor) -> Option<Self::Cursor>;

    /// Parent of `slot`, or `None` for the root.
    fn parent_slot(&self, slot: usize) -> Option<usize>;

    /// Highest slot heapify has to visit for a heap of `count` elements.
    fn last_internal(&self, count: usize) -> usize {
        count.saturating_sub(1)
    }

    /// Slot of the `k`-th child, or `None` when it falls outside `0..count`.
    #[inline(always)]
    fn child_slot(&self, cursor: &Self::Cursor, k: usize, count: usize) -> Option<usize> {
        debug_assert!(k < self.degree(cursor));
        let slot = self.children(cursor).nth(k);
        (slot < count).then_some(slot)
    }
}

/// Numbering convention of a flat heap.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Base {
    /// Root at position 0, children of `i` at `i*k+1 ..= i*k+k`.
    Zero,
    /// Root at position 1, children of `p` at `k*(p-1)+2 ..= k*p+1` (binary: `2p, 2p+1`).
    One,
}

impl Base {
    /// Distance between a position in this numbering and its buffer index.
    #[inline(always)]
    pub const fn offset(self) -> usize {
        match self {
            Base::Zero => 0,
            Base::One => 1,
        }
    }
}

impl fmt::Display for Base {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Base::Zero => f.write_str("zero"),
            Base::One => f.write_str("one"),
        }
    }
}

impl FromStr for Base {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "zero" | "0" => Ok(Base::Zero),
            "one" | "1" => Ok(Base::One),
            other => Err(ConfigError::Unknown {
                kind: "base",
                value: other.to_string(),
            }),
        }
    }
}

/// Implicit `K`-ary heap over the whole slice.
///
/// The cursor is the node's position in the chosen numbering. Both numberings describe
/// the same tree; they differ only in the constants of the index arithmetic.
///
/// # Examples
///
/// ```
/// use heapcascade::addressing::{Addressing, Base, FlatAddressing};
///
/// let one = FlatAddressing::<2>::new(Base::One);
/// let root = one.root();
/// // Position 1 has children 2 and 3, i.e. buffer slots 1 and 2.
/// assert_eq!(one.child_slot(&root, 0, 10), Some(1));
/// assert_eq!(one.child_slot(&root, 1, 10), Some(2));
/// assert_eq!(one.parent_slot(2), Some(0));
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FlatAddressing<const K: usize> {
    base: Base,
}

impl<const K: usize> FlatAddressing<K> {
    pub const fn new(base: Base) -> Self {
        assert!(K >= 2, "heap arity must be at least 2");
        Self { base }
    }

    pub const fn base(&self) -> Base {
        self.base
    }

    #[inline(always)]
    fn first_child_position(&self, position: usize) -> usize {
        match self.base {
            Base::Zero => position.saturating_mul(K).saturating_add(1),
            Base::One => (position - 1).saturating_mul(K).saturating_add(2),
        }
    }

    #[inline(always)]
    fn parent_position(&self, position: usize) -> usize {
        match self.base {
            Base::Zero => (position - 1) / K,
            Base::One => (position + K - 2) / K,
        }
    }
}

impl<const K: usize> Addressing for FlatAddressing<K> {
    type Cursor = usize;

    #[inline(always)]
    fn arity(&self) -> usize {
        K
    }

    #[inline(always)]
    fn root(&self) -> usize {
        self.base.offset()
    }

    #[inline(always)]
    fn locate(&self, slot: usize) -> usize {
        slot + self.base.offset()
    }

    #[inline(always)]
    fn slot(&self, cursor: &usize) -> usize {
        *cursor - self.base.offset()
    }

    #[inline(always)]
    fn children(&self, cursor: &usize) -> ChildSpan {
        ChildSpan {
            first: self.first_child_position(*cursor) - self.base.offset(),
            stride: 1,
        }
    }

    #[inline(always)]
    fn descend(&self, cursor: &usize, k: usize) -> usize {
        self.first_child_position(*cursor) + k
    }

    #[inline(always)]
    fn predecessor(&self, cursor: &usize) -> Option<usize> {
        (*cursor > self.base.offset()).then(|| *cursor - 1)
    }

    #[inline(always)]
    fn parent_slot(&self, slot: usize) -> Option<usize> {
        if slot == 0 {
            return None;
        }
        let offset = self.base.offset();
        Some(self.parent_position(slot + offset) - offset)
    }

    fn last_internal(&self, count: usize) -> usize {
        if count < 2 {
            0
        } else {
            // Nothing past the last leaf's parent has children.
            self.parent_slot(count - 1).unwrap_or(0)
        }
    }
}

/// Cursor of [`ClusteredAddressing`].
///
/// Besides the slot it tracks the cluster containing it and the span of the global
/// cluster level (all clusters at the same depth) that cluster belongs to.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ClusterCursor {
    pub slot: usize,
    pub cluster_start: usize,
    pub level_start: usize,
    pub level_size: usize,
}

/// `K`-ary heap whose subtrees of `levels` levels are stored as contiguous clusters.
///
/// Cluster level 0 is the root cluster. Its last-level nodes own `fanout` child
/// clusters, stored one after another right behind it, and so on. Inside a cluster
/// nodes use zero-based flat numbering.
///
/// # Examples
///
/// ```
/// use heapcascade::addressing::{Addressing, ClusteredAddressing};
///
/// // Binary clusters of 2 levels: {0, 1, 2}, then child clusters at 3, 6, 9, 12.
/// let clustered = ClusteredAddressing::<2>::new(2);
/// let root = clustered.root();
/// assert_eq!(clustered.child_slot(&root, 0, 16), Some(1));
///
/// let left = clustered.descend(&root, 0);
/// assert_eq!(clustered.child_slot(&left, 0, 16), Some(3));
/// assert_eq!(clustered.child_slot(&left, 1, 16), Some(6));
/// assert_eq!(clustered.parent_slot(6), Some(1));
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ClusteredAddressing<const K: usize> {
    geometry: HeapGeometry,
}

impl<const K: usize> ClusteredAddressing<K> {
    pub const fn new(levels: usize) -> Self {
        assert!(K >= 2, "heap arity must be at least 2");
        assert!(levels >= 1, "clusters need at least one level");
        Self {
            geometry: HeapGeometry::new(K, levels),
        }
    }

    pub const fn geometry(&self) -> &HeapGeometry {
        &self.geometry
    }
}

impl<const K: usize> Addressing for ClusteredAddressing<K> {
    type Cursor = ClusterCursor;

    #[inline(always)]
    fn arity(&self) -> usize {
        K
    }

    #[inline(always)]
    fn root(&self) -> ClusterCursor {
        ClusterCursor {
            slot: 0,
            cluster_start: 0,
            level_start: 0,
            level_size: self.geometry.cluster_size,
        }
    }

    fn locate(&self, slot: usize) -> ClusterCursor {
        let g = &self.geometry;
        let mut level_start = 0;
        let mut level_size = g.cluster_size;
        while slot - level_start >= level_size {
            level_start += level_size;
            level_size = level_size.saturating_mul(g.fanout);
        }
        ClusterCursor {
            slot,
            cluster_start: slot - (slot - level_start) % g.cluster_size,
            level_start,
            level_size,
        }
    }

    #[inline(always)]
    fn slot(&self, cursor: &ClusterCursor) -> usize {
        cursor.slot
    }

    #[inline(always)]
    fn children(&self, cursor: &ClusterCursor) -> ChildSpan {
        let g = &self.geometry;
        let relative = cursor.slot - cursor.cluster_start;

        if !g.is_last_level(relative) {
            return ChildSpan {
                first: cursor.cluster_start + relative * K + 1,
                stride: 1,
            };
        }

        let first = (cursor.cluster_start - cursor.level_start)
            .saturating_mul(g.fanout)
            .saturating_add((relative - g.last_level_start) * K * g.cluster_size)
            .saturating_add(cursor.level_start + cursor.level_size);
        ChildSpan {
            first,
            stride: g.cluster_size,
        }
    }

    #[inline(always)]
    fn descend(&self, cursor: &ClusterCursor, k: usize) -> ClusterCursor {
        let g = &self.geometry;
        let slot = self.children(cursor).nth(k);

        // Single-level clusters also have stride 1.
        if !g.is_last_level(cursor.slot - cursor.cluster_start) {
            ClusterCursor { slot, ..*cursor }
        } else {
            ClusterCursor {
                slot,
                cluster_start: slot,
                level_start: cursor.level_start + cursor.level_size,
                level_size: cursor.level_size.saturating_mul(g.fanout),
            }
        }
    }

    #[inline(always)]
    fn predecessor(&self, cursor: &ClusterCursor) -> Option<ClusterCursor> {
        if cursor.slot == 0 {
            return None;
        }
        let g = &self.geometry;
        let mut prev = ClusterCursor {
            slot: cursor.slot - 1,
            ..*cursor
        };
        if prev.slot < prev.cluster_start {
            prev.cluster_start -= g.cluster_size;
            if prev.cluster_start < prev.level_start {
                prev.level_size /= g.fanout;
                prev.level_start -= prev.level_size;
            }
        }
        Some(prev)
    }

    fn parent_slot(&self, slot: usize) -> Option<usize> {
        if slot == 0 {
            return None;
        }
        let g = &self.geometry;
        let cursor = self.locate(slot);
        let relative = slot - cursor.cluster_start;
        if relative > 0 {
            return Some(cursor.cluster_start + (relative - 1) / K);
        }

        // Cluster root: find the last-level node of the parent cluster that owns it.
        let ordinal = (cursor.cluster_start - cursor.level_start) / g.cluster_size;
        let parent_level_size = cursor.level_size / g.fanout;
        let parent_level_start = cursor.level_start - parent_level_size;
        let parent_cluster = parent_level_start + (ordinal / g.fanout) * g.cluster_size;
        Some(parent_cluster + g.last_level_start + (ordinal % g.fanout) / K)
    }

    fn last_internal(&self, count: usize) -> usize {
        if count < 3 {
            return 0;
        }
        // A cluster root's parent sits far before it, so the slot just before the last
        // one may have the higher parent.
        let last = self.parent_slot(count - 1).unwrap_or(0);
        let previous = self.parent_slot(count - 2).unwrap_or(0);
        last.max(previous)
    }
}

/// Cursor of [`RootlessAddressing`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RootlessCursor {
    pub slot: usize,
    /// Ordinal of the block holding `slot`. Meaningless at the root.
    pub cluster: usize,
    pub cluster_start: usize,
}

/// `K`-ary heap stored as blocks of `levels` sibling levels below a lone root.
///
/// Slot 0 is the root. Every other slot belongs to a rootless block of
/// `K + K^2 + ... + K^levels` slots starting at slot 1. A block's first level is one
/// complete sibling group, and the `K^levels` nodes on its last level each own one child
/// block whose first level holds their children. Siblings therefore never straddle two
/// blocks.
///
/// # Examples
///
/// ```
/// use heapcascade::addressing::{Addressing, RootlessAddressing};
///
/// // Binary blocks of 2 levels (6 slots): {1..=6}, then child blocks at 7, 13, 19, 25.
/// let rootless = RootlessAddressing::<2>::new(2);
/// let root = rootless.root();
/// assert_eq!(rootless.child_slot(&root, 1, 40), Some(2));
///
/// let left = rootless.descend(&root, 0);
/// assert_eq!(rootless.child_slot(&left, 0, 40), Some(3));
///
/// let bottom = rootless.descend(&left, 1);
/// assert_eq!(rootless.child_slot(&bottom, 0, 40), Some(13));
/// assert_eq!(rootless.parent_slot(14), Some(4));
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RootlessAddressing<const K: usize> {
    cluster_size: usize,
    last_level_start: usize,
    last_level_size: usize,
}

impl<const K: usize> RootlessAddressing<K> {
    pub const fn new(levels: usize) -> Self {
        assert!(K >= 2, "heap arity must be at least 2");
        assert!(levels >= 1, "clusters need at least one level");
        // A rooted cluster one level deeper, minus its root.
        let g = HeapGeometry::new(K, levels + 1);
        Self {
            cluster_size: g.cluster_size - 1,
            last_level_start: g.last_level_start - 1,
            last_level_size: g.last_level_size,
        }
    }

    /// Slots in one block.
    pub const fn cluster_size(&self) -> usize {
        self.cluster_size
    }

    #[inline(always)]
    fn cluster_start(&self, cluster: usize) -> usize {
        cluster.saturating_mul(self.cluster_size).saturating_add(1)
    }

    /// Block owned by the last-level node at `relative` in `cluster`.
    #[inline(always)]
    fn child_cluster(&self, cluster: usize, relative: usize) -> usize {
        cluster
            .saturating_mul(self.last_level_size)
            .saturating_add(relative - self.last_level_start + 1)
    }
}

impl<const K: usize> Addressing for RootlessAddressing<K> {
    type Cursor = RootlessCursor;

    #[inline(always)]
    fn arity(&self) -> usize {
        K
    }

    #[inline(always)]
    fn root(&self) -> RootlessCursor {
        RootlessCursor {
            slot: 0,
            cluster: 0,
            cluster_start: 0,
        }
    }

    fn locate(&self, slot: usize) -> RootlessCursor {
        if slot == 0 {
            return self.root();
        }
        let cluster = (slot - 1) / self.cluster_size;
        RootlessCursor {
            slot,
            cluster,
            cluster_start: self.cluster_start(cluster),
        }
    }

    #[inline(always)]
    fn slot(&self, cursor: &RootlessCursor) -> usize {
        cursor.slot
    }

    #[inline(always)]
    fn children(&self, cursor: &RootlessCursor) -> ChildSpan {
        if cursor.slot == 0 {
            return ChildSpan { first: 1, stride: 1 };
        }
        let relative = cursor.slot - cursor.cluster_start;
        let first = if relative < self.last_level_start {
            cursor.cluster_start + (relative + 1) * K
        } else {
            self.cluster_start(self.child_cluster(cursor.cluster, relative))
        };
        ChildSpan { first, stride: 1 }
    }

    #[inline(always)]
    fn descend(&self, cursor: &RootlessCursor, k: usize) -> RootlessCursor {
        let slot = self.children(cursor).nth(k);
        if cursor.slot == 0 {
            return RootlessCursor {
                slot,
                cluster: 0,
                cluster_start: 1,
            };
        }
        let relative = cursor.slot - cursor.cluster_start;
        if relative < self.last_level_start {
            RootlessCursor { slot, ..*cursor }
        } else {
            let cluster = self.child_cluster(cursor.cluster, relative);
            RootlessCursor {
                slot,
                cluster,
                cluster_start: self.cluster_start(cluster),
            }
        }
    }

    #[inline(always)]
    fn predecessor(&self, cursor: &RootlessCursor) -> Option<RootlessCursor> {
        match cursor.slot {
            0 => None,
            1 => Some(self.root()),
            slot if slot - 1 < cursor.cluster_start => Some(RootlessCursor {
                slot: slot - 1,
                cluster: cursor.cluster - 1,
                cluster_start: cursor.cluster_start - self.cluster_size,
            }),
            slot => Some(RootlessCursor {
                slot: slot - 1,
                ..*cursor
            }),
        }
    }

    fn parent_slot(&self, slot: usize) -> Option<usize> {
        if slot == 0 {
            return None;
        }
        let cluster = (slot - 1) / self.cluster_size;
        let relative = (slot - 1) % self.cluster_size;
        if relative >= K {
            return Some(self.cluster_start(cluster) + relative / K - 1);
        }
        if cluster == 0 {
            return Some(0);
        }

        // Top sibling group: its parent is a last-level node of an earlier block.
        let owner = (cluster - 1) / self.last_level_size;
        let ordinal = (cluster - 1) % self.last_level_size;
        Some(self.cluster_start(owner) + self.last_level_start + ordinal)
    }

    fn last_internal(&self, count: usize) -> usize {
        if count < 2 {
            return 0;
        }
        let last = count - 1;
        let parent = self.parent_slot(last).unwrap_or(0);
        let relative = (last - 1) % self.cluster_size;
        let cluster_start = last - relative;
        if relative < K && cluster_start > 1 {
            // The previous block is complete and its last slot has the highest parent
            // within it.
            parent.max(self.parent_slot(cluster_start - 1).unwrap_or(0))
        } else {
            parent
        }
    }
}

/// Slots in one small cluster of [`HybridAddressing`].
pub const HYBRID_SMALL_CLUSTER_SIZE: usize = 16;

/// Nodes on the first level of a small cluster.
const HYBRID_SMALL_FIRST_LEVEL: usize = 4;

/// Small clusters owned by one small cluster, one per second-level node.
const HYBRID_SMALL_FANOUT: usize = HYBRID_SMALL_CLUSTER_SIZE - HYBRID_SMALL_FIRST_LEVEL;

/// Top cluster depth of the default hybrid layout.
pub const DEFAULT_HYBRID_TOP_LEVELS: usize = 8;

/// Mixed-arity heap: a flat ternary top cluster over small rootless clusters.
///
/// The top cluster is a zero-based ternary heap of `top_levels` levels. Each of its
/// last-level nodes has four children, the first level of its own small cluster of
/// 16 slots. Inside a small cluster the four first-level nodes have three children
/// each on the second level, and every second-level node again has four children: the
/// first level of the next small cluster. Small clusters are numbered in breadth-first
/// order right behind the top cluster.
///
/// The cursor is the slot itself.
///
/// # Examples
///
/// ```
/// use heapcascade::addressing::{Addressing, HybridAddressing};
///
/// // Top cluster {0, 1, 2, 3}: the root and three last-level nodes.
/// let hybrid = HybridAddressing::new(2);
/// assert_eq!(hybrid.degree(&0), 3);
/// assert_eq!(hybrid.degree(&1), 4);
/// assert_eq!(hybrid.children(&1).first, 4);
/// assert_eq!(hybrid.children(&4).first, 8);
/// assert_eq!(hybrid.parent_slot(52), Some(8));
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct HybridAddressing {
    top_size: usize,
    top_last_level_start: usize,
    top_last_level_size: usize,
}

impl HybridAddressing {
    pub const fn new(top_levels: usize) -> Self {
        assert!(top_levels >= 1, "the top cluster needs at least one level");
        let g = HeapGeometry::new(3, top_levels);
        Self {
            top_size: g.cluster_size,
            top_last_level_start: g.last_level_start,
            top_last_level_size: g.last_level_size,
        }
    }

    /// Slots in the top cluster.
    pub const fn top_size(&self) -> usize {
        self.top_size
    }

    #[inline(always)]
    fn small_cluster_start(&self, cluster: usize) -> usize {
        cluster
            .saturating_mul(HYBRID_SMALL_CLUSTER_SIZE)
            .saturating_add(self.top_size)
    }
}

impl Default for HybridAddressing {
    fn default() -> Self {
        Self::new(DEFAULT_HYBRID_TOP_LEVELS)
    }
}

impl Addressing for HybridAddressing {
    type Cursor = usize;

    #[inline(always)]
    fn arity(&self) -> usize {
        4
    }

    #[inline(always)]
    fn degree(&self, cursor: &usize) -> usize {
        let slot = *cursor;
        if slot < self.top_last_level_start {
            3
        } else if slot < self.top_size {
            4
        } else if (slot - self.top_size) % HYBRID_SMALL_CLUSTER_SIZE < HYBRID_SMALL_FIRST_LEVEL {
            3
        } else {
            4
        }
    }

    #[inline(always)]
    fn root(&self) -> usize {
        0
    }

    #[inline(always)]
    fn locate(&self, slot: usize) -> usize {
        slot
    }

    #[inline(always)]
    fn slot(&self, cursor: &usize) -> usize {
        *cursor
    }

    #[inline(always)]
    fn children(&self, cursor: &usize) -> ChildSpan {
        let slot = *cursor;
        let first = if slot < self.top_last_level_start {
            3 * slot + 1
        } else if slot < self.top_size {
            self.small_cluster_start(slot - self.top_last_level_start)
        } else {
            let cluster = (slot - self.top_size) / HYBRID_SMALL_CLUSTER_SIZE;
            let relative = (slot - self.top_size) % HYBRID_SMALL_CLUSTER_SIZE;
            if relative < HYBRID_SMALL_FIRST_LEVEL {
                slot - relative + HYBRID_SMALL_FIRST_LEVEL + 3 * relative
            } else {
                let child = cluster
                    .saturating_mul(HYBRID_SMALL_FANOUT)
                    .saturating_add(self.top_last_level_size + relative - HYBRID_SMALL_FIRST_LEVEL);
                self.small_cluster_start(child)
            }
        };
        ChildSpan { first, stride: 1 }
    }

    #[inline(always)]
    fn descend(&self, cursor: &usize, k: usize) -> usize {
        self.children(cursor).nth(k)
    }

    #[inline(always)]
    fn predecessor(&self, cursor: &usize) -> Option<usize> {
        cursor.checked_sub(1)
    }

    fn parent_slot(&self, slot: usize) -> Option<usize> {
        if slot == 0 {
            return None;
        }
        if slot < self.top_size {
            return Some((slot - 1) / 3);
        }

        let cluster = (slot - self.top_size) / HYBRID_SMALL_CLUSTER_SIZE;
        let relative = (slot - self.top_size) % HYBRID_SMALL_CLUSTER_SIZE;
        if relative >= HYBRID_SMALL_FIRST_LEVEL {
            return Some(slot - relative + (relative - HYBRID_SMALL_FIRST_LEVEL) / 3);
        }
        if cluster < self.top_last_level_size {
            return Some(self.top_last_level_start + cluster);
        }
        let ordinal = cluster - self.top_last_level_size;
        Some(
            self.small_cluster_start(ordinal / HYBRID_SMALL_FANOUT)
                + HYBRID_SMALL_FIRST_LEVEL
                + ordinal % HYBRID_SMALL_FANOUT,
        )
    }

    fn last_internal(&self, count: usize) -> usize {
        if count < 2 {
            return 0;
        }
        let last = count - 1;
        let parent = self.parent_slot(last).unwrap_or(0);
        if last < self.top_size {
            return parent;
        }
        let relative = (last - self.top_size) % HYBRID_SMALL_CLUSTER_SIZE;
        let cluster_start = last - relative;
        if relative < HYBRID_SMALL_FIRST_LEVEL && cluster_start > 1 {
            parent.max(self.parent_slot(cluster_start - 1).unwrap_or(0))
        } else {
            parent
        }
    }
}
