//! Cluster arithmetic shared by the clustered and cached layouts.
//!
//! A cluster of `levels` levels is a complete `arity`-ary tree of that depth stored
//! contiguously. Everything here is `const fn` so geometries built from constants are
//! folded at compile time.

/// `base^exponent` for small operands.
pub const fn integer_power(base: usize, exponent: usize) -> usize {
    let mut result = 1;
    let mut i = 0;
    while i < exponent {
        result *= base;
        i += 1;
    }
    result
}

/// Number of nodes in a complete `arity`-ary tree with `levels` levels.
///
/// `cluster_size(0, k) == 0` and `cluster_size(l, k) == 1 + k * cluster_size(l - 1, k)`.
///
/// # Examples
///
/// ```
/// use heapcascade::geometry::cluster_size;
///
/// assert_eq!(cluster_size(0, 2), 0);
/// assert_eq!(cluster_size(3, 2), 7);
/// assert_eq!(cluster_size(2, 4), 5);
/// ```
pub const fn cluster_size(levels: usize, arity: usize) -> usize {
    let mut size = 0;
    let mut i = 0;
    while i < levels {
        size = 1 + arity * size;
        i += 1;
    }
    size
}

/// Number of nodes on level `level` (root is level 0) of an `arity`-ary tree.
pub const fn cluster_level_size(level: usize, arity: usize) -> usize {
    integer_power(arity, level)
}

/// Derived constants for one `(arity, cluster_levels)` pair.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct HeapGeometry {
    pub arity: usize,
    pub cluster_levels: usize,
    /// Nodes in one cluster.
    pub cluster_size: usize,
    /// Relative index of the first node on the cluster's last level.
    pub last_level_start: usize,
    /// Nodes on the cluster's last level.
    pub last_level_size: usize,
    /// Child clusters hanging below one cluster (`last_level_size * arity`).
    pub fanout: usize,
}

impl HeapGeometry {
    pub const fn new(arity: usize, cluster_levels: usize) -> Self {
        let last_level_start = if cluster_levels == 0 {
            0
        } else {
            cluster_size(cluster_levels - 1, arity)
        };
        let last_level_size = if cluster_levels == 0 {
            0
        } else {
            cluster_level_size(cluster_levels - 1, arity)
        };

        Self {
            arity,
            cluster_levels,
            cluster_size: cluster_size(cluster_levels, arity),
            last_level_start,
            last_level_size,
            fanout: last_level_size * arity,
        }
    }

    /// True when `relative` sits on the cluster's last level, i.e. its children live
    /// in child clusters.
    #[inline(always)]
    pub const fn is_last_level(&self, relative: usize) -> bool {
        relative >= self.last_level_start
    }
}
