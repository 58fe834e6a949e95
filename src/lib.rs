//! # heapcascade
//!
//! `heapcascade` is a family of in-place heap sort engines for studying how heap layout,
//! branching factor and sift-down scheduling affect cache behaviour and instruction-level
//! parallelism on large arrays.
//!
//! Every engine sorts a caller-owned slice in place, builds a max-heap and drains it into
//! an ascending sequence. They differ only in *how* the heap is laid out and restored.
//!
//! ## Key Features
//!
//! - **Pluggable addressing**: flat heaps numbered from 0 or 1, clustered heaps that store
//!   fixed-depth subtrees contiguously and rootless clusters that keep sibling groups
//!   together, for arities 2, 3, 4 and 8. A hybrid layout mixes a ternary top cluster with
//!   small clusters of arities 3 and 4 (see [`addressing`]).
//! - **Sift-down strategies**: straight, ahead-simple (descend first, then walk the value back
//!   up) and a binary variant that caches child-vs-child comparisons across drain steps.
//! - **Cascading drains**: several sift-downs in flight at once, advanced one level per
//!   extraction so their cache misses overlap. The pipelined binary engine adds a hot top
//!   region and collision-aware backtracking below it (see [`pipeline`]).
//! - **Comparator contract**: any [`Comparator`], including closures and a counting
//!   decorator for measuring comparison counts.
//!
//! ## Usage
//!
//! ### Basic Usage
//!
//! ```rust
//! use heapcascade::heap_sort;
//!
//! let mut data = vec![5, 3, 8, 1, 9, 2];
//! heap_sort(&mut data);
//!
//! assert_eq!(data, vec![1, 2, 3, 5, 8, 9]);
//! ```
//!
//! ### Choosing an Engine
//!
//! A [`HeapSortConfig`] describes one engine. [`HeapSorter`] validates it once and then sorts
//! any number of slices.
//!
//! ```rust
//! use heapcascade::{HeapSortConfig, HeapSorter, Layout, Strategy};
//!
//! let config = HeapSortConfig::new()
//!     .arity(2)
//!     .layout(Layout::Clustered { levels: 4 })
//!     .strategy(Strategy::AheadSimple);
//! let sorter = HeapSorter::new(config).expect("valid configuration");
//!
//! let mut words = vec!["pear", "fig", "apple", "kiwi"];
//! sorter.sort(&mut words);
//! assert_eq!(words, vec!["apple", "fig", "kiwi", "pear"]);
//! ```
//!
//! ### Counting Comparisons
//!
//! ```rust
//! use heapcascade::{CachedEngine, Counting, HeapEngine, Natural};
//!
//! let mut data: Vec<u64> = (0..10_000).rev().collect();
//! let mut counter = Counting::new(Natural);
//! CachedEngine.sort(&mut data, &mut counter);
//!
//! assert!(data.windows(2).all(|w| w[0] <= w[1]));
//! println!("{} comparisons", counter.count());
//! ```
//!
//! ## Performance Characteristics
//!
//! - **Time**: O(N log N) comparisons for every engine, including on sorted, reversed and
//!   all-equal inputs.
//! - **Memory**: in place. The cached engine keeps one byte per 14 elements; the pipelined
//!   engine one byte per frontier node plus a fixed 64-entry queue.
//! - **Stability**: none. Equal elements come out in an unspecified order.
//!
//! Elements must be `Copy`: the ahead-simple and pipelined strategies hold the sifted value
//! outside the slice while they move others.

pub mod addressing;
pub mod algo;
pub mod cached;
pub mod cascade;
pub mod config;
pub mod core;
pub mod error;
pub mod geometry;
pub mod pipeline;
pub mod sift;

pub use addressing::{
    Addressing, Base, ClusteredAddressing, FlatAddressing, HybridAddressing, RootlessAddressing,
};
pub use algo::{HeapEngine, HeapSorter, SiftEngine, heap_sort, heap_sort_by, heap_sort_with};
pub use cached::CachedEngine;
pub use cascade::CascadeEngine;
pub use config::{HeapSortConfig, Layout, Strategy};
pub use crate::core::{ByOrdering, Comparator, ComparisonType, Counting, Natural, Reversed};
pub use error::ConfigError;
pub use pipeline::{PipelineStats, PipelinedEngine};

pub mod prelude {
    pub use crate::addressing::{
        Addressing, Base, ClusteredAddressing, FlatAddressing, HybridAddressing, RootlessAddressing,
    };
    pub use crate::algo::{HeapEngine, HeapSorter, SiftEngine, heap_sort, heap_sort_by, heap_sort_with};
    pub use crate::cached::CachedEngine;
    pub use crate::cascade::CascadeEngine;
    pub use crate::config::{HeapSortConfig, Layout, Strategy};
    pub use crate::core::{ByOrdering, Comparator, ComparisonType, Counting, Natural, Reversed};
    pub use crate::error::ConfigError;
    pub use crate::pipeline::{PipelineStats, PipelinedEngine};
    pub use crate::sift::{AheadSimple, Straight};
}
