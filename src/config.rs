//! Runtime description of a heap sort engine.
//!
//! [`HeapSortConfig`] names one point of the design space (arity, numbering, layout,
//! sift-down strategy). [`HeapSorter`](crate::algo::HeapSorter) validates it once and
//! dispatches every sort to the matching monomorphized engine.

use std::fmt;
use std::str::FromStr;

use crate::addressing::{Base, DEFAULT_HYBRID_TOP_LEVELS};
use crate::error::{ConfigError, ConfigResult};
use crate::pipeline::DEFAULT_TOP_LEVELS;

/// Arities the dispatcher instantiates.
pub const SUPPORTED_ARITIES: [usize; 4] = [2, 3, 4, 8];

/// Largest cluster (in elements) a clustered layout may use.
pub const MAX_CLUSTER_SIZE: usize = 1 << 16;

/// Memory layout of the heap.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Layout {
    /// Implicit heap over the whole slice.
    Flat,
    /// Subtrees of `levels` levels stored contiguously. `levels == 0` is the flat layout.
    Clustered { levels: usize },
    /// Sibling groups of `levels` levels stored contiguously below a lone root.
    /// `levels == 0` is the flat layout.
    Rootless { levels: usize },
    /// Ternary top cluster of `levels` levels over small clusters of arities 3 and 4.
    /// Requires arity 3.
    Hybrid { levels: usize },
}

impl fmt::Display for Layout {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Layout::Flat => f.write_str("flat"),
            Layout::Clustered { levels } => write!(f, "clustered:{levels}"),
            Layout::Rootless { levels } => write!(f, "rootless:{levels}"),
            Layout::Hybrid { levels } => write!(f, "hybrid:{levels}"),
        }
    }
}

impl FromStr for Layout {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let unknown = || ConfigError::Unknown {
            kind: "layout",
            value: s.to_string(),
        };

        let (name, levels) = match s.split_once(':') {
            None => match s {
                "flat" => return Ok(Layout::Flat),
                "hybrid" => return Ok(Layout::Hybrid { levels: DEFAULT_HYBRID_TOP_LEVELS }),
                _ => return Err(unknown()),
            },
            Some((name, levels)) => (name, levels.parse().map_err(|_| unknown())?),
        };

        match name {
            "clustered" => Ok(Layout::Clustered { levels }),
            "rootless" => Ok(Layout::Rootless { levels }),
            "hybrid" => Ok(Layout::Hybrid { levels }),
            _ => Err(unknown()),
        }
    }
}

/// Sift-down strategy.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Strategy {
    /// Compare children, swap with the leader, repeat.
    Straight,
    /// Pull leaders up to a leaf, then walk the carried value back up.
    AheadSimple,
    /// Binary only: reuse cached child-vs-child outcomes across drain steps.
    Cached,
    /// Several swap-carrying sift-downs in flight, one level per extraction.
    Cascading,
    /// Binary only: top-region descent plus collision-aware in-flight sift-downs.
    Pipelined,
}

impl Strategy {
    pub const ALL: [Strategy; 5] = [
        Strategy::Straight,
        Strategy::AheadSimple,
        Strategy::Cached,
        Strategy::Cascading,
        Strategy::Pipelined,
    ];

    pub const fn name(self) -> &'static str {
        match self {
            Strategy::Straight => "straight",
            Strategy::AheadSimple => "ahead-simple",
            Strategy::Cached => "cached",
            Strategy::Cascading => "cascading",
            Strategy::Pipelined => "pipelined",
        }
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Strategy {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Strategy::ALL
            .into_iter()
            .find(|strategy| strategy.name() == s)
            .ok_or_else(|| ConfigError::Unknown {
                kind: "strategy",
                value: s.to_string(),
            })
    }
}

/// One heap sort engine configuration.
///
/// # Examples
///
/// ```
/// use heapcascade::config::{HeapSortConfig, Layout, Strategy};
///
/// let config = HeapSortConfig::new()
///     .arity(4)
///     .layout(Layout::Clustered { levels: 3 })
///     .strategy(Strategy::AheadSimple);
/// assert!(config.validate().is_ok());
///
/// // The cached strategy has its own binary layout.
/// let cached = HeapSortConfig::new().arity(4).strategy(Strategy::Cached);
/// assert!(cached.validate().is_err());
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct HeapSortConfig {
    pub arity: usize,
    /// Numbering of the flat layout. Only the straight, ahead-simple and cascading
    /// strategies over a flat heap use it; every other engine ignores it.
    pub base: Base,
    pub layout: Layout,
    pub strategy: Strategy,
    /// Depth of the pipelined engine's top region. Ignored by other strategies.
    pub top_levels: usize,
}

impl Default for HeapSortConfig {
    fn default() -> Self {
        Self {
            arity: 2,
            base: Base::One,
            layout: Layout::Flat,
            strategy: Strategy::Pipelined,
            top_levels: DEFAULT_TOP_LEVELS,
        }
    }
}

impl HeapSortConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn arity(mut self, arity: usize) -> Self {
        self.arity = arity;
        self
    }

    pub fn base(mut self, base: Base) -> Self {
        self.base = base;
        self
    }

    pub fn layout(mut self, layout: Layout) -> Self {
        self.layout = layout;
        self
    }

    pub fn strategy(mut self, strategy: Strategy) -> Self {
        self.strategy = strategy;
        self
    }

    pub fn top_levels(mut self, top_levels: usize) -> Self {
        self.top_levels = top_levels;
        self
    }

    /// Layout with the degenerate zero-level cluster layouts folded into `Flat`.
    pub fn effective_layout(&self) -> Layout {
        match self.layout {
            Layout::Clustered { levels: 0 } | Layout::Rootless { levels: 0 } => Layout::Flat,
            layout => layout,
        }
    }

    /// Whether the engine this configuration selects reads [`HeapSortConfig::base`].
    pub fn uses_base(&self) -> bool {
        self.effective_layout() == Layout::Flat
            && !matches!(self.strategy, Strategy::Cached | Strategy::Pipelined)
    }

    /// Checks that the dispatcher can build this engine.
    pub fn validate(&self) -> ConfigResult<()> {
        if !SUPPORTED_ARITIES.contains(&self.arity) {
            return Err(ConfigError::UnsupportedArity(self.arity));
        }

        match self.layout {
            Layout::Flat => {}
            Layout::Clustered { levels } if !cluster_fits(self.arity, levels) => {
                return Err(ConfigError::ClusterTooDeep {
                    arity: self.arity,
                    levels,
                });
            }
            // A rootless block holds one level more than its depth, minus the root.
            Layout::Rootless { levels } if !cluster_fits(self.arity, levels.saturating_add(1)) => {
                return Err(ConfigError::ClusterTooDeep {
                    arity: self.arity,
                    levels,
                });
            }
            Layout::Hybrid { .. } if self.arity != 3 => {
                return Err(ConfigError::IncompatibleLayout {
                    layout: self.layout,
                    reason: "the hybrid top cluster is ternary, set arity 3",
                });
            }
            Layout::Hybrid { levels: 0 } => {
                return Err(ConfigError::IncompatibleLayout {
                    layout: self.layout,
                    reason: "the top cluster needs at least one level",
                });
            }
            Layout::Hybrid { levels } if !cluster_fits(3, levels) => {
                return Err(ConfigError::ClusterTooDeep { arity: 3, levels });
            }
            Layout::Clustered { .. } | Layout::Rootless { .. } | Layout::Hybrid { .. } => {}
        }

        match self.strategy {
            Strategy::Cached | Strategy::Pipelined if self.arity != 2 => {
                Err(ConfigError::IncompatibleStrategy {
                    strategy: self.strategy,
                    reason: "only binary heaps are supported",
                })
            }
            Strategy::Cached | Strategy::Pipelined if self.effective_layout() != Layout::Flat => {
                Err(ConfigError::IncompatibleStrategy {
                    strategy: self.strategy,
                    reason: "the strategy uses its own layout",
                })
            }
            Strategy::Pipelined if !(3..=24).contains(&self.top_levels) => {
                Err(ConfigError::TopLevelsOutOfRange(self.top_levels))
            }
            _ => Ok(()),
        }
    }
}

impl fmt::Display for HeapSortConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "arity={}", self.arity)?;
        if self.uses_base() {
            write!(f, " base={}", self.base)?;
        }
        write!(f, " layout={} strategy={}", self.layout, self.strategy)?;
        if self.strategy == Strategy::Pipelined {
            write!(f, " top_levels={}", self.top_levels)?;
        }
        Ok(())
    }
}

fn cluster_fits(arity: usize, levels: usize) -> bool {
    let mut size: usize = 0;
    for _ in 0..levels {
        size = 1 + arity * size;
        if size > MAX_CLUSTER_SIZE {
            return false;
        }
    }
    true
}
