//! Configuration errors.
//!
//! Sorting itself cannot fail; only building an engine from a [`HeapSortConfig`]
//! can.
//!
//! [`HeapSortConfig`]: crate::config::HeapSortConfig

use thiserror::Error;

use crate::config::{Layout, Strategy};

/// Reasons a [`HeapSortConfig`](crate::config::HeapSortConfig) is rejected.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("unsupported heap arity {0}, expected one of 2, 3, 4, 8")]
    UnsupportedArity(usize),

    #[error("cluster of {levels} levels at arity {arity} exceeds the maximum cluster size")]
    ClusterTooDeep { arity: usize, levels: usize },

    #[error("pipeline top region of {0} levels is outside 3..=24")]
    TopLevelsOutOfRange(usize),

    #[error("strategy `{strategy}` cannot be used here: {reason}")]
    IncompatibleStrategy {
        strategy: Strategy,
        reason: &'static str,
    },

    #[error("layout `{layout}` cannot be used here: {reason}")]
    IncompatibleLayout {
        layout: Layout,
        reason: &'static str,
    },

    #[error("unknown {kind} `{value}`")]
    Unknown { kind: &'static str, value: String },
}

/// Result type for configuration operations.
pub type ConfigResult<T> = Result<T, ConfigError>;
