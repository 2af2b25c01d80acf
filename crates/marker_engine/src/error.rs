//! Error types for the intersection engine

use crate::config::{ConfigError, IndexKind};

/// Errors produced while building, querying or comparing spatial indices
#[derive(thiserror::Error, Debug)]
pub enum IntersectError {
    /// A polygon or face id could not be used; the item was skipped
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// The two indices handed to the pair comparator use different layouts
    #[error("Cannot intersect {left} index with {right} index")]
    UnsupportedIndexPairing {
        /// Kind of the index the comparison was called on
        left: IndexKind,
        /// Kind of the index passed as the other side
        right: IndexKind,
    },

    /// Configuration could not be loaded or failed validation
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
}

/// Result type for engine operations
pub type Result<T> = std::result::Result<T, IntersectError>;
