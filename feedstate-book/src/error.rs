//! Error types for order book construction.

use thiserror::Error;

/// Error type for order book operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BookError {
    /// Depth rank does not fit in a byte.
    #[error("invalid depth rank {place}: must be within 0..=255")]
    InvalidRank {
        /// Rank received from upstream.
        place: i32,
    },

    /// Ring capacity outside the supported range.
    #[error("invalid ring capacity {capacity}: must be within 1..={max}")]
    InvalidCapacity {
        /// Requested capacity.
        capacity: usize,
        /// Largest supported capacity.
        max: usize,
    },

    /// Tick size must be positive.
    #[error("invalid tick size {tick_size}")]
    InvalidTickSize {
        /// Requested tick size.
        tick_size: i64,
    },

    /// A ring can only hold bids or asks.
    #[error("ring side must be bid or ask")]
    InvalidSide,
}
