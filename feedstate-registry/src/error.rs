//! Error types for the registry.

use feedstate_market::MarketError;
use thiserror::Error;

/// Invalid registry configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    /// Book depth outside `1..=max`.
    #[error("book depth {depth} out of range 1..={max}")]
    BookDepth {
        /// Requested depth.
        depth: usize,
        /// Largest supported depth.
        max: usize,
    },

    /// Command channel capacity of zero.
    #[error("command channel capacity must be positive")]
    CommandCapacity,
}

/// Registry error type.
#[derive(Debug, Error)]
pub enum RegistryError {
    /// Configuration rejected at build time.
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    /// A message could not be applied to its market.
    #[error("market error: {0}")]
    Market(#[from] MarketError),
}

/// Result type alias for registry operations.
pub type Result<T> = std::result::Result<T, RegistryError>;
