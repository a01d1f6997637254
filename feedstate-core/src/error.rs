//! Error types for feedstate core types.

use thiserror::Error;

/// Reason an instrument cannot back a market.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InstrumentError {
    /// Instrument identity is the null id.
    #[error("instrument identity is null")]
    NullIdentity,

    /// Instrument has no symbol.
    #[error("instrument {id} has an empty symbol")]
    EmptySymbol {
        /// Instrument identifier.
        id: u64,
    },

    /// Tick size is zero or negative.
    #[error("instrument {symbol} has invalid tick size {tick_size}")]
    ZeroTickSize {
        /// Instrument symbol.
        symbol: String,
        /// Offending tick size.
        tick_size: i64,
    },

    /// No display fraction was provided.
    #[error("instrument {symbol} has no display fraction")]
    MissingDisplayFraction {
        /// Instrument symbol.
        symbol: String,
    },

    /// Display fraction cannot be rendered.
    #[error("instrument {symbol} has invalid display fraction {base}^{exponent}")]
    InvalidDisplayFraction {
        /// Instrument symbol.
        symbol: String,
        /// Fraction base.
        base: u32,
        /// Fraction exponent.
        exponent: u32,
    },
}
