//! Error types for market state.

use crate::field::MarketField;
use feedstate_book::BookError;
use feedstate_core::InstrumentId;
use thiserror::Error;

/// Error type for market state operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MarketError {
    /// Value of the wrong kind for the field.
    #[error("cannot store a {kind} value in field {field}")]
    FieldMismatch {
        /// Target field.
        field: MarketField,
        /// Kind of the rejected value.
        kind: &'static str,
    },

    /// Message addressed to another instrument.
    #[error("message for instrument {actual} applied to market {expected}")]
    InstrumentMismatch {
        /// Instrument of the market.
        expected: InstrumentId,
        /// Instrument of the message.
        actual: InstrumentId,
    },

    /// Book could not be built.
    #[error("book error: {0}")]
    Book(#[from] BookError),
}

/// Result type alias for market state operations.
pub type Result<T> = std::result::Result<T, MarketError>;
