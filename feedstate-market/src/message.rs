//! Inbound market messages.

use crate::field::MarketField;
use crate::values::{Bar, Trade};
use feedstate_book::PriceLevelEntry;
use feedstate_core::{Instrument, Price, Size, Timestamp};
use std::sync::Arc;

/// One decoded change carried by a [`MarketMessage`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MarketUpdate {
    /// Incremental depth update.
    Book(PriceLevelEntry),
    /// Full depth replacement.
    BookSnapshot {
        /// Bid levels.
        bids: Vec<PriceLevelEntry>,
        /// Ask levels.
        asks: Vec<PriceLevelEntry>,
    },
    /// Remove every depth level.
    BookClear,
    /// Trade print.
    Trade(Trade),
    /// Volume added at a price without a trade print.
    Cuvol {
        /// Price.
        price: Price,
        /// Volume to add.
        size: Size,
    },
    /// Replace a session bar.
    Bar {
        /// Bar field to replace.
        field: MarketField,
        /// New bar.
        bar: Bar,
    },
    /// Settlement of the current session.
    Settle {
        /// Settlement price.
        price: Price,
        /// True once final.
        settled: bool,
    },
    /// Start a new session: current bars become previous, volume resets.
    RollSession,
}

/// Typed market message for one instrument.
#[derive(Debug, Clone)]
pub struct MarketMessage {
    /// Exchange time of the message.
    pub time: Timestamp,
    /// Instrument the message is about.
    pub instrument: Arc<Instrument>,
    /// Changes, applied in order.
    pub updates: Vec<MarketUpdate>,
}

impl MarketMessage {
    /// Creates a message with no updates.
    #[must_use]
    pub fn new(instrument: Arc<Instrument>, time: Timestamp) -> Self {
        Self {
            time,
            instrument,
            updates: Vec::new(),
        }
    }

    /// Appends an update.
    #[must_use]
    pub fn with(mut self, update: MarketUpdate) -> Self {
        self.updates.push(update);
        self
    }

    /// Appends an update in place.
    pub fn push(&mut self, update: MarketUpdate) {
        self.updates.push(update);
    }
}
