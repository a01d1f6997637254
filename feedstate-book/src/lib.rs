//! # feedstate Book
//!
//! Depth book for market state.
//!
//! This crate provides:
//! - Packed [`PriceLevelEntry`] records with a NULL entry
//! - [`RingBook`], a fixed-capacity ring per side with bit-scan ranking
//! - [`OrderBook`], a bid/ask pair for one liquidity class

pub mod book;
pub mod entry;
pub mod error;
pub mod ring;

pub use book::{OrderBook, TopOfBook};
pub use entry::{BookAction, LiquidityType, PLACE_NONE, PriceLevelEntry, Side};
pub use error::BookError;
pub use ring::{
    BookResult, CLUE_NONE, DEFAULT_CAPACITY, Levels, MAX_CAPACITY, PriceSlot, RingBook,
};
