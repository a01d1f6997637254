//! # feedstate Market
//!
//! Per-instrument market state.
//!
//! This crate provides:
//! - [`MarketState`], a dense slot array indexed by [`MarketField`]
//! - Exact change tracking through [`ChangeSet`]
//! - Copy-on-write [`FrozenMarket`] snapshots
//! - Trade, session bar, cumulative volume and last-price values
//! - The inbound [`MarketMessage`] type

pub mod cuvol;
pub mod error;
pub mod field;
pub mod message;
pub mod state;
pub mod values;

pub use cuvol::{CuvolEntry, CuvolMap};
pub use error::MarketError;
pub use field::{ChangeSet, FIELD_COUNT, FieldValue, MarketField};
pub use message::{MarketMessage, MarketUpdate};
pub use state::{FrozenMarket, MarketState, MarketView};
pub use values::{Bar, LastPrice, LastPriceSource, Trade, TradeSession};
