//! # feedstate
//!
//! In-memory market state for streaming market data.
//!
//! feedstate keeps one live market per instrument, applies typed updates to
//! it, and hands frozen snapshots to the agents interested in that
//! instrument. Agent interest is aggregated into minimal upstream
//! subscribe/unsubscribe commands.
//!
//! ## Features
//!
//! - **Ring-buffer depth books** - Fixed-capacity price windows with bit-scan
//!   top-of-book
//! - **Exact change tracking** - Every update reports precisely the fields it
//!   changed
//! - **Copy-on-write snapshots** - Freezing a market shares its values until
//!   the live side writes again
//! - **Per-instrument locking** - Messages for different instruments never
//!   contend
//! - **Subscription aggregation** - Agent needs are unioned per interest and
//!   only deltas go upstream
//!
//! ## Quick Start
//!
//! ```
//! use feedstate::prelude::*;
//! use std::sync::Arc;
//!
//! let (registry, commands) = RegistryBuilder::new().build_with_channel().unwrap();
//! let agent = registry.new_agent(
//!     MarketDataType::Trade,
//!     |market: &FrozenMarket, changes: ChangeSet| {
//!         println!("{} {} {:?}", market.instrument(), changes, market.trade().price);
//!     },
//! );
//! agent.include_exchanges(&[Exchange::new("CME")]);
//! assert_eq!(commands.try_recv().unwrap().encode(), "+CME=trade");
//!
//! let es = Arc::new(Instrument {
//!     id: InstrumentId(1),
//!     symbol: "ESZ3".into(),
//!     exchange: Exchange::new("CME"),
//!     security_type: SecurityType::Future,
//!     tick_size: 25,
//!     multiplier: 50,
//!     currency: "USD".into(),
//!     display_fraction: Some(Fraction::decimal(2)),
//! });
//! let time = Timestamp::from_nanos(1);
//! let message = MarketMessage::new(Arc::clone(&es), time)
//!     .with(MarketUpdate::Trade(Trade::new(Price::new(450_025), Size::new(2), time)));
//! assert!(matches!(registry.ingest(&message), Ok(IngestOutcome::Applied(_))));
//! ```
//!
//! ## Crate Organization
//!
//! - [`core`] - Prices, sizes, timestamps and instruments
//! - [`book`] - Ring-buffer depth books
//! - [`market`] - Market state, change sets and frozen snapshots
//! - [`registry`] - Registry, agents and subscription aggregation

pub mod prelude;

/// Value primitives and instrument definitions.
pub mod core {
    pub use feedstate_core::*;
}

/// Ring-buffer depth books.
pub mod book {
    pub use feedstate_book::*;
}

/// Per-instrument market state.
pub mod market {
    pub use feedstate_market::*;
}

/// Registry, agents and subscriptions.
pub mod registry {
    pub use feedstate_registry::*;
}

// Re-export commonly used items at the crate root
pub use feedstate_book::{OrderBook, PriceLevelEntry, RingBook, Side};
pub use feedstate_core::{Instrument, InstrumentId, Price, Size, Timestamp};
pub use feedstate_market::{
    ChangeSet, FrozenMarket, MarketField, MarketMessage, MarketState, MarketView,
};
pub use feedstate_registry::{Agent, MarketRegistry, RegistryBuilder, SubCommand};
