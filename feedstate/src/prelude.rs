//! Prelude module for convenient imports.
//!
//! ```
//! use feedstate::prelude::*;
//! ```

// Core types
pub use feedstate_core::{
    Exchange, Fraction, Instrument, InstrumentCatalog, InstrumentId, InstrumentLookup, Price,
    SecurityType, Size, Timestamp,
};

// Book types
pub use feedstate_book::{
    BookAction, BookResult, LiquidityType, OrderBook, PriceLevelEntry, RingBook, Side, TopOfBook,
};

// Market types
pub use feedstate_market::{
    Bar, ChangeSet, CuvolMap, FieldValue, FrozenMarket, LastPrice, MarketField, MarketMessage,
    MarketState, MarketUpdate, MarketView, Trade, TradeSession,
};

// Registry types
pub use feedstate_registry::{
    Agent, AgentId, AgentState, CategorySet, CommandReceiver, IngestOutcome, Interest,
    MarketCallback, MarketDataType, MarketRegistry, RegistryBuilder, RegistryError, SubCommand,
    SubscriptionSink, SubscriptionType,
};
