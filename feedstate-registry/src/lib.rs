//! # feedstate Registry
//!
//! Instrument registry, agents and upstream subscription management.
//!
//! This crate provides:
//! - [`MarketRegistry`], which owns one market per instrument and dispatches
//!   frozen snapshots to attached agents
//! - [`Agent`] handles with include/exclude filters and a lifecycle
//! - [`SubscriptionAggregator`], which turns per-agent needs into minimal
//!   upstream [`SubCommand`] deltas
//! - [`SubscriptionSink`] implementations, including a bounded channel
//! - [`RegistryBuilder`] for configuration
//!
//! # Example
//!
//! ```
//! use feedstate_registry::{MarketDataType, RegistryBuilder};
//! use feedstate_core::Exchange;
//! use feedstate_market::{ChangeSet, FrozenMarket};
//!
//! let (registry, commands) = RegistryBuilder::new().build_with_channel().unwrap();
//! let agent = registry.new_agent(MarketDataType::Trade, |_: &FrozenMarket, _: ChangeSet| {});
//! agent.include_exchanges(&[Exchange::new("CME")]);
//!
//! assert_eq!(commands.try_recv().unwrap().encode(), "+CME=trade");
//! ```

pub mod agent;
pub mod aggregator;
pub mod builder;
pub mod error;
pub mod registry;
pub mod sink;
pub mod subscription;

pub use agent::{Agent, AgentFilter, AgentId, AgentState, MarketCallback};
pub use aggregator::SubscriptionAggregator;
pub use builder::{RegistryBuilder, RegistryConfig};
pub use error::{ConfigError, RegistryError, Result};
pub use registry::{IngestOutcome, MarketRegistry};
pub use sink::{ChannelSink, CommandReceiver, NullSink, SubscriptionSink, command_channel};
pub use subscription::{
    CategorySet, Interest, InterestKind, MarketDataType, SubAction, SubCommand, SubscriptionType,
    interest_for_symbol,
};
