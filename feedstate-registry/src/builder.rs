//! Registry configuration and builder.

use crate::error::{ConfigError, Result};
use crate::registry::MarketRegistry;
use crate::sink::{CommandReceiver, NullSink, SubscriptionSink, command_channel};
use feedstate_book::{DEFAULT_CAPACITY, LiquidityType, MAX_CAPACITY};
use feedstate_core::InstrumentLookup;
use std::sync::Arc;

/// Settings shared by every market of a registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RegistryConfig {
    /// Ticks tracked per book side.
    pub book_depth: usize,
    /// Liquidity type the books accept.
    pub liquidity: LiquidityType,
    /// Capacity of the command channel created by
    /// [`RegistryBuilder::build_with_channel`].
    pub command_capacity: usize,
}

impl RegistryConfig {
    /// Checks the settings.
    ///
    /// # Errors
    /// Returns [`ConfigError`] if the book depth is outside `1..=64` or the
    /// command capacity is zero.
    pub fn validate(&self) -> std::result::Result<(), ConfigError> {
        if self.book_depth == 0 || self.book_depth > MAX_CAPACITY {
            return Err(ConfigError::BookDepth {
                depth: self.book_depth,
                max: MAX_CAPACITY,
            });
        }
        if self.command_capacity == 0 {
            return Err(ConfigError::CommandCapacity);
        }
        Ok(())
    }
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            book_depth: DEFAULT_CAPACITY,
            liquidity: LiquidityType::Default,
            command_capacity: 4096,
        }
    }
}

/// Builder for configuring and creating a [`MarketRegistry`].
pub struct RegistryBuilder {
    config: RegistryConfig,
    sink: Option<Box<dyn SubscriptionSink>>,
    lookup: Option<Arc<dyn InstrumentLookup>>,
}

impl RegistryBuilder {
    /// Creates a new builder with default settings.
    #[must_use]
    pub fn new() -> Self {
        Self {
            config: RegistryConfig::default(),
            sink: None,
            lookup: None,
        }
    }

    /// Sets the number of ticks tracked per book side.
    #[must_use]
    pub fn book_depth(mut self, depth: usize) -> Self {
        self.config.book_depth = depth;
        self
    }

    /// Sets the liquidity type the books accept.
    #[must_use]
    pub fn liquidity(mut self, liquidity: LiquidityType) -> Self {
        self.config.liquidity = liquidity;
        self
    }

    /// Sets the command channel capacity.
    #[must_use]
    pub fn command_capacity(mut self, capacity: usize) -> Self {
        self.config.command_capacity = capacity;
        self
    }

    /// Sets the destination of subscription commands.
    #[must_use]
    pub fn sink<S: SubscriptionSink + 'static>(mut self, sink: S) -> Self {
        self.sink = Some(Box::new(sink));
        self
    }

    /// Sets the instrument lookup used to resolve agent symbols.
    #[must_use]
    pub fn lookup<L: InstrumentLookup + 'static>(mut self, lookup: L) -> Self {
        self.lookup = Some(Arc::new(lookup));
        self
    }

    /// Builds the registry. Commands are discarded unless a sink was set.
    ///
    /// # Errors
    /// Returns an error if the configuration is invalid.
    pub fn build(self) -> Result<MarketRegistry> {
        self.config.validate()?;
        let sink = self.sink.unwrap_or_else(|| Box::new(NullSink));
        Ok(MarketRegistry::from_parts(self.config, sink, self.lookup))
    }

    /// Builds the registry with a command channel as its sink, replacing any
    /// sink set earlier.
    ///
    /// # Errors
    /// Returns an error if the configuration is invalid.
    pub fn build_with_channel(self) -> Result<(MarketRegistry, CommandReceiver)> {
        self.config.validate()?;
        let (sink, receiver) = command_channel(self.config.command_capacity);
        let registry = MarketRegistry::from_parts(self.config, Box::new(sink), self.lookup);
        Ok((registry, receiver))
    }
}

impl Default for RegistryBuilder {
    fn default() -> Self {
        Self::new()
    }
}
