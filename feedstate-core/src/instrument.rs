//! Instrument definitions and lookup.

use crate::error::InstrumentError;
use crate::types::Fraction;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// Unique instrument identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct InstrumentId(pub u64);

impl InstrumentId {
    /// Identity of the null instrument.
    pub const NULL: Self = Self(0);

    /// Returns true if this is the null identity.
    #[inline]
    #[must_use]
    pub const fn is_null(self) -> bool {
        self.0 == 0
    }
}

impl fmt::Display for InstrumentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Exchange code.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Exchange(pub String);

impl Exchange {
    /// Creates an exchange from its code.
    #[must_use]
    pub fn new(code: impl Into<String>) -> Self {
        Self(code.into())
    }

    /// Returns the exchange code.
    #[must_use]
    pub fn code(&self) -> &str {
        &self.0
    }

    /// Returns true if the code is empty.
    #[must_use]
    pub fn is_null(&self) -> bool {
        self.0.is_empty()
    }
}

/// Security type enumeration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SecurityType {
    /// Equity/Stock.
    Equity,
    /// Future contract.
    Future,
    /// Option contract.
    Option,
    /// Foreign exchange.
    Forex,
    /// Index.
    Index,
    /// Other/Unknown.
    Other,
}

/// Instrument definition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Instrument {
    /// Unique instrument identifier.
    pub id: InstrumentId,
    /// Symbol/ticker.
    pub symbol: String,
    /// Listing exchange.
    pub exchange: Exchange,
    /// Security type.
    pub security_type: SecurityType,
    /// Price tick size (minimum price increment) in fixed-point units.
    pub tick_size: i64,
    /// Contract multiplier.
    pub multiplier: i64,
    /// Currency code.
    pub currency: String,
    /// Price display fraction.
    pub display_fraction: Option<Fraction>,
}

impl Instrument {
    /// Checks that the instrument can back a market.
    ///
    /// # Errors
    /// Returns the first failed check.
    pub fn validate(&self) -> Result<(), InstrumentError> {
        if self.id.is_null() {
            return Err(InstrumentError::NullIdentity);
        }
        if self.symbol.is_empty() {
            return Err(InstrumentError::EmptySymbol { id: self.id.0 });
        }
        if self.tick_size <= 0 {
            return Err(InstrumentError::ZeroTickSize {
                symbol: self.symbol.clone(),
                tick_size: self.tick_size,
            });
        }
        match self.display_fraction {
            None => Err(InstrumentError::MissingDisplayFraction {
                symbol: self.symbol.clone(),
            }),
            Some(fraction) if !fraction.is_valid() => Err(InstrumentError::InvalidDisplayFraction {
                symbol: self.symbol.clone(),
                base: fraction.base,
                exponent: fraction.exponent,
            }),
            Some(_) => Ok(()),
        }
    }

    /// Returns true if [`Instrument::validate`] succeeds.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.validate().is_ok()
    }
}

impl fmt::Display for Instrument {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{} ({})", self.exchange.code(), self.symbol, self.id)
    }
}

/// Resolves symbols to instrument definitions.
///
/// The metadata service lives outside this workspace; this trait is its
/// boundary.
pub trait InstrumentLookup: Send + Sync {
    /// Looks up an instrument by symbol.
    fn lookup(&self, symbol: &str) -> Option<Arc<Instrument>>;
}

impl<T: InstrumentLookup + ?Sized> InstrumentLookup for Arc<T> {
    fn lookup(&self, symbol: &str) -> Option<Arc<Instrument>> {
        (**self).lookup(symbol)
    }
}

/// In-memory instrument catalog.
#[derive(Debug, Default)]
pub struct InstrumentCatalog {
    instruments: HashMap<InstrumentId, Arc<Instrument>>,
    symbol_index: HashMap<String, InstrumentId>,
}

impl InstrumentCatalog {
    /// Creates an empty catalog.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds an instrument, replacing any previous definition with the same id.
    pub fn add(&mut self, instrument: Instrument) -> Arc<Instrument> {
        let instrument = Arc::new(instrument);
        if let Some(old) = self.instruments.insert(instrument.id, Arc::clone(&instrument)) {
            self.symbol_index.remove(&old.symbol);
        }
        self.symbol_index
            .insert(instrument.symbol.clone(), instrument.id);
        instrument
    }

    /// Gets an instrument by ID.
    #[must_use]
    pub fn get(&self, id: InstrumentId) -> Option<&Arc<Instrument>> {
        self.instruments.get(&id)
    }

    /// Gets an instrument by symbol.
    #[must_use]
    pub fn get_by_symbol(&self, symbol: &str) -> Option<&Arc<Instrument>> {
        self.symbol_index
            .get(symbol)
            .and_then(|id| self.instruments.get(id))
    }

    /// Removes an instrument.
    pub fn remove(&mut self, id: InstrumentId) -> Option<Arc<Instrument>> {
        let inst = self.instruments.remove(&id)?;
        self.symbol_index.remove(&inst.symbol);
        Some(inst)
    }

    /// Returns all instrument IDs.
    #[must_use]
    pub fn ids(&self) -> Vec<InstrumentId> {
        self.instruments.keys().copied().collect()
    }

    /// Returns the number of instruments.
    #[must_use]
    pub fn len(&self) -> usize {
        self.instruments.len()
    }

    /// Returns true if there are no instruments.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.instruments.is_empty()
    }

    /// Iterates over all instruments.
    pub fn iter(&self) -> impl Iterator<Item = &Arc<Instrument>> {
        self.instruments.values()
    }
}

impl InstrumentLookup for InstrumentCatalog {
    fn lookup(&self, symbol: &str) -> Option<Arc<Instrument>> {
        self.get_by_symbol(symbol).cloned()
    }
}
