//! Agents: filtered consumers of market updates.
//!
//! An [`Agent`] owns a filter deciding which markets it is attached to and a
//! callback fired with a frozen snapshot every time an attached market
//! changes. Filter edits are pushed through the owning registry, which
//! re-attaches the agent and emits the resulting subscription deltas.

use crate::registry::RegistryInner;
use crate::subscription::{Interest, MarketDataType};
use feedstate_core::{Exchange, Instrument, InstrumentId};
use feedstate_market::{ChangeSet, FrozenMarket};
use parking_lot::Mutex;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::{Arc, Weak};
use tracing::warn;

/// Agent identifier, unique within a registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct AgentId(pub u64);

impl fmt::Display for AgentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "agent-{}", self.0)
    }
}

/// Lifecycle of an agent.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AgentState {
    /// Attached and receiving callbacks.
    Active = 0,
    /// Attached, subscribed, but silent.
    Inactive = 1,
    /// Detached for good.
    Terminated = 2,
}

impl AgentState {
    const fn from_u8(value: u8) -> Self {
        match value {
            0 => Self::Active,
            1 => Self::Inactive,
            _ => Self::Terminated,
        }
    }
}

/// Receives market updates for an agent.
pub trait MarketCallback: Send + Sync {
    /// Called with a snapshot of the market and the fields that changed.
    fn on_market(&self, market: &FrozenMarket, changes: ChangeSet);
}

impl<F> MarketCallback for F
where
    F: Fn(&FrozenMarket, ChangeSet) + Send + Sync,
{
    fn on_market(&self, market: &FrozenMarket, changes: ChangeSet) {
        self(market, changes);
    }
}

/// Inclusion and exclusion rules of an agent.
#[derive(Debug, Clone, Default)]
pub struct AgentFilter {
    include_instruments: BTreeMap<InstrumentId, Arc<Instrument>>,
    exclude_instruments: BTreeSet<InstrumentId>,
    include_exchanges: BTreeSet<Exchange>,
    exclude_exchanges: BTreeSet<Exchange>,
}

impl AgentFilter {
    /// Returns true if a market for `instrument` should be attached.
    ///
    /// Instrument rules take precedence over exchange rules; anything not
    /// explicitly included is rejected.
    #[must_use]
    pub fn has_match(&self, instrument: &Instrument) -> bool {
        if self.include_instruments.contains_key(&instrument.id) {
            return true;
        }
        if self.exclude_instruments.contains(&instrument.id) {
            return false;
        }
        self.include_exchanges.contains(&instrument.exchange)
    }

    /// Upstream interests the filter needs.
    #[must_use]
    pub fn interests(&self) -> BTreeSet<Interest> {
        self.include_exchanges
            .iter()
            .map(|exchange| Interest::exchange(exchange.code()))
            .chain(
                self.include_instruments
                    .values()
                    .map(|instrument| Interest::instrument(&instrument.symbol)),
            )
            .collect()
    }

    /// Includes instruments, lifting any exclusion.
    pub fn include_instruments(&mut self, instruments: &[Arc<Instrument>]) {
        for instrument in instruments {
            self.exclude_instruments.remove(&instrument.id);
            self.include_instruments
                .insert(instrument.id, Arc::clone(instrument));
        }
    }

    /// Excludes instruments, dropping any inclusion.
    pub fn exclude_instruments(&mut self, ids: &[InstrumentId]) {
        for id in ids {
            self.include_instruments.remove(id);
            self.exclude_instruments.insert(*id);
        }
    }

    /// Includes exchanges, lifting any exclusion.
    pub fn include_exchanges(&mut self, exchanges: &[Exchange]) {
        for exchange in exchanges {
            self.exclude_exchanges.remove(exchange);
            self.include_exchanges.insert(exchange.clone());
        }
    }

    /// Excludes exchanges, dropping any inclusion.
    pub fn exclude_exchanges(&mut self, exchanges: &[Exchange]) {
        for exchange in exchanges {
            self.include_exchanges.remove(exchange);
            self.exclude_exchanges.insert(exchange.clone());
        }
    }

    /// Included instruments.
    pub fn included_instruments(&self) -> impl Iterator<Item = &Arc<Instrument>> {
        self.include_instruments.values()
    }

    /// Included exchanges.
    pub fn included_exchanges(&self) -> impl Iterator<Item = &Exchange> {
        self.include_exchanges.iter()
    }

    /// Returns true if no rule is set.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.include_instruments.is_empty()
            && self.exclude_instruments.is_empty()
            && self.include_exchanges.is_empty()
            && self.exclude_exchanges.is_empty()
    }

    /// Removes every rule.
    pub fn clear(&mut self) {
        self.include_instruments.clear();
        self.exclude_instruments.clear();
        self.include_exchanges.clear();
        self.exclude_exchanges.clear();
    }
}

pub(crate) struct AgentShared {
    id: AgentId,
    data_type: MarketDataType,
    callback: Box<dyn MarketCallback>,
    state: AtomicU8,
    filter: Mutex<AgentFilter>,
    registry: Weak<RegistryInner>,
}

/// Handle to an agent. Clones share the same agent.
#[derive(Clone)]
pub struct Agent {
    shared: Arc<AgentShared>,
}

impl Agent {
    pub(crate) fn new(
        id: AgentId,
        data_type: MarketDataType,
        callback: Box<dyn MarketCallback>,
        registry: Weak<RegistryInner>,
    ) -> Self {
        Self {
            shared: Arc::new(AgentShared {
                id,
                data_type,
                callback,
                state: AtomicU8::new(AgentState::Active as u8),
                filter: Mutex::new(AgentFilter::default()),
                registry,
            }),
        }
    }

    /// Agent identifier.
    #[inline]
    #[must_use]
    pub fn id(&self) -> AgentId {
        self.shared.id
    }

    /// Data the agent observes.
    #[must_use]
    pub fn data_type(&self) -> MarketDataType {
        self.shared.data_type
    }

    /// Current lifecycle state.
    #[inline]
    #[must_use]
    pub fn state(&self) -> AgentState {
        AgentState::from_u8(self.shared.state.load(Ordering::Acquire))
    }

    /// Returns true if callbacks fire.
    #[inline]
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.state() == AgentState::Active
    }

    /// Returns true once terminated.
    #[must_use]
    pub fn is_terminated(&self) -> bool {
        self.state() == AgentState::Terminated
    }

    /// Returns true if the agent's filter accepts `instrument`.
    #[must_use]
    pub fn has_match(&self, instrument: &Instrument) -> bool {
        self.shared.filter.lock().has_match(instrument)
    }

    /// Upstream interests the agent needs.
    #[must_use]
    pub fn interests(&self) -> BTreeSet<Interest> {
        self.shared.filter.lock().interests()
    }

    /// Copy of the agent's filter.
    #[must_use]
    pub fn filter(&self) -> AgentFilter {
        self.shared.filter.lock().clone()
    }

    /// Resumes callbacks. No effect once terminated.
    pub fn activate(&self) {
        self.transition(AgentState::Active);
    }

    /// Stops callbacks while keeping attachments and subscriptions. No
    /// effect once terminated.
    pub fn deactivate(&self) {
        self.transition(AgentState::Inactive);
    }

    fn transition(&self, to: AgentState) {
        let _ = self
            .shared
            .state
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |current| {
                (current != AgentState::Terminated as u8).then_some(to as u8)
            });
    }

    /// Marks the agent terminated. Returns false if it already was.
    pub(crate) fn mark_terminated(&self) -> bool {
        self.shared
            .state
            .swap(AgentState::Terminated as u8, Ordering::AcqRel)
            != AgentState::Terminated as u8
    }

    /// Detaches the agent from every market and withdraws its
    /// subscriptions. Permanent.
    pub fn terminate(&self) {
        match self.shared.registry.upgrade() {
            Some(registry) => registry.terminate_agent(self),
            None => {
                self.mark_terminated();
            }
        }
    }

    /// Includes instruments by symbol, resolved through the registry's
    /// instrument lookup. Unresolved symbols are logged and skipped.
    pub fn include_symbols(&self, symbols: &[&str]) {
        let instruments = self.resolve(symbols);
        self.include_instruments(&instruments);
    }

    /// Includes instruments.
    pub fn include_instruments(&self, instruments: &[Arc<Instrument>]) {
        self.edit(|filter| filter.include_instruments(instruments));
    }

    /// Includes every instrument of the given exchanges.
    pub fn include_exchanges(&self, exchanges: &[Exchange]) {
        self.edit(|filter| filter.include_exchanges(exchanges));
    }

    /// Excludes instruments by symbol.
    pub fn exclude_symbols(&self, symbols: &[&str]) {
        let ids: Vec<InstrumentId> = self
            .resolve(symbols)
            .iter()
            .map(|instrument| instrument.id)
            .collect();
        self.exclude_instruments(&ids);
    }

    /// Excludes instruments.
    pub fn exclude_instruments(&self, ids: &[InstrumentId]) {
        self.edit(|filter| filter.exclude_instruments(ids));
    }

    /// Excludes exchanges.
    pub fn exclude_exchanges(&self, exchanges: &[Exchange]) {
        self.edit(|filter| filter.exclude_exchanges(exchanges));
    }

    /// Removes every rule, detaching the agent from all markets.
    pub fn clear(&self) {
        self.edit(AgentFilter::clear);
    }

    fn edit(&self, edit: impl FnOnce(&mut AgentFilter)) {
        match self.shared.registry.upgrade() {
            Some(registry) => registry.refresh_agent(self, edit),
            None => {
                if !self.is_terminated() {
                    edit(&mut self.shared.filter.lock());
                }
            }
        }
    }

    pub(crate) fn edit_filter(&self, edit: impl FnOnce(&mut AgentFilter)) {
        edit(&mut self.shared.filter.lock());
    }

    fn resolve(&self, symbols: &[&str]) -> Vec<Arc<Instrument>> {
        let registry = self.shared.registry.upgrade();
        symbols
            .iter()
            .filter_map(|symbol| {
                let found = registry.as_ref().and_then(|r| r.lookup(symbol));
                if found.is_none() {
                    warn!("{}: cannot resolve symbol {}", self.id(), symbol);
                }
                found
            })
            .collect()
    }

    #[inline]
    pub(crate) fn notify(&self, market: &FrozenMarket, changes: ChangeSet) {
        self.shared.callback.on_market(market, changes);
    }

    #[inline]
    pub(crate) fn same(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.shared, &other.shared)
    }
}

impl fmt::Debug for Agent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Agent")
            .field("id", &self.id())
            .field("data_type", &self.data_type())
            .field("state", &self.state())
            .finish_non_exhaustive()
    }
}
