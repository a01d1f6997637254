//! Instrument registry and message ingestion.
//!
//! The registry owns one [`MarketState`] per instrument, each behind its own
//! mutex, so messages for different instruments never contend. Registration,
//! agent attachment and subscription aggregation are serialized through a
//! separate lifecycle lock that the ingest path never takes.
//!
//! Ingest holds a market's state lock while it reads the attached list and
//! runs callbacks. Lifecycle operations never take a state lock.

use crate::agent::{Agent, AgentFilter, AgentId, MarketCallback};
use crate::aggregator::SubscriptionAggregator;
use crate::builder::RegistryConfig;
use crate::error::Result;
use crate::sink::SubscriptionSink;
use crate::subscription::{CategorySet, Interest, MarketDataType, SubCommand};
use feedstate_core::{Instrument, InstrumentId, InstrumentLookup};
use feedstate_market::{
    ChangeSet, FieldValue, FrozenMarket, MarketField, MarketMessage, MarketState, MarketView,
};
use parking_lot::{Mutex, RwLock};
use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::{debug, error, info, warn};

/// Result of ingesting one message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IngestOutcome {
    /// Message applied; carries the fields it changed.
    Applied(ChangeSet),
    /// Message dropped because its instrument is invalid.
    Rejected,
}

struct MarketCell {
    instrument: Arc<Instrument>,
    state: Mutex<MarketState>,
    attached: RwLock<Vec<Agent>>,
}

impl MarketCell {
    /// Attaches or detaches `agent` according to its filter. The filter is
    /// read under the attached lock so concurrent edits settle on the last
    /// filter state.
    fn sync(&self, agent: &Agent, detach: bool) {
        let mut attached = self.attached.write();
        let wanted = !agent.is_terminated() && agent.has_match(&self.instrument);
        let position = attached.iter().position(|a| a.same(agent));
        match (wanted, position) {
            (true, None) => {
                attached.push(agent.clone());
                debug!("{} attached to {}", agent.id(), self.instrument);
            }
            (false, Some(index)) if detach => {
                attached.swap_remove(index);
                debug!("{} detached from {}", agent.id(), self.instrument);
            }
            _ => {}
        }
    }

    fn detach(&self, agent: &Agent) {
        let mut attached = self.attached.write();
        if let Some(index) = attached.iter().position(|a| a.same(agent)) {
            attached.swap_remove(index);
            debug!("{} detached from {}", agent.id(), self.instrument);
        }
    }
}

pub(crate) struct RegistryInner {
    config: RegistryConfig,
    markets: RwLock<HashMap<InstrumentId, Arc<MarketCell>>>,
    agents: RwLock<HashMap<AgentId, Agent>>,
    lifecycle: Mutex<SubscriptionAggregator>,
    sink: Box<dyn SubscriptionSink>,
    lookup: Option<Arc<dyn InstrumentLookup>>,
    next_agent: AtomicU64,
}

impl RegistryInner {
    pub(crate) fn lookup(&self, symbol: &str) -> Option<Arc<Instrument>> {
        self.lookup.as_ref().and_then(|lookup| lookup.lookup(symbol))
    }

    fn cells(&self) -> Vec<Arc<MarketCell>> {
        self.markets.read().values().cloned().collect()
    }

    fn cell(&self, id: InstrumentId) -> Option<Arc<MarketCell>> {
        self.markets.read().get(&id).cloned()
    }

    /// Inserts a market for `instrument` and attaches matching agents.
    /// Returns `None` if the instrument is invalid or already present.
    fn insert_market(&self, instrument: &Arc<Instrument>) -> Result<Option<Arc<MarketCell>>> {
        if let Err(err) = instrument.validate() {
            error!("cannot register {}: {}", instrument, err);
            return Ok(None);
        }
        let state = MarketState::with_book(
            Arc::clone(instrument),
            self.config.book_depth,
            self.config.liquidity,
        )?;
        let cell = {
            let mut markets = self.markets.write();
            if markets.contains_key(&instrument.id) {
                return Ok(None);
            }
            let cell = Arc::new(MarketCell {
                instrument: Arc::clone(instrument),
                state: Mutex::new(state),
                attached: RwLock::new(Vec::new()),
            });
            markets.insert(instrument.id, Arc::clone(&cell));
            cell
        };

        let agents = self.agents.read();
        for agent in agents.values() {
            cell.sync(agent, false);
        }
        Ok(Some(cell))
    }

    /// Re-syncs `agent` with every market. Detached agents are skipped until
    /// attached again.
    fn update_agent_locked(&self, agent: &Agent) {
        if !self.agents.read().contains_key(&agent.id()) {
            return;
        }
        for cell in self.cells() {
            cell.sync(agent, true);
        }
    }

    pub(crate) fn refresh_agent(&self, agent: &Agent, edit: impl FnOnce(&mut AgentFilter)) {
        let mut aggregator = self.lifecycle.lock();
        if agent.is_terminated() {
            return;
        }
        let before = agent.interests();
        agent.edit_filter(edit);
        self.update_agent_locked(agent);
        let after = agent.interests();

        let required = agent.data_type().required();
        let mut commands: Vec<SubCommand> = before
            .difference(&after)
            .filter_map(|interest| aggregator.unsubscribe(agent.id(), interest))
            .collect();
        commands.extend(
            after
                .iter()
                .filter_map(|interest| aggregator.subscribe(agent.id(), required, interest)),
        );
        self.emit(agent.id(), commands);
    }

    pub(crate) fn terminate_agent(&self, agent: &Agent) {
        let mut aggregator = self.lifecycle.lock();
        if !agent.mark_terminated() {
            return;
        }
        for cell in self.cells() {
            cell.detach(agent);
        }
        self.agents.write().remove(&agent.id());
        let commands = aggregator.unsubscribe_all(agent.id());
        debug!("{} terminated", agent.id());
        self.emit(agent.id(), commands);
    }

    fn emit(&self, agent: AgentId, commands: Vec<SubCommand>) {
        if commands.is_empty() {
            return;
        }
        for command in &commands {
            debug!("{}: {}", agent, command);
        }
        self.sink.send(commands);
    }
}

/// Registry of live markets and the agents observing them.
///
/// Cloning yields another handle to the same registry.
#[derive(Clone)]
pub struct MarketRegistry {
    inner: Arc<RegistryInner>,
}

impl MarketRegistry {
    pub(crate) fn from_parts(
        config: RegistryConfig,
        sink: Box<dyn SubscriptionSink>,
        lookup: Option<Arc<dyn InstrumentLookup>>,
    ) -> Self {
        info!(
            "market registry created (book depth {}, {:?} liquidity)",
            config.book_depth, config.liquidity
        );
        Self {
            inner: Arc::new(RegistryInner {
                config,
                markets: RwLock::new(HashMap::new()),
                agents: RwLock::new(HashMap::new()),
                lifecycle: Mutex::new(SubscriptionAggregator::new()),
                sink,
                lookup,
                next_agent: AtomicU64::new(1),
            }),
        }
    }

    /// Registry configuration.
    #[must_use]
    pub fn config(&self) -> &RegistryConfig {
        &self.inner.config
    }

    /// Creates a market for `instrument` and attaches every agent whose
    /// filter matches it.
    ///
    /// Returns false if the instrument is invalid or already registered.
    pub fn register(&self, instrument: Arc<Instrument>) -> bool {
        let _lifecycle = self.inner.lifecycle.lock();
        if self.inner.markets.read().contains_key(&instrument.id) {
            warn!("{} already registered", instrument);
            return false;
        }
        match self.inner.insert_market(&instrument) {
            Ok(Some(_)) => {
                debug!("registered {}", instrument);
                true
            }
            Ok(None) => false,
            Err(err) => {
                error!("cannot register {}: {}", instrument, err);
                false
            }
        }
    }

    /// Removes the market for `id`, detaching its agents.
    ///
    /// Returns false if no such market exists.
    pub fn unregister(&self, id: InstrumentId) -> bool {
        let _lifecycle = self.inner.lifecycle.lock();
        let Some(cell) = self.inner.markets.write().remove(&id) else {
            warn!("instrument {} is not registered", id);
            return false;
        };
        cell.attached.write().clear();
        debug!("unregistered {}", cell.instrument);
        true
    }

    /// Applies `message` to its market, registering the instrument first if
    /// needed, then notifies the active agents attached to it.
    ///
    /// Callbacks run while the market is locked, so each agent observes the
    /// messages of one instrument in ingest order. A callback must not ingest
    /// into, or read, the market it is being notified for.
    ///
    /// # Errors
    /// Returns an error if an update does not fit its target field. The
    /// market is left untouched and no agent is notified.
    pub fn ingest(&self, message: &MarketMessage) -> Result<IngestOutcome> {
        let cell = match self.inner.cell(message.instrument.id) {
            Some(cell) => cell,
            None => match self.inner.insert_market(&message.instrument)? {
                Some(cell) => {
                    debug!("registered {} on first message", cell.instrument);
                    cell
                }
                None => match self.inner.cell(message.instrument.id) {
                    Some(cell) => cell,
                    None => return Ok(IngestOutcome::Rejected),
                },
            },
        };

        let mut state = cell.state.lock();
        let changes = state.apply(message)?;

        if !changes.is_empty() {
            let active: Vec<Agent> = cell
                .attached
                .read()
                .iter()
                .filter(|agent| agent.is_active())
                .cloned()
                .collect();
            if !active.is_empty() {
                let frozen = state.freeze();
                for agent in &active {
                    agent.notify(&frozen, changes);
                }
            }
        }
        state.clear_changes();
        Ok(IngestOutcome::Applied(changes))
    }

    /// Creates an agent observing `data_type`. The agent starts active with
    /// an empty filter.
    pub fn new_agent<C>(&self, data_type: MarketDataType, callback: C) -> Agent
    where
        C: MarketCallback + 'static,
    {
        let id = AgentId(self.inner.next_agent.fetch_add(1, Ordering::Relaxed));
        let agent = Agent::new(
            id,
            data_type,
            Box::new(callback),
            Arc::downgrade(&self.inner),
        );
        self.inner.agents.write().insert(id, agent.clone());
        debug!("created {} for {:?}", id, data_type);
        agent
    }

    /// Attaches `agent` to every market its filter matches, including
    /// markets registered later. No effect on a terminated agent.
    pub fn attach_agent(&self, agent: &Agent) {
        let _lifecycle = self.inner.lifecycle.lock();
        if agent.is_terminated() {
            return;
        }
        self.inner.agents.write().insert(agent.id(), agent.clone());
        for cell in self.inner.cells() {
            cell.sync(agent, false);
        }
    }

    /// Re-evaluates `agent` against every market, attaching and detaching
    /// as its filter dictates.
    pub fn update_agent(&self, agent: &Agent) {
        let _lifecycle = self.inner.lifecycle.lock();
        self.inner.update_agent_locked(agent);
    }

    /// Detaches `agent` from every market, current and future, until it is
    /// attached again. Its subscriptions are kept.
    pub fn detach_agent(&self, agent: &Agent) {
        let _lifecycle = self.inner.lifecycle.lock();
        if self.inner.agents.write().remove(&agent.id()).is_some() {
            debug!("{} detached", agent.id());
        }
        for cell in self.inner.cells() {
            cell.detach(agent);
        }
    }

    /// Frozen snapshot of the market for `id`.
    #[must_use]
    pub fn snapshot(&self, id: InstrumentId) -> Option<FrozenMarket> {
        let cell = self.inner.cell(id)?;
        let state = cell.state.lock();
        Some(state.freeze())
    }

    /// Current value of `field` for `id`, or the field's NULL value if the
    /// instrument is not registered.
    #[must_use]
    pub fn take(&self, id: InstrumentId, field: MarketField) -> FieldValue {
        match self.inner.cell(id) {
            Some(cell) => cell.state.lock().get(field).clone(),
            None => field.null_value().clone(),
        }
    }

    /// Returns true if a market exists for `id`.
    #[must_use]
    pub fn is_registered(&self, id: InstrumentId) -> bool {
        self.inner.markets.read().contains_key(&id)
    }

    /// Number of markets.
    #[must_use]
    pub fn market_count(&self) -> usize {
        self.inner.markets.read().len()
    }

    /// Number of agents that are neither detached nor terminated.
    #[must_use]
    pub fn agent_count(&self) -> usize {
        self.inner.agents.read().len()
    }

    /// Agents attached to the market for `id`.
    #[must_use]
    pub fn attached_agents(&self, id: InstrumentId) -> Vec<AgentId> {
        self.inner
            .cell(id)
            .map(|cell| cell.attached.read().iter().map(Agent::id).collect())
            .unwrap_or_default()
    }

    /// Removes every market. Agents and subscriptions are kept.
    pub fn clear_all(&self) {
        let _lifecycle = self.inner.lifecycle.lock();
        let cells: Vec<Arc<MarketCell>> = self
            .inner
            .markets
            .write()
            .drain()
            .map(|(_, cell)| cell)
            .collect();
        for cell in &cells {
            cell.attached.write().clear();
        }
        info!("cleared {} markets", cells.len());
    }

    /// Categories currently subscribed upstream for `interest`.
    #[must_use]
    pub fn aggregate(&self, interest: &Interest) -> CategorySet {
        self.inner.lifecycle.lock().aggregate(interest)
    }
}

impl std::fmt::Debug for MarketRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MarketRegistry")
            .field("config", &self.inner.config)
            .field("markets", &self.market_count())
            .field("agents", &self.agent_count())
            .finish()
    }
}
