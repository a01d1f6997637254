//! Live market state and frozen snapshots.
//!
//! A market is a fixed array of slots, one per [`MarketField`]. Slots hold
//! `Arc`-shared values: freezing copies the array of pointers, and the live
//! side clones a value only when it writes to a slot a snapshot still shares.

use crate::cuvol::CuvolMap;
use crate::error::{MarketError, Result};
use crate::field::{ChangeSet, FIELD_COUNT, FieldValue, MarketField};
use crate::message::{MarketMessage, MarketUpdate};
use crate::values::{Bar, LastPrice, Trade, TradeSession};
use feedstate_book::{BookResult, DEFAULT_CAPACITY, LiquidityType, OrderBook, TopOfBook};
use feedstate_core::{Instrument, Price, Size, Timestamp};
use std::sync::Arc;
use tracing::debug;

type Slots = [Option<Arc<FieldValue>>; FIELD_COUNT];

static EMPTY_BOOK: OrderBook = OrderBook::NULL;
static EMPTY_CUVOL: CuvolMap = CuvolMap::NULL;

/// Read access shared by [`MarketState`] and [`FrozenMarket`].
pub trait MarketView {
    /// Instrument of the market.
    fn instrument(&self) -> &Arc<Instrument>;

    /// Value of `field`, or the field's NULL value if never set.
    fn get(&self, field: MarketField) -> &FieldValue;

    /// Fields changed since the change set was last cleared.
    fn changes(&self) -> ChangeSet;

    /// Time of the last applied message.
    fn updated(&self) -> Timestamp;

    /// Market time field.
    fn market_time(&self) -> Timestamp {
        match self.get(MarketField::MarketTime) {
            FieldValue::Time(time) => *time,
            _ => Timestamp::NULL,
        }
    }

    /// Last trade.
    fn trade(&self) -> &Trade {
        match self.get(MarketField::Trade) {
            FieldValue::Trade(trade) => trade,
            _ => &Trade::NULL,
        }
    }

    /// Depth book.
    fn book(&self) -> &OrderBook {
        match self.get(MarketField::Book) {
            FieldValue::Book(book) => book,
            _ => &EMPTY_BOOK,
        }
    }

    /// Best bid and ask.
    fn top_of_book(&self) -> TopOfBook {
        match self.get(MarketField::BookTop) {
            FieldValue::Top(top) => *top,
            _ => TopOfBook::NULL,
        }
    }

    /// Cumulative volume.
    fn cuvol(&self) -> &CuvolMap {
        match self.get(MarketField::Cuvol) {
            FieldValue::Cuvol(cuvol) => cuvol,
            _ => &EMPTY_CUVOL,
        }
    }

    /// Bar stored in `field`; NULL for non-bar fields.
    fn bar(&self, field: MarketField) -> &Bar {
        match self.get(field) {
            FieldValue::Bar(bar) => bar,
            _ => &Bar::NULL,
        }
    }

    /// Current regular session.
    fn session(&self) -> &Bar {
        self.bar(MarketField::BarCurrent)
    }

    /// Previous regular session.
    fn previous_session(&self) -> &Bar {
        self.bar(MarketField::BarPrevious)
    }

    /// Last price derived from the session bars, recomputed on every call.
    fn derived_last_price(&self) -> LastPrice {
        LastPrice::derive(self.session(), self.previous_session())
    }
}

/// Mutable state of one market.
#[derive(Debug, Clone)]
pub struct MarketState {
    instrument: Arc<Instrument>,
    book_depth: usize,
    liquidity: LiquidityType,
    slots: Slots,
    changes: ChangeSet,
    updated: Timestamp,
}

impl MarketState {
    /// Creates an empty market with a default-depth book.
    ///
    /// # Errors
    /// Returns an error if the instrument's tick size cannot back a book.
    pub fn new(instrument: Arc<Instrument>) -> Result<Self> {
        Self::with_book(instrument, DEFAULT_CAPACITY, LiquidityType::Default)
    }

    /// Creates an empty market whose book tracks `book_depth` ticks per side
    /// of `liquidity` entries.
    ///
    /// # Errors
    /// Returns an error if the tick size or depth cannot back a book.
    pub fn with_book(
        instrument: Arc<Instrument>,
        book_depth: usize,
        liquidity: LiquidityType,
    ) -> Result<Self> {
        OrderBook::new(instrument.tick_size, book_depth, liquidity)?;
        Ok(Self {
            instrument,
            book_depth,
            liquidity,
            slots: Default::default(),
            changes: ChangeSet::EMPTY,
            updated: Timestamp::NULL,
        })
    }

    /// Stores `value` in `field`. The field joins the change set only if the
    /// stored value actually differs. Returns whether it did.
    ///
    /// # Errors
    /// Returns [`MarketError::FieldMismatch`] if the value's kind does not
    /// belong in `field`.
    pub fn set(&mut self, field: MarketField, value: FieldValue) -> Result<bool> {
        if !value.fits(field) {
            return Err(MarketError::FieldMismatch {
                field,
                kind: value.kind(),
            });
        }
        let changed = self.store(field, value);
        if changed {
            self.changes.insert(field);
        }
        Ok(changed)
    }

    /// Writes `value` without touching the change set. Returns whether the
    /// slot changed.
    fn store(&mut self, field: MarketField, value: FieldValue) -> bool {
        let slot = &mut self.slots[field.index()];
        if slot.as_deref().unwrap_or(field.null_value()) == &value {
            return false;
        }
        *slot = Some(Arc::new(value));
        true
    }

    /// Applies every update of `message`, then its time. Returns the
    /// accumulated change set.
    ///
    /// A message applies whole or not at all. Its contribution to the change
    /// set is every field whose value differs from before the message, so
    /// edits that cancel out within one message report nothing.
    ///
    /// # Errors
    /// Returns an error if the message belongs to another instrument or an
    /// update targets a field of the wrong kind. The market is left as it
    /// was.
    pub fn apply(&mut self, message: &MarketMessage) -> Result<ChangeSet> {
        if message.instrument.id != self.instrument.id {
            return Err(MarketError::InstrumentMismatch {
                expected: self.instrument.id,
                actual: message.instrument.id,
            });
        }
        for update in &message.updates {
            check_update(update)?;
        }

        let before = self.slots.clone();
        if let Err(err) = self.apply_updates(message) {
            self.slots = before;
            return Err(err);
        }

        let book = MarketField::Book.index();
        if before[book].is_none() && self.book().is_empty() {
            self.slots[book] = None;
        }
        if !same_slot(&before[book], &self.slots[book]) {
            let top = self.book().top_of_book();
            self.store(MarketField::BookTop, FieldValue::Top(top));
        }

        for field in MarketField::ALL {
            let i = field.index();
            if !same_slot(&before[i], &self.slots[i])
                && slot_value(&before[i], field) != slot_value(&self.slots[i], field)
            {
                self.changes.insert(field);
            }
        }
        self.updated = message.time;
        Ok(self.changes)
    }

    fn apply_updates(&mut self, message: &MarketMessage) -> Result<()> {
        for update in &message.updates {
            self.apply_update(update, message.time)?;
        }
        self.store(MarketField::MarketTime, FieldValue::Time(message.time));
        Ok(())
    }

    fn apply_update(&mut self, update: &MarketUpdate, time: Timestamp) -> Result<()> {
        match update {
            MarketUpdate::Book(entry) => {
                let result = self.book_mut()?.apply(*entry);
                if result == BookResult::Error {
                    debug!("{}: rejected book entry {}", self.instrument, entry);
                }
            }
            MarketUpdate::BookSnapshot { bids, asks } => {
                self.book_mut()?.apply_snapshot(bids, asks);
            }
            MarketUpdate::BookClear => {
                if !self.book().is_empty() {
                    self.book_mut()?.clear();
                }
            }
            MarketUpdate::Trade(trade) => self.apply_trade(*trade)?,
            MarketUpdate::Cuvol { price, size } => self.add_cuvol(*price, *size)?,
            MarketUpdate::Bar { field, bar } => {
                self.store(*field, FieldValue::Bar(*bar));
            }
            MarketUpdate::Settle { price, settled } => {
                let mut bar = *self.session();
                bar.settle(*price, *settled, time);
                self.store(MarketField::BarCurrent, FieldValue::Bar(bar));
            }
            MarketUpdate::RollSession => self.roll_session(),
        }
        Ok(())
    }

    fn book_mut(&mut self) -> Result<&mut OrderBook> {
        let slot = &mut self.slots[MarketField::Book.index()];
        if slot.is_none() {
            let book = OrderBook::new(self.instrument.tick_size, self.book_depth, self.liquidity)?;
            *slot = Some(Arc::new(FieldValue::Book(book)));
        }
        match slot.as_mut().map(Arc::make_mut) {
            Some(FieldValue::Book(book)) => Ok(book),
            _ => Err(MarketError::FieldMismatch {
                field: MarketField::Book,
                kind: "book",
            }),
        }
    }

    fn cuvol_mut(&mut self) -> Result<&mut CuvolMap> {
        let slot = &mut self.slots[MarketField::Cuvol.index()];
        if slot.is_none() {
            let cuvol = CuvolMap::new(self.instrument.tick_size);
            *slot = Some(Arc::new(FieldValue::Cuvol(cuvol)));
        }
        match slot.as_mut().map(Arc::make_mut) {
            Some(FieldValue::Cuvol(cuvol)) => Ok(cuvol),
            _ => Err(MarketError::FieldMismatch {
                field: MarketField::Cuvol,
                kind: "cuvol",
            }),
        }
    }

    fn apply_trade(&mut self, trade: Trade) -> Result<()> {
        self.store(MarketField::Trade, FieldValue::Trade(trade));

        let field = match trade.session {
            TradeSession::Regular => MarketField::BarCurrent,
            TradeSession::Extended => MarketField::BarCurrentExt,
        };
        let mut bar = *self.bar(field);
        if bar.on_trade(trade.price, trade.size, trade.time) {
            self.store(field, FieldValue::Bar(bar));
        }
        self.add_cuvol(trade.price, trade.size)
    }

    fn add_cuvol(&mut self, price: Price, size: Size) -> Result<()> {
        if price.is_null() || size.is_empty() {
            return Ok(());
        }
        self.cuvol_mut()?.add(price, size);
        Ok(())
    }

    fn roll_session(&mut self) {
        for (current, previous) in [
            (MarketField::BarCurrent, MarketField::BarPrevious),
            (MarketField::BarCurrentExt, MarketField::BarPreviousExt),
        ] {
            let bar = *self.bar(current);
            self.store(previous, FieldValue::Bar(bar));
            self.store(current, FieldValue::Bar(Bar::NULL));
        }
        if !self.cuvol().is_empty() {
            let cuvol = CuvolMap::new(self.instrument.tick_size);
            self.store(MarketField::Cuvol, FieldValue::Cuvol(cuvol));
        }
    }

    /// Returns the change set and clears it.
    pub fn take_changes(&mut self) -> ChangeSet {
        std::mem::take(&mut self.changes)
    }

    /// Clears the change set.
    pub fn clear_changes(&mut self) {
        self.changes.clear();
    }

    /// Immutable snapshot of the current state, including the change set.
    #[must_use]
    pub fn freeze(&self) -> FrozenMarket {
        FrozenMarket {
            inner: Arc::new(Frozen {
                instrument: Arc::clone(&self.instrument),
                slots: self.slots.clone(),
                changes: self.changes,
                updated: self.updated,
            }),
        }
    }
}

impl MarketView for MarketState {
    fn instrument(&self) -> &Arc<Instrument> {
        &self.instrument
    }

    #[inline]
    fn get(&self, field: MarketField) -> &FieldValue {
        self.slots[field.index()]
            .as_deref()
            .unwrap_or(field.null_value())
    }

    fn changes(&self) -> ChangeSet {
        self.changes
    }

    fn updated(&self) -> Timestamp {
        self.updated
    }
}

/// Rejects updates that can never apply, before anything is written.
fn check_update(update: &MarketUpdate) -> Result<()> {
    match update {
        MarketUpdate::Bar { field, .. } if !field.is_bar() => Err(MarketError::FieldMismatch {
            field: *field,
            kind: "bar",
        }),
        _ => Ok(()),
    }
}

#[inline]
fn same_slot(lhs: &Option<Arc<FieldValue>>, rhs: &Option<Arc<FieldValue>>) -> bool {
    match (lhs, rhs) {
        (Some(a), Some(b)) => Arc::ptr_eq(a, b),
        (None, None) => true,
        _ => false,
    }
}

#[inline]
fn slot_value(slot: &Option<Arc<FieldValue>>, field: MarketField) -> &FieldValue {
    slot.as_deref().unwrap_or(field.null_value())
}

#[derive(Debug)]
struct Frozen {
    instrument: Arc<Instrument>,
    slots: Slots,
    changes: ChangeSet,
    updated: Timestamp,
}

/// Immutable, cheaply cloned snapshot of a market.
#[derive(Debug, Clone)]
pub struct FrozenMarket {
    inner: Arc<Frozen>,
}

impl FrozenMarket {
    /// Snapshot of a market that has never been updated.
    #[must_use]
    pub fn null(instrument: Arc<Instrument>) -> Self {
        Self {
            inner: Arc::new(Frozen {
                instrument,
                slots: Default::default(),
                changes: ChangeSet::EMPTY,
                updated: Timestamp::NULL,
            }),
        }
    }
}

impl MarketView for FrozenMarket {
    fn instrument(&self) -> &Arc<Instrument> {
        &self.inner.instrument
    }

    #[inline]
    fn get(&self, field: MarketField) -> &FieldValue {
        self.inner.slots[field.index()]
            .as_deref()
            .unwrap_or(field.null_value())
    }

    fn changes(&self) -> ChangeSet {
        self.inner.changes
    }

    fn updated(&self) -> Timestamp {
        self.inner.updated
    }
}
