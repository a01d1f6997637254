//! Order book management.

use crate::entry::{LiquidityType, PriceLevelEntry, Side};
use crate::error::BookError;
use crate::ring::{BookResult, DEFAULT_CAPACITY, RingBook};
use feedstate_core::{Price, Size};

/// Best bid and best ask of a book.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TopOfBook {
    /// Best bid, rank 1.
    pub bid: PriceLevelEntry,
    /// Best ask, rank 1.
    pub ask: PriceLevelEntry,
}

impl TopOfBook {
    /// Top of an empty book.
    pub const NULL: Self = Self {
        bid: PriceLevelEntry::NULL,
        ask: PriceLevelEntry::NULL,
    };

    /// Returns true if neither side has a level.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.bid.is_null() && self.ask.is_null()
    }
}

impl Default for TopOfBook {
    fn default() -> Self {
        Self::NULL
    }
}

/// Depth book for one instrument and one liquidity class.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderBook {
    liquidity: LiquidityType,
    bids: RingBook,
    asks: RingBook,
}

impl OrderBook {
    /// Stand-in book with no levels that rejects every update.
    pub const NULL: Self = Self {
        liquidity: LiquidityType::None,
        bids: RingBook::with_parts(Side::Bid, 0, DEFAULT_CAPACITY),
        asks: RingBook::with_parts(Side::Ask, 0, DEFAULT_CAPACITY),
    };

    /// Creates an empty book.
    ///
    /// # Errors
    /// Returns an error if `tick_size` is not positive or `capacity` is
    /// outside `1..=64`.
    pub fn new(
        tick_size: i64,
        capacity: usize,
        liquidity: LiquidityType,
    ) -> Result<Self, BookError> {
        Ok(Self {
            liquidity,
            bids: RingBook::new(Side::Bid, tick_size, capacity)?,
            asks: RingBook::new(Side::Ask, tick_size, capacity)?,
        })
    }

    /// Liquidity class this book accepts.
    #[inline]
    #[must_use]
    pub const fn liquidity(&self) -> LiquidityType {
        self.liquidity
    }

    /// Bid side.
    #[inline]
    #[must_use]
    pub const fn bids(&self) -> &RingBook {
        &self.bids
    }

    /// Ask side.
    #[inline]
    #[must_use]
    pub const fn asks(&self) -> &RingBook {
        &self.asks
    }

    /// Ring for `side`, or `None` for gap entries.
    #[inline]
    #[must_use]
    pub const fn side(&self, side: Side) -> Option<&RingBook> {
        match side {
            Side::Bid => Some(&self.bids),
            Side::Ask => Some(&self.asks),
            Side::Gap => None,
        }
    }

    /// Returns true if both sides are empty.
    #[inline]
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.bids.is_empty() && self.asks.is_empty()
    }

    /// Applies an incremental update.
    ///
    /// Entries of another liquidity class are discarded. Entries without a
    /// liquidity class are taken as this book's.
    pub fn apply(&mut self, entry: PriceLevelEntry) -> BookResult {
        let entry = match entry.liquidity() {
            LiquidityType::None => entry.with_liquidity(self.liquidity),
            liquidity if liquidity == self.liquidity => entry,
            _ => return BookResult::Discard,
        };
        match entry.side() {
            Side::Bid => self.bids.apply(entry),
            Side::Ask => self.asks.apply(entry),
            Side::Gap => BookResult::Error,
        }
    }

    /// Applies a snapshot (replaces entire book).
    ///
    /// Returns true if the book differs from its previous state.
    pub fn apply_snapshot(&mut self, bids: &[PriceLevelEntry], asks: &[PriceLevelEntry]) -> bool {
        let previous = (self.bids.clone(), self.asks.clone());

        self.bids.clear();
        self.asks.clear();
        for entry in bids.iter().chain(asks) {
            self.apply(*entry);
        }

        previous.0 != self.bids || previous.1 != self.asks
    }

    /// Clears the entire book.
    pub fn clear(&mut self) {
        self.bids.clear();
        self.asks.clear();
    }

    /// Returns the best bid and ask.
    #[inline]
    #[must_use]
    pub fn top_of_book(&self) -> TopOfBook {
        TopOfBook {
            bid: self.bids.top(),
            ask: self.asks.top(),
        }
    }

    /// Returns the best bid price.
    #[inline]
    #[must_use]
    pub fn best_bid(&self) -> Option<Price> {
        Self::live_price(self.bids.top())
    }

    /// Returns the best ask price.
    #[inline]
    #[must_use]
    pub fn best_ask(&self) -> Option<Price> {
        Self::live_price(self.asks.top())
    }

    /// Best level of `side` with rank 1, or NULL.
    #[inline]
    #[must_use]
    pub fn top(&self, side: Side) -> PriceLevelEntry {
        self.side(side).map_or(PriceLevelEntry::NULL, RingBook::top)
    }

    /// Best price of `side`.
    #[inline]
    #[must_use]
    pub fn best_price(&self, side: Side) -> Option<Price> {
        Self::live_price(self.top(side))
    }

    /// All levels of `side`, best first.
    #[must_use]
    pub fn depth(&self, side: Side) -> Vec<PriceLevelEntry> {
        self.side(side).map_or_else(Vec::new, RingBook::depth)
    }

    /// Returns the size at the best level of `side`.
    #[must_use]
    pub fn best_size(&self, side: Side) -> Size {
        self.side(side).map_or(Size::NULL, |ring| ring.top().size())
    }

    /// Returns the level of rank `place` on `side`, or NULL.
    #[must_use]
    pub fn entry_at(&self, side: Side, place: u8) -> PriceLevelEntry {
        self.side(side)
            .map_or(PriceLevelEntry::NULL, |ring| ring.entry_at(place))
    }

    /// Returns the bid-ask spread in raw price units.
    #[inline]
    #[must_use]
    pub fn spread(&self) -> Option<i64> {
        match (self.best_bid(), self.best_ask()) {
            (Some(bid), Some(ask)) => Some(ask.raw() - bid.raw()),
            _ => None,
        }
    }

    /// Returns the mid price.
    #[inline]
    #[must_use]
    pub fn mid_price(&self) -> Option<Price> {
        match (self.best_bid(), self.best_ask()) {
            (Some(bid), Some(ask)) => Some(Price::new((bid.raw() + ask.raw()) / 2)),
            _ => None,
        }
    }

    #[inline]
    fn live_price(entry: PriceLevelEntry) -> Option<Price> {
        (!entry.price().is_null()).then_some(entry.price())
    }
}

impl Default for OrderBook {
    fn default() -> Self {
        Self::NULL
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entry::BookAction;

    fn level(side: Side, price: i64, size: u64) -> PriceLevelEntry {
        PriceLevelEntry::insert(side, Price::new(price), Size::new(size))
    }

    fn book() -> OrderBook {
        OrderBook::new(1, 16, LiquidityType::Default).unwrap()
    }

    #[test]
    fn test_order_book_update() {
        let mut book = book();

        assert_eq!(book.apply(level(Side::Bid, 100, 50)), BookResult::Top);
        assert_eq!(book.best_bid(), Some(Price::new(100)));

        assert_eq!(book.apply(level(Side::Bid, 101, 30)), BookResult::Top);
        assert_eq!(book.best_bid(), Some(Price::new(101)));

        assert_eq!(
            book.apply(PriceLevelEntry::delete(Side::Bid, Price::new(101))),
            BookResult::Top
        );
        assert_eq!(book.best_bid(), Some(Price::new(100)));
        assert_eq!(book.best_size(Side::Bid), Size::new(50));
    }

    #[test]
    fn test_order_book_spread() {
        let mut book = book();

        book.apply(level(Side::Bid, 100, 50));
        book.apply(level(Side::Ask, 102, 30));

        assert_eq!(book.spread(), Some(2));
        assert_eq!(book.mid_price(), Some(Price::new(101)));
    }

    #[test]
    fn test_order_book_empty_spread() {
        let book = book();
        assert_eq!(book.spread(), None);
        assert_eq!(book.mid_price(), None);
        assert!(book.top_of_book().is_empty());
    }

    #[test]
    fn test_order_book_snapshot() {
        let mut book = book();

        book.apply(level(Side::Bid, 100, 50));
        book.apply(level(Side::Ask, 102, 30));

        let changed = book.apply_snapshot(
            &[level(Side::Bid, 99, 100), level(Side::Bid, 98, 10)],
            &[level(Side::Ask, 101, 80)],
        );

        assert!(changed);
        assert_eq!(book.best_bid(), Some(Price::new(99)));
        assert_eq!(book.best_ask(), Some(Price::new(101)));
        assert_eq!(book.bids().len(), 2);

        let unchanged = book.apply_snapshot(
            &[level(Side::Bid, 99, 100), level(Side::Bid, 98, 10)],
            &[level(Side::Ask, 101, 80)],
        );
        assert!(!unchanged);
    }

    #[test]
    fn test_best_n_levels() {
        let mut book = book();

        book.apply(level(Side::Ask, 100, 10));
        book.apply(level(Side::Ask, 101, 20));
        book.apply(level(Side::Ask, 102, 30));
        book.apply(level(Side::Ask, 103, 40));

        let best = book.asks().best_n(2);
        assert_eq!(best.len(), 2);
        assert_eq!(best[0].price(), Price::new(100));
        assert_eq!(best[0].place(), 1);
        assert_eq!(best[1].price(), Price::new(101));
        assert_eq!(book.entry_at(Side::Ask, 4).size(), Size::new(40));
        assert!(book.entry_at(Side::Gap, 1).is_null());
        assert_eq!(book.depth(Side::Ask).len(), 4);
        assert_eq!(book.best_price(Side::Ask), Some(Price::new(100)));
        assert!(book.top(Side::Gap).is_null());
    }

    #[test]
    fn test_liquidity_filter() {
        let mut book = book();

        let implied = level(Side::Bid, 100, 5).with_liquidity(LiquidityType::Implied);
        assert_eq!(book.apply(implied), BookResult::Discard);
        assert!(book.is_empty());

        let unspecified = level(Side::Bid, 100, 5).with_liquidity(LiquidityType::None);
        assert_eq!(book.apply(unspecified), BookResult::Top);
        assert_eq!(book.top_of_book().bid.liquidity(), LiquidityType::Default);
    }

    #[test]
    fn test_gap_side_is_rejected() {
        let mut book = book();
        let gap = PriceLevelEntry::new(
            BookAction::Insert,
            Side::Gap,
            LiquidityType::Default,
            1,
            Price::new(100),
            Size::new(1),
        )
        .unwrap();
        assert_eq!(book.apply(gap), BookResult::Error);
    }

    #[test]
    fn test_order_book_clear() {
        let mut book = book();

        book.apply(level(Side::Bid, 100, 50));
        book.apply(level(Side::Ask, 102, 30));
        book.clear();

        assert!(book.is_empty());
        assert_eq!(book.top_of_book(), TopOfBook::NULL);
    }

    #[test]
    fn test_null_book_rejects_updates() {
        let mut book = OrderBook::NULL;
        assert!(book.is_empty());
        assert_eq!(book.apply(level(Side::Bid, 100, 1)), BookResult::Discard);
        assert_eq!(OrderBook::default(), OrderBook::NULL);
    }

    #[test]
    fn test_new_rejects_bad_parameters() {
        assert!(OrderBook::new(0, 16, LiquidityType::Default).is_err());
        assert!(OrderBook::new(1, 0, LiquidityType::Default).is_err());
    }
}
