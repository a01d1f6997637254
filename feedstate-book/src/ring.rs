//! Fixed-capacity price ring for one side of a book.
//!
//! A price lands in slot `ticks mod capacity`. A 64-bit occupancy mask
//! mirrors which slots hold a live level, so the best level, the rank of a
//! slot and the slot at a rank are all found with bit scans instead of a walk
//! over the entries.
//!
//! The ring tracks a window of `capacity` ticks that starts at the best price
//! and runs away from the market. Whenever the ring is non-empty, `head` is
//! the slot of the best price. Asks read upward from `head`, bids read
//! downward, both wrapping around the ring.

use crate::entry::{BookAction, PLACE_NONE, PriceLevelEntry, Side};
use crate::error::BookError;
use feedstate_core::Price;

/// Largest supported ring capacity (one occupancy bit per slot).
pub const MAX_CAPACITY: usize = 64;

/// Ring capacity used when none is configured.
pub const DEFAULT_CAPACITY: usize = 32;

/// Slot index that means "no slot".
pub const CLUE_NONE: usize = usize::MAX;

/// Outcome of applying one entry to a ring.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BookResult {
    /// The best level changed.
    Top,
    /// A level below the best changed.
    Normal,
    /// The entry fell outside the tracked window and was dropped.
    Discard,
    /// The entry matched what the ring already held.
    Unchanged,
    /// The entry cannot be applied to this ring.
    Error,
}

impl BookResult {
    /// Returns true if the ring was modified.
    #[inline]
    #[must_use]
    pub const fn is_change(self) -> bool {
        matches!(self, Self::Top | Self::Normal)
    }
}

/// Where a price sits relative to the tracked window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PriceSlot {
    /// Inside the window.
    Window(usize),
    /// Better than the current best, or the ring is empty.
    Better(usize),
    /// Worse than the last tracked tick.
    Beyond,
    /// Null or not on the tick grid.
    OffGrid,
}

#[inline]
const fn bit(index: usize) -> u64 {
    1u64 << index
}

/// Bits `lo..=hi`, with `lo <= hi < 64`.
#[inline]
const fn span(lo: usize, hi: usize) -> u64 {
    (u64::MAX >> (63 - hi)) & (u64::MAX << lo)
}

/// One side of a depth book held in a fixed ring of slots.
///
/// Two rings compare equal when they hold the same levels with the same
/// geometry; stored actions and slot placement are ignored.
#[derive(Debug, Clone)]
pub struct RingBook {
    side: Side,
    capacity: usize,
    tick_size: i64,
    head: usize,
    mask: u64,
    entries: [PriceLevelEntry; MAX_CAPACITY],
}

impl RingBook {
    /// Creates an empty ring.
    ///
    /// # Errors
    /// Returns an error if `side` is not bid or ask, `capacity` is outside
    /// `1..=64`, or `tick_size` is not positive.
    pub fn new(side: Side, tick_size: i64, capacity: usize) -> Result<Self, BookError> {
        if side == Side::Gap {
            return Err(BookError::InvalidSide);
        }
        if capacity == 0 || capacity > MAX_CAPACITY {
            return Err(BookError::InvalidCapacity {
                capacity,
                max: MAX_CAPACITY,
            });
        }
        if tick_size <= 0 {
            return Err(BookError::InvalidTickSize { tick_size });
        }
        Ok(Self::with_parts(side, tick_size, capacity))
    }

    /// Builds a ring without validation. A zero tick size makes every
    /// price-addressed apply fail, which is what the NULL book relies on.
    pub(crate) const fn with_parts(side: Side, tick_size: i64, capacity: usize) -> Self {
        Self {
            side,
            capacity,
            tick_size,
            head: 0,
            mask: 0,
            entries: [PriceLevelEntry::NULL; MAX_CAPACITY],
        }
    }

    /// Side held by this ring.
    #[inline]
    #[must_use]
    pub const fn side(&self) -> Side {
        self.side
    }

    /// Number of slots.
    #[inline]
    #[must_use]
    pub const fn capacity(&self) -> usize {
        self.capacity
    }

    /// Tick size used to map prices to slots.
    #[inline]
    #[must_use]
    pub const fn tick_size(&self) -> i64 {
        self.tick_size
    }

    /// Occupancy mask, one bit per slot.
    #[inline]
    #[must_use]
    pub const fn occupancy(&self) -> u64 {
        self.mask
    }

    /// Number of live levels.
    #[inline]
    #[must_use]
    pub const fn len(&self) -> usize {
        self.mask.count_ones() as usize
    }

    /// Returns true if no level is live.
    #[inline]
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.mask == 0
    }

    /// Slot of the best level, or [`CLUE_NONE`] if the ring is empty.
    #[inline]
    #[must_use]
    pub fn top_index(&self) -> usize {
        self.first_from_head(self.mask)
    }

    /// First set bit of `mask` in book order starting at `head`.
    #[inline]
    fn first_from_head(&self, mask: u64) -> usize {
        if mask == 0 {
            return CLUE_NONE;
        }
        match self.side {
            Side::Ask => {
                let ahead = mask & (u64::MAX << self.head);
                let scan = if ahead != 0 { ahead } else { mask };
                scan.trailing_zeros() as usize
            }
            Side::Bid | Side::Gap => {
                let ahead = mask & span(0, self.head);
                let scan = if ahead != 0 { ahead } else { mask };
                63 - scan.leading_zeros() as usize
            }
        }
    }

    /// 1-based rank of the level in slot `clue`, or [`PLACE_NONE`] if the
    /// slot is out of range or empty.
    #[must_use]
    pub fn place_from_clue(&self, clue: usize) -> u8 {
        if clue >= self.capacity || self.mask & bit(clue) == 0 {
            return PLACE_NONE;
        }
        let head = self.head;
        let diff = match self.side {
            Side::Ask => clue as isize - head as isize,
            Side::Bid | Side::Gap => head as isize - clue as isize,
        };
        // Window of slots that read no later than `clue` in book order.
        let window = match (self.side, diff) {
            (_, -1) => u64::MAX,
            (Side::Ask, d) if d >= 0 => span(head, clue),
            (Side::Ask, _) => !span(clue + 1, head - 1),
            (_, d) if d >= 0 => span(clue, head),
            _ => !span(head + 1, clue - 1),
        };
        (self.mask & window).count_ones() as u8
    }

    /// Slot holding the level of rank `place`, or [`CLUE_NONE`] if fewer
    /// levels are live.
    #[must_use]
    pub fn clue_from_place(&self, place: u8) -> usize {
        let place = usize::from(place);
        if place == 0 || place > self.capacity || place > self.len() {
            return CLUE_NONE;
        }
        let mut remaining = self.mask;
        let mut clue = self.first_from_head(remaining);
        for _ in 1..place {
            remaining &= !bit(clue);
            clue = self.first_from_head(remaining);
        }
        clue
    }

    /// Locates `price` against the tracked window.
    #[must_use]
    pub fn clue_from_price(&self, price: Price) -> PriceSlot {
        let Some(ticks) = price.to_ticks(self.tick_size) else {
            return PriceSlot::OffGrid;
        };
        let clue = self.slot_of(ticks);
        let Some(best) = self.best_ticks() else {
            return PriceSlot::Better(clue);
        };
        let distance = self.distance(best, ticks);
        if distance < 0 {
            PriceSlot::Better(clue)
        } else if distance < self.capacity as i64 {
            PriceSlot::Window(clue)
        } else {
            PriceSlot::Beyond
        }
    }

    #[inline]
    fn slot_of(&self, ticks: i64) -> usize {
        ticks.rem_euclid(self.capacity as i64) as usize
    }

    /// Ticks from `best` to `ticks`, positive away from the market.
    #[inline]
    fn distance(&self, best: i64, ticks: i64) -> i64 {
        match self.side {
            Side::Ask => ticks.saturating_sub(best),
            Side::Bid | Side::Gap => best.saturating_sub(ticks),
        }
    }

    fn best_ticks(&self) -> Option<i64> {
        if self.mask == 0 {
            return None;
        }
        self.entries[self.head].price().to_ticks(self.tick_size)
    }

    /// Writes `entry` into slot `clue`, keeping the mask and head in step.
    ///
    /// A normal entry sets the slot's bit and becomes the head if it beats
    /// the current best. Any other entry clears the slot; clearing the head
    /// moves it to the next live slot in book order. Returns false if `clue`
    /// is out of range or nothing changed.
    pub fn set_entry(&mut self, clue: usize, entry: PriceLevelEntry) -> bool {
        if clue >= self.capacity {
            return false;
        }
        let occupied = self.mask & bit(clue) != 0;

        if entry.is_normal() {
            if occupied && self.entries[clue].same_level(&entry) {
                return false;
            }
            let becomes_top = self.mask == 0
                || self
                    .side
                    .is_better(entry.price(), self.entries[self.head].price());
            self.entries[clue] = entry.with_place(PLACE_NONE);
            self.mask |= bit(clue);
            if becomes_top {
                self.head = clue;
            }
            return true;
        }

        if !occupied {
            return false;
        }
        self.entries[clue] = PriceLevelEntry::NULL;
        self.mask &= !bit(clue);
        if self.mask == 0 {
            self.head = 0;
        } else if clue == self.head {
            self.head = self.first_from_head(self.mask);
        }
        true
    }

    /// Applies a price- or rank-addressed update.
    ///
    /// Inserts and updates are addressed by price; a price worse than the
    /// window is discarded, a better one slides the window and drops the
    /// levels that fall off its far end. Deletes, no-ops and zero sizes
    /// clear by price, or by rank when the price is null.
    pub fn apply(&mut self, entry: PriceLevelEntry) -> BookResult {
        if entry.side() != self.side {
            return BookResult::Error;
        }
        if entry.is_normal() {
            self.place_level(entry)
        } else {
            self.remove_level(entry)
        }
    }

    fn place_level(&mut self, entry: PriceLevelEntry) -> BookResult {
        match self.clue_from_price(entry.price()) {
            PriceSlot::OffGrid => BookResult::Error,
            PriceSlot::Beyond => BookResult::Discard,
            PriceSlot::Better(clue) => {
                if let Some(best) = entry.price().to_ticks(self.tick_size) {
                    self.evict_beyond(best);
                }
                self.set_entry(clue, entry);
                BookResult::Top
            }
            PriceSlot::Window(clue) => {
                if !self.set_entry(clue, entry) {
                    BookResult::Unchanged
                } else if clue == self.head {
                    BookResult::Top
                } else {
                    BookResult::Normal
                }
            }
        }
    }

    fn remove_level(&mut self, entry: PriceLevelEntry) -> BookResult {
        let clue = if !entry.price().is_null() {
            match self.clue_from_price(entry.price()) {
                PriceSlot::Window(clue) => clue,
                PriceSlot::OffGrid => return BookResult::Error,
                PriceSlot::Better(_) | PriceSlot::Beyond => return BookResult::Unchanged,
            }
        } else if entry.place() != PLACE_NONE {
            self.clue_from_place(entry.place())
        } else if entry.action() == BookAction::Noop {
            return BookResult::Unchanged;
        } else {
            return BookResult::Error;
        };

        if clue == CLUE_NONE {
            return BookResult::Unchanged;
        }
        let was_top = clue == self.head;
        if !self.set_entry(clue, PriceLevelEntry::NULL) {
            BookResult::Unchanged
        } else if was_top {
            BookResult::Top
        } else {
            BookResult::Normal
        }
    }

    /// Clears every live level at least `capacity` ticks away from `best`.
    fn evict_beyond(&mut self, best: i64) {
        let mut pending = self.mask;
        while pending != 0 {
            let clue = pending.trailing_zeros() as usize;
            pending &= pending - 1;
            let stale = match self.entries[clue].price().to_ticks(self.tick_size) {
                Some(ticks) => self.distance(best, ticks) >= self.capacity as i64,
                None => true,
            };
            if stale {
                self.entries[clue] = PriceLevelEntry::NULL;
                self.mask &= !bit(clue);
            }
        }
        if self.mask == 0 {
            self.head = 0;
        }
    }

    /// Best level with rank 1, or NULL when empty.
    #[inline]
    #[must_use]
    pub fn top(&self) -> PriceLevelEntry {
        match self.top_index() {
            CLUE_NONE => PriceLevelEntry::NULL,
            clue => self.entries[clue].with_place(1),
        }
    }

    /// Level of rank `place`, or NULL.
    #[must_use]
    pub fn entry_at(&self, place: u8) -> PriceLevelEntry {
        match self.clue_from_place(place) {
            CLUE_NONE => PriceLevelEntry::NULL,
            clue => self.entries[clue].with_place(place),
        }
    }

    /// Level stored in slot `clue` with its rank, or NULL.
    #[must_use]
    pub fn entry_at_clue(&self, clue: usize) -> PriceLevelEntry {
        match self.place_from_clue(clue) {
            PLACE_NONE => PriceLevelEntry::NULL,
            place => self.entries[clue].with_place(place),
        }
    }

    /// Live levels in book order, ranked from 1.
    #[must_use]
    pub fn levels(&self) -> Levels<'_> {
        Levels {
            ring: self,
            remaining: self.mask,
            place: 0,
        }
    }

    /// All live levels, best first.
    #[must_use]
    pub fn depth(&self) -> Vec<PriceLevelEntry> {
        self.levels().collect()
    }

    /// Returns the N best levels.
    #[must_use]
    pub fn best_n(&self, n: usize) -> Vec<PriceLevelEntry> {
        self.levels().take(n).collect()
    }

    /// Clears all levels.
    pub fn clear(&mut self) {
        self.entries = [PriceLevelEntry::NULL; MAX_CAPACITY];
        self.mask = 0;
        self.head = 0;
    }
}

impl PartialEq for RingBook {
    fn eq(&self, other: &Self) -> bool {
        self.side == other.side
            && self.capacity == other.capacity
            && self.tick_size == other.tick_size
            && self.mask.count_ones() == other.mask.count_ones()
            && self
                .levels()
                .zip(other.levels())
                .all(|(a, b)| a.same_level(&b))
    }
}

impl Eq for RingBook {}

/// Iterator over the live levels of a [`RingBook`] in book order.
#[derive(Debug, Clone)]
pub struct Levels<'a> {
    ring: &'a RingBook,
    remaining: u64,
    place: u8,
}

impl Iterator for Levels<'_> {
    type Item = PriceLevelEntry;

    fn next(&mut self) -> Option<Self::Item> {
        let clue = self.ring.first_from_head(self.remaining);
        if clue == CLUE_NONE {
            return None;
        }
        self.remaining &= !bit(clue);
        self.place += 1;
        Some(self.ring.entries[clue].with_place(self.place))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let n = self.remaining.count_ones() as usize;
        (n, Some(n))
    }
}

impl ExactSizeIterator for Levels<'_> {}

#[cfg(test)]
mod tests {
    use super::*;
    use feedstate_core::Size;
    use proptest::prelude::*;
    use std::collections::BTreeMap;

    fn ask(price: i64, size: u64) -> PriceLevelEntry {
        PriceLevelEntry::insert(Side::Ask, Price::new(price), Size::new(size))
    }

    fn bid(price: i64, size: u64) -> PriceLevelEntry {
        PriceLevelEntry::insert(Side::Bid, Price::new(price), Size::new(size))
    }

    fn prices(ring: &RingBook) -> Vec<i64> {
        ring.levels().map(|e| e.price().raw()).collect()
    }

    #[test]
    fn test_new_validates() {
        assert_eq!(
            RingBook::new(Side::Gap, 1, 8),
            Err(BookError::InvalidSide)
        );
        assert_eq!(
            RingBook::new(Side::Ask, 1, 0),
            Err(BookError::InvalidCapacity {
                capacity: 0,
                max: MAX_CAPACITY
            })
        );
        assert_eq!(
            RingBook::new(Side::Ask, 1, 65),
            Err(BookError::InvalidCapacity {
                capacity: 65,
                max: MAX_CAPACITY
            })
        );
        assert_eq!(
            RingBook::new(Side::Bid, 0, 8),
            Err(BookError::InvalidTickSize { tick_size: 0 })
        );
        assert!(RingBook::new(Side::Bid, 25, MAX_CAPACITY).is_ok());
    }

    #[test]
    fn test_empty_ring() {
        let ring = RingBook::new(Side::Ask, 1, 8).unwrap();
        assert!(ring.is_empty());
        assert_eq!(ring.top_index(), CLUE_NONE);
        assert!(ring.top().is_null());
        assert_eq!(ring.clue_from_place(1), CLUE_NONE);
        assert_eq!(ring.place_from_clue(0), PLACE_NONE);
        assert_eq!(ring.levels().count(), 0);
    }

    #[test]
    fn test_delete_middle_rank_shifts_ranks_below() {
        let mut ring = RingBook::new(Side::Ask, 1, 8).unwrap();
        for price in 10..=14 {
            ring.apply(ask(price, 1));
        }
        let clues: Vec<usize> = (10..=14).map(|p| p as usize % 8).collect();
        for (rank, clue) in clues.iter().enumerate() {
            assert_eq!(usize::from(ring.place_from_clue(*clue)), rank + 1);
        }

        assert_eq!(ring.apply(PriceLevelEntry::delete(Side::Ask, Price::new(12))), BookResult::Normal);

        assert_eq!(ring.top_index(), clues[0]);
        assert_eq!(ring.top().price(), Price::new(10));
        assert_eq!(ring.place_from_clue(clues[4]), 4);
        assert_eq!(ring.clue_from_place(4), clues[4]);
        assert_eq!(ring.place_from_clue(clues[2]), PLACE_NONE);
        assert_eq!(prices(&ring), vec![10, 11, 13, 14]);
    }

    #[test]
    fn test_ask_wraparound() {
        let mut ring = RingBook::new(Side::Ask, 1, 8).unwrap();
        for price in [9, 7, 8, 6] {
            ring.apply(ask(price, 1));
        }
        assert_eq!(ring.top_index(), 6);
        assert_eq!(ring.place_from_clue(7), 2);
        assert_eq!(ring.place_from_clue(0), 3);
        assert_eq!(ring.place_from_clue(1), 4);
        assert_eq!(ring.clue_from_place(3), 0);
        assert_eq!(prices(&ring), vec![6, 7, 8, 9]);

        assert_eq!(ring.apply(PriceLevelEntry::delete(Side::Ask, Price::new(6))), BookResult::Top);
        assert_eq!(ring.top_index(), 7);
        assert_eq!(ring.top().price(), Price::new(7));
        assert_eq!(ring.place_from_clue(1), 3);
    }

    #[test]
    fn test_full_ring_last_slot_before_head() {
        let mut ring = RingBook::new(Side::Ask, 1, 8).unwrap();
        for price in 11..=18 {
            ring.apply(ask(price, 1));
        }
        assert_eq!(ring.len(), 8);
        assert_eq!(ring.top_index(), 3);
        // slot 2 holds 18, one behind the head
        assert_eq!(ring.place_from_clue(2), 8);
        assert_eq!(ring.clue_from_place(8), 2);
        assert_eq!(ring.place_from_clue(1), 7);
    }

    #[test]
    fn test_bid_side_mirrors_ask() {
        let mut ring = RingBook::new(Side::Bid, 1, 8).unwrap();
        for price in (96..=100).rev() {
            ring.apply(bid(price, 1));
        }
        assert_eq!(ring.top_index(), 4);
        assert_eq!(ring.top().price(), Price::new(100));

        assert_eq!(ring.apply(bid(95, 1)), BookResult::Normal);
        assert_eq!(ring.place_from_clue(7), 6);
        assert_eq!(ring.clue_from_place(6), 7);
        assert_eq!(prices(&ring), vec![100, 99, 98, 97, 96, 95]);

        assert_eq!(ring.apply(bid(101, 3)), BookResult::Top);
        assert_eq!(ring.top_index(), 5);
        assert_eq!(ring.place_from_clue(4), 2);
    }

    #[test]
    fn test_better_price_evicts_far_levels() {
        let mut ring = RingBook::new(Side::Ask, 1, 4).unwrap();
        for price in 10..=13 {
            ring.apply(ask(price, 1));
        }
        assert_eq!(ring.apply(ask(9, 2)), BookResult::Top);
        assert_eq!(prices(&ring), vec![9, 10, 11, 12]);

        assert_eq!(ring.apply(ask(13, 1)), BookResult::Discard);
        assert_eq!(ring.len(), 4);

        assert_eq!(ring.apply(ask(2, 1)), BookResult::Top);
        assert_eq!(prices(&ring), vec![2]);
    }

    #[test]
    fn test_update_detects_no_change() {
        let mut ring = RingBook::new(Side::Ask, 1, 8).unwrap();
        assert_eq!(ring.apply(ask(10, 5)), BookResult::Top);
        assert_eq!(ring.apply(ask(11, 5)), BookResult::Normal);
        assert_eq!(ring.apply(ask(11, 5)), BookResult::Unchanged);
        assert_eq!(ring.apply(ask(10, 6)), BookResult::Top);
        assert_eq!(ring.top().size(), Size::new(6));
    }

    #[test]
    fn test_zero_size_deletes() {
        let mut ring = RingBook::new(Side::Ask, 1, 8).unwrap();
        ring.apply(ask(10, 5));
        ring.apply(ask(11, 5));
        assert_eq!(ring.apply(ask(10, 0)), BookResult::Top);
        assert_eq!(ring.top().price(), Price::new(11));
        assert_eq!(ring.apply(ask(10, 0)), BookResult::Unchanged);
    }

    #[test]
    fn test_delete_by_place() {
        let mut ring = RingBook::new(Side::Bid, 1, 8).unwrap();
        for price in [100, 99, 98] {
            ring.apply(bid(price, 1));
        }
        assert_eq!(
            ring.apply(PriceLevelEntry::delete_place(Side::Bid, 2)),
            BookResult::Normal
        );
        assert_eq!(prices(&ring), vec![100, 98]);
        assert_eq!(
            ring.apply(PriceLevelEntry::delete_place(Side::Bid, 5)),
            BookResult::Unchanged
        );
    }

    #[test]
    fn test_rejects_wrong_side_and_off_grid() {
        let mut ring = RingBook::new(Side::Ask, 25, 8).unwrap();
        assert_eq!(ring.apply(bid(100, 1)), BookResult::Error);
        assert_eq!(ring.apply(ask(110, 1)), BookResult::Error);
        assert_eq!(ring.apply(ask(100, 1)), BookResult::Top);
        assert_eq!(ring.apply(ask(125, 1)), BookResult::Normal);
    }

    #[test]
    fn test_set_entry_out_of_range_is_ignored() {
        let mut ring = RingBook::new(Side::Ask, 1, 8).unwrap();
        assert!(!ring.set_entry(8, ask(8, 1)));
        assert!(ring.is_empty());
    }

    #[test]
    fn test_set_entry_moves_head() {
        let mut ring = RingBook::new(Side::Ask, 1, 8).unwrap();
        assert!(ring.set_entry(3, ask(11, 1)));
        assert!(ring.set_entry(5, ask(13, 1)));
        assert_eq!(ring.top_index(), 3);
        assert!(ring.set_entry(2, ask(10, 1)));
        assert_eq!(ring.top_index(), 2);

        let noop = PriceLevelEntry::new(
            BookAction::Noop,
            Side::Ask,
            crate::entry::LiquidityType::Default,
            0,
            Price::NULL,
            Size::NULL,
        )
        .unwrap();
        assert!(ring.set_entry(2, noop));
        assert_eq!(ring.top_index(), 3);
        assert!(!ring.set_entry(2, noop));
        assert_eq!(ring.place_from_clue(5), 2);
    }

    #[test]
    fn test_entry_lookup_and_clear() {
        let mut ring = RingBook::new(Side::Ask, 1, 8).unwrap();
        ring.apply(ask(10, 1));
        ring.apply(ask(12, 2));

        let second = ring.entry_at(2);
        assert_eq!(second.price(), Price::new(12));
        assert_eq!(second.place(), 2);
        assert_eq!(ring.entry_at_clue(4).place(), 2);
        assert!(ring.entry_at(3).is_null());
        assert_eq!(ring.best_n(1).len(), 1);
        assert_eq!(ring.depth().len(), 2);

        ring.clear();
        assert!(ring.is_empty());
        assert_eq!(ring, RingBook::new(Side::Ask, 1, 8).unwrap());
    }

    #[test]
    fn test_equality_compares_levels_only() {
        let mut fresh = RingBook::new(Side::Bid, 1, 8).unwrap();
        fresh.apply(bid(20, 5));

        let mut edited = RingBook::new(Side::Bid, 1, 8).unwrap();
        edited.apply(bid(20, 5));
        edited.apply(bid(22, 1));
        let update = |size| {
            PriceLevelEntry::new(
                BookAction::Update,
                Side::Bid,
                crate::entry::LiquidityType::Default,
                0,
                Price::new(20),
                Size::new(size),
            )
            .unwrap()
        };
        edited.apply(update(6));
        edited.apply(update(5));
        edited.apply(PriceLevelEntry::delete(Side::Bid, Price::new(22)));
        assert_eq!(edited, fresh);

        edited.apply(update(4));
        assert_ne!(edited, fresh);
        assert_ne!(
            RingBook::new(Side::Bid, 1, 8).unwrap(),
            RingBook::new(Side::Bid, 2, 8).unwrap()
        );
    }

    fn book_order(ring: &RingBook) -> Vec<usize> {
        let cap = ring.capacity;
        (0..cap)
            .map(|offset| match ring.side {
                Side::Ask => (ring.head + offset) % cap,
                _ => (ring.head + cap - offset) % cap,
            })
            .filter(|&clue| ring.mask & bit(clue) != 0)
            .collect()
    }

    proptest! {
        #[test]
        fn test_bit_scans_match_linear_walk(
            capacity in 1usize..=64,
            raw_mask in any::<u64>(),
            head_seed in any::<usize>(),
            is_bid in any::<bool>(),
        ) {
            let side = if is_bid { Side::Bid } else { Side::Ask };
            let mut ring = RingBook::new(side, 1, capacity).unwrap();
            ring.mask = raw_mask & span(0, capacity - 1);
            ring.head = head_seed % capacity;

            let order = book_order(&ring);
            prop_assert_eq!(ring.top_index(), order.first().copied().unwrap_or(CLUE_NONE));
            for (rank, clue) in order.iter().enumerate() {
                prop_assert_eq!(usize::from(ring.place_from_clue(*clue)), rank + 1);
                prop_assert_eq!(ring.clue_from_place((rank + 1) as u8), *clue);
            }
            prop_assert_eq!(ring.clue_from_place((order.len() + 1) as u8), CLUE_NONE);
        }

        #[test]
        fn test_ask_ring_tracks_sorted_window(
            ops in prop::collection::vec((0i64..40, 0u64..4), 1..200),
        ) {
            const CAP: i64 = 8;
            let mut ring = RingBook::new(Side::Ask, 1, CAP as usize).unwrap();
            let mut model: BTreeMap<i64, u64> = BTreeMap::new();

            for (price, size) in ops {
                ring.apply(ask(price, size));
                if size == 0 {
                    model.remove(&price);
                    continue;
                }
                match model.keys().next().copied() {
                    Some(best) if price >= best + CAP => {}
                    Some(best) if price < best => {
                        model.insert(price, size);
                        model.retain(|p, _| *p < price + CAP);
                    }
                    _ => {
                        model.insert(price, size);
                    }
                }
            }

            let expected: Vec<(i64, u64)> = model.into_iter().collect();
            let actual: Vec<(i64, u64)> = ring
                .levels()
                .map(|e| (e.price().raw(), e.size().value()))
                .collect();
            prop_assert_eq!(actual, expected);
        }

        #[test]
        fn test_bid_ring_tracks_sorted_window(
            ops in prop::collection::vec((0i64..40, 0u64..4), 1..200),
        ) {
            const CAP: i64 = 8;
            let mut ring = RingBook::new(Side::Bid, 1, CAP as usize).unwrap();
            let mut model: BTreeMap<i64, u64> = BTreeMap::new();

            for (price, size) in ops {
                ring.apply(bid(price, size));
                if size == 0 {
                    model.remove(&price);
                    continue;
                }
                match model.keys().next_back().copied() {
                    Some(best) if price <= best - CAP => {}
                    Some(best) if price > best => {
                        model.insert(price, size);
                        model.retain(|p, _| *p > price - CAP);
                    }
                    _ => {
                        model.insert(price, size);
                    }
                }
            }

            let expected: Vec<(i64, u64)> = model.into_iter().rev().collect();
            let actual: Vec<(i64, u64)> = ring
                .levels()
                .map(|e| (e.price().raw(), e.size().value()))
                .collect();
            prop_assert_eq!(&actual, &expected);
            prop_assert_eq!(ring.len(), expected.len());
            if let Some(&(best, _)) = expected.first() {
                prop_assert_eq!(ring.top().price(), Price::new(best));
            }
        }
    }
}
