//! Cumulative volume by price for the current session.

use feedstate_core::{Price, Size};
use std::collections::BTreeMap;

/// Volume traded at one price.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CuvolEntry {
    /// Ticks above the lowest traded on-grid price.
    pub index: i64,
    /// Price.
    pub price: Price,
    /// Cumulative volume at the price.
    pub size: Size,
}

impl CuvolEntry {
    /// No entry.
    pub const NULL: Self = Self {
        index: -1,
        price: Price::NULL,
        size: Size::NULL,
    };

    /// Returns true for the NULL entry.
    #[must_use]
    pub fn is_null(&self) -> bool {
        *self == Self::NULL
    }
}

/// Cumulative volume per price.
///
/// Prices on the instrument's tick grid are keyed by tick; prices off the
/// grid are kept apart so they never alias a grid level.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CuvolMap {
    tick_size: i64,
    on_grid: BTreeMap<i64, Size>,
    off_grid: BTreeMap<Price, Size>,
    last: Option<i64>,
}

impl CuvolMap {
    /// Empty map that treats every price as off-grid.
    pub const NULL: Self = Self::new(0);

    /// Creates an empty map for `tick_size`.
    #[must_use]
    pub const fn new(tick_size: i64) -> Self {
        Self {
            tick_size,
            on_grid: BTreeMap::new(),
            off_grid: BTreeMap::new(),
            last: None,
        }
    }

    /// Adds `size` at `price`. Returns false if nothing was added.
    pub fn add(&mut self, price: Price, size: Size) -> bool {
        if price.is_null() || size.is_empty() {
            return false;
        }
        match price.to_ticks(self.tick_size) {
            Some(ticks) => {
                let volume = self.on_grid.entry(ticks).or_insert(Size::ZERO);
                *volume = volume.accumulate(size);
                self.last = Some(ticks);
            }
            None => {
                let volume = self.off_grid.entry(price).or_insert(Size::ZERO);
                *volume = volume.accumulate(size);
            }
        }
        true
    }

    /// Cumulative volume at `price`, or NULL.
    #[must_use]
    pub fn volume_at(&self, price: Price) -> Size {
        let volume = match price.to_ticks(self.tick_size) {
            Some(ticks) => self.on_grid.get(&ticks),
            None => self.off_grid.get(&price),
        };
        volume.copied().unwrap_or(Size::NULL)
    }

    /// Entry for the most recent on-grid price, or NULL.
    #[must_use]
    pub fn last_entry(&self) -> CuvolEntry {
        let Some(ticks) = self.last else {
            return CuvolEntry::NULL;
        };
        match (self.on_grid.get(&ticks), self.on_grid.keys().next()) {
            (Some(size), Some(first)) => CuvolEntry {
                index: ticks.saturating_sub(*first),
                price: Price::from_ticks(ticks, self.tick_size),
                size: *size,
            },
            _ => CuvolEntry::NULL,
        }
    }

    /// Lowest traded on-grid price, or NULL.
    #[must_use]
    pub fn first_price(&self) -> Price {
        self.on_grid
            .keys()
            .next()
            .map_or(Price::NULL, |ticks| Price::from_ticks(*ticks, self.tick_size))
    }

    /// On-grid entries in price order.
    pub fn entries(&self) -> impl Iterator<Item = CuvolEntry> + '_ {
        let first = self.on_grid.keys().next().copied().unwrap_or_default();
        self.on_grid.iter().map(move |(ticks, size)| CuvolEntry {
            index: ticks.saturating_sub(first),
            price: Price::from_ticks(*ticks, self.tick_size),
            size: *size,
        })
    }

    /// Off-grid prices and their volume, in price order.
    pub fn off_grid(&self) -> impl Iterator<Item = (Price, Size)> + '_ {
        self.off_grid.iter().map(|(price, size)| (*price, *size))
    }

    /// Total volume across all prices.
    #[must_use]
    pub fn total(&self) -> Size {
        self.on_grid
            .values()
            .chain(self.off_grid.values())
            .fold(Size::ZERO, |acc, size| acc.accumulate(*size))
    }

    /// Returns true if nothing has traded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.on_grid.is_empty() && self.off_grid.is_empty()
    }

    /// Removes all volume.
    pub fn clear(&mut self) {
        self.on_grid.clear();
        self.off_grid.clear();
        self.last = None;
    }
}

impl Default for CuvolMap {
    fn default() -> Self {
        Self::NULL
    }
}
