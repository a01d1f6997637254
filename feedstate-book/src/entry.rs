//! Packed depth-level records.

use crate::error::BookError;
use feedstate_core::{Price, Size};
use std::fmt;

/// Action carried by a depth update.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BookAction {
    /// New level.
    Insert,
    /// Changed level.
    Update,
    /// Removed level.
    Delete,
    /// Placeholder, clears whatever the slot held.
    Noop,
}

/// Book side of a depth update.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Side {
    /// Bid (buy) side.
    Bid,
    /// Ask (sell) side.
    Ask,
    /// Gap marker, belongs to neither side.
    Gap,
}

impl Side {
    /// Returns true if `lhs` is a better price than `rhs` on this side.
    #[inline]
    #[must_use]
    pub fn is_better(self, lhs: Price, rhs: Price) -> bool {
        match self {
            Self::Bid => lhs > rhs,
            Self::Ask => lhs < rhs,
            Self::Gap => false,
        }
    }
}

/// Liquidity class of a depth level.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LiquidityType {
    /// Unspecified.
    None,
    /// Outright orders.
    Default,
    /// Implied from spreads.
    Implied,
    /// Outright and implied merged.
    Combined,
}

/// Depth rank that means "unranked" or "not found".
pub const PLACE_NONE: u8 = 0;

/// Immutable record of one depth-level update.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PriceLevelEntry {
    action: BookAction,
    side: Side,
    liquidity: LiquidityType,
    place: u8,
    price: Price,
    size: Size,
}

impl PriceLevelEntry {
    /// Stand-in for "no entry".
    pub const NULL: Self = Self {
        action: BookAction::Noop,
        side: Side::Gap,
        liquidity: LiquidityType::None,
        place: PLACE_NONE,
        price: Price::NULL,
        size: Size::NULL,
    };

    /// Creates an entry from decoded feed values.
    ///
    /// # Errors
    /// Returns [`BookError::InvalidRank`] if `place` does not fit in a byte.
    pub fn new(
        action: BookAction,
        side: Side,
        liquidity: LiquidityType,
        place: i32,
        price: Price,
        size: Size,
    ) -> Result<Self, BookError> {
        let place = u8::try_from(place).map_err(|_| BookError::InvalidRank { place })?;
        Ok(Self {
            action,
            side,
            liquidity,
            place,
            price,
            size,
        })
    }

    /// Unranked default-liquidity insert.
    #[must_use]
    pub const fn insert(side: Side, price: Price, size: Size) -> Self {
        Self {
            action: BookAction::Insert,
            side,
            liquidity: LiquidityType::Default,
            place: PLACE_NONE,
            price,
            size,
        }
    }

    /// Default-liquidity delete by price.
    #[must_use]
    pub const fn delete(side: Side, price: Price) -> Self {
        Self {
            action: BookAction::Delete,
            side,
            liquidity: LiquidityType::Default,
            place: PLACE_NONE,
            price,
            size: Size::NULL,
        }
    }

    /// Default-liquidity delete by rank.
    #[must_use]
    pub const fn delete_place(side: Side, place: u8) -> Self {
        Self {
            action: BookAction::Delete,
            side,
            liquidity: LiquidityType::Default,
            place,
            price: Price::NULL,
            size: Size::NULL,
        }
    }

    /// Update action.
    #[inline]
    #[must_use]
    pub const fn action(&self) -> BookAction {
        self.action
    }

    /// Book side.
    #[inline]
    #[must_use]
    pub const fn side(&self) -> Side {
        self.side
    }

    /// Liquidity class.
    #[inline]
    #[must_use]
    pub const fn liquidity(&self) -> LiquidityType {
        self.liquidity
    }

    /// Depth rank, 1 = best, 0 = unranked.
    #[inline]
    #[must_use]
    pub const fn place(&self) -> u8 {
        self.place
    }

    /// Level price.
    #[inline]
    #[must_use]
    pub const fn price(&self) -> Price {
        self.price
    }

    /// Level size.
    #[inline]
    #[must_use]
    pub const fn size(&self) -> Size {
        self.size
    }

    /// Returns a copy carrying the given rank.
    #[inline]
    #[must_use]
    pub const fn with_place(mut self, place: u8) -> Self {
        self.place = place;
        self
    }

    /// Returns a copy carrying the given liquidity class.
    #[inline]
    #[must_use]
    pub const fn with_liquidity(mut self, liquidity: LiquidityType) -> Self {
        self.liquidity = liquidity;
        self
    }

    /// Returns true for the NULL entry.
    #[inline]
    #[must_use]
    pub fn is_null(&self) -> bool {
        *self == Self::NULL
    }

    /// Returns true if the entry occupies a level: an insert or update on a
    /// real side with a price and a non-zero size.
    #[inline]
    #[must_use]
    pub const fn is_normal(&self) -> bool {
        matches!(self.action, BookAction::Insert | BookAction::Update)
            && matches!(self.side, Side::Bid | Side::Ask)
            && !self.price.is_null()
            && !self.size.is_empty()
    }

    /// Returns true if both entries describe the same level content,
    /// ignoring action and rank.
    #[inline]
    #[must_use]
    pub fn same_level(&self, other: &Self) -> bool {
        self.side == other.side
            && self.liquidity == other.liquidity
            && self.price == other.price
            && self.size == other.size
    }
}

impl Default for PriceLevelEntry {
    fn default() -> Self {
        Self::NULL
    }
}

impl fmt::Display for PriceLevelEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:?} {:?} #{} {} x {}",
            self.action, self.side, self.place, self.price, self.size
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_entry() {
        let entry = PriceLevelEntry::new(
            BookAction::Insert,
            Side::Bid,
            LiquidityType::Default,
            3,
            Price::new(100),
            Size::new(5),
        )
        .unwrap();

        assert_eq!(entry.action(), BookAction::Insert);
        assert_eq!(entry.side(), Side::Bid);
        assert_eq!(entry.liquidity(), LiquidityType::Default);
        assert_eq!(entry.place(), 3);
        assert_eq!(entry.price(), Price::new(100));
        assert_eq!(entry.size(), Size::new(5));
        assert!(entry.is_normal());
    }

    #[test]
    fn test_rank_overflow_is_an_error() {
        let result = PriceLevelEntry::new(
            BookAction::Insert,
            Side::Ask,
            LiquidityType::Default,
            256,
            Price::new(100),
            Size::new(5),
        );
        assert_eq!(result, Err(BookError::InvalidRank { place: 256 }));

        let result = PriceLevelEntry::new(
            BookAction::Insert,
            Side::Ask,
            LiquidityType::Default,
            -1,
            Price::new(100),
            Size::new(5),
        );
        assert_eq!(result, Err(BookError::InvalidRank { place: -1 }));
    }

    #[test]
    fn test_null_entry() {
        let null = PriceLevelEntry::NULL;
        assert!(null.is_null());
        assert!(!null.is_normal());
        assert!(null.price().is_null());
        assert!(null.size().is_null());
        assert_eq!(null.place(), PLACE_NONE);
        assert_eq!(PriceLevelEntry::default(), null);
    }

    #[test]
    fn test_is_normal() {
        assert!(PriceLevelEntry::insert(Side::Ask, Price::new(1), Size::new(1)).is_normal());
        assert!(!PriceLevelEntry::insert(Side::Gap, Price::new(1), Size::new(1)).is_normal());
        assert!(!PriceLevelEntry::insert(Side::Ask, Price::NULL, Size::new(1)).is_normal());
        assert!(!PriceLevelEntry::insert(Side::Ask, Price::new(1), Size::ZERO).is_normal());
        assert!(!PriceLevelEntry::delete(Side::Ask, Price::new(1)).is_normal());
    }

    #[test]
    fn test_same_level_ignores_rank() {
        let a = PriceLevelEntry::insert(Side::Bid, Price::new(10), Size::new(2));
        let b = a.with_place(4);
        assert_ne!(a, b);
        assert!(a.same_level(&b));
        assert!(!a.same_level(&PriceLevelEntry::insert(Side::Bid, Price::new(10), Size::new(3))));
    }

    #[test]
    fn test_side_ordering() {
        assert!(Side::Bid.is_better(Price::new(101), Price::new(100)));
        assert!(Side::Ask.is_better(Price::new(100), Price::new(101)));
        assert!(!Side::Gap.is_better(Price::new(100), Price::new(101)));
    }
}
