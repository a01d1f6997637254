//! Market fields, change sets and field values.

use crate::cuvol::CuvolMap;
use crate::values::{Bar, Trade};
use feedstate_book::{OrderBook, TopOfBook};
use feedstate_core::Timestamp;
use std::fmt;

/// Number of market fields.
pub const FIELD_COUNT: usize = 9;

/// Field of a market, in slot order.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum MarketField {
    /// Time of the last applied message.
    MarketTime = 0,
    /// Last trade.
    Trade = 1,
    /// Depth book.
    Book = 2,
    /// Best bid and ask.
    BookTop = 3,
    /// Cumulative volume.
    Cuvol = 4,
    /// Current regular session.
    BarCurrent = 5,
    /// Current extended session.
    BarCurrentExt = 6,
    /// Previous regular session.
    BarPrevious = 7,
    /// Previous extended session.
    BarPreviousExt = 8,
}

impl MarketField {
    /// All fields in slot order.
    pub const ALL: [Self; FIELD_COUNT] = [
        Self::MarketTime,
        Self::Trade,
        Self::Book,
        Self::BookTop,
        Self::Cuvol,
        Self::BarCurrent,
        Self::BarCurrentExt,
        Self::BarPrevious,
        Self::BarPreviousExt,
    ];

    /// Slot index.
    #[inline]
    #[must_use]
    pub const fn index(self) -> usize {
        self as usize
    }

    /// Field at slot `index`.
    #[must_use]
    pub const fn from_index(index: usize) -> Option<Self> {
        if index < FIELD_COUNT {
            Some(Self::ALL[index])
        } else {
            None
        }
    }

    /// Field name.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::MarketTime => "MARKET_TIME",
            Self::Trade => "TRADE",
            Self::Book => "BOOK",
            Self::BookTop => "BOOK_TOP",
            Self::Cuvol => "CUVOL",
            Self::BarCurrent => "BAR_CURRENT",
            Self::BarCurrentExt => "BAR_CURRENT_EXT",
            Self::BarPrevious => "BAR_PREVIOUS",
            Self::BarPreviousExt => "BAR_PREVIOUS_EXT",
        }
    }

    /// Returns true for the session bar fields.
    #[must_use]
    pub const fn is_bar(self) -> bool {
        matches!(
            self,
            Self::BarCurrent | Self::BarCurrentExt | Self::BarPrevious | Self::BarPreviousExt
        )
    }

    /// Value read for this field before it is ever set.
    #[must_use]
    pub fn null_value(self) -> &'static FieldValue {
        match self {
            Self::MarketTime => &NULL_TIME,
            Self::Trade => &NULL_TRADE,
            Self::Book => &NULL_BOOK,
            Self::BookTop => &NULL_TOP,
            Self::Cuvol => &NULL_CUVOL,
            Self::BarCurrent | Self::BarCurrentExt | Self::BarPrevious | Self::BarPreviousExt => {
                &NULL_BAR
            }
        }
    }
}

impl fmt::Display for MarketField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Set of changed fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct ChangeSet(u16);

impl ChangeSet {
    /// No fields.
    pub const EMPTY: Self = Self(0);

    /// Every field.
    pub const ALL: Self = Self((1 << FIELD_COUNT) - 1);

    /// Adds a field.
    #[inline]
    pub fn insert(&mut self, field: MarketField) {
        self.0 |= 1 << field.index();
    }

    /// Removes a field.
    #[inline]
    pub fn remove(&mut self, field: MarketField) {
        self.0 &= !(1 << field.index());
    }

    /// Returns true if `field` is in the set.
    #[inline]
    #[must_use]
    pub const fn contains(self, field: MarketField) -> bool {
        self.0 & (1 << field.index()) != 0
    }

    /// Fields in either set.
    #[must_use]
    pub const fn union(self, other: Self) -> Self {
        Self(self.0 | other.0)
    }

    /// Returns true if no field is set.
    #[inline]
    #[must_use]
    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// Number of fields in the set.
    #[must_use]
    pub const fn len(self) -> usize {
        self.0.count_ones() as usize
    }

    /// Removes every field.
    pub fn clear(&mut self) {
        self.0 = 0;
    }

    /// Fields in slot order.
    pub fn iter(self) -> impl Iterator<Item = MarketField> {
        MarketField::ALL
            .into_iter()
            .filter(move |field| self.contains(*field))
    }
}

impl FromIterator<MarketField> for ChangeSet {
    fn from_iter<I: IntoIterator<Item = MarketField>>(iter: I) -> Self {
        let mut set = Self::EMPTY;
        for field in iter {
            set.insert(field);
        }
        set
    }
}

impl fmt::Display for ChangeSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        f.write_str("[")?;
        for field in self.iter() {
            if !first {
                f.write_str(",")?;
            }
            f.write_str(field.name())?;
            first = false;
        }
        f.write_str("]")
    }
}

/// Value stored in a market slot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldValue {
    /// Market time.
    Time(Timestamp),
    /// Last trade.
    Trade(Trade),
    /// Depth book.
    Book(OrderBook),
    /// Best bid and ask.
    Top(TopOfBook),
    /// Cumulative volume.
    Cuvol(CuvolMap),
    /// Session bar.
    Bar(Bar),
}

impl FieldValue {
    /// Short name of the value's kind.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Time(_) => "time",
            Self::Trade(_) => "trade",
            Self::Book(_) => "book",
            Self::Top(_) => "top",
            Self::Cuvol(_) => "cuvol",
            Self::Bar(_) => "bar",
        }
    }

    /// Returns true if the value can be stored in `field`.
    #[must_use]
    pub const fn fits(&self, field: MarketField) -> bool {
        match self {
            Self::Time(_) => matches!(field, MarketField::MarketTime),
            Self::Trade(_) => matches!(field, MarketField::Trade),
            Self::Book(_) => matches!(field, MarketField::Book),
            Self::Top(_) => matches!(field, MarketField::BookTop),
            Self::Cuvol(_) => matches!(field, MarketField::Cuvol),
            Self::Bar(_) => field.is_bar(),
        }
    }
}

static NULL_TIME: FieldValue = FieldValue::Time(Timestamp::NULL);
static NULL_TRADE: FieldValue = FieldValue::Trade(Trade::NULL);
static NULL_BOOK: FieldValue = FieldValue::Book(OrderBook::NULL);
static NULL_TOP: FieldValue = FieldValue::Top(TopOfBook::NULL);
static NULL_CUVOL: FieldValue = FieldValue::Cuvol(CuvolMap::NULL);
static NULL_BAR: FieldValue = FieldValue::Bar(Bar::NULL);
