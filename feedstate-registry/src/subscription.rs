//! Subscription categories, interests and upstream commands.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Category of upstream data.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum SubscriptionType {
    /// Depth book.
    Book = 0,
    /// Cumulative volume.
    Cuvol = 1,
    /// Session bars and settlement.
    Session = 2,
    /// Trade prints.
    Trade = 3,
}

impl SubscriptionType {
    /// All categories in encoding order.
    pub const ALL: [Self; 4] = [Self::Book, Self::Cuvol, Self::Session, Self::Trade];

    #[inline]
    const fn bit(self) -> u8 {
        1 << self as u8
    }

    /// Wire code.
    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Self::Book => "book",
            Self::Cuvol => "cuvol",
            Self::Session => "session",
            Self::Trade => "trade",
        }
    }
}

/// Set of subscription categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct CategorySet(u8);

impl CategorySet {
    /// No category.
    pub const EMPTY: Self = Self(0);

    /// Every category.
    pub const ALL: Self = Self(0b1111);

    /// Set holding a single category.
    #[must_use]
    pub const fn only(kind: SubscriptionType) -> Self {
        Self(kind.bit())
    }

    /// Adds a category.
    pub fn insert(&mut self, kind: SubscriptionType) {
        self.0 |= kind.bit();
    }

    /// Removes a category.
    pub fn remove(&mut self, kind: SubscriptionType) {
        self.0 &= !kind.bit();
    }

    /// Returns true if `kind` is in the set.
    #[must_use]
    pub const fn contains(self, kind: SubscriptionType) -> bool {
        self.0 & kind.bit() != 0
    }

    /// Categories in either set.
    #[must_use]
    pub const fn union(self, other: Self) -> Self {
        Self(self.0 | other.0)
    }

    /// Categories in `self` but not in `other`.
    #[must_use]
    pub const fn difference(self, other: Self) -> Self {
        Self(self.0 & !other.0)
    }

    /// Returns true if every category of `self` is in `other`.
    #[must_use]
    pub const fn is_subset(self, other: Self) -> bool {
        self.0 & !other.0 == 0
    }

    /// Returns true if the set is empty.
    #[must_use]
    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// Number of categories.
    #[must_use]
    pub const fn len(self) -> usize {
        self.0.count_ones() as usize
    }

    /// Categories in encoding order.
    pub fn iter(self) -> impl Iterator<Item = SubscriptionType> {
        SubscriptionType::ALL
            .into_iter()
            .filter(move |kind| self.contains(*kind))
    }
}

impl FromIterator<SubscriptionType> for CategorySet {
    fn from_iter<I: IntoIterator<Item = SubscriptionType>>(iter: I) -> Self {
        let mut set = Self::EMPTY;
        for kind in iter {
            set.insert(kind);
        }
        set
    }
}

impl fmt::Display for CategorySet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, kind) in self.iter().enumerate() {
            if i > 0 {
                f.write_str(",")?;
            }
            f.write_str(kind.code())?;
        }
        Ok(())
    }
}

/// What an agent wants to observe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MarketDataType {
    /// The whole market.
    Market,
    /// Trades only.
    Trade,
    /// Depth only.
    Book,
    /// Cumulative volume, which is built from trades.
    Cuvol,
    /// Session bars, which are built from trades.
    Session,
}

impl MarketDataType {
    /// Upstream categories needed to serve this data type.
    #[must_use]
    pub const fn required(self) -> CategorySet {
        match self {
            Self::Market => CategorySet::ALL,
            Self::Trade => CategorySet::only(SubscriptionType::Trade),
            Self::Book => CategorySet::only(SubscriptionType::Book),
            Self::Cuvol => CategorySet::only(SubscriptionType::Trade)
                .union(CategorySet::only(SubscriptionType::Cuvol)),
            Self::Session => CategorySet::only(SubscriptionType::Trade)
                .union(CategorySet::only(SubscriptionType::Session)),
        }
    }
}

/// Kind of upstream interest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum InterestKind {
    /// A single instrument symbol.
    Instrument,
    /// Every instrument of an exchange.
    Exchange,
}

/// Upstream subscription key.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Interest {
    /// Interest kind.
    pub kind: InterestKind,
    /// Symbol or exchange code as sent upstream.
    pub code: String,
}

impl Interest {
    /// Instrument interest for `symbol`, shortened to its upstream form.
    #[must_use]
    pub fn instrument(symbol: &str) -> Self {
        Self {
            kind: InterestKind::Instrument,
            code: interest_for_symbol(symbol),
        }
    }

    /// Exchange interest.
    #[must_use]
    pub fn exchange(code: impl Into<String>) -> Self {
        Self {
            kind: InterestKind::Exchange,
            code: code.into(),
        }
    }
}

impl fmt::Display for Interest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.code)
    }
}

/// Shortens a four-digit contract year to its last digit (`ESZ2023` becomes
/// `ESZ3`). Other symbols are returned unchanged.
#[must_use]
pub fn interest_for_symbol(symbol: &str) -> String {
    let bytes = symbol.as_bytes();
    let len = bytes.len();
    if len < 4 || !bytes[len - 1].is_ascii_digit() || !bytes[len - 4].is_ascii_digit() {
        return symbol.to_string();
    }
    let mut short = String::with_capacity(len - 3);
    short.push_str(&symbol[..len - 4]);
    short.push_str(&symbol[len - 1..]);
    short
}

/// Subscribe or unsubscribe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SubAction {
    /// Start receiving categories.
    Subscribe,
    /// Stop receiving categories.
    Unsubscribe,
}

/// Delta command for the upstream transport.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SubCommand {
    /// Direction.
    pub action: SubAction,
    /// Interest the command applies to.
    pub interest: Interest,
    /// Categories added or removed.
    pub categories: CategorySet,
}

impl SubCommand {
    /// Subscribe command.
    #[must_use]
    pub fn subscribe(interest: Interest, categories: CategorySet) -> Self {
        Self {
            action: SubAction::Subscribe,
            interest,
            categories,
        }
    }

    /// Unsubscribe command.
    #[must_use]
    pub fn unsubscribe(interest: Interest, categories: CategorySet) -> Self {
        Self {
            action: SubAction::Unsubscribe,
            interest,
            categories,
        }
    }

    /// Text form sent upstream, e.g. `+ESZ3=book,trade`.
    #[must_use]
    pub fn encode(&self) -> String {
        let sign = match self.action {
            SubAction::Subscribe => '+',
            SubAction::Unsubscribe => '-',
        };
        format!("{sign}{}={}", self.interest.code, self.categories)
    }
}

impl fmt::Display for SubCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.encode())
    }
}
