//! Trade, session bar and last-price values.

use feedstate_core::{Price, Size, Timestamp};

/// Trading session a trade belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum TradeSession {
    /// Regular trading hours.
    #[default]
    Regular,
    /// Extended (electronic) hours.
    Extended,
}

/// Last trade print.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Trade {
    /// Trade price.
    pub price: Price,
    /// Trade size.
    pub size: Size,
    /// Exchange time of the trade.
    pub time: Timestamp,
    /// Session the trade counts toward.
    pub session: TradeSession,
}

impl Trade {
    /// No trade.
    pub const NULL: Self = Self {
        price: Price::NULL,
        size: Size::NULL,
        time: Timestamp::NULL,
        session: TradeSession::Regular,
    };

    /// Creates a regular-session trade.
    #[must_use]
    pub const fn new(price: Price, size: Size, time: Timestamp) -> Self {
        Self {
            price,
            size,
            time,
            session: TradeSession::Regular,
        }
    }

    /// Returns a copy tagged with `session`.
    #[must_use]
    pub const fn in_session(mut self, session: TradeSession) -> Self {
        self.session = session;
        self
    }

    /// Returns true if the trade has no price.
    #[inline]
    #[must_use]
    pub const fn is_null(&self) -> bool {
        self.price.is_null()
    }
}

impl Default for Trade {
    fn default() -> Self {
        Self::NULL
    }
}

/// Session bar.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Bar {
    /// First trade price.
    pub open: Price,
    /// Highest trade price.
    pub high: Price,
    /// Lowest trade price.
    pub low: Price,
    /// Last trade price.
    pub close: Price,
    /// Settlement price.
    pub settle: Price,
    /// True once the settlement is final.
    pub settled: bool,
    /// Session volume.
    pub volume: Size,
    /// Open interest.
    pub interest: Size,
    /// Last time the bar changed.
    pub updated: Timestamp,
}

impl Bar {
    /// Empty bar.
    pub const NULL: Self = Self {
        open: Price::NULL,
        high: Price::NULL,
        low: Price::NULL,
        close: Price::NULL,
        settle: Price::NULL,
        settled: false,
        volume: Size::NULL,
        interest: Size::NULL,
        updated: Timestamp::NULL,
    };

    /// Folds a trade into the bar. Returns false for a trade without a
    /// price.
    pub fn on_trade(&mut self, price: Price, size: Size, time: Timestamp) -> bool {
        if price.is_null() {
            return false;
        }
        if self.open.is_null() {
            self.open = price;
        }
        if self.high.is_null() || price > self.high {
            self.high = price;
        }
        if self.low.is_null() || price < self.low {
            self.low = price;
        }
        self.close = price;
        self.volume = self.volume.accumulate(size);
        self.updated = time;
        true
    }

    /// Records a settlement price.
    pub fn settle(&mut self, price: Price, settled: bool, time: Timestamp) {
        self.settle = price;
        self.settled = settled;
        self.updated = time;
    }

    /// Returns true if nothing has been recorded.
    #[must_use]
    pub fn is_null(&self) -> bool {
        *self == Self::NULL
    }
}

impl Default for Bar {
    fn default() -> Self {
        Self::NULL
    }
}

/// Which value a derived last price came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LastPriceSource {
    /// Nothing available.
    Null,
    /// Final settlement of the current session.
    Settle,
    /// Last trade of the current session.
    LastTrade,
    /// Final settlement of the previous session.
    PreviousSettle,
    /// Close of the previous session.
    PreviousClose,
}

/// Best available "last" price of a market.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct LastPrice {
    /// Where the price came from.
    pub source: LastPriceSource,
    /// The price.
    pub price: Price,
}

impl LastPrice {
    /// No price available.
    pub const NULL: Self = Self {
        source: LastPriceSource::Null,
        price: Price::NULL,
    };

    /// Derives the last price from the current and previous session bars.
    ///
    /// Preference order: current settlement, current close, previous
    /// settlement, previous close.
    #[must_use]
    pub fn derive(current: &Bar, previous: &Bar) -> Self {
        let candidates = [
            (
                LastPriceSource::Settle,
                current.settled.then_some(current.settle),
            ),
            (LastPriceSource::LastTrade, Some(current.close)),
            (
                LastPriceSource::PreviousSettle,
                previous.settled.then_some(previous.settle),
            ),
            (LastPriceSource::PreviousClose, Some(previous.close)),
        ];
        candidates
            .into_iter()
            .find_map(|(source, price)| {
                price
                    .filter(|p| !p.is_null())
                    .map(|price| Self { source, price })
            })
            .unwrap_or(Self::NULL)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn t(nanos: u64) -> Timestamp {
        Timestamp::from_nanos(nanos)
    }

    #[test]
    fn test_bar_on_trade() {
        let mut bar = Bar::NULL;
        assert!(bar.on_trade(Price::new(100), Size::new(2), t(1)));
        assert!(bar.on_trade(Price::new(105), Size::new(1), t(2)));
        assert!(bar.on_trade(Price::new(98), Size::new(3), t(3)));

        assert_eq!(bar.open, Price::new(100));
        assert_eq!(bar.high, Price::new(105));
        assert_eq!(bar.low, Price::new(98));
        assert_eq!(bar.close, Price::new(98));
        assert_eq!(bar.volume, Size::new(6));
        assert_eq!(bar.updated, t(3));
    }

    #[test]
    fn test_bar_ignores_null_price() {
        let mut bar = Bar::NULL;
        assert!(!bar.on_trade(Price::NULL, Size::new(2), t(1)));
        assert!(bar.is_null());
    }

    #[test]
    fn test_last_price_order() {
        let mut current = Bar::NULL;
        let mut previous = Bar::NULL;
        assert_eq!(LastPrice::derive(&current, &previous), LastPrice::NULL);

        previous.close = Price::new(90);
        assert_eq!(
            LastPrice::derive(&current, &previous).source,
            LastPriceSource::PreviousClose
        );

        previous.settle(Price::new(91), false, t(1));
        assert_eq!(
            LastPrice::derive(&current, &previous).source,
            LastPriceSource::PreviousClose
        );
        previous.settle(Price::new(91), true, t(1));
        assert_eq!(
            LastPrice::derive(&current, &previous),
            LastPrice {
                source: LastPriceSource::PreviousSettle,
                price: Price::new(91)
            }
        );

        current.on_trade(Price::new(95), Size::new(1), t(2));
        assert_eq!(
            LastPrice::derive(&current, &previous).source,
            LastPriceSource::LastTrade
        );

        current.settle(Price::new(96), true, t(3));
        assert_eq!(
            LastPrice::derive(&current, &previous),
            LastPrice {
                source: LastPriceSource::Settle,
                price: Price::new(96)
            }
        );
    }

    #[test]
    fn test_trade_session() {
        let trade = Trade::new(Price::new(1), Size::new(1), t(1)).in_session(TradeSession::Extended);
        assert_eq!(trade.session, TradeSession::Extended);
        assert!(Trade::NULL.is_null());
        assert_eq!(Trade::default(), Trade::NULL);
    }
}
