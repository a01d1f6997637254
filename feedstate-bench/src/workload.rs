//! Deterministic synthetic market data for benchmarks.

use feedstate_book::{PriceLevelEntry, Side};
use feedstate_core::{
    Exchange, Fraction, Instrument, InstrumentId, Price, SecurityType, Size, Timestamp,
};
use feedstate_market::{MarketMessage, MarketUpdate, Trade};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::sync::Arc;

/// Tick size of generated instruments.
pub const TICK: i64 = 25;

/// Mid price, in ticks, around which quotes are generated.
pub const MID_TICKS: i64 = 4_000;

/// Builds a valid futures instrument.
#[must_use]
pub fn instrument(id: u64) -> Arc<Instrument> {
    Arc::new(Instrument {
        id: InstrumentId(id),
        symbol: format!("BM{id}Z2024"),
        exchange: Exchange::new("CME"),
        security_type: SecurityType::Future,
        tick_size: TICK,
        multiplier: 50,
        currency: "USD".to_string(),
        display_fraction: Some(Fraction::decimal(2)),
    })
}

/// Seeded generator of book entries and messages. The same seed yields the
/// same sequence.
#[derive(Debug, Clone)]
pub struct Workload {
    rng: StdRng,
    time: u64,
}

impl Workload {
    /// Creates a generator from `seed`.
    #[must_use]
    pub fn new(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
            time: 0,
        }
    }

    /// Book entry within `spread` ticks of the mid price. One in eight is a
    /// delete.
    pub fn book_entry(&mut self, spread: i64) -> PriceLevelEntry {
        let side = if self.rng.gen_bool(0.5) { Side::Bid } else { Side::Ask };
        let offset = self.rng.gen_range(0..spread.max(1));
        let ticks = match side {
            Side::Bid => MID_TICKS - 1 - offset,
            _ => MID_TICKS + 1 + offset,
        };
        let price = Price::from_ticks(ticks, TICK);
        if self.rng.gen_ratio(1, 8) {
            PriceLevelEntry::delete(side, price)
        } else {
            PriceLevelEntry::insert(side, price, Size::new(self.rng.gen_range(1..=500)))
        }
    }

    /// Message carrying either a trade or `depth` book entries.
    pub fn message(&mut self, instrument: &Arc<Instrument>, depth: usize) -> MarketMessage {
        self.time += 1;
        let time = Timestamp::from_nanos(self.time);
        let mut message = MarketMessage::new(Arc::clone(instrument), time);
        if self.rng.gen_ratio(1, 4) {
            let offset = self.rng.gen_range(-4..4);
            let price = Price::from_ticks(MID_TICKS + offset, TICK);
            message.push(MarketUpdate::Trade(Trade::new(price, Size::new(1), time)));
        } else {
            for _ in 0..depth {
                message.push(MarketUpdate::Book(self.book_entry(16)));
            }
        }
        message
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_workload_is_repeatable() {
        let mut a = Workload::new(7);
        let mut b = Workload::new(7);
        for _ in 0..32 {
            assert_eq!(a.book_entry(16), b.book_entry(16));
        }
    }

    #[test]
    fn test_messages_are_repeatable() {
        let inst = instrument(1);
        let mut a = Workload::new(3);
        let mut b = Workload::new(3);
        for _ in 0..16 {
            let (x, y) = (a.message(&inst, 4), b.message(&inst, 4));
            assert_eq!(x.time, y.time);
            assert_eq!(x.updates, y.updates);
        }

        let entries = |seed| {
            let mut workload = Workload::new(seed);
            (0..8).map(|_| workload.book_entry(16)).collect::<Vec<_>>()
        };
        assert_ne!(entries(3), entries(4));
    }

    #[test]
    fn test_entries_stay_on_their_side() {
        let mut workload = Workload::new(11);
        let mid = Price::from_ticks(MID_TICKS, TICK);
        for _ in 0..256 {
            let entry = workload.book_entry(16);
            match entry.side() {
                Side::Bid => assert!(entry.price() < mid),
                _ => assert!(entry.price() > mid),
            }
        }
    }

    #[test]
    fn test_instrument_is_valid() {
        assert!(instrument(1).validate().is_ok());
    }
}
