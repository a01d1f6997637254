//! Replays a short synthetic session through a registry.
//!
//! Two agents follow the CME futures: one wants only trades, the other the
//! whole market. The example prints the subscription commands the registry
//! emits and every callback the agents receive.
//!
//! Run with: `RUST_LOG=debug cargo run --example replay`

use feedstate::prelude::*;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

fn future(id: u64, symbol: &str) -> Instrument {
    Instrument {
        id: InstrumentId(id),
        symbol: symbol.to_string(),
        exchange: Exchange::new("CME"),
        security_type: SecurityType::Future,
        tick_size: 25,
        multiplier: 50,
        currency: "USD".to_string(),
        display_fraction: Some(Fraction::decimal(2)),
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let mut catalog = InstrumentCatalog::new();
    let es = catalog.add(future(1, "ESZ2023"));
    let nq = catalog.add(future(2, "NQZ2023"));

    let (registry, commands) = RegistryBuilder::new()
        .book_depth(16)
        .lookup(catalog)
        .build_with_channel()?;

    let trades = Arc::new(AtomicU64::new(0));
    let counter = Arc::clone(&trades);
    let tape = registry.new_agent(
        MarketDataType::Trade,
        move |market: &FrozenMarket, changes: ChangeSet| {
            if changes.contains(MarketField::Trade) {
                counter.fetch_add(1, Ordering::Relaxed);
                let trade = market.trade();
                println!(
                    "[tape] {} {} @ {}",
                    market.instrument().symbol,
                    trade.size,
                    trade.price
                );
            }
        },
    );
    tape.include_symbols(&["ESZ2023"]);

    let screen = registry.new_agent(
        MarketDataType::Market,
        |market: &FrozenMarket, changes: ChangeSet| {
            let top = market.top_of_book();
            println!(
                "[screen] {} {} bid {} ask {} last {}",
                market.instrument().symbol,
                changes,
                top.bid.price(),
                top.ask.price(),
                market.derived_last_price().price
            );
        },
    );
    screen.include_exchanges(&[Exchange::new("CME")]);

    for command in commands.drain() {
        println!("[upstream] {command}");
    }

    for (n, instrument) in [&es, &nq].into_iter().cycle().take(8).enumerate() {
        let time = Timestamp::from_nanos(n as u64 + 1);
        let base = 18_000 + n as i64;
        let message = MarketMessage::new(Arc::clone(instrument), time)
            .with(MarketUpdate::Book(PriceLevelEntry::insert(
                Side::Bid,
                Price::from_ticks(base, 25),
                Size::new(10),
            )))
            .with(MarketUpdate::Book(PriceLevelEntry::insert(
                Side::Ask,
                Price::from_ticks(base + 1, 25),
                Size::new(12),
            )))
            .with(MarketUpdate::Trade(Trade::new(
                Price::from_ticks(base + 1, 25),
                Size::new(1),
                time,
            )));
        registry.ingest(&message)?;
    }

    screen.deactivate();
    tape.terminate();
    for command in commands.drain() {
        println!("[upstream] {command}");
    }

    if let Some(market) = registry.snapshot(es.id) {
        println!(
            "{}: {} bid levels, session volume {}, cumulative volume {}",
            market.instrument(),
            market.book().depth(Side::Bid).len(),
            market.session().volume,
            market.cuvol().total()
        );
    }
    println!("tape saw {} trades", trades.load(Ordering::Relaxed));

    Ok(())
}
