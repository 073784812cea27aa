//! Custody Exchange - Binary Entry Point
//!
//! Deploys three in-memory tokens, seeds the exchange with deposits, a
//! cancelled order, a few fills and a batch of open orders, then logs every
//! event and the final state receipt.
//!
//! Usage: `custody-exchange [config.json]`. Log level comes from `RUST_LOG`
//! (default `info`).

use std::error::Error;

use custody_exchange::config::ExchangeConfig;
use custody_exchange::engine::SharedExchange;
use custody_exchange::token::{MemoryToken, Token};
use custody_exchange::types::units::{from_base_units_trimmed, to_base_units, DEFAULT_DECIMALS};
use custody_exchange::types::{address_from_label, short_hex, Amount, Event};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Whole tokens to smallest units at 18 decimals.
fn tokens(n: u64) -> Result<Amount, Box<dyn Error>> {
    to_base_units(&n.to_string(), DEFAULT_DECIMALS)
        .ok_or_else(|| format!("cannot scale {n}").into())
}

fn display(amount: Amount) -> String {
    from_base_units_trimmed(amount, DEFAULT_DECIMALS).unwrap_or_else(|| amount.to_string())
}

fn log_event(event: &Event) {
    match event {
        Event::Deposit(e) => info!(
            user = %short_hex(&e.user),
            amount = %display(e.amount),
            balance = %display(e.balance),
            "Deposit"
        ),
        Event::Withdraw(e) => info!(
            user = %short_hex(&e.user),
            amount = %display(e.amount),
            balance = %display(e.balance),
            "Withdraw"
        ),
        Event::Order(e) => info!(
            id = e.id,
            creator = %short_hex(&e.creator),
            get = %display(e.amount_get),
            give = %display(e.amount_give),
            "Order"
        ),
        Event::Cancel(e) => info!(id = e.id, creator = %short_hex(&e.creator), "Cancel"),
        Event::Trade(e) => info!(
            id = e.id,
            filler = %short_hex(&e.filler),
            creator = %short_hex(&e.creator),
            "Trade"
        ),
    }
}

fn main() -> Result<(), Box<dyn Error>> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = match std::env::args().nth(1) {
        Some(path) => {
            info!(%path, "loading config");
            ExchangeConfig::from_file(&path)?
        }
        None => ExchangeConfig::default(),
    };

    let user1 = address_from_label("user1");
    let user2 = address_from_label("user2");

    let mut nav = MemoryToken::with_whole_supply("Nav Token", "NAVT", "1000000", user1)
        .ok_or("bad NAVT supply")?;
    let mut meth = MemoryToken::with_whole_supply("Mock Eth", "mETH", "1000000", user1)
        .ok_or("bad mETH supply")?;
    let dai = MemoryToken::with_whole_supply("Mock Dai", "mDAI", "1000000", user1)
        .ok_or("bad mDAI supply")?;
    for token in [&nav, &meth, &dai] {
        info!(
            name = token.name(),
            symbol = token.symbol(),
            address = %short_hex(&token.address()),
            "token deployed"
        );
    }

    let exchange = SharedExchange::new(config);
    let events = exchange.subscribe();
    let custody = exchange.with_exchange(|ex| *ex.custody());
    let amount = tokens(10_000)?;

    meth.transfer(&user1, &user2, amount)?;

    nav.approve(&user1, &custody, amount);
    exchange.deposit(&mut nav, &user1, amount)?;
    meth.approve(&user2, &custody, amount);
    exchange.deposit(&mut meth, &user2, amount)?;

    let (n, m) = (nav.address(), meth.address());

    let order = exchange.make_order(&user1, &m, tokens(100)?, &n, tokens(5)?);
    exchange.cancel_order(&user1, order.id)?;

    for (get, give) in [(100, 10), (50, 15), (200, 20)] {
        let order = exchange.make_order(&user1, &m, tokens(get)?, &n, tokens(give)?);
        exchange.fill_order(&user2, order.id)?;
    }

    for i in 1..=10 {
        exchange.make_order(&user1, &m, tokens(10 * i)?, &n, tokens(10)?);
    }
    for i in 1..=10 {
        exchange.make_order(&user2, &n, tokens(10)?, &m, tokens(10 * i)?);
    }

    for event in events.try_iter() {
        log_event(&event);
    }

    let open = exchange.open_orders_for(&n, &m).len();
    let receipt = exchange.receipt()?;
    info!(
        orders = receipt.order_count,
        filled = receipt.filled_count,
        cancelled = receipt.cancelled_count,
        open,
        state_root = %receipt.state_root_hex(),
        "exchange seeded"
    );

    Ok(())
}
