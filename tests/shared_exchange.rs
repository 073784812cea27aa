//! Concurrent use of one exchange through `SharedExchange`.

use std::thread;

use custody_exchange::config::ExchangeConfig;
use custody_exchange::engine::SharedExchange;
use custody_exchange::error::ExchangeError;
use custody_exchange::token::{MemoryToken, Token};
use custody_exchange::types::{address_from_label, Amount, Event, OrderStatus};

const THREADS: u64 = 8;
const ORDERS_PER_THREAD: u64 = 250;

#[test]
fn concurrent_makers_get_unique_sequential_ids() {
    let exchange = SharedExchange::new(ExchangeConfig::default());
    let events = exchange.subscribe();
    let x = address_from_label("X");
    let y = address_from_label("Y");

    let handles: Vec<_> = (0..THREADS)
        .map(|t| {
            let exchange = exchange.clone();
            thread::spawn(move || {
                let maker = address_from_label(&format!("maker-{t}"));
                (0..ORDERS_PER_THREAD)
                    .map(|i| {
                        let amount = Amount::from(i + 1);
                        exchange.make_order(&maker, &y, amount, &x, amount).id
                    })
                    .collect::<Vec<_>>()
            })
        })
        .collect();

    let mut ids: Vec<u64> = handles
        .into_iter()
        .flat_map(|h| h.join().expect("maker thread panicked"))
        .collect();
    ids.sort_unstable();

    let total = THREADS * ORDERS_PER_THREAD;
    assert_eq!(ids, (1..=total).collect::<Vec<_>>());
    assert_eq!(exchange.order_count(), total);

    // Subscribers see events in id order, since ids are issued under the lock.
    let published: Vec<u64> = events.try_iter().filter_map(|e| e.order_id()).collect();
    assert_eq!(published, (1..=total).collect::<Vec<_>>());
}

#[test]
fn racing_fillers_settle_exactly_once() {
    let exchange = SharedExchange::new(ExchangeConfig::default());
    let custody = exchange.with_exchange(|ex| *ex.custody());
    let deployer = address_from_label("deployer");
    let creator = address_from_label("creator");

    let mut x = MemoryToken::new("Token X", "X", 1_000_000, deployer);
    let mut y = MemoryToken::new("Token Y", "Y", 1_000_000, deployer);
    let (x_addr, y_addr) = (x.address(), y.address());

    x.transfer(&deployer, &creator, 100).unwrap();
    x.approve(&creator, &custody, 100);
    exchange.deposit(&mut x, &creator, 100).unwrap();

    let fillers: Vec<_> = (0..THREADS)
        .map(|t| address_from_label(&format!("filler-{t}")))
        .collect();
    for filler in &fillers {
        y.transfer(&deployer, filler, 1_000).unwrap();
        y.approve(filler, &custody, 1_000);
        exchange.deposit(&mut y, filler, 1_000).unwrap();
    }

    let order = exchange.make_order(&creator, &y_addr, 100, &x_addr, 100);

    let handles: Vec<_> = fillers
        .iter()
        .map(|filler| {
            let exchange = exchange.clone();
            let filler = *filler;
            thread::spawn(move || exchange.fill_order(&filler, order.id))
        })
        .collect();

    let results: Vec<_> = handles
        .into_iter()
        .map(|h| h.join().expect("filler thread panicked"))
        .collect();

    let wins = results.iter().filter(|r| r.is_ok()).count();
    assert_eq!(wins, 1);
    for err in results.iter().filter_map(|r| r.as_ref().err()) {
        assert_eq!(
            *err,
            ExchangeError::AlreadyFinalized { order_id: order.id, status: OrderStatus::Filled }
        );
    }

    let fee_account = exchange.with_exchange(|ex| *ex.fee_account());
    assert_eq!(exchange.balance_of(&y_addr, &fee_account), 10);
    assert_eq!(exchange.balance_of(&y_addr, &creator), 100);
    assert_eq!(exchange.balance_of(&x_addr, &creator), 0);
    assert_eq!(exchange.status(order.id), Some(OrderStatus::Filled));
}

#[test]
fn subscribers_each_get_every_event() {
    let exchange = SharedExchange::new(ExchangeConfig::default());
    let first = exchange.subscribe();
    let second = exchange.subscribe();
    let a = address_from_label("A");

    exchange.make_order(&a, &address_from_label("Y"), 1, &address_from_label("X"), 1);
    exchange.cancel_order(&a, 1).unwrap();

    let first: Vec<Event> = first.try_iter().collect();
    let second: Vec<Event> = second.try_iter().collect();
    assert_eq!(first.len(), 2);
    assert_eq!(first, second);
}

#[test]
fn receipt_reflects_shared_state() {
    let exchange = SharedExchange::new(ExchangeConfig::default());
    let a = address_from_label("A");
    exchange.make_order(&a, &address_from_label("Y"), 1, &address_from_label("X"), 1);
    exchange.make_order(&a, &address_from_label("Y"), 2, &address_from_label("X"), 2);
    exchange.cancel_order(&a, 2).unwrap();

    let receipt = exchange.receipt().unwrap();

    assert_eq!(receipt.order_count, 2);
    assert_eq!(receipt.cancelled_count, 1);
    assert_eq!(receipt.open_count(), 1);
    assert_eq!(receipt.state_root, exchange.with_exchange(|ex| ex.state_root().unwrap()));
}
