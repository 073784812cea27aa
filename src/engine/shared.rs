//! Thread-safe handle around an [`Exchange`].
//!
//! Every operation takes one lock, stamps the system clock, runs to
//! completion and then fans its event out to subscribers. Operations on one
//! exchange therefore never interleave.

use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::{SystemTime, UNIX_EPOCH};

use tracing::{debug, warn};

use crate::config::ExchangeConfig;
use crate::engine::Exchange;
use crate::error::Result;
use crate::token::Token;
use crate::types::{
    Address, Amount, CancelEvent, DepositEvent, Event, Order, OrderEvent, OrderId, OrderStatus,
    StateReceipt, TradeEvent, WithdrawEvent,
};

struct Inner {
    exchange: Exchange,
    subscribers: Vec<Sender<Event>>,
}

impl Inner {
    /// Move journaled events to every live subscriber.
    fn publish(&mut self) {
        let events = self.exchange.drain_events();
        if events.is_empty() {
            return;
        }
        for event in events {
            self.subscribers.retain(|tx| tx.send(event.clone()).is_ok());
        }
    }
}

/// Cloneable, lock-guarded exchange.
#[derive(Clone)]
pub struct SharedExchange {
    inner: Arc<Mutex<Inner>>,
}

/// Current unix time in seconds; 0 if the clock is before the epoch.
pub fn unix_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}

impl SharedExchange {
    pub fn new(config: ExchangeConfig) -> Self {
        Self::from_exchange(Exchange::new(config))
    }

    pub fn from_exchange(exchange: Exchange) -> Self {
        Self {
            inner: Arc::new(Mutex::new(Inner {
                exchange,
                subscribers: Vec::new(),
            })),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        // The only calls that can panic mid-operation are token calls; the
        // ledger rolls back its pending debit on unwind.
        self.inner.lock().unwrap_or_else(|poisoned| {
            warn!("exchange lock poisoned, recovering");
            poisoned.into_inner()
        })
    }

    /// Receive every event emitted from now on.
    ///
    /// Dropping the receiver unsubscribes.
    pub fn subscribe(&self) -> Receiver<Event> {
        let (tx, rx) = mpsc::channel();
        let mut inner = self.lock();
        inner.subscribers.push(tx);
        debug!(subscribers = inner.subscribers.len(), "subscriber registered");
        rx
    }

    pub fn subscriber_count(&self) -> usize {
        self.lock().subscribers.len()
    }

    // ========================================================================
    // Operations
    // ========================================================================

    pub fn deposit<T: Token + ?Sized>(
        &self,
        token: &mut T,
        user: &Address,
        amount: Amount,
    ) -> Result<DepositEvent> {
        let mut inner = self.lock();
        let event = inner.exchange.deposit(token, user, amount)?;
        inner.publish();
        Ok(event)
    }

    pub fn withdraw<T: Token + ?Sized>(
        &self,
        token: &mut T,
        user: &Address,
        amount: Amount,
    ) -> Result<WithdrawEvent> {
        let mut inner = self.lock();
        let event = inner.exchange.withdraw(token, user, amount)?;
        inner.publish();
        Ok(event)
    }

    pub fn make_order(
        &self,
        creator: &Address,
        token_get: &Address,
        amount_get: Amount,
        token_give: &Address,
        amount_give: Amount,
    ) -> OrderEvent {
        let mut inner = self.lock();
        let event = inner
            .exchange
            .make_order(creator, token_get, amount_get, token_give, amount_give, unix_now());
        inner.publish();
        event
    }

    pub fn cancel_order(&self, caller: &Address, id: OrderId) -> Result<CancelEvent> {
        let mut inner = self.lock();
        let event = inner.exchange.cancel_order(caller, id, unix_now())?;
        inner.publish();
        Ok(event)
    }

    pub fn fill_order(&self, caller: &Address, id: OrderId) -> Result<TradeEvent> {
        let mut inner = self.lock();
        let event = inner.exchange.fill_order(caller, id, unix_now())?;
        inner.publish();
        Ok(event)
    }

    // ========================================================================
    // Queries
    // ========================================================================

    pub fn balance_of(&self, token: &Address, owner: &Address) -> Amount {
        self.lock().exchange.balance_of(token, owner)
    }

    pub fn order_count(&self) -> u64 {
        self.lock().exchange.order_count()
    }

    pub fn order(&self, id: OrderId) -> Option<Order> {
        self.lock().exchange.order(id).cloned()
    }

    pub fn status(&self, id: OrderId) -> Option<OrderStatus> {
        self.lock().exchange.status(id)
    }

    pub fn is_cancelled(&self, id: OrderId) -> bool {
        self.lock().exchange.is_cancelled(id)
    }

    pub fn is_filled(&self, id: OrderId) -> bool {
        self.lock().exchange.is_filled(id)
    }

    /// Open orders trading `a` against `b`, in either direction.
    pub fn open_orders_for(&self, a: &Address, b: &Address) -> Vec<Order> {
        self.lock().exchange.book().open_orders_for(a, b).cloned().collect()
    }

    pub fn receipt(&self) -> Result<StateReceipt> {
        self.lock().exchange.receipt(unix_now())
    }

    /// Run `f` against the exchange under the lock.
    pub fn with_exchange<R>(&self, f: impl FnOnce(&Exchange) -> R) -> R {
        f(&self.lock().exchange)
    }
}

impl std::fmt::Debug for SharedExchange {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SharedExchange")
            .field("order_count", &self.order_count())
            .field("subscribers", &self.subscriber_count())
            .finish()
    }
}

// ============================================================================
// Unit Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::TokenError;
    use crate::token::MemoryToken;
    use crate::types::address_from_label;

    #[test]
    fn test_subscriber_receives_events_in_order() {
        let shared = SharedExchange::new(ExchangeConfig::default());
        let rx = shared.subscribe();
        let alice = address_from_label("alice");
        let mut token = MemoryToken::new("Token X", "X", 100, alice);
        let custody = shared.with_exchange(|ex| *ex.custody());
        let x = token.address();

        token.approve(&alice, &custody, 50);
        shared.deposit(&mut token, &alice, 50).unwrap();
        shared.make_order(&alice, &address_from_label("Y"), 5, &x, 5);
        shared.cancel_order(&alice, 1).unwrap();

        let names: Vec<&str> = rx.try_iter().map(|e| e.name()).collect();
        assert_eq!(names, vec!["Deposit", "Order", "Cancel"]);
    }

    #[test]
    fn test_rejected_operation_publishes_nothing() {
        let shared = SharedExchange::new(ExchangeConfig::default());
        let rx = shared.subscribe();

        assert!(shared.cancel_order(&address_from_label("alice"), 1).is_err());

        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn test_dropped_subscriber_is_pruned() {
        let shared = SharedExchange::new(ExchangeConfig::default());
        let kept = shared.subscribe();
        drop(shared.subscribe());
        assert_eq!(shared.subscriber_count(), 2);

        let alice = address_from_label("alice");
        shared.make_order(&alice, &address_from_label("Y"), 1, &address_from_label("X"), 1);

        assert_eq!(shared.subscriber_count(), 1);
        assert_eq!(kept.try_iter().count(), 1);
    }

    #[test]
    fn test_recovers_consistent_state_after_token_panic() {
        struct Exploding(MemoryToken);

        impl Token for Exploding {
            fn address(&self) -> Address {
                self.0.address()
            }

            fn transfer(
                &mut self,
                _: &Address,
                _: &Address,
                _: Amount,
            ) -> std::result::Result<(), TokenError> {
                panic!("transfer panicked");
            }

            fn transfer_from(
                &mut self,
                spender: &Address,
                from: &Address,
                to: &Address,
                amount: Amount,
            ) -> std::result::Result<(), TokenError> {
                self.0.transfer_from(spender, from, to, amount)
            }

            fn balance_of(&self, owner: &Address) -> Amount {
                self.0.balance_of(owner)
            }

            fn allowance(&self, owner: &Address, spender: &Address) -> Amount {
                self.0.allowance(owner, spender)
            }
        }

        let shared = SharedExchange::new(ExchangeConfig::default());
        let alice = address_from_label("alice");
        let custody = shared.with_exchange(|ex| *ex.custody());
        let mut token = Exploding(MemoryToken::new("Token X", "X", 100, alice));
        let x = token.address();
        token.0.approve(&alice, &custody, 100);
        shared.deposit(&mut token, &alice, 100).unwrap();

        let worker = shared.clone();
        let outcome = std::thread::spawn(move || {
            let _ = worker.withdraw(&mut token, &alice, 40);
        })
        .join();
        assert!(outcome.is_err());

        // The lock is poisoned now; reads recover it and see the full balance.
        assert_eq!(shared.balance_of(&x, &alice), 100);
        assert_eq!(shared.with_exchange(|ex| ex.ledger().total_for(&x)), 100);
    }

    #[test]
    fn test_clock_stamps_orders() {
        let shared = SharedExchange::new(ExchangeConfig::default());
        let before = unix_now();
        let event = shared.make_order(&[1u8; 32], &[2u8; 32], 1, &[3u8; 32], 1);
        assert!(event.timestamp >= before);
        assert_eq!(shared.order(1).map(|o| o.timestamp), Some(event.timestamp));
    }
}
