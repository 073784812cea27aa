//! Order table and lifecycle.
//!
//! ## Storage
//!
//! Orders live in a [`Slab`]. Orders are never removed, so slab keys are
//! handed out densely from 0 and order id `n` is always slab key `n - 1`.
//! Lookups by id are O(1) and ids are never reused.
//!
//! Terminal status is kept in two ordered sets (cancelled, filled). An order
//! in neither set is open.
//!
//! ## Example
//!
//! ```
//! use custody_exchange::orderbook::OrderBook;
//! use custody_exchange::types::{address_from_label, OrderStatus};
//!
//! let mut book = OrderBook::new();
//! let alice = address_from_label("alice");
//! let x = address_from_label("X");
//! let y = address_from_label("Y");
//!
//! let event = book.make_order(alice, y, 10, x, 10, 1_000);
//! assert_eq!(event.id, 1);
//!
//! book.cancel_order(&alice, 1, 1_005).unwrap();
//! assert_eq!(book.status(1), Some(OrderStatus::Cancelled));
//! ```

use std::collections::BTreeSet;

use slab::Slab;
use tracing::debug;

use crate::error::{ExchangeError, Result};
use crate::ledger::Ledger;
use crate::orderbook::settlement::{settle, FeeSchedule};
use crate::types::{
    short_hex, Address, Amount, CancelEvent, Order, OrderEvent, OrderId, OrderStatus, TradeEvent,
};

/// All orders ever created plus their terminal status.
#[derive(Debug, Clone, Default)]
pub struct OrderBook {
    /// Key `n` holds order id `n + 1`
    orders: Slab<Order>,

    cancelled: BTreeSet<OrderId>,

    filled: BTreeSet<OrderId>,
}

impl OrderBook {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a book with pre-allocated order slots.
    pub fn with_capacity(order_capacity: usize) -> Self {
        Self {
            orders: Slab::with_capacity(order_capacity),
            cancelled: BTreeSet::new(),
            filled: BTreeSet::new(),
        }
    }

    // ========================================================================
    // Counters
    // ========================================================================

    /// Highest issued order id (0 before the first order).
    #[inline]
    pub fn order_count(&self) -> u64 {
        self.orders.len() as u64
    }

    #[inline]
    pub fn cancelled_count(&self) -> u64 {
        self.cancelled.len() as u64
    }

    #[inline]
    pub fn filled_count(&self) -> u64 {
        self.filled.len() as u64
    }

    // ========================================================================
    // Lookup
    // ========================================================================

    fn key_for(id: OrderId) -> Option<usize> {
        id.checked_sub(1).and_then(|k| usize::try_from(k).ok())
    }

    /// Order by id; None for 0 or ids never issued.
    #[inline]
    pub fn get(&self, id: OrderId) -> Option<&Order> {
        Self::key_for(id).and_then(|key| self.orders.get(key))
    }

    #[inline]
    pub fn is_cancelled(&self, id: OrderId) -> bool {
        self.cancelled.contains(&id)
    }

    #[inline]
    pub fn is_filled(&self, id: OrderId) -> bool {
        self.filled.contains(&id)
    }

    /// Status of an issued order.
    pub fn status(&self, id: OrderId) -> Option<OrderStatus> {
        self.get(id)?;
        Some(if self.is_filled(id) {
            OrderStatus::Filled
        } else if self.is_cancelled(id) {
            OrderStatus::Cancelled
        } else {
            OrderStatus::Open
        })
    }

    /// The order, if it exists and is still open.
    fn open_order(&self, id: OrderId) -> Result<&Order> {
        let order = self.get(id).ok_or(ExchangeError::NotFound(id))?;
        match self.status(id) {
            Some(status) if status.is_terminal() => {
                Err(ExchangeError::AlreadyFinalized { order_id: id, status })
            }
            _ => Ok(order),
        }
    }

    // ========================================================================
    // Views
    // ========================================================================

    /// All orders in id order.
    pub fn iter(&self) -> impl Iterator<Item = &Order> {
        self.orders.iter().map(|(_, order)| order)
    }

    /// Open orders in id order.
    pub fn open_orders(&self) -> impl Iterator<Item = &Order> {
        self.iter()
            .filter(|order| !self.is_cancelled(order.id) && !self.is_filled(order.id))
    }

    /// Open orders trading `a` against `b`, in either direction.
    pub fn open_orders_for<'a>(
        &'a self,
        a: &'a Address,
        b: &'a Address,
    ) -> impl Iterator<Item = &'a Order> + 'a {
        self.open_orders().filter(move |order| order.trades_pair(a, b))
    }

    /// Orders created by `creator`, whatever their status.
    pub fn orders_by<'a>(&'a self, creator: &'a Address) -> impl Iterator<Item = &'a Order> + 'a {
        self.iter().filter(move |order| order.creator == *creator)
    }

    /// Filled orders in id order.
    pub fn filled_orders(&self) -> impl Iterator<Item = &Order> {
        self.filled.iter().filter_map(|id| self.get(*id))
    }

    /// Cancelled order ids in ascending order.
    pub fn cancelled_ids(&self) -> impl Iterator<Item = OrderId> + '_ {
        self.cancelled.iter().copied()
    }

    // ========================================================================
    // Lifecycle
    // ========================================================================

    /// Record a new order under the next sequential id.
    ///
    /// No balance is checked or reserved.
    pub fn make_order(
        &mut self,
        creator: Address,
        token_get: Address,
        amount_get: Amount,
        token_give: Address,
        amount_give: Amount,
        timestamp: u64,
    ) -> OrderEvent {
        let entry = self.orders.vacant_entry();
        let id = entry.key() as OrderId + 1;
        let order = entry.insert(Order::new(
            id,
            creator,
            token_get,
            amount_get,
            token_give,
            amount_give,
            timestamp,
        ));

        debug!(
            id,
            creator = %short_hex(&creator),
            amount_get,
            amount_give,
            self_referential = order.is_self_referential(),
            "order created"
        );
        OrderEvent::from_order(order)
    }

    /// Cancel an open order on behalf of its creator.
    ///
    /// Errors, in order of precedence: `NotFound`, `Unauthorized`,
    /// `AlreadyFinalized`.
    pub fn cancel_order(
        &mut self,
        caller: &Address,
        id: OrderId,
        timestamp: u64,
    ) -> Result<CancelEvent> {
        let order = self.get(id).ok_or(ExchangeError::NotFound(id))?;
        if order.creator != *caller {
            return Err(ExchangeError::Unauthorized { order_id: id, caller: *caller });
        }

        let order = self.open_order(id)?;
        let event = CancelEvent::from_order(order, timestamp);
        self.cancelled.insert(id);

        debug!(id, "order cancelled");
        Ok(event)
    }

    /// Fill an open order: settle against `ledger` and mark it filled.
    ///
    /// Settlement is staged and committed only on success, and the order is
    /// marked filled in the same call, so an order can never settle twice.
    pub fn fill_order(
        &mut self,
        ledger: &mut Ledger,
        fees: &FeeSchedule,
        caller: &Address,
        id: OrderId,
        timestamp: u64,
    ) -> Result<TradeEvent> {
        let order = self.open_order(id)?;
        let (writes, summary) = settle(ledger, order, caller, fees)?;
        let event = TradeEvent::from_order(order, *caller, timestamp);

        ledger.commit(writes);
        self.filled.insert(id);

        debug!(
            id,
            filler = %short_hex(caller),
            fee = summary.fee,
            filler_cost = summary.filler_cost,
            "order filled"
        );
        Ok(event)
    }
}

// ============================================================================
// Unit Tests
// ============================================================================
