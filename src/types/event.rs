//! Domain events emitted by state-changing exchange operations.
//!
//! Each record is immutable and append-only. Records derive
//! `SimpleSerialize` so indexers can persist them in the same deterministic
//! encoding as orders. [`Event`] wraps the five records for journaling and
//! fan-out.

use ssz_rs::prelude::*;

use crate::types::{Address, Amount, Order, OrderId};

/// Tokens moved into custody.
#[derive(Debug, Clone, PartialEq, Eq, Default, SimpleSerialize)]
pub struct DepositEvent {
    pub token: Address,
    pub user: Address,
    pub amount: Amount,
    /// Custody balance after the deposit
    pub balance: Amount,
}

/// Tokens moved out of custody.
#[derive(Debug, Clone, PartialEq, Eq, Default, SimpleSerialize)]
pub struct WithdrawEvent {
    pub token: Address,
    pub user: Address,
    pub amount: Amount,
    /// Custody balance after the withdrawal
    pub balance: Amount,
}

/// A new order was recorded.
#[derive(Debug, Clone, PartialEq, Eq, Default, SimpleSerialize)]
pub struct OrderEvent {
    pub id: OrderId,
    pub creator: Address,
    pub token_get: Address,
    pub amount_get: Amount,
    pub token_give: Address,
    pub amount_give: Amount,
    /// Creation time
    pub timestamp: u64,
}

/// An order was cancelled by its creator.
#[derive(Debug, Clone, PartialEq, Eq, Default, SimpleSerialize)]
pub struct CancelEvent {
    pub id: OrderId,
    pub creator: Address,
    pub token_get: Address,
    pub amount_get: Amount,
    pub token_give: Address,
    pub amount_give: Amount,
    /// Cancellation time, not the creation time
    pub timestamp: u64,
}

/// An order was filled.
///
/// Carries both parties so that either can pick it up from the stream.
#[derive(Debug, Clone, PartialEq, Eq, Default, SimpleSerialize)]
pub struct TradeEvent {
    pub id: OrderId,
    /// The counter-party that executed the fill
    pub filler: Address,
    pub token_get: Address,
    pub amount_get: Amount,
    pub token_give: Address,
    pub amount_give: Amount,
    /// The order's creator
    pub creator: Address,
    /// Fill time
    pub timestamp: u64,
}

impl OrderEvent {
    pub fn from_order(order: &Order) -> Self {
        Self {
            id: order.id,
            creator: order.creator,
            token_get: order.token_get,
            amount_get: order.amount_get,
            token_give: order.token_give,
            amount_give: order.amount_give,
            timestamp: order.timestamp,
        }
    }
}

impl CancelEvent {
    pub fn from_order(order: &Order, timestamp: u64) -> Self {
        Self {
            id: order.id,
            creator: order.creator,
            token_get: order.token_get,
            amount_get: order.amount_get,
            token_give: order.token_give,
            amount_give: order.amount_give,
            timestamp,
        }
    }
}

impl TradeEvent {
    pub fn from_order(order: &Order, filler: Address, timestamp: u64) -> Self {
        Self {
            id: order.id,
            filler,
            token_get: order.token_get,
            amount_get: order.amount_get,
            token_give: order.token_give,
            amount_give: order.amount_give,
            creator: order.creator,
            timestamp,
        }
    }
}

/// Any event produced by the exchange.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    Deposit(DepositEvent),
    Withdraw(WithdrawEvent),
    Order(OrderEvent),
    Cancel(CancelEvent),
    Trade(TradeEvent),
}

impl Event {
    /// Event name as observers know it.
    pub fn name(&self) -> &'static str {
        match self {
            Event::Deposit(_) => "Deposit",
            Event::Withdraw(_) => "Withdraw",
            Event::Order(_) => "Order",
            Event::Cancel(_) => "Cancel",
            Event::Trade(_) => "Trade",
        }
    }

    /// Order the event refers to, if any.
    pub fn order_id(&self) -> Option<OrderId> {
        match self {
            Event::Order(e) => Some(e.id),
            Event::Cancel(e) => Some(e.id),
            Event::Trade(e) => Some(e.id),
            Event::Deposit(_) | Event::Withdraw(_) => None,
        }
    }

    /// SSZ encoding of the inner record.
    pub fn encode(&self) -> Result<Vec<u8>, ssz_rs::SerializeError> {
        match self {
            Event::Deposit(e) => ssz_rs::serialize(e),
            Event::Withdraw(e) => ssz_rs::serialize(e),
            Event::Order(e) => ssz_rs::serialize(e),
            Event::Cancel(e) => ssz_rs::serialize(e),
            Event::Trade(e) => ssz_rs::serialize(e),
        }
    }
}

impl From<DepositEvent> for Event {
    fn from(e: DepositEvent) -> Self {
        Event::Deposit(e)
    }
}

impl From<WithdrawEvent> for Event {
    fn from(e: WithdrawEvent) -> Self {
        Event::Withdraw(e)
    }
}

impl From<OrderEvent> for Event {
    fn from(e: OrderEvent) -> Self {
        Event::Order(e)
    }
}

impl From<CancelEvent> for Event {
    fn from(e: CancelEvent) -> Self {
        Event::Cancel(e)
    }
}

impl From<TradeEvent> for Event {
    fn from(e: TradeEvent) -> Self {
        Event::Trade(e)
    }
}
