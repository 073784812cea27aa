//! The exchange state machine.

use tracing::{info, warn};

use crate::config::ExchangeConfig;
use crate::error::{ExchangeError, Result};
use crate::ledger::Ledger;
use crate::orderbook::{FeeSchedule, OrderBook};
use crate::token::Token;
use crate::types::{
    short_hex, Address, Amount, CancelEvent, DepositEvent, Event, Order, OrderEvent, OrderId,
    OrderStatus, StateReceipt, TradeEvent, WithdrawEvent,
};

/// Ledger + order book + event journal of one exchange deployment.
///
/// All mutation goes through `&mut self`, so a single owner (or the lock in
/// [`SharedExchange`](crate::engine::SharedExchange)) serializes operations.
/// Timestamps are supplied by the caller, which keeps replays deterministic.
#[derive(Debug, Clone)]
pub struct Exchange {
    config: ExchangeConfig,
    fees: FeeSchedule,
    ledger: Ledger,
    book: OrderBook,
    journal: Vec<Event>,
}

impl Exchange {
    pub fn new(config: ExchangeConfig) -> Self {
        Self::with_capacity(config, 0)
    }

    /// Exchange with pre-allocated order slots.
    pub fn with_capacity(config: ExchangeConfig, order_capacity: usize) -> Self {
        info!(
            fee_account = %short_hex(&config.fee_account),
            fee_percent = config.fee_percent,
            custody = %short_hex(&config.custody),
            "exchange initialized"
        );
        Self {
            fees: config.fee_schedule(),
            config,
            ledger: Ledger::new(),
            book: OrderBook::with_capacity(order_capacity),
            journal: Vec::new(),
        }
    }

    // ========================================================================
    // Configuration
    // ========================================================================

    pub fn config(&self) -> &ExchangeConfig {
        &self.config
    }

    pub fn fee_account(&self) -> &Address {
        &self.config.fee_account
    }

    pub fn fee_percent(&self) -> u64 {
        self.config.fee_percent
    }

    /// Identity that holds deposited tokens; depositors approve it.
    pub fn custody(&self) -> &Address {
        &self.config.custody
    }

    // ========================================================================
    // Ledger operations
    // ========================================================================

    /// Pull `amount` from `user` into custody and credit their balance.
    pub fn deposit<T: Token + ?Sized>(
        &mut self,
        token: &mut T,
        user: &Address,
        amount: Amount,
    ) -> Result<DepositEvent> {
        let custody = self.config.custody;
        let event = self.ledger.deposit(token, &custody, user, amount)?;
        self.journal.push(event.clone().into());
        Ok(event)
    }

    /// Debit `user` and push `amount` out of custody to them.
    pub fn withdraw<T: Token + ?Sized>(
        &mut self,
        token: &mut T,
        user: &Address,
        amount: Amount,
    ) -> Result<WithdrawEvent> {
        let custody = self.config.custody;
        let event = self.ledger.withdraw(token, &custody, user, amount)?;
        self.journal.push(event.clone().into());
        Ok(event)
    }

    /// Custody balance; zero for unknown pairs.
    #[inline]
    pub fn balance_of(&self, token: &Address, owner: &Address) -> Amount {
        self.ledger.balance_of(token, owner)
    }

    pub fn ledger(&self) -> &Ledger {
        &self.ledger
    }

    // ========================================================================
    // Order operations
    // ========================================================================

    /// Record an order. Never fails: balances are only checked at fill time.
    pub fn make_order(
        &mut self,
        creator: &Address,
        token_get: &Address,
        amount_get: Amount,
        token_give: &Address,
        amount_give: Amount,
        timestamp: u64,
    ) -> OrderEvent {
        let event = self
            .book
            .make_order(*creator, *token_get, amount_get, *token_give, amount_give, timestamp);
        self.journal.push(event.clone().into());
        event
    }

    pub fn cancel_order(
        &mut self,
        caller: &Address,
        id: OrderId,
        timestamp: u64,
    ) -> Result<CancelEvent> {
        let event = self
            .book
            .cancel_order(caller, id, timestamp)
            .inspect_err(|err| {
                warn!(id, caller = %short_hex(caller), error = %err, "cancel rejected")
            })?;
        self.journal.push(event.clone().into());
        Ok(event)
    }

    pub fn fill_order(
        &mut self,
        caller: &Address,
        id: OrderId,
        timestamp: u64,
    ) -> Result<TradeEvent> {
        let event = self
            .book
            .fill_order(&mut self.ledger, &self.fees, caller, id, timestamp)
            .inspect_err(|err| {
                warn!(id, caller = %short_hex(caller), error = %err, "fill rejected")
            })?;
        self.journal.push(event.clone().into());
        Ok(event)
    }

    // ========================================================================
    // Order queries
    // ========================================================================

    /// Highest issued order id.
    #[inline]
    pub fn order_count(&self) -> u64 {
        self.book.order_count()
    }

    pub fn order(&self, id: OrderId) -> Option<&Order> {
        self.book.get(id)
    }

    pub fn status(&self, id: OrderId) -> Option<OrderStatus> {
        self.book.status(id)
    }

    pub fn is_cancelled(&self, id: OrderId) -> bool {
        self.book.is_cancelled(id)
    }

    pub fn is_filled(&self, id: OrderId) -> bool {
        self.book.is_filled(id)
    }

    pub fn book(&self) -> &OrderBook {
        &self.book
    }

    // ========================================================================
    // Events
    // ========================================================================

    /// Events not yet drained, oldest first.
    pub fn events(&self) -> &[Event] {
        &self.journal
    }

    /// Hand all pending events to the caller and clear the journal.
    pub fn drain_events(&mut self) -> Vec<Event> {
        std::mem::take(&mut self.journal)
    }

    // ========================================================================
    // State root
    // ========================================================================

    /// SHA-256 over every order (SSZ) with its status, then every balance
    /// entry in (token, owner) order.
    pub fn state_root(&self) -> Result<[u8; 32]> {
        let mut data =
            Vec::with_capacity(self.book.order_count() as usize * 145 + self.ledger.len() * 80);

        for order in self.book.iter() {
            let bytes = ssz_rs::serialize(order)
                .map_err(|err| ExchangeError::Encoding(err.to_string()))?;
            data.extend_from_slice(&bytes);
            data.push(match self.book.status(order.id) {
                Some(OrderStatus::Cancelled) => 1,
                Some(OrderStatus::Filled) => 2,
                _ => 0,
            });
        }

        for (key, amount) in self.ledger.iter() {
            data.extend_from_slice(&key.token);
            data.extend_from_slice(&key.owner);
            data.extend_from_slice(&amount.to_le_bytes());
        }

        Ok(StateReceipt::compute_hash(&data))
    }

    /// Counters and state root at `timestamp`.
    pub fn receipt(&self, timestamp: u64) -> Result<StateReceipt> {
        Ok(StateReceipt::new(
            self.book.order_count(),
            self.book.filled_count(),
            self.book.cancelled_count(),
            self.state_root()?,
            timestamp,
        ))
    }
}

impl Default for Exchange {
    fn default() -> Self {
        Self::new(ExchangeConfig::default())
    }
}

// ============================================================================
// Unit Tests
// ============================================================================
