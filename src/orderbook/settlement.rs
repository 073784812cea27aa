//! Fee-adjusted atomic swap.
//!
//! ## Algorithm
//!
//! For an order `(token_get, amount_get, token_give, amount_give)` created by
//! `creator` and filled by `filler`:
//!
//! 1. `fee = amount_get * fee_percent / 100`, truncating
//! 2. require `filler` holds `amount_get + fee` of `token_get`
//! 3. debit `amount_get + fee` of `token_get` from `filler`
//! 4. credit `amount_get` of `token_get` to `creator`
//! 5. credit `fee` of `token_get` to the fee account
//! 6. require `creator` holds `amount_give` of `token_give`
//! 7. debit `amount_give` of `token_give` from `creator`
//! 8. credit `amount_give` of `token_give` to `filler`
//!
//! The fee is only ever charged on the filler's `token_get` leg.
//!
//! All steps run against an [`Overlay`](crate::ledger::Overlay); the caller
//! commits the returned writes only if every step succeeded. Step 6 sees the
//! results of steps 3-5, which matters for self-fills and orders whose two
//! legs name the same token.

use crate::error::{ExchangeError, Result};
use crate::ledger::{Ledger, StagedWrites};
use crate::types::{Address, Amount, Order};

/// Protocol fee: who receives it and how much of `amount_get` it is.
///
/// Fixed at construction of the exchange.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FeeSchedule {
    /// Identity credited with every fee
    pub account: Address,
    /// Whole percent of `amount_get`
    pub percent: u64,
}

impl FeeSchedule {
    pub fn new(account: Address, percent: u64) -> Self {
        Self { account, percent }
    }

    /// Fee on a fill of `amount_get`: `amount_get * percent / 100`, truncated.
    ///
    /// ```
    /// use custody_exchange::orderbook::FeeSchedule;
    ///
    /// let fees = FeeSchedule::new([0u8; 32], 10);
    /// assert_eq!(fees.fee_for(10).unwrap(), 1);
    /// assert_eq!(fees.fee_for(19).unwrap(), 1);
    /// assert_eq!(fees.fee_for(9).unwrap(), 0);
    /// ```
    pub fn fee_for(&self, amount_get: Amount) -> Result<Amount> {
        amount_get
            .checked_mul(Amount::from(self.percent))
            .map(|scaled| scaled / 100)
            .ok_or(ExchangeError::Overflow)
    }
}

/// Amounts moved by one settlement.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SettlementSummary {
    /// Protocol fee credited to the fee account
    pub fee: Amount,
    /// Total `token_get` taken from the filler (`amount_get + fee`)
    pub filler_cost: Amount,
}

/// Stage the eight settlement steps for `order` filled by `filler`.
///
/// Returns the writes to commit and the amounts involved. On error nothing
/// has been applied to `ledger`.
pub fn settle(
    ledger: &Ledger,
    order: &Order,
    filler: &Address,
    fees: &FeeSchedule,
) -> Result<(StagedWrites, SettlementSummary)> {
    let fee = fees.fee_for(order.amount_get)?;
    let filler_cost = order
        .amount_get
        .checked_add(fee)
        .ok_or(ExchangeError::Overflow)?;

    let mut overlay = ledger.stage();

    overlay.require(&order.token_get, filler, filler_cost)?;
    overlay.debit(&order.token_get, filler, filler_cost)?;
    overlay.credit(&order.token_get, &order.creator, order.amount_get)?;
    overlay.credit(&order.token_get, &fees.account, fee)?;

    overlay.require(&order.token_give, &order.creator, order.amount_give)?;
    overlay.debit(&order.token_give, &order.creator, order.amount_give)?;
    overlay.credit(&order.token_give, filler, order.amount_give)?;

    Ok((overlay.into_writes(), SettlementSummary { fee, filler_cost }))
}
