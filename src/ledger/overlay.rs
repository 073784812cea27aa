//! Staged balance updates.
//!
//! An [`Overlay`] reads through to the ledger and records writes locally.
//! Settlement runs all of its steps against the overlay; only when every
//! step succeeds are the writes handed back to [`Ledger::commit`]. Dropping
//! the overlay discards them, which is the rollback.
//!
//! Later steps observe earlier staged writes, so a sequence like
//! "credit A, then check A" behaves exactly as it would on the live ledger.

use std::collections::BTreeMap;

use crate::error::{ExchangeError, Result};
use crate::ledger::{BalanceKey, Ledger};
use crate::types::{Address, Amount};

/// Read-through, write-local view of a [`Ledger`].
#[derive(Debug)]
pub struct Overlay<'a> {
    base: &'a Ledger,
    writes: BTreeMap<BalanceKey, Amount>,
}

/// Writes produced by an overlay, ready to commit.
#[derive(Debug, Default)]
pub struct StagedWrites(BTreeMap<BalanceKey, Amount>);

impl StagedWrites {
    pub(crate) fn into_entries(self) -> impl Iterator<Item = (BalanceKey, Amount)> {
        self.0.into_iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<'a> Overlay<'a> {
    pub fn new(base: &'a Ledger) -> Self {
        Self {
            base,
            writes: BTreeMap::new(),
        }
    }

    /// Balance as seen through staged writes.
    pub fn balance_of(&self, token: &Address, owner: &Address) -> Amount {
        self.writes
            .get(&BalanceKey::new(*token, *owner))
            .copied()
            .unwrap_or_else(|| self.base.balance_of(token, owner))
    }

    /// Stage a debit; fails if the staged balance does not cover it.
    pub fn debit(&mut self, token: &Address, owner: &Address, amount: Amount) -> Result<Amount> {
        let available = self.balance_of(token, owner);
        let remaining = available
            .checked_sub(amount)
            .ok_or(ExchangeError::InsufficientBalance {
                token: *token,
                owner: *owner,
                required: amount,
                available,
            })?;
        self.writes.insert(BalanceKey::new(*token, *owner), remaining);
        Ok(remaining)
    }

    /// Stage a credit.
    pub fn credit(&mut self, token: &Address, owner: &Address, amount: Amount) -> Result<Amount> {
        let balance = self
            .balance_of(token, owner)
            .checked_add(amount)
            .ok_or(ExchangeError::Overflow)?;
        self.writes.insert(BalanceKey::new(*token, *owner), balance);
        Ok(balance)
    }

    /// Fail with `InsufficientBalance` unless the staged balance covers `amount`.
    pub fn require(&self, token: &Address, owner: &Address, amount: Amount) -> Result<()> {
        let available = self.balance_of(token, owner);
        if available < amount {
            return Err(ExchangeError::InsufficientBalance {
                token: *token,
                owner: *owner,
                required: amount,
                available,
            });
        }
        Ok(())
    }

    /// Finish staging and release the borrow on the ledger.
    pub fn into_writes(self) -> StagedWrites {
        StagedWrites(self.writes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::address_from_label;

    fn funded_ledger(token: &Address, owner: &Address, amount: Amount) -> Ledger {
        let mut ledger = Ledger::new();
        let mut overlay = ledger.stage();
        overlay.credit(token, owner, amount).unwrap();
        let writes = overlay.into_writes();
        ledger.commit(writes);
        ledger
    }

    #[test]
    fn test_overlay_reads_through() {
        let x = address_from_label("X");
        let a = address_from_label("a");
        let ledger = funded_ledger(&x, &a, 5);

        let overlay = ledger.stage();
        assert_eq!(overlay.balance_of(&x, &a), 5);
    }

    #[test]
    fn test_dropped_overlay_leaves_ledger_untouched() {
        let x = address_from_label("X");
        let a = address_from_label("a");
        let b = address_from_label("b");
        let ledger = funded_ledger(&x, &a, 5);

        {
            let mut overlay = ledger.stage();
            overlay.debit(&x, &a, 5).unwrap();
            overlay.credit(&x, &b, 5).unwrap();
            assert_eq!(overlay.balance_of(&x, &b), 5);
        }

        assert_eq!(ledger.balance_of(&x, &a), 5);
        assert_eq!(ledger.balance_of(&x, &b), 0);
    }

    #[test]
    fn test_debit_beyond_staged_balance_fails() {
        let x = address_from_label("X");
        let a = address_from_label("a");
        let ledger = funded_ledger(&x, &a, 5);

        let mut overlay = ledger.stage();
        overlay.debit(&x, &a, 3).unwrap();
        let err = overlay.debit(&x, &a, 3).unwrap_err();

        assert!(matches!(
            err,
            ExchangeError::InsufficientBalance { required: 3, available: 2, .. }
        ));
    }

    #[test]
    fn test_credit_overflow() {
        let x = address_from_label("X");
        let a = address_from_label("a");
        let ledger = funded_ledger(&x, &a, Amount::MAX);

        let mut overlay = ledger.stage();
        assert_eq!(overlay.credit(&x, &a, 1), Err(ExchangeError::Overflow));
    }

    #[test]
    fn test_commit_applies_writes() {
        let x = address_from_label("X");
        let a = address_from_label("a");
        let b = address_from_label("b");
        let mut ledger = funded_ledger(&x, &a, 5);

        let mut overlay = ledger.stage();
        overlay.debit(&x, &a, 2).unwrap();
        overlay.credit(&x, &b, 2).unwrap();
        overlay.require(&x, &b, 2).unwrap();
        let writes = overlay.into_writes();
        assert_eq!(writes.len(), 2);
        ledger.commit(writes);

        assert_eq!(ledger.balance_of(&x, &a), 3);
        assert_eq!(ledger.balance_of(&x, &b), 2);
    }
}
