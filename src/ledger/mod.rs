//! Custodial balance ledger.
//!
//! ## Architecture
//!
//! The ledger maps (token, owner) to an amount in the token's smallest unit.
//! Absent entries read as zero, so nobody has to be registered before their
//! first deposit. Entries are never removed.
//!
//! - [`Ledger`]: The balance table plus the deposit/withdraw boundary with
//!   the external [`Token`](crate::token::Token)
//! - [`Overlay`]: Staged view used by settlement to apply several
//!   debits/credits as one unit
//!
//! ## Custody Invariant
//!
//! For every token, the sum of custody balances never exceeds what the
//! custody account actually holds at the token. Deposits credit only after
//! the token reports a successful pull; withdrawals debit first and put the
//! balance back if the push fails.
//!
//! ## Example
//!
//! ```
//! use custody_exchange::ledger::Ledger;
//! use custody_exchange::token::{MemoryToken, Token};
//! use custody_exchange::types::address_from_label;
//!
//! let alice = address_from_label("alice");
//! let custody = address_from_label("custody");
//! let mut token = MemoryToken::new("Token X", "X", 100, alice);
//! let mut ledger = Ledger::new();
//!
//! token.approve(&alice, &custody, 40);
//! let event = ledger.deposit(&mut token, &custody, &alice, 40).unwrap();
//!
//! assert_eq!(event.balance, 40);
//! assert_eq!(ledger.balance_of(&token.address(), &alice), 40);
//! assert_eq!(token.balance_of(&custody), 40);
//! ```

pub mod overlay;

pub use overlay::{Overlay, StagedWrites};

use std::collections::BTreeMap;

use tracing::{debug, warn};

use crate::error::{ExchangeError, Result};
use crate::token::Token;
use crate::types::{short_hex, Address, Amount, DepositEvent, WithdrawEvent};

/// Composite key of the balance table.
///
/// Ordered by token, then owner; the state root walks balances in this order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct BalanceKey {
    pub token: Address,
    pub owner: Address,
}

impl BalanceKey {
    pub fn new(token: Address, owner: Address) -> Self {
        Self { token, owner }
    }
}

/// Per-(token, owner) custody balances.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Ledger {
    balances: BTreeMap<BalanceKey, Amount>,
}

impl Ledger {
    pub fn new() -> Self {
        Self::default()
    }

    // ========================================================================
    // Reads
    // ========================================================================

    /// Custody balance of `owner` in `token`; zero when never touched.
    #[inline]
    pub fn balance_of(&self, token: &Address, owner: &Address) -> Amount {
        self.balances
            .get(&BalanceKey::new(*token, *owner))
            .copied()
            .unwrap_or(0)
    }

    /// Sum of all custody balances held in `token`.
    ///
    /// Saturates instead of overflowing; a correct ledger never gets near.
    pub fn total_for(&self, token: &Address) -> Amount {
        self.balances
            .iter()
            .filter(|(key, _)| key.token == *token)
            .fold(0u128, |acc, (_, amount)| acc.saturating_add(*amount))
    }

    /// All balance entries in key order.
    pub fn iter(&self) -> impl Iterator<Item = (&BalanceKey, &Amount)> {
        self.balances.iter()
    }

    /// Number of (token, owner) entries ever touched.
    #[inline]
    pub fn len(&self) -> usize {
        self.balances.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.balances.is_empty()
    }

    // ========================================================================
    // Deposit / Withdraw
    // ========================================================================

    /// Pull `amount` of `token` from `depositor` into `custody` and credit it.
    ///
    /// The depositor must have approved `custody` for at least `amount`.
    /// Fails without touching the ledger if the pull fails.
    pub fn deposit<T: Token + ?Sized>(
        &mut self,
        token: &mut T,
        custody: &Address,
        depositor: &Address,
        amount: Amount,
    ) -> Result<DepositEvent> {
        let token_id = token.address();
        let balance = self
            .balance_of(&token_id, depositor)
            .checked_add(amount)
            .ok_or(ExchangeError::Overflow)?;

        if let Err(err) = token.transfer_from(custody, depositor, custody, amount) {
            warn!(
                token = %short_hex(&token_id),
                user = %short_hex(depositor),
                amount,
                error = %err,
                "deposit rejected by token"
            );
            return Err(ExchangeError::from_token(token_id, *depositor, err));
        }

        self.balances.insert(BalanceKey::new(token_id, *depositor), balance);
        debug!(
            token = %short_hex(&token_id),
            user = %short_hex(depositor),
            amount,
            balance,
            "deposit"
        );

        Ok(DepositEvent {
            token: token_id,
            user: *depositor,
            amount,
            balance,
        })
    }

    /// Debit `amount` of `token` from `withdrawer` and push it out of
    /// `custody` to them.
    ///
    /// If the push fails the debit is reverted before the error is returned.
    pub fn withdraw<T: Token + ?Sized>(
        &mut self,
        token: &mut T,
        custody: &Address,
        withdrawer: &Address,
        amount: Amount,
    ) -> Result<WithdrawEvent> {
        let token_id = token.address();
        let key = BalanceKey::new(token_id, *withdrawer);
        let available = self.balance_of(&token_id, withdrawer);
        if available < amount {
            return Err(ExchangeError::InsufficientBalance {
                token: token_id,
                owner: *withdrawer,
                required: amount,
                available,
            });
        }

        let balance = available - amount;
        let debit = PendingDebit::apply(&mut self.balances, key, available, balance);

        if let Err(err) = token.transfer(custody, withdrawer, amount) {
            drop(debit);
            warn!(
                token = %short_hex(&token_id),
                user = %short_hex(withdrawer),
                amount,
                error = %err,
                "withdrawal reverted"
            );
            return Err(ExchangeError::ExternalTransferFailed {
                token: token_id,
                source: err,
            });
        }
        debit.keep();

        debug!(
            token = %short_hex(&token_id),
            user = %short_hex(withdrawer),
            amount,
            balance,
            "withdraw"
        );

        Ok(WithdrawEvent {
            token: token_id,
            user: *withdrawer,
            amount,
            balance,
        })
    }

    // ========================================================================
    // Staged updates (settlement)
    // ========================================================================

    /// Start a staged view over the current balances.
    pub fn stage(&self) -> Overlay<'_> {
        Overlay::new(self)
    }

    /// Apply staged writes produced by an [`Overlay`] over this ledger.
    pub fn commit(&mut self, staged: StagedWrites) {
        for (key, amount) in staged.into_entries() {
            self.balances.insert(key, amount);
        }
    }
}

/// A withdrawal debit that is rolled back unless kept.
///
/// Dropping it, including while unwinding out of a panicking token, puts
/// the original balance back.
struct PendingDebit<'a> {
    balances: &'a mut BTreeMap<BalanceKey, Amount>,
    key: BalanceKey,
    original: Amount,
    kept: bool,
}

impl<'a> PendingDebit<'a> {
    fn apply(
        balances: &'a mut BTreeMap<BalanceKey, Amount>,
        key: BalanceKey,
        original: Amount,
        debited: Amount,
    ) -> Self {
        balances.insert(key, debited);
        Self {
            balances,
            key,
            original,
            kept: false,
        }
    }

    fn keep(mut self) {
        self.kept = true;
    }
}

impl Drop for PendingDebit<'_> {
    fn drop(&mut self) {
        if !self.kept {
            self.balances.insert(self.key, self.original);
        }
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

    struct Setup {
        ledger: Ledger,
        token: MemoryToken,
        custody: Address,
        user: Address,
    }

    fn setup() -> Setup {
        let user = address_from_label("user1");
        Setup {
            ledger: Ledger::new(),
            token: MemoryToken::new("Nav Token", "NAVT", 100, user),
            custody: address_from_label("custody"),
            user,
        }
    }

    #[test]
    fn test_unknown_balance_is_zero() {
        let ledger = Ledger::new();
        let a = address_from_label("a");
        assert_eq!(ledger.balance_of(&a, &a), 0);
        assert!(ledger.is_empty());
    }

    #[test]
    fn test_deposit_tracks_balance() {
        let mut s = setup();
        s.token.approve(&s.user, &s.custody, 10);

        let event = s.ledger.deposit(&mut s.token, &s.custody, &s.user, 10).unwrap();

        assert_eq!(event.amount, 10);
        assert_eq!(event.balance, 10);
        assert_eq!(s.ledger.balance_of(&s.token.address(), &s.user), 10);
        assert_eq!(s.token.balance_of(&s.custody), 10);
    }

    #[test]
    fn test_deposit_without_approval_fails() {
        let mut s = setup();

        let err = s.ledger.deposit(&mut s.token, &s.custody, &s.user, 10).unwrap_err();

        assert!(matches!(
            err,
            ExchangeError::InsufficientBalance { required: 10, available: 0, .. }
        ));
        assert_eq!(s.ledger.balance_of(&s.token.address(), &s.user), 0);
        assert!(s.ledger.is_empty());
    }

    #[test]
    fn test_deposit_more_than_external_balance_fails() {
        let mut s = setup();
        s.token.approve(&s.user, &s.custody, 500);

        let err = s.ledger.deposit(&mut s.token, &s.custody, &s.user, 500).unwrap_err();

        assert!(matches!(err, ExchangeError::InsufficientBalance { available: 100, .. }));
        assert_eq!(s.token.balance_of(&s.user), 100);
    }

    #[test]
    fn test_withdraw_returns_funds() {
        let mut s = setup();
        s.token.approve(&s.user, &s.custody, 10);
        s.ledger.deposit(&mut s.token, &s.custody, &s.user, 10).unwrap();

        let event = s.ledger.withdraw(&mut s.token, &s.custody, &s.user, 10).unwrap();

        assert_eq!(event.balance, 0);
        assert_eq!(s.ledger.balance_of(&s.token.address(), &s.user), 0);
        assert_eq!(s.token.balance_of(&s.custody), 0);
        assert_eq!(s.token.balance_of(&s.user), 100);
    }

    #[test]
    fn test_withdraw_insufficient_balance() {
        let mut s = setup();

        let err = s.ledger.withdraw(&mut s.token, &s.custody, &s.user, 1).unwrap_err();

        assert_eq!(
            err,
            ExchangeError::InsufficientBalance {
                token: s.token.address(),
                owner: s.user,
                required: 1,
                available: 0,
            }
        );
    }

    #[test]
    fn test_withdraw_reverts_when_token_fails() {
        let mut s = setup();
        s.token.approve(&s.user, &s.custody, 10);
        s.ledger.deposit(&mut s.token, &s.custody, &s.user, 10).unwrap();
        s.token.set_frozen(true);

        let err = s.ledger.withdraw(&mut s.token, &s.custody, &s.user, 4).unwrap_err();

        assert!(matches!(
            err,
            ExchangeError::ExternalTransferFailed { source: TokenError::Frozen, .. }
        ));
        assert_eq!(s.ledger.balance_of(&s.token.address(), &s.user), 10);
        assert_eq!(s.token.balance_of(&s.custody), 10);
    }

    /// Token whose outbound transfers panic.
    struct PanickingToken(MemoryToken);

    impl Token for PanickingToken {
        fn address(&self) -> Address {
            self.0.address()
        }

        fn transfer(
            &mut self,
            _: &Address,
            _: &Address,
            _: Amount,
        ) -> std::result::Result<(), TokenError> {
            panic!("token transfer blew up");
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

    #[test]
    fn test_withdraw_restores_balance_when_token_panics() {
        let s = setup();
        let (mut ledger, custody, user) = (s.ledger, s.custody, s.user);
        let mut token = PanickingToken(s.token);
        token.0.approve(&user, &custody, 100);
        ledger.deposit(&mut token, &custody, &user, 100).unwrap();

        let outcome = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            ledger.withdraw(&mut token, &custody, &user, 40)
        }));

        assert!(outcome.is_err());
        assert_eq!(ledger.balance_of(&token.address(), &user), 100);
        assert_eq!(ledger.total_for(&token.address()), token.balance_of(&custody));
    }

    #[test]
    fn test_total_for_token() {
        let mut s = setup();
        let other = address_from_label("user2");
        s.token.transfer(&s.user, &other, 30).unwrap();
        s.token.approve(&s.user, &s.custody, 20);
        s.token.approve(&other, &s.custody, 30);

        s.ledger.deposit(&mut s.token, &s.custody, &s.user, 20).unwrap();
        s.ledger.deposit(&mut s.token, &s.custody, &other, 30).unwrap();

        assert_eq!(s.ledger.total_for(&s.token.address()), 50);
        assert_eq!(s.ledger.total_for(&address_from_label("other-token")), 0);
        assert_eq!(s.ledger.len(), 2);
    }
}
