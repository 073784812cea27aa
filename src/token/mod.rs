//! External token collaborator.
//!
//! The exchange never owns token supply. Deposits pull tokens from the
//! depositor into the custody account with `transfer_from` (the depositor
//! must have approved the custody account as spender first), and
//! withdrawals push them back with `transfer`.
//!
//! Any `Err` from a collaborator aborts the ledger operation that triggered
//! it. Implementations that report plain success flags should map `false`
//! to an error.
//!
//! ## Components
//!
//! - [`Token`]: The collaborator contract
//! - [`MemoryToken`]: In-memory ERC20-style token for tests and demos

pub mod memory;

pub use memory::MemoryToken;

use crate::error::TokenError;
use crate::types::{Address, Amount};

/// ERC20-style token as seen by the exchange.
pub trait Token {
    /// Identity of the token contract; keys custody balances.
    fn address(&self) -> Address;

    /// Move `amount` from `from` (the caller) to `to`.
    fn transfer(&mut self, from: &Address, to: &Address, amount: Amount) -> Result<(), TokenError>;

    /// Move `amount` from `from` to `to` on behalf of `spender`, consuming
    /// allowance previously granted by `from`.
    fn transfer_from(
        &mut self,
        spender: &Address,
        from: &Address,
        to: &Address,
        amount: Amount,
    ) -> Result<(), TokenError>;

    /// External balance of `owner`.
    fn balance_of(&self, owner: &Address) -> Amount;

    /// Remaining amount `spender` may move out of `owner`.
    fn allowance(&self, owner: &Address, spender: &Address) -> Amount;
}
