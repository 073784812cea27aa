//! In-memory ERC20-style token.
//!
//! Mirrors the token contract the exchange is deployed against: a fixed
//! supply minted to the deployer, per-owner balances, per-(owner, spender)
//! allowances. `set_frozen` turns every transfer into a failure, which is
//! how tests exercise the exchange's rollback paths.

use std::collections::HashMap;

use tracing::trace;

use crate::error::TokenError;
use crate::token::Token;
use crate::types::units::{to_base_units, DEFAULT_DECIMALS};
use crate::types::{address_from_label, Address, Amount};

#[derive(Debug, Clone)]
pub struct MemoryToken {
    address: Address,
    name: String,
    symbol: String,
    decimals: u32,
    total_supply: Amount,
    balances: HashMap<Address, Amount>,
    allowances: HashMap<(Address, Address), Amount>,
    frozen: bool,
}

impl MemoryToken {
    /// Deploy a token with 18 decimals, minting `total_supply` smallest
    /// units to `deployer`.
    ///
    /// The token address is derived from the symbol.
    pub fn new(name: &str, symbol: &str, total_supply: Amount, deployer: Address) -> Self {
        Self::with_decimals(name, symbol, DEFAULT_DECIMALS, total_supply, deployer)
    }

    pub fn with_decimals(
        name: &str,
        symbol: &str,
        decimals: u32,
        total_supply: Amount,
        deployer: Address,
    ) -> Self {
        let mut balances = HashMap::new();
        balances.insert(deployer, total_supply);

        Self {
            address: address_from_label(&format!("token:{symbol}")),
            name: name.to_string(),
            symbol: symbol.to_string(),
            decimals,
            total_supply,
            balances,
            allowances: HashMap::new(),
            frozen: false,
        }
    }

    /// Deploy with a supply given in whole tokens ("1000000").
    ///
    /// Returns None if the supply string does not convert.
    pub fn with_whole_supply(
        name: &str,
        symbol: &str,
        supply: &str,
        deployer: Address,
    ) -> Option<Self> {
        let total_supply = to_base_units(supply, DEFAULT_DECIMALS)?;
        Some(Self::new(name, symbol, total_supply, deployer))
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    pub fn decimals(&self) -> u32 {
        self.decimals
    }

    pub fn total_supply(&self) -> Amount {
        self.total_supply
    }

    /// Allow `spender` to move up to `amount` of `owner`'s tokens.
    /// Overwrites any previous allowance.
    pub fn approve(&mut self, owner: &Address, spender: &Address, amount: Amount) {
        self.allowances.insert((*owner, *spender), amount);
    }

    /// Make every subsequent transfer fail with [`TokenError::Frozen`].
    pub fn set_frozen(&mut self, frozen: bool) {
        self.frozen = frozen;
    }

    fn move_balance(
        &mut self,
        from: &Address,
        to: &Address,
        amount: Amount,
    ) -> Result<(), TokenError> {
        if self.frozen {
            return Err(TokenError::Frozen);
        }

        let available = self.balance_of(from);
        if available < amount {
            return Err(TokenError::InsufficientBalance { required: amount, available });
        }
        if from == to {
            return Ok(());
        }

        let credited = self
            .balance_of(to)
            .checked_add(amount)
            .ok_or(TokenError::Overflow)?;
        self.balances.insert(*from, available - amount);
        self.balances.insert(*to, credited);

        trace!(symbol = %self.symbol, amount, "token transfer");
        Ok(())
    }
}

impl Token for MemoryToken {
    fn address(&self) -> Address {
        self.address
    }

    fn transfer(&mut self, from: &Address, to: &Address, amount: Amount) -> Result<(), TokenError> {
        self.move_balance(from, to, amount)
    }

    fn transfer_from(
        &mut self,
        spender: &Address,
        from: &Address,
        to: &Address,
        amount: Amount,
    ) -> Result<(), TokenError> {
        let approved = self.allowance(from, spender);
        if approved < amount {
            return Err(TokenError::InsufficientAllowance { required: amount, approved });
        }

        self.move_balance(from, to, amount)?;
        self.allowances.insert((*from, *spender), approved - amount);
        Ok(())
    }

    fn balance_of(&self, owner: &Address) -> Amount {
        self.balances.get(owner).copied().unwrap_or(0)
    }

    fn allowance(&self, owner: &Address, spender: &Address) -> Amount {
        self.allowances.get(&(*owner, *spender)).copied().unwrap_or(0)
    }
}
