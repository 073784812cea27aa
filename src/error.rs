//! Error taxonomy for the exchange core.
//!
//! Every operation is all-or-nothing: when one of these errors is returned,
//! balances, order status and the id counter are exactly as they were
//! before the call.

use thiserror::Error;

use crate::types::{short_hex, Address, Amount, OrderId, OrderStatus};

/// Failure reported by a [`Token`](crate::token::Token) collaborator.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TokenError {
    #[error("insufficient token balance: required {required}, available {available}")]
    InsufficientBalance { required: Amount, available: Amount },

    #[error("insufficient allowance: required {required}, approved {approved}")]
    InsufficientAllowance { required: Amount, approved: Amount },

    #[error("token transfers are frozen")]
    Frozen,

    #[error("token balance overflow")]
    Overflow,
}

/// Failure of an exchange operation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ExchangeError {
    /// Custody balance (or, for deposits, the external balance/allowance)
    /// does not cover the amount.
    #[error(
        "insufficient balance of token {} for {}: required {required}, available {available}",
        short_hex(.token),
        short_hex(.owner)
    )]
    InsufficientBalance {
        token: Address,
        owner: Address,
        required: Amount,
        available: Amount,
    },

    #[error("order {0} not found")]
    NotFound(OrderId),

    #[error("{} is not the creator of order {order_id}", short_hex(.caller))]
    Unauthorized { order_id: OrderId, caller: Address },

    #[error("order {order_id} is already {status}")]
    AlreadyFinalized { order_id: OrderId, status: OrderStatus },

    #[error("transfer of token {} failed: {source}", short_hex(.token))]
    ExternalTransferFailed {
        token: Address,
        #[source]
        source: TokenError,
    },

    #[error("arithmetic overflow")]
    Overflow,

    #[error("state encoding failed: {0}")]
    Encoding(String),
}

impl ExchangeError {
    /// Map a token failure during a deposit or withdrawal.
    ///
    /// Balance and allowance shortfalls reported by the token surface as
    /// [`ExchangeError::InsufficientBalance`] for `owner`; anything else is
    /// an external transfer failure.
    pub fn from_token(token: Address, owner: Address, err: TokenError) -> Self {
        match err {
            TokenError::InsufficientBalance { required, available } => {
                ExchangeError::InsufficientBalance { token, owner, required, available }
            }
            TokenError::InsufficientAllowance { required, approved } => {
                ExchangeError::InsufficientBalance { token, owner, required, available: approved }
            }
            other => ExchangeError::ExternalTransferFailed { token, source: other },
        }
    }
}

pub type Result<T> = std::result::Result<T, ExchangeError>;
