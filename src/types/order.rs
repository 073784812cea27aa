//! Order record for the custodial order book.
//!
//! ## SSZ Serialization
//!
//! `Order` derives `SimpleSerialize` from ssz_rs. Every field is fixed-size,
//! so the encoding is a plain concatenation of little-endian fields and is
//! identical on every host. The state root hashes these bytes.
//!
//! ## Orders Are Intents
//!
//! An order does not reserve funds. The creator's `token_give` balance is
//! only checked when somebody fills the order.

use std::fmt;

use ssz_rs::prelude::*;

use crate::types::{Address, Amount, OrderId};

// ============================================================================
// OrderStatus
// ============================================================================

/// Lifecycle status of an order.
///
/// Derived from the book's cancelled/filled sets, never stored on the
/// order itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum OrderStatus {
    /// Neither cancelled nor filled
    #[default]
    Open,
    /// Cancelled by its creator (terminal)
    Cancelled,
    /// Filled by a counter-party (terminal)
    Filled,
}

impl OrderStatus {
    /// Cancelled and Filled are permanent.
    pub fn is_terminal(self) -> bool {
        !matches!(self, OrderStatus::Open)
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            OrderStatus::Open => "open",
            OrderStatus::Cancelled => "cancelled",
            OrderStatus::Filled => "filled",
        };
        f.write_str(s)
    }
}

// ============================================================================
// Order struct
// ============================================================================

/// A standing offer to exchange `amount_give` of `token_give` for
/// `amount_get` of `token_get`.
///
/// ## SSZ Layout
///
/// Fixed-size container of 144 bytes:
/// 8 (id) + 32 (creator) + 32 + 16 (get leg) + 32 + 16 (give leg) + 8 (timestamp)
///
/// ## Example
///
/// ```
/// use custody_exchange::types::{address_from_label, Order};
///
/// let alice = address_from_label("alice");
/// let usd = address_from_label("USD");
/// let eth = address_from_label("ETH");
///
/// // Alice wants 100 USD for 1 ETH
/// let order = Order::new(1, alice, usd, 100, eth, 1, 1_700_000_000);
/// assert_eq!(order.creator, alice);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Default, SimpleSerialize)]
pub struct Order {
    /// Sequential identifier, starting at 1
    pub id: OrderId,

    /// Identity that created the order; the only one allowed to cancel it
    pub creator: Address,

    /// Token the creator wants to receive
    pub token_get: Address,

    /// Amount of `token_get` the creator receives on fill (smallest units)
    pub amount_get: Amount,

    /// Token the creator offers
    pub token_give: Address,

    /// Amount of `token_give` the filler receives (smallest units)
    pub amount_give: Amount,

    /// Creation time, unix seconds
    pub timestamp: u64,
}

impl Order {
    /// Create a new order record.
    pub fn new(
        id: OrderId,
        creator: Address,
        token_get: Address,
        amount_get: Amount,
        token_give: Address,
        amount_give: Amount,
        timestamp: u64,
    ) -> Self {
        Self {
            id,
            creator,
            token_get,
            amount_get,
            token_give,
            amount_give,
            timestamp,
        }
    }

    /// Whether this order trades between `a` and `b`, in either direction.
    pub fn trades_pair(&self, a: &Address, b: &Address) -> bool {
        (self.token_get == *a && self.token_give == *b)
            || (self.token_get == *b && self.token_give == *a)
    }

    /// Both legs name the same token.
    pub fn is_self_referential(&self) -> bool {
        self.token_get == self.token_give
    }
}

// ============================================================================
// Unit Tests
// ============================================================================
