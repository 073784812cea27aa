//! Core data types for the custodial exchange
//!
//! All records implement SSZ serialization for deterministic encoding.
//! Amounts are unsigned integers in the token's smallest unit; the core
//! never applies decimal scaling.
//!
//! ## Types
//!
//! - [`Address`]: 32-byte identity of a user, account or token
//! - [`Order`]: A standing offer to swap one token for another
//! - [`OrderStatus`]: Open, Cancelled or Filled
//! - [`Event`]: Records emitted by state-changing operations
//! - [`StateReceipt`]: Counters plus a state root

mod address;
mod event;
mod order;
mod receipt;
pub mod units;

pub use address::{address_from_label, short_hex, Address};
pub use event::{CancelEvent, DepositEvent, Event, OrderEvent, TradeEvent, WithdrawEvent};
pub use order::{Order, OrderStatus};
pub use receipt::StateReceipt;

/// Token amount in the token's smallest unit.
pub type Amount = u128;

/// Order identifier, issued sequentially from 1.
pub type OrderId = u64;
