//! # Custody Exchange
//!
//! Custodial token exchange: users deposit tokens into custody, post
//! standing swap orders, and counter-parties fill those orders by id. Each
//! fill is a fee-adjusted atomic swap settled against the custody ledger.
//!
//! ## Architecture
//!
//! - **Types**: Core records (Order, events, StateReceipt)
//! - **Token**: External token collaborator and an in-memory implementation
//! - **Ledger**: (token, owner) balances and the deposit/withdraw boundary
//! - **OrderBook**: Slab-backed order table, cancel/fill lifecycle, settlement
//! - **Engine**: `Exchange` state machine and the lock-guarded `SharedExchange`
//!
//! ## Design Principles
//!
//! 1. **Determinism**: Identical operation sequences produce identical state roots
//! 2. **Integer Amounts**: Balances are `u128` in smallest token units, checked arithmetic
//! 3. **Atomicity**: Every operation either fully applies or changes nothing
//! 4. **Custody Invariant**: Ledger totals never exceed what custody holds at the token

// ============================================================================
// Module declarations
// ============================================================================

/// Core data types: Order, events, StateReceipt
pub mod types;

/// Error taxonomy
pub mod error;

/// Exchange configuration
pub mod config;

/// Token collaborator interface
pub mod token;

/// Custodial balance ledger
pub mod ledger;

/// Order book and settlement
pub mod orderbook;

/// Exchange engine
pub mod engine;

// ============================================================================
// Re-exports for convenience
// ============================================================================

pub use config::{ConfigError, ExchangeConfig};
pub use engine::{Exchange, SharedExchange};
pub use error::{ExchangeError, TokenError};
pub use ledger::Ledger;
pub use orderbook::{FeeSchedule, OrderBook};
pub use token::{MemoryToken, Token};
pub use types::{Address, Amount, Event, Order, OrderId, OrderStatus, StateReceipt};
