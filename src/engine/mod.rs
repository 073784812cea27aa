//! Exchange engine: ties the ledger, the order book and the fee schedule
//! together behind one set of operations.
//!
//! ## Design Principles
//!
//! 1. **Determinism**: Same operation sequence, same state root
//! 2. **All-or-nothing**: A failed operation changes nothing
//! 3. **Serialized**: One operation at a time per exchange
//! 4. **Events as output**: Every state change returns and journals an event
//!
//! ## Example
//!
//! ```
//! use custody_exchange::config::ExchangeConfig;
//! use custody_exchange::engine::Exchange;
//! use custody_exchange::token::{MemoryToken, Token};
//! use custody_exchange::types::address_from_label;
//!
//! let alice = address_from_label("alice");
//! let bob = address_from_label("bob");
//! let mut x = MemoryToken::new("Token X", "X", 100, alice);
//! let mut y = MemoryToken::new("Token Y", "Y", 100, bob);
//! let mut exchange = Exchange::new(ExchangeConfig::default());
//! let custody = *exchange.custody();
//!
//! x.approve(&alice, &custody, 10);
//! exchange.deposit(&mut x, &alice, 10).unwrap();
//! y.approve(&bob, &custody, 11);
//! exchange.deposit(&mut y, &bob, 11).unwrap();
//!
//! let order = exchange.make_order(&alice, &y.address(), 10, &x.address(), 10, 1_000);
//! exchange.fill_order(&bob, order.id, 1_001).unwrap();
//!
//! assert_eq!(exchange.balance_of(&x.address(), &bob), 10);
//! assert_eq!(exchange.balance_of(&y.address(), &alice), 10);
//! assert_eq!(exchange.balance_of(&y.address(), exchange.fee_account()), 1);
//! ```

pub mod exchange;
pub mod shared;

pub use exchange::Exchange;
pub use shared::{unix_now, SharedExchange};
