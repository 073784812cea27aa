//! Order book: order lifecycle and fill settlement.
//!
//! ## Architecture
//!
//! There is no automatic matching. An order is a standing intent; a
//! counter-party fills it explicitly by id, and the fill settles both legs
//! plus the protocol fee against the [`Ledger`](crate::ledger::Ledger) in
//! one atomic step.
//!
//! ## Components
//!
//! - [`OrderBook`]: Slab-backed order table with cancelled/filled sets
//! - [`FeeSchedule`]: Fee account and fee percent
//! - [`settle`]: The fee-adjusted swap, staged on a ledger overlay
//!
//! ## State Machine
//!
//! ```text
//! Open --cancel (creator)--> Cancelled
//! Open --fill (checks pass)--> Filled
//! Open --fill (checks fail)--> Open
//! ```
//!
//! | Operation | Complexity |
//! |-----------|------------|
//! | Make order | O(1) |
//! | Lookup by id | O(1) |
//! | Cancel | O(log n) |
//! | Fill | O(log n + log b) |

pub mod book;
pub mod settlement;

pub use book::OrderBook;
pub use settlement::{settle, FeeSchedule, SettlementSummary};
