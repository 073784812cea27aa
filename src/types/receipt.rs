//! State receipt summarizing the exchange at a point in time.
//!
//! The receipt carries counters and a SHA-256 state root so that two
//! replicas replaying the same operation sequence can compare state
//! without shipping the full ledger.

use ssz_rs::prelude::*;
use sha2::{Sha256, Digest};

/// Summary of the exchange state.
///
/// ## State Root
///
/// The 32-byte state root is a SHA-256 hash over each order's SSZ bytes
/// followed by a status byte (0 open, 1 cancelled, 2 filled), then every
/// balance entry in (token, owner) order. See `Exchange::state_root`.
///
/// ## Example
///
/// ```
/// use custody_exchange::types::StateReceipt;
///
/// let receipt = StateReceipt::new(
///     12,                     // order_count
///     5,                      // filled_count
///     2,                      // cancelled_count
///     [0u8; 32],              // state_root (would be computed)
///     1_700_000_000,          // timestamp
/// );
/// assert_eq!(receipt.open_count(), 5);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Default, SimpleSerialize)]
pub struct StateReceipt {
    /// Highest issued order id
    pub order_count: u64,

    /// Orders in the filled set
    pub filled_count: u64,

    /// Orders in the cancelled set
    pub cancelled_count: u64,

    /// SHA-256 over the encoded exchange state
    pub state_root: [u8; 32],

    /// Time the receipt was taken, unix seconds
    pub timestamp: u64,
}

impl StateReceipt {
    pub fn new(
        order_count: u64,
        filled_count: u64,
        cancelled_count: u64,
        state_root: [u8; 32],
        timestamp: u64,
    ) -> Self {
        Self {
            order_count,
            filled_count,
            cancelled_count,
            state_root,
            timestamp,
        }
    }

    /// Compute SHA-256 hash of the given data
    pub fn compute_hash(data: &[u8]) -> [u8; 32] {
        let mut hasher = Sha256::new();
        hasher.update(data);
        let result = hasher.finalize();

        let mut hash = [0u8; 32];
        hash.copy_from_slice(&result);
        hash
    }

    /// Get the state root as a hex string
    pub fn state_root_hex(&self) -> String {
        hex::encode(self.state_root)
    }

    /// Orders neither cancelled nor filled.
    pub fn open_count(&self) -> u64 {
        self.order_count
            .saturating_sub(self.filled_count)
            .saturating_sub(self.cancelled_count)
    }
}

// ============================================================================
// Unit Tests
// ============================================================================
