//! Account and token identities.
//!
//! Every participant in the exchange (users, the fee account, the custody
//! account, and token contracts themselves) is identified by a 32-byte
//! [`Address`]. Fixed-size byte arrays keep the SSZ layout of orders and
//! events fixed-size as well.

use sha2::{Digest, Sha256};

/// 32-byte identity of an account or token.
pub type Address = [u8; 32];

/// Derive a deterministic address from a human label.
///
/// Used by the demo binary and tests to give participants readable names.
///
/// ```
/// use custody_exchange::types::address_from_label;
///
/// assert_eq!(address_from_label("alice"), address_from_label("alice"));
/// assert_ne!(address_from_label("alice"), address_from_label("bob"));
/// ```
pub fn address_from_label(label: &str) -> Address {
    let mut hasher = Sha256::new();
    hasher.update(label.as_bytes());
    let digest = hasher.finalize();

    let mut address = [0u8; 32];
    address.copy_from_slice(&digest);
    address
}

/// Abbreviated hex form (`0xabcd…`) for log lines.
pub fn short_hex(address: &Address) -> String {
    format!("0x{}", hex::encode(&address[..4]))
}
