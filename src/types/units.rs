//! Conversions between human-readable token amounts and smallest units.
//!
//! ## Overview
//!
//! The ledger never scales amounts: every balance is an integer count of the
//! token's smallest unit. Tokens declare how many decimals a whole unit has
//! (18 for ERC20-style tokens), and these helpers convert at the edges
//! (config files, the demo binary, log output).
//!
//! ## Examples
//!
//! ```
//! use custody_exchange::types::units::{to_base_units, from_base_units_trimmed};
//!
//! let amount = to_base_units("10.5", 18).unwrap();
//! assert_eq!(amount, 10_500_000_000_000_000_000);
//! assert_eq!(from_base_units_trimmed(amount, 18).unwrap(), "10.5");
//! ```

use std::str::FromStr;

use rust_decimal::prelude::*;
use rust_decimal::Decimal;

use crate::types::Amount;

/// Decimals used by ERC20-style tokens unless they say otherwise.
pub const DEFAULT_DECIMALS: u32 = 18;

/// Largest decimals value a `Decimal` scale can hold.
pub const MAX_DECIMALS: u32 = 28;

/// 10^decimals as a Decimal, or None when the scale is unsupported.
fn unit_factor(decimals: u32) -> Option<Decimal> {
    if decimals > MAX_DECIMALS {
        return None;
    }
    let factor = 10i128.checked_pow(decimals)?;
    Some(Decimal::from_i128_with_scale(factor, 0))
}

/// Convert a decimal string to smallest units.
///
/// Returns `None` if the string does not parse, is negative, or the result
/// does not fit. Digits beyond `decimals` are rounded.
///
/// ```
/// use custody_exchange::types::units::to_base_units;
///
/// assert_eq!(to_base_units("1", 6), Some(1_000_000));
/// assert_eq!(to_base_units("0.000001", 6), Some(1));
/// assert_eq!(to_base_units("-1", 6), None);
/// ```
pub fn to_base_units(s: &str, decimals: u32) -> Option<Amount> {
    let decimal = Decimal::from_str(s.trim()).ok()?;
    decimal_to_base_units(decimal, decimals)
}

/// Convert a Decimal to smallest units.
pub fn decimal_to_base_units(d: Decimal, decimals: u32) -> Option<Amount> {
    if d.is_sign_negative() {
        return None;
    }

    let scaled = d.checked_mul(unit_factor(decimals)?)?;
    scaled.round_dp(0).to_u128()
}

/// Convert smallest units to a Decimal with `decimals` fractional digits.
///
/// Returns `None` when the amount exceeds the 96-bit Decimal mantissa.
pub fn base_units_to_decimal(value: Amount, decimals: u32) -> Option<Decimal> {
    if decimals > MAX_DECIMALS {
        return None;
    }
    let signed = i128::try_from(value).ok()?;
    Decimal::try_from_i128_with_scale(signed, decimals).ok()
}

/// Format smallest units with all `decimals` fractional digits.
///
/// ```
/// use custody_exchange::types::units::from_base_units;
///
/// assert_eq!(from_base_units(1_500_000, 6).unwrap(), "1.500000");
/// ```
pub fn from_base_units(value: Amount, decimals: u32) -> Option<String> {
    base_units_to_decimal(value, decimals).map(|d| d.to_string())
}

/// Format smallest units with trailing zeros removed.
pub fn from_base_units_trimmed(value: Amount, decimals: u32) -> Option<String> {
    base_units_to_decimal(value, decimals).map(|d| d.normalize().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_to_base_units_basic() {
        assert_eq!(to_base_units("1", 18), Some(1_000_000_000_000_000_000));
        assert_eq!(to_base_units("0.5", 2), Some(50));
        assert_eq!(to_base_units("10000", 18), Some(10_000 * 10u128.pow(18)));
        assert_eq!(to_base_units(" 3 ", 0), Some(3));
    }

    #[test]
    fn test_to_base_units_edge_cases() {
        assert_eq!(to_base_units("0", 18), Some(0));
        assert_eq!(to_base_units("-0.1", 18), None);
        assert_eq!(to_base_units("abc", 18), None);
        assert_eq!(to_base_units("", 18), None);
        assert_eq!(to_base_units("1", 29), None);
    }

    #[test]
    fn test_rounding_below_smallest_unit() {
        assert_eq!(to_base_units("0.004", 2), Some(0));
        assert_eq!(to_base_units("0.006", 2), Some(1));
    }

    #[test]
    fn test_from_base_units() {
        assert_eq!(from_base_units(0, 2).unwrap(), "0.00");
        assert_eq!(from_base_units(12_345, 2).unwrap(), "123.45");
        assert_eq!(from_base_units_trimmed(1_000_000_000_000_000_000, 18).unwrap(), "1");
        assert_eq!(from_base_units_trimmed(1_100_000_000_000_000_000, 18).unwrap(), "1.1");
    }

    #[test]
    fn test_from_base_units_out_of_range() {
        assert_eq!(from_base_units(u128::MAX, 18), None);
    }

    #[test]
    fn test_precision_preserved() {
        let value = "123456789.123456789012345678";
        let units = to_base_units(value, 18).unwrap();
        assert_eq!(from_base_units(units, 18).unwrap(), value);
    }
}
