//! Exchange configuration.
//!
//! Fixed at construction and immutable afterwards. Can be built in code or
//! loaded from a JSON file:
//!
//! ```json
//! {
//!   "fee_account": "fees",
//!   "fee_percent": 10,
//!   "custody": "0x6a1d...64 hex chars"
//! }
//! ```
//!
//! Address fields take either `0x` followed by 64 hex characters, or any
//! other string, which is treated as a label (see
//! [`address_from_label`]).

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::orderbook::FeeSchedule;
use crate::types::{address_from_label, Address};

/// Label of the custody account when none is configured.
pub const DEFAULT_CUSTODY_LABEL: &str = "exchange:custody";

/// Label of the fee account when none is configured.
pub const DEFAULT_FEE_LABEL: &str = "exchange:fees";

/// Fee percent used by the original deployment.
pub const DEFAULT_FEE_PERCENT: u64 = 10;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse config: {0}")]
    Json(#[from] serde_json::Error),

    #[error("fee percent must be at most 100, got {0}")]
    InvalidFeePercent(u64),

    #[error("invalid address {0:?}: expected 0x followed by 64 hex characters")]
    InvalidAddress(String),
}

/// On-disk form of [`ExchangeConfig`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfigFile {
    pub fee_account: String,
    pub fee_percent: u64,
    #[serde(default)]
    pub custody: Option<String>,
}

/// Validated exchange configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExchangeConfig {
    /// Identity credited with every fill fee
    pub fee_account: Address,
    /// Whole percent of `amount_get` charged to the filler
    pub fee_percent: u64,
    /// Identity that holds deposited tokens at each token
    pub custody: Address,
}

impl Default for ExchangeConfig {
    fn default() -> Self {
        Self {
            fee_account: address_from_label(DEFAULT_FEE_LABEL),
            fee_percent: DEFAULT_FEE_PERCENT,
            custody: address_from_label(DEFAULT_CUSTODY_LABEL),
        }
    }
}

impl ExchangeConfig {
    /// Configuration with the default custody identity.
    pub fn new(fee_account: Address, fee_percent: u64) -> Result<Self, ConfigError> {
        if fee_percent > 100 {
            return Err(ConfigError::InvalidFeePercent(fee_percent));
        }
        Ok(Self {
            fee_account,
            fee_percent,
            custody: address_from_label(DEFAULT_CUSTODY_LABEL),
        })
    }

    pub fn with_custody(mut self, custody: Address) -> Self {
        self.custody = custody;
        self
    }

    pub fn fee_schedule(&self) -> FeeSchedule {
        FeeSchedule::new(self.fee_account, self.fee_percent)
    }

    pub fn from_json_str(s: &str) -> Result<Self, ConfigError> {
        let file: ConfigFile = serde_json::from_str(s)?;
        Self::try_from(file)
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(path)?;
        Self::from_json_str(&contents)
    }
}

impl TryFrom<ConfigFile> for ExchangeConfig {
    type Error = ConfigError;

    fn try_from(file: ConfigFile) -> Result<Self, Self::Error> {
        let fee_account = parse_address(&file.fee_account)?;
        let mut config = ExchangeConfig::new(fee_account, file.fee_percent)?;
        if let Some(custody) = file.custody.as_deref() {
            config = config.with_custody(parse_address(custody)?);
        }
        Ok(config)
    }
}

/// Parse `0x` + 64 hex characters, or derive an address from a label.
pub fn parse_address(s: &str) -> Result<Address, ConfigError> {
    let Some(digits) = s.strip_prefix("0x") else {
        return Ok(address_from_label(s));
    };

    let bytes = hex::decode(digits).map_err(|_| ConfigError::InvalidAddress(s.to_string()))?;
    Address::try_from(bytes.as_slice()).map_err(|_| ConfigError::InvalidAddress(s.to_string()))
}
