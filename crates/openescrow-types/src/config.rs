//! Construction-time configuration for an escrow ledger.

use primitive_types::U256;
use serde::{Deserialize, Serialize};

use crate::{constants, Address, EscrowError, Result};

/// Configuration applied when a ledger is deployed.
///
/// The founder is not configurable: it is always the deploying caller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerConfig {
    /// Destination of settlement fees.
    pub deposit_address: Address,
    /// Fee rate installed at deploy time (100 = 1%).
    #[serde(default = "default_fee_rate")]
    pub initial_fee_rate: U256,
}

fn default_fee_rate() -> U256 {
    U256::from(constants::DEFAULT_FEE_RATE)
}

impl LedgerConfig {
    /// Config with the default fee rate.
    #[must_use]
    pub fn new(deposit_address: Address) -> Self {
        Self {
            deposit_address,
            initial_fee_rate: default_fee_rate(),
        }
    }

    /// Override the initial fee rate.
    #[must_use]
    pub fn with_fee_rate(mut self, fee_rate: U256) -> Self {
        self.initial_fee_rate = fee_rate;
        self
    }

    /// Parse and validate a JSON config document.
    ///
    /// # Errors
    /// Returns `Configuration` for malformed JSON or a zero deposit address.
    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Check the config can be deployed.
    ///
    /// # Errors
    /// Returns `Configuration` if the deposit address is zero.
    pub fn validate(&self) -> Result<()> {
        if self.deposit_address.is_zero() {
            return Err(EscrowError::Configuration(
                "deposit_address must be non-zero".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_uses_default_fee() {
        let cfg = LedgerConfig::new(Address::dummy(9));
        assert_eq!(cfg.initial_fee_rate, U256::from(100));
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn zero_deposit_address_rejected() {
        let err = LedgerConfig::new(Address::ZERO).validate().unwrap_err();
        assert!(matches!(err, EscrowError::Configuration(_)));
    }

    #[test]
    fn from_json_defaults_fee_rate() {
        let cfg = LedgerConfig::new(Address::dummy(9));
        let mut value = serde_json::to_value(&cfg).unwrap();
        value.as_object_mut().unwrap().remove("initial_fee_rate");

        let parsed = LedgerConfig::from_json(&value.to_string()).unwrap();
        assert_eq!(parsed, cfg);
    }

    #[test]
    fn from_json_rejects_garbage() {
        assert!(matches!(
            LedgerConfig::from_json("{\"deposit_address\": 7}"),
            Err(EscrowError::Configuration(_))
        ));
    }

    #[test]
    fn config_serde_roundtrip() {
        let cfg = LedgerConfig::new(Address::dummy(4)).with_fee_rate(U256::from(30));
        let json = serde_json::to_string(&cfg).unwrap();
        assert_eq!(LedgerConfig::from_json(&json).unwrap(), cfg);
    }
}
