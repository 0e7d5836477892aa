//! Detector configuration.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::Deserialize;

/// Tunables for opportunity sizing and the profit floor.
#[derive(Debug, Clone, Deserialize)]
pub struct DetectorConfig {
    /// Contracts assumed per opportunity when sizing profit.
    #[serde(default = "default_contracts")]
    pub contracts: u32,
    /// Fee taken off the gross edge, as a fraction.
    #[serde(default = "default_fee_rate")]
    pub fee_rate: Decimal,
    /// Minimum net profit in dollars for an opportunity to be reported.
    #[serde(default = "default_min_net_profit")]
    pub min_net_profit: Decimal,
}

fn default_contracts() -> u32 {
    100
}

fn default_fee_rate() -> Decimal {
    dec!(0.07)
}

fn default_min_net_profit() -> Decimal {
    dec!(1.00)
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self {
            contracts: default_contracts(),
            fee_rate: default_fee_rate(),
            min_net_profit: default_min_net_profit(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = DetectorConfig::default();
        assert_eq!(config.contracts, 100);
        assert_eq!(config.fee_rate, dec!(0.07));
        assert_eq!(config.min_net_profit, dec!(1.00));
    }

    #[test]
    fn test_partial_toml_fills_defaults() {
        let config: DetectorConfig = toml::from_str("fee_rate = \"0.05\"").unwrap();
        assert_eq!(config.fee_rate, dec!(0.05));
        assert_eq!(config.contracts, 100);
    }
}
