use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::calendar::Calendar;
use crate::decimal::Rate;
use crate::errors::{BillingError, Result};

/// billing configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BillingConfig {
    pub rounding: RoundingConfig,
    pub arrears: ArrearsConfig,
    pub collections: CollectionsConfig,
    pub receipts: ReceiptConfig,
    /// the business's local offset, in minutes east of UTC
    pub utc_offset_minutes: i32,
}

/// how schedule amounts are rounded
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RoundingConfig {
    pub currency_decimals: u32,
    /// let the last installment absorb the split remainder
    pub correct_remainder: bool,
}

/// suggested arrears interest: `rate_per_block` of the base amount for every
/// started block of `block_days` overdue
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ArrearsConfig {
    pub rate_per_block: Rate,
    pub block_days: u32,
}

/// collection windows
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CollectionsConfig {
    /// "due soon" window on dashboards
    pub due_soon_days: u32,
    /// how far ahead notifications look
    pub notification_window_days: u32,
    /// days overdue after which a transaction is flagged delinquent
    pub delinquency_threshold_days: u32,
}

/// receipt numbering
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReceiptConfig {
    pub prefix: String,
}

impl Default for BillingConfig {
    fn default() -> Self {
        Self {
            rounding: RoundingConfig::default(),
            arrears: ArrearsConfig::default(),
            collections: CollectionsConfig::default(),
            receipts: ReceiptConfig::default(),
            utc_offset_minutes: 0,
        }
    }
}

impl Default for RoundingConfig {
    fn default() -> Self {
        Self {
            currency_decimals: 2,
            correct_remainder: true,
        }
    }
}

impl Default for ArrearsConfig {
    fn default() -> Self {
        Self {
            rate_per_block: Rate::from_decimal(dec!(0.01)),
            block_days: 30,
        }
    }
}

impl Default for CollectionsConfig {
    fn default() -> Self {
        Self {
            due_soon_days: 7,
            notification_window_days: 15,
            delinquency_threshold_days: 30,
        }
    }
}

impl Default for ReceiptConfig {
    fn default() -> Self {
        Self {
            prefix: "REC".to_string(),
        }
    }
}

impl BillingConfig {
    /// parse and validate a JSON configuration; missing fields take defaults
    pub fn from_json(json: &str) -> Result<Self> {
        let config: BillingConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// configuration for a business at a fixed UTC offset, in hours
    ///
    /// out-of-range offsets saturate and are rejected by [`BillingConfig::validate`]
    pub fn with_utc_offset_hours(mut self, hours: i32) -> Self {
        self.utc_offset_minutes = hours.saturating_mul(60);
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.rounding.currency_decimals > 8 {
            return Err(BillingError::InvalidConfiguration {
                message: format!(
                    "currency_decimals must be at most 8, got {}",
                    self.rounding.currency_decimals
                ),
            });
        }

        if self.arrears.block_days == 0 {
            return Err(BillingError::InvalidConfiguration {
                message: "arrears block_days must be positive".to_string(),
            });
        }

        if self.arrears.rate_per_block.is_negative() {
            return Err(BillingError::InvalidConfiguration {
                message: format!("arrears rate must not be negative, got {}", self.arrears.rate_per_block),
            });
        }

        if self.arrears.rate_per_block.as_decimal() > Decimal::ONE {
            return Err(BillingError::InvalidConfiguration {
                message: format!("arrears rate above 100% per block: {}", self.arrears.rate_per_block),
            });
        }

        if self.receipts.prefix.trim().is_empty() {
            return Err(BillingError::InvalidConfiguration {
                message: "receipt prefix must not be blank".to_string(),
            });
        }

        self.calendar()?;
        Ok(())
    }

    /// calendar for the configured offset
    pub fn calendar(&self) -> Result<Calendar> {
        Calendar::from_offset_minutes(self.utc_offset_minutes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = BillingConfig::default();
        assert_eq!(config.rounding.currency_decimals, 2);
        assert_eq!(config.arrears.rate_per_block, Rate::from_percentage(1));
        assert_eq!(config.arrears.block_days, 30);
        assert_eq!(config.collections.due_soon_days, 7);
        assert_eq!(config.receipts.prefix, "REC");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_json_keeps_defaults() {
        let json = r#"{
            "utc_offset_minutes": -180,
            "collections": { "due_soon_days": 3 },
            "receipts": { "prefix": "RCB" }
        }"#;

        let config = BillingConfig::from_json(json).unwrap();
        assert_eq!(config.utc_offset_minutes, -180);
        assert_eq!(config.collections.due_soon_days, 3);
        assert_eq!(config.collections.notification_window_days, 15);
        assert_eq!(config.receipts.prefix, "RCB");
        assert_eq!(config.arrears.block_days, 30);
    }

    #[test]
    fn test_json_round_trip() {
        let config = BillingConfig::default().with_utc_offset_hours(-3);
        let json = config.to_json().unwrap();
        assert_eq!(BillingConfig::from_json(&json).unwrap(), config);
    }

    #[test]
    fn test_invalid_configs_rejected() {
        let mut config = BillingConfig::default();
        config.arrears.block_days = 0;
        assert!(config.validate().is_err());

        let mut config = BillingConfig::default();
        config.receipts.prefix = "  ".to_string();
        assert!(config.validate().is_err());

        let config = BillingConfig::default().with_utc_offset_hours(30);
        assert!(config.validate().is_err());

        assert!(BillingConfig::from_json("{ not json").is_err());
    }

    #[test]
    fn test_huge_offsets_are_errors() {
        let err = BillingConfig::from_json(r#"{"utc_offset_minutes": 40000000}"#).unwrap_err();
        assert!(matches!(err, BillingError::InvalidConfiguration { .. }));

        let config = BillingConfig::default().with_utc_offset_hours(i32::MAX);
        assert!(matches!(
            config.validate(),
            Err(BillingError::InvalidConfiguration { .. })
        ));
    }
}
