use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::{CoreError, CoreResult};

/// Key of the singleton settings row.
pub const GLOBAL_SETTINGS_KEY: &str = "global";

/// Commission and fee configuration applied to flight base prices.
///
/// Amounts travel as plain JSON numbers so the back office can post
/// `{"flightMarginFixed": 15, ...}` directly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PricingSettings {
    /// Fixed margin in currency units, added before any percentage.
    #[serde(with = "rust_decimal::serde::float")]
    pub flight_margin_fixed: Decimal,

    /// Percentage margin, in percentage points.
    #[serde(with = "rust_decimal::serde::float")]
    pub flight_margin_percent: Decimal,

    /// Payment processing fee, in percentage points.
    #[serde(with = "rust_decimal::serde::float")]
    pub payment_fee_percent: Decimal,
}

impl PricingSettings {
    pub fn new(
        flight_margin_fixed: Decimal,
        flight_margin_percent: Decimal,
        payment_fee_percent: Decimal,
    ) -> Self {
        Self {
            flight_margin_fixed,
            flight_margin_percent,
            payment_fee_percent,
        }
    }

    /// Largest fixed margin the settings table stores (`NUMERIC(12, 2)`).
    pub fn max_margin_fixed() -> Decimal {
        Decimal::new(999_999_999_999, 2)
    }

    /// Largest percentage the settings table stores (`NUMERIC(6, 3)`).
    pub fn max_percent() -> Decimal {
        Decimal::new(999_999, 3)
    }

    /// Rejects negative components and components beyond the stored precision.
    pub fn validate(&self) -> CoreResult<()> {
        let fields = [
            ("flightMarginFixed", self.flight_margin_fixed, Self::max_margin_fixed()),
            ("flightMarginPercent", self.flight_margin_percent, Self::max_percent()),
            ("paymentFeePercent", self.payment_fee_percent, Self::max_percent()),
        ];

        let negative: Vec<&str> = fields
            .iter()
            .filter(|(_, value, _)| value.is_sign_negative() && !value.is_zero())
            .map(|(name, _, _)| *name)
            .collect();
        if !negative.is_empty() {
            return Err(CoreError::ValidationError(format!(
                "Settings must be non-negative: {}",
                negative.join(", ")
            )));
        }

        let too_large: Vec<String> = fields
            .iter()
            .filter(|(_, value, max)| value > max)
            .map(|(name, _, max)| format!("{} (max {})", name, max))
            .collect();
        if !too_large.is_empty() {
            return Err(CoreError::ValidationError(format!(
                "Settings out of range: {}",
                too_large.join(", ")
            )));
        }

        Ok(())
    }
}

impl Default for PricingSettings {
    fn default() -> Self {
        Self {
            flight_margin_fixed: Decimal::new(15, 0),
            flight_margin_percent: Decimal::new(5, 0),
            payment_fee_percent: Decimal::new(29, 1),
        }
    }
}

/// Settings row as persisted, with its last write time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredSettings {
    #[serde(flatten)]
    pub settings: PricingSettings,
    pub updated_at: Option<DateTime<Utc>>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let settings = PricingSettings::default();
        assert_eq!(settings.flight_margin_fixed, Decimal::new(15, 0));
        assert_eq!(settings.flight_margin_percent, Decimal::new(5, 0));
        assert_eq!(settings.payment_fee_percent.to_string(), "2.9");
    }

    #[test]
    fn test_settings_json_uses_numbers() {
        let json = r#"{"flightMarginFixed": 20, "flightMarginPercent": 7.5, "paymentFeePercent": 3}"#;
        let settings: PricingSettings = serde_json::from_str(json).expect("Failed to deserialize");
        assert_eq!(settings.flight_margin_fixed, Decimal::new(20, 0));
        assert_eq!(settings.flight_margin_percent, Decimal::new(75, 1));

        let value = serde_json::to_value(settings).unwrap();
        assert!(value["paymentFeePercent"].is_number());
    }

    #[test]
    fn test_negative_settings_rejected() {
        let settings = PricingSettings::new(Decimal::new(-1, 0), Decimal::ZERO, Decimal::new(-2, 0));
        let err = settings.validate().unwrap_err();
        let message = err.to_string();
        assert!(message.contains("flightMarginFixed"));
        assert!(message.contains("paymentFeePercent"));
        assert!(!message.contains("flightMarginPercent"));

        assert!(PricingSettings::default().validate().is_ok());
    }

    #[test]
    fn test_oversized_settings_rejected() {
        let huge = PricingSettings::new(
            Decimal::from_str_exact("70000000000000000000000000000").unwrap(),
            Decimal::new(50, 0),
            Decimal::ZERO,
        );
        let message = huge.validate().unwrap_err().to_string();
        assert!(message.contains("flightMarginFixed"));
        assert!(!message.contains("flightMarginPercent"));

        let percent = PricingSettings::new(Decimal::ZERO, Decimal::new(1000, 0), Decimal::new(1000, 0));
        let message = percent.validate().unwrap_err().to_string();
        assert!(message.contains("flightMarginPercent"));
        assert!(message.contains("paymentFeePercent"));
    }

    #[test]
    fn test_largest_storable_settings_accepted() {
        let settings = PricingSettings::new(
            PricingSettings::max_margin_fixed(),
            PricingSettings::max_percent(),
            PricingSettings::max_percent(),
        );
        assert!(settings.validate().is_ok());
    }
}
