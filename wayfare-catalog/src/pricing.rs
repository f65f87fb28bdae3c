use rust_decimal::{Decimal, RoundingStrategy};
use serde::Serialize;
use tracing::warn;
use wayfare_core::PricingSettings;

/// Customer-facing price next to the supplier's base price.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct MarginBreakdown {
    pub final_price: Decimal,
    /// Informational; kept for auditing the markup.
    pub original_base_price: Decimal,
}

/// Decimal places of every published amount.
pub const PRICE_SCALE: u32 = 2;

/// Markup pricing engine
#[derive(Debug, Default, Clone, Copy)]
pub struct PricingEngine;

impl PricingEngine {
    pub fn new() -> Self {
        Self
    }

    /// Apply the flight markup:
    ///
    /// ```text
    /// with_margin = (base + fixed) * (1 + margin% / 100)
    /// final       = with_margin * (1 + fee% / 100)
    /// ```
    ///
    /// The fixed margin is added before either percentage. Arithmetic is exact;
    /// only the final amounts are rounded (midpoint away from zero).
    ///
    /// If the amount overflows the decimal range the default settings are used,
    /// and if that still overflows the base price is published unmarked.
    pub fn apply_margin(&self, base_price: Decimal, settings: &PricingSettings) -> MarginBreakdown {
        let final_price = marked_up(base_price, settings).or_else(|| {
            warn!("Markup overflowed for base price {}; using default settings", base_price);
            marked_up(base_price, &PricingSettings::default())
        });

        match final_price {
            Some(final_price) => MarginBreakdown {
                final_price: round(final_price),
                original_base_price: round(base_price),
            },
            None => {
                warn!("Markup overflowed for base price {}; publishing it unmarked", base_price);
                self.pass_through(base_price)
            }
        }
    }

    /// No markup; amounts are only rounded to the published scale.
    pub fn pass_through(&self, base_price: Decimal) -> MarginBreakdown {
        let rounded = round(base_price);
        MarginBreakdown {
            final_price: rounded,
            original_base_price: rounded,
        }
    }
}

fn marked_up(base_price: Decimal, settings: &PricingSettings) -> Option<Decimal> {
    let margin_factor = Decimal::ONE.checked_add(settings.flight_margin_percent / Decimal::ONE_HUNDRED)?;
    let fee_factor = Decimal::ONE.checked_add(settings.payment_fee_percent / Decimal::ONE_HUNDRED)?;

    base_price
        .checked_add(settings.flight_margin_fixed)?
        .checked_mul(margin_factor)?
        .checked_mul(fee_factor)
}

fn round(amount: Decimal) -> Decimal {
    let mut rounded = amount.round_dp_with_strategy(PRICE_SCALE, RoundingStrategy::MidpointAwayFromZero);
    rounded.rescale(PRICE_SCALE);
    rounded
}

/// Render an amount with exactly two decimal digits ("502.41", "15.00").
pub fn format_amount(amount: Decimal) -> String {
    round(amount).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn dec(value: &str) -> Decimal {
        Decimal::from_str(value).unwrap()
    }

    fn settings(fixed: &str, percent: &str, fee: &str) -> PricingSettings {
        PricingSettings::new(dec(fixed), dec(percent), dec(fee))
    }

    #[test]
    fn test_reference_fare() {
        let engine = PricingEngine::default();
        let breakdown = engine.apply_margin(dec("450"), &PricingSettings::default());

        // (450 + 15) * 1.05 * 1.029 = 502.40925
        assert_eq!(format_amount(breakdown.final_price), "502.41");
        assert_eq!(format_amount(breakdown.original_base_price), "450.00");
    }

    #[test]
    fn test_fixed_margin_is_added_before_percentages() {
        let engine = PricingEngine::default();
        let breakdown = engine.apply_margin(dec("100"), &settings("10", "10", "0"));

        // (100 + 10) * 1.1, not 100 * 1.1 + 10
        assert_eq!(breakdown.final_price, dec("121.00"));
    }

    #[test]
    fn test_zero_settings_only_round() {
        let engine = PricingEngine::default();
        let breakdown = engine.apply_margin(dec("99.999"), &settings("0", "0", "0"));
        assert_eq!(format_amount(breakdown.final_price), "100.00");
        assert_eq!(format_amount(breakdown.original_base_price), "100.00");
    }

    #[test]
    fn test_midpoint_rounds_away_from_zero() {
        let engine = PricingEngine::default();
        assert_eq!(engine.pass_through(dec("10.005")).final_price, dec("10.01"));
        assert_eq!(engine.pass_through(dec("10.004")).final_price, dec("10.00"));
    }

    #[test]
    fn test_monotonic_in_every_input() {
        let engine = PricingEngine::default();
        let base = settings("15", "5", "2.9");
        let steps = ["0", "0.5", "1", "12.34", "100", "1000"];

        for window in steps.windows(2) {
            let (lo, hi) = (dec(window[0]), dec(window[1]));

            let by_price = (engine.apply_margin(lo, &base), engine.apply_margin(hi, &base));
            assert!(by_price.0.final_price < by_price.1.final_price);

            let mut lo_settings = base;
            let mut hi_settings = base;
            lo_settings.flight_margin_fixed = lo;
            hi_settings.flight_margin_fixed = hi;
            assert!(
                engine.apply_margin(dec("450"), &lo_settings).final_price
                    < engine.apply_margin(dec("450"), &hi_settings).final_price
            );

            let mut lo_settings = base;
            let mut hi_settings = base;
            lo_settings.flight_margin_percent = lo;
            hi_settings.flight_margin_percent = hi;
            assert!(
                engine.apply_margin(dec("450"), &lo_settings).final_price
                    < engine.apply_margin(dec("450"), &hi_settings).final_price
            );

            let mut lo_settings = base;
            let mut hi_settings = base;
            lo_settings.payment_fee_percent = lo;
            hi_settings.payment_fee_percent = hi;
            assert!(
                engine.apply_margin(dec("450"), &lo_settings).final_price
                    < engine.apply_margin(dec("450"), &hi_settings).final_price
            );
        }
    }

    #[test]
    fn test_overflowing_settings_fall_back_to_defaults() {
        let engine = PricingEngine::new();
        let huge = settings("70000000000000000000000000000", "50", "0");

        let breakdown = engine.apply_margin(dec("450"), &huge);

        assert_eq!(format_amount(breakdown.final_price), "502.41");
        assert_eq!(format_amount(breakdown.original_base_price), "450.00");
    }

    #[test]
    fn test_overflowing_base_is_published_unmarked() {
        let engine = PricingEngine::new();
        let base = Decimal::MAX;

        let breakdown = engine.apply_margin(base, &PricingSettings::default());

        assert_eq!(breakdown.final_price, breakdown.original_base_price);
    }

    #[test]
    fn test_format_amount_pads() {
        assert_eq!(format_amount(dec("15")), "15.00");
        assert_eq!(format_amount(dec("0.1")), "0.10");
        assert_eq!(format_amount(dec("1234.5678")), "1234.57");
    }
}
