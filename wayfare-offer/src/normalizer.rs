use rust_decimal::Decimal;
use serde::Serialize;
use wayfare_catalog::PricingEngine;
use wayfare_core::offer::PricedOffer;
use wayfare_core::PricingSettings;

/// An offer with its customer-facing price.
///
/// The wrapped offer keeps the supplier's base price untouched.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NormalizedOffer<T> {
    pub offer: T,
    pub final_price: Decimal,
    pub original_base_price: Decimal,
}

impl<T: PricedOffer> NormalizedOffer<T> {
    pub fn currency(&self) -> &str {
        self.offer.currency()
    }
}

/// Apply the markup to every offer, keeping upstream order.
pub fn apply_markup<T: PricedOffer>(
    engine: &PricingEngine,
    offers: Vec<T>,
    settings: &PricingSettings,
) -> Vec<NormalizedOffer<T>> {
    offers
        .into_iter()
        .map(|offer| {
            let breakdown = engine.apply_margin(offer.base_price(), settings);
            NormalizedOffer {
                offer,
                final_price: breakdown.final_price,
                original_base_price: breakdown.original_base_price,
            }
        })
        .collect()
}

/// Round every offer to the published scale without markup.
pub fn without_markup<T: PricedOffer>(engine: &PricingEngine, offers: Vec<T>) -> Vec<NormalizedOffer<T>> {
    offers
        .into_iter()
        .map(|offer| {
            let breakdown = engine.pass_through(offer.base_price());
            NormalizedOffer {
                offer,
                final_price: breakdown.final_price,
                original_base_price: breakdown.original_base_price,
            }
        })
        .collect()
}
