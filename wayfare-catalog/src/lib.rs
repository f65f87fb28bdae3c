pub mod pricing;
pub mod settings_cache;

pub use pricing::{format_amount, MarginBreakdown, PricingEngine, PRICE_SCALE};
pub use settings_cache::SettingsCache;
