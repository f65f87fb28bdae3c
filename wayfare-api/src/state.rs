use std::sync::Arc;

use wayfare_catalog::SettingsCache;
use wayfare_core::repository::SettingsRepository;
use wayfare_offer::OfferSearchService;

use crate::metrics::SearchMetrics;

#[derive(Clone)]
pub struct AuthConfig {
    pub secret: String,
}

#[derive(Clone)]
pub struct AppState {
    pub search: Arc<OfferSearchService>,
    pub settings_repo: Arc<dyn SettingsRepository>,
    pub settings_cache: Arc<SettingsCache>,
    pub metrics: Arc<SearchMetrics>,
    pub auth: AuthConfig,
}
