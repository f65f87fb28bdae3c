use axum::{
    extract::{rejection::JsonRejection, State},
    routing::get,
    Extension, Json, Router,
};
use serde::Serialize;
use wayfare_core::settings::StoredSettings;
use wayfare_core::PricingSettings;

use crate::error::AppError;
use crate::middleware::AdminClaims;
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new().route("/admin/settings", get(get_settings).put(update_settings))
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SettingsView {
    #[serde(flatten)]
    pub stored: StoredSettings,
    /// What searches currently price with; lags `stored` by up to the cache TTL.
    pub active: PricingSettings,
}

/// Stored settings, or the defaults (with no `updatedAt`) before the first write.
async fn get_settings(State(state): State<AppState>) -> Result<Json<SettingsView>, AppError> {
    let stored = state.settings_repo.fetch().await?.unwrap_or_else(|| StoredSettings {
        settings: PricingSettings::default(),
        updated_at: None,
    });
    let active = state.settings_cache.get_settings().await;

    Ok(Json(SettingsView { stored, active }))
}

/// Searches pick the new values up once the settings cache expires.
async fn update_settings(
    State(state): State<AppState>,
    Extension(claims): Extension<AdminClaims>,
    body: Result<Json<PricingSettings>, JsonRejection>,
) -> Result<Json<StoredSettings>, AppError> {
    let Json(settings) = body.map_err(|e| AppError::ValidationError(e.body_text()))?;
    settings.validate()?;

    let stored = state.settings_repo.upsert(&settings).await?;
    tracing::info!(
        "Pricing settings updated by {}: fixed={} percent={} fee={}",
        claims.sub,
        stored.settings.flight_margin_fixed,
        stored.settings.flight_margin_percent,
        stored.settings.payment_fee_percent
    );

    Ok(Json(stored))
}
