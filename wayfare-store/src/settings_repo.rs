use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::PgPool;
use tokio::sync::RwLock;
use tracing::info;
use wayfare_core::repository::{RepositoryError, SettingsRepository};
use wayfare_core::settings::{StoredSettings, GLOBAL_SETTINGS_KEY};
use wayfare_core::PricingSettings;

pub struct PgSettingsRepository {
    pool: PgPool,
}

impl PgSettingsRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(sqlx::FromRow)]
struct SettingsRow {
    flight_margin_fixed: Decimal,
    flight_margin_percent: Decimal,
    payment_fee_percent: Decimal,
    updated_at: DateTime<Utc>,
}

impl From<SettingsRow> for StoredSettings {
    fn from(row: SettingsRow) -> Self {
        StoredSettings {
            settings: PricingSettings::new(row.flight_margin_fixed, row.flight_margin_percent, row.payment_fee_percent),
            updated_at: Some(row.updated_at),
        }
    }
}

fn unavailable(e: sqlx::Error) -> RepositoryError {
    match e {
        sqlx::Error::ColumnDecode { .. } | sqlx::Error::Decode(_) => RepositoryError::Malformed(e.to_string()),
        other => RepositoryError::Unavailable(other.to_string()),
    }
}

#[async_trait]
impl SettingsRepository for PgSettingsRepository {
    async fn fetch(&self) -> Result<Option<StoredSettings>, RepositoryError> {
        let row = sqlx::query_as::<_, SettingsRow>(
            "SELECT flight_margin_fixed, flight_margin_percent, payment_fee_percent, updated_at \
             FROM pricing_settings WHERE id = $1",
        )
        .bind(GLOBAL_SETTINGS_KEY)
        .fetch_optional(&self.pool)
        .await
        .map_err(unavailable)?;

        Ok(row.map(StoredSettings::from))
    }

    async fn upsert(&self, settings: &PricingSettings) -> Result<StoredSettings, RepositoryError> {
        let row = sqlx::query_as::<_, SettingsRow>(
            r#"
            INSERT INTO pricing_settings (id, flight_margin_fixed, flight_margin_percent, payment_fee_percent, updated_at)
            VALUES ($1, $2, $3, $4, now())
            ON CONFLICT (id) DO UPDATE SET
                flight_margin_fixed = EXCLUDED.flight_margin_fixed,
                flight_margin_percent = EXCLUDED.flight_margin_percent,
                payment_fee_percent = EXCLUDED.payment_fee_percent,
                updated_at = EXCLUDED.updated_at
            RETURNING flight_margin_fixed, flight_margin_percent, payment_fee_percent, updated_at
            "#,
        )
        .bind(GLOBAL_SETTINGS_KEY)
        .bind(settings.flight_margin_fixed)
        .bind(settings.flight_margin_percent)
        .bind(settings.payment_fee_percent)
        .fetch_one(&self.pool)
        .await
        .map_err(unavailable)?;

        info!("Pricing settings updated");
        Ok(row.into())
    }
}

/// Settings held in process memory, for deployments without a database.
#[derive(Default)]
pub struct InMemorySettingsRepository {
    row: RwLock<Option<StoredSettings>>,
}

impl InMemorySettingsRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_settings(settings: PricingSettings) -> Self {
        Self {
            row: RwLock::new(Some(StoredSettings {
                settings,
                updated_at: Some(Utc::now()),
            })),
        }
    }
}

#[async_trait]
impl SettingsRepository for InMemorySettingsRepository {
    async fn fetch(&self) -> Result<Option<StoredSettings>, RepositoryError> {
        Ok(self.row.read().await.clone())
    }

    async fn upsert(&self, settings: &PricingSettings) -> Result<StoredSettings, RepositoryError> {
        let stored = StoredSettings {
            settings: *settings,
            updated_at: Some(Utc::now()),
        };
        *self.row.write().await = Some(stored.clone());
        Ok(stored)
    }
}
