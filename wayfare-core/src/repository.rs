use async_trait::async_trait;

use crate::settings::{PricingSettings, StoredSettings};

#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    #[error("Settings store unavailable: {0}")]
    Unavailable(String),
    #[error("Malformed settings row: {0}")]
    Malformed(String),
}

/// Repository for the singleton pricing settings row
#[async_trait]
pub trait SettingsRepository: Send + Sync {
    /// `Ok(None)` when no row has been written yet.
    async fn fetch(&self) -> Result<Option<StoredSettings>, RepositoryError>;

    /// Insert or replace the row, stamping `updated_at`.
    async fn upsert(&self, settings: &PricingSettings) -> Result<StoredSettings, RepositoryError>;
}
