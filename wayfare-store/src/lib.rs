pub mod app_config;
pub mod database;
pub mod settings_repo;
pub mod supplier_client;

pub use database::DbClient;
pub use settings_repo::{InMemorySettingsRepository, PgSettingsRepository};
pub use supplier_client::HttpInventoryClient;
