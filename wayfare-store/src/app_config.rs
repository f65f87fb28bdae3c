use serde::Deserialize;
use std::env;

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub server: ServerConfig,
    /// Pricing settings stay in process memory when absent.
    #[serde(default)]
    pub database: Option<DatabaseConfig>,
    pub supplier: SupplierConfig,
    #[serde(default)]
    pub pricing: PricingCacheConfig,
    #[serde(default)]
    pub search: SearchConfig,
    pub auth: AuthConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub port: u16,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DatabaseConfig {
    pub url: String,
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
}

fn default_max_connections() -> u32 { 5 }

/// Upstream inventory API credentials and limits.
#[derive(Debug, Deserialize, Clone)]
pub struct SupplierConfig {
    pub base_url: String,
    #[serde(default)]
    pub client_id: String,
    #[serde(default)]
    pub client_secret: String,
    #[serde(default = "default_timeout_seconds")]
    pub timeout_seconds: u64,
    #[serde(default = "default_max_results")]
    pub max_results: u32,
}

fn default_timeout_seconds() -> u64 { 10 }
fn default_max_results() -> u32 { 20 }

#[derive(Debug, Deserialize, Clone)]
pub struct PricingCacheConfig {
    #[serde(default = "default_settings_ttl")]
    pub settings_ttl_seconds: u64,
}

fn default_settings_ttl() -> u64 { 300 }

impl Default for PricingCacheConfig {
    fn default() -> Self {
        Self { settings_ttl_seconds: default_settings_ttl() }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct SearchConfig {
    /// Serve synthetic offers when the upstream answers with zero offers.
    #[serde(default = "default_fallback_on_empty")]
    pub fallback_on_empty: bool,
    /// Fixed seed for synthetic offers (demos, offline tests).
    #[serde(default)]
    pub synthetic_seed: Option<u64>,
}

fn default_fallback_on_empty() -> bool { true }

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            fallback_on_empty: default_fallback_on_empty(),
            synthetic_seed: None,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct AuthConfig {
    pub jwt_secret: String,
}

impl Config {
    pub fn load() -> Result<Self, config::ConfigError> {
        let run_mode = env::var("RUN_MODE").unwrap_or_else(|_| "development".into());

        let s = config::Config::builder()
            .add_source(config::File::with_name("config/default"))
            // Per-environment overrides, optional
            .add_source(config::File::with_name(&format!("config/{}", run_mode)).required(false))
            // Local overrides, not checked in
            .add_source(config::File::with_name("config/local").required(false))
            // e.g. `WAYFARE__SUPPLIER__CLIENT_ID=...`
            .add_source(config::Environment::with_prefix("WAYFARE").separator("__"))
            .build()?;

        s.try_deserialize()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_optional_sections_default() {
        let toml = r#"
            [server]
            port = 9000

            [supplier]
            base_url = "https://test.api.example.com"

            [auth]
            jwt_secret = "secret"
        "#;

        let config: Config = config::Config::builder()
            .add_source(config::File::from_str(toml, config::FileFormat::Toml))
            .build()
            .and_then(|c| c.try_deserialize())
            .expect("Failed to load config");

        assert_eq!(config.server.port, 9000);
        assert!(config.database.is_none());
        assert_eq!(config.supplier.timeout_seconds, 10);
        assert!(config.supplier.client_id.is_empty());
        assert_eq!(config.pricing.settings_ttl_seconds, 300);
        assert!(config.search.fallback_on_empty);
        assert!(config.search.synthetic_seed.is_none());
    }
}
