use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use wayfare_api::{app, metrics::SearchMetrics, AppState, AuthConfig};
use wayfare_catalog::SettingsCache;
use wayfare_core::repository::SettingsRepository;
use wayfare_offer::{FallbackPolicy, OfferSearchService, SyntheticGenerator};
use wayfare_store::app_config::Config;
use wayfare_store::{DbClient, HttpInventoryClient, InMemorySettingsRepository, PgSettingsRepository};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "wayfare_api=debug,wayfare_offer=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::load().context("Failed to load config")?;
    tracing::info!("Starting Wayfare API on port {}", config.server.port);

    let settings_repo: Arc<dyn SettingsRepository> = match &config.database {
        Some(database) => {
            let db = DbClient::new(database).await.context("Failed to connect to database")?;
            db.migrate().await.context("Failed to run migrations")?;
            Arc::new(PgSettingsRepository::new(db.pool.clone()))
        }
        None => {
            tracing::warn!("No database configured; pricing settings are kept in memory");
            Arc::new(InMemorySettingsRepository::new())
        }
    };

    let supplier = Arc::new(HttpInventoryClient::new(&config.supplier).context("Failed to build supplier client")?);
    if !supplier.is_configured() {
        tracing::warn!("Supplier credentials missing; every search will be served synthetic offers");
    }

    let settings_cache = Arc::new(SettingsCache::new(
        settings_repo.clone(),
        Duration::from_secs(config.pricing.settings_ttl_seconds),
    ));

    let search = OfferSearchService::new(
        supplier.clone(),
        supplier,
        settings_cache.clone(),
        SyntheticGenerator::new(config.search.synthetic_seed),
        FallbackPolicy {
            fallback_on_empty: config.search.fallback_on_empty,
        },
    );

    let app_state = AppState {
        search: Arc::new(search),
        settings_repo,
        settings_cache,
        metrics: Arc::new(SearchMetrics::new()?),
        auth: AuthConfig {
            secret: config.auth.jwt_secret.clone(),
        },
    };

    let app = app(app_state);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.server.port));
    tracing::info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app.into_make_service_with_connect_info::<SocketAddr>()).await?;

    Ok(())
}
