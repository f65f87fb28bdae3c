//! Process-local cache of the pricing settings.
//!
//! The value and its fetch time live in one slot that is replaced as a pair.
//! The lock is never held across an await: two requests that both find the
//! slot stale may both refetch, and the last write wins. Readers see either
//! the old pair or the new pair. Administrator writes do not invalidate the
//! cache, so a process may serve settings up to one TTL old.

use std::sync::{Arc, RwLock};
use std::time::Duration;

use tokio::time::Instant;
use tracing::{debug, warn};
use wayfare_core::repository::SettingsRepository;
use wayfare_core::PricingSettings;

/// Default staleness bound.
pub const DEFAULT_SETTINGS_TTL: Duration = Duration::from_secs(5 * 60);

#[derive(Debug, Clone, Copy)]
struct CachedSettings {
    value: PricingSettings,
    fetched_at: Instant,
}

pub struct SettingsCache {
    repository: Arc<dyn SettingsRepository>,
    ttl: Duration,
    slot: RwLock<Option<CachedSettings>>,
}

impl SettingsCache {
    pub fn new(repository: Arc<dyn SettingsRepository>, ttl: Duration) -> Self {
        Self {
            repository,
            ttl,
            slot: RwLock::new(None),
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Current settings; never fails.
    ///
    /// Fresh cached value, else a refetch, else the last cached value,
    /// else the built-in defaults.
    pub async fn get_settings(&self) -> PricingSettings {
        if let Some(value) = self.fresh() {
            return value;
        }

        if let Some(value) = self.refresh().await {
            return value;
        }

        match self.peek() {
            Some(previous) => previous,
            None => {
                debug!("No pricing settings available, using defaults");
                PricingSettings::default()
            }
        }
    }

    /// Fetch from the repository regardless of age and store on success.
    ///
    /// Returns `None` when the fetch failed or no row exists; the slot is left untouched.
    pub async fn refresh(&self) -> Option<PricingSettings> {
        match self.repository.fetch().await {
            Ok(Some(stored)) => {
                let cached = CachedSettings {
                    value: stored.settings,
                    fetched_at: Instant::now(),
                };
                if let Ok(mut slot) = self.slot.write() {
                    *slot = Some(cached);
                }
                debug!("Pricing settings refreshed");
                Some(stored.settings)
            }
            Ok(None) => {
                warn!("No pricing settings row found");
                None
            }
            Err(e) => {
                warn!("Failed to fetch pricing settings: {}", e);
                None
            }
        }
    }

    /// Last cached value regardless of age, without fetching.
    pub fn peek(&self) -> Option<PricingSettings> {
        let slot = self.slot.read().ok()?;
        slot.map(|cached| cached.value)
    }

    fn fresh(&self) -> Option<PricingSettings> {
        let slot = self.slot.read().ok()?;
        let cached = (*slot)?;

        if cached.fetched_at.elapsed() < self.ttl {
            Some(cached.value)
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use chrono::Utc;
    use rust_decimal::Decimal;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
    use std::sync::Mutex;
    use wayfare_core::repository::RepositoryError;
    use wayfare_core::settings::StoredSettings;

    struct CountingRepository {
        value: Mutex<Option<PricingSettings>>,
        failing: AtomicBool,
        fetches: AtomicUsize,
    }

    impl CountingRepository {
        fn with(value: Option<PricingSettings>) -> Arc<Self> {
            Arc::new(Self {
                value: Mutex::new(value),
                failing: AtomicBool::new(false),
                fetches: AtomicUsize::new(0),
            })
        }

        fn set(&self, value: PricingSettings) {
            *self.value.lock().unwrap() = Some(value);
        }

        fn fetches(&self) -> usize {
            self.fetches.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl SettingsRepository for CountingRepository {
        async fn fetch(&self) -> Result<Option<StoredSettings>, RepositoryError> {
            self.fetches.fetch_add(1, Ordering::SeqCst);
            if self.failing.load(Ordering::SeqCst) {
                return Err(RepositoryError::Unavailable("connection refused".to_string()));
            }
            Ok(self.value.lock().unwrap().map(|settings| StoredSettings {
                settings,
                updated_at: Some(Utc::now()),
            }))
        }

        async fn upsert(&self, settings: &PricingSettings) -> Result<StoredSettings, RepositoryError> {
            self.set(*settings);
            Ok(StoredSettings {
                settings: *settings,
                updated_at: Some(Utc::now()),
            })
        }
    }

    fn fixed_margin(amount: i64) -> PricingSettings {
        PricingSettings {
            flight_margin_fixed: Decimal::new(amount, 0),
            ..PricingSettings::default()
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_value_is_reused_within_ttl() {
        let repo = CountingRepository::with(Some(fixed_margin(20)));
        let cache = SettingsCache::new(repo.clone(), DEFAULT_SETTINGS_TTL);

        let first = cache.get_settings().await;
        repo.set(fixed_margin(99));
        tokio::time::advance(Duration::from_secs(299)).await;
        let second = cache.get_settings().await;

        assert_eq!(first, fixed_margin(20));
        assert_eq!(second, first);
        assert_eq!(repo.fetches(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_exactly_one_refetch_after_ttl() {
        let repo = CountingRepository::with(Some(fixed_margin(20)));
        let cache = SettingsCache::new(repo.clone(), DEFAULT_SETTINGS_TTL);

        cache.get_settings().await;
        repo.set(fixed_margin(30));
        tokio::time::advance(DEFAULT_SETTINGS_TTL).await;

        assert_eq!(cache.get_settings().await, fixed_margin(30));
        assert_eq!(cache.get_settings().await, fixed_margin(30));
        assert_eq!(repo.fetches(), 2);
    }

    #[tokio::test]
    async fn test_defaults_when_store_fails_and_nothing_cached() {
        let repo = CountingRepository::with(Some(fixed_margin(20)));
        repo.failing.store(true, Ordering::SeqCst);
        let cache = SettingsCache::new(repo, DEFAULT_SETTINGS_TTL);

        assert_eq!(cache.get_settings().await, PricingSettings::default());
        assert!(cache.peek().is_none());
    }

    #[tokio::test]
    async fn test_defaults_when_no_row() {
        let repo = CountingRepository::with(None);
        let cache = SettingsCache::new(repo, DEFAULT_SETTINGS_TTL);

        assert_eq!(cache.get_settings().await, PricingSettings::default());
    }

    #[tokio::test(start_paused = true)]
    async fn test_stale_value_served_when_refetch_fails() {
        let repo = CountingRepository::with(Some(fixed_margin(42)));
        let cache = SettingsCache::new(repo.clone(), DEFAULT_SETTINGS_TTL);

        cache.get_settings().await;
        repo.failing.store(true, Ordering::SeqCst);
        tokio::time::advance(DEFAULT_SETTINGS_TTL + Duration::from_secs(1)).await;

        assert_eq!(cache.get_settings().await, fixed_margin(42));
        assert_eq!(repo.fetches(), 2);
    }

    #[tokio::test]
    async fn test_explicit_refresh_ignores_ttl() {
        let repo = CountingRepository::with(Some(fixed_margin(1)));
        let cache = SettingsCache::new(repo.clone(), DEFAULT_SETTINGS_TTL);

        cache.get_settings().await;
        repo.set(fixed_margin(2));

        assert_eq!(cache.refresh().await, Some(fixed_margin(2)));
        assert_eq!(cache.get_settings().await, fixed_margin(2));
        assert_eq!(repo.fetches(), 2);
    }

    #[tokio::test]
    async fn test_concurrent_readers_agree() {
        let repo = CountingRepository::with(Some(fixed_margin(7)));
        let cache = SettingsCache::new(repo, DEFAULT_SETTINGS_TTL);

        let (a, b, c) = tokio::join!(cache.get_settings(), cache.get_settings(), cache.get_settings());
        assert_eq!(a, fixed_margin(7));
        assert_eq!(a, b);
        assert_eq!(b, c);
    }
}
