//! Offer search: upstream inventory first, synthetic offers when it yields nothing.

use std::collections::BTreeMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};
use wayfare_catalog::{PricingEngine, SettingsCache};
use wayfare_core::search::{ApartmentSearchCriteria, CarSearchCriteria, FlightSearchCriteria, HotelSearchCriteria};
use wayfare_core::supplier::{InventorySupplier, LocationLookup, SupplierError};
use wayfare_core::{ApartmentOffer, CarOffer, FlightOffer, FlightOfferBatch, HotelOffer};

use crate::generator::SyntheticGenerator;
use crate::location::LocationResolver;
use crate::normalizer::{apply_markup, without_markup, NormalizedOffer};

/// Result of one upstream call, before any substitution.
#[derive(Debug)]
pub enum SearchOutcome<T> {
    Found(T),
    Empty,
    Failed(SupplierError),
}

impl<T> SearchOutcome<T> {
    pub fn from_result(result: Result<T, SupplierError>, is_empty: impl FnOnce(&T) -> bool) -> Self {
        match result {
            Ok(value) if is_empty(&value) => SearchOutcome::Empty,
            Ok(value) => SearchOutcome::Found(value),
            Err(e) => SearchOutcome::Failed(e),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum OfferSource {
    Upstream,
    Synthetic,
}

/// Why synthetic offers were served.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FallbackReason {
    EmptyResult,
    UpstreamFailure,
    /// The supplier carries no inventory for this domain; nothing failed.
    NoInventory,
}

#[derive(Debug, Clone, Deserialize)]
pub struct FallbackPolicy {
    /// Substitute synthetic offers when the upstream succeeds with zero offers.
    /// Upstream failures are always substituted.
    #[serde(default = "default_true")]
    pub fallback_on_empty: bool,
}

fn default_true() -> bool {
    true
}

impl Default for FallbackPolicy {
    fn default() -> Self {
        Self {
            fallback_on_empty: true,
        }
    }
}

/// Priced offers of one domain, all from a single source.
#[derive(Debug, Clone)]
pub struct SearchResults<T> {
    pub offers: Vec<NormalizedOffer<T>>,
    pub source: OfferSource,
    pub fallback_reason: Option<FallbackReason>,
}

#[derive(Debug, Clone)]
pub struct FlightSearchResults {
    pub results: SearchResults<FlightOffer>,
    /// Carrier code -> name, for every carrier the offers reference.
    pub carriers: BTreeMap<String, String>,
}

pub struct OfferSearchService {
    supplier: Arc<dyn InventorySupplier>,
    locations: LocationResolver,
    settings: Arc<SettingsCache>,
    pricing: PricingEngine,
    synthetic: SyntheticGenerator,
    policy: FallbackPolicy,
}

impl OfferSearchService {
    pub fn new(
        supplier: Arc<dyn InventorySupplier>,
        lookup: Arc<dyn LocationLookup>,
        settings: Arc<SettingsCache>,
        synthetic: SyntheticGenerator,
        policy: FallbackPolicy,
    ) -> Self {
        Self {
            supplier,
            locations: LocationResolver::new(lookup),
            settings,
            pricing: PricingEngine::default(),
            synthetic,
            policy,
        }
    }

    /// Flight search with markup.
    ///
    /// Settings retrieval and the upstream search run concurrently; neither
    /// branch can fail the request.
    pub async fn search_flights(&self, criteria: FlightSearchCriteria) -> FlightSearchResults {
        let (settings, (criteria, outcome)) =
            tokio::join!(self.settings.get_settings(), self.fetch_flights(criteria));

        let (batch, source, fallback_reason) = self.settle("flights", outcome, || self.synthetic.flights(&criteria));

        info!(
            "Flight search {} -> {} served {} offers from {:?}",
            criteria.origin,
            criteria.destination,
            batch.offers.len(),
            source
        );

        FlightSearchResults {
            results: SearchResults {
                offers: apply_markup(&self.pricing, batch.offers, &settings),
                source,
                fallback_reason,
            },
            carriers: batch.carriers,
        }
    }

    pub async fn search_hotels(&self, mut criteria: HotelSearchCriteria) -> SearchResults<HotelOffer> {
        criteria.destination = self.locations.resolve_code(&criteria.destination).await;
        let outcome = SearchOutcome::from_result(self.supplier.search_hotels(&criteria).await, Vec::is_empty);

        let (offers, source, fallback_reason) = self.settle("hotels", outcome, || self.synthetic.hotels(&criteria));
        info!("Hotel search in {} served {} offers from {:?}", criteria.destination, offers.len(), source);

        SearchResults {
            offers: without_markup(&self.pricing, offers),
            source,
            fallback_reason,
        }
    }

    pub async fn search_cars(&self, mut criteria: CarSearchCriteria) -> SearchResults<CarOffer> {
        criteria.location = self.locations.resolve_code(&criteria.location).await;
        let outcome = SearchOutcome::from_result(self.supplier.search_cars(&criteria).await, Vec::is_empty);

        let (offers, source, fallback_reason) = self.settle("cars", outcome, || self.synthetic.cars(&criteria));
        info!("Car search at {} served {} offers from {:?}", criteria.location, offers.len(), source);

        SearchResults {
            offers: without_markup(&self.pricing, offers),
            source,
            fallback_reason,
        }
    }

    /// Apartments keep the free-text destination; listings are matched by city name.
    pub async fn search_apartments(&self, criteria: ApartmentSearchCriteria) -> SearchResults<ApartmentOffer> {
        let outcome = SearchOutcome::from_result(self.supplier.search_apartments(&criteria).await, Vec::is_empty);

        let (offers, source, fallback_reason) =
            self.settle("apartments", outcome, || self.synthetic.apartments(&criteria));
        info!("Apartment search in {} served {} offers from {:?}", criteria.destination, offers.len(), source);

        SearchResults {
            offers: without_markup(&self.pricing, offers),
            source,
            fallback_reason,
        }
    }

    async fn fetch_flights(&self, mut criteria: FlightSearchCriteria) -> (FlightSearchCriteria, SearchOutcome<FlightOfferBatch>) {
        let (origin, destination) = tokio::join!(
            self.locations.resolve_code(&criteria.origin),
            self.locations.resolve_code(&criteria.destination)
        );
        criteria.origin = origin;
        criteria.destination = destination;

        let result = self.supplier.search_flights(&criteria).await;
        (criteria, SearchOutcome::from_result(result, FlightOfferBatch::is_empty))
    }

    /// The one place upstream data is swapped for synthetic data.
    fn settle<T: Default>(
        &self,
        domain: &str,
        outcome: SearchOutcome<T>,
        generate: impl FnOnce() -> T,
    ) -> (T, OfferSource, Option<FallbackReason>) {
        match outcome {
            SearchOutcome::Found(offers) => (offers, OfferSource::Upstream, None),
            SearchOutcome::Empty if !self.policy.fallback_on_empty => {
                debug!("Upstream {} search returned nothing; serving empty result", domain);
                (T::default(), OfferSource::Upstream, None)
            }
            SearchOutcome::Empty => {
                info!("Upstream {} search returned nothing; serving synthetic offers", domain);
                (generate(), OfferSource::Synthetic, Some(FallbackReason::EmptyResult))
            }
            SearchOutcome::Failed(SupplierError::Unsupported(what)) => {
                debug!("{} has no {} inventory; serving synthetic offers", self.supplier.name(), what);
                (generate(), OfferSource::Synthetic, Some(FallbackReason::NoInventory))
            }
            SearchOutcome::Failed(e) => {
                warn!("Upstream {} search via {} failed: {}", domain, self.supplier.name(), e);
                (generate(), OfferSource::Synthetic, Some(FallbackReason::UpstreamFailure))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use chrono::{NaiveDate, Utc};
    use rust_decimal::Decimal;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;
    use std::time::Duration;
    use wayfare_core::iata::{LocationKind, LocationMatch};
    use wayfare_core::repository::{RepositoryError, SettingsRepository};
    use wayfare_core::settings::StoredSettings;
    use wayfare_core::PricingSettings;

    use crate::generator::{SYNTHETIC_APARTMENT_COUNT, SYNTHETIC_CAR_COUNT, SYNTHETIC_FLIGHT_COUNT, SYNTHETIC_HOTEL_MAX, SYNTHETIC_HOTEL_MIN};

    #[derive(Clone, Copy)]
    enum Mode {
        Fail,
        Empty,
        Serve,
    }

    struct StubSupplier {
        mode: Mode,
        calls: AtomicUsize,
        last_flight: Mutex<Option<FlightSearchCriteria>>,
    }

    impl StubSupplier {
        fn new(mode: Mode) -> Arc<Self> {
            Arc::new(Self {
                mode,
                calls: AtomicUsize::new(0),
                last_flight: Mutex::new(None),
            })
        }

        fn answer<T>(&self, served: impl FnOnce() -> T, empty: T) -> Result<T, SupplierError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            match self.mode {
                Mode::Fail => Err(SupplierError::Status {
                    status: 503,
                    message: "maintenance".to_string(),
                }),
                Mode::Empty => Ok(empty),
                Mode::Serve => Ok(served()),
            }
        }
    }

    fn upstream_flight() -> FlightOffer {
        FlightOffer {
            id: "1".to_string(),
            one_way: true,
            number_of_bookable_seats: 4,
            validating_airline_codes: vec!["TP".to_string()],
            itineraries: vec![],
            base_price: Decimal::new(450, 0),
            currency: "EUR".to_string(),
        }
    }

    #[async_trait]
    impl InventorySupplier for StubSupplier {
        async fn search_flights(&self, criteria: &FlightSearchCriteria) -> Result<FlightOfferBatch, SupplierError> {
            *self.last_flight.lock().unwrap() = Some(criteria.clone());
            self.answer(
                || FlightOfferBatch {
                    offers: vec![upstream_flight()],
                    carriers: BTreeMap::from([("TP".to_string(), "TAP PORTUGAL".to_string())]),
                },
                FlightOfferBatch::default(),
            )
        }

        async fn search_hotels(&self, _criteria: &HotelSearchCriteria) -> Result<Vec<HotelOffer>, SupplierError> {
            self.answer(Vec::new, Vec::new())
        }

        async fn search_cars(&self, _criteria: &CarSearchCriteria) -> Result<Vec<CarOffer>, SupplierError> {
            self.answer(Vec::new, Vec::new())
        }

        fn name(&self) -> &'static str {
            "stub"
        }
    }

    struct CityLookup;

    #[async_trait]
    impl LocationLookup for CityLookup {
        async fn lookup(&self, keyword: &str) -> Result<Vec<LocationMatch>, SupplierError> {
            if keyword.eq_ignore_ascii_case("lisbon") {
                Ok(vec![LocationMatch {
                    iata_code: Some("LIS".to_string()),
                    name: "LISBON".to_string(),
                    kind: LocationKind::City,
                }])
            } else {
                Err(SupplierError::Transport("unreachable".to_string()))
            }
        }
    }

    struct BrokenSettings;

    #[async_trait]
    impl SettingsRepository for BrokenSettings {
        async fn fetch(&self) -> Result<Option<StoredSettings>, RepositoryError> {
            Err(RepositoryError::Unavailable("down".to_string()))
        }

        async fn upsert(&self, _settings: &PricingSettings) -> Result<StoredSettings, RepositoryError> {
            Err(RepositoryError::Unavailable("down".to_string()))
        }
    }

    struct FixedSettings(PricingSettings);

    #[async_trait]
    impl SettingsRepository for FixedSettings {
        async fn fetch(&self) -> Result<Option<StoredSettings>, RepositoryError> {
            Ok(Some(StoredSettings {
                settings: self.0,
                updated_at: Some(Utc::now()),
            }))
        }

        async fn upsert(&self, settings: &PricingSettings) -> Result<StoredSettings, RepositoryError> {
            Ok(StoredSettings {
                settings: *settings,
                updated_at: Some(Utc::now()),
            })
        }
    }

    fn service(supplier: Arc<StubSupplier>, repo: Arc<dyn SettingsRepository>, policy: FallbackPolicy) -> OfferSearchService {
        OfferSearchService::new(
            supplier,
            Arc::new(CityLookup),
            Arc::new(SettingsCache::new(repo, Duration::from_secs(300))),
            SyntheticGenerator::seeded(7),
            policy,
        )
    }

    fn flight_criteria() -> FlightSearchCriteria {
        FlightSearchCriteria {
            origin: "PAR".to_string(),
            destination: "Lisbon".to_string(),
            departure_date: NaiveDate::from_ymd_opt(2024, 12, 20).unwrap(),
            return_date: None,
            adults: 1,
        }
    }

    #[tokio::test]
    async fn test_failing_upstream_serves_fixed_synthetic_sets() {
        let supplier = StubSupplier::new(Mode::Fail);
        let service = service(supplier.clone(), Arc::new(BrokenSettings), FallbackPolicy::default());

        let flights = service.search_flights(flight_criteria()).await;
        assert_eq!(flights.results.offers.len(), SYNTHETIC_FLIGHT_COUNT);
        assert_eq!(flights.results.source, OfferSource::Synthetic);
        assert_eq!(flights.results.fallback_reason, Some(FallbackReason::UpstreamFailure));

        let cars = service
            .search_cars(CarSearchCriteria {
                location: "NCE".to_string(),
                pickup_date: None,
                passengers: 1,
            })
            .await;
        assert_eq!(cars.offers.len(), SYNTHETIC_CAR_COUNT);

        let hotels = service
            .search_hotels(HotelSearchCriteria {
                destination: "ROM".to_string(),
                check_in: None,
                check_out: None,
                adults: 1,
            })
            .await;
        assert!((SYNTHETIC_HOTEL_MIN..=SYNTHETIC_HOTEL_MAX).contains(&hotels.offers.len()));

        let apartments = service
            .search_apartments(ApartmentSearchCriteria {
                destination: "Porto".to_string(),
                check_in: None,
                check_out: None,
                guests: 2,
            })
            .await;
        assert_eq!(apartments.offers.len(), SYNTHETIC_APARTMENT_COUNT);
        assert_eq!(apartments.source, OfferSource::Synthetic);
        assert_eq!(apartments.fallback_reason, Some(FallbackReason::NoInventory));

        assert_eq!(supplier.calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_synthetic_flights_use_resolved_codes_and_default_markup() {
        let supplier = StubSupplier::new(Mode::Fail);
        let service = service(supplier.clone(), Arc::new(BrokenSettings), FallbackPolicy::default());

        let flights = service.search_flights(flight_criteria()).await;

        let sent = supplier.last_flight.lock().unwrap().clone().unwrap();
        assert_eq!(sent.destination, "LIS");

        let engine = PricingEngine::default();
        for priced in &flights.results.offers {
            let segments = &priced.offer.itineraries[0].segments;
            assert_eq!(segments.last().unwrap().arrival.iata_code, "LIS");
            let expected = engine.apply_margin(priced.offer.base_price, &PricingSettings::default());
            assert_eq!(priced.final_price, expected.final_price);
        }
        assert_eq!(flights.carriers.len(), SYNTHETIC_FLIGHT_COUNT);
    }

    #[tokio::test]
    async fn test_upstream_offers_are_priced_with_stored_settings() {
        let supplier = StubSupplier::new(Mode::Serve);
        let settings = PricingSettings::new(Decimal::new(10, 0), Decimal::ZERO, Decimal::ZERO);
        let service = service(supplier, Arc::new(FixedSettings(settings)), FallbackPolicy::default());

        let flights = service.search_flights(flight_criteria()).await;

        assert_eq!(flights.results.source, OfferSource::Upstream);
        assert_eq!(flights.results.fallback_reason, None);
        assert_eq!(flights.results.offers.len(), 1);
        assert_eq!(flights.results.offers[0].final_price, Decimal::new(46_000, 2));
        assert_eq!(flights.results.offers[0].original_base_price, Decimal::new(45_000, 2));
        assert_eq!(flights.carriers.get("TP").map(String::as_str), Some("TAP PORTUGAL"));
    }

    #[tokio::test]
    async fn test_empty_upstream_substituted_by_default() {
        let service = service(StubSupplier::new(Mode::Empty), Arc::new(BrokenSettings), FallbackPolicy::default());

        let flights = service.search_flights(flight_criteria()).await;
        assert_eq!(flights.results.source, OfferSource::Synthetic);
        assert_eq!(flights.results.fallback_reason, Some(FallbackReason::EmptyResult));
        assert_eq!(flights.results.offers.len(), SYNTHETIC_FLIGHT_COUNT);
    }

    #[tokio::test]
    async fn test_empty_upstream_kept_when_fallback_disabled() {
        let policy = FallbackPolicy {
            fallback_on_empty: false,
        };
        let service = service(StubSupplier::new(Mode::Empty), Arc::new(BrokenSettings), policy);

        let hotels = service
            .search_hotels(HotelSearchCriteria {
                destination: "ROM".to_string(),
                check_in: None,
                check_out: None,
                adults: 1,
            })
            .await;
        assert!(hotels.offers.is_empty());
        assert_eq!(hotels.source, OfferSource::Upstream);

        let flights = service.search_flights(flight_criteria()).await;
        assert!(flights.results.offers.is_empty());
        assert!(flights.carriers.is_empty());
    }

    #[test]
    fn test_outcome_tags() {
        let found: SearchOutcome<Vec<u8>> = SearchOutcome::from_result(Ok(vec![1]), Vec::is_empty);
        assert!(matches!(found, SearchOutcome::Found(_)));

        let empty: SearchOutcome<Vec<u8>> = SearchOutcome::from_result(Ok(vec![]), Vec::is_empty);
        assert!(matches!(empty, SearchOutcome::Empty));

        let failed: SearchOutcome<Vec<u8>> =
            SearchOutcome::from_result(Err(SupplierError::Decode("bad json".to_string())), Vec::is_empty);
        assert!(matches!(failed, SearchOutcome::Failed(_)));
    }
}
