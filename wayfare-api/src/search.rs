use std::collections::BTreeMap;

use axum::{
    extract::{rejection::QueryRejection, Query, State},
    routing::get,
    Json, Router,
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use wayfare_catalog::format_amount;
use wayfare_core::search::{
    ApartmentSearchCriteria, ApartmentSearchParams, CarSearchCriteria, CarSearchParams, FlightSearchCriteria,
    FlightSearchParams, HotelSearchCriteria, HotelSearchParams,
};
use wayfare_core::{ApartmentOffer, CarOffer, FlightOffer, HotelOffer};
use wayfare_offer::{FallbackReason, NormalizedOffer, OfferSource, SearchResults};

use crate::error::AppError;
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/search/flights", get(search_flights))
        .route("/search/hotels", get(search_hotels))
        .route("/search/cars", get(search_cars))
        .route("/search/apartments", get(search_apartments))
}

// ============================================================================
// Response views
// ============================================================================

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchMeta {
    pub source: OfferSource,
    pub count: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fallback_reason: Option<FallbackReason>,
}

#[derive(Debug, Serialize)]
pub struct SearchResponse<T> {
    pub data: Vec<T>,
    pub meta: SearchMeta,
}

#[derive(Debug, Serialize)]
pub struct FlightSearchResponse {
    pub data: Vec<FlightOfferView>,
    pub dictionaries: FlightDictionaries,
    pub meta: SearchMeta,
}

#[derive(Debug, Serialize)]
pub struct FlightDictionaries {
    pub carriers: BTreeMap<String, String>,
}

#[derive(Debug, Serialize)]
pub struct FlightOfferView {
    #[serde(flatten)]
    pub offer: FlightOffer,
    pub price: FlightPrice,
}

/// Amounts are decimal strings with two places.
#[derive(Debug, Serialize)]
pub struct FlightPrice {
    pub total: String,
    pub currency: String,
    pub original_base: String,
}

/// Stay price as a JSON number.
#[derive(Debug, Serialize)]
pub struct StayPrice {
    #[serde(with = "rust_decimal::serde::float")]
    pub amount: Decimal,
    pub currency: String,
}

#[derive(Debug, Serialize)]
pub struct HotelOfferView {
    #[serde(flatten)]
    pub offer: HotelOffer,
    pub price: StayPrice,
}

#[derive(Debug, Serialize)]
pub struct ApartmentOfferView {
    #[serde(flatten)]
    pub offer: ApartmentOffer,
    pub price: StayPrice,
}

#[derive(Debug, Serialize)]
pub struct CarOfferView {
    #[serde(flatten)]
    pub offer: CarOffer,
    pub quotation: Quotation,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Quotation {
    pub monetary_amount: String,
    pub currency_code: String,
}

impl From<NormalizedOffer<FlightOffer>> for FlightOfferView {
    fn from(normalized: NormalizedOffer<FlightOffer>) -> Self {
        let price = FlightPrice {
            total: format_amount(normalized.final_price),
            currency: normalized.offer.currency.clone(),
            original_base: format_amount(normalized.original_base_price),
        };
        Self {
            offer: normalized.offer,
            price,
        }
    }
}

impl From<NormalizedOffer<HotelOffer>> for HotelOfferView {
    fn from(normalized: NormalizedOffer<HotelOffer>) -> Self {
        let price = StayPrice {
            amount: normalized.final_price,
            currency: normalized.offer.currency.clone(),
        };
        Self {
            offer: normalized.offer,
            price,
        }
    }
}

impl From<NormalizedOffer<ApartmentOffer>> for ApartmentOfferView {
    fn from(normalized: NormalizedOffer<ApartmentOffer>) -> Self {
        let price = StayPrice {
            amount: normalized.final_price,
            currency: normalized.offer.currency.clone(),
        };
        Self {
            offer: normalized.offer,
            price,
        }
    }
}

impl From<NormalizedOffer<CarOffer>> for CarOfferView {
    fn from(normalized: NormalizedOffer<CarOffer>) -> Self {
        let quotation = Quotation {
            monetary_amount: format_amount(normalized.final_price),
            currency_code: normalized.offer.currency.clone(),
        };
        Self {
            offer: normalized.offer,
            quotation,
        }
    }
}

fn compose<T, V: From<NormalizedOffer<T>>>(results: SearchResults<T>) -> SearchResponse<V> {
    let data: Vec<V> = results.offers.into_iter().map(V::from).collect();
    SearchResponse {
        meta: SearchMeta {
            source: results.source,
            count: data.len(),
            fallback_reason: results.fallback_reason,
        },
        data,
    }
}

// ============================================================================
// Handlers
// ============================================================================

/// Turns the raw query into validated criteria before anything leaves the process.
fn validated<P, C>(query: Result<Query<P>, QueryRejection>) -> Result<C, AppError>
where
    C: TryFrom<P, Error = wayfare_core::CoreError>,
{
    let Query(params) = query.map_err(|e| AppError::ValidationError(e.body_text()))?;
    Ok(C::try_from(params)?)
}

async fn search_flights(
    State(state): State<AppState>,
    query: Result<Query<FlightSearchParams>, QueryRejection>,
) -> Result<Json<FlightSearchResponse>, AppError> {
    let criteria: FlightSearchCriteria = validated(query)?;

    let found = state.search.search_flights(criteria).await;
    let results = found.results;
    state.metrics.record("flights", results.source, results.fallback_reason);

    let data: Vec<FlightOfferView> = results.offers.into_iter().map(FlightOfferView::from).collect();
    Ok(Json(FlightSearchResponse {
        meta: SearchMeta {
            source: results.source,
            count: data.len(),
            fallback_reason: results.fallback_reason,
        },
        data,
        dictionaries: FlightDictionaries {
            carriers: found.carriers,
        },
    }))
}

async fn search_hotels(
    State(state): State<AppState>,
    query: Result<Query<HotelSearchParams>, QueryRejection>,
) -> Result<Json<SearchResponse<HotelOfferView>>, AppError> {
    let criteria: HotelSearchCriteria = validated(query)?;

    let results = state.search.search_hotels(criteria).await;
    state.metrics.record("hotels", results.source, results.fallback_reason);

    Ok(Json(compose(results)))
}

async fn search_cars(
    State(state): State<AppState>,
    query: Result<Query<CarSearchParams>, QueryRejection>,
) -> Result<Json<SearchResponse<CarOfferView>>, AppError> {
    let criteria: CarSearchCriteria = validated(query)?;

    let results = state.search.search_cars(criteria).await;
    state.metrics.record("cars", results.source, results.fallback_reason);

    Ok(Json(compose(results)))
}

async fn search_apartments(
    State(state): State<AppState>,
    query: Result<Query<ApartmentSearchParams>, QueryRejection>,
) -> Result<Json<SearchResponse<ApartmentOfferView>>, AppError> {
    let criteria: ApartmentSearchCriteria = validated(query)?;

    let results = state.search.search_apartments(criteria).await;
    state.metrics.record("apartments", results.source, results.fallback_reason);

    Ok(Json(compose(results)))
}

#[derive(Debug, Deserialize, Serialize)]
pub struct HealthResponse {
    pub status: String,
}

pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
    })
}
