//! HTTP client for the upstream travel-inventory API (Amadeus self-service style).
//!
//! Authenticates with OAuth2 client credentials and caches the access token
//! until shortly before it expires. Every call is a single attempt; errors are
//! returned as [`SupplierError`] and absorbed by the search service.

use std::collections::{BTreeMap, HashMap};
use std::str::FromStr;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{NaiveDate, NaiveDateTime, NaiveTime, Utc};
use reqwest::{Client, RequestBuilder};
use rust_decimal::Decimal;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tokio::time::Instant;
use tracing::debug;
use wayfare_core::iata::{LocationKind, LocationMatch};
use wayfare_core::offer::{Itinerary, Segment, SegmentEndpoint, Vehicle};
use wayfare_core::search::{CarSearchCriteria, FlightSearchCriteria, HotelSearchCriteria};
use wayfare_core::supplier::{InventorySupplier, LocationLookup, SupplierError};
use wayfare_core::{CarOffer, FlightOffer, FlightOfferBatch, HotelOffer};

use crate::app_config::SupplierConfig;

const TOKEN_PATH: &str = "/v1/security/oauth2/token";
const LOCATIONS_PATH: &str = "/v1/reference-data/locations";
const FLIGHT_OFFERS_PATH: &str = "/v2/shopping/flight-offers";
const HOTELS_BY_CITY_PATH: &str = "/v1/reference-data/locations/hotels/by-city";
const HOTEL_OFFERS_PATH: &str = "/v3/shopping/hotel-offers";
const TRANSFER_OFFERS_PATH: &str = "/v1/shopping/transfer-offers";

/// Tokens are renewed this long before the upstream says they expire.
const TOKEN_EXPIRY_MARGIN: Duration = Duration::from_secs(30);

const HOTEL_PLACEHOLDER_IMAGE: &str = "https://images.unsplash.com/photo-1566073771259-6a8506099945";

#[derive(Debug, Clone)]
struct AccessToken {
    value: String,
    expires_at: Instant,
}

impl AccessToken {
    fn is_usable(&self, now: Instant) -> bool {
        now + TOKEN_EXPIRY_MARGIN < self.expires_at
    }
}

pub struct HttpInventoryClient {
    client: Client,
    base_url: String,
    client_id: String,
    client_secret: String,
    max_results: u32,
    token: Mutex<Option<AccessToken>>,
}

impl HttpInventoryClient {
    pub fn new(config: &SupplierConfig) -> Result<Self, SupplierError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()
            .map_err(|e| SupplierError::Transport(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            client_id: config.client_id.clone(),
            client_secret: config.client_secret.clone(),
            max_results: config.max_results.max(1),
            token: Mutex::new(None),
        })
    }

    /// False when no credentials are configured; every call then fails fast.
    pub fn is_configured(&self) -> bool {
        !self.client_id.is_empty() && !self.client_secret.is_empty()
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn access_token(&self) -> Result<String, SupplierError> {
        if !self.is_configured() {
            return Err(SupplierError::Authentication("no supplier credentials configured".to_string()));
        }

        let mut slot = self.token.lock().await;
        if let Some(token) = slot.as_ref().filter(|t| t.is_usable(Instant::now())) {
            return Ok(token.value.clone());
        }

        let response = self
            .client
            .post(self.url(TOKEN_PATH))
            .form(&[
                ("grant_type", "client_credentials"),
                ("client_id", self.client_id.as_str()),
                ("client_secret", self.client_secret.as_str()),
            ])
            .send()
            .await
            .map_err(|e| SupplierError::Authentication(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(SupplierError::Authentication(format!("HTTP {}: {}", status.as_u16(), message)));
        }

        let body: TokenResponse = response
            .json()
            .await
            .map_err(|e| SupplierError::Decode(format!("token response: {}", e)))?;

        debug!("Obtained supplier access token valid for {}s", body.expires_in);
        let token = AccessToken {
            value: body.access_token,
            expires_at: Instant::now() + Duration::from_secs(body.expires_in),
        };
        let value = token.value.clone();
        *slot = Some(token);
        Ok(value)
    }

    async fn send_json<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T, SupplierError> {
        let token = self.access_token().await?;

        let response = request
            .bearer_auth(token)
            .header("Accept", "application/json")
            .send()
            .await
            .map_err(|e| SupplierError::Transport(e.to_string()))?;

        let status = response.status();
        if status == 401 {
            // Token revoked upstream; the next call fetches a fresh one.
            *self.token.lock().await = None;
        }
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(SupplierError::Status {
                status: status.as_u16(),
                message,
            });
        }

        response
            .json()
            .await
            .map_err(|e| SupplierError::Decode(e.to_string()))
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str, query: &[(&str, String)]) -> Result<T, SupplierError> {
        self.send_json(self.client.get(self.url(path)).query(query)).await
    }
}

#[async_trait]
impl LocationLookup for HttpInventoryClient {
    async fn lookup(&self, keyword: &str) -> Result<Vec<LocationMatch>, SupplierError> {
        let query = [
            ("subType", "CITY,AIRPORT".to_string()),
            ("keyword", keyword.to_string()),
            ("page[limit]", "5".to_string()),
        ];
        let body: DataEnvelope<LocationDto> = self.get_json(LOCATIONS_PATH, &query).await?;
        Ok(body.data.into_iter().map(LocationMatch::from).collect())
    }
}

#[async_trait]
impl InventorySupplier for HttpInventoryClient {
    async fn search_flights(&self, criteria: &FlightSearchCriteria) -> Result<FlightOfferBatch, SupplierError> {
        let mut query = vec![
            ("originLocationCode", criteria.origin.clone()),
            ("destinationLocationCode", criteria.destination.clone()),
            ("departureDate", criteria.departure_date.to_string()),
            ("adults", criteria.adults.to_string()),
            ("max", self.max_results.to_string()),
        ];
        if let Some(return_date) = criteria.return_date {
            query.push(("returnDate", return_date.to_string()));
        }

        let body: FlightOffersResponse = self.get_json(FLIGHT_OFFERS_PATH, &query).await?;
        body.into_batch()
    }

    async fn search_hotels(&self, criteria: &HotelSearchCriteria) -> Result<Vec<HotelOffer>, SupplierError> {
        let listing: DataEnvelope<HotelListingDto> = self
            .get_json(HOTELS_BY_CITY_PATH, &[("cityCode", criteria.destination.clone())])
            .await?;

        let listings: Vec<HotelListingDto> = listing.data.into_iter().take(self.max_results as usize).collect();
        if listings.is_empty() {
            return Ok(Vec::new());
        }

        let hotel_ids = listings.iter().map(|h| h.hotel_id.as_str()).collect::<Vec<_>>().join(",");
        let mut query = vec![("hotelIds", hotel_ids), ("adults", criteria.adults.to_string())];
        if let Some(check_in) = criteria.check_in {
            query.push(("checkInDate", check_in.to_string()));
        }
        if let Some(check_out) = criteria.check_out {
            query.push(("checkOutDate", check_out.to_string()));
        }

        let offers: DataEnvelope<HotelOffersDto> = self.get_json(HOTEL_OFFERS_PATH, &query).await?;
        hotel_offers(&criteria.destination, listings, offers.data)
    }

    async fn search_cars(&self, criteria: &CarSearchCriteria) -> Result<Vec<CarOffer>, SupplierError> {
        let request = TransferSearchRequest {
            start_location_code: criteria.location.clone(),
            end_location_code: criteria.location.clone(),
            start_date_time: pickup_time(criteria.pickup_date),
            passengers: criteria.passengers,
            transfer_type: "PRIVATE",
        };

        let body: DataEnvelope<TransferOfferDto> = self
            .send_json(self.client.post(self.url(TRANSFER_OFFERS_PATH)).json(&request))
            .await?;

        body.data.into_iter().map(CarOffer::try_from).collect()
    }

    fn name(&self) -> &'static str {
        "amadeus"
    }
}

/// Pickups default to 10:00 on the given day, or tomorrow.
fn pickup_time(date: Option<NaiveDate>) -> NaiveDateTime {
    let day = date.unwrap_or_else(|| Utc::now().date_naive() + chrono::Duration::days(1));
    day.and_time(NaiveTime::from_hms_opt(10, 0, 0).unwrap_or_default())
}

fn parse_amount(value: &str) -> Result<Decimal, SupplierError> {
    Decimal::from_str(value.trim()).map_err(|e| SupplierError::Decode(format!("invalid amount '{}': {}", value, e)))
}

// ============================================================================
// Wire types
// ============================================================================

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    expires_in: u64,
}

#[derive(Debug, Deserialize)]
struct DataEnvelope<T> {
    #[serde(default = "Vec::new")]
    data: Vec<T>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LocationDto {
    #[serde(default)]
    sub_type: Option<String>,
    #[serde(default)]
    name: String,
    #[serde(default)]
    iata_code: Option<String>,
}

impl From<LocationDto> for LocationMatch {
    fn from(dto: LocationDto) -> Self {
        let kind = match dto.sub_type.as_deref() {
            Some("CITY") => LocationKind::City,
            Some("AIRPORT") => LocationKind::Airport,
            _ => LocationKind::Other,
        };
        LocationMatch {
            iata_code: dto.iata_code,
            name: dto.name,
            kind,
        }
    }
}

#[derive(Debug, Deserialize)]
struct FlightOffersResponse {
    #[serde(default)]
    data: Vec<FlightOfferDto>,
    #[serde(default)]
    dictionaries: Option<DictionariesDto>,
}

#[derive(Debug, Default, Deserialize)]
struct DictionariesDto {
    #[serde(default)]
    carriers: BTreeMap<String, String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct FlightOfferDto {
    id: String,
    #[serde(default)]
    one_way: bool,
    #[serde(default)]
    number_of_bookable_seats: u32,
    #[serde(default)]
    validating_airline_codes: Vec<String>,
    itineraries: Vec<ItineraryDto>,
    price: FlightPriceDto,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ItineraryDto {
    #[serde(default)]
    duration: String,
    segments: Vec<SegmentDto>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SegmentDto {
    departure: EndpointDto,
    arrival: EndpointDto,
    carrier_code: String,
    number: String,
    #[serde(default)]
    duration: String,
    #[serde(default)]
    number_of_stops: u32,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct EndpointDto {
    iata_code: String,
    at: NaiveDateTime,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct FlightPriceDto {
    currency: String,
    total: String,
    #[serde(default)]
    grand_total: Option<String>,
}

impl FlightOffersResponse {
    fn into_batch(self) -> Result<FlightOfferBatch, SupplierError> {
        let offers = self
            .data
            .into_iter()
            .map(FlightOffer::try_from)
            .collect::<Result<Vec<_>, _>>()?;

        Ok(FlightOfferBatch {
            offers,
            carriers: self.dictionaries.unwrap_or_default().carriers,
        })
    }
}

impl TryFrom<FlightOfferDto> for FlightOffer {
    type Error = SupplierError;

    // The amount the traveller pays upstream (grand total, else total) is the markup base.
    fn try_from(dto: FlightOfferDto) -> Result<Self, Self::Error> {
        let amount = dto.price.grand_total.as_deref().unwrap_or(&dto.price.total);
        Ok(FlightOffer {
            id: dto.id,
            one_way: dto.one_way,
            number_of_bookable_seats: dto.number_of_bookable_seats,
            validating_airline_codes: dto.validating_airline_codes,
            itineraries: dto.itineraries.into_iter().map(Itinerary::from).collect(),
            base_price: parse_amount(amount)?,
            currency: dto.price.currency,
        })
    }
}

impl From<ItineraryDto> for Itinerary {
    fn from(dto: ItineraryDto) -> Self {
        Itinerary {
            duration: dto.duration,
            segments: dto
                .segments
                .into_iter()
                .map(|s| Segment {
                    departure: SegmentEndpoint {
                        iata_code: s.departure.iata_code,
                        at: s.departure.at,
                    },
                    arrival: SegmentEndpoint {
                        iata_code: s.arrival.iata_code,
                        at: s.arrival.at,
                    },
                    carrier_code: s.carrier_code,
                    number: s.number,
                    duration: s.duration,
                    number_of_stops: s.number_of_stops,
                })
                .collect(),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct HotelListingDto {
    hotel_id: String,
    #[serde(default)]
    name: String,
    #[serde(default)]
    rating: Option<f32>,
    #[serde(default)]
    address: Option<AddressDto>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AddressDto {
    #[serde(default)]
    lines: Vec<String>,
    #[serde(default)]
    city_name: Option<String>,
}

impl AddressDto {
    fn render(&self) -> String {
        let mut parts = self.lines.clone();
        parts.extend(self.city_name.clone());
        parts.join(", ")
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct HotelOffersDto {
    hotel: HotelRefDto,
    #[serde(default)]
    available: Option<bool>,
    #[serde(default)]
    offers: Vec<HotelRoomOfferDto>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct HotelRefDto {
    hotel_id: String,
    #[serde(default)]
    name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct HotelRoomOfferDto {
    id: String,
    price: HotelPriceDto,
}

#[derive(Debug, Deserialize)]
struct HotelPriceDto {
    currency: String,
    total: String,
}

/// One offer per available hotel: its cheapest room.
fn hotel_offers(
    city_code: &str,
    listings: Vec<HotelListingDto>,
    offers: Vec<HotelOffersDto>,
) -> Result<Vec<HotelOffer>, SupplierError> {
    let listings: HashMap<String, HotelListingDto> =
        listings.into_iter().map(|l| (l.hotel_id.clone(), l)).collect();

    let mut hotels = Vec::new();
    for entry in offers.into_iter().filter(|o| o.available.unwrap_or(true)) {
        let mut cheapest: Option<(Decimal, HotelRoomOfferDto)> = None;
        for room in entry.offers {
            let amount = parse_amount(&room.price.total)?;
            if cheapest.as_ref().map_or(true, |(best, _)| amount < *best) {
                cheapest = Some((amount, room));
            }
        }
        let Some((amount, room)) = cheapest else {
            continue;
        };

        let listing = listings.get(&entry.hotel.hotel_id);
        let name = entry
            .hotel
            .name
            .or_else(|| listing.map(|l| l.name.clone()))
            .unwrap_or_else(|| entry.hotel.hotel_id.clone());

        hotels.push(HotelOffer {
            id: room.id,
            name,
            city_code: city_code.to_string(),
            rating: listing.and_then(|l| l.rating).unwrap_or(0.0),
            image: HOTEL_PLACEHOLDER_IMAGE.to_string(),
            address: listing
                .and_then(|l| l.address.as_ref())
                .map(AddressDto::render)
                .unwrap_or_default(),
            base_price: amount,
            currency: room.price.currency,
        });
    }
    Ok(hotels)
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct TransferSearchRequest {
    start_location_code: String,
    end_location_code: String,
    start_date_time: NaiveDateTime,
    passengers: u32,
    transfer_type: &'static str,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TransferOfferDto {
    id: String,
    vehicle: TransferVehicleDto,
    #[serde(default)]
    service_provider: Option<ServiceProviderDto>,
    quotation: QuotationDto,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TransferVehicleDto {
    code: String,
    category: String,
    #[serde(default)]
    description: String,
    #[serde(default)]
    seats: Vec<CountDto>,
    #[serde(default)]
    baggages: Vec<CountDto>,
    #[serde(default, rename = "imageURL")]
    image_url: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CountDto {
    #[serde(default)]
    count: u32,
}

#[derive(Debug, Deserialize)]
struct ServiceProviderDto {
    name: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct QuotationDto {
    monetary_amount: String,
    currency_code: String,
}

impl TryFrom<TransferOfferDto> for CarOffer {
    type Error = SupplierError;

    fn try_from(dto: TransferOfferDto) -> Result<Self, Self::Error> {
        let total = |counts: &[CountDto]| counts.iter().map(|c| c.count).sum::<u32>();
        Ok(CarOffer {
            id: dto.id,
            category: dto.vehicle.category,
            vehicle: Vehicle {
                code: dto.vehicle.code,
                description: dto.vehicle.description,
                seats: total(&dto.vehicle.seats),
                bags: total(&dto.vehicle.baggages),
                image: dto.vehicle.image_url,
            },
            provider: dto.service_provider.map(|p| p.name).unwrap_or_default(),
            base_price: parse_amount(&dto.quotation.monetary_amount)?,
            currency: dto.quotation.currency_code,
        })
    }
}
