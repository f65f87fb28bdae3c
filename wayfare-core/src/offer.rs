use std::collections::BTreeMap;

use chrono::NaiveDateTime;
use rust_decimal::Decimal;
use serde::Serialize;

/// Common view over every domain's offer: the supplier's base price.
///
/// Base prices are never mutated; pricing produces derived amounts next to them.
pub trait PricedOffer {
    fn base_price(&self) -> Decimal;
    fn currency(&self) -> &str;
}

// ============================================================================
// Flights
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FlightOffer {
    pub id: String,
    pub one_way: bool,
    pub number_of_bookable_seats: u32,
    pub validating_airline_codes: Vec<String>,
    pub itineraries: Vec<Itinerary>,
    #[serde(skip)]
    pub base_price: Decimal,
    #[serde(skip)]
    pub currency: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Itinerary {
    /// ISO 8601 duration, e.g. `PT2H10M`.
    pub duration: String,
    pub segments: Vec<Segment>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Segment {
    pub departure: SegmentEndpoint,
    pub arrival: SegmentEndpoint,
    pub carrier_code: String,
    pub number: String,
    pub duration: String,
    pub number_of_stops: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SegmentEndpoint {
    pub iata_code: String,
    pub at: NaiveDateTime,
}

/// Flight offers together with the carrier dictionary (code -> name) they reference.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FlightOfferBatch {
    pub offers: Vec<FlightOffer>,
    pub carriers: BTreeMap<String, String>,
}

impl FlightOfferBatch {
    pub fn is_empty(&self) -> bool {
        self.offers.is_empty()
    }
}

impl PricedOffer for FlightOffer {
    fn base_price(&self) -> Decimal {
        self.base_price
    }

    fn currency(&self) -> &str {
        &self.currency
    }
}

// ============================================================================
// Hotels
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HotelOffer {
    pub id: String,
    pub name: String,
    pub city_code: String,
    /// Star rating, one decimal place.
    pub rating: f32,
    pub image: String,
    pub address: String,
    #[serde(skip)]
    pub base_price: Decimal,
    #[serde(skip)]
    pub currency: String,
}

impl PricedOffer for HotelOffer {
    fn base_price(&self) -> Decimal {
        self.base_price
    }

    fn currency(&self) -> &str {
        &self.currency
    }
}

// ============================================================================
// Cars
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CarOffer {
    pub id: String,
    pub category: String,
    pub vehicle: Vehicle,
    pub provider: String,
    #[serde(skip)]
    pub base_price: Decimal,
    #[serde(skip)]
    pub currency: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Vehicle {
    pub code: String,
    pub description: String,
    pub seats: u32,
    pub bags: u32,
    pub image: Option<String>,
}

impl PricedOffer for CarOffer {
    fn base_price(&self) -> Decimal {
        self.base_price
    }

    fn currency(&self) -> &str {
        &self.currency
    }
}

// ============================================================================
// Apartments
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApartmentOffer {
    pub id: String,
    pub title: String,
    pub city: String,
    pub address: String,
    pub bedrooms: u32,
    pub max_guests: u32,
    pub rating: f32,
    pub image: String,
    #[serde(skip)]
    pub base_price: Decimal,
    #[serde(skip)]
    pub currency: String,
}

impl PricedOffer for ApartmentOffer {
    fn base_price(&self) -> Decimal {
        self.base_price
    }

    fn currency(&self) -> &str {
        &self.currency
    }
}
