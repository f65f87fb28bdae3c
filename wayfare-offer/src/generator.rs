//! Synthetic offer sets used when live inventory yields nothing.
//!
//! Shapes and counts are fixed; prices and ratings are jittered. Every
//! generator embeds the search criteria (route codes, city, dates) and never
//! fails, so the whole search path can run offline.

use std::collections::BTreeMap;

use chrono::{Duration, NaiveDate, NaiveDateTime, NaiveTime};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rust_decimal::Decimal;
use wayfare_core::offer::{Itinerary, Segment, SegmentEndpoint, Vehicle};
use wayfare_core::search::{ApartmentSearchCriteria, CarSearchCriteria, FlightSearchCriteria, HotelSearchCriteria};
use wayfare_core::{ApartmentOffer, CarOffer, FlightOffer, FlightOfferBatch, HotelOffer};

pub const SYNTHETIC_FLIGHT_COUNT: usize = 8;
pub const SYNTHETIC_CAR_COUNT: usize = 5;
pub const SYNTHETIC_APARTMENT_COUNT: usize = 8;
pub const SYNTHETIC_HOTEL_MIN: usize = 7;
pub const SYNTHETIC_HOTEL_MAX: usize = 10;

const CURRENCY: &str = "EUR";

struct Carrier {
    code: &'static str,
    name: &'static str,
    hub: Option<&'static str>,
}

const CARRIERS: [Carrier; SYNTHETIC_FLIGHT_COUNT] = [
    Carrier { code: "AF", name: "AIR FRANCE", hub: Some("CDG") },
    Carrier { code: "LH", name: "LUFTHANSA", hub: Some("FRA") },
    Carrier { code: "BA", name: "BRITISH AIRWAYS", hub: Some("LHR") },
    Carrier { code: "KL", name: "KLM ROYAL DUTCH AIRLINES", hub: Some("AMS") },
    Carrier { code: "IB", name: "IBERIA", hub: Some("MAD") },
    Carrier { code: "TK", name: "TURKISH AIRLINES", hub: Some("IST") },
    Carrier { code: "U2", name: "EASYJET", hub: None },
    Carrier { code: "FR", name: "RYANAIR", hub: None },
];

struct HotelArchetype {
    name: &'static str,
    stars: f32,
    nightly: i64,
    street: &'static str,
    image: &'static str,
}

const HOTELS: [HotelArchetype; SYNTHETIC_HOTEL_MAX] = [
    HotelArchetype { name: "Grand Palace", stars: 5.0, nightly: 320, street: "Boulevard Central", image: "https://images.unsplash.com/photo-1566073771259-6a8506099945" },
    HotelArchetype { name: "Riverside Suites", stars: 4.5, nightly: 210, street: "Quay Street", image: "https://images.unsplash.com/photo-1551882547-ff40c63fe5fa" },
    HotelArchetype { name: "Old Town Boutique", stars: 4.0, nightly: 165, street: "Market Square", image: "https://images.unsplash.com/photo-1542314831-068cd1dbfeeb" },
    HotelArchetype { name: "Business Center Hotel", stars: 4.0, nightly: 140, street: "Commerce Avenue", image: "https://images.unsplash.com/photo-1520250497591-112f2f40a3f4" },
    HotelArchetype { name: "Garden Inn", stars: 3.5, nightly: 110, street: "Park Lane", image: "https://images.unsplash.com/photo-1445019980597-93fa8acb246c" },
    HotelArchetype { name: "Station Lodge", stars: 3.0, nightly: 85, street: "Railway Road", image: "https://images.unsplash.com/photo-1590490360182-c33d57733427" },
    HotelArchetype { name: "Budget Stay", stars: 2.5, nightly: 60, street: "Harbour Street", image: "https://images.unsplash.com/photo-1611892440504-42a792e24d32" },
    HotelArchetype { name: "Skyline Tower", stars: 4.5, nightly: 240, street: "Skyline Drive", image: "https://images.unsplash.com/photo-1564501049412-61c2a3083791" },
    HotelArchetype { name: "Seaside Resort", stars: 4.0, nightly: 190, street: "Beach Promenade", image: "https://images.unsplash.com/photo-1571896349842-33c89424de2d" },
    HotelArchetype { name: "Urban Hostel", stars: 2.0, nightly: 35, street: "University Street", image: "https://images.unsplash.com/photo-1555854877-bab0e564b8d5" },
];

struct CarCategory {
    category: &'static str,
    code: &'static str,
    model: &'static str,
    seats: u32,
    bags: u32,
    daily: i64,
    provider: &'static str,
}

const CARS: [CarCategory; SYNTHETIC_CAR_COUNT] = [
    CarCategory { category: "ECONOMY", code: "ECMR", model: "Fiat 500 or similar", seats: 4, bags: 1, daily: 32, provider: "Europcar" },
    CarCategory { category: "COMPACT", code: "CDMR", model: "Volkswagen Golf or similar", seats: 5, bags: 2, daily: 41, provider: "Hertz" },
    CarCategory { category: "SUV", code: "IFAR", model: "Toyota RAV4 or similar", seats: 5, bags: 3, daily: 68, provider: "Sixt" },
    CarCategory { category: "PREMIUM", code: "PDAR", model: "BMW 5 Series or similar", seats: 5, bags: 3, daily: 95, provider: "Avis" },
    CarCategory { category: "VAN", code: "FVMR", model: "Mercedes Vito or similar", seats: 9, bags: 5, daily: 110, provider: "Enterprise" },
];

struct ApartmentArchetype {
    title: &'static str,
    bedrooms: u32,
    max_guests: u32,
    nightly: i64,
    street: &'static str,
    image: &'static str,
}

const APARTMENTS: [ApartmentArchetype; SYNTHETIC_APARTMENT_COUNT] = [
    ApartmentArchetype { title: "Cosy studio", bedrooms: 0, max_guests: 2, nightly: 55, street: "Rue des Artistes", image: "https://images.unsplash.com/photo-1522708323590-d24dbb6b0267" },
    ApartmentArchetype { title: "Bright one-bedroom flat", bedrooms: 1, max_guests: 3, nightly: 75, street: "Canal Walk", image: "https://images.unsplash.com/photo-1502672260266-1c1ef2d93688" },
    ApartmentArchetype { title: "Historic centre loft", bedrooms: 1, max_guests: 2, nightly: 95, street: "Cathedral Lane", image: "https://images.unsplash.com/photo-1493809842364-78817add7ffb" },
    ApartmentArchetype { title: "Family apartment with balcony", bedrooms: 2, max_guests: 5, nightly: 120, street: "Linden Avenue", image: "https://images.unsplash.com/photo-1560448204-e02f11c3d0e2" },
    ApartmentArchetype { title: "Design penthouse", bedrooms: 3, max_guests: 6, nightly: 260, street: "Tower Heights", image: "https://images.unsplash.com/photo-1600585154340-be6161a56a0c" },
    ApartmentArchetype { title: "Garden maisonette", bedrooms: 2, max_guests: 4, nightly: 110, street: "Orchard Row", image: "https://images.unsplash.com/photo-1484154218962-a197022b5858" },
    ApartmentArchetype { title: "Waterfront two-bedroom", bedrooms: 2, max_guests: 4, nightly: 150, street: "Marina Quay", image: "https://images.unsplash.com/photo-1512918728675-ed5a9ecdebfd" },
    ApartmentArchetype { title: "Minimalist city pad", bedrooms: 1, max_guests: 2, nightly: 70, street: "Station Square", image: "https://images.unsplash.com/photo-1536376072261-38c75010e6c9" },
];

/// Builds synthetic offer sets.
///
/// With a seed every call replays the same sequence; without one each call
/// draws fresh entropy.
#[derive(Debug, Clone, Default)]
pub struct SyntheticGenerator {
    seed: Option<u64>,
}

impl SyntheticGenerator {
    pub fn new(seed: Option<u64>) -> Self {
        Self { seed }
    }

    pub fn seeded(seed: u64) -> Self {
        Self { seed: Some(seed) }
    }

    fn rng(&self) -> StdRng {
        match self.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        }
    }

    pub fn flights(&self, criteria: &FlightSearchCriteria) -> FlightOfferBatch {
        let mut rng = self.rng();
        let mut carriers = BTreeMap::new();
        let mut offers = Vec::with_capacity(SYNTHETIC_FLIGHT_COUNT);

        for (index, carrier) in CARRIERS.iter().enumerate() {
            carriers.insert(carrier.code.to_string(), carrier.name.to_string());

            let departure_hour = 6 + 2 * index as u32;
            let outbound = build_itinerary(
                &mut rng,
                carrier,
                &criteria.origin,
                &criteria.destination,
                at(criteria.departure_date, departure_hour),
            );

            let mut itineraries = vec![outbound];
            if let Some(return_date) = criteria.return_date {
                itineraries.push(build_itinerary(
                    &mut rng,
                    carrier,
                    &criteria.destination,
                    &criteria.origin,
                    at(return_date, 21 - departure_hour.min(15)),
                ));
            }

            let per_adult = Decimal::new(rng.gen_range(8_000..=65_000), 2);
            let legs = Decimal::from(itineraries.len() as u32);
            let base_price = per_adult * legs * Decimal::from(criteria.adults);

            offers.push(FlightOffer {
                id: format!("SYN-{}", index + 1),
                one_way: criteria.return_date.is_none(),
                number_of_bookable_seats: rng.gen_range(1..=9),
                validating_airline_codes: vec![carrier.code.to_string()],
                itineraries,
                base_price,
                currency: CURRENCY.to_string(),
            });
        }

        FlightOfferBatch { offers, carriers }
    }

    pub fn hotels(&self, criteria: &HotelSearchCriteria) -> Vec<HotelOffer> {
        let mut rng = self.rng();
        let count = rng.gen_range(SYNTHETIC_HOTEL_MIN..=SYNTHETIC_HOTEL_MAX);
        let nights = stay_nights(criteria.check_in, criteria.check_out);

        HOTELS
            .iter()
            .take(count)
            .map(|archetype| {
                let nightly = jitter(&mut rng, archetype.nightly);
                HotelOffer {
                    id: random_id(&mut rng),
                    name: format!("{} {}", archetype.name, criteria.destination),
                    city_code: criteria.destination.clone(),
                    rating: rating(&mut rng, archetype.stars),
                    image: archetype.image.to_string(),
                    address: format!("{} {}, {}", rng.gen_range(1..=180), archetype.street, criteria.destination),
                    base_price: nightly * Decimal::from(nights),
                    currency: CURRENCY.to_string(),
                }
            })
            .collect()
    }

    pub fn cars(&self, criteria: &CarSearchCriteria) -> Vec<CarOffer> {
        let mut rng = self.rng();

        CARS.iter()
            .map(|car| CarOffer {
                id: random_id(&mut rng),
                category: car.category.to_string(),
                vehicle: Vehicle {
                    code: car.code.to_string(),
                    description: car.model.to_string(),
                    seats: car.seats.max(criteria.passengers.min(9)),
                    bags: car.bags,
                    image: None,
                },
                provider: format!("{} {}", car.provider, criteria.location),
                base_price: jitter(&mut rng, car.daily),
                currency: CURRENCY.to_string(),
            })
            .collect()
    }

    pub fn apartments(&self, criteria: &ApartmentSearchCriteria) -> Vec<ApartmentOffer> {
        let mut rng = self.rng();
        let nights = stay_nights(criteria.check_in, criteria.check_out);

        APARTMENTS
            .iter()
            .map(|archetype| {
                let nightly = jitter(&mut rng, archetype.nightly);
                ApartmentOffer {
                    id: random_id(&mut rng),
                    title: format!("{} in {}", archetype.title, criteria.destination),
                    city: criteria.destination.clone(),
                    address: format!("{} {}, {}", rng.gen_range(1..=90), archetype.street, criteria.destination),
                    bedrooms: archetype.bedrooms,
                    max_guests: archetype.max_guests.max(criteria.guests),
                    rating: rating(&mut rng, 4.8),
                    image: archetype.image.to_string(),
                    base_price: nightly * Decimal::from(nights),
                    currency: CURRENCY.to_string(),
                }
            })
            .collect()
    }
}

fn build_itinerary(
    rng: &mut StdRng,
    carrier: &Carrier,
    from: &str,
    to: &str,
    departure: NaiveDateTime,
) -> Itinerary {
    let connection = carrier
        .hub
        .filter(|hub| *hub != from && *hub != to && rng.gen_bool(0.4));

    let mut segments = Vec::new();
    let arrival = match connection {
        Some(hub) => {
            let first = segment(rng, carrier, from, hub, departure);
            let layover = rng.gen_range(55..=150);
            let second = segment(rng, carrier, hub, to, later(first.arrival.at, layover));
            let arrival = second.arrival.at;
            segments.push(first);
            segments.push(second);
            arrival
        }
        None => {
            let only = segment(rng, carrier, from, to, departure);
            let arrival = only.arrival.at;
            segments.push(only);
            arrival
        }
    };

    Itinerary {
        duration: iso_duration((arrival - departure).num_minutes()),
        segments,
    }
}

fn segment(rng: &mut StdRng, carrier: &Carrier, from: &str, to: &str, departure: NaiveDateTime) -> Segment {
    let minutes = rng.gen_range(70..=420);
    Segment {
        departure: SegmentEndpoint {
            iata_code: from.to_string(),
            at: departure,
        },
        arrival: SegmentEndpoint {
            iata_code: to.to_string(),
            at: later(departure, minutes),
        },
        carrier_code: carrier.code.to_string(),
        number: rng.gen_range(100..=9899).to_string(),
        duration: iso_duration(minutes),
        number_of_stops: 0,
    }
}

fn at(date: NaiveDate, hour: u32) -> NaiveDateTime {
    let time = NaiveTime::from_hms_opt(hour.min(23), 0, 0).unwrap_or_default();
    date.and_time(time)
}

/// Clamped at the last representable instant.
fn later(at: NaiveDateTime, minutes: i64) -> NaiveDateTime {
    at.checked_add_signed(Duration::minutes(minutes)).unwrap_or(at)
}

/// ISO 8601 duration in hours and minutes (`PT2H5M`).
fn iso_duration(minutes: i64) -> String {
    let minutes = minutes.max(0);
    format!("PT{}H{}M", minutes / 60, minutes % 60)
}

fn stay_nights(check_in: Option<NaiveDate>, check_out: Option<NaiveDate>) -> u32 {
    match (check_in, check_out) {
        (Some(start), Some(end)) => (end - start).num_days().clamp(1, 365) as u32,
        _ => 1,
    }
}

/// Base amount +/- 15%, in cents.
fn jitter(rng: &mut StdRng, base: i64) -> Decimal {
    let cents = base * 100;
    let spread = cents * 15 / 100;
    Decimal::new(rng.gen_range(cents - spread..=cents + spread), 2)
}

/// Rating a little below the nominal stars, one decimal place, never below 1.
fn rating(rng: &mut StdRng, stars: f32) -> f32 {
    let value = stars - rng.gen_range(0.0..0.6);
    ((value * 10.0).round() / 10.0).max(1.0)
}

fn random_id(rng: &mut StdRng) -> String {
    uuid::Builder::from_random_bytes(rng.gen()).into_uuid().to_string()
}
