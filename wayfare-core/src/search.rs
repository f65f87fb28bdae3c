use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::{CoreError, CoreResult};

// ============================================================================
// Raw query parameters
// ============================================================================

/// Query string of `GET /search/flights`.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FlightSearchParams {
    pub origin: Option<String>,
    pub destination: Option<String>,
    pub date: Option<String>,
    pub return_date: Option<String>,
    pub adults: Option<u32>,
}

/// Query string of `GET /search/hotels`.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HotelSearchParams {
    pub destination: Option<String>,
    pub check_in: Option<String>,
    pub check_out: Option<String>,
    pub adults: Option<u32>,
}

/// Query string of `GET /search/cars`.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CarSearchParams {
    pub location: Option<String>,
    pub pickup_date: Option<String>,
    pub passengers: Option<u32>,
}

/// Query string of `GET /search/apartments`.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApartmentSearchParams {
    pub destination: Option<String>,
    pub check_in: Option<String>,
    pub check_out: Option<String>,
    pub guests: Option<u32>,
}

// ============================================================================
// Validated criteria
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FlightSearchCriteria {
    pub origin: String,
    pub destination: String,
    pub departure_date: NaiveDate,
    pub return_date: Option<NaiveDate>,
    pub adults: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HotelSearchCriteria {
    pub destination: String,
    pub check_in: Option<NaiveDate>,
    pub check_out: Option<NaiveDate>,
    pub adults: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CarSearchCriteria {
    pub location: String,
    pub pickup_date: Option<NaiveDate>,
    pub passengers: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ApartmentSearchCriteria {
    pub destination: String,
    pub check_in: Option<NaiveDate>,
    pub check_out: Option<NaiveDate>,
    pub guests: u32,
}

impl TryFrom<FlightSearchParams> for FlightSearchCriteria {
    type Error = CoreError;

    fn try_from(params: FlightSearchParams) -> CoreResult<Self> {
        let mut missing = Vec::new();
        let origin = required(params.origin, "origin", &mut missing);
        let destination = required(params.destination, "destination", &mut missing);
        let date = required(params.date, "date", &mut missing);
        reject_missing(&missing)?;

        let departure_date = parse_date("date", &date)?;
        let return_date = optional_date("returnDate", params.return_date)?;
        if return_date.is_some_and(|back| back < departure_date) {
            return Err(CoreError::ValidationError(
                "returnDate must not be before date".to_string(),
            ));
        }

        Ok(Self {
            origin,
            destination,
            departure_date,
            return_date,
            adults: at_least_one("adults", params.adults)?,
        })
    }
}

impl TryFrom<HotelSearchParams> for HotelSearchCriteria {
    type Error = CoreError;

    fn try_from(params: HotelSearchParams) -> CoreResult<Self> {
        let mut missing = Vec::new();
        let destination = required(params.destination, "destination", &mut missing);
        reject_missing(&missing)?;

        let check_in = optional_date("checkIn", params.check_in)?;
        let check_out = optional_date("checkOut", params.check_out)?;
        check_stay(check_in, check_out)?;

        Ok(Self {
            destination,
            check_in,
            check_out,
            adults: at_least_one("adults", params.adults)?,
        })
    }
}

impl TryFrom<CarSearchParams> for CarSearchCriteria {
    type Error = CoreError;

    fn try_from(params: CarSearchParams) -> CoreResult<Self> {
        let mut missing = Vec::new();
        let location = required(params.location, "location", &mut missing);
        reject_missing(&missing)?;

        Ok(Self {
            location,
            pickup_date: optional_date("pickupDate", params.pickup_date)?,
            passengers: at_least_one("passengers", params.passengers)?,
        })
    }
}

impl TryFrom<ApartmentSearchParams> for ApartmentSearchCriteria {
    type Error = CoreError;

    fn try_from(params: ApartmentSearchParams) -> CoreResult<Self> {
        let mut missing = Vec::new();
        let destination = required(params.destination, "destination", &mut missing);
        reject_missing(&missing)?;

        let check_in = optional_date("checkIn", params.check_in)?;
        let check_out = optional_date("checkOut", params.check_out)?;
        check_stay(check_in, check_out)?;

        Ok(Self {
            destination,
            check_in,
            check_out,
            guests: at_least_one("guests", params.guests)?,
        })
    }
}

const MIN_YEAR: i32 = 1;
const MAX_YEAR: i32 = 9999;

// Blank strings count as missing.
fn required(value: Option<String>, name: &'static str, missing: &mut Vec<&'static str>) -> String {
    match value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty()) {
        Some(v) => v,
        None => {
            missing.push(name);
            String::new()
        }
    }
}

fn reject_missing(missing: &[&str]) -> CoreResult<()> {
    if missing.is_empty() {
        Ok(())
    } else {
        Err(CoreError::ValidationError(format!(
            "Missing required parameters: {}",
            missing.join(", ")
        )))
    }
}

fn parse_date(name: &str, value: &str) -> CoreResult<NaiveDate> {
    let date = NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d").map_err(|_| {
        CoreError::ValidationError(format!("Invalid {}: expected YYYY-MM-DD, got '{}'", name, value))
    })?;

    if !(MIN_YEAR..=MAX_YEAR).contains(&date.year()) {
        return Err(CoreError::ValidationError(format!(
            "Invalid {}: year must be between {} and {}, got '{}'",
            name, MIN_YEAR, MAX_YEAR, value
        )));
    }
    Ok(date)
}

fn optional_date(name: &str, value: Option<String>) -> CoreResult<Option<NaiveDate>> {
    match value.filter(|v| !v.trim().is_empty()) {
        Some(v) => parse_date(name, &v).map(Some),
        None => Ok(None),
    }
}

fn at_least_one(name: &str, value: Option<u32>) -> CoreResult<u32> {
    match value {
        None => Ok(1),
        Some(0) => Err(CoreError::ValidationError(format!("{} must be at least 1", name))),
        Some(n) => Ok(n),
    }
}

fn check_stay(check_in: Option<NaiveDate>, check_out: Option<NaiveDate>) -> CoreResult<()> {
    if let (Some(start), Some(end)) = (check_in, check_out) {
        if end <= start {
            return Err(CoreError::ValidationError(
                "checkOut must be after checkIn".to_string(),
            ));
        }
    }
    Ok(())
}
