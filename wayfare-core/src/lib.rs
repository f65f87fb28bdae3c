pub mod iata;
pub mod offer;
pub mod repository;
pub mod search;
pub mod settings;
pub mod supplier;

pub use offer::{ApartmentOffer, CarOffer, FlightOffer, FlightOfferBatch, HotelOffer};
pub use settings::PricingSettings;

#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("Validation failed: {0}")]
    ValidationError(String),
    #[error("Internal service error: {0}")]
    InternalError(String),
}

pub type CoreResult<T> = Result<T, CoreError>;
