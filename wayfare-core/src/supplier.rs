use async_trait::async_trait;

use crate::iata::LocationMatch;
use crate::offer::{ApartmentOffer, CarOffer, FlightOfferBatch, HotelOffer};
use crate::search::{ApartmentSearchCriteria, CarSearchCriteria, FlightSearchCriteria, HotelSearchCriteria};

#[derive(Debug, thiserror::Error)]
pub enum SupplierError {
    #[error("Supplier authentication failed: {0}")]
    Authentication(String),
    #[error("Supplier request failed: {0}")]
    Transport(String),
    #[error("Supplier returned HTTP {status}: {message}")]
    Status { status: u16, message: String },
    #[error("Unreadable supplier response: {0}")]
    Decode(String),
    #[error("Supplier does not offer {0}")]
    Unsupported(&'static str),
}

/// Upstream travel-inventory search.
///
/// Location fields in the criteria are already resolved to codes where possible.
#[async_trait]
pub trait InventorySupplier: Send + Sync {
    async fn search_flights(&self, criteria: &FlightSearchCriteria) -> Result<FlightOfferBatch, SupplierError>;

    async fn search_hotels(&self, criteria: &HotelSearchCriteria) -> Result<Vec<HotelOffer>, SupplierError>;

    async fn search_cars(&self, criteria: &CarSearchCriteria) -> Result<Vec<CarOffer>, SupplierError>;

    /// Most inventory APIs carry no short-stay rentals.
    async fn search_apartments(
        &self,
        _criteria: &ApartmentSearchCriteria,
    ) -> Result<Vec<ApartmentOffer>, SupplierError> {
        Err(SupplierError::Unsupported("apartments"))
    }

    /// Provider name for logs and metrics
    fn name(&self) -> &'static str;
}

/// Free-text location lookup (cities and airports).
#[async_trait]
pub trait LocationLookup: Send + Sync {
    async fn lookup(&self, keyword: &str) -> Result<Vec<LocationMatch>, SupplierError>;
}
