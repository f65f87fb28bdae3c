pub mod generator;
pub mod location;
pub mod normalizer;
pub mod service;

pub use generator::SyntheticGenerator;
pub use location::LocationResolver;
pub use normalizer::NormalizedOffer;
pub use service::{FallbackPolicy, FallbackReason, FlightSearchResults, OfferSearchService, OfferSource, SearchResults};
