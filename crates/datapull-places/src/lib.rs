//! Google Places (New) access for lead collection: the HTTP client, the
//! geocoder, the recursive area search and website contact enrichment.

pub mod client;
pub mod cost;
pub mod enrich;
pub mod error;
pub mod fetch;
pub mod geocode;
pub mod search;

pub use client::{Place, PlacesApi, PlacesClient, TextSearchPage};
pub use cost::{ApiCalls, CostBreakdown};
pub use enrich::ContactEnricher;
pub use error::{Error, Result};
pub use fetch::{FetchOutcome, LeadFetcher};
pub use geocode::{Geocoder, NominatimGeocoder};
pub use search::{AreaSearch, AreaSearchResult};
