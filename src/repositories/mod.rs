use async_trait::async_trait;
use crate::error::Result;
use crate::models::coordinate::Coordinate;
use crate::models::google::{GeocodeResponse, PlacesResponse};

pub mod google_maps_repo;
pub mod session_repo;

#[cfg(test)]
pub mod test_support;

/// Parameters of a places text search.
#[derive(Clone, Debug, PartialEq)]
pub struct TextSearchRequest<'a> {
    pub query: &'a str,
    pub location: Coordinate,
    pub radius_meters: u32,
}

/// The mapping provider the discovery pipeline talks to.
///
/// Implementations return the provider's response envelope as-is; status
/// interpretation happens in the services. Transport, timeout and decoding
/// failures surface as [`DiscoveryError::ProviderError`](crate::error::DiscoveryError).
#[async_trait]
pub trait MapsProvider: Send + Sync {
    async fn forward_geocode(&self, address: &str, credential: &str) -> Result<GeocodeResponse>;

    async fn reverse_geocode(&self, coordinate: Coordinate, credential: &str) -> Result<GeocodeResponse>;

    async fn text_search(&self, request: &TextSearchRequest<'_>, credential: &str) -> Result<PlacesResponse>;

    /// URL that fetches the referenced photo.
    fn photo_url(&self, photo_reference: &str, credential: &str) -> String;
}
