//! Deterministic [`MapsProvider`] double for tests.

use std::sync::Mutex;
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde_json::{json, Value};
use crate::error::{DiscoveryError, Result};
use crate::models::coordinate::Coordinate;
use crate::models::google::{GeocodeResponse, PlacesResponse};
use crate::repositories::{MapsProvider, TextSearchRequest};

#[derive(Clone, Debug)]
pub enum StubResponse {
    Json(Value),
    Error(DiscoveryError),
}

impl StubResponse {
    fn decode<T: DeserializeOwned>(&self) -> Result<T> {
        match self {
            StubResponse::Json(body) => serde_json::from_value(body.clone())
                .map_err(|e| DiscoveryError::provider("PARSE", e.to_string())),
            StubResponse::Error(error) => Err(error.clone()),
        }
    }
}

/// Text search call as seen by the stub.
#[derive(Clone, Debug, PartialEq)]
pub struct RecordedSearch {
    pub query: String,
    pub location: Coordinate,
    pub radius_meters: u32,
    pub credential: String,
}

/// Returns canned provider envelopes and records every search it receives.
pub struct StubMapsProvider {
    forward: StubResponse,
    reverse: StubResponse,
    places: StubResponse,
    searches: Mutex<Vec<RecordedSearch>>,
}

impl Default for StubMapsProvider {
    fn default() -> Self {
        Self {
            forward: StubResponse::Json(json!({ "status": "ZERO_RESULTS", "results": [] })),
            reverse: StubResponse::Json(json!({ "status": "ZERO_RESULTS", "results": [] })),
            places: StubResponse::Json(places_ok(Vec::new())),
            searches: Mutex::new(Vec::new()),
        }
    }
}

impl StubMapsProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_forward(mut self, response: StubResponse) -> Self {
        self.forward = response;
        self
    }

    pub fn with_reverse(mut self, response: StubResponse) -> Self {
        self.reverse = response;
        self
    }

    pub fn with_places(mut self, response: StubResponse) -> Self {
        self.places = response;
        self
    }

    pub fn searches(&self) -> Vec<RecordedSearch> {
        self.searches.lock().unwrap().clone()
    }
}

#[async_trait]
impl MapsProvider for StubMapsProvider {
    async fn forward_geocode(&self, _address: &str, _credential: &str) -> Result<GeocodeResponse> {
        self.forward.decode()
    }

    async fn reverse_geocode(&self, _coordinate: Coordinate, _credential: &str) -> Result<GeocodeResponse> {
        self.reverse.decode()
    }

    async fn text_search(&self, request: &TextSearchRequest<'_>, credential: &str) -> Result<PlacesResponse> {
        self.searches.lock().unwrap().push(RecordedSearch {
            query: request.query.to_string(),
            location: request.location,
            radius_meters: request.radius_meters,
            credential: credential.to_string(),
        });
        self.places.decode()
    }

    fn photo_url(&self, photo_reference: &str, credential: &str) -> String {
        format!("https://photos.test/{}?key={}", photo_reference, credential)
    }
}

/// Forward geocode envelope resolving to a single point.
pub fn geocode_hit(lat: f64, lng: f64) -> Value {
    json!({
        "status": "OK",
        "results": [{ "geometry": { "location": { "lat": lat, "lng": lng } } }],
    })
}

/// Reverse geocode envelope with the given `(long_name, types)` components.
pub fn reverse_hit(components: &[(&str, &[&str])]) -> Value {
    let components: Vec<Value> = components
        .iter()
        .map(|(name, types)| json!({ "long_name": name, "short_name": name, "types": types }))
        .collect();
    json!({ "status": "OK", "results": [{ "address_components": components }] })
}

/// A well-formed place entry.
pub fn place(id: &str, lat: f64, lng: f64) -> Value {
    json!({
        "place_id": id,
        "name": format!("Place {}", id),
        "formatted_address": format!("{} Orchard Road", id),
        "rating": 4.2,
        "price_level": 2,
        "photos": [{ "photo_reference": format!("photo-{}", id), "height": 400, "width": 600 }],
        "geometry": { "location": { "lat": lat, "lng": lng } },
        "opening_hours": { "open_now": true },
        "types": ["restaurant", "food", "point_of_interest"],
    })
}

pub fn places_ok(results: Vec<Value>) -> Value {
    json!({ "status": "OK", "results": results })
}
