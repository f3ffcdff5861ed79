//! Wire shapes returned by the Google Maps geocoding and places endpoints.
//!
//! Only the fields the discovery pipeline reads are modelled. Optional
//! fields stay optional here; defaults are applied when a place is
//! normalized into a [`Restaurant`](crate::models::restaurant::Restaurant).

use serde::Deserialize;
use serde_json::Value;
use serde_with::{serde_as, DefaultOnNull};

pub const STATUS_OK: &str = "OK";

#[serde_as]
#[derive(Clone, Deserialize, Debug)]
pub struct GeocodeResponse {
    pub status: String,
    #[serde_as(deserialize_as = "DefaultOnNull")]
    #[serde(default)]
    pub results: Vec<GeocodeResult>,
    #[serde(default)]
    pub error_message: Option<String>,
}

#[serde_as]
#[derive(Clone, Deserialize, Debug)]
pub struct GeocodeResult {
    #[serde(default)]
    pub geometry: Option<Geometry>,
    #[serde_as(deserialize_as = "DefaultOnNull")]
    #[serde(default)]
    pub address_components: Vec<AddressComponent>,
}

#[serde_as]
#[derive(Clone, Deserialize, Debug)]
pub struct AddressComponent {
    pub long_name: String,
    #[serde_as(deserialize_as = "DefaultOnNull")]
    #[serde(default)]
    pub types: Vec<String>,
}

#[derive(Clone, Deserialize, Debug)]
pub struct Geometry {
    pub location: LatLng,
}

#[derive(Clone, Copy, Deserialize, Debug)]
pub struct LatLng {
    pub lat: f64,
    pub lng: f64,
}

/// Places text search envelope.
///
/// Entries are kept as raw JSON so a single malformed place can be dropped
/// without failing the whole response.
#[serde_as]
#[derive(Clone, Deserialize, Debug)]
pub struct PlacesResponse {
    pub status: String,
    #[serde_as(deserialize_as = "DefaultOnNull")]
    #[serde(default)]
    pub results: Vec<Value>,
    #[serde(default)]
    pub error_message: Option<String>,
}

#[serde_as]
#[derive(Clone, Deserialize, Debug)]
pub struct PlaceResult {
    pub place_id: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub formatted_address: Option<String>,
    #[serde(default)]
    pub rating: Option<f64>,
    #[serde(default)]
    pub price_level: Option<i64>,
    #[serde_as(deserialize_as = "DefaultOnNull")]
    #[serde(default)]
    pub photos: Vec<Photo>,
    pub geometry: Geometry,
    #[serde(default)]
    pub opening_hours: Option<OpeningHours>,
    #[serde_as(deserialize_as = "DefaultOnNull")]
    #[serde(default)]
    pub types: Vec<String>,
}

#[derive(Clone, Deserialize, Debug)]
pub struct Photo {
    pub photo_reference: String,
}

#[derive(Clone, Deserialize, Debug)]
pub struct OpeningHours {
    #[serde(default)]
    pub open_now: Option<bool>,
}
