use serde_json::Value;
use tracing::{debug, instrument, warn};
use crate::error::{DiscoveryError, Result};
use crate::helpers::distance::haversine_distance_km;
use crate::models::coordinate::Coordinate;
use crate::models::google::{PlaceResult, STATUS_OK};
use crate::models::restaurant::{OpenStatus, Restaurant};
use crate::models::session::normalize_radius;
use crate::repositories::{MapsProvider, TextSearchRequest};

/// Upper bound on places taken from a single provider response.
pub const MAX_RESULTS: usize = 20;

const CUISINE_SUFFIX: &str = "restaurant";

/// Searches the provider for restaurants matching `query` around `origin`
/// and normalizes them, in provider order.
///
/// `radius_meters` falls back to the default radius when missing or out of
/// range. Entries that cannot be normalized are skipped.
#[instrument(skip(provider, credential))]
pub async fn search_places(
    provider: &dyn MapsProvider,
    query: &str,
    origin: Coordinate,
    radius_meters: Option<i64>,
    credential: &str,
) -> Result<Vec<Restaurant>> {
    let query = query.trim();
    if query.is_empty() {
        return Err(DiscoveryError::invalid_input("search query must not be empty"));
    }
    if credential.trim().is_empty() {
        return Err(DiscoveryError::invalid_input("API key must not be empty"));
    }

    let search_text = restaurant_query(query);
    let request = TextSearchRequest {
        query: &search_text,
        location: origin,
        radius_meters: normalize_radius(radius_meters),
    };
    let response = provider.text_search(&request, credential).await?;

    if response.status != STATUS_OK {
        let detail = response
            .error_message
            .unwrap_or_else(|| format!("Google Places API error: {}", response.status));
        return Err(DiscoveryError::provider(response.status, detail));
    }

    let restaurants: Vec<Restaurant> = response
        .results
        .into_iter()
        .take(MAX_RESULTS)
        .filter_map(|entry| normalize_place(provider, entry, origin, credential))
        .collect();
    debug!("Normalized {} places", restaurants.len());

    Ok(restaurants)
}

/// Text sent to the provider: the user's term qualified as a restaurant search.
pub fn restaurant_query(query: &str) -> String {
    if query.to_lowercase().contains(CUISINE_SUFFIX) {
        query.to_string()
    } else {
        format!("{} {}", query, CUISINE_SUFFIX)
    }
}

fn normalize_place(
    provider: &dyn MapsProvider,
    entry: Value,
    origin: Coordinate,
    credential: &str,
) -> Option<Restaurant> {
    let place: PlaceResult = match serde_json::from_value(entry) {
        Ok(place) => place,
        Err(e) => {
            warn!("Dropping malformed place entry: {}", e);
            return None;
        }
    };

    let location = place.geometry.location;
    let coordinate = match Coordinate::new(location.lat, location.lng) {
        Ok(coordinate) => coordinate,
        Err(e) => {
            warn!("Dropping place {} with unusable geometry: {}", place.place_id, e);
            return None;
        }
    };

    let image = place
        .photos
        .first()
        .map(|photo| provider.photo_url(&photo.photo_reference, credential));

    Some(Restaurant {
        name: place.name.unwrap_or_default(),
        address: place.formatted_address.unwrap_or_default(),
        rating: place.rating.filter(|r| r.is_finite()).unwrap_or(0.0).clamp(0.0, 5.0),
        price_level: place.price_level.unwrap_or(0).clamp(0, 4) as u8,
        image,
        coordinate,
        open_now: OpenStatus::from(place.opening_hours.and_then(|hours| hours.open_now)),
        types: place.types,
        distance_km: haversine_distance_km(origin, coordinate),
        id: place.place_id,
    })
}
