use tracing::{debug, instrument, warn};
use crate::error::{DiscoveryError, LocationError};
use crate::models::coordinate::Coordinate;
use crate::models::google::{GeocodeResponse, STATUS_OK};
use crate::models::session::DEFAULT_ORIGIN_LABEL;
use crate::repositories::MapsProvider;

const CITY_COMPONENT: &str = "locality";
const REGION_COMPONENT: &str = "administrative_area_level_1";

/// Forward-geocodes `address`, taking the provider's first candidate.
#[instrument(skip(provider, credential))]
pub async fn resolve_address(
    provider: &dyn MapsProvider,
    address: &str,
    credential: &str,
) -> Result<Coordinate, LocationError> {
    let address = address.trim();
    if address.is_empty() {
        return Err(DiscoveryError::invalid_input("address must not be empty"));
    }
    require_credential(credential)?;

    let response = provider.forward_geocode(address, credential).await?;
    if response.status != STATUS_OK {
        debug!("Geocoder answered {} for the address", response.status);
        return Err(DiscoveryError::NotFound(format!("Location not found ({})", response.status)));
    }

    let first = response
        .results
        .first()
        .ok_or_else(|| DiscoveryError::NotFound("Location not found".to_string()))?;
    let location = first
        .geometry
        .as_ref()
        .map(|geometry| geometry.location)
        .ok_or_else(|| DiscoveryError::provider(STATUS_OK, "first geocode result has no geometry"))?;

    Coordinate::new(location.lat, location.lng)
        .map_err(|e| DiscoveryError::provider(STATUS_OK, format!("geocoder returned an invalid position: {}", e)))
}

/// Reverse-geocodes `coordinate` into a friendly place name.
///
/// Provider failures are not errors here: they degrade to the generic
/// "Your Location" label.
#[instrument(skip(provider, credential))]
pub async fn resolve_city_name(
    provider: &dyn MapsProvider,
    coordinate: Coordinate,
    credential: &str,
) -> Result<String, LocationError> {
    require_credential(credential)?;

    let name = match provider.reverse_geocode(coordinate, credential).await {
        Ok(response) => city_name_from(&response),
        Err(e) => {
            warn!("Reverse geocoding failed, using the fallback label: {}", e);
            None
        }
    };

    Ok(name.unwrap_or_else(|| DEFAULT_ORIGIN_LABEL.to_string()))
}

fn city_name_from(response: &GeocodeResponse) -> Option<String> {
    if response.status != STATUS_OK {
        return None;
    }

    let components = &response.results.first()?.address_components;
    let named = |kind: &str| {
        components
            .iter()
            .find(|component| component.types.iter().any(|t| t == kind))
            .map(|component| component.long_name.clone())
    };

    named(CITY_COMPONENT).or_else(|| named(REGION_COMPONENT))
}

fn require_credential(credential: &str) -> Result<(), LocationError> {
    if credential.trim().is_empty() {
        return Err(DiscoveryError::invalid_input("API key must not be empty"));
    }
    Ok(())
}
