use std::sync::Arc;
use axum::{Extension, Json, Router};
use axum::response::IntoResponse;
use axum::routing::post;
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::warn;
use crate::controller::AppState;
use crate::error::DiscoveryError;
use crate::models::coordinate::Coordinate;
use crate::repositories::MapsProvider;
use crate::services::location_resolver::{resolve_address, resolve_city_name};

pub fn router(app_state: AppState) -> Router {
    Router::new()
        .route("/geocode", post(geocode_address))
        .route("/reverse-geocode", post(reverse_geocode))
        .route_layer(Extension(app_state.maps_provider))
}

#[derive(Clone, Serialize, Deserialize, Debug, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct GeocodeBody {
    pub address: String,
    pub api_key: String,
}

pub async fn geocode_address(
    Extension(maps_provider): Extension<Arc<dyn MapsProvider>>,
    Json(body): Json<GeocodeBody>,
) -> impl IntoResponse {
    let coordinate_res = resolve_address(
        maps_provider.as_ref(),
        &body.address,
        &body.api_key,
    ).await;

    return match coordinate_res {
        Ok(coordinate) => {
            (StatusCode::OK, Json(json!({ "coordinates": coordinate }))).into_response()
        }
        Err(e) => {
            warn!("Something went wrong geocoding address due to: {}", e);
            e.into_response()
        }
    };
}

#[derive(Clone, Serialize, Deserialize, Debug, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct ReverseGeocodeBody {
    pub lat: Option<f64>,
    pub lng: Option<f64>,
    pub api_key: String,
}

pub async fn reverse_geocode(
    Extension(maps_provider): Extension<Arc<dyn MapsProvider>>,
    Json(body): Json<ReverseGeocodeBody>,
) -> impl IntoResponse {
    let coordinate_res = match (body.lat, body.lng) {
        (Some(lat), Some(lng)) => Coordinate::new(lat, lng),
        _ => Err(DiscoveryError::invalid_input("lat and lng are required")),
    };

    let city_res = match coordinate_res {
        Ok(coordinate) => resolve_city_name(maps_provider.as_ref(), coordinate, &body.api_key).await,
        Err(e) => Err(e),
    };

    return match city_res {
        Ok(city_name) => {
            (StatusCode::OK, Json(json!({ "cityName": city_name }))).into_response()
        }
        Err(e) => {
            warn!("Something went wrong reverse geocoding due to: {}", e);
            e.into_response()
        }
    };
}
