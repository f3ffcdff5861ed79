use std::sync::Arc;
use axum::{Extension, Json, Router};
use axum::response::IntoResponse;
use axum::routing::post;
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use serde_json::json;
use serde_with::{serde_as, DisplayFromStr, PickFirst};
use tracing::warn;
use crate::controller::AppState;
use crate::error::DiscoveryError;
use crate::models::coordinate::Coordinate;
use crate::repositories::MapsProvider;
use crate::services::places_aggregator::search_places;

pub fn router(app_state: AppState) -> Router {
    Router::new()
        .route("/places-search", post(search_restaurants))
        .route_layer(Extension(app_state.maps_provider))
}

/// Body of a one-shot search. The radius may arrive as a number or as the
/// string value of a form select.
#[serde_as]
#[derive(Clone, Serialize, Deserialize, Debug, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct PlacesSearchBody {
    pub query: String,
    pub location: Option<Coordinate>,
    #[serde_as(as = "Option<PickFirst<(_, DisplayFromStr)>>")]
    pub radius: Option<i64>,
    pub api_key: String,
}

pub async fn search_restaurants(
    Extension(maps_provider): Extension<Arc<dyn MapsProvider>>,
    Json(body): Json<PlacesSearchBody>,
) -> impl IntoResponse {
    let restaurants_res = match body.location {
        Some(origin) => {
            search_places(
                maps_provider.as_ref(),
                &body.query,
                origin,
                body.radius,
                &body.api_key,
            ).await
        }
        None => Err(DiscoveryError::invalid_input("location is required")),
    };

    return match restaurants_res {
        Ok(restaurants) => {
            (StatusCode::OK, Json(json!({ "restaurants": restaurants }))).into_response()
        }
        Err(e) => {
            warn!("Something went wrong searching for restaurants due to: {}", e);
            e.into_response()
        }
    };
}
