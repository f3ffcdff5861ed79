use axum::{Extension, Json, Router};
use axum::body::Bytes;
use axum::extract::Path;
use axum::response::IntoResponse;
use axum::routing::{get, post, put};
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_with::{serde_as, DisplayFromStr, PickFirst};
use tracing::{debug, warn};
use crate::controller::AppState;
use crate::error::{DiscoveryError, Result};
use crate::models::coordinate::Coordinate;
use crate::models::filter::FilterCriteria;
use crate::models::restaurant::Restaurant;
use crate::models::session::{SearchOutcome, SearchTicket, SessionState, DEFAULT_ORIGIN_LABEL};
use crate::repositories::session_repo::{SessionId, SessionRepo};
use crate::services::location_resolver::{resolve_address, resolve_city_name};
use crate::services::places_aggregator::search_places;

pub fn router(app_state: AppState) -> Router {
    Router::new()
        .route("/", post(open_session))
        .route("/:session_id", get(retrieve_session).delete(close_session))
        .route("/:session_id/credential", put(update_credential))
        .route("/:session_id/location", post(update_location))
        .route("/:session_id/search", post(search_restaurants))
        .route("/:session_id/filters", put(update_filters))
        .route_layer(Extension(app_state))
}

/// What a client sees of a session. The credential itself is never echoed.
#[derive(Clone, Serialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct SessionView {
    pub session_id: SessionId,
    pub has_credential: bool,
    pub origin: Option<Coordinate>,
    pub origin_label: String,
    pub radius_meters: u32,
    pub heading: String,
    pub criteria: FilterCriteria,
    pub total_results: usize,
    pub restaurants: Vec<Restaurant>,
}

impl SessionView {
    pub fn from_state(session_id: SessionId, state: &SessionState) -> Self {
        Self {
            session_id,
            has_credential: state.credential().is_some(),
            origin: state.origin(),
            origin_label: state.origin_label().to_string(),
            radius_meters: state.radius_meters(),
            heading: state.results_heading(),
            criteria: state.active_criteria().clone(),
            total_results: state.last_results().len(),
            restaurants: state.visible_results().to_vec(),
        }
    }
}

#[derive(Clone, Serialize, Debug)]
pub struct SearchView {
    /// False when the search was overtaken by a newer one, or never ran.
    pub applied: bool,
    #[serde(flatten)]
    pub session: SessionView,
}

#[derive(Clone, Serialize, Deserialize, Debug, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct CredentialBody {
    pub api_key: Option<String>,
}

#[derive(Clone, Serialize, Deserialize, Debug)]
#[serde(untagged)]
pub enum LocationBody {
    Address { address: String },
    Position { latitude: f64, longitude: f64 },
}

#[serde_as]
#[derive(Clone, Serialize, Deserialize, Debug, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct SearchBody {
    pub query: Option<String>,
    #[serde_as(as = "Option<PickFirst<(_, DisplayFromStr)>>")]
    pub radius: Option<i64>,
}

/// Decodes a body the client may leave out. Empty means defaults, anything
/// else must be well-formed.
fn optional_body<T: DeserializeOwned + Default>(body: &[u8]) -> Result<T> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(T::default());
    }

    serde_json::from_slice(body)
        .map_err(|e| DiscoveryError::invalid_input(format!("Malformed request body: {}", e)))
}

pub async fn open_session(
    Extension(app_state): Extension<AppState>,
    body: Bytes,
) -> impl IntoResponse {
    let body: CredentialBody = match optional_body(&body) {
        Ok(body) => body,
        Err(e) => return e.into_response(),
    };
    let session_res = app_state.session_repo
        .create_session(body.api_key.as_deref())
        .await;

    return match session_res {
        Ok((session_id, state)) => {
            (StatusCode::CREATED, Json(SessionView::from_state(session_id, &state))).into_response()
        }
        Err(e) => {
            warn!("Something went wrong opening a session due to: {}", e);
            e.into_response()
        }
    };
}

pub async fn retrieve_session(
    Extension(app_state): Extension<AppState>,
    Path(session_id): Path<SessionId>,
) -> impl IntoResponse {
    let view_res = app_state.session_repo
        .with_session(session_id, |state| SessionView::from_state(session_id, state))
        .await;

    return match view_res {
        Ok(view) => (StatusCode::OK, Json(view)).into_response(),
        Err(e) => e.into_response(),
    };
}

pub async fn close_session(
    Extension(app_state): Extension<AppState>,
    Path(session_id): Path<SessionId>,
) -> impl IntoResponse {
    return match app_state.session_repo.remove_session(session_id).await {
        Ok(_) => StatusCode::NO_CONTENT.into_response(),
        Err(e) => e.into_response(),
    };
}

pub async fn update_credential(
    Extension(app_state): Extension<AppState>,
    Path(session_id): Path<SessionId>,
    Json(body): Json<CredentialBody>,
) -> impl IntoResponse {
    let api_key = body.api_key.unwrap_or_default();
    let view_res = app_state.session_repo
        .with_session(session_id, |state| {
            state
                .set_credential(&api_key)
                .map(|_| SessionView::from_state(session_id, state))
        })
        .await
        .and_then(|view| view);

    return match view_res {
        Ok(view) => (StatusCode::OK, Json(view)).into_response(),
        Err(e) => {
            warn!("Something went wrong updating the API key of session {} due to: {}", session_id, e);
            e.into_response()
        }
    };
}

pub async fn update_location(
    Extension(app_state): Extension<AppState>,
    Path(session_id): Path<SessionId>,
    Json(body): Json<LocationBody>,
) -> impl IntoResponse {
    return match relocate(&app_state, session_id, body).await {
        Ok(view) => (StatusCode::OK, Json(view)).into_response(),
        Err(e) => {
            warn!("Something went wrong setting the location of session {} due to: {}", session_id, e);
            e.into_response()
        }
    };
}

pub async fn search_restaurants(
    Extension(app_state): Extension<AppState>,
    Path(session_id): Path<SessionId>,
    body: Bytes,
) -> impl IntoResponse {
    let body: SearchBody = match optional_body(&body) {
        Ok(body) => body,
        Err(e) => return e.into_response(),
    };

    return match run_search(&app_state, session_id, body).await {
        Ok(view) => (StatusCode::OK, Json(view)).into_response(),
        Err(e) => {
            warn!("Something went wrong searching for restaurants in session {} due to: {}", session_id, e);
            e.into_response()
        }
    };
}

pub async fn update_filters(
    Extension(app_state): Extension<AppState>,
    Path(session_id): Path<SessionId>,
    Json(criteria): Json<FilterCriteria>,
) -> impl IntoResponse {
    let view_res = app_state.session_repo
        .with_session(session_id, |state| {
            state.set_criteria(criteria);
            SessionView::from_state(session_id, state)
        })
        .await;

    return match view_res {
        Ok(view) => (StatusCode::OK, Json(view)).into_response(),
        Err(e) => e.into_response(),
    };
}

/// Moves the session origin, then refreshes the nearby results from there.
///
/// For a device position the reverse lookup and the search run concurrently;
/// without a credential the position is stored under the generic label and
/// no search is made.
async fn relocate(
    app_state: &AppState,
    session_id: SessionId,
    location: LocationBody,
) -> Result<SearchView> {
    let provider = app_state.maps_provider.as_ref();
    let sessions = app_state.session_repo.as_ref();
    let credential = sessions
        .with_session(session_id, |state| state.credential().map(str::to_string))
        .await?;

    match location {
        LocationBody::Address { address } => {
            let credential = credential
                .ok_or_else(|| DiscoveryError::invalid_input("an API key is required to look up an address"))?;
            let origin = resolve_address(provider, &address, &credential).await?;

            let ticket = sessions
                .with_session(session_id, |state| {
                    state.set_origin(origin, address.trim());
                    state.begin_search(None)
                })
                .await??;
            let results = search_places(
                provider,
                &ticket.query,
                ticket.origin,
                Some(i64::from(ticket.radius_meters)),
                &ticket.credential,
            ).await?;

            finish_search(sessions, session_id, &ticket, results).await
        }
        LocationBody::Position { latitude, longitude } => {
            let origin = Coordinate::new(latitude, longitude)?;

            let credential = match credential {
                Some(credential) => credential,
                None => {
                    return sessions
                        .with_session(session_id, |state| {
                            state.set_origin(origin, DEFAULT_ORIGIN_LABEL);
                            SearchView {
                                applied: false,
                                session: SessionView::from_state(session_id, state),
                            }
                        })
                        .await;
                }
            };

            let ticket = sessions
                .with_session(session_id, |state| {
                    state.set_origin(origin, DEFAULT_ORIGIN_LABEL);
                    state.begin_search(None)
                })
                .await??;
            let (label_res, results_res) = futures::join!(
                resolve_city_name(provider, origin, &credential),
                search_places(
                    provider,
                    &ticket.query,
                    ticket.origin,
                    Some(i64::from(ticket.radius_meters)),
                    &ticket.credential,
                ),
            );

            let label = label_res?;
            sessions
                .with_session(session_id, |state| state.relabel_origin(origin, &label))
                .await?;

            finish_search(sessions, session_id, &ticket, results_res?).await
        }
    }
}

async fn run_search(
    app_state: &AppState,
    session_id: SessionId,
    body: SearchBody,
) -> Result<SearchView> {
    let sessions = app_state.session_repo.as_ref();
    let ticket = sessions
        .with_session(session_id, |state| {
            if body.radius.is_some() {
                state.set_radius(body.radius);
            }
            state.begin_search(body.query.as_deref())
        })
        .await??;

    let results = search_places(
        app_state.maps_provider.as_ref(),
        &ticket.query,
        ticket.origin,
        Some(i64::from(ticket.radius_meters)),
        &ticket.credential,
    ).await?;

    finish_search(sessions, session_id, &ticket, results).await
}

async fn finish_search(
    sessions: &SessionRepo,
    session_id: SessionId,
    ticket: &SearchTicket,
    results: Vec<Restaurant>,
) -> Result<SearchView> {
    sessions
        .with_session(session_id, |state| {
            let outcome = state.complete_search(ticket, results);
            if outcome == SearchOutcome::Stale {
                debug!("Discarding results of superseded search {} in session {}", ticket.token, session_id);
            }

            SearchView {
                applied: outcome == SearchOutcome::Applied,
                session: SessionView::from_state(session_id, state),
            }
        })
        .await
}

#[cfg(test)]
mod tests {
    use axum::http::StatusCode;
    use serde_json::{json, Value};
    use crate::controller::test_helpers::{app, app_with_default_key, send};
    use crate::repositories::test_support::{geocode_hit, place, places_ok, reverse_hit, StubMapsProvider, StubResponse};

    fn mixed_places() -> Value {
        let mut closed = place("closed", 1.2801, 103.8500);
        closed["opening_hours"] = json!({ "open_now": false });
        let mut unknown = place("unknown", 1.2802, 103.8501);
        unknown.as_object_mut().unwrap().remove("opening_hours");
        let mut pricey = place("pricey", 1.2803, 103.8502);
        pricey["price_level"] = json!(4);

        places_ok(vec![place("open", 1.2800, 103.8499), closed, unknown, pricey])
    }

    fn ids(body: &Value) -> Vec<String> {
        body["restaurants"]
            .as_array()
            .unwrap()
            .iter()
            .map(|r| r["id"].as_str().unwrap().to_string())
            .collect()
    }

    async fn open_session(app: &axum::Router, api_key: Option<&str>) -> String {
        let body = api_key.map(|key| json!({ "apiKey": key }));
        let (status, session) = send(app, "POST", "/api/sessions", body).await;
        assert_eq!(status, StatusCode::CREATED);
        session["sessionId"].as_str().unwrap().to_string()
    }

    #[tokio::test]
    async fn address_search_then_filter_without_requerying() {
        let app = app(StubMapsProvider::new()
            .with_forward(StubResponse::Json(geocode_hit(1.2800, 103.8500)))
            .with_places(StubResponse::Json(mixed_places())));
        let session_id = open_session(&app, Some("AIzaKey")).await;

        let (status, located) = send(
            &app,
            "POST",
            &format!("/api/sessions/{}/location", session_id),
            Some(json!({ "address": "Raffles Place" })),
        ).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(located["applied"], true);
        assert_eq!(located["originLabel"], "Raffles Place");
        assert_eq!(located["heading"], "Restaurants near Raffles Place");
        assert_eq!(ids(&located), vec!["open", "closed", "unknown", "pricey"]);

        let (status, filtered) = send(
            &app,
            "PUT",
            &format!("/api/sessions/{}/filters", session_id),
            Some(json!({ "maxPriceLevel": 2, "openNowOnly": true })),
        ).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(ids(&filtered), vec!["open"]);
        assert_eq!(filtered["totalResults"], 4);

        let (_, relaxed) = send(
            &app,
            "PUT",
            &format!("/api/sessions/{}/filters", session_id),
            Some(json!({})),
        ).await;
        assert_eq!(ids(&relaxed), vec!["open", "closed", "unknown", "pricey"]);
    }

    #[tokio::test]
    async fn query_search_uses_session_origin_and_radius() {
        let stub = StubMapsProvider::new()
            .with_forward(StubResponse::Json(geocode_hit(1.2800, 103.8500)))
            .with_places(StubResponse::Json(mixed_places()));
        let app = app(stub);
        let session_id = open_session(&app, Some("AIzaKey")).await;
        send(
            &app,
            "POST",
            &format!("/api/sessions/{}/location", session_id),
            Some(json!({ "address": "Raffles Place" })),
        ).await;

        let (status, searched) = send(
            &app,
            "POST",
            &format!("/api/sessions/{}/search", session_id),
            Some(json!({ "query": "laksa", "radius": "1000" })),
        ).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(searched["applied"], true);
        assert_eq!(searched["radiusMeters"], 1000);
        assert_eq!(searched["heading"], "\"laksa\" restaurants near Raffles Place");
    }

    #[tokio::test]
    async fn device_position_is_labelled_by_reverse_lookup() {
        let app = app(StubMapsProvider::new()
            .with_reverse(StubResponse::Json(reverse_hit(&[("Singapore", &["locality"])])))
            .with_places(StubResponse::Json(mixed_places())));
        let session_id = open_session(&app, Some("AIzaKey")).await;

        let (status, located) = send(
            &app,
            "POST",
            &format!("/api/sessions/{}/location", session_id),
            Some(json!({ "latitude": 1.2800, "longitude": 103.8500 })),
        ).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(located["originLabel"], "Singapore");
        assert_eq!(located["origin"], json!({ "latitude": 1.28, "longitude": 103.85 }));
        assert_eq!(ids(&located).len(), 4);
    }

    #[tokio::test]
    async fn device_position_survives_reverse_lookup_failure() {
        let app = app(StubMapsProvider::new()
            .with_reverse(StubResponse::Error(crate::error::DiscoveryError::provider("TRANSPORT", "reset")))
            .with_places(StubResponse::Json(mixed_places())));
        let session_id = open_session(&app, Some("AIzaKey")).await;

        let (status, located) = send(
            &app,
            "POST",
            &format!("/api/sessions/{}/location", session_id),
            Some(json!({ "latitude": 1.2800, "longitude": 103.8500 })),
        ).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(located["originLabel"], "Your Location");
        assert_eq!(located["applied"], true);
    }

    #[tokio::test]
    async fn position_without_key_is_stored_without_searching() {
        let app = app(StubMapsProvider::new().with_places(StubResponse::Json(mixed_places())));
        let session_id = open_session(&app, None).await;

        let (status, located) = send(
            &app,
            "POST",
            &format!("/api/sessions/{}/location", session_id),
            Some(json!({ "latitude": 1.2800, "longitude": 103.8500 })),
        ).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(located["applied"], false);
        assert_eq!(located["hasCredential"], false);
        assert!(ids(&located).is_empty());

        let (status, _) = send(&app, "POST", &format!("/api/sessions/{}/search", session_id), None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn address_without_key_is_rejected() {
        let app = app(StubMapsProvider::new());
        let session_id = open_session(&app, None).await;

        let (status, _) = send(
            &app,
            "POST",
            &format!("/api/sessions/{}/location", session_id),
            Some(json!({ "address": "Raffles Place" })),
        ).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn search_before_location_is_rejected() {
        let app = app(StubMapsProvider::new());
        let session_id = open_session(&app, Some("AIzaKey")).await;

        let (status, _) = send(&app, "POST", &format!("/api/sessions/{}/search", session_id), None).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn credentials_are_validated_and_never_echoed() {
        let app = app(StubMapsProvider::new());

        let (status, _) = send(&app, "POST", "/api/sessions", Some(json!({ "apiKey": "sk-nope" }))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let session_id = open_session(&app, None).await;
        let (status, updated) = send(
            &app,
            "PUT",
            &format!("/api/sessions/{}/credential", session_id),
            Some(json!({ "apiKey": "AIzaNewKey" })),
        ).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(updated["hasCredential"], true);
        assert!(!updated.to_string().contains("AIzaNewKey"));
    }

    #[tokio::test]
    async fn configured_key_is_restored_into_sessions() {
        let app = app_with_default_key(StubMapsProvider::new(), Some("AIzaConfigured"));

        let (_, session) = send(&app, "POST", "/api/sessions", None).await;

        assert_eq!(session["hasCredential"], true);
    }

    #[tokio::test]
    async fn closed_sessions_are_gone() {
        let app = app(StubMapsProvider::new());
        let session_id = open_session(&app, None).await;
        let uri = format!("/api/sessions/{}", session_id);

        let (status, _) = send(&app, "DELETE", &uri, None).await;
        assert_eq!(status, StatusCode::NO_CONTENT);

        let (status, _) = send(&app, "GET", &uri, None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn malformed_optional_bodies_are_rejected() {
        let app = app_with_default_key(StubMapsProvider::new(), Some("AIzaConfigured"));

        let (status, _) = send(&app, "POST", "/api/sessions", Some(json!({ "apiKey": 123 }))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let session_id = open_session(&app, None).await;
        let (status, _) = send(
            &app,
            "POST",
            &format!("/api/sessions/{}/search", session_id),
            Some(json!({ "radius": [] })),
        ).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn sessions_cannot_be_reached_by_guessing() {
        let app = app(StubMapsProvider::new().with_places(StubResponse::Json(mixed_places())));
        let session_id = open_session(&app, Some("AIzaVictim")).await;
        assert_eq!(uuid::Uuid::parse_str(&session_id).unwrap().get_version_num(), 4);

        let (status, _) = send(
            &app,
            "POST",
            "/api/sessions/1/location",
            Some(json!({ "latitude": 1.28, "longitude": 103.85 })),
        ).await;
        assert!(status.is_client_error());

        let stranger = uuid::Uuid::new_v4();
        let (status, _) = send(&app, "DELETE", &format!("/api/sessions/{}", stranger), None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (status, _) = send(&app, "GET", &format!("/api/sessions/{}", session_id), None).await;
        assert_eq!(status, StatusCode::OK);
    }

    #[tokio::test]
    async fn zero_results_search_is_bad_gateway() {
        let stub = StubMapsProvider::new()
            .with_forward(StubResponse::Json(geocode_hit(1.2800, 103.8500)))
            .with_places(StubResponse::Json(json!({ "status": "ZERO_RESULTS", "results": [] })));
        let app = app(stub);
        let session_id = open_session(&app, Some("AIzaKey")).await;

        let (status, body) = send(
            &app,
            "POST",
            &format!("/api/sessions/{}/location", session_id),
            Some(json!({ "address": "Raffles Place" })),
        ).await;

        assert_eq!(status, StatusCode::BAD_GATEWAY);
        assert_eq!(body["providerStatus"], "ZERO_RESULTS");
    }
}
