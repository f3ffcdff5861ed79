use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use crate::error::DiscoveryError;

impl DiscoveryError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            DiscoveryError::InvalidInput(_) => StatusCode::BAD_REQUEST,
            DiscoveryError::NotFound(_) => StatusCode::NOT_FOUND,
            DiscoveryError::ProviderError { .. } => StatusCode::BAD_GATEWAY,
        }
    }
}

impl IntoResponse for DiscoveryError {
    fn into_response(self) -> Response {
        let body = match &self {
            DiscoveryError::ProviderError { status, detail } => json!({
                "error": detail,
                "providerStatus": status,
            }),
            other => json!({ "error": other.to_string() }),
        };

        (self.status_code(), Json(body)).into_response()
    }
}
