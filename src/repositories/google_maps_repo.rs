use std::time::Duration;
use anyhow::Context;
use async_trait::async_trait;
use reqwest::{Client, Url};
use serde::de::DeserializeOwned;
use tracing::debug;
use crate::error::{DiscoveryError, Result};
use crate::models::coordinate::Coordinate;
use crate::models::google::{GeocodeResponse, PlacesResponse};
use crate::repositories::{MapsProvider, TextSearchRequest};

pub const DEFAULT_BASE_URL: &str = "https://maps.googleapis.com/maps/api";
pub const PHOTO_MAX_WIDTH: &str = "400";

const USER_AGENT: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"));

/// Google Maps Platform client for geocoding and places text search.
pub struct GoogleMapsRepo {
    client: Client,
    timeout: Duration,
    geocode_endpoint: Url,
    text_search_endpoint: Url,
    photo_endpoint: Url,
}

impl GoogleMapsRepo {
    pub fn new(
        base_url: &str,
        timeout: Duration,
    ) -> anyhow::Result<Self> {
        let base_url = base_url.trim_end_matches('/');
        let endpoint = |path: &str| {
            Url::parse(&format!("{}/{}", base_url, path))
                .with_context(|| format!("Invalid maps base url: {}", base_url))
        };

        let client = Client::builder()
            .user_agent(USER_AGENT)
            .connect_timeout(timeout)
            .timeout(timeout)
            .build()
            .context("Failed to build the maps HTTP client")?;

        Ok(Self {
            client,
            timeout,
            geocode_endpoint: endpoint("geocode/json")?,
            text_search_endpoint: endpoint("place/textsearch/json")?,
            photo_endpoint: endpoint("place/photo")?,
        })
    }

    async fn fetch<T: DeserializeOwned>(
        &self,
        endpoint: &Url,
        params: &[(&str, String)],
    ) -> Result<T> {
        let path = endpoint.path();
        debug!("Requesting maps endpoint: {}", path);

        let response = self
            .client
            .get(endpoint.clone())
            .query(params)
            .send()
            .await
            .map_err(|e| self.classify_transport_error(e, path))?
            .error_for_status()
            .map_err(|e| self.classify_transport_error(e, path))?;

        response
            .json::<T>()
            .await
            .map_err(|e| {
                DiscoveryError::provider("PARSE", format!("Malformed response from {}: {}", path, e.without_url()))
            })
    }

    /// Buckets a reqwest failure by cause. The message never includes the
    /// request URL, which carries the credential.
    fn classify_transport_error(&self, error: reqwest::Error, path: &str) -> DiscoveryError {
        if error.is_timeout() {
            return DiscoveryError::provider(
                "TIMEOUT",
                format!("{} did not answer within {}s", path, self.timeout.as_secs()),
            );
        }

        if let Some(status) = error.status() {
            return DiscoveryError::provider(
                format!("HTTP_{}", status.as_u16()),
                format!("{} responded with {}", path, status),
            );
        }

        DiscoveryError::provider(
            "TRANSPORT",
            format!("Request to {} failed: {}", path, error.without_url()),
        )
    }
}

#[async_trait]
impl MapsProvider for GoogleMapsRepo {
    async fn forward_geocode(&self, address: &str, credential: &str) -> Result<GeocodeResponse> {
        self.fetch(
            &self.geocode_endpoint,
            &[("address", address.to_string()), ("key", credential.to_string())],
        ).await
    }

    async fn reverse_geocode(&self, coordinate: Coordinate, credential: &str) -> Result<GeocodeResponse> {
        self.fetch(
            &self.geocode_endpoint,
            &[("latlng", lat_lng_param(coordinate)), ("key", credential.to_string())],
        ).await
    }

    async fn text_search(&self, request: &TextSearchRequest<'_>, credential: &str) -> Result<PlacesResponse> {
        self.fetch(
            &self.text_search_endpoint,
            &[
                ("query", request.query.to_string()),
                ("location", lat_lng_param(request.location)),
                ("radius", request.radius_meters.to_string()),
                ("key", credential.to_string()),
            ],
        ).await
    }

    fn photo_url(&self, photo_reference: &str, credential: &str) -> String {
        let mut url = self.photo_endpoint.clone();
        url.query_pairs_mut()
            .append_pair("maxwidth", PHOTO_MAX_WIDTH)
            .append_pair("photoreference", photo_reference)
            .append_pair("key", credential);
        url.into()
    }
}

fn lat_lng_param(coordinate: Coordinate) -> String {
    format!("{},{}", coordinate.latitude(), coordinate.longitude())
}
