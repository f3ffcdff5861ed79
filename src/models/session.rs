use crate::error::{DiscoveryError, Result};
use crate::models::coordinate::Coordinate;
use crate::models::filter::FilterCriteria;
use crate::models::restaurant::Restaurant;
use crate::services::filter_pipeline::apply_filters;

pub const DEFAULT_ORIGIN_LABEL: &str = "Your Location";
pub const DEFAULT_QUERY: &str = "restaurant";
pub const DEFAULT_RADIUS_METERS: u32 = 5000;
pub const MAX_RADIUS_METERS: u32 = 50_000;

/// Key prefix every Google Maps Platform API key starts with.
const CREDENTIAL_PREFIX: &str = "AIza";

/// Identity of a search request within one session. Later searches always
/// carry a larger token.
pub type RequestToken = u64;

/// Everything a search needs, captured when it starts so the session can be
/// released while the provider is being queried.
#[derive(Clone, Debug, PartialEq)]
pub struct SearchTicket {
    pub token: RequestToken,
    pub query: String,
    pub origin: Coordinate,
    pub radius_meters: u32,
    pub credential: String,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SearchOutcome {
    Applied,
    /// A newer search started after this one; its results were dropped.
    Stale,
}

/// State of one user's discovery session.
#[derive(Clone, Debug)]
pub struct SessionState {
    credential: Option<String>,
    origin: Option<Coordinate>,
    origin_label: String,
    radius_meters: u32,
    last_query: Option<String>,
    last_results: Vec<Restaurant>,
    visible_results: Vec<Restaurant>,
    active_criteria: FilterCriteria,
    latest_request: RequestToken,
}

impl Default for SessionState {
    fn default() -> Self {
        Self {
            credential: None,
            origin: None,
            origin_label: DEFAULT_ORIGIN_LABEL.to_string(),
            radius_meters: DEFAULT_RADIUS_METERS,
            last_query: None,
            last_results: Vec::new(),
            visible_results: Vec::new(),
            active_criteria: FilterCriteria::default(),
            latest_request: 0,
        }
    }
}

impl SessionState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts a session with a previously stored credential.
    pub fn with_credential(credential: &str) -> Result<Self> {
        let mut session = Self::default();
        session.set_credential(credential)?;
        Ok(session)
    }

    pub fn set_credential(&mut self, credential: &str) -> Result<()> {
        self.credential = Some(validate_credential(credential)?);
        Ok(())
    }

    pub fn credential(&self) -> Option<&str> {
        self.credential.as_deref()
    }

    pub fn origin(&self) -> Option<Coordinate> {
        self.origin
    }

    pub fn origin_label(&self) -> &str {
        &self.origin_label
    }

    pub fn radius_meters(&self) -> u32 {
        self.radius_meters
    }

    pub fn last_query(&self) -> Option<&str> {
        self.last_query.as_deref()
    }

    pub fn last_results(&self) -> &[Restaurant] {
        &self.last_results
    }

    pub fn visible_results(&self) -> &[Restaurant] {
        &self.visible_results
    }

    pub fn active_criteria(&self) -> &FilterCriteria {
        &self.active_criteria
    }

    /// Moves the search origin. Cached results were measured from the old
    /// origin, so they are dropped and any search still in flight is
    /// invalidated.
    pub fn set_origin(&mut self, origin: Coordinate, label: impl Into<String>) {
        let label = label.into();
        self.origin = Some(origin);
        self.origin_label = if label.trim().is_empty() {
            DEFAULT_ORIGIN_LABEL.to_string()
        } else {
            label
        };
        self.latest_request += 1;
        self.last_query = None;
        self.last_results.clear();
        self.visible_results.clear();
    }

    /// Names the current origin, provided it is still `origin`. A label
    /// resolved for a position the user has since moved away from is ignored.
    pub fn relabel_origin(&mut self, origin: Coordinate, label: &str) -> bool {
        if self.origin != Some(origin) || label.trim().is_empty() {
            return false;
        }
        self.origin_label = label.to_string();
        true
    }

    pub fn set_radius(&mut self, radius_meters: Option<i64>) {
        self.radius_meters = normalize_radius(radius_meters);
    }

    /// Replaces the active criteria and replays them over the cached results.
    pub fn set_criteria(&mut self, criteria: FilterCriteria) -> &[Restaurant] {
        self.active_criteria = criteria;
        self.refilter();
        &self.visible_results
    }

    /// Reserves a request token for a new search. Any search started earlier
    /// becomes stale from this point on.
    pub fn begin_search(&mut self, query: Option<&str>) -> Result<SearchTicket> {
        let credential = self
            .credential
            .clone()
            .ok_or_else(|| DiscoveryError::invalid_input("an API key is required before searching"))?;
        let origin = self
            .origin
            .ok_or_else(|| DiscoveryError::invalid_input("a location is required before searching"))?;

        let query = match query.map(str::trim) {
            Some(term) if !term.is_empty() => term.to_string(),
            _ => DEFAULT_QUERY.to_string(),
        };

        self.latest_request += 1;
        Ok(SearchTicket {
            token: self.latest_request,
            query,
            origin,
            radius_meters: self.radius_meters,
            credential,
        })
    }

    /// Installs the results of a finished search, unless a newer search has
    /// started since, in which case they are discarded.
    pub fn complete_search(&mut self, ticket: &SearchTicket, results: Vec<Restaurant>) -> SearchOutcome {
        if ticket.token != self.latest_request {
            return SearchOutcome::Stale;
        }

        self.last_query = Some(ticket.query.clone());
        self.last_results = results;
        self.refilter();
        SearchOutcome::Applied
    }

    /// Header line describing the current result set.
    pub fn results_heading(&self) -> String {
        match self.last_query.as_deref() {
            Some(query) if query != DEFAULT_QUERY => {
                format!("\"{}\" restaurants near {}", query, self.origin_label)
            }
            _ => format!("Restaurants near {}", self.origin_label),
        }
    }

    fn refilter(&mut self) {
        self.visible_results = apply_filters(&self.last_results, &self.active_criteria);
    }
}

/// Trims a credential and checks it looks like a Maps API key.
pub fn validate_credential(credential: &str) -> Result<String> {
    let credential = credential.trim();
    if credential.is_empty() {
        return Err(DiscoveryError::invalid_input("API key must not be empty"));
    }
    if !credential.starts_with(CREDENTIAL_PREFIX) {
        return Err(DiscoveryError::invalid_input(format!(
            "Invalid API key format. Should start with \"{}\"",
            CREDENTIAL_PREFIX
        )));
    }

    Ok(credential.to_string())
}

/// Falls back to the default radius when none, or an out-of-range one, is given.
pub fn normalize_radius(radius_meters: Option<i64>) -> u32 {
    match radius_meters {
        Some(radius) if (1..=i64::from(MAX_RADIUS_METERS)).contains(&radius) => radius as u32,
        _ => DEFAULT_RADIUS_METERS,
    }
}
