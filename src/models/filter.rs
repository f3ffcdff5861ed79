use serde::{Deserialize, Serialize};

/// User-selected narrowing applied over the cached results.
#[derive(Clone, Serialize, Deserialize, Debug, PartialEq, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct FilterCriteria {
    pub max_price_level: Option<u8>,
    pub min_rating: f64,
    pub open_now_only: bool,
}

impl FilterCriteria {
    pub fn new(max_price_level: Option<u8>, min_rating: f64, open_now_only: bool) -> Self {
        Self {
            max_price_level,
            min_rating,
            open_now_only,
        }
    }
}
