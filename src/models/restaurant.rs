use serde::{Deserialize, Serialize, Serializer};
use crate::models::coordinate::Coordinate;

/// Whether the provider reported the place as currently open.
#[derive(Clone, Copy, Serialize, Deserialize, Debug, PartialEq, Eq, Default)]
#[serde(from = "Option<bool>", into = "Option<bool>")]
pub enum OpenStatus {
    Open,
    Closed,
    #[default]
    Unknown,
}

impl From<Option<bool>> for OpenStatus {
    fn from(flag: Option<bool>) -> Self {
        match flag {
            Some(true) => OpenStatus::Open,
            Some(false) => OpenStatus::Closed,
            None => OpenStatus::Unknown,
        }
    }
}

impl From<OpenStatus> for Option<bool> {
    fn from(status: OpenStatus) -> Self {
        match status {
            OpenStatus::Open => Some(true),
            OpenStatus::Closed => Some(false),
            OpenStatus::Unknown => None,
        }
    }
}

/// A normalized place search result.
///
/// `distance_km` is measured from the origin of the search that produced the
/// record and is kept at full precision; it is only rounded when rendered.
#[derive(Clone, Serialize, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Restaurant {
    pub id: String,
    pub name: String,
    pub address: String,
    pub rating: f64,
    pub price_level: u8,
    pub image: Option<String>,
    #[serde(flatten)]
    pub coordinate: Coordinate,
    pub open_now: OpenStatus,
    pub types: Vec<String>,
    #[serde(rename = "distance", serialize_with = "serialize_rounded_km")]
    pub distance_km: f64,
}

impl Restaurant {
    pub fn is_open(&self) -> bool {
        self.open_now == OpenStatus::Open
    }
}

fn serialize_rounded_km<S: Serializer>(distance_km: &f64, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(&format!("{:.2}", distance_km))
}
