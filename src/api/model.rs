//! Wire types for published station resources.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Identifier of a published resource, numeric or textual depending on the backend.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ResourceId {
    Number(u64),
    Text(String),
}

impl fmt::Display for ResourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResourceId::Number(n) => write!(f, "{}", n),
            ResourceId::Text(s) => f.write_str(s),
        }
    }
}

impl From<u64> for ResourceId {
    fn from(id: u64) -> Self {
        ResourceId::Number(id)
    }
}

impl From<&str> for ResourceId {
    fn from(id: &str) -> Self {
        ResourceId::Text(id.to_string())
    }
}

/// One published media record.
///
/// Fields the client does not model are kept in `extra` untouched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceRecord {
    pub url: String,
    pub seq: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<ResourceId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub playout_time: Option<f64>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

/// One advertising schedule in the station configuration shape.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdConfig {
    #[serde(default)]
    pub code: Option<String>,
    #[serde(default)]
    pub media_type: Option<String>,
    #[serde(default)]
    pub start_date: Option<String>,
    #[serde(default)]
    pub end_date: Option<String>,
    #[serde(default)]
    pub video_list: Vec<ResourceRecord>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum Listing {
    Records(Vec<ResourceRecord>),
    Wrapped {
        resources: Vec<ResourceRecord>,
    },
    Station {
        #[serde(rename = "adConfigList")]
        ad_config_list: Vec<AdConfig>,
    },
}

/// Parse a resource listing body.
///
/// Accepts a bare array, `{"resources": [...]}`, or the station
/// configuration shape, whose first schedule's `videoList` is used.
pub fn parse_listing(body: &str) -> Result<Vec<ResourceRecord>, serde_json::Error> {
    let listing: Listing = serde_json::from_str(body)?;

    Ok(match listing {
        Listing::Records(records) | Listing::Wrapped { resources: records } => records,
        Listing::Station { ad_config_list } => ad_config_list
            .into_iter()
            .next()
            .map(|config| config.video_list)
            .unwrap_or_default(),
    })
}

/// Sort records by `seq` ascending, keeping the server order for equal keys.
pub fn sort_by_seq(records: &mut [ResourceRecord]) {
    records.sort_by(|a, b| a.seq.total_cmp(&b.seq));
}
