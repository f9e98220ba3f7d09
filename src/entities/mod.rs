use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use url::Url;

/// --- Feed input ---

/// One entry of the syndicated feed, before any extraction.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawFeedItem {
    pub title: String,
    pub content_html: String,
    pub link: Option<String>,
    pub guid: Option<String>,
}

/// --- Catalog records ---

/// Structured hardware attributes pulled out of the marketing copy.
///
/// Every optional field is `None` when extraction failed; zero never stands
/// in for "unknown".
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Specs {
    pub ram: Option<u32>,
    pub ssd_gb: Option<u32>,
    pub cpu_cores: Option<u32>,
    pub gpu_cores: Option<u32>,
    pub chip_series: Option<String>,
    pub chip_model: Option<String>,
    pub screen_in: Option<f64>,
    #[serde(rename = "has10GbE", default)]
    pub has_10gbe: bool,
    #[serde(rename = "hasXDR", default)]
    pub has_xdr: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductRecord {
    pub id: String,
    pub display_title: String,
    pub price_num: f64,
    pub link: Url,
    pub model_id: Option<String>,
    pub color: Option<String>,
    #[serde(default)]
    pub image: Option<String>,
    #[serde(default)]
    pub details: Vec<String>,
    #[serde(default)]
    pub specs: Specs,
}

/// A complete, price-sorted snapshot produced by one pipeline run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Catalog {
    pub last_updated: DateTime<Utc>,
    pub items: Vec<ProductRecord>,
}

impl Catalog {
    pub fn empty() -> Self {
        Self {
            last_updated: Utc::now(),
            items: Vec::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}
