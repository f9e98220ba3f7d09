use serde::{Deserialize, Deserializer, Serialize, de::IgnoredAny};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParseFilterError {
    #[error("unknown tag logic '{0}', expected AND or OR")]
    UnknownLogic(String),

    #[error("tag text must not be empty")]
    EmptyTag,
}

/// Which record fields a tag is matched against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TagCategory {
    #[serde(rename = "机型")]
    Model,
    #[serde(rename = "芯片")]
    Chip,
    #[serde(rename = "存储")]
    Storage,
    #[serde(rename = "内存")]
    Memory,
    #[serde(rename = "颜色")]
    Color,
    /// Unscoped keyword, matched against the whole record.
    #[serde(rename = "关键字", other)]
    Keyword,
}

impl TagCategory {
    pub fn label(self) -> &'static str {
        match self {
            Self::Model => "机型",
            Self::Chip => "芯片",
            Self::Storage => "存储",
            Self::Memory => "内存",
            Self::Color => "颜色",
            Self::Keyword => "关键字",
        }
    }

    /// Accepts the Chinese labels and their English names; anything else is
    /// a keyword.
    pub fn from_label(label: &str) -> Self {
        match label.trim().to_lowercase().as_str() {
            "机型" | "model" => Self::Model,
            "芯片" | "chip" => Self::Chip,
            "存储" | "storage" | "ssd" => Self::Storage,
            "内存" | "memory" | "ram" => Self::Memory,
            "颜色" | "color" | "colour" => Self::Color,
            _ => Self::Keyword,
        }
    }
}

impl fmt::Display for TagCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Tag {
    pub category: TagCategory,
    pub text: String,
}

impl Tag {
    pub fn new(category: TagCategory, text: impl Into<String>) -> Self {
        Self {
            category,
            text: text.into(),
        }
    }
}

/// `category:text`, or bare `text` for a keyword tag.
impl FromStr for Tag {
    type Err = ParseFilterError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (category, text) = match s.split_once([':', '：']) {
            Some((category, text)) => (TagCategory::from_label(category), text),
            None => (TagCategory::Keyword, s),
        };
        let text = text.trim();
        if text.is_empty() {
            return Err(ParseFilterError::EmptyTag);
        }
        Ok(Self::new(category, text))
    }
}

impl fmt::Display for Tag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.category, self.text)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum TagLogic {
    #[default]
    And,
    Or,
}

impl FromStr for TagLogic {
    type Err = ParseFilterError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "AND" => Ok(Self::And),
            "OR" => Ok(Self::Or),
            _ => Err(ParseFilterError::UnknownLogic(s.to_string())),
        }
    }
}

/// A compound filter over the catalog. Transient; never persisted.
///
/// Numeric bounds that are absent, zero, negative or non-finite impose no
/// constraint, as does a blank `query`. When deserializing, numbers may also
/// arrive as strings and values that are not numbers at all become `None`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FilterSpec {
    #[serde(deserialize_with = "lenient_f64")]
    pub price_min: Option<f64>,
    #[serde(deserialize_with = "lenient_f64")]
    pub price_max: Option<f64>,
    #[serde(deserialize_with = "lenient_u32")]
    pub ram_min: Option<u32>,
    #[serde(deserialize_with = "lenient_u32")]
    pub ssd_min: Option<u32>,
    pub query: String,
    pub tags: Vec<Tag>,
    pub tag_logic: TagLogic,
    pub chip_series: Option<String>,
    #[serde(deserialize_with = "lenient_f64")]
    pub screen_in: Option<f64>,
    #[serde(rename = "require10GbE")]
    pub require_10gbe: bool,
}

impl FilterSpec {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn price_range(mut self, min: Option<f64>, max: Option<f64>) -> Self {
        self.price_min = min;
        self.price_max = max;
        self
    }

    pub fn ram_min(mut self, gb: u32) -> Self {
        self.ram_min = Some(gb);
        self
    }

    pub fn ssd_min(mut self, gb: u32) -> Self {
        self.ssd_min = Some(gb);
        self
    }

    pub fn query(mut self, text: impl Into<String>) -> Self {
        self.query = text.into();
        self
    }

    pub fn tag(mut self, tag: Tag) -> Self {
        self.tags.push(tag);
        self
    }

    pub fn logic(mut self, logic: TagLogic) -> Self {
        self.tag_logic = logic;
        self
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum LooseNumber {
    Number(f64),
    Text(String),
    Other(#[allow(dead_code)] IgnoredAny),
}

impl LooseNumber {
    fn finite(self) -> Option<f64> {
        let value = match self {
            Self::Number(n) => n,
            Self::Text(text) => text.trim().parse().ok()?,
            Self::Other(_) => return None,
        };
        value.is_finite().then_some(value)
    }
}

fn lenient_f64<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(LooseNumber::deserialize(deserializer)?.finite())
}

/// Fractions round up so `15.5` GB still excludes 15 GB machines.
fn lenient_u32<'de, D>(deserializer: D) -> Result<Option<u32>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(LooseNumber::deserialize(deserializer)?
        .finite()
        .filter(|n| *n >= 0.0)
        .map(|n| n.ceil() as u32))
}
