use crate::entities::ProductRecord;
use crate::query::filter::{FilterSpec, TagCategory, TagLogic};

/// Tolerance when comparing screen sizes, in inches.
const SCREEN_TOLERANCE: f64 = 0.05;

/// A `FilterSpec` with its bounds clamped and its texts lowercased, ready to
/// be applied to many records.
#[derive(Debug, Clone)]
pub struct Predicate {
    price_min: Option<f64>,
    price_max: Option<f64>,
    ram_min: u32,
    ssd_min: u32,
    chip_series: Option<String>,
    screen_in: Option<f64>,
    require_10gbe: bool,
    tags: Vec<LoweredTag>,
    logic: TagLogic,
    query: Option<String>,
}

#[derive(Debug, Clone)]
struct LoweredTag {
    category: TagCategory,
    text: String,
    /// `text` with its first "gb" removed, compared against numeric fields.
    number: String,
}

impl Predicate {
    pub fn new(spec: &FilterSpec) -> Self {
        let tags = spec
            .tags
            .iter()
            .map(|tag| {
                let text = tag.text.to_lowercase();
                let number = text.replacen("gb", "", 1);
                LoweredTag {
                    category: tag.category,
                    text,
                    number,
                }
            })
            .collect();

        let query = spec.query.trim().to_lowercase();

        Self {
            price_min: positive(spec.price_min),
            price_max: positive(spec.price_max),
            ram_min: spec.ram_min.unwrap_or(0),
            ssd_min: spec.ssd_min.unwrap_or(0),
            chip_series: spec
                .chip_series
                .as_deref()
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_lowercase),
            screen_in: positive(spec.screen_in),
            require_10gbe: spec.require_10gbe,
            tags,
            logic: spec.tag_logic,
            query: (!query.is_empty()).then_some(query),
        }
    }

    pub fn matches(&self, record: &ProductRecord) -> bool {
        let specs = &record.specs;

        if let Some(min) = self.price_min {
            if record.price_num < min {
                return false;
            }
        }
        if let Some(max) = self.price_max {
            if record.price_num > max {
                return false;
            }
        }

        if specs.ram.unwrap_or(0) < self.ram_min || specs.ssd_gb.unwrap_or(0) < self.ssd_min {
            return false;
        }

        if let Some(series) = &self.chip_series {
            let same = specs
                .chip_series
                .as_deref()
                .is_some_and(|s| s.to_lowercase() == *series);
            if !same {
                return false;
            }
        }
        if let Some(screen) = self.screen_in {
            let close = specs
                .screen_in
                .is_some_and(|s| (s - screen).abs() <= SCREEN_TOLERANCE);
            if !close {
                return false;
            }
        }
        if self.require_10gbe && !specs.has_10gbe {
            return false;
        }

        if !self.tags.is_empty() {
            let mut results = self.tags.iter().map(|tag| tag_matches(record, tag));
            let passed = match self.logic {
                TagLogic::And => results.all(|hit| hit),
                TagLogic::Or => results.any(|hit| hit),
            };
            if !passed {
                return false;
            }
        }

        match &self.query {
            Some(query) => haystack(record).contains(query.as_str()),
            None => true,
        }
    }
}

/// Convenience for evaluating a single record.
pub fn matches(record: &ProductRecord, spec: &FilterSpec) -> bool {
    Predicate::new(spec).matches(record)
}

fn positive(value: Option<f64>) -> Option<f64> {
    value.filter(|v| v.is_finite() && *v > 0.0)
}

fn tag_matches(record: &ProductRecord, tag: &LoweredTag) -> bool {
    let specs = &record.specs;
    let text = tag.text.as_str();

    match tag.category {
        TagCategory::Model => {
            contains(Some(&record.display_title), text) || contains(record.model_id.as_deref(), text)
        }
        TagCategory::Chip => {
            contains(specs.chip_model.as_deref(), text) || contains(specs.chip_series.as_deref(), text)
        }
        TagCategory::Storage => numeric_or_detail(record, specs.ssd_gb, tag),
        TagCategory::Memory => numeric_or_detail(record, specs.ram, tag),
        TagCategory::Color => contains(record.color.as_deref(), text),
        TagCategory::Keyword => haystack(record).contains(text),
    }
}

fn numeric_or_detail(record: &ProductRecord, value: Option<u32>, tag: &LoweredTag) -> bool {
    let digits = value.map(|v| v.to_string()).unwrap_or_default();
    digits.contains(tag.number.as_str())
        || record
            .details
            .iter()
            .any(|line| line.to_lowercase().contains(tag.text.as_str()))
}

fn contains(field: Option<&str>, needle: &str) -> bool {
    field.is_some_and(|f| f.to_lowercase().contains(needle))
}

/// Title, model id, chip fields, color and detail lines, lowercased.
fn haystack(record: &ProductRecord) -> String {
    let specs = &record.specs;
    [
        Some(record.display_title.as_str()),
        record.model_id.as_deref(),
        specs.chip_model.as_deref(),
        specs.chip_series.as_deref(),
        record.color.as_deref(),
    ]
    .into_iter()
    .flatten()
    .chain(record.details.iter().map(String::as_str))
    .filter(|part| !part.is_empty())
    .collect::<Vec<_>>()
    .join(" ")
    .to_lowercase()
}
