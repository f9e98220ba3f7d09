use serde::Serialize;
use std::collections::HashSet;

use crate::entities::ProductRecord;
use crate::query::filter::{Tag, TagCategory};

pub const DEFAULT_SUGGESTION_LIMIT: usize = 10;

/// A tag the user may want to add for a partially typed query.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Suggestion {
    pub text: String,
    pub category: TagCategory,
}

impl From<Suggestion> for Tag {
    fn from(s: Suggestion) -> Self {
        Tag::new(s.category, s.text)
    }
}

/// Scans records in order and offers chip, model, color, memory and storage
/// values containing `query`, unique per category, at most `limit` of them.
pub fn suggest<'a, I>(items: I, query: &str, limit: usize) -> Vec<Suggestion>
where
    I: IntoIterator<Item = &'a ProductRecord>,
{
    let needle = query.trim().to_lowercase();
    if needle.is_empty() || limit == 0 {
        return Vec::new();
    }

    let mut seen = HashSet::new();
    let mut out = Vec::new();

    for record in items {
        let specs = &record.specs;
        let candidates = [
            (specs.chip_model.clone(), TagCategory::Chip),
            (Some(record.display_title.clone()), TagCategory::Model),
            (record.color.clone(), TagCategory::Color),
            (specs.ram.map(|gb| format!("{gb}GB")), TagCategory::Memory),
            (specs.ssd_gb.map(|gb| format!("{gb}GB")), TagCategory::Storage),
        ];

        for (text, category) in candidates {
            let Some(text) = text else { continue };
            let lowered = text.to_lowercase();
            if !lowered.contains(&needle) || !seen.insert((category, lowered)) {
                continue;
            }
            out.push(Suggestion { text, category });
            if out.len() == limit {
                return out;
            }
        }
    }
    out
}
