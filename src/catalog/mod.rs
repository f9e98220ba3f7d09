pub mod store;

pub use store::{CatalogError, CatalogHandle, PriceBounds};

use chrono::Utc;
use std::collections::HashMap;

use crate::entities::{Catalog, ProductRecord};

/// Collects the records of one pipeline run; nothing is visible to
/// consumers until `publish` returns the finished catalog.
#[derive(Debug, Default)]
pub struct CatalogBuilder {
    items: Vec<ProductRecord>,
}

impl CatalogBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, record: ProductRecord) {
        self.items.push(record);
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Makes ids unique, sorts by ascending price (ties keep feed order) and
    /// stamps the completion time.
    pub fn publish(self) -> Catalog {
        let mut items = self.items;
        dedupe_ids(&mut items);
        sort_by_price(&mut items);
        Catalog {
            last_updated: Utc::now(),
            items,
        }
    }
}

impl Extend<ProductRecord> for CatalogBuilder {
    fn extend<T: IntoIterator<Item = ProductRecord>>(&mut self, iter: T) {
        self.items.extend(iter);
    }
}

impl FromIterator<ProductRecord> for CatalogBuilder {
    fn from_iter<T: IntoIterator<Item = ProductRecord>>(iter: T) -> Self {
        Self {
            items: iter.into_iter().collect(),
        }
    }
}

/// Stable ascending sort on `price_num`.
pub fn sort_by_price<R: std::borrow::Borrow<ProductRecord>>(items: &mut [R]) {
    items.sort_by(|a, b| a.borrow().price_num.total_cmp(&b.borrow().price_num));
}

/// Later duplicates get `-2`, `-3`, ... suffixes in feed order.
fn dedupe_ids(items: &mut [ProductRecord]) {
    let mut seen: HashMap<String, usize> = HashMap::with_capacity(items.len());
    for item in items.iter_mut() {
        let count = {
            let count = seen.entry(item.id.clone()).or_insert(0);
            *count += 1;
            *count
        };
        if count > 1 {
            let mut suffix = count;
            let mut candidate = format!("{}-{}", item.id, suffix);
            while seen.contains_key(&candidate) {
                suffix += 1;
                candidate = format!("{}-{}", item.id, suffix);
            }
            seen.insert(item.id.clone(), suffix);
            seen.insert(candidate.clone(), 1);
            item.id = candidate;
        }
    }
}
