use tokio_util::sync::CancellationToken;

use crate::catalog::sort_by_price;
use crate::entities::{Catalog, ProductRecord};
use crate::query::filter::FilterSpec;
use crate::query::predicate::Predicate;

/// Records between two cancellation checks.
const CANCEL_CHECK_INTERVAL: usize = 256;

/// Matching records in ascending price order; equal prices keep catalog order.
pub fn query<'a>(catalog: &'a Catalog, spec: &FilterSpec) -> Vec<&'a ProductRecord> {
    let predicate = Predicate::new(spec);
    let mut hits: Vec<&ProductRecord> = catalog
        .items
        .iter()
        .filter(|record| predicate.matches(record))
        .collect();
    sort_by_price(&mut hits);
    hits
}

/// Same as [`query`] but gives up with `None` once `cancel` fires.
pub fn query_cancellable(
    catalog: &Catalog,
    spec: &FilterSpec,
    cancel: &CancellationToken,
) -> Option<Vec<ProductRecord>> {
    let predicate = Predicate::new(spec);
    let mut hits = Vec::new();

    for chunk in catalog.items.chunks(CANCEL_CHECK_INTERVAL) {
        if cancel.is_cancelled() {
            return None;
        }
        hits.extend(chunk.iter().filter(|record| predicate.matches(record)).cloned());
    }
    if cancel.is_cancelled() {
        return None;
    }

    sort_by_price(&mut hits);
    Some(hits)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::CatalogBuilder;
    use crate::catalog::tests::record;
    use crate::query::filter::{Tag, TagCategory, TagLogic};

    fn catalog() -> Catalog {
        let mut studio = record("studio", 12999.0);
        studio.specs.ram = Some(32);
        studio.specs.ssd_gb = Some(512);
        studio.specs.chip_model = Some("M2 Max".to_string());

        let mut mini = record("mini", 8999.0);
        mini.specs.ram = Some(16);
        mini.specs.ssd_gb = Some(512);
        mini.specs.chip_model = Some("M2 Pro".to_string());

        let mut air = record("air", 8999.0);
        air.specs.ram = Some(8);
        air.specs.ssd_gb = Some(256);
        air.specs.chip_model = Some("M2".to_string());

        CatalogBuilder::from_iter([studio, mini, air]).publish()
    }

    fn ids(records: &[&ProductRecord]) -> Vec<String> {
        records.iter().map(|r| r.id.clone()).collect()
    }

    #[test]
    fn results_are_sorted_and_ties_keep_catalog_order() {
        let catalog = catalog();
        let hits = query(&catalog, &FilterSpec::new());
        assert_eq!(ids(&hits), vec!["mini", "air", "studio"]);
    }

    #[test]
    fn ram_and_price_thresholds_combine() {
        let catalog = catalog();
        let spec = FilterSpec::new().ram_min(16).price_range(None, Some(10000.0));
        assert_eq!(ids(&query(&catalog, &spec)), vec!["mini"]);
    }

    #[test]
    fn tighter_filters_never_grow_results() {
        let catalog = catalog();
        let loose = FilterSpec::new().tag(Tag::new(TagCategory::Chip, "m2"));
        let tighter = loose.clone().ram_min(16);
        let tightest = tighter.clone().tag(Tag::new(TagCategory::Chip, "max"));

        let loose_hits = query(&catalog, &loose).len();
        let tighter_hits = query(&catalog, &tighter).len();
        let tightest_hits = query(&catalog, &tightest).len();
        assert!(loose_hits >= tighter_hits && tighter_hits >= tightest_hits);
        assert_eq!(tightest_hits, 1);

        let or_hits = query(&catalog, &tightest.clone().logic(TagLogic::Or)).len();
        assert!(or_hits >= tightest_hits);
    }

    #[test]
    fn no_matches_is_an_empty_view() {
        let catalog = catalog();
        assert!(query(&catalog, &FilterSpec::new().query("pro display")).is_empty());
        assert!(query(&Catalog::empty(), &FilterSpec::new()).is_empty());
    }

    #[test]
    fn cancellable_query_agrees_with_query() {
        let catalog = catalog();
        let spec = FilterSpec::new().ssd_min(512);
        let token = CancellationToken::new();

        let owned = query_cancellable(&catalog, &spec, &token).unwrap();
        let borrowed = query(&catalog, &spec);
        assert_eq!(owned.len(), borrowed.len());
        assert!(owned.iter().zip(borrowed).all(|(a, b)| a == b));
    }

    #[test]
    fn cancelled_query_returns_none() {
        let token = CancellationToken::new();
        token.cancel();
        assert_eq!(query_cancellable(&catalog(), &FilterSpec::new(), &token), None);
    }
}
