//! One batch run of the pipeline: feed → records → catalog file.

use anyhow::{Context, Result};
use rayon::prelude::*;
use serde::Serialize;
use std::path::Path;
use tracing::{info, instrument, warn};

use crate::catalog::CatalogBuilder;
use crate::entities::{Catalog, RawFeedItem};
use crate::extractor::assemble;
use crate::feed::FeedSource;

/// Counts for one run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SyncReport {
    pub fetched: usize,
    pub published: usize,
    pub dropped: usize,
}

/// Assembles every feed item in parallel and publishes the survivors in
/// feed order.
pub fn build_catalog(items: &[RawFeedItem]) -> (Catalog, SyncReport) {
    let records: Vec<_> = items.par_iter().filter_map(assemble).collect();

    let report = SyncReport {
        fetched: items.len(),
        published: records.len(),
        dropped: items.len() - records.len(),
    };
    (CatalogBuilder::from_iter(records).publish(), report)
}

/// Pulls `source`, rebuilds the catalog and atomically replaces `path`.
///
/// A feed failure returns before anything is written, so the previous
/// catalog file stays in place.
#[instrument(skip(source, path), fields(source = %source.describe(), path = %path.display()))]
pub async fn run_sync(source: &dyn FeedSource, path: &Path) -> Result<(Catalog, SyncReport)> {
    let items = source
        .fetch_items()
        .await
        .with_context(|| format!("failed to pull feed from {}", source.describe()))?;

    let (catalog, report) = tokio::task::spawn_blocking(move || build_catalog(&items)).await?;
    if report.published == 0 {
        warn!(fetched = report.fetched, "no feed item could be assembled");
    } else if report.dropped > 0 {
        info!(dropped = report.dropped, "dropped unparseable feed items");
    }

    let target = path.to_path_buf();
    let catalog = tokio::task::spawn_blocking(move || {
        catalog.save_atomic(&target).map(|()| catalog)
    })
    .await?
    .with_context(|| format!("failed to write catalog to {}", path.display()))?;

    info!(
        fetched = report.fetched,
        published = report.published,
        "sync complete"
    );
    Ok((catalog, report))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::feed::FeedError;
    use crate::feed::source::MockFeedSource;
    use std::fs;

    fn item(title: &str, content_html: &str, guid: &str) -> RawFeedItem {
        RawFeedItem {
            title: title.to_string(),
            content_html: content_html.to_string(),
            link: Some(format!("https://www.apple.com.cn/shop/product/{guid}")),
            guid: Some(guid.to_string()),
        }
    }

    fn feed() -> Vec<RawFeedItem> {
        vec![
            item(
                "MacBook Air Apple M2 芯片 - 午夜色",
                "<p>¥7,649.00</p><p>16GB 统一内存</p><p>512GB 固态硬盘</p>",
                "air",
            ),
            item("Gift card", "<p>no price here</p>", "gift"),
            item(
                "Mac mini Apple M4 芯片",
                "<p>¥3,999.00</p><p>16GB 统一内存</p>",
                "mini",
            ),
        ]
    }

    fn mock_source(result: fn() -> Result<Vec<RawFeedItem>, FeedError>) -> MockFeedSource {
        let mut source = MockFeedSource::new();
        source
            .expect_describe()
            .returning(|| "mock://feed".to_string());
        source.expect_fetch_items().times(1).returning(result);
        source
    }

    #[test]
    fn build_catalog_counts_dropped_items() {
        let (catalog, report) = build_catalog(&feed());

        assert_eq!(
            report,
            SyncReport {
                fetched: 3,
                published: 2,
                dropped: 1
            }
        );
        let ids: Vec<_> = catalog.items.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["mini", "air"]);
    }

    #[tokio::test]
    async fn run_sync_writes_catalog_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("macs.json");
        let source = mock_source(|| Ok(feed()));

        let (catalog, report) = run_sync(&source, &path).await.unwrap();

        assert_eq!(report.published, 2);
        assert_eq!(Catalog::load(&path).unwrap(), catalog);
    }

    #[tokio::test]
    async fn feed_failure_leaves_previous_catalog_untouched() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("macs.json");
        fs::write(&path, "previous").unwrap();
        let source = mock_source(|| Err(FeedError::Malformed("truncated".to_string())));

        let err = run_sync(&source, &path).await.unwrap_err();

        assert!(err.to_string().contains("mock://feed"));
        assert!(matches!(
            err.downcast_ref::<FeedError>(),
            Some(FeedError::Malformed(_))
        ));
        assert_eq!(fs::read_to_string(&path).unwrap(), "previous");
    }

    #[tokio::test]
    async fn unassemblable_feed_still_publishes_empty_catalog() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("macs.json");
        let source = mock_source(|| Ok(vec![item("Gift card", "", "gift")]));

        let (catalog, report) = run_sync(&source, &path).await.unwrap();

        assert!(catalog.is_empty());
        assert_eq!(report.dropped, 1);
        assert!(path.exists());
    }
}
