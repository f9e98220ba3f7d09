use serde::Deserialize;
use std::fs;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::watch;
use tracing::{debug, info};

use crate::entities::{Catalog, ProductRecord};

#[derive(Error, Debug)]
pub enum CatalogError {
    #[error("catalog io error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("catalog serialization error: {0}")]
    Serde(#[from] serde_json::Error),

    #[error("failed to replace catalog at {path}: {source}")]
    Persist {
        path: PathBuf,
        #[source]
        source: tempfile::PersistError,
    },
}

impl CatalogError {
    fn io(path: &Path, source: std::io::Error) -> Self {
        Self::Io {
            path: path.to_path_buf(),
            source,
        }
    }
}

/// Accepts both the current `{ lastUpdated, items }` document and a bare
/// array of records.
#[derive(Deserialize)]
#[serde(untagged)]
enum CatalogDocument {
    Full(Catalog),
    Items(Vec<ProductRecord>),
}

impl Catalog {
    /// Writes the catalog next to `path` and renames it into place, so a
    /// reader sees either the previous file or the complete new one.
    pub fn save_atomic(&self, path: &Path) -> Result<(), CatalogError> {
        let dir = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };
        fs::create_dir_all(&dir).map_err(|e| CatalogError::io(&dir, e))?;

        let mut tmp = tempfile::NamedTempFile::new_in(&dir).map_err(|e| CatalogError::io(&dir, e))?;
        {
            let mut writer = BufWriter::new(tmp.as_file_mut());
            serde_json::to_writer_pretty(&mut writer, self)?;
            writer.write_all(b"\n").map_err(|e| CatalogError::io(path, e))?;
            writer.flush().map_err(|e| CatalogError::io(path, e))?;
        }
        tmp.as_file()
            .sync_all()
            .map_err(|e| CatalogError::io(path, e))?;

        tmp.persist(path).map_err(|source| CatalogError::Persist {
            path: path.to_path_buf(),
            source,
        })?;

        info!(path = %path.display(), items = self.items.len(), "catalog published");
        Ok(())
    }

    pub fn load(path: &Path) -> Result<Self, CatalogError> {
        let contents = fs::read_to_string(path).map_err(|e| CatalogError::io(path, e))?;
        let catalog = match serde_json::from_str::<CatalogDocument>(&contents)? {
            CatalogDocument::Full(catalog) => catalog,
            CatalogDocument::Items(items) => {
                debug!(path = %path.display(), "loaded legacy item-array catalog");
                Catalog {
                    last_updated: fs::metadata(path)
                        .and_then(|m| m.modified())
                        .map(chrono::DateTime::from)
                        .unwrap_or_else(|_| chrono::Utc::now()),
                    items,
                }
            }
        };
        Ok(catalog)
    }

    /// Lowest and highest positive price, `None` for an empty catalog.
    pub fn price_bounds(&self) -> Option<PriceBounds> {
        self.items
            .iter()
            .map(|r| r.price_num)
            .filter(|p| p.is_finite() && *p > 0.0)
            .fold(None, |bounds: Option<PriceBounds>, price| {
                Some(match bounds {
                    None => PriceBounds {
                        min: price,
                        max: price,
                    },
                    Some(b) => PriceBounds {
                        min: b.min.min(price),
                        max: b.max.max(price),
                    },
                })
            })
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PriceBounds {
    pub min: f64,
    pub max: f64,
}

/// Shared, swappable view of the current catalog.
///
/// Consumers hold an `Arc<Catalog>` snapshot; `replace` swaps the whole
/// catalog at once and wakes every subscriber.
#[derive(Debug, Clone)]
pub struct CatalogHandle {
    tx: Arc<watch::Sender<Arc<Catalog>>>,
}

impl CatalogHandle {
    pub fn new(catalog: Catalog) -> Self {
        let (tx, _rx) = watch::channel(Arc::new(catalog));
        Self { tx: Arc::new(tx) }
    }

    pub fn snapshot(&self) -> Arc<Catalog> {
        self.tx.borrow().clone()
    }

    pub fn replace(&self, catalog: Catalog) {
        self.tx.send_replace(Arc::new(catalog));
    }

    pub fn subscribe(&self) -> watch::Receiver<Arc<Catalog>> {
        self.tx.subscribe()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::CatalogBuilder;
    use crate::catalog::tests::record;

    #[test]
    fn save_then_load_keeps_document_shape() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("macs.json");

        let catalog: Catalog = [record("b", 5999.0), record("a", 3999.0)]
            .into_iter()
            .collect::<CatalogBuilder>()
            .publish();
        catalog.save_atomic(&path).unwrap();

        let raw: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert!(raw["lastUpdated"].is_string());
        assert_eq!(raw["items"][0]["id"], "a");

        let loaded = Catalog::load(&path).unwrap();
        assert_eq!(loaded, catalog);
    }

    #[test]
    fn save_replaces_existing_file_without_leftovers() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("macs.json");
        fs::write(&path, "old").unwrap();

        let catalog = CatalogBuilder::new().publish();
        catalog.save_atomic(&path).unwrap();

        assert_eq!(Catalog::load(&path).unwrap().items.len(), 0);
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 1);
    }

    #[test]
    fn load_accepts_bare_item_array() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("macs.json");
        let items = vec![record("a", 1999.0)];
        fs::write(&path, serde_json::to_string(&items).unwrap()).unwrap();

        let loaded = Catalog::load(&path).unwrap();
        assert_eq!(loaded.items, items);
    }

    #[test]
    fn load_reports_missing_and_corrupt_files() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("missing.json");
        assert!(matches!(Catalog::load(&missing), Err(CatalogError::Io { .. })));

        let corrupt = dir.path().join("corrupt.json");
        fs::write(&corrupt, "{\"items\": 3").unwrap();
        assert!(matches!(Catalog::load(&corrupt), Err(CatalogError::Serde(_))));
    }

    #[test]
    fn price_bounds_ignore_empty_catalogs() {
        assert_eq!(Catalog::empty().price_bounds(), None);

        let catalog = CatalogBuilder::from_iter([record("a", 8999.0), record("b", 3999.0)]).publish();
        assert_eq!(
            catalog.price_bounds(),
            Some(PriceBounds {
                min: 3999.0,
                max: 8999.0
            })
        );
    }

    #[tokio::test]
    async fn handle_swaps_whole_catalog() {
        let handle = CatalogHandle::new(Catalog::empty());
        let mut rx = handle.subscribe();
        let before = handle.snapshot();

        handle.replace(CatalogBuilder::from_iter([record("a", 1.0)]).publish());
        rx.changed().await.unwrap();

        assert_eq!(rx.borrow().items.len(), 1);
        assert!(before.is_empty());
        assert_eq!(handle.snapshot().items.len(), 1);
    }
}
