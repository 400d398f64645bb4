//! Directory-backed tile catalog.
//!
//! Each tile is stored as a single file named by its derived tile name
//! (`"{z}-{x}-{y}"`, no extension) under a root directory. The file name is
//! both the record id and the object-store key, so records and payloads
//! cannot drift apart.
//!
//! Files whose names do not parse as a full level-3 key are ignored during
//! scans, so the root directory can hold unrelated files.

use std::path::{Path, PathBuf};

use bytes::Bytes;
use tracing::{debug, warn};

use crate::coord::{TileCoord, TilePrefix};

use super::{BoxFuture, CatalogError, DeleteOutcome, TileCatalog, TileRecord};

/// Tile catalog persisted as one file per tile under a root directory.
pub struct FsCatalog {
    root: PathBuf,
}

impl FsCatalog {
    /// Open a catalog rooted at `root`, creating the directory if needed.
    pub async fn open(root: impl Into<PathBuf>) -> Result<Self, CatalogError> {
        let root = root.into();
        tokio::fs::create_dir_all(&root).await?;
        Ok(Self { root })
    }

    /// Root directory of this catalog.
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn tile_path(&self, coord: &TileCoord) -> PathBuf {
        self.root.join(coord.file_name())
    }

    /// Scan the root directory for tile files matching `prefix`.
    async fn scan(&self, prefix: Option<&TilePrefix>) -> Result<Vec<TileCoord>, CatalogError> {
        let mut coords = Vec::new();
        let mut entries = tokio::fs::read_dir(&self.root).await?;
        while let Some(entry) = entries.next_entry().await? {
            let name = entry.file_name();
            let Some(name) = name.to_str() else {
                continue;
            };
            // Only full level-3 keys are tiles; everything else is foreign
            let Ok(decoded) = TilePrefix::decode(name) else {
                continue;
            };
            let (Some(x), Some(y)) = (decoded.x(), decoded.y()) else {
                continue;
            };
            let coord = TileCoord::new(decoded.z(), x, y);
            if prefix.map_or(true, |p| p.matches(&coord)) {
                coords.push(coord);
            }
        }
        coords.sort();
        Ok(coords)
    }
}

impl TileCatalog for FsCatalog {
    fn list_all(&self) -> BoxFuture<'_, Result<Vec<TileRecord>, CatalogError>> {
        Box::pin(async move {
            let coords = self.scan(None).await?;
            Ok(coords
                .into_iter()
                .map(|coord| TileRecord::new(coord.file_name(), coord))
                .collect())
        })
    }

    fn create(
        &self,
        coord: TileCoord,
        bytes: Bytes,
    ) -> BoxFuture<'_, Result<TileRecord, CatalogError>> {
        Box::pin(async move {
            let path = self.tile_path(&coord);
            tokio::fs::write(&path, &bytes).await?;
            debug!(tile = %coord, path = %path.display(), "wrote tile file");
            Ok(TileRecord::new(coord.file_name(), coord))
        })
    }

    fn delete_by_prefix(
        &self,
        prefix: TilePrefix,
    ) -> BoxFuture<'_, Result<DeleteOutcome, CatalogError>> {
        Box::pin(async move {
            let mut deleted_records = Vec::new();
            for coord in self.scan(Some(&prefix)).await? {
                match tokio::fs::remove_file(self.tile_path(&coord)).await {
                    Ok(()) => {
                        deleted_records.push(TileRecord::new(coord.file_name(), coord));
                    }
                    // Raced with another deleter; the record is gone either way
                    Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                        deleted_records.push(TileRecord::new(coord.file_name(), coord));
                    }
                    Err(err) => {
                        warn!(tile = %coord, error = %err, "failed to delete tile file");
                        return Err(err.into());
                    }
                }
            }
            debug!(prefix = %prefix, count = deleted_records.len(), "cascading delete");
            Ok(DeleteOutcome { deleted_records })
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn seeded_catalog(dir: &Path, coords: &[(u32, u32, u32)]) -> FsCatalog {
        let catalog = FsCatalog::open(dir).await.unwrap();
        for &(z, x, y) in coords {
            catalog
                .create(TileCoord::new(z, x, y), Bytes::from_static(b"img"))
                .await
                .unwrap();
        }
        catalog
    }

    #[tokio::test]
    async fn test_list_all_sorted_and_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let catalog = seeded_catalog(dir.path(), &[(10, 1, 1), (9, 0, 5), (9, 0, 2)]).await;

        let records = catalog.list_all().await.unwrap();
        let coords: Vec<_> = records.iter().map(|r| (r.z, r.x, r.y)).collect();
        assert_eq!(coords, vec![(9, 0, 2), (9, 0, 5), (10, 1, 1)]);
        assert_eq!(records[0].file_name, "9-0-2");
        assert_eq!(records[0].id, "9-0-2");
    }

    #[tokio::test]
    async fn test_scan_ignores_foreign_files() {
        let dir = tempfile::tempdir().unwrap();
        let catalog = seeded_catalog(dir.path(), &[(1, 2, 3)]).await;

        std::fs::write(dir.path().join("README.txt"), b"not a tile").unwrap();
        std::fs::write(dir.path().join("5-6"), b"level-2 key, not a tile").unwrap();

        let records = catalog.list_all().await.unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].file_name, "1-2-3");
    }

    #[tokio::test]
    async fn test_delete_by_prefix_removes_files() {
        let dir = tempfile::tempdir().unwrap();
        let catalog = seeded_catalog(dir.path(), &[(1, 0, 0), (1, 0, 1), (2, 0, 0)]).await;

        let outcome = catalog
            .delete_by_prefix(TilePrefix::column(1, 0))
            .await
            .unwrap();
        assert_eq!(outcome.deleted_records.len(), 2);

        let remaining = catalog.list_all().await.unwrap();
        assert_eq!(remaining.len(), 1);
        assert_eq!(remaining[0].file_name, "2-0-0");
    }

    #[tokio::test]
    async fn test_create_overwrites_existing_tile() {
        let dir = tempfile::tempdir().unwrap();
        let catalog = FsCatalog::open(dir.path()).await.unwrap();
        let coord = TileCoord::new(3, 3, 3);

        catalog
            .create(coord, Bytes::from_static(b"old"))
            .await
            .unwrap();
        catalog
            .create(coord, Bytes::from_static(b"new"))
            .await
            .unwrap();

        let stored = std::fs::read(dir.path().join("3-3-3")).unwrap();
        assert_eq!(stored, b"new");
        assert_eq!(catalog.list_all().await.unwrap().len(), 1);
    }
}
