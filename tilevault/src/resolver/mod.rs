//! Hierarchical delete resolution.
//!
//! A user selection can mix all three coordinate levels and may include both
//! an ancestor and its descendants. Sending the selection to the catalog
//! verbatim would delete overlapping subtrees twice, so the resolver first
//! collapses it to the minimal set: whenever a prefix and one of its
//! extensions are both selected, only the shortest prefix is kept, since a
//! cascading delete of the prefix already covers everything under it.
//!
//! This is a filter, not a merge: unrelated prefixes are never combined. The
//! ancestor check is pairwise O(n²), which is fine for the tiny selections a
//! tree widget produces.

use thiserror::Error;
use tracing::{debug, warn};

use crate::catalog::{CatalogError, TileCatalog, TileRecord};
use crate::coord::TilePrefix;
use crate::index::TileTree;

/// Errors from resolving and executing a hierarchical delete.
#[derive(Debug, Error)]
pub enum DeleteError {
    /// The selection contained no valid coordinate keys; no catalog call was
    /// made.
    #[error("nothing valid to delete")]
    NothingToDelete,

    /// The catalog rejected the cascading delete.
    #[error(transparent)]
    Catalog(#[from] CatalogError),
}

/// Reduce a selection to its maximal (least-specific) members.
///
/// A prefix is dropped when some other selected prefix is a strict ancestor
/// of it; duplicates are dropped too. The relative order of survivors is
/// preserved.
pub fn minimize(selection: &[TilePrefix]) -> Vec<TilePrefix> {
    let mut minimal: Vec<TilePrefix> = Vec::new();
    for prefix in selection {
        let redundant = minimal.contains(prefix)
            || selection
                .iter()
                .any(|other| other.is_strict_prefix_of(prefix));
        if !redundant {
            minimal.push(*prefix);
        }
    }
    minimal
}

/// Decode raw selection keys and minimize the result.
///
/// Keys that are not coordinate-shaped (wrong segment count, non-numeric
/// segments) are skipped with a log line rather than failing the whole
/// selection; tree widgets can hand over synthetic node keys.
pub fn resolve_keys(keys: &[String]) -> Vec<TilePrefix> {
    let mut selection = Vec::with_capacity(keys.len());
    for key in keys {
        match TilePrefix::decode(key) {
            Ok(prefix) => selection.push(prefix),
            Err(err) => debug!(%key, error = %err, "skipping non-coordinate selection key"),
        }
    }
    minimize(&selection)
}

/// Resolve a selection, run the cascading delete, and fold the result back
/// into the hierarchy index.
///
/// Returns the deleted records. An empty minimized selection yields
/// [`DeleteError::NothingToDelete`] without touching the catalog; a selection
/// that matches no records is reported with a warning but is not an error.
pub async fn delete_selection(
    catalog: &dyn TileCatalog,
    tree: &mut TileTree,
    keys: &[String],
) -> Result<Vec<TileRecord>, DeleteError> {
    let targets = resolve_keys(keys);
    if targets.is_empty() {
        return Err(DeleteError::NothingToDelete);
    }

    debug!(selected = keys.len(), minimized = targets.len(), "resolved delete selection");
    let outcome = catalog.delete_by_prefixes(targets).await?;
    if outcome.deleted_records.is_empty() {
        warn!("delete selection matched no records");
    }

    tree.remove_many(&outcome.deleted_records);
    Ok(outcome.deleted_records)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_minimize_nested_selection_keeps_shortest() {
        let selection = [
            TilePrefix::zoom(1),
            TilePrefix::column(1, 2),
            TilePrefix::tile(1, 2, 3),
        ];
        assert_eq!(minimize(&selection), vec![TilePrefix::zoom(1)]);
    }

    #[test]
    fn test_minimize_keeps_disjoint_prefixes() {
        let selection = [TilePrefix::column(1, 2), TilePrefix::column(1, 5)];
        assert_eq!(minimize(&selection), selection.to_vec());
    }

    #[test]
    fn test_minimize_is_order_insensitive_filter() {
        let selection = [
            TilePrefix::tile(1, 2, 3),
            TilePrefix::column(1, 2),
            TilePrefix::tile(4, 0, 0),
        ];
        assert_eq!(
            minimize(&selection),
            vec![TilePrefix::column(1, 2), TilePrefix::tile(4, 0, 0)]
        );
    }

    #[test]
    fn test_minimize_drops_duplicates() {
        let selection = [TilePrefix::zoom(7), TilePrefix::zoom(7)];
        assert_eq!(minimize(&selection), vec![TilePrefix::zoom(7)]);
    }

    #[test]
    fn test_resolve_keys_skips_malformed() {
        let keys = vec![
            "1".to_string(),
            "not-a-key".to_string(),
            "1-2".to_string(),
            "".to_string(),
        ];
        assert_eq!(resolve_keys(&keys), vec![TilePrefix::zoom(1)]);
    }

    mod delete_tests {
        use super::*;
        use crate::catalog::MemoryCatalog;
        use crate::coord::TileCoord;
        use bytes::Bytes;

        async fn seeded() -> (MemoryCatalog, TileTree) {
            let catalog = MemoryCatalog::new();
            let mut records = Vec::new();
            for (z, x, y) in [(1, 0, 0), (1, 0, 1), (1, 1, 0), (2, 0, 0)] {
                records.push(
                    catalog
                        .create(TileCoord::new(z, x, y), Bytes::from_static(b"img"))
                        .await
                        .unwrap(),
                );
            }
            let tree = TileTree::build(&records);
            (catalog, tree)
        }

        #[tokio::test]
        async fn test_delete_selection_cascades_and_updates_tree() {
            let (catalog, mut tree) = seeded().await;
            let keys = vec!["1".to_string(), "1-0".to_string(), "1-0-0".to_string()];

            let deleted = delete_selection(&catalog, &mut tree, &keys).await.unwrap();

            assert_eq!(deleted.len(), 3, "one minimized prefix deletes all of z=1");
            assert_eq!(catalog.len().await, 1);
            assert_eq!(tree.leaf_count(), 1);
            assert_eq!(tree.nodes()[0].key, "2");
        }

        #[tokio::test]
        async fn test_delete_selection_without_valid_keys() {
            let (catalog, mut tree) = seeded().await;
            let keys = vec!["bogus".to_string(), "x-y-z".to_string()];

            let err = delete_selection(&catalog, &mut tree, &keys)
                .await
                .unwrap_err();
            assert!(matches!(err, DeleteError::NothingToDelete));
            // No catalog call was made
            assert_eq!(catalog.len().await, 4);
            assert_eq!(tree.leaf_count(), 4);
        }

        #[tokio::test]
        async fn test_delete_selection_matching_nothing_is_ok() {
            let (catalog, mut tree) = seeded().await;
            let keys = vec!["9-9-9".to_string()];

            let deleted = delete_selection(&catalog, &mut tree, &keys).await.unwrap();
            assert!(deleted.is_empty());
            assert_eq!(tree.leaf_count(), 4);
        }
    }
}
