//! Tile hierarchy index.
//!
//! An ordered three-level tree (`z` → `x` → `y`) derived from the flat record
//! set held by the catalog. The tree is a best-effort client-side projection,
//! not an authority: every operation treats a missing node as "nothing to do"
//! rather than an error, and the whole structure is rebuilt from the catalog
//! on load.
//!
//! Invariants maintained by every operation:
//!
//! - siblings at every level are sorted ascending by their own numeric
//!   coordinate segment (`10` sorts after `9`, not before)
//! - an interior node exists iff at least one record shares its prefix;
//!   removing the last child prunes the parent, recursively
//! - leaves are 1:1 with tile records
//! - the same record set produces the same tree regardless of input order

use serde::Serialize;
use tracing::trace;

use crate::catalog::TileRecord;
use crate::coord::{TileCoord, TilePrefix};

/// A node in the hierarchy index.
///
/// Interior nodes (levels 1 and 2) carry children and no record data; leaves
/// (level 3) carry the backing record's `tile_id` and `file_name` and an
/// always-empty `children` list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TreeNode {
    /// Canonical coordinate key of this node's prefix.
    pub key: String,
    /// Display label: the node's own coordinate segment as decimal text.
    pub title: String,
    /// The node's own coordinate segment, used for numeric sibling ordering.
    pub segment: u32,
    /// Ordered child nodes; empty for leaves.
    pub children: Vec<TreeNode>,
    /// True for level-3 nodes.
    pub is_leaf: bool,
    /// Backing record id (leaf only).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tile_id: Option<String>,
    /// Backing record file name (leaf only).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file_name: Option<String>,
}

impl TreeNode {
    fn branch(prefix: TilePrefix, segment: u32) -> Self {
        Self {
            key: prefix.encode(),
            title: segment.to_string(),
            segment,
            children: Vec::new(),
            is_leaf: false,
            tile_id: None,
            file_name: None,
        }
    }

    fn leaf(record: &TileRecord) -> Self {
        let coord = record.coord();
        Self {
            key: coord.key(),
            title: coord.y.to_string(),
            segment: coord.y,
            children: Vec::new(),
            is_leaf: true,
            tile_id: Some(record.id.clone()),
            file_name: Some(record.file_name.clone()),
        }
    }
}

/// The three-level hierarchy index over a flat tile record set.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct TileTree {
    roots: Vec<TreeNode>,
}

impl TileTree {
    /// An empty tree.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a tree from a flat record set.
    ///
    /// Deterministic: the input order does not affect the result.
    pub fn build(records: &[TileRecord]) -> Self {
        let mut tree = Self::new();
        for record in records {
            tree.attach(record);
        }
        tree.sort();
        tree
    }

    /// The ordered level-1 nodes.
    pub fn nodes(&self) -> &[TreeNode] {
        &self.roots
    }

    /// Serialize the current snapshot for presentational collaborators.
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(&self.roots)
    }

    /// True if the tree has no nodes.
    pub fn is_empty(&self) -> bool {
        self.roots.is_empty()
    }

    /// Number of leaves in the tree.
    pub fn leaf_count(&self) -> usize {
        self.roots
            .iter()
            .flat_map(|z| &z.children)
            .map(|x| x.children.len())
            .sum()
    }

    /// Insert a record, creating intermediate nodes on demand, then re-sort.
    ///
    /// Idempotent: inserting an already-present coordinate is a no-op.
    pub fn insert(&mut self, record: &TileRecord) {
        self.attach(record);
        self.sort();
    }

    /// Remove the leaf for each record in turn, pruning interior nodes that
    /// lose their last child.
    ///
    /// Coordinates absent from the tree are skipped silently.
    pub fn remove_many(&mut self, records: &[TileRecord]) {
        for record in records {
            self.remove(record.coord());
        }
    }

    /// Stable numeric ascending sort of siblings at every level.
    pub fn sort(&mut self) {
        self.roots.sort_by_key(|z| z.segment);
        for z_node in &mut self.roots {
            z_node.children.sort_by_key(|x| x.segment);
            for x_node in &mut z_node.children {
                x_node.children.sort_by_key(|y| y.segment);
            }
        }
    }

    /// Attach a leaf without re-sorting. Shared by `build` and `insert`.
    fn attach(&mut self, record: &TileRecord) {
        let coord = record.coord();

        let zi = match self.roots.iter().position(|n| n.segment == coord.z) {
            Some(i) => i,
            None => {
                self.roots
                    .push(TreeNode::branch(TilePrefix::zoom(coord.z), coord.z));
                self.roots.len() - 1
            }
        };
        let z_node = &mut self.roots[zi];

        let xi = match z_node.children.iter().position(|n| n.segment == coord.x) {
            Some(i) => i,
            None => {
                z_node.children.push(TreeNode::branch(
                    TilePrefix::column(coord.z, coord.x),
                    coord.x,
                ));
                z_node.children.len() - 1
            }
        };
        let x_node = &mut z_node.children[xi];

        if x_node.children.iter().any(|n| n.segment == coord.y) {
            trace!(tile = %coord, "leaf already present; insert is a no-op");
            return;
        }
        x_node.children.push(TreeNode::leaf(record));
    }

    /// Remove one leaf, pruning empty ancestors.
    fn remove(&mut self, coord: TileCoord) {
        let Some(zi) = self.roots.iter().position(|n| n.segment == coord.z) else {
            return;
        };
        let Some(xi) = self.roots[zi]
            .children
            .iter()
            .position(|n| n.segment == coord.x)
        else {
            return;
        };

        let x_node = &mut self.roots[zi].children[xi];
        x_node.children.retain(|leaf| leaf.segment != coord.y);
        if x_node.children.is_empty() {
            self.roots[zi].children.remove(xi);
        }
        if self.roots[zi].children.is_empty() {
            self.roots.remove(zi);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(z: u32, x: u32, y: u32) -> TileRecord {
        let coord = TileCoord::new(z, x, y);
        TileRecord::new(coord.file_name(), coord)
    }

    fn segments(nodes: &[TreeNode]) -> Vec<u32> {
        nodes.iter().map(|n| n.segment).collect()
    }

    #[test]
    fn test_scenario_three_tiles() {
        let tree = TileTree::build(&[record(1, 0, 0), record(1, 0, 1), record(1, 1, 0)]);

        assert_eq!(tree.nodes().len(), 1);
        let z = &tree.nodes()[0];
        assert_eq!(z.key, "1");
        assert_eq!(segments(&z.children), vec![0, 1]);

        let x0 = &z.children[0];
        assert_eq!(x0.key, "1-0");
        assert_eq!(segments(&x0.children), vec![0, 1]);
        assert!(x0.children.iter().all(|leaf| leaf.is_leaf));
        assert_eq!(x0.children[1].file_name.as_deref(), Some("1-0-1"));
    }

    #[test]
    fn test_numeric_sort_not_lexicographic() {
        let tree = TileTree::build(&[record(10, 10, 0), record(9, 9, 0), record(10, 9, 0)]);

        assert_eq!(segments(tree.nodes()), vec![9, 10]);
        assert_eq!(segments(&tree.nodes()[1].children), vec![9, 10]);
    }

    #[test]
    fn test_insert_is_idempotent() {
        let mut tree = TileTree::new();
        tree.insert(&record(2, 3, 4));
        let once = tree.clone();
        tree.insert(&record(2, 3, 4));
        assert_eq!(tree, once);
        assert_eq!(tree.leaf_count(), 1);
    }

    #[test]
    fn test_insert_resorts_siblings() {
        let mut tree = TileTree::new();
        tree.insert(&record(5, 10, 0));
        tree.insert(&record(5, 2, 0));
        assert_eq!(segments(&tree.nodes()[0].children), vec![2, 10]);
    }

    #[test]
    fn test_build_is_order_independent() {
        let records = [record(3, 1, 1), record(3, 0, 2), record(4, 0, 0)];
        let mut reversed = records.to_vec();
        reversed.reverse();
        assert_eq!(TileTree::build(&records), TileTree::build(&reversed));
    }

    #[test]
    fn test_insert_each_equals_build() {
        let records = [record(1, 0, 0), record(2, 1, 1), record(1, 0, 5), record(1, 3, 0)];
        let mut incremental = TileTree::new();
        for r in &records {
            incremental.insert(r);
        }
        assert_eq!(incremental, TileTree::build(&records));
    }

    #[test]
    fn test_remove_prunes_empty_column_then_zoom() {
        let mut tree = TileTree::build(&[record(1, 0, 0), record(1, 0, 1), record(1, 1, 0)]);

        // Last leaf under (1,1) prunes the x node but not the z node
        tree.remove_many(&[record(1, 1, 0)]);
        assert_eq!(segments(&tree.nodes()[0].children), vec![0]);

        // Removing the rest prunes (1,0) and then z=1 itself
        tree.remove_many(&[record(1, 0, 0), record(1, 0, 1)]);
        assert!(tree.is_empty());
    }

    #[test]
    fn test_remove_absent_coordinate_is_noop() {
        let mut tree = TileTree::build(&[record(1, 0, 0)]);
        let before = tree.clone();

        tree.remove_many(&[record(9, 9, 9), record(1, 0, 7), record(1, 5, 0)]);
        assert_eq!(tree, before);
    }

    #[test]
    fn test_build_then_remove_all_is_empty() {
        let records = [record(1, 0, 0), record(1, 0, 1), record(2, 2, 2)];
        let mut tree = TileTree::build(&records);
        tree.remove_many(&records);
        assert!(tree.is_empty());
        assert_eq!(tree, TileTree::new());
    }

    #[test]
    fn test_json_snapshot_elides_branch_record_fields() {
        let tree = TileTree::build(&[record(1, 2, 3)]);
        let json = tree.to_json().unwrap();
        assert!(json.contains("\"key\":\"1-2-3\""));
        assert!(json.contains("\"tile_id\":\"1-2-3\""));
        // Branch nodes skip the leaf-only fields entirely
        assert_eq!(json.matches("tile_id").count(), 1);
    }

    #[test]
    fn test_leaf_carries_record_data() {
        let rec = record(7, 8, 9);
        let tree = TileTree::build(&[rec.clone()]);
        let leaf = &tree.nodes()[0].children[0].children[0];
        assert!(leaf.is_leaf);
        assert_eq!(leaf.key, "7-8-9");
        assert_eq!(leaf.tile_id.as_deref(), Some(rec.id.as_str()));
        assert_eq!(leaf.file_name.as_deref(), Some("7-8-9"));
    }

    // Property-based tests using proptest
    mod property_tests {
        use super::*;
        use proptest::prelude::*;

        fn small_records() -> impl Strategy<Value = Vec<TileRecord>> {
            proptest::collection::vec((0u32..6, 0u32..6, 0u32..6), 0..40)
                .prop_map(|coords| coords.into_iter().map(|(z, x, y)| record(z, x, y)).collect())
        }

        fn assert_sorted(nodes: &[TreeNode]) {
            for pair in nodes.windows(2) {
                assert!(pair[0].segment < pair[1].segment, "siblings not strictly ascending");
            }
            for node in nodes {
                assert_sorted(&node.children);
            }
        }

        proptest! {
            #[test]
            fn test_build_shuffle_invariant(records in small_records().prop_shuffle()) {
                let mut sorted = records.clone();
                sorted.sort_by_key(|r| (r.z, r.x, r.y));
                prop_assert_eq!(TileTree::build(&records), TileTree::build(&sorted));
            }

            #[test]
            fn test_siblings_strictly_ascending(records in small_records()) {
                let tree = TileTree::build(&records);
                assert_sorted(tree.nodes());
            }

            #[test]
            fn test_build_remove_roundtrip(records in small_records()) {
                let mut tree = TileTree::build(&records);
                tree.remove_many(&records);
                prop_assert!(tree.is_empty());
            }

            #[test]
            fn test_leaf_count_matches_distinct_coords(records in small_records()) {
                let tree = TileTree::build(&records);
                let distinct: std::collections::HashSet<_> =
                    records.iter().map(|r| (r.z, r.x, r.y)).collect();
                prop_assert_eq!(tree.leaf_count(), distinct.len());
            }
        }
    }
}
