//! Tree command - print the tile hierarchy.

use std::path::Path;

use tilevault::index::TreeNode;
use tilevault::transfer::DrainPolicy;

use crate::error::CliError;

/// Run the tree command.
pub async fn run(root: &Path) -> Result<(), CliError> {
    let session = super::open_session(root, DrainPolicy::default()).await?;

    let nodes = session.tree();
    if nodes.is_empty() {
        println!("Catalog is empty: {}", root.display());
        return Ok(());
    }

    for z_node in nodes {
        println!("z {}", z_node.title);
        for x_node in &z_node.children {
            println!("  x {}", x_node.title);
            for leaf in &x_node.children {
                println!("    y {}  ({})", leaf.title, leaf_name(leaf));
            }
        }
    }
    println!("{} tiles", leaf_total(nodes));
    Ok(())
}

fn leaf_name(leaf: &TreeNode) -> &str {
    leaf.file_name.as_deref().unwrap_or(&leaf.key)
}

fn leaf_total(nodes: &[TreeNode]) -> usize {
    nodes
        .iter()
        .flat_map(|z| &z.children)
        .map(|x| x.children.len())
        .sum()
}
