//! Destination folder lookup for the session's cycle

use tracing::info;

use super::error::Result;
use crate::client::{FolderNode, TestManagement};

/// Pre-order depth-first search for the first node named exactly `name`
pub fn find_folder(nodes: &[FolderNode], name: &str) -> Option<u64> {
    for node in nodes {
        if node.name == name {
            return Some(node.id);
        }
        if let Some(id) = find_folder(&node.children, name) {
            return Some(id);
        }
    }
    None
}

/// Return the id of the folder named `name` anywhere under `root`, creating a
/// root-level folder when none exists
pub async fn resolve_or_create(
    remote: &dyn TestManagement,
    root: &FolderNode,
    name: &str,
) -> Result<u64> {
    if let Some(id) = find_folder(&root.children, name) {
        info!("Folder '{}' found, id {}", name, id);
        return Ok(id);
    }

    info!("Folder '{}' not found, creating it", name);
    let id = remote.create_folder(name).await?;
    info!("Created folder '{}', id {}", name, id);
    Ok(id)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tree() -> FolderNode {
        FolderNode::root(vec![
            FolderNode::new(1, "Regression").with_children(vec![
                FolderNode::new(2, "API"),
                FolderNode::new(3, "UI").with_children(vec![FolderNode::new(4, "Nightly")]),
            ]),
            FolderNode::new(5, "Nightly"),
        ])
    }

    #[test]
    fn test_find_top_level() {
        assert_eq!(find_folder(&tree().children, "Regression"), Some(1));
    }

    #[test]
    fn test_find_nested_prefers_pre_order() {
        // "Nightly" exists at depth 3 under Regression and at the top level
        assert_eq!(find_folder(&tree().children, "Nightly"), Some(4));
        assert_eq!(find_folder(&tree().children, "API"), Some(2));
    }

    #[test]
    fn test_find_requires_exact_name() {
        assert_eq!(find_folder(&tree().children, "api"), None);
        assert_eq!(find_folder(&tree().children, "Night"), None);
        assert_eq!(find_folder(&[], "API"), None);
    }
}
