//! Traversal and lookup operations over entity trees.

use crate::types::EntityNode;
use std::collections::HashSet;

/// Pre-order traversal of `roots`, paired with each node's depth (roots are 0).
///
/// # Examples
///
/// ```
/// use routekit::v1::{EntityNode, query};
///
/// let roots = vec![
///     EntityNode::new("home"),
///     EntityNode::new("admin").with_child(EntityNode::new("admin.users")),
/// ];
///
/// let ids: Vec<(usize, &str)> = query::walk(&roots)
///     .into_iter()
///     .map(|(depth, node)| (depth, node.id.as_str()))
///     .collect();
/// assert_eq!(ids, vec![(0, "home"), (0, "admin"), (1, "admin.users")]);
/// ```
pub fn walk(roots: &[EntityNode]) -> Vec<(usize, &EntityNode)> {
    let mut result = Vec::new();
    let mut stack: Vec<(usize, &EntityNode)> = roots.iter().rev().map(|n| (0, n)).collect();

    while let Some((depth, node)) = stack.pop() {
        result.push((depth, node));
        for child in node.children.iter().rev() {
            stack.push((depth + 1, child));
        }
    }

    result
}

/// Find a node anywhere in the tree by id.
pub fn find<'a>(roots: &'a [EntityNode], id: &str) -> Option<&'a EntityNode> {
    walk(roots)
        .into_iter()
        .find(|(_, node)| node.id == id)
        .map(|(_, node)| node)
}

/// Depth of the node with `id`, if present.
pub fn depth_of(roots: &[EntityNode], id: &str) -> Option<usize> {
    walk(roots)
        .into_iter()
        .find(|(_, node)| node.id == id)
        .map(|(depth, _)| depth)
}

/// The node whose children contain `id`. Roots have no parent.
pub fn parent_of<'a>(roots: &'a [EntityNode], id: &str) -> Option<&'a EntityNode> {
    walk(roots)
        .into_iter()
        .map(|(_, node)| node)
        .find(|node| node.children.iter().any(|c| c.id == id))
}

/// Ids from the root down to (and including) `id`.
///
/// # Examples
///
/// ```
/// use routekit::v1::{EntityNode, query};
///
/// let roots = vec![EntityNode::new("admin").with_child(
///     EntityNode::new("admin.users").with_child(EntityNode::new("admin.users.edit")),
/// )];
///
/// assert_eq!(
///     query::lineage(&roots, "admin.users.edit"),
///     vec!["admin", "admin.users", "admin.users.edit"]
/// );
/// assert!(query::lineage(&roots, "missing").is_empty());
/// ```
pub fn lineage<'a>(roots: &'a [EntityNode], id: &str) -> Vec<&'a str> {
    fn descend<'a>(nodes: &'a [EntityNode], id: &str, trail: &mut Vec<&'a str>) -> bool {
        for node in nodes {
            trail.push(&node.id);
            if node.id == id || descend(&node.children, id, trail) {
                return true;
            }
            trail.pop();
        }
        false
    }

    let mut trail = Vec::new();
    if descend(roots, id, &mut trail) {
        trail
    } else {
        Vec::new()
    }
}

/// Ids that appear more than once, in first-repeat order.
pub fn duplicate_ids(roots: &[EntityNode]) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut duplicates = Vec::new();
    for (_, node) in walk(roots) {
        if !seen.insert(node.id.as_str()) && !duplicates.contains(&node.id) {
            duplicates.push(node.id.clone());
        }
    }
    duplicates
}

/// Union of every node's `permissions`, in first-seen order.
pub fn all_permissions(roots: &[EntityNode]) -> Vec<String> {
    let mut seen = HashSet::new();
    walk(roots)
        .into_iter()
        .flat_map(|(_, node)| node.permissions())
        .filter(|p| seen.insert(*p))
        .map(str::to_string)
        .collect()
}

/// Union of every node's `roles`, in first-seen order.
pub fn all_roles(roots: &[EntityNode]) -> Vec<String> {
    let mut seen = HashSet::new();
    walk(roots)
        .into_iter()
        .flat_map(|(_, node)| node.roles())
        .filter(|r| seen.insert(*r))
        .map(str::to_string)
        .collect()
}
