//! Tree Utilities
//!
//! Flattens the menu tree into display rows.

use serde::Serialize;

use crate::domain::{NodeRef, SortingMode};
use crate::reorder::MenuTree;

/// One rendered row
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DisplayRow {
    pub node: NodeRef,
    pub name: String,
    pub depth: usize,
    pub sort_order: f64,
    /// Category with children or subcategory with items
    pub has_children: bool,
}

/// Render the tree as indented rows using DFS.
///
/// Manual mode keeps the `(sort_order, id)` order of the tree; alphabetical
/// mode orders every sibling set by case-insensitive name. Children of
/// categories for which `is_expanded` is false are skipped.
pub fn flatten_tree(tree: &MenuTree, mode: SortingMode, is_expanded: impl Fn(u32) -> bool) -> Vec<DisplayRow> {
    let category_name = |id: u32| tree.category(id).map(|c| c.name.clone()).unwrap_or_default();
    let item_name = |id: u32| tree.menu_item(id).map(|i| i.name.clone()).unwrap_or_default();

    let mut rows = Vec::new();
    for root_id in ordered(tree.roots(), mode, category_name) {
        let Some(root) = tree.category(root_id) else { continue };
        let subs = tree.subcategories(root_id);
        rows.push(DisplayRow {
            node: NodeRef::category(root_id),
            name: root.name.clone(),
            depth: 0,
            sort_order: root.sort_order,
            has_children: !subs.is_empty(),
        });
        if !is_expanded(root_id) {
            continue;
        }

        for sub_id in ordered(subs, mode, category_name) {
            let Some(sub) = tree.category(sub_id) else { continue };
            let items = tree.items_of(sub_id);
            rows.push(DisplayRow {
                node: NodeRef::subcategory(sub_id),
                name: sub.name.clone(),
                depth: 1,
                sort_order: sub.sort_order,
                has_children: !items.is_empty(),
            });
            if !is_expanded(sub_id) {
                continue;
            }

            for item_id in ordered(items, mode, item_name) {
                let Some(item) = tree.menu_item(item_id) else { continue };
                rows.push(DisplayRow {
                    node: NodeRef::menu_item(item_id),
                    name: item.name.clone(),
                    depth: 2,
                    sort_order: item.sort_order,
                    has_children: false,
                });
            }
        }
    }
    rows
}

fn ordered(ids: &[u32], mode: SortingMode, name_of: impl Fn(u32) -> String) -> Vec<u32> {
    let mut ids = ids.to_vec();
    if mode.is_alphabetical() {
        ids.sort_by_cached_key(|id| (name_of(*id).to_lowercase(), *id));
    }
    ids
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reorder::fixtures::sample_tree;

    fn ids(rows: &[DisplayRow]) -> Vec<(NodeRef, usize)> {
        rows.iter().map(|r| (r.node, r.depth)).collect()
    }

    #[test]
    fn test_manual_order_fully_expanded() {
        let tree = sample_tree();
        let rows = flatten_tree(&tree, SortingMode::Manual, |_| true);

        assert_eq!(
            ids(&rows),
            vec![
                (NodeRef::category(1), 0),
                (NodeRef::subcategory(10), 1),
                (NodeRef::menu_item(100), 2),
                (NodeRef::menu_item(101), 2),
                (NodeRef::menu_item(102), 2),
                (NodeRef::subcategory(11), 1),
                (NodeRef::category(2), 0),
                (NodeRef::subcategory(20), 1),
                (NodeRef::category(3), 0),
            ]
        );
        assert!(rows[0].has_children);
        assert!(!rows[5].has_children);
    }

    #[test]
    fn test_collapsed_children_skipped() {
        let tree = sample_tree();
        let rows = flatten_tree(&tree, SortingMode::Manual, |id| id == 1);
        assert_eq!(
            ids(&rows),
            vec![
                (NodeRef::category(1), 0),
                (NodeRef::subcategory(10), 1),
                (NodeRef::subcategory(11), 1),
                (NodeRef::category(2), 0),
                (NodeRef::category(3), 0),
            ]
        );
    }

    #[test]
    fn test_alphabetical_order_ignores_keys() {
        let tree = sample_tree();
        let rows = flatten_tree(&tree, SortingMode::Alphabetical, |_| false);
        let names: Vec<&str> = rows.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, vec!["Drinks", "Mains", "Starters"]);
    }
}
