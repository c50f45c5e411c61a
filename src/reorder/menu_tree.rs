//! Menu Tree Arena
//!
//! In-memory snapshot of the category → subcategory → menu item tree,
//! stored as id-indexed arenas with parent back-references. Sibling lists
//! are kept sorted by `(sort_order, id)`.

use std::cmp::Ordering;
use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::domain::{Category, DomainError, DomainResult, MenuItem, NodeKind, NodeRef, OrderUpdate, RecordKind};

/// A category plus its ordered children
#[derive(Debug, Clone)]
pub struct CategoryNode {
    pub category: Category,
    /// Ordered subcategory ids (roots only)
    pub children: Vec<u32>,
    /// Ordered menu item ids (subcategories only)
    pub items: Vec<u32>,
}

/// Snapshot records that break the two-level shape.
/// They are left out of the tree and cannot be dragged.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum TreeAnomaly {
    /// Category whose parent is itself a subcategory
    NestedTooDeep { category_id: u32, parent_id: u32 },
    /// Category whose parent is missing or inactive
    DanglingParent { category_id: u32, parent_id: u32 },
    /// Menu item attached directly to a root category
    ItemOnRootCategory { item_id: u32, category_id: u32 },
    /// Menu item whose category is missing or inactive
    DanglingItem { item_id: u32, category_id: u32 },
}

/// Where a node currently sits
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Placement {
    pub parent: Option<u32>,
    pub index: usize,
}

#[derive(Debug, Clone, Default)]
pub struct MenuTree {
    categories: HashMap<u32, CategoryNode>,
    items: HashMap<u32, MenuItem>,
    roots: Vec<u32>,
}

fn by_key(a: (f64, u32), b: (f64, u32)) -> Ordering {
    a.0.total_cmp(&b.0).then(a.1.cmp(&b.1))
}

impl MenuTree {
    /// Build a tree from flat records. Inactive categories are skipped.
    pub fn from_snapshot(categories: Vec<Category>, items: Vec<MenuItem>) -> (Self, Vec<TreeAnomaly>) {
        let mut anomalies = Vec::new();
        let mut tree = MenuTree::default();

        let active: Vec<Category> = categories.into_iter().filter(|c| c.is_active).collect();
        let root_ids: HashSet<u32> = active.iter().filter(|c| c.is_root()).map(|c| c.id).collect();
        let all_ids: HashSet<u32> = active.iter().map(|c| c.id).collect();

        for category in active {
            match category.parent_id {
                None => {}
                Some(pid) if root_ids.contains(&pid) => {}
                Some(pid) if all_ids.contains(&pid) => {
                    anomalies.push(TreeAnomaly::NestedTooDeep { category_id: category.id, parent_id: pid });
                    continue;
                }
                Some(pid) => {
                    anomalies.push(TreeAnomaly::DanglingParent { category_id: category.id, parent_id: pid });
                    continue;
                }
            }
            tree.categories.insert(
                category.id,
                CategoryNode { category, children: Vec::new(), items: Vec::new() },
            );
        }

        let ids: Vec<(u32, Option<u32>)> = tree
            .categories
            .values()
            .map(|n| (n.category.id, n.category.parent_id))
            .collect();
        for (id, parent) in ids {
            match parent {
                None => tree.roots.push(id),
                Some(pid) => {
                    if let Some(parent) = tree.categories.get_mut(&pid) {
                        parent.children.push(id);
                    }
                }
            }
        }

        for item in items {
            match tree.categories.get_mut(&item.category_id) {
                Some(node) if node.category.is_root() => {
                    anomalies.push(TreeAnomaly::ItemOnRootCategory { item_id: item.id, category_id: item.category_id });
                }
                Some(node) => {
                    node.items.push(item.id);
                    tree.items.insert(item.id, item);
                }
                None => {
                    anomalies.push(TreeAnomaly::DanglingItem { item_id: item.id, category_id: item.category_id });
                }
            }
        }

        tree.sort_all();
        for anomaly in &anomalies {
            warn!(?anomaly, "menu snapshot anomaly excluded from tree");
        }
        (tree, anomalies)
    }

    fn sort_all(&mut self) {
        let mut roots = std::mem::take(&mut self.roots);
        self.sort_ids(&mut roots, RecordKind::Category);
        self.roots = roots;

        let ids: Vec<u32> = self.categories.keys().copied().collect();
        for id in ids {
            self.resort_children(id);
        }
    }

    fn resort_children(&mut self, id: u32) {
        let Some(node) = self.categories.get_mut(&id) else {
            return;
        };
        let mut children = std::mem::take(&mut node.children);
        let mut items = std::mem::take(&mut node.items);
        self.sort_ids(&mut children, RecordKind::Category);
        self.sort_ids(&mut items, RecordKind::MenuItem);
        if let Some(node) = self.categories.get_mut(&id) {
            node.children = children;
            node.items = items;
        }
    }

    fn sort_ids(&self, ids: &mut [u32], record: RecordKind) {
        ids.sort_by(|a, b| {
            let ka = (self.key_of(record, *a).unwrap_or(f64::MAX), *a);
            let kb = (self.key_of(record, *b).unwrap_or(f64::MAX), *b);
            by_key(ka, kb)
        });
    }

    pub fn is_empty(&self) -> bool {
        self.categories.is_empty()
    }

    pub fn category_count(&self) -> usize {
        self.categories.len()
    }

    pub fn item_count(&self) -> usize {
        self.items.len()
    }

    pub fn category(&self, id: u32) -> Option<&Category> {
        self.categories.get(&id).map(|n| &n.category)
    }

    pub fn menu_item(&self, id: u32) -> Option<&MenuItem> {
        self.items.get(&id)
    }

    /// Ordered root category ids
    pub fn roots(&self) -> &[u32] {
        &self.roots
    }

    /// Ordered subcategory ids of a root category
    pub fn subcategories(&self, parent: u32) -> &[u32] {
        self.categories.get(&parent).map(|n| n.children.as_slice()).unwrap_or(&[])
    }

    /// Ordered menu item ids of a subcategory
    pub fn items_of(&self, subcategory: u32) -> &[u32] {
        self.categories.get(&subcategory).map(|n| n.items.as_slice()).unwrap_or(&[])
    }

    /// Sibling set sharing `parent` in the given table
    pub fn siblings(&self, record: RecordKind, parent: Option<u32>) -> &[u32] {
        match (record, parent) {
            (RecordKind::Category, None) => &self.roots,
            (RecordKind::Category, Some(pid)) => self.subcategories(pid),
            (RecordKind::MenuItem, Some(pid)) => self.items_of(pid),
            (RecordKind::MenuItem, None) => &[],
        }
    }

    pub fn key_of(&self, record: RecordKind, id: u32) -> Option<f64> {
        match record {
            RecordKind::Category => self.category(id).map(|c| c.sort_order),
            RecordKind::MenuItem => self.menu_item(id).map(|i| i.sort_order),
        }
    }

    /// Keys for `ids`, in the same order
    pub fn keys(&self, record: RecordKind, ids: &[u32]) -> Vec<f64> {
        ids.iter().filter_map(|id| self.key_of(record, *id)).collect()
    }

    pub fn parent_of(&self, record: RecordKind, id: u32) -> Option<u32> {
        match record {
            RecordKind::Category => self.category(id).and_then(|c| c.parent_id),
            RecordKind::MenuItem => self.menu_item(id).map(|i| i.category_id),
        }
    }

    /// Declared kind as found in this snapshot
    pub fn kind_of(&self, record: RecordKind, id: u32) -> Option<NodeKind> {
        match record {
            RecordKind::Category => self.category(id).map(|c| {
                if c.is_root() {
                    NodeKind::Category
                } else {
                    NodeKind::Subcategory
                }
            }),
            RecordKind::MenuItem => self.menu_item(id).map(|_| NodeKind::MenuItem),
        }
    }

    /// Locate a node, checking that it still exists with the declared kind.
    pub fn locate(&self, node: NodeRef) -> DomainResult<Placement> {
        let record = node.kind.record();
        match self.kind_of(record, node.id) {
            None => return Err(DomainError::NotFound(format!("{} no longer exists", node))),
            Some(kind) if kind != node.kind => {
                return Err(DomainError::InvalidInput(format!("{} is now a {}", node, kind)));
            }
            Some(_) => {}
        }
        let parent = self.parent_of(record, node.id);
        let index = self
            .siblings(record, parent)
            .iter()
            .position(|id| *id == node.id)
            .ok_or_else(|| DomainError::Internal(format!("{} missing from its sibling list", node)))?;
        Ok(Placement { parent, index })
    }

    /// Whether `candidate` is `ancestor` or lies anywhere below it
    pub fn is_self_or_descendant(&self, candidate: u32, ancestor: u32) -> bool {
        let mut current = Some(candidate);
        // Bounded walk; a corrupt parent chain cannot loop forever
        for _ in 0..=self.categories.len() {
            match current {
                Some(id) if id == ancestor => return true,
                Some(id) => current = self.category(id).and_then(|c| c.parent_id),
                None => return false,
            }
        }
        false
    }

    /// Depth of a category: 0 for roots, 1 for subcategories
    pub fn depth(&self, id: u32) -> Option<usize> {
        let category = self.category(id)?;
        Some(if category.is_root() { 0 } else { 1 })
    }

    /// Apply a persisted update to the local snapshot
    pub fn apply(&mut self, update: &OrderUpdate) -> DomainResult<()> {
        match update.record {
            RecordKind::Category => self.apply_category(update),
            RecordKind::MenuItem => self.apply_item(update),
        }
    }

    fn apply_category(&mut self, update: &OrderUpdate) -> DomainResult<()> {
        let old_parent = self
            .category(update.id)
            .ok_or_else(|| DomainError::NotFound(format!("Category {} not found", update.id)))?
            .parent_id;

        if let Some(new_parent) = update.parent_id {
            if self.category(new_parent).map(|c| c.is_root()) != Some(true) {
                return Err(DomainError::InvalidInput(format!("Category {} is not a root category", new_parent)));
            }
            if !self.subcategories(update.id).is_empty() || old_parent.is_none() {
                return Err(DomainError::InvalidInput(format!("Category {} cannot be nested", update.id)));
            }
        }

        let new_parent = update.parent_id.or(old_parent);
        if let Some(node) = self.categories.get_mut(&update.id) {
            node.category.sort_order = update.sort_order;
            node.category.parent_id = new_parent;
        }

        if new_parent != old_parent {
            if let Some(old) = old_parent.and_then(|pid| self.categories.get_mut(&pid)) {
                old.children.retain(|id| *id != update.id);
            }
            if let Some(new) = new_parent.and_then(|pid| self.categories.get_mut(&pid)) {
                new.children.push(update.id);
            }
        }

        match new_parent {
            None => {
                let mut roots = std::mem::take(&mut self.roots);
                self.sort_ids(&mut roots, RecordKind::Category);
                self.roots = roots;
            }
            Some(pid) => self.resort_children(pid),
        }
        Ok(())
    }

    fn apply_item(&mut self, update: &OrderUpdate) -> DomainResult<()> {
        let old_parent = self
            .menu_item(update.id)
            .ok_or_else(|| DomainError::NotFound(format!("Menu item {} not found", update.id)))?
            .category_id;
        let new_parent = update.parent_id.unwrap_or(old_parent);
        if self.category(new_parent).map(|c| c.is_root()) != Some(false) {
            return Err(DomainError::InvalidInput(format!("Category {} is not a subcategory", new_parent)));
        }

        if let Some(item) = self.items.get_mut(&update.id) {
            item.sort_order = update.sort_order;
            item.category_id = new_parent;
        }
        if new_parent != old_parent {
            if let Some(old) = self.categories.get_mut(&old_parent) {
                old.items.retain(|id| *id != update.id);
            }
            if let Some(new) = self.categories.get_mut(&new_parent) {
                new.items.push(update.id);
            }
        }
        self.resort_children(new_parent);
        Ok(())
    }
}

#[cfg(test)]
pub(crate) mod fixtures {
    use super::*;

    pub fn root(id: u32, name: &str, key: f64) -> Category {
        let mut c = Category::new(id, 1, name.to_string());
        c.sort_order = key;
        c
    }

    pub fn sub(id: u32, name: &str, parent: u32, key: f64) -> Category {
        Category::new_child(id, 1, name.to_string(), parent, key)
    }

    pub fn item(id: u32, name: &str, category: u32, key: f64) -> MenuItem {
        let mut i = MenuItem::new(id, 1, category, name.to_string(), 10.0);
        i.sort_order = key;
        i
    }

    /// Roots 1 (Starters), 2 (Mains), 3 (Drinks);
    /// Starters: 10 (Soups, 500), 11 (Salads, 1500);
    /// Mains: 20 (Curries, 800);
    /// Soups: items 100, 101, 102
    pub fn sample_tree() -> MenuTree {
        let categories = vec![
            root(1, "Starters", 1000.0),
            root(2, "Mains", 2000.0),
            root(3, "Drinks", 3000.0),
            sub(10, "Soups", 1, 500.0),
            sub(11, "Salads", 1, 1500.0),
            sub(20, "Curries", 2, 800.0),
        ];
        let items = vec![
            item(100, "Tomato Soup", 10, 1000.0),
            item(101, "Lentil Soup", 10, 2000.0),
            item(102, "Corn Soup", 10, 3000.0),
        ];
        let (tree, anomalies) = MenuTree::from_snapshot(categories, items);
        assert!(anomalies.is_empty());
        tree
    }
}
