//! Tree Mutator
//!
//! Turns a drop of one node onto another into a move decision and the
//! single record update that realizes it. Works against whatever snapshot
//! it is given; it never writes anything itself.

use tracing::debug;

use crate::domain::{DomainError, DomainResult, NodeKind, NodeRef, OrderUpdate, RecordKind};
use super::allocator::OrderKeyAllocator;
use super::menu_tree::{MenuTree, Placement};

/// Subcategory drops landing this many positions or fewer from the current
/// one are elided
pub const DEFAULT_NOOP_RADIUS: usize = 1;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MoveKind {
    /// Reorder among root categories
    ReorderRoots,
    /// Reorder within the current parent
    ReorderWithinParent,
    /// Move under a new parent
    Reparent,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoOpReason {
    /// Dropped onto itself
    SameNode,
    /// Landing position is (close to) the current one
    SamePosition,
    /// Dropped onto the parent it already has
    SameParent,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MovePlan {
    pub kind: MoveKind,
    pub node: NodeRef,
    pub from_parent: Option<u32>,
    pub update: OrderUpdate,
}

#[derive(Debug, Clone, PartialEq)]
pub enum MoveOutcome {
    Apply(MovePlan),
    NoOp(NoOpReason),
}

impl MoveOutcome {
    pub fn plan(&self) -> Option<&MovePlan> {
        match self {
            MoveOutcome::Apply(plan) => Some(plan),
            MoveOutcome::NoOp(_) => None,
        }
    }
}

pub struct TreeMutator<'a> {
    tree: &'a MenuTree,
    allocator: OrderKeyAllocator,
    noop_radius: usize,
}

impl<'a> TreeMutator<'a> {
    pub fn new(tree: &'a MenuTree, allocator: OrderKeyAllocator) -> Self {
        Self {
            tree,
            allocator,
            noop_radius: DEFAULT_NOOP_RADIUS,
        }
    }

    pub fn with_noop_radius(mut self, radius: usize) -> Self {
        self.noop_radius = radius;
        self
    }

    /// Decide what dropping `dragged` onto `target` means.
    ///
    /// `Err` is a rejected move (stale node, unsupported pairing, cycle,
    /// non-finite key). `Ok(NoOp)` is an elided move.
    pub fn plan(&self, dragged: NodeRef, target: NodeRef) -> DomainResult<MoveOutcome> {
        if dragged.same_record(&target) {
            return Ok(MoveOutcome::NoOp(NoOpReason::SameNode));
        }
        let from = self.tree.locate(dragged)?;
        let to = self.tree.locate(target)?;

        use NodeKind::*;
        let outcome = match (dragged.kind, target.kind) {
            (Category, Category) => self.reorder(dragged, from, to)?,
            (Subcategory, Category) | (MenuItem, Subcategory) => self.append_to(dragged, from, target.id)?,
            (Subcategory, Subcategory) | (MenuItem, MenuItem) if from.parent == to.parent => {
                self.reorder(dragged, from, to)?
            }
            (Subcategory, Subcategory) | (MenuItem, MenuItem) => self.insert_before(dragged, from, to)?,
            (d, t) => {
                return Err(DomainError::InvalidInput(format!("Cannot drop a {} onto a {}", d, t)));
            }
        };

        match &outcome {
            MoveOutcome::Apply(plan) => debug!(
                node = %dragged,
                target = %target,
                kind = ?plan.kind,
                sort_order = plan.update.sort_order,
                parent_id = ?plan.update.parent_id,
                "move planned"
            ),
            MoveOutcome::NoOp(reason) => debug!(node = %dragged, target = %target, ?reason, "move elided"),
        }
        Ok(outcome)
    }

    /// Whether `child` may be placed under category `parent`
    pub fn can_adopt(&self, parent: u32, child: NodeRef) -> bool {
        self.check_parent(parent, child).is_ok()
    }

    fn check_parent(&self, parent: u32, child: NodeRef) -> DomainResult<()> {
        let depth = self
            .tree
            .depth(parent)
            .ok_or_else(|| DomainError::NotFound(format!("Category {} no longer exists", parent)))?;
        match child.kind.record() {
            RecordKind::Category => {
                if self.tree.is_self_or_descendant(parent, child.id) {
                    return Err(DomainError::InvalidInput(format!(
                        "{} cannot become a child of itself or its descendants",
                        child
                    )));
                }
                if depth != 0 || !self.tree.subcategories(child.id).is_empty() {
                    return Err(DomainError::InvalidInput(format!(
                        "{} cannot be nested under category {}: only two levels are supported",
                        child, parent
                    )));
                }
            }
            RecordKind::MenuItem => {
                if depth != 1 {
                    return Err(DomainError::InvalidInput(format!(
                        "Menu items belong to subcategories, not category {}",
                        parent
                    )));
                }
            }
        }
        Ok(())
    }

    /// Same-level reorder: the node lands where the target is, after it
    /// when moving down and before it when moving up.
    fn reorder(&self, dragged: NodeRef, from: Placement, to: Placement) -> DomainResult<MoveOutcome> {
        let radius = match dragged.kind {
            NodeKind::Subcategory => self.noop_radius,
            NodeKind::Category | NodeKind::MenuItem => 0,
        };
        if from.index.abs_diff(to.index) <= radius {
            return Ok(MoveOutcome::NoOp(NoOpReason::SamePosition));
        }
        let record = dragged.kind.record();
        let rest: Vec<u32> = self
            .tree
            .siblings(record, from.parent)
            .iter()
            .copied()
            .filter(|id| *id != dragged.id)
            .collect();
        // With the mover removed, "after the target" (moving down) and
        // "before the target" (moving up) are both the target's old index.
        let key = self.allocator.allocate(&self.tree.keys(record, &rest), to.index)?;

        let kind = if from.parent.is_none() {
            MoveKind::ReorderRoots
        } else {
            MoveKind::ReorderWithinParent
        };
        Ok(MoveOutcome::Apply(MovePlan {
            kind,
            node: dragged,
            from_parent: from.parent,
            update: OrderUpdate::reorder(record, dragged.id, key),
        }))
    }

    /// Re-parent to the end of `parent`'s children
    fn append_to(&self, dragged: NodeRef, from: Placement, parent: u32) -> DomainResult<MoveOutcome> {
        if from.parent == Some(parent) {
            return Ok(MoveOutcome::NoOp(NoOpReason::SameParent));
        }
        self.check_parent(parent, dragged)?;
        let record = dragged.kind.record();
        let siblings = self.tree.siblings(record, Some(parent));
        let key = self.allocator.append(&self.tree.keys(record, siblings))?;
        Ok(self.reparent_plan(dragged, from, key, parent))
    }

    /// Re-parent next to a node in another parent, taking its place
    fn insert_before(&self, dragged: NodeRef, from: Placement, to: Placement) -> DomainResult<MoveOutcome> {
        let parent = to
            .parent
            .ok_or_else(|| DomainError::InvalidInput(format!("{} has no parent to join", dragged)))?;
        self.check_parent(parent, dragged)?;
        let record = dragged.kind.record();
        let siblings = self.tree.siblings(record, Some(parent));
        let key = self.allocator.allocate(&self.tree.keys(record, siblings), to.index)?;
        Ok(self.reparent_plan(dragged, from, key, parent))
    }

    fn reparent_plan(&self, dragged: NodeRef, from: Placement, key: f64, parent: u32) -> MoveOutcome {
        MoveOutcome::Apply(MovePlan {
            kind: MoveKind::Reparent,
            node: dragged,
            from_parent: from.parent,
            update: OrderUpdate::reparent(dragged.kind.record(), dragged.id, key, parent),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reorder::menu_tree::fixtures::*;

    fn plan(tree: &MenuTree, dragged: NodeRef, target: NodeRef) -> DomainResult<MoveOutcome> {
        TreeMutator::new(tree, OrderKeyAllocator::default()).plan(dragged, target)
    }

    fn plan_exact(tree: &MenuTree, dragged: NodeRef, target: NodeRef) -> DomainResult<MoveOutcome> {
        TreeMutator::new(tree, OrderKeyAllocator::default())
            .with_noop_radius(0)
            .plan(dragged, target)
    }

    fn update_of(outcome: MoveOutcome) -> OrderUpdate {
        match outcome {
            MoveOutcome::Apply(plan) => plan.update,
            MoveOutcome::NoOp(reason) => panic!("expected a move, got {:?}", reason),
        }
    }

    #[test]
    fn test_category_moved_to_tail() {
        let tree = sample_tree();
        let outcome = plan(&tree, NodeRef::category(1), NodeRef::category(3)).unwrap();
        let plan = outcome.plan().unwrap();
        assert_eq!(plan.kind, MoveKind::ReorderRoots);
        assert_eq!(plan.update, OrderUpdate::reorder(RecordKind::Category, 1, 4000.0));
    }

    #[test]
    fn test_category_moved_to_head() {
        let tree = sample_tree();
        let update = update_of(plan(&tree, NodeRef::category(3), NodeRef::category(1)).unwrap());
        assert_eq!(update.sort_order, 0.0);
        assert_eq!(update.parent_id, None);
    }

    #[test]
    fn test_adjacent_categories_swap() {
        let (tree, _) = MenuTree::from_snapshot(vec![root(1, "A", 1000.0), root(2, "B", 2000.0)], vec![]);
        let update = update_of(plan(&tree, NodeRef::category(1), NodeRef::category(2)).unwrap());
        assert_eq!(update, OrderUpdate::reorder(RecordKind::Category, 1, 3000.0));

        let update = update_of(plan(&tree, NodeRef::category(2), NodeRef::category(1)).unwrap());
        assert_eq!(update, OrderUpdate::reorder(RecordKind::Category, 2, 0.0));
    }

    #[test]
    fn test_adjacent_subcategory_drop_elided() {
        let tree = sample_tree();
        let outcome = plan(&tree, NodeRef::subcategory(10), NodeRef::subcategory(11)).unwrap();
        assert_eq!(outcome, MoveOutcome::NoOp(NoOpReason::SamePosition));
    }

    #[test]
    fn test_adjacent_menu_items_swap() {
        let tree = sample_tree();
        let update = update_of(plan(&tree, NodeRef::menu_item(100), NodeRef::menu_item(101)).unwrap());
        assert_eq!(update, OrderUpdate::reorder(RecordKind::MenuItem, 100, 2500.0));
    }

    #[test]
    fn test_noop_radius_ignored_outside_subcategories() {
        let tree = sample_tree();
        let outcome = TreeMutator::new(&tree, OrderKeyAllocator::default())
            .with_noop_radius(5)
            .plan(NodeRef::category(1), NodeRef::category(2))
            .unwrap();
        assert!(outcome.plan().is_some());
    }

    #[test]
    fn test_collided_keys_use_offset() {
        let (tree, _) = MenuTree::from_snapshot(
            vec![root(1, "A", 1000.0), root(2, "B", 1001.0), root(3, "C", 2000.0)],
            vec![],
        );
        let update = update_of(plan(&tree, NodeRef::category(3), NodeRef::category(2)).unwrap());
        assert_eq!(update, OrderUpdate::reorder(RecordKind::Category, 3, 1500.0));
    }

    #[test]
    fn test_subcategory_onto_other_category_appends() {
        let tree = sample_tree();
        let outcome = plan(&tree, NodeRef::subcategory(10), NodeRef::category(2)).unwrap();
        let plan = outcome.plan().unwrap();
        assert_eq!(plan.kind, MoveKind::Reparent);
        assert_eq!(plan.from_parent, Some(1));
        assert_eq!(plan.update, OrderUpdate::reparent(RecordKind::Category, 10, 1800.0, 2));
    }

    #[test]
    fn test_subcategory_onto_empty_category() {
        let tree = sample_tree();
        let update = update_of(plan(&tree, NodeRef::subcategory(10), NodeRef::category(3)).unwrap());
        assert_eq!(update, OrderUpdate::reparent(RecordKind::Category, 10, 1000.0, 3));
    }

    #[test]
    fn test_subcategory_onto_own_parent_is_noop() {
        let tree = sample_tree();
        let outcome = plan(&tree, NodeRef::subcategory(10), NodeRef::category(1)).unwrap();
        assert_eq!(outcome, MoveOutcome::NoOp(NoOpReason::SameParent));
    }

    #[test]
    fn test_drop_onto_itself_is_noop() {
        let tree = sample_tree();
        assert_eq!(
            plan(&tree, NodeRef::subcategory(10), NodeRef::subcategory(10)).unwrap(),
            MoveOutcome::NoOp(NoOpReason::SameNode)
        );
        // Missing nodes are not looked up for a self-drop
        assert_eq!(
            plan(&tree, NodeRef::menu_item(999), NodeRef::menu_item(999)).unwrap(),
            MoveOutcome::NoOp(NoOpReason::SameNode)
        );
    }

    #[test]
    fn test_subcategory_reorder_within_parent() {
        let tree = sample_tree();
        let update = update_of(plan_exact(&tree, NodeRef::subcategory(10), NodeRef::subcategory(11)).unwrap());
        assert_eq!(update, OrderUpdate::reorder(RecordKind::Category, 10, 2500.0));
        assert!(!update.is_reparent());
    }

    #[test]
    fn test_subcategory_onto_subcategory_of_other_parent() {
        let tree = sample_tree();
        let outcome = plan(&tree, NodeRef::subcategory(11), NodeRef::subcategory(20)).unwrap();
        let plan = outcome.plan().unwrap();
        assert_eq!(plan.kind, MoveKind::Reparent);
        // Takes the head slot before Curries (800)
        assert_eq!(plan.update, OrderUpdate::reparent(RecordKind::Category, 11, 0.0, 2));
    }

    #[test]
    fn test_cross_parent_insert_between_siblings() {
        let (tree, _) = MenuTree::from_snapshot(
            vec![
                root(1, "A", 1000.0),
                root(2, "B", 2000.0),
                sub(10, "X", 1, 1000.0),
                sub(20, "Y", 2, 1000.0),
                sub(21, "Z", 2, 3000.0),
            ],
            vec![],
        );
        let update = update_of(plan(&tree, NodeRef::subcategory(10), NodeRef::subcategory(21)).unwrap());
        assert_eq!(update, OrderUpdate::reparent(RecordKind::Category, 10, 2000.0, 2));
    }

    #[test]
    fn test_menu_item_reorder() {
        let tree = sample_tree();
        let update = update_of(plan(&tree, NodeRef::menu_item(100), NodeRef::menu_item(102)).unwrap());
        assert_eq!(update, OrderUpdate::reorder(RecordKind::MenuItem, 100, 4000.0));
    }

    #[test]
    fn test_menu_item_moves_to_other_subcategory() {
        let tree = sample_tree();
        let update = update_of(plan(&tree, NodeRef::menu_item(101), NodeRef::subcategory(11)).unwrap());
        assert_eq!(update, OrderUpdate::reparent(RecordKind::MenuItem, 101, 1000.0, 11));
    }

    #[test]
    fn test_unsupported_pairs_rejected() {
        let tree = sample_tree();
        for (dragged, target) in [
            (NodeRef::category(1), NodeRef::subcategory(20)),
            (NodeRef::subcategory(10), NodeRef::menu_item(101)),
            (NodeRef::menu_item(100), NodeRef::category(2)),
            (NodeRef::category(2), NodeRef::menu_item(100)),
        ] {
            let err = plan(&tree, dragged, target).unwrap_err();
            assert!(matches!(err, DomainError::InvalidInput(_)), "{} onto {}", dragged, target);
        }
    }

    #[test]
    fn test_stale_drag_rejected() {
        let tree = sample_tree();
        let err = plan(&tree, NodeRef::subcategory(55), NodeRef::category(1)).unwrap_err();
        assert!(matches!(err, DomainError::NotFound(_)));
        let err = plan(&tree, NodeRef::category(1), NodeRef::category(55)).unwrap_err();
        assert!(matches!(err, DomainError::NotFound(_)));
    }

    #[test]
    fn test_no_category_adopts_itself_or_ancestor() {
        let tree = sample_tree();
        let mutator = TreeMutator::new(&tree, OrderKeyAllocator::default());
        assert!(!mutator.can_adopt(1, NodeRef::category(1)));
        assert!(!mutator.can_adopt(10, NodeRef::category(1)));
        assert!(!mutator.can_adopt(10, NodeRef::subcategory(11)));
        assert!(!mutator.can_adopt(2, NodeRef::category(1)));
        assert!(mutator.can_adopt(2, NodeRef::subcategory(10)));
        assert!(mutator.can_adopt(11, NodeRef::menu_item(100)));
        assert!(!mutator.can_adopt(1, NodeRef::menu_item(100)));
    }

    #[test]
    fn test_non_finite_key_rejected() {
        let (tree, _) = MenuTree::from_snapshot(
            vec![root(1, "A", 1000.0), root(2, "B", 2000.0), root(3, "C", f64::NAN)],
            vec![],
        );
        let err = plan(&tree, NodeRef::category(1), NodeRef::category(3)).unwrap_err();
        assert!(matches!(err, DomainError::InvalidInput(_)));
    }

    mod properties {
        use super::*;
        use proptest::prelude::*;

        /// Root keys, (root index, key) per subcategory, (subcategory index, key) per item
        type Shape = (Vec<u32>, Vec<(usize, u32)>, Vec<(usize, u32)>);

        fn shape() -> impl Strategy<Value = Shape> {
            (
                prop::collection::vec(0u32..10_000, 1..5),
                prop::collection::vec((0usize..8, 0u32..10_000), 0..8),
                prop::collection::vec((0usize..8, 0u32..10_000), 0..10),
            )
        }

        fn build((roots, subs, items): &Shape) -> (MenuTree, Vec<NodeRef>) {
            let mut categories = Vec::new();
            let mut nodes = Vec::new();
            for (i, key) in roots.iter().enumerate() {
                let id = 1 + i as u32;
                categories.push(root(id, "root", f64::from(*key)));
                nodes.push(NodeRef::category(id));
            }
            for (i, (parent, key)) in subs.iter().enumerate() {
                let id = 100 + i as u32;
                let parent = 1 + (parent % roots.len()) as u32;
                categories.push(sub(id, "sub", parent, f64::from(*key)));
                nodes.push(NodeRef::subcategory(id));
            }
            let mut records = Vec::new();
            if !subs.is_empty() {
                for (i, (category, key)) in items.iter().enumerate() {
                    let id = 1000 + i as u32;
                    let category = 100 + (category % subs.len()) as u32;
                    records.push(item(id, "item", category, f64::from(*key)));
                    nodes.push(NodeRef::menu_item(id));
                }
            }
            let (tree, anomalies) = MenuTree::from_snapshot(categories, records);
            assert!(anomalies.is_empty());
            (tree, nodes)
        }

        proptest! {
            #[test]
            fn planned_update_matches_move_kind(shape in shape(), pick in (0usize..64, 0usize..64)) {
                let (tree, nodes) = build(&shape);
                let dragged = nodes[pick.0 % nodes.len()];
                let target = nodes[pick.1 % nodes.len()];

                let outcome = plan(&tree, dragged, target);
                prop_assert_eq!(&outcome, &plan(&tree, dragged, target));

                match outcome {
                    Ok(MoveOutcome::Apply(plan)) => {
                        let update = &plan.update;
                        prop_assert_eq!(update.id, dragged.id);
                        prop_assert_eq!(update.record, dragged.kind.record());
                        prop_assert!(update.sort_order.is_finite() && update.sort_order >= 0.0);
                        match plan.kind {
                            MoveKind::Reparent => {
                                prop_assert!(update.parent_id.is_some());
                                prop_assert_ne!(update.parent_id, plan.from_parent);
                            }
                            MoveKind::ReorderRoots => {
                                prop_assert_eq!(update.parent_id, None);
                                prop_assert_eq!(plan.from_parent, None);
                            }
                            MoveKind::ReorderWithinParent => {
                                prop_assert_eq!(update.parent_id, None);
                                prop_assert!(plan.from_parent.is_some());
                            }
                        }

                        let mut moved = tree.clone();
                        prop_assert!(moved.apply(update).is_ok());
                        let parent = moved.parent_of(update.record, update.id);
                        prop_assert_eq!(parent, update.parent_id.or(plan.from_parent));
                    }
                    Ok(MoveOutcome::NoOp(_)) => {}
                    Err(e) => prop_assert!(matches!(e, DomainError::InvalidInput(_)), "{}", e),
                }
            }
        }
    }
}
