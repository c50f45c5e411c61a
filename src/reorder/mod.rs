//! Reordering Engine
//!
//! - allocator: sort keys for a landing position
//! - menu_tree: arena snapshot of the menu structure
//! - mutator: drop classification and the resulting record update

mod allocator;
mod menu_tree;
mod mutator;

pub use allocator::{OrderKeyAllocator, DEFAULT_COLLISION_OFFSET, DEFAULT_SPACING};
pub use menu_tree::{CategoryNode, MenuTree, Placement, TreeAnomaly};
pub use mutator::{MoveKind, MoveOutcome, MovePlan, NoOpReason, TreeMutator, DEFAULT_NOOP_RADIUS};

#[cfg(test)]
pub(crate) use menu_tree::fixtures;
