//! Node kinds in the menu tree
//!
//! Categories and subcategories live in the same table and share an id
//! space; menu items have their own.

use serde::{Deserialize, Serialize};

/// What a draggable node is, as declared by the surface that rendered it
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum NodeKind {
    Category,
    Subcategory,
    MenuItem,
}

impl NodeKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            NodeKind::Category => "category",
            NodeKind::Subcategory => "subcategory",
            NodeKind::MenuItem => "menuItem",
        }
    }

    /// Backing record table
    pub fn record(&self) -> RecordKind {
        match self {
            NodeKind::Category | NodeKind::Subcategory => RecordKind::Category,
            NodeKind::MenuItem => RecordKind::MenuItem,
        }
    }
}

impl std::fmt::Display for NodeKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Record table an update targets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub enum RecordKind {
    #[default]
    Category,
    MenuItem,
}

/// A typed reference to a node
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NodeRef {
    pub kind: NodeKind,
    pub id: u32,
}

impl NodeRef {
    pub fn new(kind: NodeKind, id: u32) -> Self {
        Self { kind, id }
    }

    pub fn category(id: u32) -> Self {
        Self::new(NodeKind::Category, id)
    }

    pub fn subcategory(id: u32) -> Self {
        Self::new(NodeKind::Subcategory, id)
    }

    pub fn menu_item(id: u32) -> Self {
        Self::new(NodeKind::MenuItem, id)
    }

    /// Same underlying record, regardless of declared category level
    pub fn same_record(&self, other: &NodeRef) -> bool {
        self.id == other.id && self.kind.record() == other.kind.record()
    }
}

impl std::fmt::Display for NodeRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {}", self.kind, self.id)
    }
}
