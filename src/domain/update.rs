//! Outbound order update
//!
//! The only write the reordering engine issues: a new sort key and,
//! for re-parent moves, a new parent, applied as one record update.

use serde::{Deserialize, Serialize};

use super::node::RecordKind;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderUpdate {
    /// Table the record lives in; not part of the payload
    #[serde(skip)]
    pub record: RecordKind,
    pub id: u32,
    pub sort_order: f64,
    /// Present only when the node changes parent
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub parent_id: Option<u32>,
}

impl OrderUpdate {
    /// Same-level reorder: never carries a parent
    pub fn reorder(record: RecordKind, id: u32, sort_order: f64) -> Self {
        Self {
            record,
            id,
            sort_order,
            parent_id: None,
        }
    }

    pub fn reparent(record: RecordKind, id: u32, sort_order: f64, parent_id: u32) -> Self {
        Self {
            record,
            id,
            sort_order,
            parent_id: Some(parent_id),
        }
    }

    pub fn is_reparent(&self) -> bool {
        self.parent_id.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_payload_shape() {
        let update = OrderUpdate::reorder(RecordKind::Category, 3, 1500.0);
        let json = serde_json::to_value(&update).unwrap();
        assert_eq!(json, serde_json::json!({"id": 3, "sortOrder": 1500.0}));

        let update = OrderUpdate::reparent(RecordKind::Category, 3, 1800.0, 9);
        let json = serde_json::to_value(&update).unwrap();
        assert_eq!(json, serde_json::json!({"id": 3, "sortOrder": 1800.0, "parentId": 9}));
    }
}
