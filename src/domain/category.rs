//! Category Entity
//!
//! A node in the two-level menu tree. Root categories have no parent;
//! subcategories have exactly one parent, which must itself be a root.

use serde::{Deserialize, Serialize};
use super::entity::{DomainError, DomainResult, Entity};

pub const MAX_CATEGORY_NAME_LEN: usize = 100;
pub const MAX_DESCRIPTION_LEN: usize = 500;

/// A menu category or subcategory
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Category {
    /// Unique identifier
    pub id: u32,
    /// Owning restaurant (tenant)
    pub restaurant_id: u32,
    pub name: String,
    pub description: Option<String>,
    /// Position among siblings; not necessarily contiguous
    pub sort_order: f64,
    /// Soft-delete flag
    pub is_active: bool,
    /// Parent category ID (None = root level)
    pub parent_id: Option<u32>,
    pub created_at: Option<i64>,
    pub updated_at: Option<i64>,
}

impl Category {
    /// Create a new root category with default values
    pub fn new(id: u32, restaurant_id: u32, name: String) -> Self {
        Self {
            id,
            restaurant_id,
            name,
            description: None,
            sort_order: 0.0,
            is_active: true,
            parent_id: None,
            created_at: None,
            updated_at: None,
        }
    }

    /// Create a new subcategory under a parent
    pub fn new_child(id: u32, restaurant_id: u32, name: String, parent_id: u32, sort_order: f64) -> Self {
        Self {
            parent_id: Some(parent_id),
            sort_order,
            ..Self::new(id, restaurant_id, name)
        }
    }

    pub fn with_description(mut self, description: Option<String>) -> Self {
        self.description = description;
        self
    }

    /// Check if this is a root category (no parent)
    pub fn is_root(&self) -> bool {
        self.parent_id.is_none()
    }
}

impl Entity for Category {
    type Id = u32;

    fn id(&self) -> Self::Id {
        self.id
    }
}

/// Trim and validate a category name.
///
/// Names are 1-100 characters of letters, digits, whitespace, `-`, `_`, `&` or `'`.
pub fn validate_category_name(name: &str) -> DomainResult<String> {
    let name = name.trim();
    if name.is_empty() {
        return Err(DomainError::InvalidInput("Category name is required".to_string()));
    }
    if name.chars().count() > MAX_CATEGORY_NAME_LEN {
        return Err(DomainError::InvalidInput(format!(
            "Category name must be less than {} characters",
            MAX_CATEGORY_NAME_LEN
        )));
    }
    let allowed = |c: char| c.is_alphanumeric() || c.is_whitespace() || matches!(c, '-' | '_' | '&' | '\'');
    if !name.chars().all(allowed) {
        return Err(DomainError::InvalidInput("Category name contains invalid characters".to_string()));
    }
    Ok(name.to_string())
}

/// Trim a description; blank becomes None
pub fn validate_description(description: Option<&str>) -> DomainResult<Option<String>> {
    let Some(text) = description.map(str::trim).filter(|d| !d.is_empty()) else {
        return Ok(None);
    };
    if text.chars().count() > MAX_DESCRIPTION_LEN {
        return Err(DomainError::InvalidInput(format!(
            "Description must be less than {} characters",
            MAX_DESCRIPTION_LEN
        )));
    }
    Ok(Some(text.to_string()))
}
