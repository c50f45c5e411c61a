//! Category Repository
//!
//! SQLite-backed CRUD for categories and subcategories, which share one
//! table. Deleting a category removes its subcategories and their items.

use async_trait::async_trait;
use rusqlite::{params, Connection, OptionalExtension};

use crate::domain::{
    validate_category_name, validate_description, Category, DomainError, DomainResult, OrderUpdate,
};
use crate::reorder::OrderKeyAllocator;
use super::db::{not_initialized, SharedConnection};
use super::traits::{Repository, TenantRepository};

const CATEGORY_COLUMNS: &str =
    "id, restaurant_id, name, description, sort_order, is_active, parent_id, created_at, updated_at";

/// SQLite implementation of Category repository
pub struct CategoryRepository {
    conn: SharedConnection,
    allocator: OrderKeyAllocator,
}

impl CategoryRepository {
    pub fn new(conn: SharedConnection) -> Self {
        Self {
            conn,
            allocator: OrderKeyAllocator::default(),
        }
    }

    /// Use a custom allocator for trailing keys on create
    pub fn with_allocator(mut self, allocator: OrderKeyAllocator) -> Self {
        self.allocator = allocator;
        self
    }

    /// Create with an explicit sort key instead of the trailing one
    pub async fn create_with_sort_order(&self, entity: &Category, sort_order: f64) -> DomainResult<Category> {
        self.insert(entity, Some(sort_order)).await
    }

    /// Key that places a new category after its active siblings
    pub async fn next_sort_order(&self, restaurant_id: u32, parent_id: Option<u32>) -> DomainResult<f64> {
        let guard = self.conn.lock().await;
        let conn = guard.as_ref().ok_or_else(not_initialized)?;
        trailing_key(conn, &self.allocator, restaurant_id, parent_id)
    }

    /// Active subcategories of a category
    pub async fn list_children(&self, parent_id: u32) -> DomainResult<Vec<Category>> {
        let guard = self.conn.lock().await;
        let conn = guard.as_ref().ok_or_else(not_initialized)?;

        let mut stmt = conn
            .prepare(&format!(
                "SELECT {} FROM categories WHERE parent_id = ? AND is_active = 1 ORDER BY sort_order, id",
                CATEGORY_COLUMNS
            ))
            .map_err(|e| DomainError::Internal(e.to_string()))?;
        let mut rows = stmt
            .query(params![parent_id])
            .map_err(|e| DomainError::Internal(e.to_string()))?;

        let mut children = Vec::new();
        while let Some(row) = rows.next().map_err(|e| DomainError::Internal(e.to_string()))? {
            children.push(row_to_category(row)?);
        }
        Ok(children)
    }

    /// Write a reorder decision: sort key, and parent when re-parenting
    pub async fn apply_order(&self, update: &OrderUpdate) -> DomainResult<()> {
        let guard = self.conn.lock().await;
        let conn = guard.as_ref().ok_or_else(not_initialized)?;
        let now = chrono::Utc::now().timestamp_millis();

        let changed = match update.parent_id {
            Some(parent_id) => conn.execute(
                "UPDATE categories SET sort_order = ?, parent_id = ?, updated_at = ? WHERE id = ? AND is_active = 1",
                params![update.sort_order, parent_id, now, update.id],
            ),
            None => conn.execute(
                "UPDATE categories SET sort_order = ?, updated_at = ? WHERE id = ? AND is_active = 1",
                params![update.sort_order, now, update.id],
            ),
        }
        .map_err(|e| DomainError::Internal(e.to_string()))?;

        if changed == 0 {
            return Err(DomainError::NotFound(format!("Category {} not found", update.id)));
        }
        Ok(())
    }

    async fn insert(&self, entity: &Category, sort_order: Option<f64>) -> DomainResult<Category> {
        let name = validate_category_name(&entity.name)?;
        let description = validate_description(entity.description.as_deref())?;

        let guard = self.conn.lock().await;
        let conn = guard.as_ref().ok_or_else(not_initialized)?;

        if let Some(parent_id) = entity.parent_id {
            check_parent(conn, entity.restaurant_id, parent_id, None)?;
        }
        let sort_order = match sort_order {
            Some(key) if key.is_finite() => key,
            Some(key) => return Err(DomainError::InvalidInput(format!("Invalid sort order {}", key))),
            None => trailing_key(conn, &self.allocator, entity.restaurant_id, entity.parent_id)?,
        };

        let now = chrono::Utc::now().timestamp_millis();
        conn.execute(
            "INSERT INTO categories (restaurant_id, name, description, sort_order, is_active, parent_id, created_at, updated_at)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?)",
            params![
                entity.restaurant_id,
                name,
                description,
                sort_order,
                entity.is_active,
                entity.parent_id,
                now,
                now
            ],
        )
        .map_err(|e| DomainError::Internal(e.to_string()))?;

        Ok(Category {
            id: conn.last_insert_rowid() as u32,
            name,
            description,
            sort_order,
            created_at: Some(now),
            updated_at: Some(now),
            ..entity.clone()
        })
    }
}

#[async_trait]
impl Repository<Category> for CategoryRepository {
    async fn create(&self, entity: &Category) -> DomainResult<Category> {
        self.insert(entity, None).await
    }

    async fn find_by_id(&self, id: u32) -> DomainResult<Option<Category>> {
        let guard = self.conn.lock().await;
        let conn = guard.as_ref().ok_or_else(not_initialized)?;
        find_category(conn, id)
    }

    async fn list(&self) -> DomainResult<Vec<Category>> {
        let guard = self.conn.lock().await;
        let conn = guard.as_ref().ok_or_else(not_initialized)?;

        let mut stmt = conn
            .prepare(&format!(
                "SELECT {} FROM categories WHERE is_active = 1 ORDER BY parent_id NULLS FIRST, sort_order, id",
                CATEGORY_COLUMNS
            ))
            .map_err(|e| DomainError::Internal(e.to_string()))?;
        let mut rows = stmt.query([]).map_err(|e| DomainError::Internal(e.to_string()))?;

        let mut categories = Vec::new();
        while let Some(row) = rows.next().map_err(|e| DomainError::Internal(e.to_string()))? {
            categories.push(row_to_category(row)?);
        }
        Ok(categories)
    }

    async fn update(&self, entity: &Category) -> DomainResult<Category> {
        let name = validate_category_name(&entity.name)?;
        let description = validate_description(entity.description.as_deref())?;
        if !entity.sort_order.is_finite() {
            return Err(DomainError::InvalidInput(format!("Invalid sort order {}", entity.sort_order)));
        }

        let guard = self.conn.lock().await;
        let conn = guard.as_ref().ok_or_else(not_initialized)?;

        if let Some(parent_id) = entity.parent_id {
            check_parent(conn, entity.restaurant_id, parent_id, Some(entity.id))?;
        }

        let now = chrono::Utc::now().timestamp_millis();
        let changed = conn
            .execute(
                "UPDATE categories SET name = ?, description = ?, sort_order = ?, is_active = ?, parent_id = ?, updated_at = ? WHERE id = ?",
                params![name, description, entity.sort_order, entity.is_active, entity.parent_id, now, entity.id],
            )
            .map_err(|e| DomainError::Internal(e.to_string()))?;
        if changed == 0 {
            return Err(DomainError::NotFound(format!("Category {} not found", entity.id)));
        }

        Ok(Category {
            name,
            description,
            updated_at: Some(now),
            ..entity.clone()
        })
    }

    async fn delete(&self, id: u32) -> DomainResult<()> {
        let guard = self.conn.lock().await;
        let conn = guard.as_ref().ok_or_else(not_initialized)?;

        if find_category(conn, id)?.is_none() {
            return Err(DomainError::NotFound(format!("Category {} not found", id)));
        }

        let tx = conn
            .unchecked_transaction()
            .map_err(|e| DomainError::Internal(e.to_string()))?;
        // Items of the category itself and of every subcategory below it
        tx.execute(
            "DELETE FROM menu_items WHERE category_id = ?1 OR category_id IN (SELECT id FROM categories WHERE parent_id = ?1)",
            params![id],
        )
        .map_err(|e| DomainError::Internal(e.to_string()))?;
        let subcategories = tx
            .execute("DELETE FROM categories WHERE parent_id = ?", params![id])
            .map_err(|e| DomainError::Internal(e.to_string()))?;
        tx.execute("DELETE FROM categories WHERE id = ?", params![id])
            .map_err(|e| DomainError::Internal(e.to_string()))?;
        tx.commit().map_err(|e| DomainError::Internal(e.to_string()))?;

        tracing::info!(category = id, subcategories, "category deleted");
        Ok(())
    }
}

#[async_trait]
impl TenantRepository<Category> for CategoryRepository {
    async fn list_for_restaurant(&self, restaurant_id: u32) -> DomainResult<Vec<Category>> {
        let guard = self.conn.lock().await;
        let conn = guard.as_ref().ok_or_else(not_initialized)?;

        let mut stmt = conn
            .prepare(&format!(
                "SELECT {} FROM categories WHERE restaurant_id = ? AND is_active = 1
                 ORDER BY parent_id NULLS FIRST, sort_order, id",
                CATEGORY_COLUMNS
            ))
            .map_err(|e| DomainError::Internal(e.to_string()))?;
        let mut rows = stmt
            .query(params![restaurant_id])
            .map_err(|e| DomainError::Internal(e.to_string()))?;

        let mut categories = Vec::new();
        while let Some(row) = rows.next().map_err(|e| DomainError::Internal(e.to_string()))? {
            categories.push(row_to_category(row)?);
        }
        Ok(categories)
    }
}

fn find_category(conn: &Connection, id: u32) -> DomainResult<Option<Category>> {
    let mut stmt = conn
        .prepare(&format!("SELECT {} FROM categories WHERE id = ?", CATEGORY_COLUMNS))
        .map_err(|e| DomainError::Internal(e.to_string()))?;
    let mut rows = stmt
        .query(params![id])
        .map_err(|e| DomainError::Internal(e.to_string()))?;

    match rows.next().map_err(|e| DomainError::Internal(e.to_string()))? {
        Some(row) => Ok(Some(row_to_category(row)?)),
        None => Ok(None),
    }
}

/// A parent must be an active root category of the same restaurant
fn check_parent(conn: &Connection, restaurant_id: u32, parent_id: u32, child: Option<u32>) -> DomainResult<()> {
    if child == Some(parent_id) {
        return Err(DomainError::InvalidInput(format!(
            "Category {} cannot be its own parent",
            parent_id
        )));
    }
    let parent = find_category(conn, parent_id)?
        .filter(|p| p.is_active && p.restaurant_id == restaurant_id)
        .ok_or_else(|| DomainError::NotFound(format!("Parent category {} not found", parent_id)))?;
    if !parent.is_root() {
        return Err(DomainError::InvalidInput(format!(
            "Category {} is a subcategory and cannot have children",
            parent_id
        )));
    }
    if let Some(child) = child {
        let has_children: Option<u32> = conn
            .query_row(
                "SELECT id FROM categories WHERE parent_id = ? AND is_active = 1 LIMIT 1",
                params![child],
                |row| row.get(0),
            )
            .optional()
            .map_err(|e| DomainError::Internal(e.to_string()))?;
        if has_children.is_some() {
            return Err(DomainError::InvalidInput(format!(
                "Category {} has subcategories and cannot be nested",
                child
            )));
        }
    }
    Ok(())
}

fn trailing_key(
    conn: &Connection,
    allocator: &OrderKeyAllocator,
    restaurant_id: u32,
    parent_id: Option<u32>,
) -> DomainResult<f64> {
    let max: Option<f64> = conn
        .query_row(
            "SELECT MAX(sort_order) FROM categories WHERE restaurant_id = ? AND parent_id IS ? AND is_active = 1",
            params![restaurant_id, parent_id],
            |row| row.get(0),
        )
        .map_err(|e| DomainError::Internal(e.to_string()))?;
    allocator.append(&max.into_iter().collect::<Vec<_>>())
}

/// Convert a database row to Category
pub(super) fn row_to_category(row: &rusqlite::Row) -> DomainResult<Category> {
    Ok(Category {
        id: row.get(0).map_err(|e: rusqlite::Error| DomainError::Internal(e.to_string()))?,
        restaurant_id: row.get(1).map_err(|e: rusqlite::Error| DomainError::Internal(e.to_string()))?,
        name: row.get(2).map_err(|e: rusqlite::Error| DomainError::Internal(e.to_string()))?,
        description: row.get::<_, Option<String>>(3).unwrap_or(None),
        sort_order: row.get(4).map_err(|e: rusqlite::Error| DomainError::Internal(e.to_string()))?,
        is_active: row.get::<_, bool>(5).unwrap_or(true),
        parent_id: row.get::<_, Option<u32>>(6).unwrap_or(None),
        created_at: row.get::<_, Option<i64>>(7).unwrap_or(None),
        updated_at: row.get::<_, Option<i64>>(8).unwrap_or(None),
    })
}
