//! Menu Item Repository
//!
//! SQLite-backed CRUD for menu items. Items always hang off a subcategory.

use async_trait::async_trait;
use rusqlite::{params, Connection};

use crate::domain::{
    validate_description, DishType, DomainError, DomainResult, MenuItem, OrderUpdate, Serviceability,
};
use crate::reorder::OrderKeyAllocator;
use super::db::{not_initialized, SharedConnection};
use super::traits::{Repository, TenantRepository};

const MENU_ITEM_COLUMNS: &str = "id, restaurant_id, category_id, name, description, price, tax_rate, dish_type, \
     sort_order, is_active, delivery, takeaway, dine_in, created_at, updated_at";

/// SQLite implementation of MenuItem repository
pub struct MenuItemRepository {
    conn: SharedConnection,
    allocator: OrderKeyAllocator,
}

impl MenuItemRepository {
    pub fn new(conn: SharedConnection) -> Self {
        Self {
            conn,
            allocator: OrderKeyAllocator::default(),
        }
    }

    pub fn with_allocator(mut self, allocator: OrderKeyAllocator) -> Self {
        self.allocator = allocator;
        self
    }

    /// Items of one subcategory, ordered by sort key
    pub async fn list_by_category(&self, category_id: u32) -> DomainResult<Vec<MenuItem>> {
        let guard = self.conn.lock().await;
        let conn = guard.as_ref().ok_or_else(not_initialized)?;

        let mut stmt = conn
            .prepare(&format!(
                "SELECT {} FROM menu_items WHERE category_id = ? ORDER BY sort_order, id",
                MENU_ITEM_COLUMNS
            ))
            .map_err(|e| DomainError::Internal(e.to_string()))?;
        let mut rows = stmt
            .query(params![category_id])
            .map_err(|e| DomainError::Internal(e.to_string()))?;

        let mut items = Vec::new();
        while let Some(row) = rows.next().map_err(|e| DomainError::Internal(e.to_string()))? {
            items.push(row_to_menu_item(row)?);
        }
        Ok(items)
    }

    /// Flip availability; returns the new state
    pub async fn toggle_active(&self, id: u32) -> DomainResult<bool> {
        let guard = self.conn.lock().await;
        let conn = guard.as_ref().ok_or_else(not_initialized)?;

        let changed = conn
            .execute(
                "UPDATE menu_items SET is_active = 1 - is_active, updated_at = ? WHERE id = ?",
                params![chrono::Utc::now().timestamp_millis(), id],
            )
            .map_err(|e| DomainError::Internal(e.to_string()))?;
        if changed == 0 {
            return Err(DomainError::NotFound(format!("Menu item {} not found", id)));
        }

        conn.query_row("SELECT is_active FROM menu_items WHERE id = ?", params![id], |row| row.get(0))
            .map_err(|e| DomainError::Internal(e.to_string()))
    }

    /// Create with an explicit sort key instead of the trailing one
    pub async fn create_with_sort_order(&self, entity: &MenuItem, sort_order: f64) -> DomainResult<MenuItem> {
        self.insert(entity, Some(sort_order)).await
    }

    /// Write a reorder decision: sort key, and subcategory when moving
    pub async fn apply_order(&self, update: &OrderUpdate) -> DomainResult<()> {
        let guard = self.conn.lock().await;
        let conn = guard.as_ref().ok_or_else(not_initialized)?;
        let now = chrono::Utc::now().timestamp_millis();

        let changed = match update.parent_id {
            Some(category_id) => conn.execute(
                "UPDATE menu_items SET sort_order = ?, category_id = ?, updated_at = ? WHERE id = ?",
                params![update.sort_order, category_id, now, update.id],
            ),
            None => conn.execute(
                "UPDATE menu_items SET sort_order = ?, updated_at = ? WHERE id = ?",
                params![update.sort_order, now, update.id],
            ),
        }
        .map_err(|e| DomainError::Internal(e.to_string()))?;

        if changed == 0 {
            return Err(DomainError::NotFound(format!("Menu item {} not found", update.id)));
        }
        Ok(())
    }

    async fn insert(&self, entity: &MenuItem, sort_order: Option<f64>) -> DomainResult<MenuItem> {
        entity.validate()?;
        let description = validate_description(entity.description.as_deref())?;

        let guard = self.conn.lock().await;
        let conn = guard.as_ref().ok_or_else(not_initialized)?;

        check_subcategory(conn, entity.restaurant_id, entity.category_id)?;
        let sort_order = match sort_order {
            Some(key) if key.is_finite() => key,
            Some(key) => return Err(DomainError::InvalidInput(format!("Invalid sort order {}", key))),
            None => {
                let max: Option<f64> = conn
                    .query_row(
                        "SELECT MAX(sort_order) FROM menu_items WHERE category_id = ?",
                        params![entity.category_id],
                        |row| row.get(0),
                    )
                    .map_err(|e| DomainError::Internal(e.to_string()))?;
                self.allocator.append(&max.into_iter().collect::<Vec<_>>())?
            }
        };

        let now = chrono::Utc::now().timestamp_millis();
        conn.execute(
            "INSERT INTO menu_items (restaurant_id, category_id, name, description, price, tax_rate, dish_type,
                 sort_order, is_active, delivery, takeaway, dine_in, created_at, updated_at)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
            params![
                entity.restaurant_id,
                entity.category_id,
                entity.name.trim(),
                description,
                entity.price,
                entity.tax_rate,
                entity.dish_type.as_str(),
                sort_order,
                entity.is_active,
                entity.services.delivery,
                entity.services.takeaway,
                entity.services.dine_in,
                now,
                now
            ],
        )
        .map_err(|e| DomainError::Internal(e.to_string()))?;

        Ok(MenuItem {
            id: conn.last_insert_rowid() as u32,
            name: entity.name.trim().to_string(),
            description,
            sort_order,
            created_at: Some(now),
            updated_at: Some(now),
            ..entity.clone()
        })
    }
}

#[async_trait]
impl Repository<MenuItem> for MenuItemRepository {
    async fn create(&self, entity: &MenuItem) -> DomainResult<MenuItem> {
        self.insert(entity, None).await
    }

    async fn find_by_id(&self, id: u32) -> DomainResult<Option<MenuItem>> {
        let guard = self.conn.lock().await;
        let conn = guard.as_ref().ok_or_else(not_initialized)?;

        let mut stmt = conn
            .prepare(&format!("SELECT {} FROM menu_items WHERE id = ?", MENU_ITEM_COLUMNS))
            .map_err(|e| DomainError::Internal(e.to_string()))?;
        let mut rows = stmt
            .query(params![id])
            .map_err(|e| DomainError::Internal(e.to_string()))?;

        match rows.next().map_err(|e| DomainError::Internal(e.to_string()))? {
            Some(row) => Ok(Some(row_to_menu_item(row)?)),
            None => Ok(None),
        }
    }

    async fn list(&self) -> DomainResult<Vec<MenuItem>> {
        let guard = self.conn.lock().await;
        let conn = guard.as_ref().ok_or_else(not_initialized)?;

        let mut stmt = conn
            .prepare(&format!(
                "SELECT {} FROM menu_items ORDER BY category_id, sort_order, id",
                MENU_ITEM_COLUMNS
            ))
            .map_err(|e| DomainError::Internal(e.to_string()))?;
        let mut rows = stmt.query([]).map_err(|e| DomainError::Internal(e.to_string()))?;

        let mut items = Vec::new();
        while let Some(row) = rows.next().map_err(|e| DomainError::Internal(e.to_string()))? {
            items.push(row_to_menu_item(row)?);
        }
        Ok(items)
    }

    async fn update(&self, entity: &MenuItem) -> DomainResult<MenuItem> {
        entity.validate()?;
        let description = validate_description(entity.description.as_deref())?;
        if !entity.sort_order.is_finite() {
            return Err(DomainError::InvalidInput(format!("Invalid sort order {}", entity.sort_order)));
        }

        let guard = self.conn.lock().await;
        let conn = guard.as_ref().ok_or_else(not_initialized)?;

        check_subcategory(conn, entity.restaurant_id, entity.category_id)?;
        let now = chrono::Utc::now().timestamp_millis();
        let changed = conn
            .execute(
                "UPDATE menu_items SET category_id = ?, name = ?, description = ?, price = ?, tax_rate = ?,
                     dish_type = ?, sort_order = ?, is_active = ?, delivery = ?, takeaway = ?, dine_in = ?,
                     updated_at = ?
                 WHERE id = ?",
                params![
                    entity.category_id,
                    entity.name.trim(),
                    description,
                    entity.price,
                    entity.tax_rate,
                    entity.dish_type.as_str(),
                    entity.sort_order,
                    entity.is_active,
                    entity.services.delivery,
                    entity.services.takeaway,
                    entity.services.dine_in,
                    now,
                    entity.id
                ],
            )
            .map_err(|e| DomainError::Internal(e.to_string()))?;
        if changed == 0 {
            return Err(DomainError::NotFound(format!("Menu item {} not found", entity.id)));
        }

        Ok(MenuItem {
            name: entity.name.trim().to_string(),
            description,
            updated_at: Some(now),
            ..entity.clone()
        })
    }

    async fn delete(&self, id: u32) -> DomainResult<()> {
        let guard = self.conn.lock().await;
        let conn = guard.as_ref().ok_or_else(not_initialized)?;

        let changed = conn
            .execute("DELETE FROM menu_items WHERE id = ?", params![id])
            .map_err(|e| DomainError::Internal(e.to_string()))?;
        if changed == 0 {
            return Err(DomainError::NotFound(format!("Menu item {} not found", id)));
        }
        Ok(())
    }
}

#[async_trait]
impl TenantRepository<MenuItem> for MenuItemRepository {
    /// Includes unavailable items; availability is display state, not deletion
    async fn list_for_restaurant(&self, restaurant_id: u32) -> DomainResult<Vec<MenuItem>> {
        let guard = self.conn.lock().await;
        let conn = guard.as_ref().ok_or_else(not_initialized)?;

        let mut stmt = conn
            .prepare(&format!(
                "SELECT {} FROM menu_items WHERE restaurant_id = ? ORDER BY category_id, sort_order, id",
                MENU_ITEM_COLUMNS
            ))
            .map_err(|e| DomainError::Internal(e.to_string()))?;
        let mut rows = stmt
            .query(params![restaurant_id])
            .map_err(|e| DomainError::Internal(e.to_string()))?;

        let mut items = Vec::new();
        while let Some(row) = rows.next().map_err(|e| DomainError::Internal(e.to_string()))? {
            items.push(row_to_menu_item(row)?);
        }
        Ok(items)
    }
}

/// Items may only be attached to an active subcategory of the same restaurant
fn check_subcategory(conn: &Connection, restaurant_id: u32, category_id: u32) -> DomainResult<()> {
    let mut stmt = conn
        .prepare("SELECT parent_id FROM categories WHERE id = ? AND restaurant_id = ? AND is_active = 1")
        .map_err(|e| DomainError::Internal(e.to_string()))?;
    let mut rows = stmt
        .query(params![category_id, restaurant_id])
        .map_err(|e| DomainError::Internal(e.to_string()))?;

    match rows.next().map_err(|e| DomainError::Internal(e.to_string()))? {
        None => Err(DomainError::NotFound(format!("Subcategory {} not found", category_id))),
        Some(row) => match row.get::<_, Option<u32>>(0).unwrap_or(None) {
            Some(_) => Ok(()),
            None => Err(DomainError::InvalidInput(format!(
                "Category {} is a root category; menu items belong to subcategories",
                category_id
            ))),
        },
    }
}

/// Convert a database row to MenuItem
pub(super) fn row_to_menu_item(row: &rusqlite::Row) -> DomainResult<MenuItem> {
    let dish_type: String = row.get(7).unwrap_or_default();
    Ok(MenuItem {
        id: row.get(0).map_err(|e: rusqlite::Error| DomainError::Internal(e.to_string()))?,
        restaurant_id: row.get(1).map_err(|e: rusqlite::Error| DomainError::Internal(e.to_string()))?,
        category_id: row.get(2).map_err(|e: rusqlite::Error| DomainError::Internal(e.to_string()))?,
        name: row.get(3).map_err(|e: rusqlite::Error| DomainError::Internal(e.to_string()))?,
        description: row.get::<_, Option<String>>(4).unwrap_or(None),
        price: row.get(5).map_err(|e: rusqlite::Error| DomainError::Internal(e.to_string()))?,
        tax_rate: row.get::<_, f64>(6).unwrap_or(5.0),
        dish_type: DishType::from_str(&dish_type),
        sort_order: row.get(8).map_err(|e: rusqlite::Error| DomainError::Internal(e.to_string()))?,
        is_active: row.get::<_, bool>(9).unwrap_or(true),
        services: Serviceability {
            delivery: row.get::<_, bool>(10).unwrap_or(true),
            takeaway: row.get::<_, bool>(11).unwrap_or(false),
            dine_in: row.get::<_, bool>(12).unwrap_or(false),
        },
        created_at: row.get::<_, Option<i64>>(13).unwrap_or(None),
        updated_at: row.get::<_, Option<i64>>(14).unwrap_or(None),
    })
}
