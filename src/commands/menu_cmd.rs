//! Commands for category and menu item CRUD
//!
//! Every write reloads the loaded tree so the next drag decides against
//! fresh sort keys.

use crate::domain::{Category, DishType, MenuItem, Serviceability};
use crate::reorder::{MenuTree, TreeAnomaly};
use crate::repository::Repository;
use crate::tree::{flatten_tree, DisplayRow};
use crate::{AppState, LoadedMenu};

/// Load a restaurant's menu into the editor; returns the records that were left out
pub async fn load_menu(state: &AppState, restaurant_id: u32) -> Result<Vec<TreeAnomaly>, String> {
    let (categories, items) = state.store.snapshot(restaurant_id).await.map_err(|e| e.to_string())?;
    let (tree, anomalies) = MenuTree::from_snapshot(categories, items);
    tracing::info!(
        restaurant_id,
        categories = tree.category_count(),
        items = tree.item_count(),
        anomalies = anomalies.len(),
        "menu loaded"
    );
    *state.menu.lock().await = Some(LoadedMenu { restaurant_id, tree });
    Ok(anomalies)
}

/// Re-read the loaded restaurant, if any
pub(crate) async fn reload_menu(state: &AppState) -> Result<(), String> {
    let restaurant_id = state.menu.lock().await.as_ref().map(|m| m.restaurant_id);
    if let Some(restaurant_id) = restaurant_id {
        load_menu(state, restaurant_id).await?;
    }
    Ok(())
}

/// Rows for the structure view in the current sorting mode
pub async fn get_display_rows(state: &AppState) -> Result<Vec<DisplayRow>, String> {
    let mode = state.sorting.lock().await.mode();
    let expansion = state.expansion.lock().await;
    let menu = state.menu.lock().await;
    let menu = menu.as_ref().ok_or("No menu loaded")?;
    Ok(flatten_tree(&menu.tree, mode, |id| expansion.is_expanded(id)))
}

/// Create a category (no parent) or subcategory, placed after its siblings
pub async fn create_category(
    state: &AppState,
    restaurant_id: u32,
    name: String,
    description: Option<String>,
    parent_id: Option<u32>,
) -> Result<Category, String> {
    let mut category = Category::new(0, restaurant_id, name).with_description(description);
    category.parent_id = parent_id;

    let created = state.store.categories.create(&category).await.map_err(|e| e.to_string())?;
    reload_menu(state).await?;
    Ok(created)
}

/// Rename or re-describe a category. Sort key and parent are kept.
pub async fn update_category(
    state: &AppState,
    id: u32,
    name: String,
    description: Option<String>,
) -> Result<Category, String> {
    let repo = &state.store.categories;
    let mut category = repo
        .find_by_id(id)
        .await
        .map_err(|e| e.to_string())?
        .ok_or_else(|| format!("Category {} not found", id))?;
    category.name = name;
    category.description = description;

    let updated = repo.update(&category).await.map_err(|e| e.to_string())?;
    reload_menu(state).await?;
    Ok(updated)
}

/// Delete a category with its subcategories and their items
pub async fn delete_category(state: &AppState, id: u32) -> Result<(), String> {
    state.store.categories.delete(id).await.map_err(|e| e.to_string())?;
    reload_menu(state).await
}

/// Create a menu item at the end of its subcategory
#[allow(clippy::too_many_arguments)]
pub async fn create_menu_item(
    state: &AppState,
    restaurant_id: u32,
    category_id: u32,
    name: String,
    price: f64,
    tax_rate: Option<f64>,
    dish_type: Option<String>,
    services: Option<Serviceability>,
) -> Result<MenuItem, String> {
    let mut item = MenuItem::new(0, restaurant_id, category_id, name, price);
    if let Some(tax_rate) = tax_rate {
        item.tax_rate = tax_rate;
    }
    item.dish_type = dish_type.map(|t| DishType::from_str(&t)).unwrap_or_default();
    item.services = services.unwrap_or_default();

    let created = state.store.items.create(&item).await.map_err(|e| e.to_string())?;
    reload_menu(state).await?;
    Ok(created)
}

/// Replace a menu item's editable fields
pub async fn update_menu_item(state: &AppState, item: MenuItem) -> Result<MenuItem, String> {
    let updated = state.store.items.update(&item).await.map_err(|e| e.to_string())?;
    reload_menu(state).await?;
    Ok(updated)
}

pub async fn delete_menu_item(state: &AppState, id: u32) -> Result<(), String> {
    state.store.items.delete(id).await.map_err(|e| e.to_string())?;
    reload_menu(state).await
}

/// Flip availability; returns the new state
pub async fn toggle_menu_item(state: &AppState, id: u32) -> Result<bool, String> {
    let active = state.store.items.toggle_active(id).await.map_err(|e| e.to_string())?;
    reload_menu(state).await?;
    Ok(active)
}
