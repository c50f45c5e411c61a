//! Commands for client-local preferences

use crate::domain::SortingMode;
use crate::AppState;

pub async fn get_sorting_mode(state: &AppState) -> Result<SortingMode, String> {
    Ok(state.sorting.lock().await.mode())
}

/// Set the sorting mode by name. Switching to alphabetical ends any drag.
pub async fn set_sorting_mode(state: &AppState, mode: String) -> Result<SortingMode, String> {
    let mode = SortingMode::parse(&mode).ok_or_else(|| format!("Unknown sorting mode '{}'", mode))?;
    apply_sorting_mode(state, mode).await
}

pub async fn toggle_sorting_mode(state: &AppState) -> Result<SortingMode, String> {
    let next = state.sorting.lock().await.mode().toggled();
    apply_sorting_mode(state, next).await
}

pub async fn reset_sorting_mode(state: &AppState) -> Result<SortingMode, String> {
    let mut sorting = state.sorting.lock().await;
    let saved = sorting.reset();
    state.session.lock().await.set_sorting_mode(sorting.mode());
    saved.map_err(|e| e.to_string())?;
    Ok(sorting.mode())
}

async fn apply_sorting_mode(state: &AppState, mode: SortingMode) -> Result<SortingMode, String> {
    let mut sorting = state.sorting.lock().await;
    let saved = sorting.set(mode);
    // The session follows the new mode even if saving failed
    state.session.lock().await.set_sorting_mode(mode);
    if let Err(e) = saved {
        tracing::warn!(error = %e, "sorting mode not saved");
        return Err(e.to_string());
    }
    Ok(mode)
}

/// Returns whether the category is now expanded
pub async fn toggle_expanded(state: &AppState, category_id: u32) -> Result<bool, String> {
    state
        .expansion
        .lock()
        .await
        .toggle(category_id)
        .map_err(|e| e.to_string())
}

/// Expand every category of the loaded menu
pub async fn expand_all(state: &AppState) -> Result<(), String> {
    let ids: Vec<u32> = {
        let menu = state.menu.lock().await;
        let menu = menu.as_ref().ok_or("No menu loaded")?;
        menu.tree
            .roots()
            .iter()
            .flat_map(|root| std::iter::once(*root).chain(menu.tree.subcategories(*root).iter().copied()))
            .collect()
    };
    state.expansion.lock().await.expand_all(ids).map_err(|e| e.to_string())
}

pub async fn collapse_all(state: &AppState) -> Result<(), String> {
    state.expansion.lock().await.collapse_all().map_err(|e| e.to_string())
}
