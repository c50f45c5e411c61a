//! Commands for the drag gesture
//!
//! Pointer events go straight to the session controller; the drop decides
//! and writes the move against the loaded tree.

use menu_dragdrop::Point;
use tracing::warn;

use crate::domain::{NodeRef, OrderUpdate};
use crate::repository::OrderStore;
use crate::session::{DragItem, DragSessionController, DropOutcome};
use crate::AppState;

pub async fn drag_pointer_down(state: &AppState, node: NodeRef, name: String, x: i32, y: i32) -> Result<bool, String> {
    let mut session = state.session.lock().await;
    Ok(session.pointer_down(DragItem::new(node, name), Point::new(x, y)))
}

/// Returns true when the move started the drag
pub async fn drag_pointer_move(state: &AppState, x: i32, y: i32) -> Result<bool, String> {
    Ok(state.session.lock().await.pointer_move(Point::new(x, y)))
}

/// Keyboard-initiated drag, no activation distance
pub async fn drag_begin(state: &AppState, node: NodeRef, name: String) -> Result<bool, String> {
    Ok(state.session.lock().await.begin_drag(DragItem::new(node, name)))
}

/// Hover changed; returns the target now highlighted, if any
pub async fn drag_over(state: &AppState, target: Option<NodeRef>) -> Result<Option<NodeRef>, String> {
    let mut session = state.session.lock().await;
    session.drag_over(target);
    Ok(session.hover())
}

/// Release the pointer. Returns the saved update, or `None` when nothing moved.
///
/// The move is decided under the session lock; the write runs with the
/// lock released so new drags are refused rather than queued.
pub async fn drag_drop(state: &AppState) -> Result<Option<OrderUpdate>, String> {
    let (restaurant_id, plan, pending) = {
        let mut session = state.session.lock().await;
        let menu = state.menu.lock().await;
        let Some(menu) = menu.as_ref() else {
            session.cancel();
            return Err("No menu loaded".to_string());
        };
        match DragSessionController::drop(&mut session, &menu.tree).map_err(|e| e.to_string())? {
            DropOutcome::Move(plan) => (menu.restaurant_id, plan, session.pending_write()),
            _ => return Ok(None),
        }
    };

    let result = state.store.apply_order_update(&plan.update).await;
    state.session.lock().await.complete(&plan, &result);
    drop(pending);
    result.map_err(|e| e.to_string())?;

    let mut menu = state.menu.lock().await;
    if let Some(menu) = menu.as_mut().filter(|m| m.restaurant_id == restaurant_id) {
        if let Err(e) = menu.tree.apply(&plan.update) {
            // Saved, but the snapshot disagrees; the next reload fixes it
            warn!(error = %e, "local snapshot out of date");
        }
    }
    Ok(Some(plan.update))
}

/// Abort the gesture; returns whether one was in progress
pub async fn drag_cancel(state: &AppState) -> Result<bool, String> {
    Ok(state.session.lock().await.cancel().is_some())
}
