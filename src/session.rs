//! Drag Session Controller
//!
//! Owns one drag gesture from press to drop and gates it behind the
//! sorting mode. The controller is the only caller of the tree mutator;
//! the resulting update is handed to an `OrderStore`, never applied to
//! sort keys directly.
//!
//! ```text
//! Idle --press--> Pending --moved past activation distance--> Dragging
//! Dragging --over--> Dragging (hover only)
//! Dragging --drop on target--> mutator --> Idle
//! Dragging --drop on nothing / cancel--> Idle
//! ```

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use menu_dragdrop::{DndState, Point, Release, DRAG_THRESHOLD_PX};
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, warn};

use crate::domain::{DomainResult, NodeKind, NodeRef, SortingMode};
use crate::reorder::{MenuTree, MoveOutcome, MovePlan, NoOpReason, OrderKeyAllocator, TreeMutator, DEFAULT_NOOP_RADIUS};
use crate::repository::OrderStore;

/// The node being dragged, as rendered
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DragItem {
    pub node: NodeRef,
    pub name: String,
}

impl DragItem {
    pub fn new(node: NodeRef, name: impl Into<String>) -> Self {
        Self { node, name: name.into() }
    }
}

/// Tunables for a session
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SessionSettings {
    pub allocator: OrderKeyAllocator,
    pub noop_radius: usize,
    /// Pixels the pointer must travel before a press becomes a drag
    pub activation_distance: u32,
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            allocator: OrderKeyAllocator::default(),
            noop_radius: DEFAULT_NOOP_RADIUS,
            activation_distance: DRAG_THRESHOLD_PX,
        }
    }
}

/// What a release amounted to
#[derive(Debug, Clone, PartialEq)]
pub enum DropOutcome {
    /// A move was decided; its update must be written
    Move(MovePlan),
    /// Dropped somewhere that changes nothing
    NoOp(NoOpReason),
    /// Released over no target
    Cancelled,
    /// Pressed and released without dragging
    Click(NodeRef),
    /// No gesture in progress
    Ignored,
}

/// Drop pairings a hover target can accept
pub fn accepts(dragged: NodeKind, target: NodeKind) -> bool {
    use NodeKind::*;
    matches!(
        (dragged, target),
        (Category, Category)
            | (Subcategory, Category)
            | (Subcategory, Subcategory)
            | (MenuItem, Subcategory)
            | (MenuItem, MenuItem)
    )
}

/// Marks a planned move as being written. The session stays busy until
/// this is dropped or `complete` is called.
#[derive(Debug)]
pub struct PendingWrite {
    busy: Arc<AtomicBool>,
}

impl Drop for PendingWrite {
    fn drop(&mut self) {
        self.busy.store(false, Ordering::SeqCst);
    }
}

pub struct DragSessionController {
    dnd: DndState<DragItem, NodeRef>,
    mode: SortingMode,
    /// A reorder write is in flight
    busy: Arc<AtomicBool>,
    settings: SessionSettings,
}

impl DragSessionController {
    pub fn new(mode: SortingMode, settings: SessionSettings) -> Self {
        Self {
            dnd: DndState::new(settings.activation_distance),
            mode,
            busy: Arc::new(AtomicBool::new(false)),
            settings,
        }
    }

    pub fn mode(&self) -> SortingMode {
        self.mode
    }

    pub fn settings(&self) -> &SessionSettings {
        &self.settings
    }

    pub fn is_idle(&self) -> bool {
        self.dnd.is_idle()
    }

    pub fn is_dragging(&self) -> bool {
        self.dnd.is_dragging()
    }

    pub fn is_busy(&self) -> bool {
        self.busy.load(Ordering::SeqCst)
    }

    /// Guard for the write of the move the last drop decided
    pub fn pending_write(&self) -> PendingWrite {
        PendingWrite { busy: self.busy.clone() }
    }

    /// The node being dragged, once past the activation distance
    pub fn dragging(&self) -> Option<&DragItem> {
        self.dnd.dragging()
    }

    /// Current hover target, for visual affordance only
    pub fn hover(&self) -> Option<NodeRef> {
        self.dnd.over().copied()
    }

    /// Whether the last release ended a real drag. Reading clears it.
    pub fn take_drag_just_ended(&mut self) -> bool {
        self.dnd.take_drag_just_ended()
    }

    fn refuse_start(&self, item: &DragItem) -> bool {
        if self.mode.is_alphabetical() {
            debug!(node = %item.node, "drag refused in alphabetical mode");
            return true;
        }
        if self.is_busy() {
            debug!(node = %item.node, "drag refused while a reorder is being saved");
            return true;
        }
        false
    }

    /// Pointer pressed on a draggable node. The drag starts once the
    /// pointer travels past the activation distance.
    pub fn pointer_down(&mut self, item: DragItem, at: Point) -> bool {
        if self.refuse_start(&item) {
            return false;
        }
        self.dnd.press(item, at)
    }

    /// Returns true when this move started the drag
    pub fn pointer_move(&mut self, at: Point) -> bool {
        let started = self.dnd.pointer_move(at);
        if started {
            if let Some(item) = self.dnd.dragging() {
                info!(node = %item.node, name = %item.name, "drag started");
            }
        }
        started
    }

    /// Start immediately, without a pointer (keyboard drags)
    pub fn begin_drag(&mut self, item: DragItem) -> bool {
        if self.refuse_start(&item) || !self.dnd.is_idle() {
            return false;
        }
        info!(node = %item.node, name = %item.name, "drag started");
        self.dnd.start(item)
    }

    /// Hover changed. Targets the dragged node cannot land on are not tracked.
    pub fn drag_over(&mut self, target: Option<NodeRef>) {
        let Some(dragged) = self.dnd.dragging().map(|item| item.node) else {
            return;
        };
        match target {
            Some(target) if accepts(dragged.kind, target.kind) => self.dnd.enter(target),
            _ => self.dnd.leave(),
        }
    }

    /// Release the pointer and decide the move against `tree`.
    ///
    /// A `Move` marks the controller busy until `complete` is called or
    /// the write's [`PendingWrite`] is dropped.
    /// `Err` is a rejected drop; the session is back to idle either way.
    pub fn drop(&mut self, tree: &MenuTree) -> DomainResult<DropOutcome> {
        let (item, target) = match self.dnd.release() {
            Release::Nothing => return Ok(DropOutcome::Ignored),
            Release::Click(item) => return Ok(DropOutcome::Click(item.node)),
            Release::Cancelled(item) => {
                debug!(node = %item.node, "drag cancelled over no target");
                return Ok(DropOutcome::Cancelled);
            }
            Release::Drop { source, target } => (source, target),
        };

        let mutator = TreeMutator::new(tree, self.settings.allocator).with_noop_radius(self.settings.noop_radius);
        match mutator.plan(item.node, target) {
            Ok(MoveOutcome::Apply(plan)) => {
                self.busy.store(true, Ordering::SeqCst);
                Ok(DropOutcome::Move(plan))
            }
            Ok(MoveOutcome::NoOp(reason)) => Ok(DropOutcome::NoOp(reason)),
            Err(e) => {
                warn!(node = %item.node, target = %target, error = %e, "drop rejected");
                Err(e)
            }
        }
    }

    /// Abort the gesture. Returns the dragged node, if any.
    pub fn cancel(&mut self) -> Option<DragItem> {
        let item = self.dnd.cancel();
        if let Some(item) = &item {
            debug!(node = %item.node, "drag cancelled");
        }
        item
    }

    /// Switch sorting mode. Going alphabetical ends any gesture in progress,
    /// which is returned.
    pub fn set_sorting_mode(&mut self, mode: SortingMode) -> Option<DragItem> {
        self.mode = mode;
        if mode.is_alphabetical() && !self.dnd.is_idle() {
            let item = self.dnd.cancel();
            if let Some(item) = &item {
                info!(node = %item.node, "drag cancelled by switch to alphabetical order");
            }
            return item;
        }
        None
    }

    /// Record the result of writing a planned move
    pub fn complete(&mut self, plan: &MovePlan, result: &DomainResult<()>) {
        self.busy.store(false, Ordering::SeqCst);
        match result {
            Ok(()) => info!(
                node = %plan.node,
                kind = ?plan.kind,
                sort_order = plan.update.sort_order,
                parent_id = ?plan.update.parent_id,
                "move saved"
            ),
            Err(e) => error!(node = %plan.node, error = %e, "failed to save move"),
        }
    }

    /// Drop, write the decided move and apply it to the local snapshot
    pub async fn drop_and_persist<S>(&mut self, tree: &mut MenuTree, store: &S) -> DomainResult<DropOutcome>
    where
        S: OrderStore + ?Sized,
    {
        let outcome = self.drop(tree)?;
        let DropOutcome::Move(plan) = &outcome else {
            return Ok(outcome);
        };

        let _pending = self.pending_write();
        let result = store.apply_order_update(&plan.update).await;
        self.complete(plan, &result);
        result?;

        if let Err(e) = tree.apply(&plan.update) {
            // Saved, but the snapshot disagrees; the next reload fixes it
            warn!(error = %e, "local snapshot out of date");
        }
        Ok(outcome)
    }
}
