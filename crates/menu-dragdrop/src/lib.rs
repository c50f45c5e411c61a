//! Menu DragDrop Utilities
//!
//! Simple drag-and-drop state for pointer input, independent of any UI toolkit.
//! Uses a movement threshold to distinguish click from drag.
//!
//! The state is generic over the dragged source `S` and the hover target `T`,
//! so the same machine drives categories, subcategories and menu items.

/// Default movement threshold in pixels to start dragging
pub const DRAG_THRESHOLD_PX: u32 = 10;

/// Pointer position in client coordinates
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Point {
    pub x: i32,
    pub y: i32,
}

impl Point {
    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

/// Drag phase
#[derive(Clone, Debug, PartialEq)]
pub enum DragPhase<S, T> {
    /// Nothing pressed
    Idle,
    /// Pressed on a source but not yet moved past the threshold
    Pending { source: S, start: Point },
    /// Actively dragging, optionally hovering a target
    Dragging { source: S, over: Option<T> },
}

/// Result of releasing the pointer
#[derive(Clone, Debug, PartialEq)]
pub enum Release<S, T> {
    /// Pointer released while pending: a plain click on the source
    Click(S),
    /// Dropped onto a target
    Drop { source: S, target: T },
    /// Dragged but released over nothing
    Cancelled(S),
    /// Nothing was pressed
    Nothing,
}

/// DnD state
#[derive(Clone, Debug)]
pub struct DndState<S, T> {
    phase: DragPhase<S, T>,
    threshold: u32,
    /// Set when a drag ends, so the trailing click can be swallowed
    drag_just_ended: bool,
}

impl<S, T> Default for DndState<S, T> {
    fn default() -> Self {
        Self::new(DRAG_THRESHOLD_PX)
    }
}

impl<S, T> DndState<S, T> {
    pub fn new(threshold: u32) -> Self {
        Self {
            phase: DragPhase::Idle,
            threshold,
            drag_just_ended: false,
        }
    }

    pub fn phase(&self) -> &DragPhase<S, T> {
        &self.phase
    }

    pub fn threshold(&self) -> u32 {
        self.threshold
    }

    pub fn is_idle(&self) -> bool {
        matches!(self.phase, DragPhase::Idle)
    }

    pub fn is_dragging(&self) -> bool {
        matches!(self.phase, DragPhase::Dragging { .. })
    }

    /// Source currently being dragged (not pending)
    pub fn dragging(&self) -> Option<&S> {
        match &self.phase {
            DragPhase::Dragging { source, .. } => Some(source),
            _ => None,
        }
    }

    /// Target currently hovered during a drag
    pub fn over(&self) -> Option<&T> {
        match &self.phase {
            DragPhase::Dragging { over, .. } => over.as_ref(),
            _ => None,
        }
    }

    /// Whether the last release ended a real drag.
    /// Reading the flag clears it.
    pub fn take_drag_just_ended(&mut self) -> bool {
        std::mem::take(&mut self.drag_just_ended)
    }

    /// Record a pending drag with start position.
    /// Ignored unless idle.
    pub fn press(&mut self, source: S, at: Point) -> bool {
        if !self.is_idle() {
            return false;
        }
        self.phase = DragPhase::Pending { source, start: at };
        true
    }

    /// Start dragging immediately, skipping the threshold (keyboard drags).
    pub fn start(&mut self, source: S) -> bool {
        if self.is_dragging() {
            return false;
        }
        self.phase = DragPhase::Dragging { source, over: None };
        true
    }

    /// Pointer moved. Starts the drag if moved beyond the threshold.
    /// Returns true exactly when this move started the drag.
    pub fn pointer_move(&mut self, at: Point) -> bool {
        let start = match &self.phase {
            DragPhase::Pending { start, .. } => *start,
            _ => return false,
        };
        let dx = at.x.abs_diff(start.x);
        let dy = at.y.abs_diff(start.y);
        if dx <= self.threshold && dy <= self.threshold {
            return false;
        }
        let phase = std::mem::replace(&mut self.phase, DragPhase::Idle);
        if let DragPhase::Pending { source, .. } = phase {
            self.phase = DragPhase::Dragging { source, over: None };
        }
        true
    }

    /// Pointer entered a target. Only tracked while dragging.
    pub fn enter(&mut self, target: T) {
        if let DragPhase::Dragging { over, .. } = &mut self.phase {
            *over = Some(target);
        }
    }

    /// Pointer left the current target
    pub fn leave(&mut self) {
        if let DragPhase::Dragging { over, .. } = &mut self.phase {
            *over = None;
        }
    }

    /// Pointer released. Always returns to idle.
    pub fn release(&mut self) -> Release<S, T> {
        match std::mem::replace(&mut self.phase, DragPhase::Idle) {
            DragPhase::Idle => Release::Nothing,
            DragPhase::Pending { source, .. } => Release::Click(source),
            DragPhase::Dragging { source, over } => {
                self.drag_just_ended = true;
                match over {
                    Some(target) => Release::Drop { source, target },
                    None => Release::Cancelled(source),
                }
            }
        }
    }

    /// Abort any drag or pending press. Returns the source, if any.
    pub fn cancel(&mut self) -> Option<S> {
        match std::mem::replace(&mut self.phase, DragPhase::Idle) {
            DragPhase::Idle => None,
            DragPhase::Pending { source, .. } => Some(source),
            DragPhase::Dragging { source, .. } => {
                self.drag_just_ended = true;
                Some(source)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    type State = DndState<u32, u32>;

    #[test]
    fn test_click_without_movement() {
        let mut dnd = State::default();
        assert!(dnd.press(1, Point::new(0, 0)));
        assert!(!dnd.pointer_move(Point::new(3, 4)));
        assert_eq!(dnd.release(), Release::Click(1));
        assert!(dnd.is_idle());
        assert!(!dnd.take_drag_just_ended());
    }

    #[test]
    fn test_drag_starts_past_threshold() {
        let mut dnd = State::new(5);
        dnd.press(7, Point::new(10, 10));
        assert!(!dnd.pointer_move(Point::new(15, 10)));
        assert!(dnd.pointer_move(Point::new(16, 10)));
        assert_eq!(dnd.dragging(), Some(&7));
        // Further moves do not restart the drag
        assert!(!dnd.pointer_move(Point::new(40, 40)));
    }

    #[test]
    fn test_extreme_coordinates_do_not_overflow() {
        let mut dnd = State::default();
        dnd.press(1, Point::new(i32::MIN, 0));
        assert!(dnd.pointer_move(Point::new(i32::MAX, 0)));

        let mut dnd = State::default();
        dnd.press(1, Point::new(0, i32::MAX));
        assert!(!dnd.pointer_move(Point::new(DRAG_THRESHOLD_PX as i32, i32::MAX)));
        assert!(dnd.pointer_move(Point::new(0, i32::MIN)));
    }

    #[test]
    fn test_drop_on_target() {
        let mut dnd = State::new(0);
        dnd.press(1, Point::default());
        dnd.pointer_move(Point::new(1, 0));
        dnd.enter(2);
        assert_eq!(dnd.over(), Some(&2));
        assert_eq!(dnd.release(), Release::Drop { source: 1, target: 2 });
        assert!(dnd.take_drag_just_ended());
        assert!(!dnd.take_drag_just_ended());
    }

    #[test]
    fn test_release_over_nothing_cancels() {
        let mut dnd = State::new(0);
        dnd.start(1);
        dnd.enter(2);
        dnd.leave();
        assert_eq!(dnd.release(), Release::Cancelled(1));
    }

    #[test]
    fn test_hover_ignored_unless_dragging() {
        let mut dnd = State::default();
        dnd.enter(3);
        assert_eq!(dnd.over(), None);
        dnd.press(1, Point::default());
        dnd.enter(3);
        assert_eq!(dnd.over(), None);
    }

    #[test]
    fn test_press_ignored_while_dragging() {
        let mut dnd = State::default();
        dnd.start(1);
        assert!(!dnd.press(2, Point::default()));
        assert_eq!(dnd.cancel(), Some(1));
        assert_eq!(dnd.release(), Release::Nothing);
    }
}
