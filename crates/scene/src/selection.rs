use foundation::SequenceId;

/// Exclusive interaction mode of the map session.
///
/// The committed bounding box is not part of this state: it lives with the
/// box-draw controller and survives sequence selection.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum SelectionState {
    #[default]
    Idle,
    DrawingBox,
    SequenceSelected(SequenceId),
}

impl SelectionState {
    pub fn is_drawing_box(&self) -> bool {
        matches!(self, SelectionState::DrawingBox)
    }

    pub fn selected_sequence(&self) -> Option<&SequenceId> {
        match self {
            SelectionState::SequenceSelected(id) => Some(id),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SelectionEvent {
    /// Click on an eligible image feature of the given sequence.
    FeatureClicked(SequenceId),
    ToggleDrawBox,
    /// Box drawing finished with a committed box.
    DragReleased,
}

/// Pure transition function.
///
/// Ordering contract:
/// - `ToggleDrawBox` enters drawing from any mode and cancels it from `DrawingBox`.
/// - Clicks never change the state while drawing.
/// - `DragReleased` only has an effect while drawing.
pub fn reduce(state: &SelectionState, event: &SelectionEvent) -> SelectionState {
    match (state, event) {
        (SelectionState::DrawingBox, SelectionEvent::ToggleDrawBox) => SelectionState::Idle,
        (_, SelectionEvent::ToggleDrawBox) => SelectionState::DrawingBox,
        (SelectionState::DrawingBox, SelectionEvent::DragReleased) => SelectionState::Idle,
        (SelectionState::DrawingBox, SelectionEvent::FeatureClicked(_)) => {
            SelectionState::DrawingBox
        }
        (_, SelectionEvent::FeatureClicked(id)) => SelectionState::SequenceSelected(id.clone()),
        (other, SelectionEvent::DragReleased) => other.clone(),
    }
}

/// What changed between two states, for the side effects the session owns.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct ModeChange {
    pub entered_drawing: bool,
    pub exited_drawing: bool,
    pub selection_changed: bool,
}

impl ModeChange {
    pub fn between(prev: &SelectionState, next: &SelectionState) -> Self {
        Self {
            entered_drawing: !prev.is_drawing_box() && next.is_drawing_box(),
            exited_drawing: prev.is_drawing_box() && !next.is_drawing_box(),
            selection_changed: prev.selected_sequence() != next.selected_sequence(),
        }
    }
}
