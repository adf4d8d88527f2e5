use layers::{Cursor, Gesture, RenderSurface};

/// Native navigation state captured when box drawing takes over the pointer.
///
/// Obtained from [`suspend_navigation`] and consumed by
/// [`SuspendedNavigation::restore`]; the owner must restore on every exit
/// path, including its own drop.
#[derive(Debug, Clone, PartialEq, Eq)]
#[must_use = "navigation stays disabled until restored"]
pub struct SuspendedNavigation {
    gestures: Vec<(Gesture, bool)>,
    cursor: Cursor,
}

/// Disables pan, box-zoom and double-click-zoom and shows a crosshair.
pub fn suspend_navigation<S: RenderSurface + ?Sized>(surface: &mut S) -> SuspendedNavigation {
    let saved = SuspendedNavigation {
        gestures: Gesture::ALL
            .iter()
            .map(|g| (*g, surface.gesture_enabled(*g)))
            .collect(),
        cursor: surface.cursor(),
    };

    for g in Gesture::ALL {
        surface.set_gesture_enabled(g, false);
    }
    surface.set_cursor(Cursor::Crosshair);
    saved
}

impl SuspendedNavigation {
    /// Puts every gesture flag and the cursor back to their pre-suspend values.
    pub fn restore<S: RenderSurface + ?Sized>(self, surface: &mut S) {
        for (g, enabled) in self.gestures {
            surface.set_gesture_enabled(g, enabled);
        }
        surface.set_cursor(self.cursor);
    }
}
