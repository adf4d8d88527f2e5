pub mod draw_box;
pub mod navigation;
pub mod selection;

pub use draw_box::BoxDrawController;
pub use navigation::{SuspendedNavigation, suspend_navigation};
pub use selection::{ModeChange, SelectionEvent, SelectionState, reduce};
