use foundation::{GeoBox, LonLat, normalize_box};
use layers::symbology::OverlayStyle;
use layers::{Overlay, RenderSurface};

pub const PREVIEW_OVERLAY_ID: &str = "draw-box-preview";
pub const COMMITTED_OVERLAY_ID: &str = "draw-box";

/// Pointer handling while the session is in box-drawing mode.
///
/// The controller only touches the surface overlays; entering and leaving the
/// mode (and suspending navigation) is driven by the session.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct BoxDrawController {
    start: Option<LonLat>,
    preview: Option<GeoBox>,
    committed: Option<GeoBox>,
}

fn overlay(b: &GeoBox, style: OverlayStyle) -> Overlay {
    Overlay {
        ring: b.ring().to_vec(),
        style,
    }
}

impl BoxDrawController {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn committed(&self) -> Option<GeoBox> {
        self.committed
    }

    pub fn preview(&self) -> Option<GeoBox> {
        self.preview
    }

    pub fn is_dragging(&self) -> bool {
        self.start.is_some()
    }

    /// Entering drawing mode: the previous box and any half-finished drag go away.
    pub fn begin<S: RenderSurface + ?Sized>(&mut self, surface: &mut S) {
        self.abort_drag(surface);
        if self.committed.take().is_some() {
            surface.set_overlay(COMMITTED_OVERLAY_ID, None);
        }
    }

    /// Drops the in-progress drag and its preview without committing anything.
    pub fn abort_drag<S: RenderSurface + ?Sized>(&mut self, surface: &mut S) {
        self.start = None;
        self.clear_preview(surface);
    }

    pub fn on_pointer_down<S: RenderSurface + ?Sized>(&mut self, surface: &mut S, at: LonLat) {
        self.start = Some(at);
        self.clear_preview(surface);
    }

    pub fn on_pointer_move<S: RenderSurface + ?Sized>(&mut self, surface: &mut S, at: LonLat) {
        let Some(start) = self.start else {
            return;
        };
        let b = normalize_box(start, at);
        surface.set_overlay(PREVIEW_OVERLAY_ID, Some(overlay(&b, OverlayStyle::PREVIEW)));
        self.preview = Some(b);
    }

    /// Commits the box. Returns `None` for a stray pointer-up without a
    /// matching pointer-down.
    pub fn on_pointer_up<S: RenderSurface + ?Sized>(
        &mut self,
        surface: &mut S,
        at: LonLat,
    ) -> Option<GeoBox> {
        let start = self.start.take()?;
        let b = normalize_box(start, at);
        self.clear_preview(surface);
        surface.set_overlay(
            COMMITTED_OVERLAY_ID,
            Some(overlay(&b, OverlayStyle::COMMITTED)),
        );
        self.committed = Some(b);
        Some(b)
    }

    fn clear_preview<S: RenderSurface + ?Sized>(&mut self, surface: &mut S) {
        if self.preview.take().is_some() {
            surface.set_overlay(PREVIEW_OVERLAY_ID, None);
        }
    }
}
