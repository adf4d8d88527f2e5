#[derive(Debug, Copy, Clone, PartialEq)]
pub struct LayerStyle {
    pub visible: bool,
    pub color: [f32; 4],
    /// Line width for line layers, circle radius for point layers.
    pub size_px: f32,
}

impl LayerStyle {
    pub const fn new(visible: bool, color: [f32; 4], size_px: f32) -> Self {
        Self {
            visible,
            color,
            size_px,
        }
    }
}

impl Default for LayerStyle {
    fn default() -> Self {
        Self {
            visible: true,
            color: [1.0, 1.0, 1.0, 1.0],
            size_px: 1.0,
        }
    }
}

/// Paint for a polygon overlay drawn on top of all layers.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct OverlayStyle {
    pub fill: [f32; 4],
    pub outline: [f32; 4],
    pub outline_width_px: f32,
    /// Dash pattern `[dash, gap]` in line widths; `None` draws a solid outline.
    pub dash: Option<[f32; 2]>,
}

impl OverlayStyle {
    /// Live rubber-band while the pointer is still down.
    pub const PREVIEW: OverlayStyle = OverlayStyle {
        fill: [0.2, 0.6, 1.0, 0.15],
        outline: [0.2, 0.6, 1.0, 0.9],
        outline_width_px: 2.0,
        dash: Some([2.0, 2.0]),
    };

    /// Committed selection box.
    pub const COMMITTED: OverlayStyle = OverlayStyle {
        fill: [0.2, 0.6, 1.0, 0.3],
        outline: [0.2, 0.6, 1.0, 1.0],
        outline_width_px: 2.0,
        dash: None,
    };

    pub fn is_dashed(&self) -> bool {
        self.dash.is_some()
    }
}
