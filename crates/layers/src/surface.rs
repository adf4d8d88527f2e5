//! Capability contract of the map rendering engine.
//!
//! The engine itself (tiles, GPU, DOM) lives outside this workspace. Everything
//! the session needs from it goes through [`RenderSurface`], so the selection
//! logic can be driven against [`crate::HeadlessSurface`] in tests and in the
//! CLI.

use foundation::{ImageFeature, LonLat};
use thiserror::Error;

use crate::filter::FilterExpr;
use crate::layer::{LayerId, LayerSpec, SourceSpec};
use crate::symbology::OverlayStyle;

#[derive(Debug, Copy, Clone, Default, PartialEq, Eq)]
pub enum Cursor {
    #[default]
    Default,
    Pointer,
    Crosshair,
}

/// Native navigation gestures that box drawing has to suspend.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum Gesture {
    DragPan,
    BoxZoom,
    DoubleClickZoom,
}

impl Gesture {
    pub const ALL: [Gesture; 3] = [Gesture::DragPan, Gesture::BoxZoom, Gesture::DoubleClickZoom];
}

/// A polygon drawn above every layer, keyed by an overlay id.
#[derive(Debug, Clone, PartialEq)]
pub struct Overlay {
    pub ring: Vec<LonLat>,
    pub style: OverlayStyle,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SurfaceError {
    #[error("source {0:?} already exists")]
    DuplicateSource(String),
    #[error("layer {0} already exists")]
    DuplicateLayer(LayerId),
    #[error("layer {layer} references unknown source {source_id:?}")]
    UnknownSource { layer: LayerId, source_id: String },
    #[error("layer {0} does not exist")]
    UnknownLayer(LayerId),
}

pub trait RenderSurface {
    fn add_source(&mut self, id: &str, source: SourceSpec) -> Result<(), SurfaceError>;

    fn add_layer(&mut self, spec: LayerSpec) -> Result<(), SurfaceError>;

    fn has_layer(&self, id: LayerId) -> bool;

    fn set_filter(&mut self, layer: LayerId, filter: &FilterExpr) -> Result<(), SurfaceError>;

    /// Features currently loaded for `source_id`/`source_layer` that pass
    /// `filter`.
    ///
    /// Like real map engines this may return the same image more than once
    /// when it is present in several loaded tiles. An unknown source yields
    /// an empty list.
    fn query_source_features(
        &self,
        source_id: &str,
        source_layer: &str,
        filter: &FilterExpr,
    ) -> Vec<ImageFeature>;

    fn set_center(&mut self, center: LonLat);

    fn set_zoom(&mut self, zoom: f64);

    fn cursor(&self) -> Cursor;

    fn set_cursor(&mut self, cursor: Cursor);

    fn gesture_enabled(&self, gesture: Gesture) -> bool;

    fn set_gesture_enabled(&mut self, gesture: Gesture, enabled: bool);

    /// Installs, replaces (`Some`) or removes (`None`) an overlay.
    fn set_overlay(&mut self, id: &str, overlay: Option<Overlay>);
}

impl<S: RenderSurface + ?Sized> RenderSurface for &mut S {
    fn add_source(&mut self, id: &str, source: SourceSpec) -> Result<(), SurfaceError> {
        (**self).add_source(id, source)
    }

    fn add_layer(&mut self, spec: LayerSpec) -> Result<(), SurfaceError> {
        (**self).add_layer(spec)
    }

    fn has_layer(&self, id: LayerId) -> bool {
        (**self).has_layer(id)
    }

    fn set_filter(&mut self, layer: LayerId, filter: &FilterExpr) -> Result<(), SurfaceError> {
        (**self).set_filter(layer, filter)
    }

    fn query_source_features(
        &self,
        source_id: &str,
        source_layer: &str,
        filter: &FilterExpr,
    ) -> Vec<ImageFeature> {
        (**self).query_source_features(source_id, source_layer, filter)
    }

    fn set_center(&mut self, center: LonLat) {
        (**self).set_center(center)
    }

    fn set_zoom(&mut self, zoom: f64) {
        (**self).set_zoom(zoom)
    }

    fn cursor(&self) -> Cursor {
        (**self).cursor()
    }

    fn set_cursor(&mut self, cursor: Cursor) {
        (**self).set_cursor(cursor)
    }

    fn gesture_enabled(&self, gesture: Gesture) -> bool {
        (**self).gesture_enabled(gesture)
    }

    fn set_gesture_enabled(&mut self, gesture: Gesture, enabled: bool) {
        (**self).set_gesture_enabled(gesture, enabled)
    }

    fn set_overlay(&mut self, id: &str, overlay: Option<Overlay>) {
        (**self).set_overlay(id, overlay)
    }
}
