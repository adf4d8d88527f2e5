use std::collections::BTreeMap;

use foundation::{ImageFeature, LonLat};

use crate::filter::FilterExpr;
use crate::layer::{Layer, LayerId, LayerSpec, SourceSpec};
use crate::surface::{Cursor, Gesture, Overlay, RenderSurface, SurfaceError};

/// In-memory [`RenderSurface`] without any drawing.
///
/// Features are loaded explicitly per `(source, source_layer)` with
/// [`HeadlessSurface::load_features`]. Iteration over sources, layers and
/// overlays is ordered so snapshots are stable.
#[derive(Debug, Clone)]
pub struct HeadlessSurface {
    sources: BTreeMap<String, SourceSpec>,
    layers: Vec<LayerSpec>,
    features: BTreeMap<(String, String), Vec<ImageFeature>>,
    overlays: BTreeMap<String, Overlay>,
    center: LonLat,
    zoom: f64,
    cursor: Cursor,
    disabled_gestures: Vec<Gesture>,
}

impl Default for HeadlessSurface {
    fn default() -> Self {
        Self {
            sources: BTreeMap::new(),
            layers: Vec::new(),
            features: BTreeMap::new(),
            overlays: BTreeMap::new(),
            center: LonLat::new(0.0, 0.0),
            zoom: 0.0,
            cursor: Cursor::Default,
            disabled_gestures: Vec::new(),
        }
    }
}

impl HeadlessSurface {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends features to the loaded data of a source layer.
    pub fn load_features(
        &mut self,
        source_id: &str,
        source_layer: &str,
        features: impl IntoIterator<Item = ImageFeature>,
    ) {
        self.features
            .entry((source_id.to_string(), source_layer.to_string()))
            .or_default()
            .extend(features);
    }

    pub fn source(&self, id: &str) -> Option<&SourceSpec> {
        self.sources.get(id)
    }

    pub fn layer_ids(&self) -> Vec<LayerId> {
        self.layers.iter().map(Layer::id).collect()
    }

    pub fn layer(&self, id: LayerId) -> Option<&LayerSpec> {
        self.layers.iter().find(|l| l.id() == id)
    }

    pub fn filter(&self, id: LayerId) -> Option<&FilterExpr> {
        self.layer(id).and_then(|l| l.filter.as_ref())
    }

    pub fn overlay(&self, id: &str) -> Option<&Overlay> {
        self.overlays.get(id)
    }

    pub fn overlay_count(&self) -> usize {
        self.overlays.len()
    }

    pub fn center(&self) -> LonLat {
        self.center
    }

    pub fn zoom(&self) -> f64 {
        self.zoom
    }
}

impl RenderSurface for HeadlessSurface {
    fn add_source(&mut self, id: &str, source: SourceSpec) -> Result<(), SurfaceError> {
        if self.sources.contains_key(id) {
            return Err(SurfaceError::DuplicateSource(id.to_string()));
        }
        self.sources.insert(id.to_string(), source);
        Ok(())
    }

    fn add_layer(&mut self, spec: LayerSpec) -> Result<(), SurfaceError> {
        if self.has_layer(spec.id()) {
            return Err(SurfaceError::DuplicateLayer(spec.id()));
        }
        if !self.sources.contains_key(&spec.source) {
            return Err(SurfaceError::UnknownSource {
                layer: spec.id(),
                source_id: spec.source.clone(),
            });
        }
        self.layers.push(spec);
        Ok(())
    }

    fn has_layer(&self, id: LayerId) -> bool {
        self.layer(id).is_some()
    }

    fn set_filter(&mut self, layer: LayerId, filter: &FilterExpr) -> Result<(), SurfaceError> {
        let Some(spec) = self.layers.iter_mut().find(|l| l.id() == layer) else {
            return Err(SurfaceError::UnknownLayer(layer));
        };
        spec.filter = Some(filter.clone());
        Ok(())
    }

    fn query_source_features(
        &self,
        source_id: &str,
        source_layer: &str,
        filter: &FilterExpr,
    ) -> Vec<ImageFeature> {
        if !self.sources.contains_key(source_id) {
            return Vec::new();
        }
        let key = (source_id.to_string(), source_layer.to_string());
        let Some(loaded) = self.features.get(&key) else {
            return Vec::new();
        };
        loaded.iter().filter(|f| filter.matches(f)).cloned().collect()
    }

    fn set_center(&mut self, center: LonLat) {
        self.center = center;
    }

    fn set_zoom(&mut self, zoom: f64) {
        self.zoom = zoom;
    }

    fn cursor(&self) -> Cursor {
        self.cursor
    }

    fn set_cursor(&mut self, cursor: Cursor) {
        self.cursor = cursor;
    }

    fn gesture_enabled(&self, gesture: Gesture) -> bool {
        !self.disabled_gestures.contains(&gesture)
    }

    fn set_gesture_enabled(&mut self, gesture: Gesture, enabled: bool) {
        self.disabled_gestures.retain(|g| *g != gesture);
        if !enabled {
            self.disabled_gestures.push(gesture);
        }
    }

    fn set_overlay(&mut self, id: &str, overlay: Option<Overlay>) {
        match overlay {
            Some(o) => {
                self.overlays.insert(id.to_string(), o);
            }
            None => {
                self.overlays.remove(id);
            }
        }
    }
}
