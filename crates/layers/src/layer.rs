use std::fmt;

use crate::filter::FilterExpr;
use crate::symbology::LayerStyle;

#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct LayerId(pub &'static str);

impl fmt::Display for LayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.0)
    }
}

pub trait Layer {
    fn id(&self) -> LayerId;
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum LayerKind {
    Raster,
    Line,
    Circle,
}

/// Data backing one or more layers.
#[derive(Debug, Clone, PartialEq)]
pub enum SourceSpec {
    RasterTiles {
        /// `{z}/{x}/{y}` URL template.
        tiles: String,
        tile_size: u32,
        attribution: Option<String>,
    },
    VectorTiles {
        tiles: String,
        min_zoom: u8,
        max_zoom: u8,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct LayerSpec {
    id: LayerId,
    pub kind: LayerKind,
    pub source: String,
    /// Layer inside a vector tile; `None` for raster sources.
    pub source_layer: Option<String>,
    pub style: LayerStyle,
    pub filter: Option<FilterExpr>,
}

impl LayerSpec {
    pub fn raster(id: LayerId, source: impl Into<String>) -> Self {
        Self {
            id,
            kind: LayerKind::Raster,
            source: source.into(),
            source_layer: None,
            style: LayerStyle::default(),
            filter: None,
        }
    }

    pub fn vector(
        id: LayerId,
        kind: LayerKind,
        source: impl Into<String>,
        source_layer: impl Into<String>,
    ) -> Self {
        Self {
            id,
            kind,
            source: source.into(),
            source_layer: Some(source_layer.into()),
            style: LayerStyle::default(),
            filter: None,
        }
    }

    pub fn with_style(mut self, style: LayerStyle) -> Self {
        self.style = style;
        self
    }

    pub fn with_filter(mut self, filter: FilterExpr) -> Self {
        self.filter = Some(filter);
        self
    }
}

impl Layer for LayerSpec {
    fn id(&self) -> LayerId {
        self.id
    }
}
