//! The street-imagery layer stack: satellite base, sequence lines, image
//! points and highlighted image points.

use crate::filter::LayerFilters;
use crate::layer::{LayerId, LayerKind, LayerSpec};
use crate::surface::{RenderSurface, SurfaceError};
use crate::symbology::LayerStyle;

pub const BASE_SOURCE_ID: &str = "satellite";
pub const BASE_LAYER: LayerId = LayerId("satellite");

pub const IMAGERY_SOURCE_ID: &str = "mapillary";
pub const SEQUENCE_SOURCE_LAYER: &str = "sequence";
pub const IMAGE_SOURCE_LAYER: &str = "image";

pub const SEQUENCE_LAYER: LayerId = LayerId("mapillary-sequences");
pub const IMAGE_LAYER: LayerId = LayerId("mapillary-images");
pub const HIGHLIGHT_LAYER: LayerId = LayerId("mapillary-images-highlight");

const SEQUENCE_STYLE: LayerStyle = LayerStyle::new(true, [0.02, 0.8, 0.39, 0.8], 2.0);
const IMAGE_STYLE: LayerStyle = LayerStyle::new(true, [0.02, 0.8, 0.39, 1.0], 4.0);
const HIGHLIGHT_STYLE: LayerStyle = LayerStyle::new(true, [1.0, 0.35, 0.1, 1.0], 6.0);

/// Vector layers in draw order (highlight last, on top).
pub fn imagery_layers(filters: &LayerFilters) -> [LayerSpec; 3] {
    [
        LayerSpec::vector(
            SEQUENCE_LAYER,
            LayerKind::Line,
            IMAGERY_SOURCE_ID,
            SEQUENCE_SOURCE_LAYER,
        )
        .with_style(SEQUENCE_STYLE)
        .with_filter(filters.base.clone()),
        LayerSpec::vector(
            IMAGE_LAYER,
            LayerKind::Circle,
            IMAGERY_SOURCE_ID,
            IMAGE_SOURCE_LAYER,
        )
        .with_style(IMAGE_STYLE)
        .with_filter(filters.base.clone()),
        LayerSpec::vector(
            HIGHLIGHT_LAYER,
            LayerKind::Circle,
            IMAGERY_SOURCE_ID,
            IMAGE_SOURCE_LAYER,
        )
        .with_style(HIGHLIGHT_STYLE)
        .with_filter(filters.highlight.clone()),
    ]
}

/// Pushes freshly built filters to every imagery layer that exists.
///
/// Returns how many layers were updated; missing layers (imagery disabled, or
/// not registered yet) are skipped.
pub fn apply_filters<S: RenderSurface + ?Sized>(
    surface: &mut S,
    filters: &LayerFilters,
) -> Result<usize, SurfaceError> {
    let targets = [
        (SEQUENCE_LAYER, &filters.base),
        (IMAGE_LAYER, &filters.base),
        (HIGHLIGHT_LAYER, &filters.highlight),
    ];

    let mut applied = 0;
    for (layer, filter) in targets {
        if !surface.has_layer(layer) {
            continue;
        }
        surface.set_filter(layer, filter)?;
        applied += 1;
    }
    Ok(applied)
}
