//! Helpers behind the `mly` command line tool.

use foundation::{GeoBox, ImageFeature, LonLat, normalize_box};
use layers::query::SequenceSummary;
use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum BboxError {
    #[error("bbox must be minLon,minLat,maxLon,maxLat")]
    Shape,
    #[error("invalid coordinate {0:?}")]
    Coordinate(String),
}

/// Parses `minLon,minLat,maxLon,maxLat`. Swapped corners are normalized.
pub fn parse_bbox(bbox: &str) -> Result<GeoBox, BboxError> {
    let parts: Vec<&str> = bbox.split(',').map(str::trim).collect();
    if parts.len() != 4 {
        return Err(BboxError::Shape);
    }
    let mut vals = [0.0f64; 4];
    for (slot, part) in vals.iter_mut().zip(&parts) {
        *slot = part
            .parse::<f64>()
            .ok()
            .filter(|v| v.is_finite())
            .ok_or_else(|| BboxError::Coordinate(part.to_string()))?;
    }
    Ok(normalize_box(
        LonLat::new(vals[0], vals[1]),
        LonLat::new(vals[2], vals[3]),
    ))
}

/// The feature the CLI clicks to select `sequence`. With `panos_only` set it
/// must be a panorama, since other images are filtered off the map.
pub fn pick_hit<'a>(
    features: &'a [ImageFeature],
    sequence: &str,
    panos_only: bool,
) -> Option<&'a ImageFeature> {
    features
        .iter()
        .find(|f| f.sequence_id.as_str() == sequence && (!panos_only || f.is_pano))
}

/// One tab-separated line per sequence: id, images, panoramas, first and last
/// capture time (ms, `-` when unknown).
pub fn summary_line(s: &SequenceSummary) -> String {
    let time = |t: Option<i64>| t.map_or_else(|| "-".to_string(), |t| t.to_string());
    format!(
        "{}\t{}\t{}\t{}\t{}",
        s.sequence_id,
        s.images,
        s.panos,
        time(s.first_captured_at),
        time(s.last_captured_at)
    )
}
