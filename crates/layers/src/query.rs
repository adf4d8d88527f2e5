use std::collections::{BTreeMap, HashSet};

use foundation::{ImageFeature, SequenceId};

use crate::filter::FilterExpr;
use crate::surface::RenderSurface;

/// Drops repeated image ids, keeping the first occurrence.
///
/// Features crossing tile borders are reported once per loaded tile.
pub fn unique_by_id(features: Vec<ImageFeature>) -> Vec<ImageFeature> {
    let mut seen: HashSet<String> = HashSet::with_capacity(features.len());
    features
        .into_iter()
        .filter(|f| seen.insert(f.id.clone()))
        .collect()
}

/// Queries a source layer and collapses duplicate images.
pub fn query_images<S: RenderSurface + ?Sized>(
    surface: &S,
    source_id: &str,
    source_layer: &str,
    filter: &FilterExpr,
) -> Vec<ImageFeature> {
    unique_by_id(surface.query_source_features(source_id, source_layer, filter))
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SequenceSummary {
    pub sequence_id: SequenceId,
    pub images: usize,
    pub panos: usize,
    pub first_captured_at: Option<i64>,
    pub last_captured_at: Option<i64>,
}

/// Groups features by sequence. Output is sorted by sequence id.
pub fn summarize_sequences(features: &[ImageFeature]) -> Vec<SequenceSummary> {
    let mut by_sequence: BTreeMap<&SequenceId, SequenceSummary> = BTreeMap::new();

    for f in features {
        let entry = by_sequence
            .entry(&f.sequence_id)
            .or_insert_with(|| SequenceSummary {
                sequence_id: f.sequence_id.clone(),
                images: 0,
                panos: 0,
                first_captured_at: None,
                last_captured_at: None,
            });
        entry.images += 1;
        if f.is_pano {
            entry.panos += 1;
        }
        if let Some(t) = f.captured_at {
            entry.first_captured_at = Some(entry.first_captured_at.map_or(t, |cur| cur.min(t)));
            entry.last_captured_at = Some(entry.last_captured_at.map_or(t, |cur| cur.max(t)));
        }
    }

    by_sequence.into_values().collect()
}
