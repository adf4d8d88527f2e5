use crate::bounds::LonLat;
use crate::ids::SequenceId;

/// A single image point as exposed by the loaded vector data.
///
/// Produced by querying a rendering surface; never persisted.
#[derive(Debug, Clone, PartialEq)]
pub struct ImageFeature {
    pub id: String,
    pub sequence_id: SequenceId,
    /// Capture time in milliseconds since the Unix epoch.
    pub captured_at: Option<i64>,
    pub is_pano: bool,
    pub compass_angle: Option<f64>,
    pub coordinates: Option<LonLat>,
}

impl ImageFeature {
    pub fn new(id: impl Into<String>, sequence_id: impl Into<SequenceId>) -> Self {
        Self {
            id: id.into(),
            sequence_id: sequence_id.into(),
            captured_at: None,
            is_pano: false,
            compass_angle: None,
            coordinates: None,
        }
    }

    pub fn with_captured_at(mut self, captured_at: i64) -> Self {
        self.captured_at = Some(captured_at);
        self
    }

    pub fn with_pano(mut self, is_pano: bool) -> Self {
        self.is_pano = is_pano;
        self
    }

    /// Sort key for capture order; a missing timestamp counts as 0.
    pub fn capture_order_key(&self) -> i64 {
        self.captured_at.unwrap_or(0)
    }
}
