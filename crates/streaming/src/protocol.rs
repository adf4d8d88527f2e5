//! Wire types for the Mapillary Graph API (v4).
//!
//! Only the fields this client reads are modelled; everything else in the
//! responses is ignored by serde.

use foundation::{ImageFeature, LonLat, SequenceId};
use serde::Deserialize;

pub const DEFAULT_GRAPH_URL: &str = "https://graph.mapillary.com";

/// Vector tile template with `sequence` and `image` source layers.
pub const DEFAULT_TILES_URL: &str = "https://tiles.mapillary.com/maps/vtp/mly1_public/2/{z}/{x}/{y}";

/// Field holding the time-limited URL of the original-resolution image.
pub const DOWNLOAD_URL_FIELD: &str = "thumb_original_url";

pub const IMAGE_SEARCH_FIELDS: &str = "id,sequence,captured_at,is_pano,compass_angle,geometry";

/// Hard cap of the `images` search endpoint per request.
pub const MAX_SEARCH_LIMIT: u32 = 2000;

/// Image and sequence keys are plain tokens: ASCII alphanumerics, `_` and
/// `-`. Anything else could escape a URL path or an archive entry name.
pub fn is_valid_key(key: &str) -> bool {
    !key.is_empty()
        && key
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || b == b'_' || b == b'-')
}

/// `GET /{image_id}?fields=thumb_original_url`
#[derive(Debug, Clone, Deserialize)]
pub struct ImageUrlResponse {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub thumb_original_url: Option<String>,
}

/// `GET /images?bbox=...&fields=...`
#[derive(Debug, Clone, Deserialize)]
pub struct ImageSearchResponse {
    #[serde(default)]
    pub data: Vec<GraphImage>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GraphImage {
    pub id: String,
    #[serde(default)]
    pub sequence: Option<String>,
    #[serde(default)]
    pub captured_at: Option<i64>,
    #[serde(default)]
    pub is_pano: Option<bool>,
    #[serde(default)]
    pub compass_angle: Option<f64>,
    #[serde(default)]
    pub geometry: Option<PointGeometry>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PointGeometry {
    #[serde(rename = "type")]
    pub kind: String,
    /// `[lon, lat]`
    pub coordinates: [f64; 2],
}

impl GraphImage {
    /// Images without a sequence cannot be selected and are dropped.
    pub fn into_feature(self) -> Option<ImageFeature> {
        let sequence = self.sequence.filter(|s| !s.is_empty())?;
        Some(ImageFeature {
            id: self.id,
            sequence_id: SequenceId::new(sequence),
            captured_at: self.captured_at,
            is_pano: self.is_pano.unwrap_or(false),
            compass_angle: self.compass_angle,
            coordinates: self
                .geometry
                .filter(|g| g.kind == "Point")
                .map(|g| LonLat::new(g.coordinates[0], g.coordinates[1])),
        })
    }
}

/// Error envelope returned with non-2xx statuses.
#[derive(Debug, Clone, Deserialize)]
pub struct GraphErrorResponse {
    pub error: GraphErrorBody,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GraphErrorBody {
    pub message: String,
    #[serde(default, rename = "type")]
    pub kind: Option<String>,
    #[serde(default)]
    pub code: Option<i64>,
}

/// Fills a `{z}/{x}/{y}` template with an access token query parameter.
pub fn tiles_url_with_token(template: &str, access_token: &str) -> String {
    let sep = if template.contains('?') { '&' } else { '?' };
    format!("{template}{sep}access_token={access_token}")
}
