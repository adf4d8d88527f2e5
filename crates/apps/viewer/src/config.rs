use std::env;
use std::time::Duration;

use foundation::LonLat;
use streaming::DEFAULT_ITEM_DELAY;
use streaming::protocol::{DEFAULT_GRAPH_URL, DEFAULT_TILES_URL};

pub const DEFAULT_CENTER: LonLat = LonLat::new(-0.09, 51.505);
pub const DEFAULT_ZOOM: f64 = 13.0;

/// Esri World Imagery; note the `{y}/{x}` order.
pub const DEFAULT_BASE_IMAGERY_URL: &str =
    "https://server.arcgisonline.com/ArcGIS/rest/services/World_Imagery/MapServer/tile/{z}/{y}/{x}";
pub const DEFAULT_BASE_ATTRIBUTION: &str = "Esri";

#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Viewport {
    pub center: LonLat,
    pub zoom: f64,
}

impl Default for Viewport {
    fn default() -> Self {
        Self {
            center: DEFAULT_CENTER,
            zoom: DEFAULT_ZOOM,
        }
    }
}

#[derive(Clone, PartialEq)]
pub struct ViewerConfig {
    /// Without a token the street-imagery overlay is disabled.
    pub access_token: Option<String>,
    pub viewport: Viewport,
    pub base_imagery_url: String,
    pub base_attribution: String,
    pub tiles_url: String,
    pub graph_url: String,
    pub item_delay: Duration,
}

impl std::fmt::Debug for ViewerConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ViewerConfig")
            .field("access_token", &self.access_token.as_ref().map(|_| "<set>"))
            .field("viewport", &self.viewport)
            .field("base_imagery_url", &self.base_imagery_url)
            .field("tiles_url", &self.tiles_url)
            .field("graph_url", &self.graph_url)
            .field("item_delay", &self.item_delay)
            .finish_non_exhaustive()
    }
}

impl Default for ViewerConfig {
    fn default() -> Self {
        Self {
            access_token: None,
            viewport: Viewport::default(),
            base_imagery_url: DEFAULT_BASE_IMAGERY_URL.to_string(),
            base_attribution: DEFAULT_BASE_ATTRIBUTION.to_string(),
            tiles_url: DEFAULT_TILES_URL.to_string(),
            graph_url: DEFAULT_GRAPH_URL.to_string(),
            item_delay: DEFAULT_ITEM_DELAY,
        }
    }
}

impl ViewerConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds a config from any key lookup; unparsable values fall back to
    /// the defaults.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let d = Self::default();
        let parsed_f64 = |key: &str, fallback: f64| -> f64 {
            lookup(key)
                .and_then(|v| v.trim().parse::<f64>().ok())
                .filter(|v| v.is_finite())
                .unwrap_or(fallback)
        };
        let string = |key: &str, fallback: String| -> String {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
                .unwrap_or(fallback)
        };

        let item_delay = lookup("DOWNLOAD_DELAY_MS")
            .and_then(|v| v.trim().parse::<u64>().ok())
            .map(Duration::from_millis)
            .unwrap_or(d.item_delay);

        Self {
            access_token: lookup("MAPILLARY_ACCESS_TOKEN")
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty()),
            viewport: Viewport {
                center: LonLat::new(
                    parsed_f64("VIEWER_CENTER_LON", d.viewport.center.lon),
                    parsed_f64("VIEWER_CENTER_LAT", d.viewport.center.lat),
                ),
                zoom: parsed_f64("VIEWER_ZOOM", d.viewport.zoom),
            },
            base_imagery_url: string("BASE_IMAGERY_URL", d.base_imagery_url),
            base_attribution: d.base_attribution,
            tiles_url: string("MAPILLARY_TILES_URL", d.tiles_url),
            graph_url: string("MAPILLARY_GRAPH_URL", d.graph_url),
            item_delay,
        }
    }

    pub fn with_access_token(mut self, token: impl Into<String>) -> Self {
        let token = token.into();
        self.access_token = (!token.is_empty()).then_some(token);
        self
    }

    pub fn imagery_enabled(&self) -> bool {
        self.access_token.is_some()
    }
}
