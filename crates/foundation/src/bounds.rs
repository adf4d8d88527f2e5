/// A WGS84 position in degrees.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct LonLat {
    pub lon: f64,
    pub lat: f64,
}

impl LonLat {
    pub const fn new(lon: f64, lat: f64) -> Self {
        Self { lon, lat }
    }
}

/// Axis-aligned box in longitude/latitude space.
///
/// Invariant: `min_lon <= max_lon` and `min_lat <= max_lat`. Construct through
/// [`normalize_box`] (or [`GeoBox::from_corners`]) to keep it.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct GeoBox {
    pub min_lon: f64,
    pub min_lat: f64,
    pub max_lon: f64,
    pub max_lat: f64,
}

impl GeoBox {
    pub fn from_corners(a: LonLat, b: LonLat) -> Self {
        normalize_box(a, b)
    }

    pub fn width_deg(&self) -> f64 {
        self.max_lon - self.min_lon
    }

    pub fn height_deg(&self) -> f64 {
        self.max_lat - self.min_lat
    }

    pub fn center(&self) -> LonLat {
        LonLat::new(
            (self.min_lon + self.max_lon) * 0.5,
            (self.min_lat + self.max_lat) * 0.5,
        )
    }

    /// A box whose corners coincide on at least one axis.
    pub fn is_degenerate(&self) -> bool {
        self.width_deg() == 0.0 || self.height_deg() == 0.0
    }

    /// Inclusive on all edges, so a degenerate box still contains its point.
    pub fn contains(&self, p: LonLat) -> bool {
        p.lon >= self.min_lon
            && p.lon <= self.max_lon
            && p.lat >= self.min_lat
            && p.lat <= self.max_lat
    }

    /// Closed outline ring, counter-clockwise from the south-west corner.
    pub fn ring(&self) -> [LonLat; 5] {
        [
            LonLat::new(self.min_lon, self.min_lat),
            LonLat::new(self.max_lon, self.min_lat),
            LonLat::new(self.max_lon, self.max_lat),
            LonLat::new(self.min_lon, self.max_lat),
            LonLat::new(self.min_lon, self.min_lat),
        ]
    }

    /// `minLon,minLat,maxLon,maxLat`, the order used by tile/search APIs.
    pub fn to_query_string(&self) -> String {
        format!(
            "{},{},{},{}",
            self.min_lon, self.min_lat, self.max_lon, self.max_lat
        )
    }
}

/// Builds a normalized box from two arbitrary corners.
///
/// Min/max are taken per axis independently, so corner order never matters.
pub fn normalize_box(a: LonLat, b: LonLat) -> GeoBox {
    GeoBox {
        min_lon: a.lon.min(b.lon),
        min_lat: a.lat.min(b.lat),
        max_lon: a.lon.max(b.lon),
        max_lat: a.lat.max(b.lat),
    }
}
