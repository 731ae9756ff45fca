use serde::{Deserialize, Serialize};

/// Web Mercator latitude limit
pub const MAX_LATITUDE: f64 = 85.051_128_779_8;

/// Represents a geographical coordinate with latitude and longitude
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LatLng {
    pub lat: f64,
    pub lng: f64,
}

impl LatLng {
    /// Creates a new LatLng coordinate
    pub fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }

    /// Validates that the coordinates are finite and within valid ranges
    pub fn is_valid(&self) -> bool {
        self.lat.is_finite()
            && self.lng.is_finite()
            && (-90.0..=90.0).contains(&self.lat)
            && (-180.0..=180.0).contains(&self.lng)
    }

    /// Wraps longitude to [-180, 180] range
    pub fn wrap_lng(lng: f64) -> f64 {
        let wrapped = lng % 360.0;
        if wrapped > 180.0 {
            wrapped - 360.0
        } else if wrapped < -180.0 {
            wrapped + 360.0
        } else {
            wrapped
        }
    }

    /// Clamps latitude to the range Web Mercator can represent
    pub fn clamp_lat(lat: f64) -> f64 {
        lat.clamp(-MAX_LATITUDE, MAX_LATITUDE)
    }
}

impl Default for LatLng {
    fn default() -> Self {
        Self::new(0.0, 0.0)
    }
}

/// Camera state of the map: center, zoom, tilt and rotation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ViewState {
    pub latitude: f64,
    pub longitude: f64,
    pub zoom: f64,
    #[serde(default)]
    pub pitch: f64,
    #[serde(default)]
    pub bearing: f64,
}

impl ViewState {
    pub fn new(latitude: f64, longitude: f64, zoom: f64) -> Self {
        Self {
            latitude,
            longitude,
            zoom,
            pitch: 0.0,
            bearing: 0.0,
        }
    }

    pub fn center(&self) -> LatLng {
        LatLng::new(self.latitude, self.longitude)
    }

    /// All components finite and zoom non-negative
    pub fn is_valid(&self) -> bool {
        self.latitude.is_finite()
            && self.longitude.is_finite()
            && self.zoom.is_finite()
            && self.pitch.is_finite()
            && self.bearing.is_finite()
            && self.zoom >= 0.0
    }

    /// Moves the center and raises zoom to at least `min_zoom`. Zoom is never lowered.
    pub fn recentered(&self, center: LatLng, min_zoom: f64) -> Self {
        Self {
            latitude: center.lat,
            longitude: center.lng,
            zoom: self.zoom.max(min_zoom),
            ..*self
        }
    }
}

impl Default for ViewState {
    fn default() -> Self {
        Self::new(20.0, 0.0, 2.0)
    }
}

/// The part of a [`ViewState`] written to the local store under `mapPosition`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SavedPosition {
    pub longitude: f64,
    pub latitude: f64,
    pub zoom: f64,
}

impl From<&ViewState> for SavedPosition {
    fn from(view: &ViewState) -> Self {
        Self {
            longitude: view.longitude,
            latitude: view.latitude,
            zoom: view.zoom,
        }
    }
}

impl SavedPosition {
    /// Restores a flat view; pitch and bearing are never persisted
    pub fn into_view_state(self) -> ViewState {
        ViewState::new(self.latitude, self.longitude, self.zoom)
    }
}

/// Geographic rectangle visible on screen.
///
/// `min_lon` may be greater than `max_lon` when the view crosses the
/// antimeridian; no correction is applied here.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ViewportBounds {
    pub min_lat: f64,
    pub max_lat: f64,
    pub min_lon: f64,
    pub max_lon: f64,
}

impl ViewportBounds {
    pub fn new(min_lat: f64, max_lat: f64, min_lon: f64, max_lon: f64) -> Self {
        Self {
            min_lat,
            max_lat,
            min_lon,
            max_lon,
        }
    }

    pub fn is_finite(&self) -> bool {
        self.min_lat.is_finite()
            && self.max_lat.is_finite()
            && self.min_lon.is_finite()
            && self.max_lon.is_finite()
    }

    pub fn center(&self) -> LatLng {
        LatLng::new(
            (self.min_lat + self.max_lat) / 2.0,
            (self.min_lon + self.max_lon) / 2.0,
        )
    }

    /// Checks if the bounds contain a point (no antimeridian handling)
    pub fn contains(&self, point: &LatLng) -> bool {
        point.lat >= self.min_lat
            && point.lat <= self.max_lat
            && point.lng >= self.min_lon
            && point.lng <= self.max_lon
    }
}
