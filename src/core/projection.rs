//! Web Mercator inverse projection from a camera view to geographic bounds.

use std::f64::consts::PI;

use crate::core::constants::WORLD_TILE_SIZE;
use crate::core::geo::{LatLng, ViewState, ViewportBounds, MAX_LATITUDE};
use crate::{Error, Result};

/// Size of the whole world in pixels at the given zoom level
fn world_size(zoom: f64) -> f64 {
    WORLD_TILE_SIZE * 2_f64.powf(zoom)
}

/// Projects a LatLng to world pixel coordinates (EPSG:3857, origin top-left)
pub fn project(lat_lng: &LatLng, zoom: f64) -> (f64, f64) {
    let size = world_size(zoom);
    let x = (lat_lng.lng + 180.0) / 360.0 * size;
    let y = (1.0 - (PI / 4.0 + lat_lng.lat.to_radians() / 2.0).tan().ln() / PI) / 2.0 * size;
    (x, y)
}

/// Unprojects world pixel coordinates back to LatLng at the given zoom level
pub fn unproject(x: f64, y: f64, zoom: f64) -> LatLng {
    let size = world_size(zoom);
    let lng = x / size * 360.0 - 180.0;
    let lat = (2.0 * (PI * (1.0 - 2.0 * y / size)).exp().atan() - PI / 2.0).to_degrees();
    LatLng::new(lat, lng)
}

/// Computes the geographic rectangle covered by a `width` x `height` pixel
/// viewport looking at `view`.
///
/// The four screen corners are rotated by the bearing around the center and
/// unprojected; the result is their bounding box. Pitch is treated as a flat
/// view.
pub fn viewport_bounds(view: &ViewState, width: f64, height: f64) -> Result<ViewportBounds> {
    if !view.is_valid() {
        return Err(Error::InvalidView(format!("{view:?}")));
    }
    if !(width > 0.0 && height > 0.0) || !width.is_finite() || !height.is_finite() {
        return Err(Error::InvalidView(format!("viewport size {width}x{height}")));
    }

    let (cx, cy) = project(&view.center(), view.zoom);
    if view.latitude.abs() > MAX_LATITUDE || !cx.is_finite() || !cy.is_finite() {
        return Err(Error::Projection(format!(
            "center {:.4},{:.4} cannot be projected",
            view.latitude, view.longitude
        )));
    }

    let (sin, cos) = view.bearing.to_radians().sin_cos();
    let half_w = width / 2.0;
    let half_h = height / 2.0;

    let mut bounds = ViewportBounds::new(f64::MAX, f64::MIN, f64::MAX, f64::MIN);
    for (dx, dy) in [
        (-half_w, -half_h),
        (half_w, -half_h),
        (half_w, half_h),
        (-half_w, half_h),
    ] {
        let rx = dx * cos - dy * sin;
        let ry = dx * sin + dy * cos;
        let corner = unproject(cx + rx, cy + ry, view.zoom);
        bounds.min_lat = bounds.min_lat.min(corner.lat);
        bounds.max_lat = bounds.max_lat.max(corner.lat);
        bounds.min_lon = bounds.min_lon.min(corner.lng);
        bounds.max_lon = bounds.max_lon.max(corner.lng);
    }

    if !bounds.is_finite() || bounds.min_lat > bounds.max_lat {
        return Err(Error::Projection(format!("degenerate bounds {bounds:?}")));
    }
    Ok(bounds)
}

/// Keeps the last good bounds for a changing view.
#[derive(Debug, Clone, Default)]
pub struct GeoProjector {
    last: Option<ViewportBounds>,
}

impl GeoProjector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Recomputes bounds. On failure the previous bounds are kept and the
    /// error is logged.
    pub fn update(&mut self, view: &ViewState, width: f64, height: f64) -> Option<ViewportBounds> {
        if let Err(e) = self.refresh(view, width, height) {
            log::error!("failed to update viewport bounds: {}", e);
        }
        self.last
    }

    /// Like [`update`](Self::update) but hands the failure to the caller
    pub fn refresh(&mut self, view: &ViewState, width: f64, height: f64) -> Result<ViewportBounds> {
        let bounds = viewport_bounds(view, width, height)?;
        self.last = Some(bounds);
        Ok(bounds)
    }

    pub fn bounds(&self) -> Option<ViewportBounds> {
        self.last
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx(a: f64, b: f64, eps: f64) -> bool {
        (a - b).abs() < eps
    }

    #[test]
    fn rotterdam_scenario() {
        let view = ViewState::new(51.9, 4.5, 10.0);
        let b = viewport_bounds(&view, 1024.0, 768.0).unwrap();

        // 1024 px of a 512 * 2^10 px world
        let lon_span = 1024.0 / (512.0 * 1024.0) * 360.0;
        assert!(approx(b.max_lon - b.min_lon, lon_span, 1e-9));
        assert!(approx(b.center().lng, 4.5, 1e-9));
        assert!(b.min_lat < 51.9 && 51.9 < b.max_lat);
        assert!(b.max_lat - b.min_lat < lon_span);
        assert!(approx(b.min_lat, 51.737, 0.01));
        assert!(approx(b.max_lat, 52.063, 0.01));
    }

    #[test]
    fn min_lat_never_exceeds_max_lat() {
        for &(lat, lng, zoom) in &[
            (0.0, 0.0, 0.0),
            (84.0, 179.0, 1.5),
            (-80.0, -179.9, 3.0),
            (45.0, 10.0, 18.0),
        ] {
            for bearing in [0.0, 33.0, 90.0, 270.0] {
                let mut view = ViewState::new(lat, lng, zoom);
                view.bearing = bearing;
                let b = viewport_bounds(&view, 800.0, 600.0).unwrap();
                assert!(b.min_lat <= b.max_lat, "{view:?} -> {b:?}");
            }
        }
    }

    #[test]
    fn project_unproject_inverse() {
        let p = LatLng::new(-33.86, 151.2);
        let (x, y) = project(&p, 7.0);
        let back = unproject(x, y, 7.0);
        assert!(approx(back.lat, p.lat, 1e-9));
        assert!(approx(back.lng, p.lng, 1e-9));
    }

    #[test]
    fn bearing_widens_the_box() {
        let flat = viewport_bounds(&ViewState::new(10.0, 10.0, 6.0), 1000.0, 200.0).unwrap();
        let mut rotated_view = ViewState::new(10.0, 10.0, 6.0);
        rotated_view.bearing = 90.0;
        let rotated = viewport_bounds(&rotated_view, 1000.0, 200.0).unwrap();
        assert!(rotated.max_lat - rotated.min_lat > flat.max_lat - flat.min_lat);
        assert!(rotated.max_lon - rotated.min_lon < flat.max_lon - flat.min_lon);
    }

    #[test]
    fn failures_keep_previous_bounds() {
        let mut projector = GeoProjector::new();
        let good = projector.update(&ViewState::default(), 800.0, 600.0);
        assert!(good.is_some());

        let pole = ViewState::new(90.0, 0.0, 4.0);
        assert!(viewport_bounds(&pole, 800.0, 600.0).is_err());
        assert_eq!(projector.update(&pole, 800.0, 600.0), good);
        assert_eq!(projector.update(&ViewState::default(), 0.0, 600.0), good);
    }
}
