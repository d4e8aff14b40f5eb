//! Geographic-to-canvas projection.
//!
//! Maps a track's coordinates into canvas pixel space with an
//! aspect-preserving fit: one uniform scale, chosen so the whole track
//! fits inside the padded canvas on both axes. North maps to canvas-up;
//! any rotation is applied later by the renderer.

use crate::models::{BoundingBox, GeoPoint, ProjectedPoint, Track};

/// Geographic extent of a point sequence. None when the sequence is empty.
pub fn bounding_box(points: &[GeoPoint]) -> Option<BoundingBox> {
    let first = points.first()?;
    let mut bounds = BoundingBox {
        min_lat: first.lat,
        max_lat: first.lat,
        min_lon: first.lon,
        max_lon: first.lon,
    };
    for p in &points[1..] {
        bounds.min_lat = bounds.min_lat.min(p.lat);
        bounds.max_lat = bounds.max_lat.max(p.lat);
        bounds.min_lon = bounds.min_lon.min(p.lon);
        bounds.max_lon = bounds.max_lon.max(p.lon);
    }
    Some(bounds)
}

/// Project every track point into canvas pixel space.
///
/// Output length equals the input length; an empty track projects to an
/// empty sequence. The y axis is inverted so that north is up. For finite
/// input the output never contains NaN or infinite coordinates.
pub fn project(
    track: &Track,
    canvas_width: f64,
    canvas_height: f64,
    padding_px: f64,
) -> Vec<ProjectedPoint> {
    let Some(bounds) = bounding_box(&track.points) else {
        return Vec::new();
    };
    let scale = fit_scale(&bounds, canvas_width, canvas_height, padding_px);

    track
        .points
        .iter()
        .map(|p| ProjectedPoint {
            x: padding_px + (p.lon - bounds.min_lon) * scale,
            y: canvas_height - padding_px - (p.lat - bounds.min_lat) * scale,
        })
        .collect()
}

/// Uniform scale fitting the bounding box into the padded canvas.
///
/// A zero range means no geographic spread on that axis, so that axis is
/// excluded from the fit and the other axis's scale is used alone; when
/// both ranges are zero the scale is 1.0 and the single position lands at
/// the padded corner.
fn fit_scale(bounds: &BoundingBox, canvas_width: f64, canvas_height: f64, padding_px: f64) -> f64 {
    let available_width = canvas_width - 2.0 * padding_px;
    let available_height = canvas_height - 2.0 * padding_px;
    let lat_range = bounds.lat_range();
    let lon_range = bounds.lon_range();

    match (lon_range > 0.0, lat_range > 0.0) {
        (true, true) => (available_height / lat_range).min(available_width / lon_range),
        (true, false) => available_width / lon_range,
        (false, true) => available_height / lat_range,
        (false, false) => 1.0,
    }
}
