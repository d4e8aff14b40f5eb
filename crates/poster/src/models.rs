use serde::{Deserialize, Serialize};

/// A geographic coordinate in degrees.
///
/// Values are taken from the source document as-is; out-of-range
/// coordinates are not rejected.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub lat: f64,
    pub lon: f64,
}

impl GeoPoint {
    pub fn new(lat: f64, lon: f64) -> Self {
        Self { lat, lon }
    }
}

/// A parsed activity recording. Immutable after parsing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Track {
    /// Ordered track points. May be empty; rendering an empty track is a no-op.
    pub points: Vec<GeoPoint>,
    pub name: String,
    /// ISO date (YYYY-MM-DD) of the first point, empty when unknown.
    pub date: String,
    pub total_distance_km: f64,
    /// Elapsed time between first and last point as HH:MM:SS, hours unbounded.
    pub total_duration: String,
}

/// Geographic extent of a point sequence. Derived per render pass, never stored.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingBox {
    pub min_lat: f64,
    pub max_lat: f64,
    pub min_lon: f64,
    pub max_lon: f64,
}

impl BoundingBox {
    pub fn lat_range(&self) -> f64 {
        self.max_lat - self.min_lat
    }

    pub fn lon_range(&self) -> f64 {
        self.max_lon - self.min_lon
    }
}

/// A point in canvas pixel space, post-scale, pre-rotation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProjectedPoint {
    pub x: f64,
    pub y: f64,
}

/// Styling options for one render call.
///
/// Passed by value into every render; callers rebuild it from their own
/// state whenever something changes. Deserializes from camelCase JSON with
/// every field optional, so a partial style document is accepted.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct StyleConfig {
    /// Stroke color of the route path, as a hex string.
    pub track_color: String,
    /// Canvas fill for preview renders; "transparent" leaves it clear.
    pub background_color: String,
    pub line_width_px: f64,
    pub padding_px: f64,
    /// Rotation of the path and markers about the canvas center. Any real
    /// value; wrapped mod 360 for the visual result.
    pub rotation_degrees: f64,
    pub show_start_end_markers: bool,
    pub show_title: bool,
    pub title_text: String,
    pub font_family: String,
    pub font_size_px: f64,
    pub font_color: String,
    /// Title anchor as a percentage of the canvas width (0-100).
    pub title_position_percent_x: f64,
    /// Title anchor as a percentage of the canvas height (0-100).
    pub title_position_percent_y: f64,
}

impl Default for StyleConfig {
    fn default() -> Self {
        Self {
            track_color: "#FF5353".to_string(),
            background_color: "#FFFFFF".to_string(),
            line_width_px: 3.0,
            padding_px: 20.0,
            rotation_degrees: 0.0,
            show_start_end_markers: true,
            show_title: true,
            title_text: String::new(),
            font_family: "Inter".to_string(),
            font_size_px: 24.0,
            font_color: "#000000".to_string(),
            title_position_percent_x: 50.0,
            title_position_percent_y: 5.0,
        }
    }
}
