//! Synthetic GPS track generation for run-poster.
//!
//! Provides a seeded procedural route generator and a GPX 1.1 writer so
//! tests and demos can produce parseable recordings without a real GPS
//! device.

pub mod gpx;
pub mod procedural;

use time::OffsetDateTime;

/// A single generated track point.
#[derive(Debug, Clone, Copy)]
pub struct TrackPointData {
    pub lat: f64,
    pub lon: f64,
    pub elevation: Option<f64>,
    pub timestamp: Option<OffsetDateTime>,
}
