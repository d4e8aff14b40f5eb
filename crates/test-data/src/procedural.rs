//! Procedural loop-route generation.

use rand::SeedableRng;
use rand::rngs::StdRng;
use rand_distr::{Distribution, Normal};
use time::macros::datetime;
use time::{Duration, OffsetDateTime};

use crate::TrackPointData;

/// Configuration for loop-route generation.
#[derive(Debug, Clone)]
pub struct LoopConfig {
    /// Route center (lat, lon).
    pub center: (f64, f64),
    /// Mean loop radius in degrees.
    pub radius_deg: f64,
    /// Standard deviation of per-point radius jitter in degrees.
    pub radius_jitter_deg: f64,
    /// Number of generated points.
    pub point_count: usize,
    /// Seconds between consecutive points.
    pub point_spacing_s: f64,
    /// Timestamp of the first point; None produces an untimed track.
    pub start_time: Option<OffsetDateTime>,
}

impl Default for LoopConfig {
    fn default() -> Self {
        Self {
            center: (37.7749, -122.4194),
            radius_deg: 0.01,
            radius_jitter_deg: 0.0025,
            point_count: 100,
            point_spacing_s: 27.0,
            start_time: Some(datetime!(2023-05-15 07:30:00 UTC)),
        }
    }
}

/// Generates roughly circular GPS loops with jittered radii and paced
/// timestamps. Deterministic for a given seed.
pub struct LoopGenerator {
    config: LoopConfig,
    rng: StdRng,
}

impl LoopGenerator {
    pub fn new(seed: u64) -> Self {
        Self::with_config(LoopConfig::default(), seed)
    }

    pub fn with_config(config: LoopConfig, seed: u64) -> Self {
        Self {
            config,
            rng: StdRng::seed_from_u64(seed),
        }
    }

    pub fn generate(&mut self) -> Vec<TrackPointData> {
        let jitter = Normal::new(0.0, self.config.radius_jitter_deg).ok();
        let (center_lat, center_lon) = self.config.center;
        let mut points = Vec::with_capacity(self.config.point_count);

        for i in 0..self.config.point_count {
            let angle = i as f64 / self.config.point_count as f64 * std::f64::consts::TAU;
            let offset = jitter
                .as_ref()
                .map(|n| n.sample(&mut self.rng))
                .unwrap_or(0.0);
            let radius = self.config.radius_deg + offset;
            let timestamp = self.config.start_time.map(|start| {
                start + Duration::seconds_f64(i as f64 * self.config.point_spacing_s)
            });

            points.push(TrackPointData {
                lat: center_lat + angle.sin() * radius,
                lon: center_lon + angle.cos() * radius,
                elevation: None,
                timestamp,
            });
        }

        points
    }
}
