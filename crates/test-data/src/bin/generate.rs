//! Writes a demo GPX file for manual testing.
//!
//! Run with:
//! ```
//! cargo run -p test-data --bin generate -- demo.gpx
//! ```

use anyhow::Context;
use test_data::gpx::generate_gpx;
use test_data::procedural::LoopGenerator;
use tracing_subscriber::EnvFilter;

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let output = std::env::args()
        .nth(1)
        .context("usage: generate <output.gpx>")?;
    let seed = std::env::var("GENERATE_SEED")
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(12345);

    let points = LoopGenerator::new(seed).generate();
    let gpx = generate_gpx(&points, "Morning Run");
    std::fs::write(&output, gpx)?;

    tracing::info!("Wrote {} points to {}", points.len(), output);
    Ok(())
}
