use std::env;
use std::fs;

use anyhow::Context;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use poster::gpx_parser::parse_gpx;
use poster::models::StyleConfig;
use poster::renderer::Renderer;

fn init_logging() {
    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env())
        .with(tracing_subscriber::fmt::layer().pretty())
        .init();
}

fn main() -> anyhow::Result<()> {
    init_logging();

    let mut args = env::args().skip(1);
    let input = args
        .next()
        .context("usage: poster <input.gpx> <output.png>")?;
    let output = args
        .next()
        .context("usage: poster <input.gpx> <output.png>")?;

    let style = match env::var("POSTER_STYLE") {
        Ok(path) => {
            let json = fs::read_to_string(&path)
                .with_context(|| format!("reading style config {path}"))?;
            serde_json::from_str(&json).with_context(|| format!("parsing style config {path}"))?
        }
        Err(_) => StyleConfig::default(),
    };

    let width = env::var("POSTER_WIDTH")
        .ok()
        .and_then(|v| v.parse::<u32>().ok())
        .unwrap_or(600);
    let height = env::var("POSTER_HEIGHT")
        .ok()
        .and_then(|v| v.parse::<u32>().ok())
        .unwrap_or(600);

    let gpx_text = fs::read_to_string(&input).with_context(|| format!("reading {input}"))?;
    let track = parse_gpx(&gpx_text)?;
    tracing::info!(
        name = %track.name,
        points = track.points.len(),
        distance_km = track.total_distance_km,
        duration = %track.total_duration,
        "parsed track"
    );

    let png = Renderer::new().render_png(&track, &style, width, height)?;
    fs::write(&output, png).with_context(|| format!("writing {output}"))?;
    tracing::info!("wrote {}", output);

    Ok(())
}
