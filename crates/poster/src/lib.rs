//! GPX track parsing and stylized route poster rendering.
//!
//! The pipeline: GPX text is parsed into a [`models::Track`]
//! ([`gpx_parser`], accumulating distance via [`geo`]), projected into
//! canvas pixel space ([`projection`]) and composed onto a raster surface
//! ([`renderer`]) that can be encoded as PNG.
//!
//! ```
//! use poster::models::StyleConfig;
//!
//! let gpx = r#"<gpx><trk><name>Lakeside Loop</name><trkseg>
//!   <trkpt lat="47.0" lon="8.0"/>
//!   <trkpt lat="47.01" lon="8.01"/>
//! </trkseg></trk></gpx>"#;
//!
//! let png = poster::render_gpx_poster(gpx, &StyleConfig::default(), 600, 600).unwrap();
//! assert_eq!(png[..8], *b"\x89PNG\r\n\x1a\n");
//! ```

pub mod errors;
pub mod fonts;
pub mod geo;
pub mod gpx_parser;
pub mod models;
pub mod projection;
pub mod renderer;

use crate::errors::AppError;
use crate::models::StyleConfig;
use crate::renderer::Renderer;

/// Run the whole pipeline in one call: parse GPX text and render it to
/// PNG bytes on a transparent background.
pub fn render_gpx_poster(
    gpx_text: &str,
    style: &StyleConfig,
    width: u32,
    height: u32,
) -> Result<Vec<u8>, AppError> {
    let track = gpx_parser::parse_gpx(gpx_text)?;
    Renderer::new().render_png(&track, style, width, height)
}
