//! Track rendering onto a raster surface.
//!
//! Composes a render pass in a fixed order: background, rotated path
//! stroke, rotated start/end markers, upright title text. The rotation is
//! a per-draw-call [`Transform`] about the canvas center, so the title
//! never inherits it. Export renders differ from previews only in the
//! background; the stroke geometry is shared, which keeps the downloaded
//! image identical to the on-screen preview.

use rusttype::{Font, PositionedGlyph, Scale, point};
use tiny_skia::{
    Color, FillRule, LineCap, LineJoin, Paint, PathBuilder, Pixmap, Stroke, Transform,
};
use tracing::warn;

use crate::errors::AppError;
use crate::fonts::FontStore;
use crate::models::{ProjectedPoint, StyleConfig, Track};
use crate::projection::project;

/// Marker fill for the first track point.
const START_MARKER_RGB: (u8, u8, u8) = (0x4c, 0xaf, 0x50);
/// Marker fill for the last track point.
const END_MARKER_RGB: (u8, u8, u8) = (0xf4, 0x43, 0x36);

pub struct Renderer {
    fonts: FontStore,
}

impl Renderer {
    pub fn new() -> Self {
        Self {
            fonts: FontStore::new(),
        }
    }

    /// Draw the track onto `pixmap`.
    ///
    /// The surface is fully cleared first, so repeated renders never
    /// accumulate. With `transparent_background` the canvas stays clear;
    /// otherwise it is filled with the configured background color. An
    /// empty track clears the surface and returns.
    pub fn render(
        &self,
        pixmap: &mut Pixmap,
        track: &Track,
        projected: &[ProjectedPoint],
        style: &StyleConfig,
        transparent_background: bool,
    ) {
        if transparent_background {
            pixmap.fill(Color::TRANSPARENT);
        } else {
            pixmap.fill(color_or_black(&style.background_color));
        }

        if track.points.is_empty() || projected.is_empty() {
            return;
        }

        let width = f64::from(pixmap.width());
        let height = f64::from(pixmap.height());

        // Wrapped so that full turns come out pixel-identical to no rotation.
        let angle = style.rotation_degrees.rem_euclid(360.0) as f32;
        let rotation = Transform::from_rotate_at(angle, width as f32 / 2.0, height as f32 / 2.0);

        stroke_path(pixmap, projected, style, rotation);

        if style.show_start_end_markers {
            let radius = (style.line_width_px * 2.0) as f32;
            if let (Some(first), Some(last)) = (projected.first(), projected.last()) {
                // End drawn second so it sits on top when both coincide.
                fill_circle(pixmap, *first, radius, rgb(START_MARKER_RGB), rotation);
                fill_circle(pixmap, *last, radius, rgb(END_MARKER_RGB), rotation);
            }
        }

        if style.show_title && !style.title_text.is_empty() {
            self.draw_title(pixmap, track, style, width, height);
        }
    }

    /// Preview render: configured background, full style.
    pub fn render_preview(
        &self,
        track: &Track,
        style: &StyleConfig,
        width: u32,
        height: u32,
    ) -> Result<Pixmap, AppError> {
        let mut pixmap = new_pixmap(width, height)?;
        let projected = project(track, f64::from(width), f64::from(height), style.padding_px);
        self.render(&mut pixmap, track, &projected, style, false);
        Ok(pixmap)
    }

    /// Export render: same geometry as the preview on a transparent canvas.
    pub fn render_export(
        &self,
        track: &Track,
        style: &StyleConfig,
        width: u32,
        height: u32,
    ) -> Result<Pixmap, AppError> {
        let mut pixmap = new_pixmap(width, height)?;
        let projected = project(track, f64::from(width), f64::from(height), style.padding_px);
        self.render(&mut pixmap, track, &projected, style, true);
        Ok(pixmap)
    }

    /// Export render encoded as PNG bytes.
    pub fn render_png(
        &self,
        track: &Track,
        style: &StyleConfig,
        width: u32,
        height: u32,
    ) -> Result<Vec<u8>, AppError> {
        self.render_export(track, style, width, height)?
            .encode_png()
            .map_err(|e| AppError::Render(format!("PNG encoding failed: {e}")))
    }

    fn draw_title(
        &self,
        pixmap: &mut Pixmap,
        track: &Track,
        style: &StyleConfig,
        width: f64,
        height: f64,
    ) {
        let Some(font) = self.fonts.resolve(&style.font_family) else {
            warn!(family = %style.font_family, "no usable font found, skipping title");
            return;
        };
        let color = color_or_black(&style.font_color);
        let anchor_x = (width * style.title_position_percent_x / 100.0) as f32;
        let baseline_y = (height * style.title_position_percent_y / 100.0 + style.font_size_px) as f32;

        draw_text(
            pixmap,
            &font,
            &style.title_text,
            style.font_size_px as f32,
            color,
            anchor_x,
            baseline_y,
        );

        // Second line with the activity stats, below the title.
        if track.total_distance_km != 0.0 && !track.total_duration.is_empty() {
            let details = format!("{:.2} km · {}", track.total_distance_km, track.total_duration);
            draw_text(
                pixmap,
                &font,
                &details,
                (style.font_size_px * 0.6) as f32,
                color,
                anchor_x,
                baseline_y + (style.font_size_px * 0.8) as f32,
            );
        }
    }
}

impl Default for Renderer {
    fn default() -> Self {
        Self::new()
    }
}

fn new_pixmap(width: u32, height: u32) -> Result<Pixmap, AppError> {
    Pixmap::new(width, height)
        .ok_or_else(|| AppError::Render(format!("cannot allocate a {width}x{height} surface")))
}

/// Connect the projected points with one continuous round-capped stroke.
/// Fewer than two points leave nothing to stroke.
fn stroke_path(
    pixmap: &mut Pixmap,
    projected: &[ProjectedPoint],
    style: &StyleConfig,
    transform: Transform,
) {
    if projected.len() < 2 {
        return;
    }

    let mut pb = PathBuilder::new();
    pb.move_to(projected[0].x as f32, projected[0].y as f32);
    for p in &projected[1..] {
        pb.line_to(p.x as f32, p.y as f32);
    }
    let Some(path) = pb.finish() else {
        return;
    };

    let mut paint = Paint::default();
    paint.set_color(color_or_black(&style.track_color));
    paint.anti_alias = true;

    let stroke = Stroke {
        width: style.line_width_px as f32,
        line_cap: LineCap::Round,
        line_join: LineJoin::Round,
        ..Stroke::default()
    };

    pixmap.stroke_path(&path, &paint, &stroke, transform, None);
}

fn fill_circle(
    pixmap: &mut Pixmap,
    center: ProjectedPoint,
    radius: f32,
    color: Color,
    transform: Transform,
) {
    let mut pb = PathBuilder::new();
    pb.push_circle(center.x as f32, center.y as f32, radius);
    let Some(path) = pb.finish() else {
        return;
    };

    let mut paint = Paint::default();
    paint.set_color(color);
    paint.anti_alias = true;

    pixmap.fill_path(&path, &paint, FillRule::Winding, transform, None);
}

/// Rasterize a line of text horizontally centered on `anchor_x` with its
/// baseline at `baseline_y`.
fn draw_text(
    pixmap: &mut Pixmap,
    font: &Font<'_>,
    text: &str,
    size_px: f32,
    color: Color,
    anchor_x: f32,
    baseline_y: f32,
) {
    let scale = Scale::uniform(size_px);
    let glyphs: Vec<PositionedGlyph> = font.layout(text, scale, point(0.0, 0.0)).collect();

    let (min_x, max_x) = glyphs
        .iter()
        .filter_map(|g| g.pixel_bounding_box())
        .fold((i32::MAX, i32::MIN), |(lo, hi), bb| {
            (lo.min(bb.min.x), hi.max(bb.max.x))
        });
    if min_x > max_x {
        return;
    }

    let offset_x = anchor_x.round() as i32 - (max_x - min_x) / 2 - min_x;
    let baseline = baseline_y.round() as i32;

    for glyph in &glyphs {
        if let Some(bb) = glyph.pixel_bounding_box() {
            glyph.draw(|gx, gy, coverage| {
                let px = offset_x + bb.min.x + gx as i32;
                let py = baseline + bb.min.y + gy as i32;
                blend_pixel(pixmap, px, py, color, coverage);
            });
        }
    }
}

/// Source-over blend of one coverage-weighted pixel, in premultiplied space.
fn blend_pixel(pixmap: &mut Pixmap, x: i32, y: i32, color: Color, coverage: f32) {
    let width = pixmap.width() as i32;
    let height = pixmap.height() as i32;
    if coverage <= 0.0 || x < 0 || y < 0 || x >= width || y >= height {
        return;
    }
    let src_a = color.alpha() * coverage.min(1.0);
    if src_a <= 0.0 {
        return;
    }

    let idx = ((y * width + x) * 4) as usize;
    let data = pixmap.data_mut();
    let inv = 1.0 - src_a;
    data[idx] = (color.red() * src_a * 255.0 + f32::from(data[idx]) * inv + 0.5) as u8;
    data[idx + 1] = (color.green() * src_a * 255.0 + f32::from(data[idx + 1]) * inv + 0.5) as u8;
    data[idx + 2] = (color.blue() * src_a * 255.0 + f32::from(data[idx + 2]) * inv + 0.5) as u8;
    data[idx + 3] = (src_a * 255.0 + f32::from(data[idx + 3]) * inv + 0.5) as u8;
}

/// Parse `#RRGGBB` / `#RGB` (case-insensitive) or `"transparent"`.
pub fn parse_color(value: &str) -> Option<Color> {
    let value = value.trim();
    if value.eq_ignore_ascii_case("transparent") {
        return Some(Color::TRANSPARENT);
    }

    let hex = value.strip_prefix('#')?;
    if !hex.is_ascii() {
        return None;
    }
    let (r, g, b) = match hex.len() {
        6 => (
            u8::from_str_radix(&hex[0..2], 16).ok()?,
            u8::from_str_radix(&hex[2..4], 16).ok()?,
            u8::from_str_radix(&hex[4..6], 16).ok()?,
        ),
        3 => (
            u8::from_str_radix(&hex[0..1], 16).ok()? * 17,
            u8::from_str_radix(&hex[1..2], 16).ok()? * 17,
            u8::from_str_radix(&hex[2..3], 16).ok()? * 17,
        ),
        _ => return None,
    };
    Some(Color::from_rgba8(r, g, b, 255))
}

fn color_or_black(value: &str) -> Color {
    parse_color(value).unwrap_or_else(|| {
        warn!(color = %value, "unrecognized color, falling back to black");
        Color::BLACK
    })
}

fn rgb((r, g, b): (u8, u8, u8)) -> Color {
    Color::from_rgba8(r, g, b, 255)
}
