//! GPX file generation from track points.
//!
//! Emits GPX 1.1 XML with a single track and a single track segment, the
//! shape the rendering pipeline consumes.

use time::format_description::well_known::Rfc3339;

use crate::TrackPointData;

/// Generates a GPX 1.1 document string from track points.
pub fn generate_gpx(points: &[TrackPointData], track_name: &str) -> String {
    let mut gpx = String::new();

    gpx.push_str(r#"<?xml version="1.0" encoding="UTF-8"?>"#);
    gpx.push('\n');
    gpx.push_str(r#"<gpx version="1.1" creator="run-poster-test-data""#);
    gpx.push_str(r#" xmlns="http://www.topografix.com/GPX/1/1""#);
    gpx.push_str(r#" xmlns:xsi="http://www.w3.org/2001/XMLSchema-instance""#);
    gpx.push_str(r#" xsi:schemaLocation="http://www.topografix.com/GPX/1/1 http://www.topografix.com/GPX/1/1/gpx.xsd">"#);
    gpx.push('\n');

    gpx.push_str("  <trk>\n");
    gpx.push_str(&format!("    <name>{}</name>\n", escape_xml(track_name)));
    gpx.push_str("    <trkseg>\n");

    for point in points {
        gpx.push_str(&format!(
            r#"      <trkpt lat="{:.7}" lon="{:.7}">"#,
            point.lat, point.lon
        ));
        gpx.push('\n');

        if let Some(ele) = point.elevation {
            gpx.push_str(&format!("        <ele>{ele:.2}</ele>\n"));
        }

        if let Some(ts) = point.timestamp {
            let formatted = ts.format(&Rfc3339).unwrap_or_default();
            gpx.push_str(&format!("        <time>{formatted}</time>\n"));
        }

        gpx.push_str("      </trkpt>\n");
    }

    gpx.push_str("    </trkseg>\n");
    gpx.push_str("  </trk>\n");
    gpx.push_str("</gpx>\n");

    gpx
}

/// Escapes XML special characters in a string.
fn escape_xml(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&apos;")
}
