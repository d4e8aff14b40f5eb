//! Lenient GPX track parsing.
//!
//! The parse boundary has a two-tier contract: input that is not
//! well-formed XML fails with [`AppError::GpxParsing`], while anything
//! missing inside a structurally valid document degrades to a default.
//! Points with missing or unparsable coordinates are skipped, a missing
//! track name becomes "My Run", and missing timestamps leave the date
//! empty and the duration at zero.

use quick_xml::Reader;
use quick_xml::events::{BytesStart, Event};
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;
use tracing::{debug, warn};

use crate::errors::AppError;
use crate::geo::haversine_km;
use crate::models::{GeoPoint, Track};

/// Track name used when the document does not carry one.
const DEFAULT_TRACK_NAME: &str = "My Run";

/// A track point as read from the document, before metric accumulation.
struct RawPoint {
    coord: GeoPoint,
    time: Option<String>,
}

/// Parse a GPX document into a [`Track`].
///
/// All segments of all `<trk>` elements are flattened into one point
/// sequence in document order. Fails only when the input is not
/// well-formed XML; an input with no root element at all counts as
/// malformed. Callers must not assume a non-empty point sequence.
pub fn parse_gpx(text: &str) -> Result<Track, AppError> {
    let mut reader = Reader::from_str(text);
    let mut raw_points: Vec<RawPoint> = Vec::new();
    let mut name: Option<String> = None;
    let mut saw_root = false;

    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) => {
                saw_root = true;
                if e.local_name().as_ref() == b"trk" {
                    parse_track(&mut reader, &mut name, &mut raw_points)?;
                }
            }
            Ok(Event::Empty(_)) => saw_root = true,
            Ok(Event::Eof) => break,
            Err(e) => return Err(xml_error(e)),
            _ => {}
        }
    }

    if !saw_root {
        return Err(AppError::GpxParsing(
            "document has no root element".to_string(),
        ));
    }

    let points: Vec<GeoPoint> = raw_points.iter().map(|p| p.coord).collect();

    let total_distance_km: f64 = points
        .windows(2)
        .map(|pair| haversine_km(pair[0], pair[1]))
        .sum();

    let first_time = raw_points
        .first()
        .and_then(|p| parse_timestamp(p.time.as_deref()?));
    let last_time = raw_points
        .last()
        .and_then(|p| parse_timestamp(p.time.as_deref()?));

    let date = first_time.map(format_date).unwrap_or_default();
    let total_duration = match (first_time, last_time) {
        (Some(start), Some(end)) => format_hms(end - start),
        _ => "00:00:00".to_string(),
    };

    debug!(
        points = points.len(),
        distance_km = total_distance_km,
        "parsed GPX track"
    );

    Ok(Track {
        points,
        name: name.unwrap_or_else(|| DEFAULT_TRACK_NAME.to_string()),
        date,
        total_distance_km,
        total_duration,
    })
}

/// Parse a `<trk>` element: its name and all its segments.
fn parse_track<'a>(
    reader: &mut Reader<&'a [u8]>,
    name: &mut Option<String>,
    points: &mut Vec<RawPoint>,
) -> Result<(), AppError> {
    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) => match e.local_name().as_ref() {
                b"name" => {
                    let text = read_element_text(reader, &e)?;
                    // The first non-empty track name wins.
                    if name.is_none() && !text.trim().is_empty() {
                        *name = Some(text.trim().to_string());
                    }
                }
                b"trkseg" => parse_segment(reader, points)?,
                _ => skip_element(reader, &e)?,
            },
            Ok(Event::End(e)) if e.local_name().as_ref() == b"trk" => break,
            Ok(Event::Eof) => break,
            Err(e) => return Err(xml_error(e)),
            _ => {}
        }
    }
    Ok(())
}

/// Parse a `<trkseg>` element into the shared point sequence.
fn parse_segment<'a>(
    reader: &mut Reader<&'a [u8]>,
    points: &mut Vec<RawPoint>,
) -> Result<(), AppError> {
    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) => {
                if e.local_name().as_ref() == b"trkpt" {
                    if let Some(point) = parse_point(reader, &e)? {
                        points.push(point);
                    }
                } else {
                    skip_element(reader, &e)?;
                }
            }
            Ok(Event::Empty(e)) => {
                if e.local_name().as_ref() == b"trkpt" {
                    match parse_lat_lon(&e)? {
                        Some(coord) => points.push(RawPoint { coord, time: None }),
                        None => warn!("skipping track point without usable coordinates"),
                    }
                }
            }
            Ok(Event::End(e)) if e.local_name().as_ref() == b"trkseg" => break,
            Ok(Event::Eof) => break,
            Err(e) => return Err(xml_error(e)),
            _ => {}
        }
    }
    Ok(())
}

/// Parse a non-self-closing `<trkpt>` and its children. Returns None when
/// the point has no usable coordinates; its children are consumed either way.
fn parse_point<'a>(
    reader: &mut Reader<&'a [u8]>,
    start: &BytesStart<'a>,
) -> Result<Option<RawPoint>, AppError> {
    let coord = parse_lat_lon(start)?;
    let end_name = start.name().0.to_vec();
    let mut time: Option<String> = None;

    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) => {
                if e.local_name().as_ref() == b"time" {
                    time = Some(read_element_text(reader, &e)?);
                } else {
                    // ele, extensions and anything else we don't draw
                    skip_element(reader, &e)?;
                }
            }
            Ok(Event::End(e)) if e.name().0 == end_name.as_slice() => break,
            Ok(Event::Eof) => break,
            Err(e) => return Err(xml_error(e)),
            _ => {}
        }
    }

    match coord {
        Some(coord) => Ok(Some(RawPoint { coord, time })),
        None => {
            warn!("skipping track point without usable coordinates");
            Ok(None)
        }
    }
}

/// Read lat/lon attributes from a point's start tag. Missing or
/// non-numeric values yield None; malformed attribute syntax is fatal.
fn parse_lat_lon(e: &BytesStart<'_>) -> Result<Option<GeoPoint>, AppError> {
    let mut lat: Option<f64> = None;
    let mut lon: Option<f64> = None;

    for attr in e.attributes() {
        let attr = attr.map_err(|e| AppError::GpxParsing(format!("malformed attribute: {e}")))?;
        let value = std::str::from_utf8(&attr.value).unwrap_or_default();
        match attr.key.local_name().as_ref() {
            b"lat" => lat = value.trim().parse::<f64>().ok(),
            b"lon" => lon = value.trim().parse::<f64>().ok(),
            _ => {}
        }
    }

    Ok(match (lat, lon) {
        (Some(lat), Some(lon)) => Some(GeoPoint::new(lat, lon)),
        _ => None,
    })
}

/// Read the text content of the current element, resolving CDATA sections
/// and character/predefined entity references.
fn read_element_text<'a>(
    reader: &mut Reader<&'a [u8]>,
    start: &BytesStart<'_>,
) -> Result<String, AppError> {
    let end_name = start.name().0.to_vec();
    let mut text = String::new();

    loop {
        match reader.read_event() {
            Ok(Event::Text(e)) => {
                text.push_str(std::str::from_utf8(e.as_ref()).unwrap_or_default());
            }
            Ok(Event::CData(e)) => {
                text.push_str(std::str::from_utf8(e.as_ref()).unwrap_or_default());
            }
            Ok(Event::GeneralRef(e)) => {
                if let Ok(Some(ch)) = e.resolve_char_ref() {
                    text.push(ch);
                } else {
                    match std::str::from_utf8(e.as_ref()).unwrap_or_default() {
                        "amp" => text.push('&'),
                        "lt" => text.push('<'),
                        "gt" => text.push('>'),
                        "quot" => text.push('"'),
                        "apos" => text.push('\''),
                        _ => {}
                    }
                }
            }
            Ok(Event::End(e)) if e.name().0 == end_name.as_slice() => break,
            Ok(Event::Eof) => break,
            Err(e) => return Err(xml_error(e)),
            _ => {}
        }
    }

    Ok(text)
}

/// Skip an element and everything inside it.
fn skip_element<'a>(reader: &mut Reader<&'a [u8]>, start: &BytesStart<'a>) -> Result<(), AppError> {
    reader.read_to_end(start.name()).map_err(xml_error)?;
    Ok(())
}

fn xml_error(e: quick_xml::Error) -> AppError {
    AppError::GpxParsing(format!("malformed XML: {e}"))
}

fn parse_timestamp(value: &str) -> Option<OffsetDateTime> {
    OffsetDateTime::parse(value.trim(), &Rfc3339).ok()
}

/// ISO date (YYYY-MM-DD) of a timestamp.
fn format_date(ts: OffsetDateTime) -> String {
    format!("{:04}-{:02}-{:02}", ts.year(), ts.month() as u8, ts.day())
}

/// HH:MM:SS with unbounded hours. Negative spans clamp to zero.
fn format_hms(span: time::Duration) -> String {
    let total = span.whole_seconds().max(0);
    format!("{:02}:{:02}:{:02}", total / 3600, (total % 3600) / 60, total % 60)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_a_simple_track() {
        let xml = r#"<?xml version="1.0"?>
<gpx version="1.1">
  <trk>
    <name>Morning Run</name>
    <trkseg>
      <trkpt lat="47.0" lon="8.0"><time>2023-01-01T00:00:00Z</time></trkpt>
      <trkpt lat="47.001" lon="8.001"><time>2023-01-01T00:01:00Z</time></trkpt>
      <trkpt lat="47.002" lon="8.002"><time>2023-01-01T00:02:00Z</time></trkpt>
    </trkseg>
  </trk>
</gpx>"#;
        let track = parse_gpx(xml).unwrap();
        assert_eq!(track.name, "Morning Run");
        assert_eq!(track.points.len(), 3);
        assert_eq!(track.date, "2023-01-01");
        assert_eq!(track.total_duration, "00:02:00");
        assert!(track.total_distance_km > 0.0);
    }

    #[test]
    fn distance_accumulates_pairwise() {
        let xml = r#"<gpx><trk><trkseg>
            <trkpt lat="0.0" lon="0.0"/>
            <trkpt lat="0.0" lon="1.0"/>
            <trkpt lat="1.0" lon="1.0"/>
        </trkseg></trk></gpx>"#;
        let track = parse_gpx(xml).unwrap();
        let expected = haversine_km(GeoPoint::new(0.0, 0.0), GeoPoint::new(0.0, 1.0))
            + haversine_km(GeoPoint::new(0.0, 1.0), GeoPoint::new(1.0, 1.0));
        assert!((track.total_distance_km - expected).abs() < 1e-9);
    }

    #[test]
    fn name_defaults_when_absent() {
        let xml = r#"<gpx><trk><trkseg>
            <trkpt lat="1.0" lon="2.0"/>
        </trkseg></trk></gpx>"#;
        let track = parse_gpx(xml).unwrap();
        assert_eq!(track.name, "My Run");
    }

    #[test]
    fn empty_name_element_defaults_too() {
        let xml = r#"<gpx><trk><name>  </name><trkseg>
            <trkpt lat="1.0" lon="2.0"/>
        </trkseg></trk></gpx>"#;
        let track = parse_gpx(xml).unwrap();
        assert_eq!(track.name, "My Run");
    }

    #[test]
    fn name_resolves_entities() {
        let xml = r#"<gpx><trk><name>Run &amp; Ride</name><trkseg>
            <trkpt lat="1.0" lon="2.0"/>
        </trkseg></trk></gpx>"#;
        let track = parse_gpx(xml).unwrap();
        assert_eq!(track.name, "Run & Ride");
    }

    #[test]
    fn points_missing_coordinates_are_skipped() {
        let xml = r#"<gpx><trk><trkseg>
            <trkpt lat="1.0" lon="2.0"/>
            <trkpt lat="1.1"/>
            <trkpt lon="2.1"/>
            <trkpt/>
            <trkpt lat="1.2" lon="2.2"><time>2023-06-01T10:00:00Z</time></trkpt>
        </trkseg></trk></gpx>"#;
        let track = parse_gpx(xml).unwrap();
        assert_eq!(track.points.len(), 2);
        assert_eq!(track.points[1], GeoPoint::new(1.2, 2.2));
    }

    #[test]
    fn non_numeric_coordinates_are_skipped() {
        let xml = r#"<gpx><trk><trkseg>
            <trkpt lat="abc" lon="2.0"/>
            <trkpt lat="1.0" lon="2.0"/>
        </trkseg></trk></gpx>"#;
        let track = parse_gpx(xml).unwrap();
        assert_eq!(track.points.len(), 1);
    }

    #[test]
    fn out_of_range_coordinates_are_kept_as_is() {
        let xml = r#"<gpx><trk><trkseg>
            <trkpt lat="123.0" lon="-361.5"/>
        </trkseg></trk></gpx>"#;
        let track = parse_gpx(xml).unwrap();
        assert_eq!(track.points, vec![GeoPoint::new(123.0, -361.5)]);
    }

    #[test]
    fn empty_input_is_a_parse_error() {
        assert!(matches!(parse_gpx(""), Err(AppError::GpxParsing(_))));
        assert!(matches!(parse_gpx("   \n"), Err(AppError::GpxParsing(_))));
    }

    #[test]
    fn text_without_markup_is_a_parse_error() {
        assert!(matches!(
            parse_gpx("this is not xml"),
            Err(AppError::GpxParsing(_))
        ));
    }

    #[test]
    fn mismatched_tags_are_a_parse_error() {
        let xml = r#"<gpx><trk><trkseg></trk></gpx>"#;
        assert!(matches!(parse_gpx(xml), Err(AppError::GpxParsing(_))));
    }

    #[test]
    fn valid_gpx_with_no_points_yields_an_empty_track() {
        let track = parse_gpx(r#"<gpx version="1.1"><trk><trkseg></trkseg></trk></gpx>"#).unwrap();
        assert!(track.points.is_empty());
        assert_eq!(track.total_distance_km, 0.0);
        assert_eq!(track.total_duration, "00:00:00");
        assert_eq!(track.date, "");
    }

    #[test]
    fn segments_and_tracks_are_flattened_in_order() {
        let xml = r#"<gpx>
  <trk>
    <trkseg>
      <trkpt lat="1.0" lon="1.0"/>
      <trkpt lat="2.0" lon="2.0"/>
    </trkseg>
    <trkseg>
      <trkpt lat="3.0" lon="3.0"/>
    </trkseg>
  </trk>
  <trk>
    <trkseg>
      <trkpt lat="4.0" lon="4.0"/>
    </trkseg>
  </trk>
</gpx>"#;
        let track = parse_gpx(xml).unwrap();
        let lats: Vec<f64> = track.points.iter().map(|p| p.lat).collect();
        assert_eq!(lats, vec![1.0, 2.0, 3.0, 4.0]);
    }

    #[test]
    fn duration_spans_first_to_last_timestamp() {
        let xml = r#"<gpx><trk><trkseg>
            <trkpt lat="0.0" lon="0.0"><time>2023-01-01T00:00:00Z</time></trkpt>
            <trkpt lat="0.1" lon="0.1"/>
            <trkpt lat="0.2" lon="0.2"><time>2023-01-01T01:15:30Z</time></trkpt>
        </trkseg></trk></gpx>"#;
        let track = parse_gpx(xml).unwrap();
        assert_eq!(track.total_duration, "01:15:30");
    }

    #[test]
    fn duration_hours_do_not_wrap_at_24() {
        let xml = r#"<gpx><trk><trkseg>
            <trkpt lat="0.0" lon="0.0"><time>2023-01-01T00:00:00Z</time></trkpt>
            <trkpt lat="0.1" lon="0.1"><time>2023-01-02T02:00:05Z</time></trkpt>
        </trkseg></trk></gpx>"#;
        let track = parse_gpx(xml).unwrap();
        assert_eq!(track.total_duration, "26:00:05");
    }

    #[test]
    fn missing_last_timestamp_zeroes_the_duration() {
        let xml = r#"<gpx><trk><trkseg>
            <trkpt lat="0.0" lon="0.0"><time>2023-01-01T00:00:00Z</time></trkpt>
            <trkpt lat="0.1" lon="0.1"/>
        </trkseg></trk></gpx>"#;
        let track = parse_gpx(xml).unwrap();
        assert_eq!(track.total_duration, "00:00:00");
        // The date still comes from the first point.
        assert_eq!(track.date, "2023-01-01");
    }

    #[test]
    fn unparsable_timestamp_is_treated_as_absent() {
        let xml = r#"<gpx><trk><trkseg>
            <trkpt lat="0.0" lon="0.0"><time>yesterday</time></trkpt>
            <trkpt lat="0.1" lon="0.1"><time>2023-01-01T01:00:00Z</time></trkpt>
        </trkseg></trk></gpx>"#;
        let track = parse_gpx(xml).unwrap();
        assert_eq!(track.date, "");
        assert_eq!(track.total_duration, "00:00:00");
    }

    #[test]
    fn elevation_and_extensions_are_tolerated() {
        let xml = r#"<gpx><trk><trkseg>
            <trkpt lat="1.0" lon="2.0">
              <ele>410.3</ele>
              <extensions><hr>150</hr></extensions>
              <time>2023-01-01T00:00:00Z</time>
            </trkpt>
        </trkseg></trk></gpx>"#;
        let track = parse_gpx(xml).unwrap();
        assert_eq!(track.points.len(), 1);
        assert_eq!(track.date, "2023-01-01");
    }

    #[test]
    fn format_hms_clamps_negative_spans() {
        assert_eq!(format_hms(time::Duration::seconds(-30)), "00:00:00");
        assert_eq!(format_hms(time::Duration::seconds(3661)), "01:01:01");
    }
}
