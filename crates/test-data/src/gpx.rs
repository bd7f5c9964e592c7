//! GPX file generation from sample series.
//!
//! Writes GPX 1.1 so generated sessions can go through the same file parser
//! as real recordings. Speed, distance and heart rate are not written; a
//! reader derives speed and distance from the fixes and their timestamps.

use foilstats::SampleSeries;
use time::{Duration, OffsetDateTime};

/// Generates a GPX 1.1 XML document from the position and time streams.
///
/// Samples without a position are skipped. Each point's timestamp is
/// `started_at` plus the sample's offset.
pub fn generate_gpx(series: &SampleSeries, started_at: OffsetDateTime, activity_name: &str) -> Vec<u8> {
    let mut gpx = String::new();

    gpx.push_str(r#"<?xml version="1.0" encoding="UTF-8"?>"#);
    gpx.push('\n');
    gpx.push_str(r#"<gpx version="1.1" creator="foilstats-test-data""#);
    gpx.push_str(r#" xmlns="http://www.topografix.com/GPX/1/1""#);
    gpx.push_str(r#" xmlns:xsi="http://www.w3.org/2001/XMLSchema-instance""#);
    gpx.push_str(r#" xsi:schemaLocation="http://www.topografix.com/GPX/1/1 http://www.topografix.com/GPX/1/1/gpx.xsd">"#);
    gpx.push('\n');

    gpx.push_str("  <metadata>\n");
    gpx.push_str(&format!("    <name>{}</name>\n", escape_xml(activity_name)));
    gpx.push_str("  </metadata>\n");

    gpx.push_str("  <trk>\n");
    gpx.push_str(&format!("    <name>{}</name>\n", escape_xml(activity_name)));
    gpx.push_str("    <trkseg>\n");

    let positions = series.latlng.as_deref().unwrap_or(&[]);
    for (position, &t) in positions.iter().zip(&series.time) {
        gpx.push_str(&format!(
            r#"      <trkpt lat="{:.7}" lon="{:.7}">"#,
            position.lat, position.lng
        ));
        gpx.push('\n');

        let ts = started_at + Duration::seconds_f64(t);
        let formatted = ts
            .format(&time::format_description::well_known::Rfc3339)
            .unwrap_or_default();
        gpx.push_str(&format!("        <time>{formatted}</time>\n"));

        gpx.push_str("      </trkpt>\n");
    }

    gpx.push_str("    </trkseg>\n");
    gpx.push_str("  </trk>\n");
    gpx.push_str("</gpx>\n");

    gpx.into_bytes()
}

/// Escapes XML special characters in a string.
fn escape_xml(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&apos;")
}
