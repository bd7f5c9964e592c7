//! Activity file parsers for GPX, TCX, FIT and streams JSON.
//!
//! Every format is reduced to the same 1-D sample series. Points without a
//! position or a timestamp are skipped. Files that carry no distance or
//! speed get them derived from the positions.

use bytes::Buf as _;
use bytes::Bytes;
use geo::{Distance as _, Haversine};
use std::io::BufReader;
use std::path::Path;
use time::OffsetDateTime;
use tracing::{debug, warn};

use crate::errors::AppError;
use crate::models::{Position, SampleSeries};
use crate::streams::{StreamError, parse_streams};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileType {
    Gpx,
    Tcx,
    Fit,
    /// Provider streams JSON.
    Streams,
    Other,
}

impl FileType {
    /// Sniffs the format from the file contents.
    pub fn detect_from_bytes(bytes: &[u8]) -> FileType {
        if bytes.len() >= 12 && &bytes[8..12] == b".FIT" {
            return FileType::Fit;
        }

        let head = &bytes[..bytes.len().min(1024)];
        let text = String::from_utf8_lossy(head);
        if text.trim_start().starts_with('{') {
            FileType::Streams
        } else if text.contains("TrainingCenterDatabase") {
            FileType::Tcx
        } else if text.contains("<gpx") {
            FileType::Gpx
        } else {
            FileType::Other
        }
    }

    pub fn from_extension(ext: &str) -> FileType {
        match ext.to_ascii_lowercase().as_str() {
            "gpx" => FileType::Gpx,
            "tcx" => FileType::Tcx,
            "fit" => FileType::Fit,
            "json" => FileType::Streams,
            _ => FileType::Other,
        }
    }
}

/// Result of parsing an activity file.
#[derive(Debug, Clone)]
pub struct ParsedActivity {
    pub series: SampleSeries,
    /// Timestamp of the first sample, when the format records one.
    pub started_at: Option<OffsetDateTime>,
    pub name: Option<String>,
}

#[derive(Debug, thiserror::Error)]
pub enum ParseError {
    #[error("Failed to parse GPX file: {0}")]
    Gpx(String),
    #[error("Failed to parse TCX file: {0}")]
    Tcx(String),
    #[error("Failed to parse FIT file: {0}")]
    Fit(String),
    #[error(transparent)]
    Streams(#[from] StreamError),
    #[error("Unsupported file type: {0:?}")]
    UnsupportedFileType(FileType),
}

/// Parses an activity file. For `FileType::Other` the format is detected
/// from the bytes.
pub fn parse_activity_file(file_type: FileType, bytes: Bytes) -> Result<ParsedActivity, ParseError> {
    let actual_type = if file_type == FileType::Other {
        FileType::detect_from_bytes(&bytes)
    } else {
        file_type
    };

    match actual_type {
        FileType::Gpx => parse_gpx(bytes),
        FileType::Tcx => parse_tcx(bytes),
        FileType::Fit => parse_fit(bytes),
        FileType::Streams => {
            let json = String::from_utf8_lossy(&bytes);
            Ok(ParsedActivity {
                series: parse_streams(&json)?,
                started_at: None,
                name: None,
            })
        }
        FileType::Other => Err(ParseError::UnsupportedFileType(actual_type)),
    }
}

/// Reads and parses an activity file from disk. The format comes from the
/// extension, or from the contents when the extension is unknown.
pub fn read_activity_file(path: &Path) -> Result<ParsedActivity, AppError> {
    let file_type = path
        .extension()
        .and_then(|e| e.to_str())
        .map_or(FileType::Other, FileType::from_extension);
    let bytes = std::fs::read(path)?;
    debug!("Read {} bytes from {} as {file_type:?}", bytes.len(), path.display());
    Ok(parse_activity_file(file_type, Bytes::from(bytes))?)
}

/// One timestamped fix before conversion to parallel streams.
#[derive(Debug, Clone, Copy)]
struct RawSample {
    position: Position,
    timestamp: OffsetDateTime,
    heartrate: Option<f64>,
    /// m/s
    speed: Option<f64>,
    /// Cumulative meters.
    distance: Option<f64>,
}

impl RawSample {
    fn at(position: Position, timestamp: OffsetDateTime) -> Self {
        Self {
            position,
            timestamp,
            heartrate: None,
            speed: None,
            distance: None,
        }
    }
}

/// Converts fixes into index-aligned streams.
///
/// Recorded distance and speed are used only when every sample has them.
/// Heartrate is kept when any sample has it, with gaps recorded as 0.
fn build_series(samples: &[RawSample]) -> SampleSeries {
    let Some(first) = samples.first() else {
        return SampleSeries::default();
    };

    let time: Vec<f64> = samples
        .iter()
        .map(|s| (s.timestamp - first.timestamp).as_seconds_f64())
        .collect();

    let distance: Vec<f64> = if samples.iter().all(|s| s.distance.is_some()) {
        samples.iter().map(|s| s.distance.unwrap_or_default()).collect()
    } else {
        let mut covered = 0.0;
        let mut prev: Option<Position> = None;
        samples
            .iter()
            .map(|s| {
                if let Some(p) = prev {
                    covered += Haversine.distance(geo::Point::from(p), geo::Point::from(s.position));
                }
                prev = Some(s.position);
                covered
            })
            .collect()
    };

    let speed: Vec<f64> = if samples.iter().all(|s| s.speed.is_some()) {
        samples.iter().map(|s| s.speed.unwrap_or_default()).collect()
    } else {
        derive_speed(&time, &distance)
    };

    let heartrate = samples
        .iter()
        .any(|s| s.heartrate.is_some())
        .then(|| samples.iter().map(|s| s.heartrate.unwrap_or(0.0)).collect());

    SampleSeries {
        time,
        speed,
        distance,
        heartrate,
        latlng: Some(samples.iter().map(|s| s.position).collect()),
    }
}

/// Speed from consecutive distance and time deltas, m/s. A non-positive
/// time step repeats the previous speed; the first sample takes the second's.
fn derive_speed(time: &[f64], distance: &[f64]) -> Vec<f64> {
    if time.is_empty() {
        return Vec::new();
    }
    let mut speed = Vec::with_capacity(time.len());
    let mut last = 0.0;
    speed.push(0.0);
    for i in 1..time.len().min(distance.len()) {
        let dt = time[i] - time[i - 1];
        if dt > 0.0 {
            last = (distance[i] - distance[i - 1]) / dt;
        }
        speed.push(last);
    }
    if speed.len() > 1 {
        speed[0] = speed[1];
    }
    speed
}

fn finish(samples: Vec<RawSample>, skipped: usize, name: Option<String>, format: &str) -> ParsedActivity {
    if skipped > 0 {
        warn!("Skipped {skipped} {format} points without position or timestamp");
    }
    debug!("Parsed {} {format} samples", samples.len());
    ParsedActivity {
        started_at: samples.first().map(|s| s.timestamp),
        series: build_series(&samples),
        name,
    }
}

/// Parse a GPX file. Speed and distance are derived from the track.
pub fn parse_gpx(bytes: Bytes) -> Result<ParsedActivity, ParseError> {
    let gpx = gpx::read(bytes.reader()).map_err(|e| ParseError::Gpx(e.to_string()))?;

    let mut samples = Vec::new();
    let mut skipped = 0;

    for track in &gpx.tracks {
        for seg in &track.segments {
            for pt in &seg.points {
                let timestamp = pt.time.as_ref().and_then(|t| {
                    t.format().ok().and_then(|s| {
                        OffsetDateTime::parse(&s, &time::format_description::well_known::Rfc3339)
                            .ok()
                    })
                });
                let Some(timestamp) = timestamp else {
                    skipped += 1;
                    continue;
                };
                let position = Position::new(pt.point().y(), pt.point().x());
                samples.push(RawSample::at(position, timestamp));
            }
        }
    }

    let name = gpx
        .metadata
        .as_ref()
        .and_then(|m| m.name.clone())
        .or_else(|| gpx.tracks.iter().find_map(|t| t.name.clone()));

    Ok(finish(samples, skipped, name, "GPX"))
}

/// Parse a TCX (Training Center XML) file.
pub fn parse_tcx(bytes: Bytes) -> Result<ParsedActivity, ParseError> {
    let cursor = std::io::Cursor::new(bytes.to_vec());
    let mut buf_reader = BufReader::new(cursor);

    let tcx_data = tcx::read(&mut buf_reader).map_err(|e| ParseError::Tcx(format!("{e:?}")))?;

    let mut samples = Vec::new();
    let mut skipped = 0;

    if let Some(ref activities) = tcx_data.activities {
        for activity in &activities.activities {
            for lap in &activity.laps {
                for track in &lap.tracks {
                    for trackpoint in &track.trackpoints {
                        let Some(ref position) = trackpoint.position else {
                            skipped += 1;
                            continue;
                        };

                        let mut sample = RawSample::at(
                            Position::new(position.latitude, position.longitude),
                            chrono_to_offset_datetime_utc(&trackpoint.time),
                        );
                        sample.heartrate = trackpoint.heart_rate.as_ref().map(|h| h.value as f64);
                        sample.distance = trackpoint.distance_meters;
                        samples.push(sample);
                    }
                }
            }
        }
    }

    Ok(finish(samples, skipped, None, "TCX"))
}

fn chrono_to_offset_datetime_utc(dt: &chrono::DateTime<chrono::Utc>) -> OffsetDateTime {
    let ts = dt.timestamp();
    let ns = dt.timestamp_subsec_nanos();

    OffsetDateTime::from_unix_timestamp(ts)
        .map(|odt| odt.replace_nanosecond(ns).unwrap_or(odt))
        .unwrap_or(OffsetDateTime::UNIX_EPOCH)
}

fn chrono_to_offset_datetime_local(dt: &chrono::DateTime<chrono::Local>) -> OffsetDateTime {
    chrono_to_offset_datetime_utc(&dt.with_timezone(&chrono::Utc))
}

/// Parse a FIT file's record messages.
pub fn parse_fit(bytes: Bytes) -> Result<ParsedActivity, ParseError> {
    let data = bytes.to_vec();
    let fit_data = fitparser::from_bytes(&data).map_err(|e| ParseError::Fit(e.to_string()))?;

    let mut samples = Vec::new();
    let mut skipped = 0;

    for record in fit_data {
        if record.kind() != fitparser::profile::field_types::MesgNum::Record {
            continue;
        }

        let mut lat: Option<f64> = None;
        let mut lon: Option<f64> = None;
        let mut timestamp: Option<OffsetDateTime> = None;
        let mut heartrate: Option<f64> = None;
        let mut speed: Option<f64> = None;
        let mut distance: Option<f64> = None;

        for field in record.fields() {
            match field.name() {
                "position_lat" => {
                    if let fitparser::Value::SInt32(v) = field.value() {
                        lat = Some(semicircles_to_degrees(*v));
                    }
                }
                "position_long" => {
                    if let fitparser::Value::SInt32(v) = field.value() {
                        lon = Some(semicircles_to_degrees(*v));
                    }
                }
                "timestamp" => {
                    if let fitparser::Value::Timestamp(t) = field.value() {
                        timestamp = Some(chrono_to_offset_datetime_local(t));
                    }
                }
                "heart_rate" => heartrate = extract_fit_f64(field.value()),
                // enhanced_speed supersedes speed when both are present
                "enhanced_speed" => speed = extract_fit_f64(field.value()),
                "speed" => speed = speed.or(extract_fit_f64(field.value())),
                "distance" => distance = extract_fit_f64(field.value()),
                _ => {}
            }
        }

        match (lat, lon, timestamp) {
            (Some(lat), Some(lon), Some(timestamp)) => samples.push(RawSample {
                position: Position::new(lat, lon),
                timestamp,
                heartrate,
                speed,
                distance,
            }),
            _ => skipped += 1,
        }
    }

    Ok(finish(samples, skipped, None, "FIT"))
}

/// FIT stores coordinates as semicircles: 2^31 semicircles = 180 degrees.
fn semicircles_to_degrees(semicircles: i32) -> f64 {
    (semicircles as f64) * (180.0 / 2_147_483_648.0)
}

fn extract_fit_f64(value: &fitparser::Value) -> Option<f64> {
    match value {
        fitparser::Value::Float32(v) => Some(*v as f64),
        fitparser::Value::Float64(v) => Some(*v),
        fitparser::Value::SInt8(v) => Some(*v as f64),
        fitparser::Value::UInt8(v) => Some(*v as f64),
        fitparser::Value::SInt16(v) => Some(*v as f64),
        fitparser::Value::UInt16(v) => Some(*v as f64),
        fitparser::Value::SInt32(v) => Some(*v as f64),
        fitparser::Value::UInt32(v) => Some(*v as f64),
        _ => None,
    }
}
