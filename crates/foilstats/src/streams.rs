//! Activity provider stream payloads (`key_by_type` stream responses).
//!
//! A response carries one object per stream type. Run detection needs
//! `time`, `velocity_smooth` and `distance`; `heartrate` and `latlng` are
//! optional and `altitude` is carried through untouched.

use serde::{Deserialize, Serialize};
use thiserror::Error;
use time::OffsetDateTime;

use crate::models::{Position, SampleSeries};

/// Activity types imported as foiling sessions.
pub const FOIL_ACTIVITY_TYPES: [&str; 3] = ["Kitesurf", "Kitesurfing", "Kitesurf Session"];

#[derive(Debug, Error)]
pub enum StreamError {
    #[error("Missing required stream: {0}")]
    MissingStream(&'static str),

    #[error("Malformed stream payload: {0}")]
    Json(#[from] serde_json::Error),
}

/// One stream of a response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Stream<T> {
    pub data: Vec<T>,
    #[serde(default)]
    pub series_type: String,
    #[serde(default)]
    pub original_size: usize,
    #[serde(default)]
    pub resolution: String,
}

impl<T> Stream<T> {
    pub fn new(data: Vec<T>) -> Self {
        let original_size = data.len();
        Self {
            data,
            series_type: "time".to_string(),
            original_size,
            resolution: "high".to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StreamsResponse {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time: Option<Stream<f64>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub distance: Option<Stream<f64>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub velocity_smooth: Option<Stream<f64>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub heartrate: Option<Stream<f64>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub altitude: Option<Stream<f64>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub latlng: Option<Stream<Position>>,
}

impl StreamsResponse {
    /// Converts to a sample series, failing if a required stream is absent.
    pub fn into_series(self) -> Result<SampleSeries, StreamError> {
        let time = self.time.ok_or(StreamError::MissingStream("time"))?;
        let speed = self
            .velocity_smooth
            .ok_or(StreamError::MissingStream("velocity_smooth"))?;
        let distance = self.distance.ok_or(StreamError::MissingStream("distance"))?;

        Ok(SampleSeries {
            time: time.data,
            speed: speed.data,
            distance: distance.data,
            heartrate: self.heartrate.map(|s| s.data),
            latlng: self.latlng.map(|s| s.data),
        })
    }

    pub fn from_series(series: &SampleSeries) -> Self {
        Self {
            time: Some(Stream::new(series.time.clone())),
            distance: Some(Stream::new(series.distance.clone())),
            velocity_smooth: Some(Stream::new(series.speed.clone())),
            heartrate: series.heartrate.clone().map(Stream::new),
            altitude: None,
            latlng: series.latlng.clone().map(Stream::new),
        }
    }
}

/// Parses a streams JSON document into a sample series.
pub fn parse_streams(json: &str) -> Result<SampleSeries, StreamError> {
    let response: StreamsResponse = serde_json::from_str(json)?;
    response.into_series()
}

/// Activity summary as listed by the provider.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActivitySummary {
    pub id: u64,
    pub name: String,
    #[serde(rename = "type")]
    pub activity_type: String,
    #[serde(default)]
    pub sport_type: String,
    #[serde(with = "time::serde::rfc3339")]
    pub start_date: OffsetDateTime,
    /// Meters.
    #[serde(default)]
    pub distance: f64,
    /// Seconds.
    #[serde(default)]
    pub elapsed_time: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_latlng: Option<Position>,
}

impl ActivitySummary {
    pub fn is_foil_activity(&self) -> bool {
        is_foil_activity(&self.activity_type, &self.sport_type)
    }

    pub fn session_id(&self) -> String {
        format!("session_{}", self.id)
    }
}

/// Whether an activity of this `type` / `sport_type` is a foiling session.
pub fn is_foil_activity(activity_type: &str, sport_type: &str) -> bool {
    FOIL_ACTIVITY_TYPES.contains(&activity_type) || FOIL_ACTIVITY_TYPES.contains(&sport_type)
}

#[cfg(test)]
mod tests {
    use super::*;

    const PAYLOAD: &str = r#"{
        "time": {"data": [0, 1, 2, 3], "series_type": "time", "original_size": 4, "resolution": "high"},
        "distance": {"data": [0.0, 4.5, 9.1, 13.8], "series_type": "time", "original_size": 4, "resolution": "high"},
        "velocity_smooth": {"data": [4.4, 4.5, 4.6, 4.7], "series_type": "time", "original_size": 4, "resolution": "high"},
        "heartrate": {"data": [120, 125, 130, 128], "series_type": "time", "original_size": 4, "resolution": "high"},
        "latlng": {"data": [[36.01, -5.6], [36.0101, -5.6], [36.0102, -5.6], [36.0103, -5.6]], "series_type": "time", "original_size": 4, "resolution": "high"}
    }"#;

    #[test]
    fn test_parse_streams() {
        let series = parse_streams(PAYLOAD).unwrap();
        assert_eq!(series.len(), 4);
        assert_eq!(series.time, vec![0.0, 1.0, 2.0, 3.0]);
        assert_eq!(series.speed[2], 4.6);
        assert_eq!(series.heartrate.as_ref().unwrap()[3], 128.0);
        assert_eq!(series.latlng.as_ref().unwrap()[1], Position::new(36.0101, -5.6));
    }

    #[test]
    fn test_optional_streams_and_metadata_may_be_absent() {
        let series = parse_streams(
            r#"{"time": {"data": [0, 1]}, "distance": {"data": [0, 3]}, "velocity_smooth": {"data": [3, 3]}}"#,
        )
        .unwrap();
        assert_eq!(series.len(), 2);
        assert!(series.heartrate.is_none());
        assert!(series.latlng.is_none());
    }

    #[test]
    fn test_missing_required_stream() {
        let err = parse_streams(r#"{"time": {"data": [0, 1]}, "distance": {"data": [0, 3]}}"#)
            .unwrap_err();
        assert!(matches!(err, StreamError::MissingStream("velocity_smooth")));

        let err = parse_streams("not json").unwrap_err();
        assert!(matches!(err, StreamError::Json(_)));
    }

    #[test]
    fn test_from_series_keeps_optional_streams() {
        let series = parse_streams(PAYLOAD).unwrap();
        let response = StreamsResponse::from_series(&series);
        assert_eq!(response.time.as_ref().unwrap().original_size, 4);
        assert!(response.altitude.is_none());
        assert_eq!(response.into_series().unwrap(), series);
    }

    #[test]
    fn test_written_streams_read_back_exactly() {
        // values with 16-17 significant digits, as integrated speeds produce
        let n = 500;
        let series = SampleSeries {
            time: (0..n).map(|i| i as f64).collect(),
            speed: (0..n).map(|i| 0.95 + (i as f64 * 0.731).sin() / 3.0).collect(),
            distance: (0..n).map(|i| i as f64 * 5.123456789 / 7.0).collect(),
            heartrate: None,
            latlng: Some(
                (0..n)
                    .map(|i| Position::new(36.0189 + i as f64 * 1e-5 / 3.0, -5.6272 - i as f64 * 1e-5 / 7.0))
                    .collect(),
            ),
        };

        let json = serde_json::to_string(&StreamsResponse::from_series(&series)).unwrap();
        assert_eq!(parse_streams(&json).unwrap(), series);
    }

    #[test]
    fn test_foil_activity_filter() {
        assert!(is_foil_activity("Kitesurf", "Kitesurf"));
        assert!(is_foil_activity("Workout", "Kitesurf Session"));
        assert!(!is_foil_activity("Windsurf", "Windsurf"));
        assert!(!is_foil_activity("kitesurf", ""));

        let activity: ActivitySummary = serde_json::from_str(
            r#"{"id": 42, "name": "Evening wing", "type": "Kitesurf", "sport_type": "Kitesurf",
                "start_date": "2024-07-01T17:30:00Z", "distance": 12000.5, "elapsed_time": 5400}"#,
        )
        .unwrap();
        assert!(activity.is_foil_activity());
        assert_eq!(activity.session_id(), "session_42");
        assert_eq!(activity.elapsed_time, 5400.0);
    }
}
