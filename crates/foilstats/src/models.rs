use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

/// A GPS fix in degrees. Serialized as a `[lat, lng]` pair, the way activity
/// providers ship their `latlng` streams.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(from = "(f64, f64)", into = "(f64, f64)")]
pub struct Position {
    pub lat: f64,
    pub lng: f64,
}

impl Position {
    pub const fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }
}

impl From<(f64, f64)> for Position {
    fn from((lat, lng): (f64, f64)) -> Self {
        Self { lat, lng }
    }
}

impl From<Position> for (f64, f64) {
    fn from(p: Position) -> Self {
        (p.lat, p.lng)
    }
}

impl From<Position> for geo::Point<f64> {
    fn from(p: Position) -> Self {
        geo::Point::new(p.lng, p.lat)
    }
}

/// Parallel, index-aligned sample streams of one recorded session.
///
/// `time` is seconds since the start of the recording, `speed` is m/s and
/// `distance` is cumulative meters. Optional streams may be shorter than the
/// required ones; consumers check coverage before indexing.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SampleSeries {
    pub time: Vec<f64>,
    pub speed: Vec<f64>,
    pub distance: Vec<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub heartrate: Option<Vec<f64>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub latlng: Option<Vec<Position>>,
}

impl SampleSeries {
    /// Number of samples usable for run detection: the shortest required stream.
    pub fn len(&self) -> usize {
        self.time
            .len()
            .min(self.speed.len())
            .min(self.distance.len())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Heartrate stream, only if it covers `index`.
    pub fn heartrate_covering(&self, index: usize) -> Option<&[f64]> {
        self.heartrate.as_deref().filter(|hr| hr.len() > index)
    }

    /// Position stream, only if it covers `index`.
    pub fn latlng_covering(&self, index: usize) -> Option<&[Position]> {
        self.latlng.as_deref().filter(|p| p.len() > index)
    }

    pub fn has_heartrate(&self) -> bool {
        self.heartrate.as_ref().is_some_and(|hr| hr.iter().any(|&v| v > 0.0))
    }

    /// Elapsed seconds between the first and last sample.
    pub fn elapsed(&self) -> f64 {
        match (self.time.first(), self.time.last()) {
            (Some(first), Some(last)) => last - first,
            _ => 0.0,
        }
    }

    /// Final cumulative distance in meters.
    pub fn total_distance(&self) -> f64 {
        self.distance.last().copied().unwrap_or(0.0)
    }
}

/// A contiguous interval of riding above the speed threshold.
///
/// Speeds are km/h rounded to one decimal, heartrates bpm, times seconds
/// since the recording start, distance meters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Run {
    /// Ordinal within the session, starting at 1.
    pub id: u32,
    pub start_index: usize,
    pub end_index: usize,
    pub start_time: f64,
    pub end_time: f64,
    pub duration: f64,
    pub distance: f64,
    pub average_speed: f64,
    pub max_speed: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub average_heartrate: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_heartrate: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_heartrate: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_heartrate: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_position: Option<Position>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_position: Option<Position>,
}

/// Aggregate statistics over the runs of one session.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionStats {
    pub number_of_runs: usize,
    pub total_riding_time: f64,
    pub total_riding_distance: f64,
    pub average_run_duration: f64,
    pub average_run_distance: f64,
    pub longest_run_duration: f64,
    pub longest_run_distance: f64,
    pub best_average_speed: f64,
    pub best_max_speed: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub average_heartrate: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_heartrate: Option<f64>,
}

/// Percentage change of the five most recent sessions against the five before.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecentTrend {
    pub run_duration: f64,
    pub run_distance: f64,
    pub runs_per_session: f64,
}

/// Totals and bests across every session.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressStats {
    pub total_sessions: usize,
    pub total_runs: usize,
    pub total_riding_time: f64,
    pub total_riding_distance: f64,
    pub average_runs_per_session: f64,
    pub average_run_duration: f64,
    pub average_run_distance: f64,
    pub best_run_duration: f64,
    pub best_run_distance: f64,
    pub best_max_speed: f64,
    pub recent_trend: RecentTrend,
}

/// A detected direction change while riding.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Jibe {
    pub index: usize,
    pub position: Position,
    pub time: f64,
    pub heading_before: f64,
    pub heading_after: f64,
    /// Shorter arc between the two headings, 0-180 degrees.
    pub angle_change: f64,
}

impl Jibe {
    pub fn size(&self) -> JibeSize {
        JibeSize::from_angle(self.angle_change)
    }
}

/// Display bucket for a jibe, by turn angle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JibeSize {
    Small,
    Medium,
    Large,
}

impl JibeSize {
    pub fn from_angle(angle_change: f64) -> Self {
        if angle_change < 90.0 {
            JibeSize::Small
        } else if angle_change < 135.0 {
            JibeSize::Medium
        } else {
            JibeSize::Large
        }
    }

    /// Marker color used by map views.
    pub fn color(self) -> &'static str {
        match self {
            JibeSize::Small => "#22c55e",
            JibeSize::Medium => "#eab308",
            JibeSize::Large => "#ef4444",
        }
    }
}

/// An analyzed recording: its runs and stats, plus the raw streams so it can
/// be reprocessed when the detection config changes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    pub id: String,
    pub name: String,
    #[serde(with = "time::serde::rfc3339")]
    pub date: OffsetDateTime,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    /// Elapsed seconds of the whole recording.
    pub total_duration: f64,
    /// Meters covered during the whole recording.
    pub total_distance: f64,
    pub runs: Vec<Run>,
    pub stats: SessionStats,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub raw_data: Option<SampleSeries>,
}

/// A riding location, grouped from session start positions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Spot {
    pub id: String,
    pub name: String,
    pub coordinates: Position,
    pub sessions_count: usize,
    pub total_duration: f64,
    pub best_speed: f64,
    pub avg_runs_per_session: f64,
    #[serde(with = "time::serde::rfc3339")]
    pub last_visit: OffsetDateTime,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_position_serializes_as_pair() {
        let json = serde_json::to_string(&Position::new(43.5, -1.25)).unwrap();
        assert_eq!(json, "[43.5,-1.25]");

        let back: Position = serde_json::from_str("[10.0, 20.0]").unwrap();
        assert_eq!(back, Position::new(10.0, 20.0));
    }

    #[test]
    fn test_series_len_uses_shortest_required_stream() {
        let series = SampleSeries {
            time: vec![0.0, 1.0, 2.0],
            speed: vec![1.0, 2.0],
            distance: vec![0.0, 1.0, 2.0, 3.0],
            ..Default::default()
        };
        assert_eq!(series.len(), 2);
        assert!(!series.is_empty());
        assert!(SampleSeries::default().is_empty());
    }

    #[test]
    fn test_optional_stream_coverage() {
        let series = SampleSeries {
            heartrate: Some(vec![120.0, 0.0, 130.0]),
            ..Default::default()
        };
        assert!(series.heartrate_covering(2).is_some());
        assert!(series.heartrate_covering(3).is_none());
        assert!(series.latlng_covering(0).is_none());
        assert!(series.has_heartrate());
    }

    #[test]
    fn test_jibe_size_buckets() {
        assert_eq!(JibeSize::from_angle(60.0), JibeSize::Small);
        assert_eq!(JibeSize::from_angle(89.9), JibeSize::Small);
        assert_eq!(JibeSize::from_angle(90.0), JibeSize::Medium);
        assert_eq!(JibeSize::from_angle(134.9), JibeSize::Medium);
        assert_eq!(JibeSize::from_angle(135.0), JibeSize::Large);
        assert_eq!(JibeSize::Large.color(), "#ef4444");
    }

    #[test]
    fn test_run_omits_absent_optional_fields() {
        let run = Run {
            id: 1,
            start_index: 0,
            end_index: 4,
            start_time: 0.0,
            end_time: 4.0,
            duration: 4.0,
            distance: 20.0,
            average_speed: 18.0,
            max_speed: 19.2,
            average_heartrate: None,
            max_heartrate: None,
            start_heartrate: None,
            end_heartrate: None,
            start_position: None,
            end_position: None,
        };
        let value = serde_json::to_value(&run).unwrap();
        assert_eq!(value["averageSpeed"], 18.0);
        assert!(value.get("averageHeartrate").is_none());
        assert!(value.get("startPosition").is_none());
    }
}
