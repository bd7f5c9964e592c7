//! Building and reprocessing session records.

use time::OffsetDateTime;
use tracing::{info, warn};

use crate::config::{JibeConfig, RunDetectionConfig};
use crate::jibe_detection::detect_series_jibes;
use crate::models::{Jibe, Position, SampleSeries, Session};
use crate::run_detection::detect_runs;
use crate::session_stats::calculate_session_stats;
use crate::streams::ActivitySummary;

/// Descriptive fields of a session that do not come from its streams.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionMeta {
    pub id: String,
    pub name: String,
    pub date: OffsetDateTime,
    pub location: Option<String>,
    /// Elapsed seconds as reported by the source; the series span otherwise.
    pub total_duration: Option<f64>,
    /// Meters as reported by the source; the final distance sample otherwise.
    pub total_distance: Option<f64>,
}

impl SessionMeta {
    pub fn new(id: impl Into<String>, name: impl Into<String>, date: OffsetDateTime) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            date,
            location: None,
            total_duration: None,
            total_distance: None,
        }
    }
}

impl From<&ActivitySummary> for SessionMeta {
    fn from(activity: &ActivitySummary) -> Self {
        Self {
            id: activity.session_id(),
            name: activity.name.clone(),
            date: activity.start_date,
            location: None,
            total_duration: Some(activity.elapsed_time),
            total_distance: Some(activity.distance),
        }
    }
}

impl Session {
    /// Detects runs in `series` and builds the session record, keeping the
    /// series as raw data for later reprocessing.
    ///
    /// Returns `None` when no runs are found; such recordings are not
    /// imported.
    pub fn from_series(meta: SessionMeta, series: SampleSeries, config: &RunDetectionConfig) -> Option<Session> {
        let runs = detect_runs(&series, config);
        if runs.is_empty() {
            warn!("No runs detected in session {}", meta.id);
            return None;
        }

        let stats = calculate_session_stats(&runs);
        info!(
            "Session {}: {} runs, {:.0}s riding over {:.0}m",
            meta.id, stats.number_of_runs, stats.total_riding_time, stats.total_riding_distance
        );

        Some(Session {
            total_duration: meta.total_duration.unwrap_or_else(|| series.elapsed()),
            total_distance: meta.total_distance.unwrap_or_else(|| series.total_distance()),
            id: meta.id,
            name: meta.name,
            date: meta.date,
            location: meta.location,
            runs,
            stats,
            raw_data: Some(series),
        })
    }

    /// Re-runs detection with a new config. Returns `false`, leaving the
    /// session untouched, when it has no raw data. A reprocessed session may
    /// end up with no runs.
    pub fn reprocess(&mut self, config: &RunDetectionConfig) -> bool {
        let Some(series) = self.raw_data.as_ref() else {
            warn!("Session {} has no raw data to reprocess", self.id);
            return false;
        };

        self.runs = detect_runs(series, config);
        self.stats = calculate_session_stats(&self.runs);
        true
    }

    /// Jibes over the session's raw data; none without positions.
    pub fn jibes(&self, config: &JibeConfig) -> Vec<Jibe> {
        self.raw_data
            .as_ref()
            .map(|series| detect_series_jibes(series, config))
            .unwrap_or_default()
    }

    /// Position of the first GPS fix, used to place the session at a spot.
    pub fn start_position(&self) -> Option<Position> {
        self.raw_data
            .as_ref()
            .and_then(|s| s.latlng.as_ref())
            .and_then(|p| p.first().copied())
    }
}
