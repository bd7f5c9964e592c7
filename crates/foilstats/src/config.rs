//! Detection parameters.
//!
//! Both configs deserialize with `#[serde(default)]`, so a stored JSON file
//! only needs the fields it overrides. No bounds are enforced: degenerate
//! values (a zero threshold, a zero window) are used as given.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::errors::AppError;

/// Parameters for splitting a speed stream into runs.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RunDetectionConfig {
    /// Speed in km/h at or above which the rider counts as riding.
    pub min_speed_threshold: f64,
    /// Shortest candidate, in seconds, kept as a run.
    pub min_run_duration: f64,
    /// Seconds below threshold separating runs. Accepted but not used to
    /// merge runs: every dip below the threshold ends the current run.
    pub min_stop_duration: f64,
    /// Moving-average window over the speed stream, in samples.
    pub speed_smoothing_window: usize,
}

impl Default for RunDetectionConfig {
    fn default() -> Self {
        Self {
            min_speed_threshold: 12.0,
            min_run_duration: 10.0,
            min_stop_duration: 5.0,
            speed_smoothing_window: 3,
        }
    }
}

/// Parameters for heading-change detection.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct JibeConfig {
    /// Smallest heading change, in degrees, reported as a jibe.
    pub min_angle_change: f64,
    /// Speed in km/h below which a heading change is ignored.
    pub min_speed: f64,
    /// Circular moving-average window over raw headings, in samples.
    pub heading_smoothing_window: usize,
    /// Headings averaged on each side of a candidate index.
    pub compare_window: usize,
    /// Seconds that must pass after an accepted jibe before the next one.
    pub min_separation: f64,
    /// Fewer positions than this yields no jibes.
    pub min_positions: usize,
}

impl Default for JibeConfig {
    fn default() -> Self {
        Self {
            min_angle_change: 60.0,
            min_speed: 5.0,
            heading_smoothing_window: 5,
            compare_window: 10,
            min_separation: 5.0,
            min_positions: 10,
        }
    }
}

/// Everything a caller stores between sessions.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct AnalysisConfig {
    pub runs: RunDetectionConfig,
    pub jibes: JibeConfig,
}

impl AnalysisConfig {
    /// Reads a JSON config file, filling unspecified fields with defaults.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, AppError> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)?;
        let config: AnalysisConfig = serde_json::from_str(&contents)?;
        tracing::debug!(
            "Loaded config from {}: threshold={} km/h, min run={}s, window={}",
            path.display(),
            config.runs.min_speed_threshold,
            config.runs.min_run_duration,
            config.runs.speed_smoothing_window
        );
        Ok(config)
    }

    /// Loads `path` if given, else the file named by `FOILSTATS_CONFIG`,
    /// else the defaults.
    pub fn load(path: Option<&Path>) -> Result<Self, AppError> {
        match path {
            Some(path) => Self::from_file(path),
            None => match std::env::var("FOILSTATS_CONFIG") {
                Ok(env_path) => Self::from_file(env_path),
                Err(_) => Ok(Self::default()),
            },
        }
    }
}
