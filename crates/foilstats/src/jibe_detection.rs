//! Detects jibes from heading changes along the GPS track.
//!
//! Headings between consecutive fixes are smoothed circularly, then each
//! candidate index compares the mean heading of the `compare_window` headings
//! before it with the mean of the `compare_window` headings from it onwards.
//! A change of at least `min_angle_change` is a jibe unless the rider was
//! below `min_speed` or the previous jibe is less than `min_separation`
//! seconds old.

use tracing::debug;

use crate::config::JibeConfig;
use crate::heading::{angle_difference, headings};
use crate::models::{Jibe, JibeSize, Position, SampleSeries};
use crate::smoothing::{circular_mean, circular_moving_average, ms_to_kmh};

/// Finds jibes in a position track.
///
/// `time` is seconds per position and `speed` is m/s per position. A missing
/// speed stream (or a missing sample in a short one) disables the speed
/// filter for that index; the scan stops where `time` runs out.
pub fn detect_jibes(
    positions: &[Position],
    time: &[f64],
    speed: Option<&[f64]>,
    config: &JibeConfig,
) -> Vec<Jibe> {
    if positions.len() < config.min_positions {
        return Vec::new();
    }

    let smoothed = circular_moving_average(&headings(positions), config.heading_smoothing_window);
    let window = config.compare_window;
    let mut jibes: Vec<Jibe> = Vec::new();

    for i in window..smoothed.len().saturating_sub(window) {
        let Some(&t) = time.get(i) else {
            break;
        };

        let heading_before = circular_mean(&smoothed[i - window..i]);
        let heading_after = circular_mean(&smoothed[i..i + window]);
        let angle_change = angle_difference(heading_before, heading_after);
        if angle_change < config.min_angle_change {
            continue;
        }

        if let Some(v) = speed.and_then(|s| s.get(i))
            && ms_to_kmh(*v) < config.min_speed
        {
            continue;
        }

        if let Some(last) = jibes.last()
            && t - last.time < config.min_separation
        {
            continue;
        }

        jibes.push(Jibe {
            index: i,
            position: positions[i],
            time: t,
            heading_before,
            heading_after,
            angle_change,
        });
    }

    debug!("Detected {} jibes over {} positions", jibes.len(), positions.len());
    jibes
}

/// Jibes of a whole session; none when the series has no positions.
pub fn detect_series_jibes(series: &SampleSeries, config: &JibeConfig) -> Vec<Jibe> {
    match series.latlng.as_deref() {
        Some(positions) => detect_jibes(
            positions,
            &series.time,
            (!series.speed.is_empty()).then_some(series.speed.as_slice()),
            config,
        ),
        None => Vec::new(),
    }
}

pub fn classify_jibe(angle_change: f64) -> JibeSize {
    JibeSize::from_angle(angle_change)
}

pub fn jibe_color(angle_change: f64) -> &'static str {
    classify_jibe(angle_change).color()
}
