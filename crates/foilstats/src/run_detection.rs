//! Splits a session's speed stream into runs.
//!
//! Speed is converted to km/h, smoothed, then walked once by a two-state
//! machine. A run opens at the first sample at or above the threshold and
//! closes at the sample before the first one below it. Candidates shorter
//! than the minimum run duration are dropped without consuming an ordinal.
//!
//! `min_stop_duration` does not merge runs separated by short dips: every
//! dip below the threshold ends the current run.

use tracing::debug;

use crate::config::RunDetectionConfig;
use crate::models::{Run, SampleSeries};
use crate::run_stats::{RunSpan, build_run};
use crate::smoothing::{ms_to_kmh, moving_average};

/// Segmenter state while walking the smoothed speed stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SegmenterState {
    #[default]
    SeekingStart,
    InRun {
        start: usize,
    },
}

impl SegmenterState {
    /// Advances by one sample. Returns the next state and, when this sample
    /// ends a run, the candidate span `[start, index - 1]`.
    pub fn step(self, index: usize, above_threshold: bool) -> (SegmenterState, Option<RunSpan>) {
        match (self, above_threshold) {
            (SegmenterState::SeekingStart, true) => (SegmenterState::InRun { start: index }, None),
            (SegmenterState::SeekingStart, false) => (SegmenterState::SeekingStart, None),
            (SegmenterState::InRun { .. }, true) => (self, None),
            (SegmenterState::InRun { start }, false) => (
                SegmenterState::SeekingStart,
                Some(RunSpan::new(start, index - 1)),
            ),
        }
    }

    /// Closes a run still open when the stream ends.
    pub fn finish(self, last_index: usize) -> Option<RunSpan> {
        match self {
            SegmenterState::InRun { start } => Some(RunSpan::new(start, last_index)),
            SegmenterState::SeekingStart => None,
        }
    }
}

/// Converts a raw m/s stream to smoothed km/h.
pub fn smoothed_speed_kmh(speed_ms: &[f64], window: usize) -> Vec<f64> {
    let kmh: Vec<f64> = speed_ms.iter().map(|&v| ms_to_kmh(v)).collect();
    moving_average(&kmh, window)
}

/// Finds run spans in an already smoothed km/h stream.
///
/// `time` must be at least as long as `smoothed_kmh`.
pub fn segment_runs(time: &[f64], smoothed_kmh: &[f64], config: &RunDetectionConfig) -> Vec<RunSpan> {
    let mut spans = Vec::new();
    let mut state = SegmenterState::default();

    let mut accept = |span: RunSpan| {
        let duration = span.duration(time);
        if duration >= config.min_run_duration {
            spans.push(span);
        } else {
            debug!(
                "Discarding run candidate {}..={} ({duration}s < {}s)",
                span.start, span.end, config.min_run_duration
            );
        }
    };

    for (i, &speed) in smoothed_kmh.iter().enumerate() {
        let (next, closed) = state.step(i, speed >= config.min_speed_threshold);
        state = next;
        if let Some(span) = closed {
            accept(span);
        }
    }

    if let Some(last) = smoothed_kmh.len().checked_sub(1)
        && let Some(span) = state.finish(last)
    {
        accept(span);
    }

    spans
}

/// Detects runs in a session's streams.
///
/// Returns an empty list for an empty series. Runs are numbered from 1 in
/// detection order.
pub fn detect_runs(series: &SampleSeries, config: &RunDetectionConfig) -> Vec<Run> {
    let len = series.len();
    if len == 0 {
        return Vec::new();
    }

    let smoothed = smoothed_speed_kmh(&series.speed[..len], config.speed_smoothing_window);
    let spans = segment_runs(&series.time[..len], &smoothed, config);

    let runs: Vec<Run> = spans
        .into_iter()
        .zip(1u32..)
        .map(|(span, id)| build_run(id, span, series, &smoothed))
        .collect();

    debug!("Detected {} runs in {} samples", runs.len(), len);
    runs
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kmh_to_ms(kmh: f64) -> f64 {
        kmh / 3.6
    }

    /// 1 Hz series, one meter per sample.
    fn series_from_kmh(speeds_kmh: &[f64]) -> SampleSeries {
        SampleSeries {
            time: (0..speeds_kmh.len()).map(|i| i as f64).collect(),
            speed: speeds_kmh.iter().map(|&v| kmh_to_ms(v)).collect(),
            distance: (0..speeds_kmh.len()).map(|i| i as f64).collect(),
            ..Default::default()
        }
    }

    fn config(threshold: f64, min_duration: f64, window: usize) -> RunDetectionConfig {
        RunDetectionConfig {
            min_speed_threshold: threshold,
            min_run_duration: min_duration,
            speed_smoothing_window: window,
            ..Default::default()
        }
    }

    #[test]
    fn test_state_transitions() {
        let state = SegmenterState::SeekingStart;
        assert_eq!(state.step(0, false), (SegmenterState::SeekingStart, None));

        let (state, closed) = state.step(3, true);
        assert_eq!(state, SegmenterState::InRun { start: 3 });
        assert_eq!(closed, None);

        let (state, closed) = state.step(4, true);
        assert_eq!(state, SegmenterState::InRun { start: 3 });
        assert_eq!(closed, None);

        let (state, closed) = state.step(8, false);
        assert_eq!(state, SegmenterState::SeekingStart);
        assert_eq!(closed, Some(RunSpan::new(3, 7)));
    }

    #[test]
    fn test_finish_closes_open_run() {
        assert_eq!(
            SegmenterState::InRun { start: 2 }.finish(9),
            Some(RunSpan::new(2, 9))
        );
        assert_eq!(SegmenterState::SeekingStart.finish(9), None);
    }

    #[test]
    fn test_empty_series() {
        assert!(detect_runs(&SampleSeries::default(), &RunDetectionConfig::default()).is_empty());

        let no_speed = SampleSeries {
            time: vec![0.0, 1.0],
            ..Default::default()
        };
        assert!(detect_runs(&no_speed, &RunDetectionConfig::default()).is_empty());
    }

    #[test]
    fn test_speed_exactly_at_threshold_is_a_run() {
        // 3.6 km/h = 1 m/s, so the threshold survives the unit conversion exactly
        let mut speeds = vec![0.0; 3];
        speeds.extend(vec![3.6; 12]);
        speeds.extend(vec![0.0; 3]);
        let runs = detect_runs(&series_from_kmh(&speeds), &config(3.6, 10.0, 1));

        assert_eq!(runs.len(), 1);
        assert_eq!(runs[0].start_index, 3);
        assert_eq!(runs[0].end_index, 14);
        assert_eq!(runs[0].duration, 11.0);
    }

    #[test]
    fn test_short_spike_is_discarded() {
        let mut speeds = vec![0.0; 5];
        speeds.extend(vec![20.0; 5]);
        speeds.extend(vec![0.0; 5]);
        let runs = detect_runs(&series_from_kmh(&speeds), &config(12.0, 10.0, 1));
        assert!(runs.is_empty());
    }

    #[test]
    fn test_trailing_run_closes_at_last_index() {
        let mut speeds = vec![0.0; 4];
        speeds.extend(vec![20.0; 16]);
        let runs = detect_runs(&series_from_kmh(&speeds), &config(12.0, 10.0, 1));

        assert_eq!(runs.len(), 1);
        assert_eq!(runs[0].start_index, 4);
        assert_eq!(runs[0].end_index, 19);
        assert_eq!(runs[0].duration, 15.0);
    }

    #[test]
    fn test_trailing_run_too_short() {
        let mut speeds = vec![0.0; 10];
        speeds.extend(vec![20.0; 3]);
        assert!(detect_runs(&series_from_kmh(&speeds), &config(12.0, 10.0, 1)).is_empty());
    }

    #[test]
    fn test_rejected_candidates_do_not_consume_ordinals() {
        let mut speeds = vec![0.0; 2];
        speeds.extend(vec![20.0; 15]); // run
        speeds.extend(vec![0.0; 3]);
        speeds.extend(vec![20.0; 3]); // spike
        speeds.extend(vec![0.0; 3]);
        speeds.extend(vec![20.0; 15]); // run
        speeds.extend(vec![0.0; 2]);
        let runs = detect_runs(&series_from_kmh(&speeds), &config(12.0, 10.0, 1));

        assert_eq!(runs.len(), 2);
        assert_eq!(runs[0].id, 1);
        assert_eq!(runs[1].id, 2);
        assert_eq!(runs[1].start_index, 26);
    }

    #[test]
    fn test_single_sample_dip_splits_run() {
        let mut speeds = vec![20.0; 15];
        speeds.push(5.0);
        speeds.extend(vec![20.0; 15]);
        let runs = detect_runs(&series_from_kmh(&speeds), &config(12.0, 10.0, 1));
        assert_eq!(runs.len(), 2);
        assert_eq!(runs[0].end_index, 14);
        assert_eq!(runs[1].start_index, 16);
    }

    #[test]
    fn test_smoothing_absorbs_single_sample_dip() {
        let mut speeds = vec![20.0; 15];
        speeds.push(5.0);
        speeds.extend(vec![20.0; 15]);
        // (20 + 5 + 20) / 3 = 15 stays above 12
        let runs = detect_runs(&series_from_kmh(&speeds), &config(12.0, 10.0, 3));
        assert_eq!(runs.len(), 1);
        assert_eq!(runs[0].max_speed, 20.0);
    }

    #[test]
    fn test_zero_threshold_makes_whole_series_one_run() {
        let runs = detect_runs(&series_from_kmh(&[0.0; 20]), &config(0.0, 10.0, 0));
        assert_eq!(runs.len(), 1);
        assert_eq!(runs[0].start_index, 0);
        assert_eq!(runs[0].end_index, 19);
    }

    #[test]
    fn test_end_to_end_ramp() {
        let time: Vec<f64> = (0..20).map(|i| i as f64).collect();
        let speed: Vec<f64> = (0..20)
            .map(|i| if (2..=15).contains(&i) { 5.0 } else { 0.0 })
            .collect();
        let mut distance = Vec::with_capacity(20);
        let mut covered = 0.0;
        for &v in &speed {
            if v > 0.0 {
                covered += 1.0;
            }
            distance.push(covered);
        }
        let series = SampleSeries {
            time,
            speed,
            distance,
            ..Default::default()
        };

        let runs = detect_runs(&series, &config(12.0, 5.0, 1));

        assert_eq!(runs.len(), 1);
        let run = &runs[0];
        assert_eq!(run.start_index, 2);
        assert_eq!(run.end_index, 15);
        assert_eq!(run.duration, 13.0);
        assert_eq!(run.distance, 13.0);
        assert_eq!(run.max_speed, 18.0);
        assert_eq!(run.average_speed, 18.0);
    }

    #[test]
    fn test_detection_is_deterministic() {
        let speeds: Vec<f64> = (0..200)
            .map(|i| 15.0 + 8.0 * (i as f64 / 9.0).sin())
            .collect();
        let series = series_from_kmh(&speeds);
        let config = RunDetectionConfig::default();
        assert_eq!(detect_runs(&series, &config), detect_runs(&series, &config));
    }
}
