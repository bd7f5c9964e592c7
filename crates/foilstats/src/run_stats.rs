//! Per-run statistics over an index range of a session's streams.

use crate::models::{Run, SampleSeries};
use crate::smoothing::round_to_tenth;

/// Inclusive index range of a detected run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunSpan {
    pub start: usize,
    pub end: usize,
}

impl RunSpan {
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    /// Seconds between the span's boundary samples.
    pub fn duration(&self, time: &[f64]) -> f64 {
        time[self.end] - time[self.start]
    }
}

/// Accumulates one statistic over a run's samples.
pub trait SampleMetric {
    type Score;
    fn next_sample(&mut self, value: f64);
    fn finish(&mut self) -> Self::Score;
}

#[derive(Debug, Clone, Default)]
struct SpeedMetric {
    sum: f64,
    count: usize,
    max: Option<f64>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct SpeedScore {
    average: f64,
    max: f64,
}

impl SampleMetric for SpeedMetric {
    type Score = SpeedScore;
    fn next_sample(&mut self, speed: f64) {
        self.sum += speed;
        self.count += 1;
        self.max = Some(self.max.map_or(speed, |m| m.max(speed)));
    }

    fn finish(&mut self) -> SpeedScore {
        let average = if self.count > 0 {
            self.sum / self.count as f64
        } else {
            0.0
        };
        SpeedScore {
            average: round_to_tenth(average),
            max: round_to_tenth(self.max.unwrap_or(0.0)),
        }
    }
}

/// Heartrate over positive readings only; zero means the strap dropped out.
#[derive(Debug, Clone, Default)]
struct HeartrateMetric {
    sum: f64,
    count: usize,
    max: Option<f64>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct HeartrateScore {
    average: f64,
    max: f64,
}

impl SampleMetric for HeartrateMetric {
    type Score = Option<HeartrateScore>;
    fn next_sample(&mut self, bpm: f64) {
        if bpm > 0.0 {
            self.sum += bpm;
            self.count += 1;
            self.max = Some(self.max.map_or(bpm, |m| m.max(bpm)));
        }
    }

    fn finish(&mut self) -> Option<HeartrateScore> {
        let max = self.max?;
        Some(HeartrateScore {
            average: (self.sum / self.count as f64).round(),
            max,
        })
    }
}

fn positive(value: f64) -> Option<f64> {
    (value > 0.0).then_some(value)
}

/// Builds the run record for `span`.
///
/// `smoothed_kmh` is the smoothed km/h speed stream the span was detected
/// on; speed statistics come from it rather than the raw stream. Heartrate and
/// position fields are filled only when their stream covers `span.end`.
pub fn build_run(id: u32, span: RunSpan, series: &SampleSeries, smoothed_kmh: &[f64]) -> Run {
    let RunSpan { start, end } = span;

    let mut speed = SpeedMetric::default();
    for &v in &smoothed_kmh[start..=end] {
        speed.next_sample(v);
    }
    let speed = speed.finish();

    let mut heartrate_score = None;
    let mut start_heartrate = None;
    let mut end_heartrate = None;
    if let Some(hr) = series.heartrate_covering(end) {
        let mut metric = HeartrateMetric::default();
        for &bpm in &hr[start..=end] {
            metric.next_sample(bpm);
        }
        heartrate_score = metric.finish();
        start_heartrate = positive(hr[start]);
        end_heartrate = positive(hr[end]);
    }

    let (start_position, end_position) = series
        .latlng_covering(end)
        .map_or((None, None), |p| (Some(p[start]), Some(p[end])));

    Run {
        id,
        start_index: start,
        end_index: end,
        start_time: series.time[start],
        end_time: series.time[end],
        duration: span.duration(&series.time),
        distance: series.distance[end] - series.distance[start],
        average_speed: speed.average,
        max_speed: speed.max,
        average_heartrate: heartrate_score.map(|s| s.average),
        max_heartrate: heartrate_score.map(|s| s.max),
        start_heartrate,
        end_heartrate,
        start_position,
        end_position,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Position;

    fn series() -> SampleSeries {
        SampleSeries {
            time: vec![0.0, 1.0, 2.0, 3.0, 4.0, 5.0],
            speed: vec![0.0; 6],
            distance: vec![0.0, 2.0, 7.0, 13.0, 19.0, 20.0],
            heartrate: Some(vec![110.0, 0.0, 140.0, 151.0, 0.0, 100.0]),
            latlng: Some(
                (0..6)
                    .map(|i| Position::new(36.0 + i as f64 * 0.001, -5.6))
                    .collect(),
            ),
        }
    }

    #[test]
    fn test_build_run_fields() {
        let smoothed = [0.0, 12.04, 18.25, 19.96, 14.0, 0.0];
        let run = build_run(3, RunSpan::new(1, 4), &series(), &smoothed);

        assert_eq!(run.id, 3);
        assert_eq!(run.start_time, 1.0);
        assert_eq!(run.end_time, 4.0);
        assert_eq!(run.duration, 3.0);
        assert_eq!(run.distance, 17.0);
        assert_eq!(run.max_speed, 20.0);
        // (12.04 + 18.25 + 19.96 + 14.0) / 4 = 16.0625
        assert_eq!(run.average_speed, 16.1);
    }

    #[test]
    fn test_heartrate_ignores_zero_readings() {
        let smoothed = [15.0; 6];
        let run = build_run(1, RunSpan::new(1, 4), &series(), &smoothed);

        // positive readings in range: 140, 151
        assert_eq!(run.average_heartrate, Some(146.0));
        assert_eq!(run.max_heartrate, Some(151.0));
        // boundary samples are zero
        assert_eq!(run.start_heartrate, None);
        assert_eq!(run.end_heartrate, None);

        let run = build_run(2, RunSpan::new(2, 3), &series(), &smoothed);
        assert_eq!(run.start_heartrate, Some(140.0));
        assert_eq!(run.end_heartrate, Some(151.0));
    }

    #[test]
    fn test_heartrate_absent_when_all_zero() {
        let mut s = series();
        s.heartrate = Some(vec![0.0; 6]);
        let run = build_run(1, RunSpan::new(0, 5), &s, &[15.0; 6]);
        assert_eq!(run.average_heartrate, None);
        assert_eq!(run.max_heartrate, None);
    }

    #[test]
    fn test_short_optional_streams_are_skipped() {
        let mut s = series();
        s.heartrate = Some(vec![120.0, 120.0, 120.0]);
        s.latlng = Some(vec![Position::new(0.0, 0.0); 4]);
        let run = build_run(1, RunSpan::new(1, 4), &s, &[15.0; 6]);
        assert_eq!(run.average_heartrate, None);
        assert_eq!(run.start_heartrate, None);
        assert_eq!(run.start_position, None);
        assert_eq!(run.end_position, None);
    }

    #[test]
    fn test_positions_copied_from_boundaries() {
        let s = series();
        let positions = s.latlng.clone().unwrap();
        let run = build_run(1, RunSpan::new(1, 4), &s, &[15.0; 6]);
        assert_eq!(run.start_position, Some(positions[1]));
        assert_eq!(run.end_position, Some(positions[4]));
    }
}
