//! Session-level and cross-session aggregation of runs.

use crate::models::{ProgressStats, RecentTrend, Run, Session, SessionStats};

/// Sessions per trend window.
pub const TREND_WINDOW: usize = 5;

fn max_of(values: impl Iterator<Item = f64>) -> f64 {
    values.fold(f64::NEG_INFINITY, f64::max)
}

fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        None
    } else {
        Some(values.iter().sum::<f64>() / values.len() as f64)
    }
}

/// Aggregates a session's runs. No runs gives all zeros and no heartrate.
///
/// Heartrate fields are computed only over runs that report heartrate.
pub fn calculate_session_stats(runs: &[Run]) -> SessionStats {
    if runs.is_empty() {
        return SessionStats::default();
    }

    let count = runs.len() as f64;
    let total_riding_time: f64 = runs.iter().map(|r| r.duration).sum();
    let total_riding_distance: f64 = runs.iter().map(|r| r.distance).sum();

    let average_heartrates: Vec<f64> = runs.iter().filter_map(|r| r.average_heartrate).collect();
    let max_heartrates: Vec<f64> = runs.iter().filter_map(|r| r.max_heartrate).collect();

    SessionStats {
        number_of_runs: runs.len(),
        total_riding_time,
        total_riding_distance,
        average_run_duration: total_riding_time / count,
        average_run_distance: total_riding_distance / count,
        longest_run_duration: max_of(runs.iter().map(|r| r.duration)),
        longest_run_distance: max_of(runs.iter().map(|r| r.distance)),
        best_average_speed: max_of(runs.iter().map(|r| r.average_speed)),
        best_max_speed: max_of(runs.iter().map(|r| r.max_speed)),
        average_heartrate: mean(&average_heartrates).map(f64::round),
        max_heartrate: (!max_heartrates.is_empty()).then(|| max_of(max_heartrates.into_iter())),
    }
}

/// Percentage change from `previous` to `recent`; 0 when there is no
/// usable previous value.
pub fn trend_percent(recent: f64, previous: f64) -> f64 {
    if previous == 0.0 || !previous.is_finite() {
        return 0.0;
    }
    ((recent - previous) / previous) * 100.0
}

#[derive(Debug, Clone, Copy, Default)]
struct WindowAverages {
    run_duration: f64,
    run_distance: f64,
    runs: f64,
}

impl WindowAverages {
    fn of(sessions: &[&Session]) -> Self {
        if sessions.is_empty() {
            return Self::default();
        }
        let n = sessions.len() as f64;
        Self {
            run_duration: sessions.iter().map(|s| s.stats.average_run_duration).sum::<f64>() / n,
            run_distance: sessions.iter().map(|s| s.stats.average_run_distance).sum::<f64>() / n,
            runs: sessions.iter().map(|s| s.stats.number_of_runs as f64).sum::<f64>() / n,
        }
    }
}

/// Totals and bests across sessions, plus the trend of the five most recent
/// sessions against the five before them. `None` for an empty list.
pub fn calculate_progress_stats(sessions: &[Session]) -> Option<ProgressStats> {
    if sessions.is_empty() {
        return None;
    }

    let all_runs: Vec<&Run> = sessions.iter().flat_map(|s| s.runs.iter()).collect();
    let total_sessions = sessions.len();
    let total_runs = all_runs.len();
    let total_riding_time: f64 = all_runs.iter().map(|r| r.duration).sum();
    let total_riding_distance: f64 = all_runs.iter().map(|r| r.distance).sum();

    let best = |field: fn(&Run) -> f64| {
        if all_runs.is_empty() {
            0.0
        } else {
            max_of(all_runs.iter().map(|r| field(r)))
        }
    };
    let per_run = |total: f64| {
        if total_runs > 0 {
            total / total_runs as f64
        } else {
            0.0
        }
    };

    let mut by_date: Vec<&Session> = sessions.iter().collect();
    by_date.sort_by(|a, b| b.date.cmp(&a.date));
    let recent = WindowAverages::of(&by_date[..TREND_WINDOW.min(by_date.len())]);
    let previous = WindowAverages::of(
        by_date
            .get(TREND_WINDOW..(2 * TREND_WINDOW).min(by_date.len()))
            .unwrap_or(&[]),
    );

    Some(ProgressStats {
        total_sessions,
        total_runs,
        total_riding_time,
        total_riding_distance,
        average_runs_per_session: total_runs as f64 / total_sessions as f64,
        average_run_duration: per_run(total_riding_time),
        average_run_distance: per_run(total_riding_distance),
        best_run_duration: best(|r| r.duration),
        best_run_distance: best(|r| r.distance),
        best_max_speed: best(|r| r.max_speed),
        recent_trend: RecentTrend {
            run_duration: trend_percent(recent.run_duration, previous.run_duration),
            run_distance: trend_percent(recent.run_distance, previous.run_distance),
            runs_per_session: trend_percent(recent.runs, previous.runs),
        },
    })
}
