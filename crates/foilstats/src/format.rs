//! Human-readable strings for the text report.

/// `"45s"`, `"3m 20s"`, `"3m"` or `"1h 5m"`.
///
/// Seconds are rounded within the minute, so 119.7 s reads `"1m 60s"`.
pub fn format_duration(seconds: f64) -> String {
    if seconds < 60.0 {
        return format!("{}s", seconds.round());
    }

    let minutes = (seconds / 60.0).floor() as u64;
    let remaining_seconds = (seconds % 60.0).round() as u64;

    if minutes < 60 {
        return if remaining_seconds > 0 {
            format!("{minutes}m {remaining_seconds}s")
        } else {
            format!("{minutes}m")
        };
    }

    format!("{}h {}m", minutes / 60, minutes % 60)
}

/// `"850m"` under a kilometer, `"12.35km"` above.
pub fn format_distance(meters: f64) -> String {
    if meters < 1000.0 {
        return format!("{}m", meters.round());
    }
    format!("{:.2}km", meters / 1000.0)
}

pub fn format_speed(kmh: f64) -> String {
    format!("{kmh:.1} km/h")
}
