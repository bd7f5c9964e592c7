//! Centered moving averages shared by run and jibe detection.
//!
//! Windows shrink at the ends of the series: each output is the mean of the
//! samples that actually exist within `i - w/2 ..= i + w/2`.

use std::ops::RangeInclusive;

/// m/s to km/h factor.
pub const MS_TO_KMH: f64 = 3.6;

#[inline]
pub fn ms_to_kmh(speed_ms: f64) -> f64 {
    speed_ms * MS_TO_KMH
}

/// Rounds to one decimal place, halves away from zero.
#[inline]
pub fn round_to_tenth(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

/// Wraps an angle in degrees into `[0, 360)`.
#[inline]
pub fn normalize_degrees(degrees: f64) -> f64 {
    let wrapped = degrees.rem_euclid(360.0);
    // rem_euclid of a tiny negative rounds up to exactly 360.0
    if wrapped >= 360.0 { 0.0 } else { wrapped }
}

fn window_bounds(index: usize, len: usize, half: usize) -> RangeInclusive<usize> {
    index.saturating_sub(half)..=(index + half).min(len - 1)
}

/// Arithmetic moving average. A window of 0 or 1 returns the input unchanged.
pub fn moving_average(values: &[f64], window: usize) -> Vec<f64> {
    if window <= 1 {
        return values.to_vec();
    }

    let half = window / 2;
    (0..values.len())
        .map(|i| {
            let slice = &values[window_bounds(i, values.len(), half)];
            slice.iter().sum::<f64>() / slice.len() as f64
        })
        .collect()
}

/// Mean direction of a set of headings in degrees, via the sum of unit
/// vectors. Returns a value in `[0, 360)`; an empty or perfectly balanced set
/// yields 0.
pub fn circular_mean(headings: &[f64]) -> f64 {
    let (sin_sum, cos_sum) = headings.iter().fold((0.0, 0.0), |(s, c), h| {
        let rad = h.to_radians();
        (s + rad.sin(), c + rad.cos())
    });
    normalize_degrees(sin_sum.atan2(cos_sum).to_degrees())
}

/// Moving average for angles that wrap at 360 degrees, so 359 and 1 average
/// to 0 rather than 180. A window of 0 or 1 returns the input unchanged.
pub fn circular_moving_average(headings: &[f64], window: usize) -> Vec<f64> {
    if window <= 1 {
        return headings.to_vec();
    }

    let half = window / 2;
    (0..headings.len())
        .map(|i| circular_mean(&headings[window_bounds(i, headings.len(), half)]))
        .collect()
}
