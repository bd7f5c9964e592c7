//! Bearings between GPS fixes.

use crate::models::Position;
use crate::smoothing::normalize_degrees;

/// Initial great-circle bearing from `from` to `to`, in degrees `[0, 360)`.
///
/// Coincident points give `atan2(0, 0) = 0`, i.e. due north.
pub fn bearing(from: Position, to: Position) -> f64 {
    let d_lon = (to.lng - from.lng).to_radians();
    let lat1 = from.lat.to_radians();
    let lat2 = to.lat.to_radians();

    let y = d_lon.sin() * lat2.cos();
    let x = lat1.cos() * lat2.sin() - lat1.sin() * lat2.cos() * d_lon.cos();

    normalize_degrees(y.atan2(x).to_degrees())
}

/// Heading of each consecutive pair of positions (`n - 1` values).
pub fn headings(positions: &[Position]) -> Vec<f64> {
    positions.windows(2).map(|w| bearing(w[0], w[1])).collect()
}

/// Shorter arc between two headings, in `[0, 180]`.
pub fn angle_difference(a: f64, b: f64) -> f64 {
    let diff = (a - b).abs();
    if diff > 180.0 { 360.0 - diff } else { diff }
}
