//! Wingfoil rider profile.

use super::RiderProfile;

/// Performance profile of a wingfoil rider.
///
/// Foiling only starts well above walking pace, so even beginners cruise
/// above 15 km/h once they are up; what improves with skill is top speed and
/// how long a run lasts before touching down.
#[derive(Debug, Clone)]
pub struct WingfoilerProfile {
    /// Cruise speed in m/s.
    pub cruise_speed: f64,
    /// Performance variance (coefficient of variation).
    pub variance: f64,
    /// Run length in seconds (min, max).
    pub run_duration: (f64, f64),
    pub resting_heartrate: f64,
    pub riding_heartrate: f64,
}

impl Default for WingfoilerProfile {
    fn default() -> Self {
        Self::intermediate()
    }
}

impl WingfoilerProfile {
    /// Creates a profile cruising at `speed_kmh`.
    pub fn with_speed(speed_kmh: f64) -> Self {
        Self {
            cruise_speed: speed_kmh / 3.6,
            ..Self::intermediate()
        }
    }

    /// Short runs at ~16 km/h, frequent touchdowns.
    pub fn beginner() -> Self {
        Self {
            cruise_speed: 16.0 / 3.6,
            variance: 0.06,
            run_duration: (25.0, 70.0),
            resting_heartrate: 105.0,
            riding_heartrate: 150.0,
        }
    }

    /// Linked runs of a few minutes at ~22 km/h.
    pub fn intermediate() -> Self {
        Self {
            cruise_speed: 22.0 / 3.6,
            variance: 0.05,
            run_duration: (60.0, 180.0),
            resting_heartrate: 95.0,
            riding_heartrate: 140.0,
        }
    }

    /// Long runs at ~28 km/h.
    pub fn expert() -> Self {
        Self {
            cruise_speed: 28.0 / 3.6,
            variance: 0.05,
            run_duration: (120.0, 360.0),
            resting_heartrate: 85.0,
            riding_heartrate: 135.0,
        }
    }
}

impl RiderProfile for WingfoilerProfile {
    fn cruise_speed_mps(&self) -> f64 {
        self.cruise_speed
    }

    fn variance(&self) -> f64 {
        self.variance
    }

    fn run_duration_range(&self) -> (f64, f64) {
        self.run_duration
    }

    fn resting_heartrate(&self) -> f64 {
        self.resting_heartrate
    }

    fn riding_heartrate(&self) -> f64 {
        self.riding_heartrate
    }
}
