//! Rider performance profiles.
//!
//! Profiles define how fast a rider cruises on the foil, how long they stay
//! up, and how hard their heart works. The procedural generator turns them
//! into speed, position and heart-rate streams.

mod wingfoiler;

pub use wingfoiler::WingfoilerProfile;

/// Trait for rider performance profiles.
pub trait RiderProfile: Send + Sync {
    /// Cruising speed on the foil in meters per second.
    fn cruise_speed_mps(&self) -> f64;

    /// Session-to-session performance variance as a coefficient of variation.
    fn variance(&self) -> f64;

    /// Range of run lengths in seconds, ramps excluded.
    fn run_duration_range(&self) -> (f64, f64);

    /// Heart rate while floating between runs, bpm.
    fn resting_heartrate(&self) -> f64;

    /// Heart rate the rider settles at while riding, bpm.
    fn riding_heartrate(&self) -> f64;
}

/// Samples a session variance factor from a normal distribution.
/// Returns a multiplier around 1.0.
pub fn sample_variance(profile: &dyn RiderProfile, rng: &mut impl rand::Rng) -> f64 {
    use rand_distr::{Distribution, Normal};

    let std_dev = profile.variance();
    match Normal::new(1.0, std_dev) {
        Ok(normal) if std_dev > 0.0 => {
            let sample: f64 = normal.sample(rng);
            sample.clamp(0.7, 1.4)
        }
        _ => 1.0,
    }
}
