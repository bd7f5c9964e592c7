//! Procedural wingfoil session generation.
//!
//! A session is planned as phases (rest, ramp up, straight legs joined by
//! jibes, ramp down) and then simulated at 1 Hz. The rider drifts along the
//! current heading while resting, so with zero GPS jitter the only heading
//! changes in the track are the jibes.

use foilstats::{Position, SampleSeries};
use rand::Rng;
use rand_distr::{Distribution, Normal};
use time::{Duration, OffsetDateTime};

use crate::config::{BoundingBox, SessionConfig};
use crate::profiles::{self, RiderProfile};

/// Slowest cruise any generated session uses, m/s. Together with the noise
/// and jibe dip bounds this keeps riding speed above 12 km/h.
pub const MIN_CRUISE_MPS: f64 = 4.4;

const METERS_PER_DEGREE: f64 = 111_320.0;
/// Speed at the start of a ramp up and the end of a ramp down, m/s.
const RAMP_FLOOR_MPS: f64 = 1.0;
/// Deepest speed loss through a jibe, as a fraction of cruise.
const JIBE_SPEED_DIP: f64 = 0.1;

/// Ground-truth interval of one generated run, from the first ramp-up sample
/// to the last ramp-down sample.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RunWindow {
    pub start_time: f64,
    pub end_time: f64,
}

/// A generated session with the truth it was generated from.
#[derive(Debug, Clone)]
pub struct GeneratedSession {
    pub name: String,
    pub started_at: OffsetDateTime,
    pub series: SampleSeries,
    pub runs: Vec<RunWindow>,
    /// Time of the middle of every jibe, seconds.
    pub jibe_times: Vec<f64>,
}

#[derive(Debug, Clone, Copy)]
enum Phase {
    Rest(usize),
    RampUp(usize),
    Leg(usize),
    Jibe { secs: usize, turn: f64 },
    RampDown(usize),
}

/// Simulation state, advanced one second at a time.
struct Rider {
    position: Position,
    heading: f64,
    cruise: f64,
    heartrate: f64,
    distance: f64,
    t: f64,
}

/// Generates synthetic wingfoil sessions.
pub struct ProceduralGenerator {
    config: SessionConfig,
}

impl Default for ProceduralGenerator {
    fn default() -> Self {
        Self::new(SessionConfig::default())
    }
}

impl ProceduralGenerator {
    pub fn new(config: SessionConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// Sets the number of runs.
    pub fn with_runs(mut self, count: usize) -> Self {
        self.config.run_count = count;
        self
    }

    /// Sets GPS jitter amount.
    pub fn with_gps_jitter(mut self, meters: f64) -> Self {
        self.config.gps_jitter_m = meters;
        self
    }

    /// Sets the launch area.
    pub fn in_region(mut self, region: BoundingBox) -> Self {
        self.config.region = region;
        self
    }

    /// Drops the heart-rate stream.
    pub fn without_heartrate(mut self) -> Self {
        self.config.heartrate = false;
        self
    }

    /// Generates one session starting at `started_at`.
    pub fn generate(
        &self,
        profile: &dyn RiderProfile,
        started_at: OffsetDateTime,
        rng: &mut impl Rng,
    ) -> GeneratedSession {
        let plan = self.plan(profile, rng);

        let cruise = (profile.cruise_speed_mps() * profiles::sample_variance(profile, rng))
            .max(MIN_CRUISE_MPS);
        let mut rider = Rider {
            position: self.config.region.random_point(rng),
            heading: rng.gen_range(0.0..360.0),
            cruise,
            heartrate: profile.resting_heartrate(),
            distance: 0.0,
            t: 0.0,
        };

        let jitter_deg = self.config.gps_jitter_m.max(0.0) / METERS_PER_DEGREE;
        let jitter = Normal::new(0.0, jitter_deg).ok().filter(|_| jitter_deg > 0.0);
        let speed_noise = Normal::new(1.0_f64, 0.04).ok();
        let hr_noise = Normal::new(0.0_f64, 1.5).ok();

        let mut series = SampleSeries {
            heartrate: self.config.heartrate.then(Vec::new),
            latlng: Some(Vec::new()),
            ..Default::default()
        };
        let mut runs = Vec::new();
        let mut jibe_times = Vec::new();
        let mut run_start = 0.0;

        for phase in plan {
            let (secs, riding) = match phase {
                Phase::Rest(s) => (s, false),
                Phase::RampUp(s) => {
                    run_start = rider.t;
                    (s, true)
                }
                Phase::Leg(s) | Phase::RampDown(s) => (s, true),
                Phase::Jibe { secs, .. } => {
                    jibe_times.push(rider.t + secs as f64 / 2.0);
                    (secs, true)
                }
            };

            for k in 0..secs {
                let progress = (k + 1) as f64 / secs as f64;
                let noise = speed_noise
                    .map(|n| n.sample(rng).clamp(0.9, 1.1))
                    .unwrap_or(1.0);

                let speed = match phase {
                    Phase::Rest(_) => rng.gen_range(0.3..1.2),
                    Phase::RampUp(_) => RAMP_FLOOR_MPS + (rider.cruise - RAMP_FLOOR_MPS) * progress,
                    Phase::RampDown(_) => rider.cruise - (rider.cruise - RAMP_FLOOR_MPS) * progress,
                    Phase::Leg(_) => rider.cruise * noise,
                    Phase::Jibe { secs, turn } => {
                        rider.heading = (rider.heading + turn / secs as f64).rem_euclid(360.0);
                        let dip = JIBE_SPEED_DIP * (std::f64::consts::PI * (k as f64 + 0.5) / secs as f64).sin();
                        rider.cruise * (1.0 - dip) * noise
                    }
                };

                let target_hr = if riding {
                    profile.riding_heartrate()
                } else {
                    profile.resting_heartrate()
                };
                rider.heartrate += (target_hr - rider.heartrate) * 0.05;

                series.time.push(rider.t);
                series.speed.push(speed);
                series.distance.push(rider.distance);
                if let Some(hr) = series.heartrate.as_mut() {
                    let reading = rider.heartrate + hr_noise.map(|n| n.sample(rng)).unwrap_or(0.0);
                    hr.push(reading.round());
                }
                if let Some(latlng) = series.latlng.as_mut() {
                    let (dlat, dlng) = match jitter {
                        Some(j) => (j.sample(rng), j.sample(rng)),
                        None => (0.0, 0.0),
                    };
                    latlng.push(Position::new(rider.position.lat + dlat, rider.position.lng + dlng));
                }

                rider.advance(speed);
            }

            if let Phase::RampDown(_) = phase {
                runs.push(RunWindow {
                    start_time: run_start,
                    end_time: rider.t - 1.0,
                });
            }
        }

        GeneratedSession {
            name: format!("Wing session {}", started_at.date()),
            started_at,
            series,
            runs,
            jibe_times,
        }
    }

    /// Generates `count` sessions a day apart, cycling through `regions`.
    /// An empty `regions` keeps the configured launch area.
    pub fn generate_season(
        &self,
        profile: &dyn RiderProfile,
        count: usize,
        first_day: OffsetDateTime,
        regions: &[BoundingBox],
        rng: &mut impl Rng,
    ) -> Vec<GeneratedSession> {
        (0..count)
            .map(|i| {
                let started_at = first_day + Duration::days(i as i64);
                match regions.get(i % regions.len().max(1)) {
                    Some(&region) => Self::new(self.config.clone())
                        .in_region(region)
                        .generate(profile, started_at, rng),
                    None => self.generate(profile, started_at, rng),
                }
            })
            .collect()
    }

    /// Lays out the phases of a session.
    fn plan(&self, profile: &dyn RiderProfile, rng: &mut impl Rng) -> Vec<Phase> {
        let c = &self.config;
        let mut phases = vec![Phase::Rest(sample_secs(c.lead_in_range, rng))];
        let (min_run, max_run) = profile.run_duration_range();

        for run in 0..c.run_count {
            if run > 0 {
                phases.push(Phase::Rest(sample_secs(c.rest_range, rng)));
            }
            phases.push(Phase::RampUp(c.ramp_duration));

            let run_secs = rng.gen_range(min_run..=max_run.max(min_run));
            let mut ridden = 0.0;
            // alternate sides so the rider tacks back and forth
            let mut side = if rng.gen_bool(0.5) { 1.0 } else { -1.0 };
            loop {
                let leg = sample_secs(c.leg_range, rng);
                phases.push(Phase::Leg(leg));
                ridden += leg as f64;

                let next_leg_min = c.leg_range.0 + c.jibe_duration as f64;
                if ridden + next_leg_min > run_secs {
                    break;
                }
                phases.push(Phase::Jibe {
                    secs: c.jibe_duration.max(1),
                    turn: side * rng.gen_range(150.0..=180.0),
                });
                ridden += c.jibe_duration as f64;
                side = -side;
            }

            phases.push(Phase::RampDown(c.ramp_duration));
        }

        phases.push(Phase::Rest(sample_secs(c.lead_in_range, rng)));
        phases
    }
}

impl Rider {
    /// Moves one second along the current heading.
    fn advance(&mut self, speed: f64) {
        let heading = self.heading.to_radians();
        let lat_delta = speed * heading.cos() / METERS_PER_DEGREE;
        let lng_delta = speed * heading.sin() / (METERS_PER_DEGREE * self.position.lat.to_radians().cos());
        self.position = Position::new(self.position.lat + lat_delta, self.position.lng + lng_delta);
        self.distance += speed;
        self.t += 1.0;
    }
}

fn sample_secs((min, max): (f64, f64), rng: &mut impl Rng) -> usize {
    rng.gen_range(min..=max.max(min)).round().max(1.0) as usize
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::profiles::WingfoilerProfile;
    use rand::SeedableRng;
    use rand::rngs::StdRng;
    use time::macros::datetime;

    fn generate(seed: u64) -> GeneratedSession {
        let mut rng = StdRng::seed_from_u64(seed);
        ProceduralGenerator::default().generate(
            &WingfoilerProfile::intermediate(),
            datetime!(2024-06-01 10:00 UTC),
            &mut rng,
        )
    }

    #[test]
    fn test_streams_are_aligned() {
        let session = generate(1);
        let s = &session.series;
        assert!(s.len() > 100);
        assert_eq!(s.time.len(), s.speed.len());
        assert_eq!(s.time.len(), s.distance.len());
        assert_eq!(s.heartrate.as_ref().map(Vec::len), Some(s.time.len()));
        assert_eq!(s.latlng.as_ref().map(Vec::len), Some(s.time.len()));
    }

    #[test]
    fn test_time_and_distance_are_monotonic() {
        let session = generate(2);
        for pair in session.series.time.windows(2) {
            assert_eq!(pair[1] - pair[0], 1.0);
        }
        for pair in session.series.distance.windows(2) {
            assert!(pair[1] > pair[0]);
        }
    }

    #[test]
    fn test_ground_truth_matches_config() {
        let session = generate(3);
        assert_eq!(session.runs.len(), SessionConfig::default().run_count);
        for run in &session.runs {
            assert!(run.end_time > run.start_time);
        }
        for jibe in &session.jibe_times {
            assert!(
                session.runs.iter().any(|r| (r.start_time..=r.end_time).contains(jibe)),
                "jibe at {jibe} outside every run"
            );
        }
    }

    #[test]
    fn test_riding_speed_stays_above_threshold() {
        let session = generate(4);
        let s = &session.series;
        for run in &session.runs {
            // skip the ramps
            let from = run.start_time as usize + 5;
            let to = run.end_time as usize - 5;
            for i in from..=to {
                assert!(s.speed[i] * 3.6 >= 12.0, "slow sample at {i}: {}", s.speed[i]);
            }
        }
    }

    #[test]
    fn test_speed_noise_stays_within_bounds() {
        let profile = WingfoilerProfile::intermediate();
        let fastest = (profile.cruise_speed_mps() * 1.4).max(MIN_CRUISE_MPS) * 1.1;
        for seed in 10..15 {
            let session = generate(seed);
            let top = session.series.speed.iter().copied().fold(0.0, f64::max);
            assert!(top <= fastest, "seed {seed}: {top} m/s above {fastest}");
            // noise is per sample, so legs are not flat
            let mut distinct = session.series.speed.clone();
            distinct.dedup();
            assert!(distinct.len() > session.series.len() / 2);
        }
    }

    #[test]
    fn test_same_seed_same_session() {
        let a = generate(5);
        let b = generate(5);
        assert_eq!(a.series, b.series);
        assert_eq!(a.jibe_times, b.jibe_times);
    }

    #[test]
    fn test_without_heartrate() {
        let mut rng = StdRng::seed_from_u64(6);
        let session = ProceduralGenerator::default()
            .without_heartrate()
            .with_runs(2)
            .generate(&WingfoilerProfile::beginner(), datetime!(2024-06-01 10:00 UTC), &mut rng);
        assert!(session.series.heartrate.is_none());
        assert_eq!(session.runs.len(), 2);
    }

    #[test]
    fn test_session_starts_in_region() {
        let session = generate(7);
        let start = session.series.latlng.as_ref().unwrap()[0];
        // jitter is under a meter, a few 1e-5 degrees at most
        let region = SessionConfig::default().region;
        assert!((start.lat - region.center().lat).abs() < 0.002);
        assert!((start.lng - region.center().lng).abs() < 0.002);
    }

    #[test]
    fn test_season_cycles_regions() {
        use crate::config::Region;

        let mut rng = StdRng::seed_from_u64(8);
        let season = ProceduralGenerator::default().with_runs(1).generate_season(
            &WingfoilerProfile::expert(),
            4,
            datetime!(2024-06-01 10:00 UTC),
            &[Region::TARIFA, Region::HOOD_RIVER],
            &mut rng,
        );

        assert_eq!(season.len(), 4);
        assert_eq!(season[3].started_at, datetime!(2024-06-04 10:00 UTC));
        let starts: Vec<_> = season
            .iter()
            .map(|s| s.series.latlng.as_ref().unwrap()[0])
            .collect();
        assert!((starts[0].lat - 36.019).abs() < 0.01);
        assert!((starts[1].lat - 45.713).abs() < 0.01);
        assert!((starts[2].lat - 36.019).abs() < 0.01);
    }
}
