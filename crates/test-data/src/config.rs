//! Configuration types for synthetic session generation.

use foilstats::Position;
use serde::{Deserialize, Serialize};

/// Geographic bounding box defined by southwest and northeast corners.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    /// Minimum latitude (south)
    pub min_lat: f64,
    /// Minimum longitude (west)
    pub min_lon: f64,
    /// Maximum latitude (north)
    pub max_lat: f64,
    /// Maximum longitude (east)
    pub max_lon: f64,
}

impl BoundingBox {
    pub const fn new(min_lat: f64, min_lon: f64, max_lat: f64, max_lon: f64) -> Self {
        Self {
            min_lat,
            min_lon,
            max_lat,
            max_lon,
        }
    }

    /// Returns a random point within the bounding box.
    pub fn random_point(&self, rng: &mut impl rand::Rng) -> Position {
        Position::new(
            rng.gen_range(self.min_lat..self.max_lat),
            rng.gen_range(self.min_lon..self.max_lon),
        )
    }

    pub fn center(&self) -> Position {
        Position::new(
            (self.min_lat + self.max_lat) / 2.0,
            (self.min_lon + self.max_lon) / 2.0,
        )
    }

    pub fn contains(&self, p: Position) -> bool {
        (self.min_lat..=self.max_lat).contains(&p.lat) && (self.min_lon..=self.max_lon).contains(&p.lng)
    }
}

/// Launch areas of well-known foiling spots. Each box is small enough that
/// any two starts inside it fall within the spot grouping radius.
#[derive(Debug, Clone, Copy)]
pub struct Region;

impl Region {
    /// Tarifa, Los Lances beach.
    pub const TARIFA: BoundingBox = BoundingBox::new(36.0180, -5.6270, 36.0200, -5.6250);

    /// Leucate, Les Coussoules.
    pub const LEUCATE: BoundingBox = BoundingBox::new(42.9120, 3.0450, 42.9140, 3.0470);

    /// Hood River, the Event Site.
    pub const HOOD_RIVER: BoundingBox = BoundingBox::new(45.7120, -121.5180, 45.7140, -121.5160);

    pub const ALL: [BoundingBox; 3] = [Self::TARIFA, Self::LEUCATE, Self::HOOD_RIVER];
}

/// Shape of one generated session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Number of runs to ride.
    pub run_count: usize,
    /// Rest before the first run and after the last, seconds (min, max).
    pub lead_in_range: (f64, f64),
    /// Rest between runs, seconds (min, max).
    pub rest_range: (f64, f64),
    /// Straight leg between jibes, seconds (min, max).
    pub leg_range: (f64, f64),
    /// Seconds spent turning in a jibe.
    pub jibe_duration: usize,
    /// Seconds to accelerate onto the foil and to come off it.
    pub ramp_duration: usize,
    /// GPS position jitter standard deviation in meters.
    pub gps_jitter_m: f64,
    /// Whether a heart-rate stream is recorded.
    pub heartrate: bool,
    /// Launch area the session starts in.
    pub region: BoundingBox,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            run_count: 6,
            lead_in_range: (30.0, 90.0),
            rest_range: (20.0, 90.0),
            leg_range: (20.0, 40.0),
            jibe_duration: 4,
            ramp_duration: 5,
            gps_jitter_m: 0.8,
            heartrate: true,
            region: Region::TARIFA,
        }
    }
}
