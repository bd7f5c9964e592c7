//! Test data generation for foilstats.
//!
//! This crate simulates wingfoil sessions (rests, runs, jibes, heart rate)
//! and writes them as provider streams JSON or GPX, for manual verification
//! and integration testing. Every generated session carries the run windows
//! and jibe times it was built from.
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use test_data::prelude::*;
//!
//! let mut rng = StdRng::seed_from_u64(42);
//! let session = ProceduralGenerator::default()
//!     .with_runs(4)
//!     .in_region(Region::LEUCATE)
//!     .generate(&WingfoilerProfile::expert(), started_at, &mut rng);
//!
//! let gpx = generate_gpx(&session.series, session.started_at, &session.name);
//! ```

pub mod config;
pub mod gpx;
pub mod profiles;
pub mod sources;

pub mod prelude {
    //! Convenient re-exports for common usage.

    pub use crate::config::{BoundingBox, Region, SessionConfig};
    pub use crate::gpx::generate_gpx;
    pub use crate::profiles::{RiderProfile, WingfoilerProfile, sample_variance};
    pub use crate::sources::{GeneratedSession, ProceduralGenerator, RunWindow};
}
