//! Sources of synthetic session data.
//!
//! - [`ProceduralGenerator`]: simulate a rider's session from a profile and a
//!   session shape, keeping the run windows and jibe times as ground truth

mod procedural;

pub use procedural::{GeneratedSession, MIN_CRUISE_MPS, ProceduralGenerator, RunWindow};
