//! Wingfoil session analysis.
//!
//! Splits a recording's speed stream into runs, aggregates them per session
//! and across sessions, and finds jibes from heading changes along the GPS
//! track. Input adapters turn provider streams JSON and GPX/TCX/FIT files into
//! a [`SampleSeries`]; everything downstream is pure and synchronous.

pub mod config;
pub mod errors;
pub mod file_parsers;
pub mod format;
pub mod heading;
pub mod jibe_detection;
pub mod models;
pub mod run_detection;
pub mod run_stats;
pub mod session;
pub mod session_queue;
pub mod session_stats;
pub mod smoothing;
pub mod spots;
pub mod streams;

pub use config::{AnalysisConfig, JibeConfig, RunDetectionConfig};
pub use errors::AppError;
pub use jibe_detection::{classify_jibe, detect_jibes};
pub use models::{
    Jibe, JibeSize, Position, ProgressStats, RecentTrend, Run, SampleSeries, Session, SessionStats,
    Spot,
};
pub use run_detection::detect_runs;
pub use session::SessionMeta;
pub use session_stats::{calculate_progress_stats, calculate_session_stats};
pub use spots::group_sessions_into_spots;
