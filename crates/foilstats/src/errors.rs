use thiserror::Error;

use crate::file_parsers::ParseError;

/// Errors from the edges of the crate: reading input files and configs.
///
/// The analysis functions themselves never fail; malformed series degrade to
/// empty results.
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Activity file error: {0}")]
    Parse(#[from] ParseError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Thread pool error: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),
}
