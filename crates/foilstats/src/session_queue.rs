use std::sync::Arc;

use rayon::prelude::*;
use tracing::info;

use crate::config::AnalysisConfig;
use crate::errors::AppError;
use crate::models::{Jibe, SampleSeries, Session};
use crate::session::SessionMeta;

/// One recording waiting to be analyzed.
#[derive(Debug, Clone)]
pub struct SessionJob {
    pub meta: SessionMeta,
    pub series: SampleSeries,
}

/// Outcome of analyzing one job. `session` is `None` when no runs were found.
#[derive(Debug, Clone)]
pub struct SessionReport {
    pub id: String,
    pub session: Option<Session>,
    pub jibes: Vec<Jibe>,
}

/// Analyzes independent sessions in parallel on a dedicated rayon pool.
///
/// Each session is analyzed on its own; results come back in job order.
#[derive(Clone)]
pub struct SessionQueue {
    pool: Arc<rayon::ThreadPool>,
    config: AnalysisConfig,
}

impl SessionQueue {
    /// `threads` of `None` lets rayon pick one per core.
    pub fn new(config: AnalysisConfig, threads: Option<usize>) -> Result<Self, AppError> {
        let mut builder = rayon::ThreadPoolBuilder::new().thread_name(|i| format!("foilstats-{i}"));
        if let Some(n) = threads {
            builder = builder.num_threads(n);
        }
        Ok(Self {
            pool: Arc::new(builder.build()?),
            config,
        })
    }

    pub fn config(&self) -> &AnalysisConfig {
        &self.config
    }

    /// Detects runs (and jibes, when `with_jibes`) for every job.
    pub fn analyze_batch(&self, jobs: Vec<SessionJob>, with_jibes: bool) -> Vec<SessionReport> {
        let total = jobs.len();
        let config = self.config;

        let reports: Vec<SessionReport> = self.pool.install(|| {
            jobs.into_par_iter()
                .map(|job| {
                    let id = job.meta.id.clone();
                    let session = Session::from_series(job.meta, job.series, &config.runs);
                    let jibes = match (&session, with_jibes) {
                        (Some(s), true) => s.jibes(&config.jibes),
                        _ => Vec::new(),
                    };
                    SessionReport { id, session, jibes }
                })
                .collect()
        });

        let imported = reports.iter().filter(|r| r.session.is_some()).count();
        info!("Analyzed {total} sessions, {imported} with runs");
        reports
    }

    /// Re-runs detection on every session with the queue's config. Returns
    /// how many sessions had raw data to reprocess.
    pub fn reprocess_all(&self, sessions: &mut [Session]) -> usize {
        let config = self.config.runs;
        let reprocessed = self.pool.install(|| {
            sessions
                .par_iter_mut()
                .map(|s| usize::from(s.reprocess(&config)))
                .sum::<usize>()
        });
        info!("Reprocessed {reprocessed} of {} sessions", sessions.len());
        reprocessed
    }
}
