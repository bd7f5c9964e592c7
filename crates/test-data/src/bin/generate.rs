//! Writes a season of synthetic wingfoil sessions to disk, each as provider
//! streams JSON and as GPX.
//!
//! Run with:
//! ```
//! cargo run -p test-data --bin generate
//! ```
//!
//! `FOILSTATS_OUT` (default `./generated`), `FOILSTATS_SESSIONS` (default 12)
//! and `FOILSTATS_SEED` (default 12345) control the output.

use std::path::PathBuf;

use anyhow::Context as _;
use foilstats::streams::StreamsResponse;
use rand::SeedableRng;
use rand::rngs::StdRng;
use test_data::prelude::*;
use time::macros::datetime;
use tracing_subscriber::EnvFilter;

fn env_or<T: std::str::FromStr>(key: &str, default: T) -> anyhow::Result<T> {
    match std::env::var(key) {
        Ok(value) => value
            .parse()
            .map_err(|_| anyhow::anyhow!("{key} has an invalid value: {value}")),
        Err(_) => Ok(default),
    }
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let out_dir: PathBuf = env_or("FOILSTATS_OUT", PathBuf::from("generated"))?;
    let count: usize = env_or("FOILSTATS_SESSIONS", 12)?;
    let seed: u64 = env_or("FOILSTATS_SEED", 12345)?;

    std::fs::create_dir_all(&out_dir)
        .with_context(|| format!("creating {}", out_dir.display()))?;

    let mut rng = StdRng::seed_from_u64(seed);
    let profiles = [
        WingfoilerProfile::beginner(),
        WingfoilerProfile::intermediate(),
        WingfoilerProfile::expert(),
    ];

    // early sessions as a beginner, the last third as an expert
    let first_day = datetime!(2024-04-01 10:00 UTC);
    let sessions: Vec<GeneratedSession> = (0..count)
        .map(|i| {
            let profile = &profiles[i * profiles.len() / count];
            ProceduralGenerator::default()
                .in_region(Region::ALL[i % Region::ALL.len()])
                .generate(profile, first_day + time::Duration::days(i as i64), &mut rng)
        })
        .collect();

    for (i, session) in sessions.iter().enumerate() {
        let stem = format!("session_{:03}", i + 1);

        let streams = serde_json::to_string_pretty(&StreamsResponse::from_series(&session.series))?;
        let json_path = out_dir.join(format!("{stem}.json"));
        std::fs::write(&json_path, streams).with_context(|| format!("writing {}", json_path.display()))?;

        let gpx_path = out_dir.join(format!("{stem}.gpx"));
        std::fs::write(&gpx_path, generate_gpx(&session.series, session.started_at, &session.name))
            .with_context(|| format!("writing {}", gpx_path.display()))?;

        tracing::info!(
            file = %stem,
            samples = session.series.len(),
            runs = session.runs.len(),
            jibes = session.jibe_times.len(),
            "Generated session"
        );
    }

    tracing::info!("Wrote {} sessions to {}", sessions.len(), out_dir.display());
    Ok(())
}
