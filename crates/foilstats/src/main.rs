//! foilstats CLI
//!
//! Usage:
//!   foilstats analyze <file>... [--config <file>] [--jibes] [--format json|text]
//!   foilstats spots <file>... [--config <file>]
//!
//! Files may be provider streams JSON, GPX, TCX or FIT; the format is taken
//! from the extension, or sniffed from the contents when that is unknown.

use std::path::{Path, PathBuf};
use std::time::SystemTime;

use anyhow::Context as _;
use clap::{Parser, Subcommand, ValueEnum};
use serde::Serialize;
use time::OffsetDateTime;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use foilstats::file_parsers::read_activity_file;
use foilstats::format::{format_distance, format_duration, format_speed};
use foilstats::session_queue::{SessionJob, SessionQueue};
use foilstats::{
    AnalysisConfig, Jibe, JibeSize, ProgressStats, Session, SessionMeta, Spot,
    calculate_progress_stats, group_sessions_into_spots,
};

#[derive(Parser)]
#[command(name = "foilstats")]
#[command(about = "Run, session and jibe analysis for wingfoil recordings", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Detection config (JSON); falls back to $FOILSTATS_CONFIG
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Worker threads for analysis (default: one per core)
    #[arg(long, global = true)]
    threads: Option<usize>,
}

#[derive(Subcommand)]
enum Commands {
    /// Detect runs and print per-session and overall statistics
    Analyze {
        /// Activity files
        #[arg(required = true)]
        files: Vec<PathBuf>,

        /// Also detect jibes
        #[arg(long)]
        jibes: bool,

        #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,
    },

    /// Group sessions into riding spots
    Spots {
        /// Activity files
        #[arg(required = true)]
        files: Vec<PathBuf>,

        #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    Json,
    Text,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct JibeOutput<'a> {
    #[serde(flatten)]
    jibe: &'a Jibe,
    size: JibeSize,
    color: &'static str,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct SessionOutput<'a> {
    #[serde(flatten)]
    session: &'a Session,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    jibes: Vec<JibeOutput<'a>>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct AnalyzeOutput<'a> {
    sessions: Vec<SessionOutput<'a>>,
    skipped: Vec<String>,
    progress: Option<ProgressStats>,
}

fn init_logging() {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn main() -> anyhow::Result<()> {
    init_logging();
    let cli = Cli::parse();

    let config = AnalysisConfig::load(cli.config.as_deref())?;
    let queue = SessionQueue::new(config, cli.threads)?;

    match cli.command {
        Commands::Analyze {
            files,
            jibes,
            format,
        } => run_analyze(&queue, &files, jibes, format),
        Commands::Spots { files, format } => run_spots(&queue, &files, format),
    }
}

/// Reads and parses one activity file into a job.
fn load_job(path: &Path) -> anyhow::Result<SessionJob> {
    let parsed = read_activity_file(path).with_context(|| format!("loading {}", path.display()))?;

    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "session".to_string());

    let date = match parsed.started_at {
        Some(date) => date,
        None => {
            let modified: SystemTime = std::fs::metadata(path)?.modified()?;
            OffsetDateTime::from(modified)
        }
    };

    Ok(SessionJob {
        meta: SessionMeta::new(format!("session_{stem}"), parsed.name.unwrap_or(stem), date),
        series: parsed.series,
    })
}

fn load_jobs(files: &[PathBuf]) -> anyhow::Result<Vec<SessionJob>> {
    files.iter().map(|p| load_job(p)).collect()
}

fn run_analyze(queue: &SessionQueue, files: &[PathBuf], with_jibes: bool, format: OutputFormat) -> anyhow::Result<()> {
    let mut reports = queue.analyze_batch(load_jobs(files)?, with_jibes);
    // jibes are already computed; the raw streams are not part of the report
    for session in reports.iter_mut().filter_map(|r| r.session.as_mut()) {
        session.raw_data = None;
    }

    let skipped: Vec<String> = reports
        .iter()
        .filter(|r| r.session.is_none())
        .map(|r| r.id.clone())
        .collect();
    let sessions: Vec<Session> = reports.iter().filter_map(|r| r.session.clone()).collect();
    let progress = calculate_progress_stats(&sessions);

    match format {
        OutputFormat::Json => {
            let output = AnalyzeOutput {
                sessions: reports
                    .iter()
                    .filter_map(|r| {
                        r.session.as_ref().map(|session| SessionOutput {
                            session,
                            jibes: r
                                .jibes
                                .iter()
                                .map(|jibe| JibeOutput {
                                    jibe,
                                    size: jibe.size(),
                                    color: jibe.size().color(),
                                })
                                .collect(),
                        })
                    })
                    .collect(),
                skipped,
                progress,
            };
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
        OutputFormat::Text => {
            for report in &reports {
                let Some(session) = &report.session else {
                    continue;
                };
                print_session(session);
                if with_jibes {
                    print_jibes(&report.jibes);
                }
            }
            for id in &skipped {
                println!("{id}: no runs detected");
            }
            if let Some(progress) = &progress {
                print_progress(progress);
            }
        }
    }

    Ok(())
}

fn run_spots(queue: &SessionQueue, files: &[PathBuf], format: OutputFormat) -> anyhow::Result<()> {
    let sessions: Vec<Session> = queue
        .analyze_batch(load_jobs(files)?, false)
        .into_iter()
        .filter_map(|r| r.session)
        .collect();
    let spots = group_sessions_into_spots(&sessions);

    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&spots)?),
        OutputFormat::Text => spots.iter().for_each(print_spot),
    }
    Ok(())
}

fn print_session(session: &Session) {
    let stats = &session.stats;
    println!("\n{}", "=".repeat(60));
    println!("{} ({})", session.name, session.date.date());
    println!("{}", "=".repeat(60));
    println!(
        "  {} runs, riding {} over {} (session {} / {})",
        stats.number_of_runs,
        format_duration(stats.total_riding_time),
        format_distance(stats.total_riding_distance),
        format_duration(session.total_duration),
        format_distance(session.total_distance),
    );
    println!(
        "  longest {} / {}, best avg {}, best max {}",
        format_duration(stats.longest_run_duration),
        format_distance(stats.longest_run_distance),
        format_speed(stats.best_average_speed),
        format_speed(stats.best_max_speed),
    );
    if let (Some(avg), Some(max)) = (stats.average_heartrate, stats.max_heartrate) {
        println!("  heartrate avg {avg:.0} bpm, max {max:.0} bpm");
    }

    for run in &session.runs {
        println!(
            "  #{:<3} {:>8}  {:>8}  avg {:>11}  max {:>11}",
            run.id,
            format_duration(run.duration),
            format_distance(run.distance),
            format_speed(run.average_speed),
            format_speed(run.max_speed),
        );
    }
}

fn print_jibes(jibes: &[Jibe]) {
    println!("  {} jibes", jibes.len());
    for jibe in jibes {
        println!(
            "    t={:<6} {:>5.0}° -> {:>5.0}°  ({:.0}°, {:?})",
            format_duration(jibe.time),
            jibe.heading_before,
            jibe.heading_after,
            jibe.angle_change,
            jibe.size(),
        );
    }
}

fn print_progress(progress: &ProgressStats) {
    println!("\n{}", "=".repeat(60));
    println!("Progress over {} sessions", progress.total_sessions);
    println!("{}", "=".repeat(60));
    println!(
        "  {} runs ({:.1} per session), riding {} over {}",
        progress.total_runs,
        progress.average_runs_per_session,
        format_duration(progress.total_riding_time),
        format_distance(progress.total_riding_distance),
    );
    println!(
        "  best run {} / {}, best max {}",
        format_duration(progress.best_run_duration),
        format_distance(progress.best_run_distance),
        format_speed(progress.best_max_speed),
    );
    let trend = &progress.recent_trend;
    println!(
        "  trend: run duration {:+.1}%, run distance {:+.1}%, runs/session {:+.1}%",
        trend.run_duration, trend.run_distance, trend.runs_per_session
    );
}

fn print_spot(spot: &Spot) {
    println!(
        "{:<20} {:>3} sessions  riding {:<8}  best {:<11}  {:.1} runs/session  last {}  ({:.4}, {:.4})",
        spot.name,
        spot.sessions_count,
        format_duration(spot.total_duration),
        format_speed(spot.best_speed),
        spot.avg_runs_per_session,
        spot.last_visit.date(),
        spot.coordinates.lat,
        spot.coordinates.lng,
    );
}
