use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{ArgAction, Parser, Subcommand};
use pulsewatch::{settings, source};
use pulsewatch_engine::{parse_duration, Engine, ExportFormat};
use pulsewatch_types::{AlertSeverity, BenchmarkProfile};
use serde::Serialize;
use tracing_subscriber::EnvFilter;

const DEFAULT_LOG_FILTER: &str = "pulsewatch=info,pulsewatch_engine=info";

#[derive(Parser, Debug)]
#[command(name = "pulsewatch")]
#[command(about = "Metric analytics for component health: trends, anomalies, alerts and benchmarks")]
struct Args {
    /// Config file (TOML or JSON)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Sample files to replay before running the command (JSON lines or a JSON array)
    #[arg(short, long = "file", global = true)]
    files: Vec<PathBuf>,

    /// Analysis window in hours
    #[arg(long, default_value = "24", global = true)]
    hours: u64,

    /// Write the result here instead of stdout
    #[arg(short, long, global = true)]
    output: Option<PathBuf>,

    /// More logging (-v debug, -vv trace); RUST_LOG takes precedence
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Health of every component
    Overview,

    /// Health of one component and its metrics
    Component { name: String },

    /// Trend, anomalies and recommendations for one series
    Analyze { component: String, metric: String },

    /// Alerts raised from current health and anomalies
    Alerts {
        /// Only alerts of this severity (low, medium, high, critical)
        #[arg(long)]
        severity: Option<AlertSeverity>,
    },

    /// Dump stored samples
    Export {
        #[arg(long)]
        component: Option<String>,

        #[arg(long)]
        metric: Option<String>,

        /// json or csv
        #[arg(long, default_value = "json")]
        format: ExportFormat,
    },

    /// Run a synthetic benchmark and print its report
    Bench {
        #[arg(long)]
        component: String,

        /// load, stress or endurance
        #[arg(long, default_value = "load")]
        profile: BenchmarkProfile,

        /// How long to run (e.g. "30s", "2m")
        #[arg(long, default_value = "1m")]
        duration: String,
    },

    /// Delete samples older than the retention horizon
    Cleanup {
        /// Retention in days; defaults to the configured value
        #[arg(long)]
        days: Option<u64>,
    },
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_tracing(args.verbose);

    let config = settings::load(args.config.as_deref())?;
    let engine = Engine::builder().config(config).build()?;

    let rt = tokio::runtime::Runtime::new()?;
    let output = rt.block_on(run(&engine, &args))?;

    write_output(args.output.as_deref(), &output)
}

fn init_tracing(verbose: u8) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| match verbose {
        0 => EnvFilter::new(DEFAULT_LOG_FILTER),
        1 => EnvFilter::new("pulsewatch=debug,pulsewatch_engine=debug"),
        _ => EnvFilter::new("pulsewatch=trace,pulsewatch_engine=trace"),
    });

    // Logs go to stderr so stdout stays machine readable
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

async fn run(engine: &Engine, args: &Args) -> Result<String> {
    for path in &args.files {
        source::replay(engine, path).await?;
    }

    let hours = args.hours;
    match &args.command {
        Command::Overview => to_json(&engine.system_overview(hours).await?),
        Command::Component { name } => to_json(&engine.component_summary(name, hours).await?),
        Command::Analyze { component, metric } => {
            to_json(&engine.analyze(component, metric, hours).await?)
        }
        Command::Alerts { severity } => to_json(&engine.alerts(hours, *severity).await?),
        Command::Export {
            component,
            metric,
            format,
        } => Ok(engine
            .export(component.as_deref(), metric.as_deref(), hours, *format)
            .await?),
        Command::Bench {
            component,
            profile,
            duration,
        } => {
            let duration = parse_duration(duration)?;
            let id = engine
                .start_benchmark_for(component, *profile, duration)
                .await?;
            let status = engine.wait_for_benchmark(&id).await?;
            tracing::info!(%id, %status, "benchmark finished");
            to_json(&engine.benchmark_results(&id).await?)
        }
        Command::Cleanup { days } => {
            let deleted = match days {
                Some(days) => engine.cleanup(*days).await?,
                None => engine.cleanup_default().await?,
            };
            to_json(&serde_json::json!({ "deleted": deleted }))
        }
    }
}

fn to_json<T: Serialize>(value: &T) -> Result<String> {
    Ok(serde_json::to_string_pretty(value)?)
}

fn write_output(path: Option<&Path>, output: &str) -> Result<()> {
    match path {
        Some(path) => {
            fs::write(path, output).with_context(|| format!("failed to write {}", path.display()))?;
            tracing::info!(path = %path.display(), "output written");
        }
        None => println!("{output}"),
    }
    Ok(())
}
