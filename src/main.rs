use anyhow::{Context, Result};
use clap::Parser;
use tbt_impact::attribution::TbtImpactTasks;
use tbt_impact::cli::{Cli, OutputFormat};
use tbt_impact::config::AttributionConfig;
use tbt_impact::report;
use tbt_impact::snapshot::TraceSnapshot;
use tracing_subscriber::EnvFilter;

/// Initialize tracing subscriber for log output
///
/// `--debug` forces TRACE; otherwise `RUST_LOG` decides (warnings by default).
fn init_tracing(debug: bool) {
    let filter = if debug {
        EnvFilter::from_default_env().add_directive(tracing::Level::TRACE.into())
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn load_config(args: &Cli) -> Result<AttributionConfig> {
    let mut config = match &args.config {
        Some(path) => AttributionConfig::load(path)
            .with_context(|| format!("loading config {}", path.display()))?,
        None => AttributionConfig::default(),
    };

    if let Some(threads) = args.threads {
        config.worker_threads = threads;
    }
    config
        .validate()
        .map_err(|msg| anyhow::anyhow!("invalid configuration: {}", msg))?;

    Ok(config)
}

fn main() -> Result<()> {
    let args = Cli::parse();

    init_tracing(args.debug);

    let config = load_config(&args)?;
    let snapshot = TraceSnapshot::load(&args.snapshot)
        .with_context(|| format!("loading snapshot {}", args.snapshot.display()))?;

    let report = TbtImpactTasks::with_default_primitive(&snapshot, &snapshot, &snapshot)
        .with_config(config)
        .compute(&snapshot.input())
        .context("attributing blocking time")?;

    match args.format {
        OutputFormat::Text => print!("{}", report::to_text(&report, args.top)),
        OutputFormat::Json => println!("{}", report::to_json(&report)?),
    }

    Ok(())
}
