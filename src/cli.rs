//! CLI argument parsing for tbt-impact

use clap::{Parser, ValueEnum};
use std::path::PathBuf;

/// Output format for attribution reports
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable summary (default)
    Text,
    /// JSON format for machine parsing
    Json,
}

#[derive(Parser, Debug)]
#[command(name = "tbt-impact")]
#[command(version)]
#[command(about = "Attribute total blocking time to main-thread tasks", long_about = None)]
pub struct Cli {
    /// Trace snapshot (JSON) to attribute
    #[arg(value_name = "SNAPSHOT")]
    pub snapshot: PathBuf,

    /// Attribution config file (TOML)
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Output format
    #[arg(long = "format", value_enum, default_value = "text")]
    pub format: OutputFormat,

    /// Number of tasks listed in text output
    #[arg(long = "top", value_name = "N", default_value = "10")]
    pub top: usize,

    /// Worker threads for per-task passes (overrides the config file)
    #[arg(short = 'j', long = "threads", value_name = "N")]
    pub threads: Option<usize>,

    /// Enable debug tracing output to stderr
    #[arg(long = "debug")]
    pub debug: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_defaults() {
        let cli = Cli::parse_from(["tbt-impact", "trace.json"]);
        assert_eq!(cli.snapshot, PathBuf::from("trace.json"));
        assert_eq!(cli.format, OutputFormat::Text);
        assert_eq!(cli.top, 10);
        assert!(cli.config.is_none());
        assert!(cli.threads.is_none());
        assert!(!cli.debug);
    }

    #[test]
    fn test_cli_all_flags() {
        let cli = Cli::parse_from([
            "tbt-impact",
            "--format",
            "json",
            "--top",
            "3",
            "-j",
            "4",
            "--config",
            "impact.toml",
            "--debug",
            "trace.json",
        ]);
        assert_eq!(cli.format, OutputFormat::Json);
        assert_eq!(cli.top, 3);
        assert_eq!(cli.threads, Some(4));
        assert_eq!(cli.config, Some(PathBuf::from("impact.toml")));
        assert!(cli.debug);
    }

    #[test]
    fn test_cli_requires_snapshot() {
        assert!(Cli::try_parse_from(["tbt-impact"]).is_err());
    }
}
