use clap::{Parser, ValueEnum};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "diaglens")]
#[command(about = "Analyze cluster diagnostic bundles and report health issues", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Path to a diagnostic bundle: a .zip archive or an extracted directory
    pub archive: PathBuf,

    /// Output directory for generated reports
    #[arg(long, short = 'o', default_value = ".")]
    pub output: PathBuf,

    /// Report format(s) to write
    #[arg(long, short = 'f', default_value = "all")]
    pub format: ReportFormat,

    /// Threshold/recommendation overrides (YAML)
    #[arg(long, short = 'c')]
    pub config: Option<PathBuf>,

    /// Verbose output (implies --log-level debug)
    #[arg(long, short = 'v')]
    pub verbose: bool,

    #[arg(long, default_value = "info")]
    pub log_level: LogLevel,

    /// Analyze every bundle under the archive path (extension point,
    /// not implemented yet)
    #[arg(long)]
    pub batch: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ReportFormat {
    Json,
    Markdown,
    All,
}

impl ReportFormat {
    pub fn wants_json(&self) -> bool {
        matches!(self, ReportFormat::Json | ReportFormat::All)
    }

    pub fn wants_markdown(&self) -> bool {
        matches!(self, ReportFormat::Markdown | ReportFormat::All)
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    pub fn as_filter(&self) -> &'static str {
        match self {
            LogLevel::Error => "error",
            LogLevel::Warn => "warn",
            LogLevel::Info => "info",
            LogLevel::Debug => "debug",
            LogLevel::Trace => "trace",
        }
    }
}
