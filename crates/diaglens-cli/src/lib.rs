pub mod analyze;
pub mod args;
pub mod config;
pub mod report;

pub use args::Cli;

use analyze::analyze_bundle;
use chrono::Utc;
use config::ConfigError;
use diaglens_sources::ArchiveError;
use diaglens_types::Severity;
use is_terminal::IsTerminal;
use owo_colors::OwoColorize;
use std::fmt;
use tracing_subscriber::EnvFilter;

/// Run failure with its process exit code: 1 for archive/parse problems,
/// 2 for configuration problems.
#[derive(Debug)]
pub enum RunError {
    Config(ConfigError),
    Archive(ArchiveError),
    Io(std::io::Error),
    Unsupported(String),
}

impl RunError {
    pub fn exit_code(&self) -> i32 {
        match self {
            RunError::Config(_) | RunError::Unsupported(_) => 2,
            RunError::Archive(_) | RunError::Io(_) => 1,
        }
    }
}

impl fmt::Display for RunError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RunError::Config(err) => write!(f, "{}", err),
            RunError::Archive(err) => write!(f, "{}", err),
            RunError::Io(err) => write!(f, "cannot write report: {}", err),
            RunError::Unsupported(msg) => write!(f, "{}", msg),
        }
    }
}

impl std::error::Error for RunError {}

impl From<ConfigError> for RunError {
    fn from(err: ConfigError) -> Self {
        RunError::Config(err)
    }
}

impl From<ArchiveError> for RunError {
    fn from(err: ArchiveError) -> Self {
        RunError::Archive(err)
    }
}

impl From<std::io::Error> for RunError {
    fn from(err: std::io::Error) -> Self {
        RunError::Io(err)
    }
}

pub fn run(cli: Cli) -> Result<(), RunError> {
    init_tracing(&cli);

    if cli.batch {
        return Err(RunError::Unsupported(
            "batch mode is a documented extension point and is not implemented yet".to_string(),
        ));
    }

    // Configuration failures are fatal before any extraction: thresholds
    // drive every later decision.
    let (thresholds, recommendations) = config::load(cli.config.as_deref())?;

    let analysis = analyze_bundle(&cli.archive, &thresholds, &recommendations)?;
    let generated_at = Utc::now();

    print_summary(&analysis);

    std::fs::create_dir_all(&cli.output)?;
    if cli.format.wants_json() {
        let path = cli.output.join("health_report.json");
        let text = report::json::render(&analysis, generated_at)
            .map_err(|e| RunError::Io(std::io::Error::other(e)))?;
        std::fs::write(&path, text)?;
        println!("JSON report written to {}", path.display());
    }
    if cli.format.wants_markdown() {
        let path = cli.output.join("health_report.md");
        std::fs::write(&path, report::markdown::render(&analysis, generated_at))?;
        println!("Markdown report written to {}", path.display());
    }

    Ok(())
}

fn init_tracing(cli: &Cli) {
    let level = if cli.verbose {
        "debug"
    } else {
        cli.log_level.as_filter()
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

fn print_summary(analysis: &analyze::Analysis) {
    let summary = &analysis.report.summary;
    let colored = std::io::stdout().is_terminal();

    println!("Cluster: {}", analysis.snapshot.cluster_name);
    println!("Score:   {}/100", summary.score);

    let critical = format!("{} critical", summary.critical_count);
    let warning = format!("{} warning", summary.warning_count);
    if colored {
        println!(
            "Issues:  {}, {}, {} info",
            if summary.critical_count > 0 {
                critical.red().to_string()
            } else {
                critical
            },
            if summary.warning_count > 0 {
                warning.yellow().to_string()
            } else {
                warning
            },
            summary.info_count
        );
    } else {
        println!(
            "Issues:  {}, {}, {} info",
            critical, warning, summary.info_count
        );
    }
    println!(
        "Checks:  {} run, {} skipped (missing data)",
        summary.checks_run, summary.checks_skipped
    );

    for issue in analysis
        .report
        .issues_with_severity(Severity::Critical)
    {
        println!("  [critical] {}", issue.summary);
    }
    if !analysis.snapshot.warnings.is_empty() {
        println!(
            "Note: {} source(s) degraded during parsing; see report",
            analysis.snapshot.warnings.len()
        );
    }
}
