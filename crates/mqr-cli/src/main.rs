//! mqr CLI: run metric reports over CSV datasets.
//!
//! Exit codes: 0 when every metric succeeded, 1 on I/O or definition errors,
//! 2 when the run completed but some entries failed.

use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use mqr_core::config::ReportConfig;
use mqr_core::snapshot::Snapshot;
use mqr_exec::{apply_report_config, parse_yaml_report, Report, ReportConfigDoc};
use mqr_io::{CsvReader, SnapshotWriter};

#[derive(Parser)]
#[command(name = "mqr")]
#[command(about = "Memoized regression metric reports", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a report against a current (and optional reference) dataset
    Run {
        /// Current dataset (CSV with header)
        #[arg(long)]
        current: PathBuf,

        /// Reference dataset (CSV with header)
        #[arg(long)]
        reference: Option<PathBuf>,

        /// Report definition YAML
        #[arg(short, long)]
        report: PathBuf,

        /// Write the snapshot here instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Worker threads (overrides env and report config)
        #[arg(long)]
        max_parallel: Option<usize>,

        /// Single-line JSON output
        #[arg(long)]
        compact: bool,
    },

    /// Check a report definition without reading any data
    Validate {
        /// Report definition YAML
        #[arg(short, long)]
        report: PathBuf,
    },
}

fn main() -> ExitCode {
    init_tracing();
    let cli = Cli::parse();

    match cli.command {
        Commands::Run {
            current,
            reference,
            report,
            output,
            max_parallel,
            compact,
        } => match run_report(
            &current,
            reference.as_deref(),
            &report,
            output.as_deref(),
            max_parallel,
            compact,
        ) {
            Ok(snapshot) if snapshot.manifest.is_clean() => ExitCode::SUCCESS,
            Ok(snapshot) => {
                eprintln!(
                    "{} of {} metrics failed: {}",
                    snapshot.manifest.failed.len(),
                    snapshot.entries.len(),
                    snapshot.manifest.failed.join(", ")
                );
                ExitCode::from(2)
            }
            Err(e) => {
                eprintln!("Error: {}", e);
                ExitCode::from(1)
            }
        },
        Commands::Validate { report } => match validate_report(&report) {
            Ok(()) => {
                println!("✓ Report is valid");
                ExitCode::SUCCESS
            }
            Err(e) => {
                eprintln!("Validation failed: {}", e);
                ExitCode::from(1)
            }
        },
    }
}

fn init_tracing() {
    // Logs go to stderr so stdout carries only the snapshot.
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_env("MQR_LOG").unwrap_or_else(|_| EnvFilter::new("info")))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

/// Layer configuration: environment, then the report file, then CLI flags.
fn resolve_config(
    mut cfg: ReportConfig,
    doc: &ReportConfigDoc,
    max_parallel: Option<usize>,
) -> ReportConfig {
    apply_report_config(&mut cfg, doc);
    if let Some(n) = max_parallel {
        cfg.max_parallel_tasks = n.max(1);
    }
    cfg
}

fn run_report(
    current: &Path,
    reference: Option<&Path>,
    report_path: &Path,
    output: Option<&Path>,
    max_parallel: Option<usize>,
    compact: bool,
) -> Result<Snapshot, Box<dyn std::error::Error>> {
    let yaml = fs::read_to_string(report_path)?;
    let parsed = parse_yaml_report(&yaml)?;
    let config = resolve_config(ReportConfig::from_env(), &parsed.config, max_parallel);

    let current = CsvReader::from_path(current)?.read_dataset()?;
    let reference = match reference {
        Some(path) => Some(CsvReader::from_path(path)?.read_dataset()?),
        None => None,
    };

    let snapshot = Report::new(parsed.metrics)
        .with_config(config)
        .run(current, reference, parsed.definition)?;

    match output {
        Some(path) => {
            let writer = SnapshotWriter::to_path(path)?;
            let mut writer = if compact { writer.compact() } else { writer };
            writer.write(&snapshot)?;
            info!(path = %path.display(), "snapshot written");
        }
        None => {
            let writer = SnapshotWriter::to_writer(std::io::stdout().lock());
            let mut writer = if compact { writer.compact() } else { writer };
            writer.write(&snapshot)?;
        }
    }

    Ok(snapshot)
}

fn validate_report(report_path: &Path) -> Result<(), Box<dyn std::error::Error>> {
    let yaml = fs::read_to_string(report_path)?;
    let parsed = parse_yaml_report(&yaml)?;
    let config = resolve_config(ReportConfig::from_env(), &parsed.config, None);
    let report = Report::new(parsed.metrics).with_config(config);

    let mut invalid = Vec::new();
    for (id, checked) in report.validate() {
        match checked {
            Ok(fp) if parsed.definition.resolve(fp.task()).is_none() => {
                invalid.push(format!("{id}: unknown regression task '{}'", fp.task()))
            }
            Ok(fp) => println!("  {id}: {fp}"),
            Err(e) => invalid.push(format!("{id}: {e}")),
        }
    }
    if invalid.is_empty() {
        Ok(())
    } else {
        Err(invalid.join("; ").into())
    }
}
