use anyhow::{Context, Result};
use clap::Parser;
use statement_merger::logging::{init_logging, LogConfig, LogFormat};
use statement_merger::{has_statement_files, write_outputs, StatementProcessor, VERSION};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{error, info, warn};

const LOG_FILE_NAME: &str = "logs.log";

/// Merge TBC and Bank of Georgia statement exports into one statement.
#[derive(Debug, Parser)]
#[command(name = "statement-merger", version)]
struct Cli {
    /// Directory holding the .csv / .xlsx exports
    #[arg(long, default_value = "data/input")]
    input_dir: PathBuf,

    /// Root of the output tree; each run gets its own subdirectory
    #[arg(long, default_value = "data/output")]
    output_dir: PathBuf,

    /// Run subdirectory name (default: local time, YYYYMMDD_HHMMSS)
    #[arg(long)]
    run_id: Option<String>,

    /// -v debug, -vv trace
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    #[arg(long, value_enum, default_value_t = LogFormat::Pretty)]
    log_format: LogFormat,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let run_id = cli
        .run_id
        .clone()
        .unwrap_or_else(|| chrono::Local::now().format("%Y%m%d_%H%M%S").to_string());
    let run_dir = cli.output_dir.join(&run_id);

    ensure_dir(&cli.input_dir)?;
    ensure_dir(&run_dir)?;

    let log_config = LogConfig::from_verbosity(cli.verbose)
        .with_format(cli.log_format)
        .with_log_file(Some(run_dir.join(LOG_FILE_NAME)));
    init_logging(&log_config).context("failed to initialise logging")?;

    info!(version = VERSION, run = %run_id, "statement-merger starting");

    if !has_statement_files(&cli.input_dir) {
        warn!(
            dir = %cli.input_dir.display(),
            "no statements found, put .csv or .xlsx exports there and run again"
        );
    }

    if let Err(e) = run(&cli.input_dir, &run_dir) {
        error!(error = %e, "run failed");
        return Err(e);
    }

    Ok(())
}

fn run(input_dir: &Path, run_dir: &Path) -> Result<()> {
    let mut processor = StatementProcessor::default();
    processor
        .process_directory(input_dir)
        .with_context(|| format!("processing {}", input_dir.display()))?;

    if !processor.diagnostics().is_empty() {
        warn!(count = processor.diagnostics().len(), "run finished with diagnostics");
    }

    let statement = processor.post_process();
    let paths = write_outputs(&statement, run_dir)
        .with_context(|| format!("writing outputs to {}", run_dir.display()))?;

    info!(
        rows = statement.len(),
        csv = %paths.csv.display(),
        xlsx = %paths.xlsx.display(),
        "done"
    );
    Ok(())
}

fn ensure_dir(dir: &Path) -> Result<()> {
    fs::create_dir_all(dir).with_context(|| format!("failed to create {}", dir.display()))
}
