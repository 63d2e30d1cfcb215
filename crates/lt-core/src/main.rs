//! lt-core CLI: scan telemetry CSV exports for abnormal events.

use clap::Parser;
use lt_core::exit_codes::ExitCode;
use lt_core::{engine, select};
use lt_config::ScanConfig;
use lt_report::{ReportLayout, WrittenReports};
use std::path::PathBuf;
use tracing::{error, info};

/// Find threshold crossings and state toggles in batches of CSV log files.
#[derive(Parser, Debug)]
#[command(name = "lt-core", version, about)]
struct Cli {
    /// Path to the JSON document containing all run parameters
    #[arg(short = 'j', long = "input-json")]
    input_json: PathBuf,

    /// Enable debug logging
    #[arg(short, long)]
    verbose: bool,
}

fn main() {
    let cli = Cli::parse();

    let default_filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let code = match run(&cli) {
        Ok(written) => {
            for path in &written.tables {
                info!(file = %path.display(), "report written");
            }
            ExitCode::Ok
        }
        Err(e) => {
            let code = ExitCode::from(&e);
            if code.is_error() {
                error!(code = e.code(), "{e}");
            } else {
                info!("{e}");
            }
            code
        }
    };
    std::process::exit(code.as_i32());
}

fn run(cli: &Cli) -> lt_common::Result<WrittenReports> {
    let config = ScanConfig::from_file(&cli.input_json)?;
    let run_config = config.compile()?;

    let files = select::select_files(&run_config.selection);
    info!(count = files.len(), "files selected for processing");

    let result = engine::run(&run_config.detection, &files)?;

    let layout = ReportLayout::prepare(&run_config.output_directory)?;
    let written = lt_report::write_reports(&result, &layout, Some(&cli.input_json))?;
    info!(directory = %layout.dir.display(), "all results saved");
    Ok(written)
}
