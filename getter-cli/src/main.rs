//! Getter CLI - parallel chunked HTTP downloader
//!
//! ```text
//! getter <URL_FILE> <WORKERS> <DOWNLOAD_DIR>
//! ```
//!
//! Exits with 0 when every URL was downloaded completely, 1 when any URL or
//! chunk failed, and 2 on usage or configuration errors.

mod args;
mod error;

use std::process::ExitCode;

use clap::Parser;
use getter::dispatcher::{DispatchReport, Dispatcher};
use getter::logging;
use getter::urls::read_url_list;
use tracing::info;

use crate::args::Args;
use crate::error::CliError;

fn main() -> ExitCode {
    let args = Args::parse();

    match run(&args) {
        Ok(report) if report.is_success() => ExitCode::SUCCESS,
        Ok(_) => ExitCode::from(1),
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::from(e.exit_code())
        }
    }
}

fn run(args: &Args) -> Result<DispatchReport, CliError> {
    let resolved = args.resolve(args.load_config_file()?)?;
    let _log_guard =
        logging::init(&resolved.logging).map_err(|e| CliError::Logging(e.to_string()))?;

    let urls = read_url_list(&args.url_file)
        .map_err(|e| CliError::UrlList(format!("{}: {}", args.url_file.display(), e)))?;

    info!(
        version = getter::VERSION,
        urls = urls.len(),
        workers = resolved.downloader.workers,
        output_dir = %resolved.downloader.output_dir.display(),
        "Starting downloads"
    );

    let dispatcher =
        Dispatcher::new(&resolved.downloader).map_err(|e| CliError::Setup(e.to_string()))?;
    let report = dispatcher.run(urls);

    print_summary(&report);
    Ok(report)
}

fn print_summary(report: &DispatchReport) {
    for failed in report.failed_urls() {
        if let Err(e) = &failed.outcome {
            println!("FAILED  {}: {}", failed.url, e);
        }
    }
    println!("{}", report);
}
