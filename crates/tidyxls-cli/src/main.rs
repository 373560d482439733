use std::{process, str::FromStr};

use clap::Parser;
use log::{LevelFilter, debug, error, info};

use tidyxls_cli::{Args, CliError, error_adapter::render_report};

fn main() {
    miette::set_panic_hook();

    let args = Args::parse();

    let log_level = LevelFilter::from_str(&args.log_level).unwrap_or_else(|_| {
        eprintln!(
            "Invalid log level: {}. Using 'warn' instead.",
            args.log_level
        );
        LevelFilter::Warn
    });

    env_logger::Builder::from_env(env_logger::Env::default())
        .filter_level(log_level)
        .init();

    info!(log_level:?; "Starting tidyxls");
    debug!(args:?; "Parsed arguments");

    if let Err(err) = tidyxls_cli::run(&args) {
        let report = match &err {
            CliError::Tidyxls(err) => render_report(err),
            CliError::FormulasFailed { .. } => err.to_string(),
        };
        error!("Failed\n{report}");
        process::exit(1);
    }

    info!("Completed successfully");
}
