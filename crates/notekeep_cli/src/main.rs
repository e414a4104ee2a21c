//! `notekeep` server executable.
//!
//! # Responsibility
//! - Load the config file named on the command line.
//! - Start logging before anything else touches storage.
//! - Serve HTTP until interrupted.

use clap::Parser;
use log::error;
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Debug, Parser)]
#[command(name = "notekeep", version, about = "Personal note-taking server")]
struct Args {
    /// Path to the TOML config file.
    #[arg(long, short = 'c', value_name = "FILE")]
    config: PathBuf,
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();

    let config = match notekeep_web::config::load(&args.config) {
        Ok(config) => config,
        Err(err) => {
            eprintln!("notekeep: {err}");
            return ExitCode::FAILURE;
        }
    };

    if let Err(err) = notekeep_core::init_logging(&config.log_settings()) {
        eprintln!("notekeep: {err}");
        return ExitCode::FAILURE;
    }

    match notekeep_web::serve(config).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!("event=serve module=cli status=error error={err}");
            eprintln!("notekeep: {err}");
            ExitCode::FAILURE
        }
    }
}
