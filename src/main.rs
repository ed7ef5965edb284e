use clap::Parser;
use std::process::ExitCode;

use photoframe::cli::{self, CliArgs};
use photoframe::logger;

fn main() -> ExitCode {
    let args = CliArgs::parse();

    // Run log (overwrites the previous run's log); a missing log is not fatal
    let log_path = args.log.clone().unwrap_or_else(logger::default_log_path);
    if let Err(e) = logger::init(&log_path) {
        eprintln!("warning: cannot open log file {}: {}", log_path.display(), e);
    }
    logger::set_max_level(args.log_level);

    cli::run(args)
}
