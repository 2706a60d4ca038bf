// valison/src/main.rs
//! Valison entry point.
//!
//! Exit status: 0 when everything passed, 1 when the document had issues or
//! guard violations, 2 when the command itself failed.

use std::io;
use std::process::ExitCode;

use clap::Parser;
use log::LevelFilter;

use valison::cli::Cli;
use valison::commands::Outcome;
use valison::logger;
use valison::ui::output;

fn main() -> ExitCode {
    // A missing .env file is fine.
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();

    let level = if cli.quiet {
        Some(LevelFilter::Off)
    } else if cli.debug {
        Some(LevelFilter::Debug)
    } else {
        None
    };
    logger::init_logger(level);

    match valison::run(&cli) {
        Ok(Outcome::Clean) => ExitCode::SUCCESS,
        Ok(Outcome::Failed) => ExitCode::from(1),
        Err(e) => {
            let color = output::stderr_supports_color();
            let _ = output::print_error_message(&mut io::stderr(), &format!("{:#}", e), color);
            ExitCode::from(2)
        }
    }
}
