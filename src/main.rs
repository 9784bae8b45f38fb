use std::io::{self, Write};
use std::process::ExitCode;

use anyhow::Context;
use clap::Parser;
use wbf::{band, report, WorkedBefore};

mod cli;
mod logging;

use crate::cli::Cli;
use crate::logging::{init_logging, LogConfig};

fn main() -> ExitCode {
    let cli = Cli::parse();
    let log_config = LogConfig {
        level_filter: cli.verbosity.tracing_level_filter(),
        use_env_filter: !cli.verbosity.is_present(),
    };
    if let Err(error) = init_logging(&log_config) {
        eprintln!("error: failed to initialize logging: {error}");
        return ExitCode::FAILURE;
    }

    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(error) => {
            eprintln!("error: {error:#}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: &Cli) -> anyhow::Result<()> {
    let wbf = WorkedBefore::from_config(&cli.config())
        .context("cannot load worked-before data")?;

    if !band::is_known(&cli.band) {
        tracing::warn!("{} is not an ADIF band name.", cli.band);
    }

    let mut out = io::stdout().lock();
    for callsign in &cli.callsign {
        let entities = wbf.fuzzy_match_dxcc(callsign);
        writeln!(out, "{}", report::entities_line(callsign, &entities))?;
        let status = wbf.lookup_verbose(&cli.band, callsign);
        writeln!(out, "{}", report::status_line(&status))?;
    }
    Ok(())
}
