use anyhow::{Context, Result};
use clap::Parser;
use env_logger::Env;
use log::{debug, error, info};
use std::process::ExitCode;

use inbox_export::args::Args;
use inbox_export::config::{self, Config};

fn main() -> ExitCode {
    // Both RUST_LOG and the server address may live in .env, so it has to be
    // loaded before the logger starts and before clap reads the environment.
    let dotenv = dotenvy::dotenv();

    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();

    if let Err(e) = dotenv {
        debug!("no .env loaded: {}", e);
    }

    match export() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{:#}", e);
            ExitCode::FAILURE
        }
    }
}

fn export() -> Result<()> {
    let args = Args::parse();

    let settings = config::get_config(args.config.as_deref())?;
    let config = Config::try_from(args.overwrite_config(settings))
        .context("invalid configuration")?;

    let summary = inbox_export::run(&config)
        .with_context(|| format!("export from {} failed", config.connection.address()))?;

    if let Some(written) = summary.written {
        info!(
            "{} of {} messages written to {}",
            written,
            summary.fetched,
            summary.output.display()
        );
    }

    Ok(())
}
