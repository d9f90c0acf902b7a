#![cfg_attr(all(not(debug_assertions), not(test)), deny(warnings))]
#![cfg_attr(not(test), deny(clippy::unwrap_used, clippy::expect_used))]

mod cli;
mod error_fmt;
mod logging;
mod ride;

use clap::Parser;
use eyre::Result;

use crate::cli::{Cli, Commands, JSON_MODE};
use crate::error_fmt::{exit_code_for_error, format_error_json, humanize};
use crate::ride::RunOpts;

fn main() {
    let _ = color_eyre::install();
    let cli = Cli::parse();
    let _ = JSON_MODE.set(cli.json);

    if let Err(e) = real_main(cli) {
        tracing::error!(error = %format!("{e:#}"), "command failed");
        if JSON_MODE.get().copied().unwrap_or(false) {
            println!("{}", format_error_json(&e));
        } else {
            eprintln!("{}", humanize(&e));
        }
        std::process::exit(exit_code_for_error(&e));
    }
}

fn real_main(cli: Cli) -> Result<()> {
    let raw = ride::load_config(&cli.config)?;
    logging::init(
        cli.json,
        logging::effective_level(cli.log_level.as_deref(), &raw.logging),
        &raw.logging,
    )?;

    if let Commands::CheckConfig { strict } = cli.cmd {
        return ride::check_config(&cli.config, &raw, strict, cli.json);
    }

    let (cfg, adjustments) = raw.sanitized();
    ride::warn_adjustments(&adjustments);

    match cli.cmd {
        Commands::Run {
            backend,
            ticks,
            cadence,
            throttle_raw,
            brake,
            verbose,
            buzzer_pin,
        } => {
            ride::run(
                &cfg,
                RunOpts {
                    backend,
                    ticks,
                    cadence,
                    throttle_raw,
                    brake,
                    verbose,
                    buzzer_pin,
                },
                cli.json,
            )?;
        }
        Commands::Simulate { scenario, quiet } => {
            ride::simulate(&cfg, &scenario, quiet, cli.json)?;
        }
        Commands::SelfCheck => {
            ride::self_check(&cfg, cli.json)?;
        }
        Commands::CheckConfig { .. } => {}
    }
    Ok(())
}
