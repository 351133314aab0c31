mod cli;
mod config;
mod publish;
mod utils;

use anyhow::{Context, Result};
use clap::Parser;
use cli::Cli;
use config::SiteConfig;
use publish::{Outcome, Publisher};
use std::process::ExitCode;
use utils::{checker::check_required_command_installed, command::SystemRunner};

fn main() -> ExitCode {
    match run(&Cli::parse()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            log!("error"; "{err:#}");
            ExitCode::FAILURE
        }
    }
}

#[rustfmt::skip]
fn run(cli: &Cli) -> Result<()> {
    let config = {
        let config_file = cli.root.join(&cli.config);
        let mut config =
            if config_file.exists() { SiteConfig::from_file(&config_file)? }
            else { SiteConfig::default() };
        config.update_with_cli(cli);
        config.validate()?;
        config
    };

    let mut runner = SystemRunner;
    let mut publisher = Publisher::new(&config, &mut runner);

    if cli.dry_run {
        publisher.plan()?.iter().for_each(|line| log!("plan"; "{line}"));
        return Ok(());
    }

    check_required_command_installed(&config)?;

    let outcome = publisher.publish().map_err(|err| {
        if let Some(step) = err.step() { log!("error"; "aborted during `{step}`, later steps were skipped"); }
        err
    });

    match outcome.context("publish aborted")? {
        Outcome::Published { branch, commit: Some(id) } => log!("publish"; "`{branch}` is now at `{id}`"),
        Outcome::Published { branch, commit: None } => log!("publish"; "site is live on `{branch}`"),
        Outcome::Unchanged { branch } => log!("publish"; "no new commit on `{branch}`"),
    }

    Ok(())
}
