use crate::config::SiteConfig;
use anyhow::{Context, Result};
use std::{
    env,
    path::{Path, PathBuf},
};

pub fn check_required_command_installed(config: &SiteConfig) -> Result<()> {
    check_installed(&config.git.command, &config.root)?;
    check_installed(&config.generator.program(), &config.root)?;
    Ok(())
}

// Relative programs like `./gen.sh` resolve against `root`, where they run.
fn check_installed(command: &str, root: &Path) -> Result<PathBuf> {
    which::which_in(command, env::var_os("PATH"), root).with_context(|| not_found_message(command))
}

fn not_found_message(command: &str) -> String {
    format!("[checker] `{command}` not found. Please install `{command}` first.")
}
