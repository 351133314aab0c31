use clap::Parser;
use std::path::PathBuf;

/// Regenerate the site into a fresh checkout of the publish repository and push it
#[derive(Parser, Debug, Clone)]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Source root of the site
    #[arg(short, long, default_value = "./")]
    pub root: PathBuf,

    /// Config file path related to `root`
    #[arg(short = 'C', long, default_value = "pubsite.toml")]
    pub config: PathBuf,

    /// Repository to clone and push to, overrides `[publish] remote`
    #[arg(long)]
    pub remote: Option<String>,

    /// Branch to push to, defaults to the remote's default branch
    #[arg(short, long)]
    pub branch: Option<String>,

    /// Commit message
    #[arg(short, long)]
    pub message: Option<String>,

    /// Commit and push even when nothing changed
    #[arg(long)]
    pub allow_empty: bool,

    /// Print the steps without running any of them
    #[arg(short = 'n', long)]
    pub dry_run: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn runs_without_arguments() {
        let cli = Cli::parse_from(["pubsite"]);

        assert_eq!(cli.root, PathBuf::from("./"));
        assert_eq!(cli.config, PathBuf::from("pubsite.toml"));
        assert!(cli.remote.is_none());
        assert!(!cli.dry_run);
    }
}
