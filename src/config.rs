use crate::cli::Cli;
use educe::Educe;
use serde::Deserialize;
use std::{
    borrow::Cow,
    ffi::OsString,
    fs,
    path::{Component, Path, PathBuf},
};
use thiserror::Error;

/// Placeholder in generator arguments, replaced by the working directory.
pub const OUTPUT_PLACEHOLDER: &str = "{output}";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error when reading `{}`", .0.display())]
    Io(
        PathBuf,
        #[source] std::io::Error,
    ),

    #[error("config file parsing error")]
    Toml(#[from] toml::de::Error),

    #[error("config file validation error: {0}")]
    Validation(String),
}

// for default value in serde
pub mod serde_defaults {
    pub fn r#false() -> bool { false }

    pub mod publish {
        use std::path::PathBuf;

        pub fn workdir() -> PathBuf { "build".into() }
        pub fn message() -> String { "Publish site".into() }
        pub fn stale() -> Vec<PathBuf> { vec!["articles".into(), "tags".into(), "css".into()] }
    }

    pub mod generator {
        pub fn command() -> Vec<String> {
            ["tola", "--output", super::super::OUTPUT_PLACEHOLDER, "build"].map(String::from).to_vec()
        }
    }

    pub mod git {
        pub fn command() -> String { "git".into() }
    }
}

// `[publish]` in toml
#[derive(Debug, Clone, Educe, Deserialize)]
#[educe(Default)]
#[serde(deny_unknown_fields)]
pub struct PublishConfig {
    // Working directory, related to the source root and strictly inside it
    #[serde(default = "serde_defaults::publish::workdir")]
    #[educe(Default = serde_defaults::publish::workdir())]
    pub workdir: PathBuf,

    // e.g., "git@github.com:owner/owner.github.io.git"
    #[serde(default)]
    pub remote: String,

    // Branch to push to, the remote's default branch when unset
    #[serde(default)]
    pub branch: Option<String>,

    // Commit message of every publish
    #[serde(default = "serde_defaults::publish::message")]
    #[educe(Default = serde_defaults::publish::message())]
    pub message: String,

    // Commit and push even when the generator changed nothing
    #[serde(default = "serde_defaults::r#false")]
    #[educe(Default = false)]
    pub allow_empty: bool,

    // Directories inside the checkout that the generator rewrites
    #[serde(default = "serde_defaults::publish::stale")]
    #[educe(Default = serde_defaults::publish::stale())]
    pub stale: Vec<PathBuf>,
}

// `[generator]` in toml
#[derive(Debug, Clone, Educe, Deserialize)]
#[educe(Default)]
#[serde(deny_unknown_fields)]
pub struct GeneratorConfig {
    // Program followed by its arguments, `{output}` is the working directory
    #[serde(default = "serde_defaults::generator::command")]
    #[educe(Default = serde_defaults::generator::command())]
    pub command: Vec<String>,
}

// `[git]` in toml
#[derive(Debug, Clone, Educe, Deserialize)]
#[educe(Default)]
#[serde(deny_unknown_fields)]
pub struct GitConfig {
    #[serde(default = "serde_defaults::git::command")]
    #[educe(Default = serde_defaults::git::command())]
    pub command: String,

    #[serde(default)]
    pub author_name: Option<String>,

    #[serde(default)]
    pub author_email: Option<String>,
}

// top-level toml
#[derive(Debug, Clone, Educe, Deserialize)]
#[educe(Default)]
#[serde(deny_unknown_fields)]
pub struct SiteConfig {
    // Source root, taken from the cli
    #[serde(skip)]
    #[educe(Default = PathBuf::from("./"))]
    pub root: PathBuf,

    #[serde(default)]
    pub publish: PublishConfig,

    #[serde(default)]
    pub generator: GeneratorConfig,

    #[serde(default)]
    pub git: GitConfig,
}

impl GeneratorConfig {
    /// The generator executable, with a leading `~` expanded.
    pub fn program(&self) -> Cow<'_, str> {
        shellexpand::tilde(self.command.first().map(String::as_str).unwrap_or_default())
    }

    /// Arguments with every `{output}` replaced by `output`.
    pub fn args(&self, output: &Path) -> Vec<OsString> {
        self.command.iter().skip(1).map(|arg| {
            if arg == OUTPUT_PLACEHOLDER {
                output.as_os_str().to_owned()
            } else {
                arg.replace(OUTPUT_PLACEHOLDER, &output.to_string_lossy()).into()
            }
        })
        .collect()
    }
}

impl SiteConfig {
    /// Parse without validating: the cli may still fill in missing values.
    pub fn from_str(content: &str) -> Result<Self, ConfigError> {
        let config: SiteConfig = toml::from_str(content)?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|err| ConfigError::Io (
            path.to_path_buf(),
            err
        ))?;
        Self::from_str(&content)
    }

    #[rustfmt::skip]
    pub fn update_with_cli(&mut self, cli: &Cli) {
        self.root = cli.root.clone();

        if let Some(remote) = &cli.remote { self.publish.remote = remote.to_owned(); }
        if let Some(branch) = &cli.branch { self.publish.branch = Some(branch.to_owned()); }
        if let Some(message) = &cli.message { self.publish.message = message.to_owned(); }
        if cli.allow_empty { self.publish.allow_empty = true; }
    }

    /// The checkout the site is generated into.
    ///
    /// Always below `root` once `validate` passed: the clean step deletes it.
    pub fn workdir(&self) -> PathBuf {
        self.root.join(&self.publish.workdir)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.publish.remote.trim().is_empty() {
            return Err(ConfigError::Validation(
                "`[publish] remote` is empty, set it in the config file or pass `--remote`".into()
            ));
        }

        if self.publish.message.trim().is_empty() {
            return Err(ConfigError::Validation("`[publish] message` cannot be empty".into()));
        }

        if !is_inside(&self.publish.workdir) || self.publish.workdir.starts_with("~") {
            return Err(ConfigError::Validation(format!(
                "`[publish] workdir` is `{}`, it must be a relative path below the source root",
                self.publish.workdir.display()
            )));
        }

        if self.publish.branch.as_deref().is_some_and(|b| b.trim().is_empty()) {
            return Err(ConfigError::Validation("`[publish] branch` cannot be empty".into()));
        }

        if self.generator.program().trim().is_empty() {
            return Err(ConfigError::Validation("`[generator] command` needs at least a program".into()));
        }

        if let Some(path) = self.publish.stale.iter().find(|p| !is_inside(p)) {
            return Err(ConfigError::Validation(format!(
                "stale path `{}` must be relative and stay inside the working directory",
                path.display()
            )));
        }

        Ok(())
    }
}

// relative, non-empty, no `..`, not just `.`
fn is_inside(path: &Path) -> bool {
    let mut components = path.components().peekable();
    components.peek().is_some()
        && components.all(|c| matches!(c, Component::Normal(_) | Component::CurDir))
        && path.components().any(|c| matches!(c, Component::Normal(_)))
}
