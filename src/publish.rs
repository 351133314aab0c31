use crate::{
    config::SiteConfig,
    invocation, log,
    utils::{
        command::{Invocation, Runner},
        git,
    },
};
use std::{
    fmt, fs, io,
    path::{Path, PathBuf},
    process::{ExitStatus, Output},
};
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    Clean,
    Clone,
    Prune,
    Generate,
    Stage,
    Status,
    Commit,
    Push,
}

impl Step {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Clean => "clean",
            Self::Clone => "clone",
            Self::Prune => "prune",
            Self::Generate => "generate",
            Self::Stage => "stage",
            Self::Status => "status",
            Self::Commit => "commit",
            Self::Push => "push",
        }
    }
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Error)]
pub enum PublishError {
    #[error("step `{step}` failed with {status}: {stderr}")]
    StepFailed {
        step: Step,
        status: ExitStatus,
        stderr: String,
    },

    #[error("step `{step}` could not run `{program}`")]
    Spawn {
        step: Step,
        program: String,
        #[source]
        source: io::Error,
    },

    #[error("cannot resolve working directory `{}`", .0.display())]
    Workdir(PathBuf, #[source] io::Error),

    #[error("cannot tell which branch to publish to: {0}")]
    Branch(String),
}

impl PublishError {
    pub fn step(&self) -> Option<Step> {
        match self {
            Self::StepFailed { step, .. } | Self::Spawn { step, .. } => Some(*step),
            Self::Branch(_) => Some(Step::Clone),
            Self::Workdir(..) => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// A new commit was pushed; `commit` is its id when it could be read back.
    Published { branch: String, commit: Option<String> },
    /// The generator reproduced what the remote already has.
    Unchanged { branch: String },
}

/// Rebuilds the publish repository checkout and pushes it.
///
/// Steps run strictly in order and the first failing one aborts the run:
/// clean, clone, prune, generate, then stage/commit/push.
pub struct Publisher<'a> {
    config: &'a SiteConfig,
    runner: &'a mut dyn Runner,
}

impl<'a> Publisher<'a> {
    pub fn new(config: &'a SiteConfig, runner: &'a mut dyn Runner) -> Self {
        Self { config, runner }
    }

    pub fn publish(&mut self) -> Result<Outcome, PublishError> {
        let workdir = self.workdir()?;

        remove_path(Step::Clean, &workdir);

        log!("clone"; "cloning `{}` into `{}`", self.config.publish.remote, workdir.display());
        self.run(self.clone_invocation(&workdir))?;
        let branch = self.branch(&workdir)?;

        for stale in &self.config.publish.stale {
            remove_path(Step::Prune, &workdir.join(stale));
        }

        log!("generate"; "running `{}`", self.config.generator.program());
        self.run(self.generate_invocation(&workdir))?;

        self.run(self.stage_invocation(&workdir))?;
        let status = self.run(self.status_invocation(&workdir))?;
        let has_changes = !String::from_utf8_lossy(&status.stdout).trim().is_empty();

        if !has_changes && !self.config.publish.allow_empty {
            log!("publish"; "nothing changed, `{branch}` is already up to date");
            return Ok(Outcome::Unchanged { branch });
        }

        self.run(self.commit_invocation(&workdir))?;
        log!("push"; "pushing to `{branch}`");
        self.run(self.push_invocation(&workdir, &branch))?;

        let commit = git::head_id(&workdir).ok();
        match &commit {
            Some(id) => log!("publish"; "published `{id}` to `{branch}`"),
            None => log!("publish"; "published to `{branch}`"),
        }

        Ok(Outcome::Published { branch, commit })
    }

    /// What `publish` would do, one line per step, without doing any of it.
    pub fn plan(&self) -> Result<Vec<String>, PublishError> {
        let workdir = self.workdir()?;
        let branch = match &self.config.publish.branch {
            Some(branch) => branch.clone(),
            None => "<default branch>".into(),
        };

        let mut plan = vec![
            format!("remove `{}`", workdir.display()),
            self.clone_invocation(&workdir).to_string(),
        ];
        plan.extend(self.config.publish.stale.iter().map(|stale| {
            format!("remove `{}`", workdir.join(stale).display())
        }));
        plan.extend([
            self.generate_invocation(&workdir),
            self.stage_invocation(&workdir),
            self.status_invocation(&workdir),
            self.commit_invocation(&workdir),
            self.push_invocation(&workdir, &branch),
        ].iter().map(Invocation::to_string));

        Ok(plan)
    }

    fn workdir(&self) -> Result<PathBuf, PublishError> {
        let workdir = self.config.workdir();
        std::path::absolute(&workdir).map_err(|err| PublishError::Workdir(workdir, err))
    }

    fn branch(&self, workdir: &Path) -> Result<String, PublishError> {
        match &self.config.publish.branch {
            Some(branch) => Ok(branch.clone()),
            None => git::current_branch(workdir).map_err(|err| PublishError::Branch(format!("{err:#}"))),
        }
    }

    fn run(&mut self, invocation: Invocation) -> Result<Output, PublishError> {
        let step = invocation.step;
        let output = self.runner.run(&invocation).map_err(|source| PublishError::Spawn {
            step,
            program: invocation.program.to_string_lossy().into_owned(),
            source,
        })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr).trim().to_owned();
            log!("error"; "`{invocation}` exited with {}", output.status);
            return Err(PublishError::StepFailed { step, status: output.status, stderr });
        }

        Ok(output)
    }

    fn git(&self) -> &str {
        &self.config.git.command
    }

    // A configured branch is checked out directly, so pruning, generating and
    // pushing all happen on top of that branch's history. It must already exist.
    fn clone_invocation(&self, workdir: &Path) -> Invocation {
        let branch = self.config.publish.branch.as_deref().unwrap_or_default();
        let branch_flag = if branch.is_empty() { "" } else { "--branch" };

        invocation!(Step::Clone; &self.config.root; self.git();
            "clone", branch_flag, branch, &self.config.publish.remote, workdir
        )
    }

    fn generate_invocation(&self, workdir: &Path) -> Invocation {
        let generator = &self.config.generator;
        Invocation::new(Step::Generate, generator.program().into_owned().into(), generator.args(workdir), &self.config.root)
    }

    fn stage_invocation(&self, workdir: &Path) -> Invocation {
        invocation!(Step::Stage; workdir; self.git(); "add", "--all")
    }

    fn status_invocation(&self, workdir: &Path) -> Invocation {
        invocation!(Step::Status; workdir; self.git(); "status", "--porcelain")
    }

    fn commit_invocation(&self, workdir: &Path) -> Invocation {
        let allow_empty = if self.config.publish.allow_empty { "--allow-empty" } else { "" };
        let mut commit = invocation!(Step::Commit; workdir; self.git();
            "commit", "-m", &self.config.publish.message, allow_empty
        );

        if let Some(name) = &self.config.git.author_name {
            commit = commit.env("GIT_AUTHOR_NAME", name).env("GIT_COMMITTER_NAME", name);
        }
        if let Some(email) = &self.config.git.author_email {
            commit = commit.env("GIT_AUTHOR_EMAIL", email).env("GIT_COMMITTER_EMAIL", email);
        }
        commit
    }

    fn push_invocation(&self, workdir: &Path, branch: &str) -> Invocation {
        invocation!(Step::Push; workdir; self.git(); "push", "origin", format!("HEAD:refs/heads/{branch}"))
    }
}

// Missing paths are fine, anything else is only worth a warning.
fn remove_path(step: Step, path: &Path) {
    let removed = match fs::symlink_metadata(path) {
        Err(err) if err.kind() == io::ErrorKind::NotFound => return,
        Err(err) => Err(err),
        Ok(meta) if meta.is_dir() => fs::remove_dir_all(path),
        Ok(_) => fs::remove_file(path),
    };

    match removed {
        Ok(()) => log!(step.as_str(); "removed `{}`", path.display()),
        Err(err) => log!("warn"; "failed to remove `{}`: {err}", path.display()),
    }
}
