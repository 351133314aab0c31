// Read-only queries against the freshly cloned working directory.
//
// Everything that talks to the remote or writes history goes through
// `git` subprocesses in `publish.rs`; here we only look at what the
// clone left behind.
use anyhow::{Context, Result, anyhow};
use gix::ThreadSafeRepository;
use std::path::Path;

pub fn open_repo(root: &Path) -> Result<ThreadSafeRepository> {
    let repo = gix::open(root).with_context(|| format!("`{}` is not a git repository", root.display()))?;
    Ok(repo.into_sync())
}

/// The branch `HEAD` points at, e.g. `main` right after a clone.
///
/// Works for unborn branches too (cloning an empty remote).
pub fn current_branch(root: &Path) -> Result<String> {
    let repo = open_repo(root)?.to_thread_local();
    let head = repo
        .head_name()?
        .ok_or(anyhow!("HEAD is detached in `{}`", root.display()))?;

    Ok(head.shorten().to_string())
}

/// Full hex id of the commit `HEAD` resolves to.
pub fn head_id(root: &Path) -> Result<String> {
    let repo = open_repo(root)?.to_thread_local();
    let id = repo
        .head_id()
        .with_context(|| format!("HEAD has no commit in `{}`", root.display()))?;

    Ok(id.detach().to_string())
}
