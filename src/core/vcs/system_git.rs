//! System git backend - zero dependencies
//!
//! Uses git plumbing commands for all operations:
//! - Repository discovery (rev-parse), working or bare
//! - Safe subprocess execution (isolated environment)
//! - Clone/fetch of remote registries into a local cache

use crate::core::error::{GitError, ModError, ModResult, ResultExt};
use std::path::{Path, PathBuf};
use std::process::Command;

/// Git backend using system git (zero crate dependencies)
#[derive(Debug, Clone)]
pub struct SystemGit {
  /// Repository directory (work tree or bare repository)
  pub(crate) repo_path: PathBuf,

  /// Whether the repository has no work tree
  pub(crate) bare: bool,
}

impl SystemGit {
  /// Open a git repository
  ///
  /// This performs ONE subprocess call to get the repository metadata.
  pub fn open(path: &Path) -> ModResult<Self> {
    if !path.exists() {
      return Err(ModError::Git(GitError::RepoNotFound {
        path: path.to_path_buf(),
      }));
    }

    let output = isolated_git()
      .arg("-C")
      .arg(path)
      .args(["rev-parse", "--is-bare-repository"])
      .output()
      .context("Failed to execute git rev-parse")?;

    if !output.status.success() {
      let stderr = String::from_utf8_lossy(&output.stderr);
      if stderr.contains("not a git repository") {
        return Err(ModError::Git(GitError::RepoNotFound {
          path: path.to_path_buf(),
        }));
      }
      return Err(ModError::message(format!("Failed to open git repository: {}", stderr)));
    }

    let bare = String::from_utf8_lossy(&output.stdout).trim() == "true";

    Ok(Self {
      repo_path: path.to_path_buf(),
      bare,
    })
  }

  /// Clone a remote as a bare repository, or fetch it if the clone already exists
  ///
  /// Branch heads are mirrored so that `refs/heads/<branch>` tracks the remote.
  pub fn clone_or_fetch(url: &str, dest: &Path) -> ModResult<Self> {
    if dest.join("HEAD").exists() {
      let git = Self::open(dest)?;
      git.fetch_heads()?;
      return Ok(git);
    }

    if let Some(parent) = dest.parent() {
      std::fs::create_dir_all(parent).with_context(|| format!("Failed to create {}", parent.display()))?;
    }

    tracing::info!(url, dest = %dest.display(), "cloning registry");
    let output = isolated_git()
      .args(["clone", "--bare", "--quiet", url])
      .arg(dest)
      .output()
      .context("Failed to execute git clone")?;

    if !output.status.success() {
      let stderr = String::from_utf8_lossy(&output.stderr);
      return Err(ModError::Git(GitError::CloneFailed {
        url: url.to_string(),
        reason: stderr.trim().to_string(),
      }));
    }

    Self::open(dest)
  }

  /// Update mirrored branch heads from origin
  pub fn fetch_heads(&self) -> ModResult<()> {
    let output = self
      .git_cmd()
      .args(["fetch", "--quiet", "--prune", "origin", "+refs/heads/*:refs/heads/*"])
      .output()
      .context("Failed to fetch registry")?;

    if !output.status.success() {
      let stderr = String::from_utf8_lossy(&output.stderr);
      return Err(ModError::Git(GitError::CommandFailed {
        command: "git fetch origin".to_string(),
        stderr: stderr.to_string(),
      }));
    }

    Ok(())
  }

  pub fn is_bare(&self) -> bool {
    self.bare
  }

  /// Resolve any revision (full or abbreviated SHA, tag, branch) to a full commit SHA
  ///
  /// Returns None when the revision does not name a commit in this repository.
  pub fn resolve_commit(&self, rev: &str) -> ModResult<Option<String>> {
    if rev.is_empty() || rev.starts_with('-') {
      return Ok(None);
    }

    let output = self
      .git_cmd()
      .args(["rev-parse", "--verify", "--quiet", &format!("{}^{{commit}}", rev)])
      .output()
      .context("Failed to resolve revision")?;

    if !output.status.success() {
      return Ok(None);
    }

    let sha = String::from_utf8_lossy(&output.stdout).trim().to_string();
    Ok(if sha.is_empty() { None } else { Some(sha) })
  }

  /// Read a file at a specific commit
  ///
  /// Returns None if the file doesn't exist at that commit.
  pub fn read_file_at_commit(&self, commit_sha: &str, path: &Path) -> ModResult<Option<Vec<u8>>> {
    let spec = format!("{}:{}", commit_sha, crate::utils::path_to_git_format(path));

    let output = self
      .git_cmd()
      .args(["cat-file", "blob", &spec])
      .output()
      .context("Failed to read file from commit")?;

    if !output.status.success() {
      return Ok(None);
    }

    Ok(Some(output.stdout))
  }

  /// Create a safe git command with isolated environment
  ///
  /// - Sets working directory to repo path
  /// - Clears environment variables
  /// - Whitelists only PATH and HOME
  /// - Adds safe configuration overrides
  pub(crate) fn git_cmd(&self) -> Command {
    let mut cmd = isolated_git();
    cmd.arg("-C").arg(&self.repo_path);
    cmd
  }
}

fn isolated_git() -> Command {
  let mut cmd = Command::new("git");

  cmd.env_clear();
  if let Ok(path) = std::env::var("PATH") {
    cmd.env("PATH", path);
  }
  if let Ok(home) = std::env::var("HOME") {
    cmd.env("HOME", home);
  }

  cmd.arg("-c").arg("protocol.version=2");
  cmd.arg("-c").arg("advice.detachedHead=false");
  cmd.arg("-c").arg("core.quotePath=false"); // Don't escape non-ASCII

  cmd
}
