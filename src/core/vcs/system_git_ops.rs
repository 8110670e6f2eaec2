//! Additional operations for SystemGit (path history, tree listing)

use super::CommitInfo;
use super::system_git::SystemGit;
use crate::core::error::{GitError, ModError, ModResult, ResultExt};
use crate::utils::path_to_git_format;
use std::path::{Path, PathBuf};

/// Field separator for `git log --format` output
const FIELD_SEP: char = '\u{1f}';

impl SystemGit {
  /// Get commits touching a path, newest first
  ///
  /// `rev` defaults to HEAD; `depth` limits the number of entries returned.
  pub fn log_path(&self, rev: Option<&str>, path: &Path, depth: Option<usize>) -> ModResult<Vec<CommitInfo>> {
    let mut cmd = self.git_cmd();
    cmd.args(["log", "--no-merges", "--format=%H%x1f%ct%x1f%s"]);

    if let Some(depth) = depth {
      cmd.arg(format!("--max-count={}", depth));
    }

    cmd.arg(rev.unwrap_or("HEAD"));
    cmd.arg("--");
    cmd.arg(path_to_git_format(path));

    let output = cmd.output().context("Failed to run git log")?;

    if !output.status.success() {
      let stderr = String::from_utf8_lossy(&output.stderr);
      return Err(ModError::Git(GitError::CommandFailed {
        command: format!("git log -- {}", path.display()),
        stderr: stderr.to_string(),
      }));
    }

    Ok(parse_log_output(&output.stdout))
  }

  /// List all files at a specific commit under a path, relative to that path
  pub fn list_files_at_commit(&self, commit_sha: &str, path: &Path) -> ModResult<Vec<PathBuf>> {
    let spec = if path.as_os_str().is_empty() {
      commit_sha.to_string()
    } else {
      format!("{}:{}", commit_sha, path_to_git_format(path))
    };

    let output = self
      .git_cmd()
      .args(["ls-tree", "-r", "--name-only", &spec])
      .output()
      .context("Failed to list files")?;

    if !output.status.success() {
      return Ok(vec![]);
    }

    let files = String::from_utf8_lossy(&output.stdout)
      .lines()
      .filter(|l| !l.is_empty())
      .map(PathBuf::from)
      .collect();

    Ok(files)
  }

  /// Collect all files from a tree recursively
  ///
  /// Blob reads run in parallel; the result keeps `ls-tree` order.
  pub fn collect_tree_files(&self, commit_sha: &str, path: &Path) -> ModResult<Vec<(PathBuf, Vec<u8>)>> {
    use rayon::prelude::*;

    let files = self.list_files_at_commit(commit_sha, path)?;

    files
      .into_par_iter()
      .map(|file| {
        let full_path = path.join(&file);
        let content = self.read_file_at_commit(commit_sha, &full_path)?.ok_or_else(|| {
          ModError::message(format!("{} vanished from commit {}", full_path.display(), commit_sha))
        })?;
        Ok((file, content))
      })
      .collect()
  }
}

/// Parse `git log --format=%H%x1f%ct%x1f%s` output into CommitInfo entries
fn parse_log_output(data: &[u8]) -> Vec<CommitInfo> {
  String::from_utf8_lossy(data)
    .lines()
    .filter_map(|line| {
      let mut fields = line.splitn(3, FIELD_SEP);
      let sha = fields.next()?.trim();
      if sha.is_empty() {
        return None;
      }
      let timestamp = fields.next().and_then(|t| t.trim().parse::<i64>().ok()).unwrap_or(0);
      let summary = fields.next().unwrap_or("").to_string();
      Some(CommitInfo {
        sha: sha.to_string(),
        timestamp,
        summary,
      })
    })
    .collect()
}
