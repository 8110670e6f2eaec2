pub mod system_git;
mod system_git_ops;

pub use system_git::SystemGit;

/// Information about a commit touching a path
#[derive(Debug, Clone)]
pub struct CommitInfo {
  pub sha: String,
  /// Committer time, seconds since epoch
  pub timestamp: i64,
  /// First line of the commit message
  pub summary: String,
}
