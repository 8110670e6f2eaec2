//! Git-backed registry adapter
//!
//! Local registries (a path on disk) are read in place. Remote registries are
//! cloned bare into the cache directory on first use and fetched on later
//! opens, once per process.

use super::{ModuleCommit, RegistryClient, RegistryProvider, cache_path};
use crate::core::context::WorkspaceContext;
use crate::core::error::{ModError, ModResult, ModuleError};
use crate::core::vcs::SystemGit;
use crate::install::ModuleTree;
use crate::utils::is_local_path;
use chrono::DateTime;
use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

/// A registry read through system git
#[derive(Debug)]
pub struct GitRegistry {
  id: String,
  remote: String,
  base_path: String,
  /// Branch to read history from; None = HEAD
  branch: Option<String>,
  git: SystemGit,
}

impl GitRegistry {
  pub fn new(id: &str, remote: &str, base_path: &str, branch: Option<String>, git: SystemGit) -> Self {
    Self {
      id: id.to_string(),
      remote: remote.to_string(),
      base_path: base_path.to_string(),
      branch,
      git,
    }
  }

  /// Revision history is read from
  fn head_rev(&self) -> &str {
    self.branch.as_deref().unwrap_or("HEAD")
  }
}

impl RegistryClient for GitRegistry {
  fn id(&self) -> &str {
    &self.id
  }

  fn remote_url(&self) -> &str {
    &self.remote
  }

  fn base_path(&self) -> &str {
    &self.base_path
  }

  fn list_history(&self, module_path: &str, depth: Option<usize>) -> ModResult<Vec<ModuleCommit>> {
    let commits = self
      .git
      .log_path(Some(self.head_rev()), Path::new(module_path), depth)?;

    Ok(
      commits
        .into_iter()
        .map(|c| ModuleCommit {
          version: c.sha,
          timestamp: DateTime::from_timestamp(c.timestamp, 0).unwrap_or_default(),
          summary: c.summary,
        })
        .collect(),
    )
  }

  fn fetch_tree(&self, module_path: &str, version: &str) -> ModResult<ModuleTree> {
    let commit = self.git.resolve_commit(version)?.ok_or_else(|| {
      ModError::Module(ModuleError::VersionResolutionFailed {
        module: module_path.to_string(),
        reason: format!("'{}' is not a commit in {}", version, self.remote),
      })
    })?;

    let files = self
      .git
      .collect_tree_files(&commit, Path::new(module_path))
      .map_err(|e| {
        ModError::Module(ModuleError::FetchFailed {
          module: module_path.to_string(),
          version: commit.clone(),
          reason: e.to_string(),
        })
      })?;

    if files.is_empty() {
      return Err(ModError::Module(ModuleError::FetchFailed {
        module: module_path.to_string(),
        version: commit,
        reason: "path does not exist at this version".to_string(),
      }));
    }

    tracing::debug!(registry = %self.id, module_path, version = %commit, files = files.len(), "fetched module tree");
    Ok(ModuleTree::from_files(files))
  }

  fn resolve_version(&self, version: &str) -> ModResult<Option<String>> {
    self.git.resolve_commit(version)
  }
}

/// Opens git registries, cloning remotes into a cache directory
#[derive(Debug)]
pub struct GitRegistryProvider {
  cache_dir: PathBuf,
  /// Branch overrides by registry id
  branches: BTreeMap<String, String>,
  /// Remotes already fetched by this process
  fetched: Mutex<BTreeSet<PathBuf>>,
}

impl GitRegistryProvider {
  pub fn new(cache_dir: impl Into<PathBuf>) -> Self {
    Self {
      cache_dir: cache_dir.into(),
      branches: BTreeMap::new(),
      fetched: Mutex::new(BTreeSet::new()),
    }
  }

  /// Provider for a workspace: its cache directory and the default registry's branch
  pub fn from_context(ctx: &WorkspaceContext) -> Self {
    let mut provider = Self::new(ctx.cache_dir());
    if let Some(branch) = &ctx.config.registry.branch {
      provider = provider.with_branch(&ctx.default_registry(), branch);
    }
    provider
  }

  pub fn with_branch(mut self, id: &str, branch: &str) -> Self {
    self.branches.insert(id.to_string(), branch.to_string());
    self
  }

  fn open_git(&self, id: &str, remote: &str) -> ModResult<SystemGit> {
    if is_local_path(remote) {
      return SystemGit::open(Path::new(remote));
    }

    let dest = cache_path(&self.cache_dir, id);
    let mut fetched = self
      .fetched
      .lock()
      .map_err(|_| ModError::message("registry cache lock poisoned"))?;

    if fetched.contains(&dest) {
      return SystemGit::open(&dest);
    }

    let git = SystemGit::clone_or_fetch(remote, &dest)?;
    fetched.insert(dest);
    Ok(git)
  }
}

impl RegistryProvider for GitRegistryProvider {
  fn open(&self, id: &str, remote: &str, base_path: &str) -> ModResult<Box<dyn RegistryClient>> {
    let git = self.open_git(id, remote)?;
    tracing::debug!(registry = id, remote, bare = git.is_bare(), "opened registry");
    let branch = self.branches.get(id).cloned();
    Ok(Box::new(GitRegistry::new(id, remote, base_path, branch, git)))
  }
}
