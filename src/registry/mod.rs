//! Remote module registries
//!
//! A registry is a repository of modules, each living under
//! `<base_path>/<module name>`. Versions are commit references; the history
//! of a module is the list of commits touching its path, newest first.
//!
//! - **RegistryClient**: one opened registry (history, trees, version lookup)
//! - **RegistryProvider**: opens a client for a manifest registry record
//! - **git**: default adapter over system git

pub mod git;
#[cfg(test)]
pub(crate) mod memory;

pub use git::{GitRegistry, GitRegistryProvider};

use crate::core::error::ModResult;
use crate::install::ModuleTree;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::path::PathBuf;

/// How far back `create()` and local-change detection search module history
pub const HISTORY_SEARCH_DEPTH: usize = 100;

/// One entry of a module's version history
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ModuleCommit {
  /// Full commit reference
  pub version: String,
  pub timestamp: DateTime<Utc>,
  /// First line of the commit message
  pub summary: String,
}

/// An opened module registry
pub trait RegistryClient: Send + Sync {
  /// Registry identifier (manifest key)
  fn id(&self) -> &str;

  fn remote_url(&self) -> &str;

  /// Path prefix of module directories inside the registry
  fn base_path(&self) -> &str;

  /// Commits touching `module_path`, newest first, at most `depth` entries
  fn list_history(&self, module_path: &str, depth: Option<usize>) -> ModResult<Vec<ModuleCommit>>;

  /// All files below `module_path` at `version`, relative to `module_path`
  fn fetch_tree(&self, module_path: &str, version: &str) -> ModResult<ModuleTree>;

  /// Expand a (possibly abbreviated) version to a full reference
  ///
  /// None when the registry does not know the version.
  fn resolve_version(&self, version: &str) -> ModResult<Option<String>>;

  /// Registry path of a module
  fn module_path(&self, module: &str) -> String {
    let base = self.base_path().trim_matches('/');
    if base.is_empty() {
      module.to_string()
    } else {
      format!("{}/{}", base, module)
    }
  }

  /// Most recent commit touching the module, if any
  fn latest_version(&self, module: &str) -> ModResult<Option<ModuleCommit>> {
    let path = self.module_path(module);
    Ok(self.list_history(&path, Some(1))?.into_iter().next())
  }
}

/// Opens registry clients for manifest registry records
pub trait RegistryProvider: Send + Sync {
  fn open(&self, id: &str, remote: &str, base_path: &str) -> ModResult<Box<dyn RegistryClient>>;
}

/// Where `open` keeps the clone of a remote registry
pub fn cache_path(cache_dir: &std::path::Path, id: &str) -> PathBuf {
  cache_dir.join(crate::utils::sanitize_component(id))
}
