//! In-memory registry for unit tests
//!
//! Every commit is a full snapshot of all module trees keyed by registry path.
//! History for a path lists the commits whose snapshot of that path differs
//! from the previous commit, like `git log -- <path>`.

use super::{ModuleCommit, RegistryClient, RegistryProvider};
use crate::core::error::{GitError, ModError, ModResult, ModuleError};
use crate::install::ModuleTree;
use chrono::DateTime;
use sha2::{Digest, Sha256};
use std::collections::{BTreeMap, BTreeSet};
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

#[derive(Debug, Clone)]
struct Snapshot {
  version: String,
  summary: String,
  trees: BTreeMap<String, ModuleTree>,
}

#[derive(Debug, Default)]
struct State {
  commits: Vec<Snapshot>,
  unreachable: BTreeSet<String>,
}

/// Shared handle: clones see the same commits
#[derive(Debug, Clone)]
pub(crate) struct MemoryRegistry {
  id: String,
  remote: String,
  base_path: String,
  state: Arc<Mutex<State>>,
}

impl MemoryRegistry {
  pub fn new(id: &str) -> Self {
    Self {
      id: id.to_string(),
      remote: format!("https://example.org/{}.git", id),
      base_path: "modules".to_string(),
      state: Arc::new(Mutex::new(State::default())),
    }
  }

  pub fn remote(&self) -> &str {
    &self.remote
  }

  /// Commit new contents for one module; returns the new version
  pub fn commit(&self, module: &str, files: &[(&str, &str)]) -> String {
    let tree = ModuleTree::from_files(
      files
        .iter()
        .map(|(p, c)| (PathBuf::from(p), c.as_bytes().to_vec())),
    );
    let path = RegistryClient::module_path(self, module);
    let summary = format!("Update {}", module);
    self.push(summary, |trees| {
      trees.insert(path, tree);
    })
  }

  /// Commit the deletion of a module
  pub fn delete(&self, module: &str) -> String {
    let path = RegistryClient::module_path(self, module);
    let summary = format!("Remove {}", module);
    self.push(summary, |trees| {
      trees.remove(&path);
    })
  }

  /// Make `open` fail for this registry
  pub fn set_unreachable(&self) {
    self.state.lock().unwrap().unreachable.insert(self.remote.clone());
  }

  fn push(&self, summary: String, edit: impl FnOnce(&mut BTreeMap<String, ModuleTree>)) -> String {
    let mut state = self.state.lock().unwrap();
    let mut trees = state.commits.last().map(|s| s.trees.clone()).unwrap_or_default();
    edit(&mut trees);
    let version = fake_sha(state.commits.len() + 1);
    state.commits.push(Snapshot {
      version: version.clone(),
      summary,
      trees,
    });
    version
  }

  fn find(&self, version: &str) -> Option<Snapshot> {
    if version.len() < 4 {
      return None;
    }
    let state = self.state.lock().unwrap();
    let mut matches = state.commits.iter().filter(|s| s.version.starts_with(version));
    let found = matches.next()?;
    if matches.next().is_some() {
      return None;
    }
    Some(found.clone())
  }
}

/// Hash-like 40 character version string
fn fake_sha(n: usize) -> String {
  Sha256::digest(n.to_le_bytes())
    .iter()
    .take(20)
    .map(|b| format!("{:02x}", b))
    .collect()
}

impl RegistryClient for MemoryRegistry {
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
    let state = self.state.lock().unwrap();
    let mut history = Vec::new();
    let mut previous: Option<&ModuleTree> = None;

    for (idx, snapshot) in state.commits.iter().enumerate() {
      let current = snapshot.trees.get(module_path);
      if current != previous {
        history.push(ModuleCommit {
          version: snapshot.version.clone(),
          timestamp: DateTime::from_timestamp(1_700_000_000 + idx as i64, 0).unwrap(),
          summary: snapshot.summary.clone(),
        });
      }
      previous = current;
    }

    history.reverse();
    if let Some(depth) = depth {
      history.truncate(depth);
    }
    Ok(history)
  }

  fn fetch_tree(&self, module_path: &str, version: &str) -> ModResult<ModuleTree> {
    let snapshot = self.find(version).ok_or_else(|| {
      ModError::Module(ModuleError::VersionResolutionFailed {
        module: module_path.to_string(),
        reason: format!("unknown version '{}'", version),
      })
    })?;

    snapshot.trees.get(module_path).cloned().ok_or_else(|| {
      ModError::Module(ModuleError::FetchFailed {
        module: module_path.to_string(),
        version: snapshot.version.clone(),
        reason: "path does not exist at this version".to_string(),
      })
    })
  }

  fn resolve_version(&self, version: &str) -> ModResult<Option<String>> {
    Ok(self.find(version).map(|s| s.version))
  }
}

/// Serves registered memory registries by remote URL
#[derive(Debug, Clone, Default)]
pub(crate) struct MemoryProvider {
  registries: BTreeMap<String, MemoryRegistry>,
}

impl MemoryProvider {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn with(mut self, registry: &MemoryRegistry) -> Self {
    self.registries.insert(registry.remote.clone(), registry.clone());
    self
  }
}

impl RegistryProvider for MemoryProvider {
  fn open(&self, id: &str, remote: &str, base_path: &str) -> ModResult<Box<dyn RegistryClient>> {
    let registry = self.registries.get(remote).ok_or_else(|| {
      ModError::Git(GitError::CloneFailed {
        url: remote.to_string(),
        reason: "repository not found".to_string(),
      })
    })?;

    if registry.state.lock().unwrap().unreachable.contains(remote) {
      return Err(ModError::Git(GitError::CloneFailed {
        url: remote.to_string(),
        reason: "could not resolve host".to_string(),
      }));
    }

    let mut client = registry.clone();
    client.id = id.to_string();
    client.base_path = base_path.to_string();
    Ok(Box::new(client))
  }
}
