//! Manifest store: the workspace's record of installed modules
//!
//! `ManifestStore` holds the manifest in memory. Lookups and mutations never
//! touch disk; `dump()` writes the whole document through the backing.

mod backing;
mod create;
mod model;

pub use backing::{FileBacking, ManifestBacking, MemoryBacking};
pub use create::CreateReport;
pub use model::{Manifest, ModuleRecord, RegistryRecord};

use crate::core::context::WorkspaceContext;
use crate::core::error::{ManifestError, ModError, ModResult};
use crate::install::Installer;
use crate::reconcile::{Diagnostics, Reconciler};
use crate::registry::{RegistryClient, RegistryProvider};
use std::collections::BTreeMap;
use std::path::Path;

/// Where a registry record's modules come from
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegistryOrigin {
  pub id: String,
  pub remote: String,
  pub base_path: String,
}

impl RegistryOrigin {
  pub fn new(id: impl Into<String>, remote: impl Into<String>, base_path: impl Into<String>) -> Self {
    Self {
      id: id.into(),
      remote: remote.into(),
      base_path: base_path.into(),
    }
  }

  pub fn of(client: &dyn RegistryClient) -> Self {
    Self::new(client.id(), client.remote_url(), client.base_path())
  }
}

/// In-memory manifest plus the backing it was loaded from
pub struct ManifestStore {
  backing: Box<dyn ManifestBacking>,
  manifest: Manifest,
  dirty: bool,
}

impl std::fmt::Debug for ManifestStore {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("ManifestStore")
      .field("location", &self.backing.location())
      .field("manifest", &self.manifest)
      .field("dirty", &self.dirty)
      .finish()
  }
}

impl ManifestStore {
  /// Read and parse the manifest from its backing
  pub fn load(backing: Box<dyn ManifestBacking>) -> ModResult<Self> {
    let path = backing.location().to_path_buf();
    let content = backing
      .read()?
      .ok_or_else(|| ModError::Manifest(ManifestError::Missing { path: path.clone() }))?;

    let manifest = Manifest::from_json(&content).map_err(|e| {
      ModError::Manifest(ManifestError::Corrupt {
        path,
        reason: e.to_string(),
      })
    })?;

    tracing::debug!(
      path = %backing.location().display(),
      registries = manifest.repos.len(),
      modules = manifest.module_count(),
      "loaded manifest"
    );

    Ok(Self {
      backing,
      manifest,
      dirty: false,
    })
  }

  /// Load the workspace's manifest file
  pub fn open(ctx: &WorkspaceContext) -> ModResult<Self> {
    Self::load(Box::new(FileBacking::new(ctx.manifest_path())))
  }

  /// Wrap an in-memory manifest that has not been written yet
  pub fn from_manifest(backing: Box<dyn ManifestBacking>, manifest: Manifest) -> Self {
    Self {
      backing,
      manifest,
      dirty: true,
    }
  }

  pub fn location(&self) -> &Path {
    self.backing.location()
  }

  /// Current in-memory snapshot
  pub fn get(&self) -> &Manifest {
    &self.manifest
  }

  /// Whether there are changes not yet written by `dump()`
  pub fn is_dirty(&self) -> bool {
    self.dirty
  }

  /// Upsert one module record
  ///
  /// Creates the registry record from `origin` when absent. Returns whether
  /// anything changed.
  pub fn update(
    &mut self,
    origin: &RegistryOrigin,
    module: &str,
    version: Option<&str>,
    patch_applied: bool,
  ) -> bool {
    let mut changed = !self.manifest.repos.contains_key(&origin.id);
    let record = self
      .manifest
      .repos
      .entry(origin.id.clone())
      .or_insert_with(|| RegistryRecord::new(&origin.remote, &origin.base_path));

    if record.git_url.is_none() {
      record.git_url = Some(origin.remote.clone());
      changed = true;
    }
    if record.base_path.is_none() {
      record.base_path = Some(origin.base_path.clone());
      changed = true;
    }

    let modules = record.modules.get_or_insert_with(BTreeMap::new);
    let version = version.map(str::to_string);
    match modules.get_mut(module) {
      Some(entry) if entry.git_sha == version && entry.patch_applied == patch_applied => {}
      Some(entry) => {
        entry.git_sha = version;
        entry.patch_applied = patch_applied;
        changed = true;
      }
      None => {
        let mut entry = ModuleRecord::new(version);
        entry.patch_applied = patch_applied;
        modules.insert(module.to_string(), entry);
        changed = true;
      }
    }

    self.dirty |= changed;
    changed
  }

  /// Drop a module record; returns whether it existed
  pub fn remove(&mut self, registry: &str, module: &str) -> bool {
    let removed = self
      .manifest
      .repos
      .get_mut(registry)
      .and_then(|r| r.modules.as_mut())
      .and_then(|m| m.remove(module))
      .is_some();
    self.dirty |= removed;
    removed
  }

  pub fn repo_present(&self, registry: &str) -> bool {
    self.manifest.repos.contains_key(registry)
  }

  pub fn module_present(&self, registry: &str, module: &str) -> bool {
    self.module_record(registry, module).is_some()
  }

  pub fn module_record(&self, registry: &str, module: &str) -> Option<&ModuleRecord> {
    self
      .manifest
      .repos
      .get(registry)?
      .modules
      .as_ref()?
      .get(module)
  }

  /// Recorded version; None when the module is absent or its version is null
  pub fn get_module_version(&self, registry: &str, module: &str) -> Option<&str> {
    self.module_record(registry, module)?.git_sha.as_deref()
  }

  pub fn get_remote_url(&self, registry: &str) -> Option<&str> {
    self.manifest.repos.get(registry)?.git_url.as_deref()
  }

  pub fn get_base_path(&self, registry: &str) -> Option<&str> {
    self.manifest.repos.get(registry)?.base_path.as_deref()
  }

  /// Serialized form of the in-memory manifest
  pub fn render(&self) -> ModResult<String> {
    self.manifest.to_json()
  }

  /// Write the in-memory manifest, replacing the stored one
  pub fn dump(&mut self) -> ModResult<()> {
    let content = self.render()?;
    self.backing.write(&content)?;
    self.dirty = false;
    tracing::debug!(path = %self.location().display(), "wrote manifest");
    Ok(())
  }

  /// Reconcile manifest entries with installed trees; see `Reconciler`
  pub fn check_up_to_date(
    &mut self,
    ctx: &WorkspaceContext,
    provider: &dyn RegistryProvider,
    installer: &dyn Installer,
  ) -> ModResult<Diagnostics> {
    Reconciler::new(ctx, provider, installer).run(self)
  }
}
