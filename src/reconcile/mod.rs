//! Reconciling the manifest with installed module trees
//!
//! Every manifest entry must have its tree on disk. Missing trees are
//! reinstalled at the recorded version; entries that cannot be reinstalled
//! are dropped. The manifest is written once at the end, and only if an entry
//! was dropped.

use crate::core::config::DEFAULT_REGISTRY_BASE_PATH;
use crate::core::context::WorkspaceContext;
use crate::core::error::ModResult;
use crate::install::{Installer, scan_modules};
use crate::manifest::{ManifestStore, ModuleRecord};
use crate::registry::{RegistryClient, RegistryProvider};
use crate::utils::plural_s;
use serde::Serialize;
use std::collections::BTreeMap;

/// Outcome of a reconciliation pass, in processing order
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Diagnostics {
  pub passed: Vec<String>,
  pub warned: Vec<String>,
  pub failed: Vec<String>,
  /// A registry record is structurally incomplete; the manifest must be regenerated
  pub outdated: bool,
}

impl Diagnostics {
  /// No failures and nothing outdated
  pub fn is_ok(&self) -> bool {
    self.failed.is_empty() && !self.outdated
  }
}

pub struct Reconciler<'a> {
  ctx: &'a WorkspaceContext,
  provider: &'a dyn RegistryProvider,
  installer: &'a dyn Installer,
}

impl<'a> Reconciler<'a> {
  pub fn new(ctx: &'a WorkspaceContext, provider: &'a dyn RegistryProvider, installer: &'a dyn Installer) -> Self {
    Self {
      ctx,
      provider,
      installer,
    }
  }

  pub fn run(&self, store: &mut ManifestStore) -> ModResult<Diagnostics> {
    let mut diagnostics = Diagnostics::default();
    let manifest_name = store
      .location()
      .file_name()
      .map(|n| n.to_string_lossy().into_owned())
      .unwrap_or_else(|| "the manifest".to_string());

    let registries: Vec<_> = store
      .get()
      .repos
      .iter()
      .map(|(id, record)| (id.clone(), record.clone()))
      .collect();

    for (id, record) in registries {
      let (Some(remote), Some(modules)) = (record.git_url.clone(), record.modules.clone()) else {
        diagnostics.outdated = true;
        diagnostics.failed.push(format!(
          "Registry '{}' in {} is missing {}. Delete {} and run `modsync create` to regenerate it.",
          id,
          manifest_name,
          record.missing_fields().join(" and "),
          manifest_name
        ));
        continue;
      };
      let base_path = record
        .base_path
        .clone()
        .unwrap_or_else(|| DEFAULT_REGISTRY_BASE_PATH.to_string());

      self.reconcile_registry(store, &id, &remote, &base_path, &modules, &mut diagnostics)?;
    }

    if store.is_dirty() {
      store.dump()?;
    }

    Ok(diagnostics)
  }

  fn reconcile_registry(
    &self,
    store: &mut ManifestStore,
    id: &str,
    remote: &str,
    base_path: &str,
    modules: &BTreeMap<String, ModuleRecord>,
    diagnostics: &mut Diagnostics,
  ) -> ModResult<()> {
    let mut client: Option<Result<Box<dyn RegistryClient>, String>> = None;
    let mut removed = Vec::new();

    for (name, record) in modules {
      let dest = self.ctx.module_dir(id, name);
      if dest.is_dir() {
        if record.git_sha.is_none() {
          diagnostics.warned.push(format!(
            "Module '{}/{}' has no recorded version; resolve it manually or run `modsync update {} --force`.",
            id, name, name
          ));
        }
        continue;
      }

      let client = client.get_or_insert_with(|| self.provider.open(id, remote, base_path).map_err(|e| e.to_string()));
      match self.reinstall(client, name, record, &dest) {
        Ok(version) => {
          tracing::info!(registry = id, module = %name, version, "reinstalled missing module");
        }
        Err(reason) => {
          tracing::warn!(registry = id, module = %name, reason, "removing unrecoverable manifest entry");
          store.remove(id, name);
          removed.push(format!("{} ({})", name, reason));
        }
      }
    }

    if removed.is_empty() {
      diagnostics.passed.push(format!(
        "Registry '{}': {} module{} installed",
        id,
        modules.len(),
        plural_s(modules.len())
      ));
    } else {
      diagnostics.failed.push(format!(
        "Registry '{}': could not reinstall {}; removed from the manifest: {}",
        id,
        if removed.len() == 1 { "module" } else { "modules" },
        removed.join(", ")
      ));
    }

    for installed in scan_modules(&self.ctx.registry_dir(id))? {
      if !modules.contains_key(&installed) {
        diagnostics.warned.push(format!(
          "Module '{}/{}' is installed but not recorded in the manifest",
          id, installed
        ));
      }
    }

    Ok(())
  }

  fn reinstall(
    &self,
    client: &Result<Box<dyn RegistryClient>, String>,
    module: &str,
    record: &ModuleRecord,
    dest: &std::path::Path,
  ) -> Result<String, String> {
    let version = record
      .git_sha
      .as_deref()
      .ok_or_else(|| "no recorded version".to_string())?;
    let client = client
      .as_ref()
      .map_err(|e| format!("registry unavailable: {}", e))?;

    let tree = client
      .fetch_tree(&client.module_path(module), version)
      .map_err(|e| e.to_string())?;

    // A tree that cannot be written leaves the entry dangling, so it goes too
    self
      .installer
      .install(&tree, dest)
      .map_err(|e| format!("install failed: {}", e))?;
    Ok(version.to_string())
  }
}
