//! Building a manifest from the modules already installed in a workspace

use super::{Manifest, ManifestBacking, ManifestStore, RegistryOrigin, RegistryRecord};
use crate::core::context::WorkspaceContext;
use crate::core::error::{ModError, ModResult, ModuleError};
use crate::install::{Installer, ModuleTree, scan_modules};
use crate::registry::{HISTORY_SEARCH_DEPTH, ModuleCommit, RegistryClient, RegistryProvider};
use crate::ui::progress::FileProgress;
use serde::Serialize;

/// What `create()` recorded
#[derive(Debug, Clone, Default, Serialize)]
pub struct CreateReport {
  pub registry: String,
  pub modules: Vec<String>,
  pub warnings: Vec<String>,
}

/// How an installed tree relates to the registry history
enum Resolution {
  /// Installed files equal this version
  Exact(String),
  /// No version matches; the latest was recorded
  Modified(String),
}

impl ManifestStore {
  /// Scan the default registry's installed modules and write a fresh manifest
  ///
  /// Each module is resolved to the registry version whose tree matches the
  /// installed files. Modules that cannot be resolved are recorded with a null
  /// version and reported as warnings.
  pub fn create(
    ctx: &WorkspaceContext,
    backing: Box<dyn ManifestBacking>,
    provider: &dyn RegistryProvider,
    installer: &dyn Installer,
    show_progress: bool,
  ) -> ModResult<(Self, CreateReport)> {
    let registry = &ctx.config.registry;
    let id = registry.id();
    let client = provider.open(&id, &registry.remote, &registry.base_path)?;
    let origin = RegistryOrigin::of(client.as_ref());

    let mut manifest = Manifest {
      name: ctx.config.workspace.name.clone(),
      home_page: ctx.config.workspace.home_page.clone(),
      ..Default::default()
    };
    manifest
      .repos
      .insert(id.clone(), RegistryRecord::new(&origin.remote, &origin.base_path));

    let mut store = Self::from_manifest(backing, manifest);
    let modules = scan_modules(&ctx.registry_dir(&id))?;
    let mut report = CreateReport {
      registry: id.clone(),
      modules: modules.clone(),
      warnings: Vec::new(),
    };

    let mut progress = if show_progress && !modules.is_empty() {
      Some(FileProgress::new(
        modules.len(),
        format!("Resolving {} installed modules", modules.len()),
      ))
    } else {
      None
    };

    for module in &modules {
      let installed = installer.read_tree(&ctx.module_dir(&id, module))?;
      let version = match resolve_installed(client.as_ref(), module, &installed) {
        Ok(Resolution::Exact(version)) => Some(version),
        Ok(Resolution::Modified(version)) => {
          report.warnings.push(format!(
            "Installed files of '{}' match no registry version; recorded the latest ({}). Local changes will be overwritten on update.",
            module, version
          ));
          Some(version)
        }
        Err(e) => {
          report.warnings.push(format!(
            "Could not resolve a version for '{}' ({}); recorded as null, resolve it manually.",
            module, e
          ));
          None
        }
      };

      store.update(&origin, module, version.as_deref(), false);
      if let Some(ref mut p) = progress {
        p.inc();
      }
    }

    store.dump()?;
    Ok((store, report))
  }
}

/// Find the registry version matching an installed tree
fn resolve_installed(client: &dyn RegistryClient, module: &str, installed: &ModuleTree) -> ModResult<Resolution> {
  let path = client.module_path(module);
  let history: Vec<ModuleCommit> = client.list_history(&path, Some(HISTORY_SEARCH_DEPTH))?;

  let latest = history.first().ok_or_else(|| {
    ModError::Module(ModuleError::VersionResolutionFailed {
      module: module.to_string(),
      reason: format!("'{}' has no history in {}", path, client.remote_url()),
    })
  })?;

  let digest = installed.digest();
  for commit in &history {
    let tree = match client.fetch_tree(&path, &commit.version) {
      Ok(tree) => tree,
      // Commits that delete the module have no tree
      Err(e) if e.is_unresolvable() => continue,
      Err(e) => return Err(e),
    };
    if tree.digest() == digest {
      return Ok(Resolution::Exact(commit.version.clone()));
    }
  }

  Ok(Resolution::Modified(latest.version.clone()))
}
