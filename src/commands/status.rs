//! `modsync status` - list manifest modules and their install state

use super::{print_json, short_version};
use crate::core::context::WorkspaceContext;
use crate::core::error::ModResult;
use crate::manifest::ManifestStore;
use serde::Serialize;

/// Status information for a single module
#[derive(Debug, Clone, Serialize)]
pub struct ModuleStatus {
  pub registry: String,
  pub module: String,
  /// Recorded version, None while pending manual resolution
  pub version: Option<String>,
  /// Whether the module tree exists on disk
  pub installed: bool,
  pub patch_applied: bool,
}

/// Collect the status of every module in the manifest
pub fn collect_status(ctx: &WorkspaceContext, store: &ManifestStore) -> Vec<ModuleStatus> {
  let mut statuses = Vec::new();
  for (id, record) in &store.get().repos {
    let Some(modules) = &record.modules else {
      continue;
    };
    for (name, entry) in modules {
      statuses.push(ModuleStatus {
        registry: id.clone(),
        module: name.clone(),
        version: entry.git_sha.clone(),
        installed: ctx.module_dir(id, name).is_dir(),
        patch_applied: entry.patch_applied,
      });
    }
  }
  statuses
}

/// Run the status command
pub fn run_status(ctx: &WorkspaceContext, json: bool) -> ModResult<()> {
  let store = ManifestStore::open(ctx)?;
  let statuses = collect_status(ctx, &store);

  if json {
    return print_json(&statuses);
  }

  let manifest = store.get();
  if let Some(name) = &manifest.name {
    println!("📦 {}", name);
  }

  for (id, record) in &manifest.repos {
    let remote = record.git_url.as_deref().unwrap_or("<missing git_url>");
    println!("\n🔗 {} ({})", id, remote);

    if !record.is_complete() {
      println!("   ⚠️  Incomplete entry; run `modsync check` for details");
      continue;
    }

    let width = statuses
      .iter()
      .filter(|s| &s.registry == id)
      .map(|s| s.module.len())
      .max()
      .unwrap_or(0);

    for status in statuses.iter().filter(|s| &s.registry == id) {
      let icon = if status.installed { "✅" } else { "❌" };
      let version = status.version.as_deref().map(short_version).unwrap_or("(no version)");
      let mut notes = Vec::new();
      if !status.installed {
        notes.push("not installed");
      }
      if status.patch_applied {
        notes.push("patched");
      }
      let notes = if notes.is_empty() {
        String::new()
      } else {
        format!("  [{}]", notes.join(", "))
      };
      println!("   {} {:<width$}  {}{}", icon, status.module, version, notes, width = width);
    }
  }

  if manifest.repos.is_empty() {
    println!("No registries recorded in {}", store.location().display());
  }

  Ok(())
}
