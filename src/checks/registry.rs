//! Registry accessibility checks

use super::trait_def::{Check, CheckContext, CheckResult};
use crate::core::config::DEFAULT_REGISTRY_BASE_PATH;
use crate::core::error::ModResult;
use crate::manifest::ManifestStore;
use crate::ui::progress::FileProgress;
use crate::utils;
use std::collections::BTreeMap;

/// Check that every registry in use can be opened
pub struct RegistryAccessCheck;

impl Check for RegistryAccessCheck {
  fn name(&self) -> &str {
    "registry-access"
  }

  fn description(&self) -> &str {
    "Validates that module registries are reachable"
  }

  fn run(&self, ctx: &CheckContext) -> ModResult<CheckResult> {
    // Default registry plus every complete registry record in the manifest
    let mut registries: BTreeMap<String, (String, String)> = BTreeMap::new();
    let config = &ctx.workspace.config.registry;
    registries.insert(config.id(), (config.remote.clone(), config.base_path.clone()));

    if let Ok(store) = ManifestStore::open(&ctx.workspace) {
      for (id, record) in &store.get().repos {
        if let Some(remote) = &record.git_url {
          let base_path = record
            .base_path
            .clone()
            .unwrap_or_else(|| DEFAULT_REGISTRY_BASE_PATH.to_string());
          registries.insert(id.clone(), (remote.clone(), base_path));
        }
      }
    }

    // Show progress bar for registry access checks (network operations are slow)
    let mut progress = FileProgress::new(
      registries.len(),
      format!("Checking access to {} registries", registries.len()),
    );

    let mut issues = Vec::new();
    for (id, (remote, base_path)) in &registries {
      if !is_valid_remote_url(remote) {
        issues.push(format!("'{}': Invalid remote URL format: {}", id, remote));
      } else if let Err(e) = ctx.provider.open(id, remote, base_path) {
        issues.push(format!("'{}': Cannot access {}: {}", id, remote, e));
      }

      progress.inc();
    }

    if !issues.is_empty() {
      Ok(CheckResult::error(
        self.name(),
        format!("Registry access issues:\n{}", issues.join("\n")),
        "Verify registry URLs are correct and you have network access",
      ))
    } else {
      Ok(CheckResult::pass(
        self.name(),
        format!("All {} registr{} accessible", registries.len(), if registries.len() == 1 { "y" } else { "ies" }),
      ))
    }
  }

  fn thorough_only(&self) -> bool {
    true // Network operations
  }
}

/// Check if a URL looks like a valid Git remote URL
fn is_valid_remote_url(url: &str) -> bool {
  // SSH format: git@github.com:user/repo.git
  if url.starts_with("git@") || url.starts_with("ssh://") {
    return true;
  }

  // HTTPS format: https://github.com/user/repo.git
  if url.starts_with("https://") || url.starts_with("http://") || url.starts_with("file://") {
    return true;
  }

  // Local path (absolute or relative)
  utils::is_local_path(url)
}
