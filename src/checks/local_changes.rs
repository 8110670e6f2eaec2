//! Installed modules compared against the registry at their recorded version

use super::trait_def::{Check, CheckContext, CheckResult};
use crate::core::config::DEFAULT_REGISTRY_BASE_PATH;
use crate::core::error::{ModError, ModResult};
use crate::install::{DiffStatus, ModuleTree, diff_trees};
use crate::manifest::ManifestStore;
use crate::ui::progress::FileProgress;
use serde_json::json;

/// Check for local edits to installed modules
pub struct LocalChangesCheck;

impl Check for LocalChangesCheck {
  fn name(&self) -> &str {
    "local-changes"
  }

  fn description(&self) -> &str {
    "Compares installed modules with the registry at their recorded version"
  }

  fn run(&self, ctx: &CheckContext) -> ModResult<CheckResult> {
    let store = match ManifestStore::open(&ctx.workspace) {
      Ok(store) => store,
      Err(ModError::Manifest(_)) => {
        return Ok(CheckResult::pass(self.name(), "Skipped (no readable manifest)"));
      }
      Err(e) => return Err(e),
    };

    // (registry, module, version) for installed, versioned modules
    let mut targets = Vec::new();
    for (id, record) in &store.get().repos {
      let (Some(remote), Some(modules)) = (&record.git_url, &record.modules) else {
        continue;
      };
      let base_path = record.base_path.as_deref().unwrap_or(DEFAULT_REGISTRY_BASE_PATH);
      for (name, entry) in modules {
        if !ctx.includes(name) || !ctx.workspace.module_dir(id, name).is_dir() {
          continue;
        }
        if let Some(version) = &entry.git_sha {
          targets.push((id, remote, base_path, name, version, entry.patch_applied));
        }
      }
    }

    let mut progress = if !targets.is_empty() {
      Some(FileProgress::new(
        targets.len(),
        format!("Comparing {} modules with the registry", targets.len()),
      ))
    } else {
      None
    };

    let mut modified = Vec::new();
    let mut patched = Vec::new();
    let mut unreachable = Vec::new();
    let mut details = serde_json::Map::new();

    for (id, remote, base_path, name, version, patch_applied) in &targets {
      let label = format!("{}/{}", id, name);
      let upstream = ctx
        .provider
        .open(id, remote, base_path)
        .and_then(|client| client.fetch_tree(&client.module_path(name), version));

      match upstream {
        Ok(upstream) => {
          let installed = ModuleTree::read_dir(&ctx.workspace.module_dir(id, name))?;
          if installed.digest() != upstream.digest() {
            let changed: Vec<String> = diff_trees(&upstream, &installed)
              .into_iter()
              .filter(|d| d.status != DiffStatus::Unchanged)
              .map(|d| crate::utils::path_to_git_format(&d.path))
              .collect();
            details.insert(label.clone(), json!(changed));
            if *patch_applied {
              patched.push(label);
            } else {
              modified.push(label);
            }
          }
        }
        Err(e) => unreachable.push(format!("{} ({})", label, e)),
      }

      if let Some(ref mut p) = progress {
        p.inc();
      }
    }

    let details = serde_json::Value::Object(details);

    if !unreachable.is_empty() {
      return Ok(
        CheckResult::error(
          self.name(),
          format!("Could not fetch recorded versions: {}", unreachable.join(", ")),
          "Run `modsync doctor --thorough` after fixing registry access",
        )
        .with_details(details),
      );
    }

    if !modified.is_empty() {
      return Ok(
        CheckResult::warning(
          self.name(),
          format!("Modified locally: {}", modified.join(", ")),
          "`modsync update <module> --force` restores the registry version",
        )
        .with_details(details),
      );
    }

    let mut message = format!("{} installed module(s) match the registry", targets.len() - patched.len());
    if !patched.is_empty() {
      message.push_str(&format!("; patched as recorded: {}", patched.join(", ")));
    }
    Ok(CheckResult::pass(self.name(), message).with_details(details))
  }

  fn thorough_only(&self) -> bool {
    true
  }
}
