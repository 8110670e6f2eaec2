//! Manifest presence and consistency checks

use super::trait_def::{Check, CheckContext, CheckResult};
use crate::core::error::{ManifestError, ModError, ModResult};
use crate::install::scan_modules;
use crate::manifest::ManifestStore;
use crate::utils::plural_s;
use serde_json::json;

/// Check that the manifest exists and parses
pub struct ManifestPresentCheck;

impl Check for ManifestPresentCheck {
  fn name(&self) -> &str {
    "manifest-present"
  }

  fn description(&self) -> &str {
    "Validates that the module manifest exists and parses"
  }

  fn run(&self, ctx: &CheckContext) -> ModResult<CheckResult> {
    match ManifestStore::open(&ctx.workspace) {
      Ok(store) => {
        let manifest = store.get();
        Ok(CheckResult::pass(
          self.name(),
          format!(
            "{} loaded ({} registr{}, {} module{})",
            store.location().display(),
            manifest.repos.len(),
            if manifest.repos.len() == 1 { "y" } else { "ies" },
            manifest.module_count(),
            plural_s(manifest.module_count())
          ),
        ))
      }
      Err(ModError::Manifest(ManifestError::Missing { path })) => Ok(CheckResult::error(
        self.name(),
        format!("No manifest at {}", path.display()),
        "Run `modsync create` to build one from the installed modules",
      )),
      Err(ModError::Manifest(ManifestError::Corrupt { path, reason })) => Ok(CheckResult::error(
        self.name(),
        format!("Manifest {} cannot be parsed: {}", path.display(), reason),
        "Fix the JSON by hand, or delete it and run `modsync create`",
      )),
      Err(e) => Err(e),
    }
  }
}

/// Check that manifest entries and installed trees agree (no repair)
pub struct ManifestEntriesCheck;

impl Check for ManifestEntriesCheck {
  fn name(&self) -> &str {
    "manifest-entries"
  }

  fn description(&self) -> &str {
    "Validates that every manifest entry has an installed module tree"
  }

  fn run(&self, ctx: &CheckContext) -> ModResult<CheckResult> {
    let store = match ManifestStore::open(&ctx.workspace) {
      Ok(store) => store,
      Err(ModError::Manifest(_)) => {
        return Ok(CheckResult::pass(self.name(), "Skipped (no readable manifest)"));
      }
      Err(e) => return Err(e),
    };

    let mut incomplete = Vec::new();
    let mut missing = Vec::new();
    let mut unversioned = Vec::new();
    let mut untracked = Vec::new();
    let mut checked = 0;

    for (id, record) in &store.get().repos {
      let Some(modules) = &record.modules else {
        incomplete.push(id.clone());
        continue;
      };
      if record.git_url.is_none() {
        incomplete.push(id.clone());
        continue;
      }

      for (name, entry) in modules.iter().filter(|(name, _)| ctx.includes(name)) {
        checked += 1;
        if !ctx.workspace.module_dir(id, name).is_dir() {
          missing.push(format!("{}/{}", id, name));
        } else if entry.git_sha.is_none() {
          unversioned.push(format!("{}/{}", id, name));
        }
      }

      for installed in scan_modules(&ctx.workspace.registry_dir(id))? {
        if !modules.contains_key(&installed) && ctx.includes(&installed) {
          untracked.push(format!("{}/{}", id, installed));
        }
      }
    }

    let details = json!({
      "incomplete_registries": incomplete,
      "missing": missing,
      "unversioned": unversioned,
      "untracked": untracked,
    });

    if !incomplete.is_empty() {
      return Ok(
        CheckResult::error(
          self.name(),
          format!("Manifest is outdated; incomplete registries: {}", incomplete.join(", ")),
          "Delete the manifest and run `modsync create` to regenerate it",
        )
        .with_details(details),
      );
    }

    if !missing.is_empty() {
      return Ok(
        CheckResult::error(
          self.name(),
          format!("Recorded but not installed: {}", missing.join(", ")),
          "Run `modsync check` to reinstall them or drop unrecoverable entries",
        )
        .with_details(details),
      );
    }

    if !unversioned.is_empty() || !untracked.is_empty() {
      let mut parts = Vec::new();
      if !unversioned.is_empty() {
        parts.push(format!("no recorded version: {}", unversioned.join(", ")));
      }
      if !untracked.is_empty() {
        parts.push(format!("installed but not recorded: {}", untracked.join(", ")));
      }
      return Ok(
        CheckResult::warning(
          self.name(),
          parts.join("; "),
          "Run `modsync update <module> --force` or `modsync create` to record them",
        )
        .with_details(details),
      );
    }

    Ok(CheckResult::pass(
      self.name(),
      format!("All {} manifest entr{} installed", checked, if checked == 1 { "y" } else { "ies" }),
    ))
  }
}
