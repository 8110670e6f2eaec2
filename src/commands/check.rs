//! `modsync check` - reconcile the manifest with installed module trees
//!
//! Missing trees are reinstalled at their recorded version; entries that
//! cannot be reinstalled are removed from the manifest.

use super::print_json;
use crate::core::context::WorkspaceContext;
use crate::core::error::{ExitCode, ManifestError, ModError, ModResult};
use crate::install::FsInstaller;
use crate::manifest::ManifestStore;
use crate::reconcile::Diagnostics;
use crate::registry::GitRegistryProvider;

/// Run the check command
pub fn run_check(ctx: &WorkspaceContext, json: bool) -> ModResult<()> {
  let mut store = ManifestStore::open(ctx)?;
  let provider = GitRegistryProvider::from_context(ctx);

  if !json {
    println!("🔍 Checking {} against installed modules...\n", store.location().display());
  }

  let diagnostics = store.check_up_to_date(ctx, &provider, &FsInstaller::new())?;

  if json {
    print_json(&diagnostics)?;
  } else {
    print_diagnostics(&diagnostics);
  }

  if diagnostics.outdated {
    return Err(outdated_error(&store));
  }

  if !diagnostics.failed.is_empty() {
    std::process::exit(ExitCode::Validation.as_i32());
  }

  Ok(())
}

/// Human-readable diagnostics, one line each
pub(crate) fn print_diagnostics(diagnostics: &Diagnostics) {
  for message in &diagnostics.passed {
    println!("✅ {}", message);
  }
  for message in &diagnostics.warned {
    println!("⚠️  {}", message);
  }
  for message in &diagnostics.failed {
    println!("❌ {}", message);
  }
}

/// Error naming the first incomplete registry record
pub(crate) fn outdated_error(store: &ManifestStore) -> ModError {
  let registry = store
    .get()
    .repos
    .iter()
    .find(|(_, record)| !record.is_complete())
    .map(|(id, _)| id.clone())
    .unwrap_or_default();
  ModError::Manifest(ManifestError::Outdated { registry })
}
