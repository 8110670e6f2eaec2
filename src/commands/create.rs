//! Build a manifest from the modules installed in the workspace

use super::print_json;
use crate::core::context::WorkspaceContext;
use crate::core::error::{ModError, ModResult};
use crate::install::FsInstaller;
use crate::manifest::{FileBacking, ManifestStore};
use crate::registry::GitRegistryProvider;
use crate::utils::plural_s;

/// Run the create command
pub fn run_create(ctx: &WorkspaceContext, force: bool, json: bool) -> ModResult<()> {
  let manifest_path = ctx.manifest_path();
  if manifest_path.exists() && !force {
    return Err(ModError::with_help(
      format!("A manifest already exists at {}", manifest_path.display()),
      "Use `modsync create --force` to overwrite it, or `modsync check` to repair it.",
    ));
  }

  let registry_id = ctx.default_registry();
  if !json {
    println!("🔍 Scanning installed modules of '{}'...", registry_id);
  }

  let provider = GitRegistryProvider::from_context(ctx);
  let (store, report) = ManifestStore::create(
    ctx,
    Box::new(FileBacking::new(&manifest_path)),
    &provider,
    &FsInstaller::new(),
    !json,
  )?;

  if json {
    return print_json(&report);
  }

  for warning in &report.warnings {
    println!("⚠️  {}", warning);
  }

  let count = report.modules.len();
  println!(
    "✅ Created {} with {} module{}",
    store.location().display(),
    count,
    plural_s(count)
  );
  if count == 0 {
    println!(
      "💡 No modules found under {}",
      ctx.registry_dir(&registry_id).display()
    );
  }

  Ok(())
}
