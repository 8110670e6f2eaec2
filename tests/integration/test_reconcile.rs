//! Tests for reconciling the manifest with installed trees

use crate::helpers::*;
use anyhow::Result;
use modsync::install::FsInstaller;
use modsync::manifest::ManifestStore;
use modsync::registry::GitRegistryProvider;

const UNKNOWN_SHA: &str = "0123456789abcdef0123456789abcdef01234567";

#[test]
fn test_missing_tree_is_reinstalled_at_recorded_version() -> Result<()> {
  let registry = TestRegistry::new()?;
  let v1 = registry.commit_module("fastqc", &[("main.nf", "fastqc v1\n"), ("meta.yml", "name: fastqc\n")])?;
  registry.commit_module("fastqc", &[("main.nf", "fastqc v2\n")])?;

  let workspace = TestWorkspace::new(&registry)?;
  let original = manifest_json(&registry, &[("fastqc", &v1)]);
  workspace.write_manifest(&original)?;

  let ctx = workspace.context()?;
  let mut store = ManifestStore::open(&ctx)?;
  let provider = GitRegistryProvider::from_context(&ctx);
  let diagnostics = store.check_up_to_date(&ctx, &provider, &FsInstaller::new())?;

  assert!(diagnostics.is_ok(), "{:?}", diagnostics);
  assert_eq!(diagnostics.passed.len(), 1);
  assert_eq!(workspace.read_file("modules/test/modules/fastqc/main.nf")?, "fastqc v1\n");
  assert!(workspace.file_exists("modules/test/modules/fastqc/meta.yml"));

  // Nothing was removed, so the manifest file is untouched
  assert_eq!(workspace.read_file("modules.json")?, original);

  Ok(())
}

#[test]
fn test_unknown_version_entry_is_removed() -> Result<()> {
  let registry = TestRegistry::new()?;
  let fastqc = registry.commit_module("fastqc", &[("main.nf", "fastqc\n")])?;

  let workspace = TestWorkspace::new(&registry)?;
  workspace.install_files("fastqc", &[("main.nf", "fastqc\n")])?;
  workspace.write_manifest(&manifest_json(&registry, &[("fastqc", &fastqc), ("trimgalore", UNKNOWN_SHA)]))?;

  let ctx = workspace.context()?;
  let mut store = ManifestStore::open(&ctx)?;
  let provider = GitRegistryProvider::from_context(&ctx);
  let diagnostics = store.check_up_to_date(&ctx, &provider, &FsInstaller::new())?;

  assert_eq!(diagnostics.failed.len(), 1);
  assert!(diagnostics.failed[0].contains("trimgalore"));
  assert!(!workspace.file_exists("modules/test/modules/trimgalore"));

  let manifest = workspace.read_manifest()?;
  assert!(manifest["repos"][REGISTRY_ID]["modules"].get("trimgalore").is_none());
  assert_eq!(workspace.recorded_version("fastqc")?, Some(fastqc));

  Ok(())
}

#[test]
fn test_every_entry_installed_or_removed_after_check() -> Result<()> {
  let registry = TestRegistry::new()?;
  let fastqc = registry.commit_module("fastqc", &[("main.nf", "fastqc\n")])?;
  let multiqc = registry.commit_module("multiqc", &[("main.nf", "multiqc\n")])?;

  let workspace = TestWorkspace::new(&registry)?;
  workspace.write_manifest(&manifest_json(
    &registry,
    &[("fastqc", &fastqc), ("multiqc", &multiqc), ("trimgalore", UNKNOWN_SHA)],
  ))?;

  let ctx = workspace.context()?;
  let mut store = ManifestStore::open(&ctx)?;
  store.check_up_to_date(&ctx, &GitRegistryProvider::from_context(&ctx), &FsInstaller::new())?;

  let reloaded = ManifestStore::open(&ctx)?;
  let modules = reloaded.get().repos[REGISTRY_ID].modules.clone().unwrap_or_default();
  assert_eq!(modules.len(), 2);
  for name in modules.keys() {
    assert!(workspace.module_dir(name).is_dir(), "{} not installed", name);
  }

  Ok(())
}

#[test]
fn test_check_command_exit_codes() -> Result<()> {
  let registry = TestRegistry::new()?;
  let fastqc = registry.commit_module("fastqc", &[("main.nf", "fastqc\n")])?;

  let workspace = TestWorkspace::new(&registry)?;
  workspace.write_manifest(&manifest_json(&registry, &[("fastqc", &fastqc)]))?;

  let output = run_modsync(&workspace.path, &["check"])?;
  assert!(String::from_utf8_lossy(&output.stdout).contains("1 module installed"));

  workspace.write_manifest(&manifest_json(&registry, &[("fastqc", &fastqc), ("trimgalore", UNKNOWN_SHA)]))?;
  let output = run_modsync_unchecked(&workspace.path, &["check"])?;
  assert_eq!(output.status.code(), Some(3));
  assert!(String::from_utf8_lossy(&output.stdout).contains("trimgalore"));

  Ok(())
}

#[test]
fn test_incomplete_record_is_outdated() -> Result<()> {
  let registry = TestRegistry::new()?;
  let workspace = TestWorkspace::new(&registry)?;
  workspace.write_manifest(r#"{"repos": {"test/modules": {"base_path": "modules"}}}"#)?;

  let output = run_modsync_unchecked(&workspace.path, &["check", "--json"])?;
  assert_eq!(output.status.code(), Some(3));

  let stdout = String::from_utf8_lossy(&output.stdout);
  let diagnostics: serde_json::Value = serde_json::from_str(&stdout)?;
  assert_eq!(diagnostics["outdated"], true);
  assert!(diagnostics["failed"][0].as_str().unwrap_or("").contains("git_url and modules"));

  Ok(())
}
