//! Tests for manifest creation and persistence

use crate::helpers::*;
use anyhow::Result;
use modsync::manifest::ManifestStore;

#[test]
fn test_create_records_matching_version() -> Result<()> {
  let registry = TestRegistry::new()?;
  let v1 = registry.commit_module("fastqc", &[("main.nf", "process FASTQC { v1 }\n")])?;
  let _v2 = registry.commit_module("fastqc", &[("main.nf", "process FASTQC { v2 }\n")])?;

  let workspace = TestWorkspace::new(&registry)?;
  workspace.install_files("fastqc", &[("main.nf", "process FASTQC { v1 }\n")])?;

  run_modsync(&workspace.path, &["create"])?;

  assert!(workspace.file_exists("modules.json"));
  assert_eq!(workspace.recorded_version("fastqc")?, Some(v1));

  let manifest = workspace.read_manifest()?;
  assert_eq!(manifest["name"], "test-pipeline");
  assert_eq!(manifest["repos"][REGISTRY_ID]["git_url"], registry.remote());
  assert_eq!(manifest["repos"][REGISTRY_ID]["base_path"], "modules");

  Ok(())
}

#[test]
fn test_create_records_latest_for_modified_module() -> Result<()> {
  let registry = TestRegistry::new()?;
  registry.commit_module("fastqc", &[("main.nf", "v1\n")])?;
  let latest = registry.commit_module("fastqc", &[("main.nf", "v2\n")])?;

  let workspace = TestWorkspace::new(&registry)?;
  workspace.install_files("fastqc", &[("main.nf", "locally edited\n")])?;

  let output = run_modsync(&workspace.path, &["create"])?;
  let stdout = String::from_utf8_lossy(&output.stdout);

  assert!(stdout.contains("match no registry version"), "stdout: {}", stdout);
  assert_eq!(workspace.recorded_version("fastqc")?, Some(latest));

  Ok(())
}

#[test]
fn test_create_nested_module_names() -> Result<()> {
  let registry = TestRegistry::new()?;
  let sha = registry.commit_module("samtools/sort", &[("main.nf", "sort\n"), ("meta.yml", "name: sort\n")])?;

  let workspace = TestWorkspace::new(&registry)?;
  workspace.install_files("samtools/sort", &[("main.nf", "sort\n"), ("meta.yml", "name: sort\n")])?;

  run_modsync(&workspace.path, &["create"])?;

  assert_eq!(workspace.recorded_version("samtools/sort")?, Some(sha));
  Ok(())
}

#[test]
fn test_create_refuses_to_overwrite_without_force() -> Result<()> {
  let registry = TestRegistry::new()?;
  let sha = registry.commit_module("fastqc", &[("main.nf", "v1\n")])?;

  let workspace = TestWorkspace::new(&registry)?;
  workspace.write_manifest(&manifest_json(&registry, &[("fastqc", &sha)]))?;

  let output = run_modsync_unchecked(&workspace.path, &["create"])?;
  assert_eq!(output.status.code(), Some(1));
  assert!(String::from_utf8_lossy(&output.stderr).contains("already exists"));

  // --force rebuilds from what is installed (nothing)
  run_modsync(&workspace.path, &["create", "--force"])?;
  assert_eq!(workspace.recorded_version("fastqc")?, None);

  Ok(())
}

#[test]
fn test_dump_and_load_round_trip() -> Result<()> {
  let registry = TestRegistry::new()?;
  let sha = registry.commit_module("fastqc", &[("main.nf", "v1\n")])?;

  let workspace = TestWorkspace::new(&registry)?;
  workspace.write_manifest(&manifest_json(&registry, &[("fastqc", &sha)]))?;
  let ctx = workspace.context()?;

  let mut store = ManifestStore::open(&ctx)?;
  let before = store.get().clone();
  store.dump()?;

  let reloaded = ManifestStore::open(&ctx)?;
  assert_eq!(reloaded.get(), &before);
  assert_eq!(reloaded.get_module_version(REGISTRY_ID, "fastqc"), Some(sha.as_str()));
  assert_eq!(reloaded.get_remote_url(REGISTRY_ID), Some(registry.remote().as_str()));

  // The written file ends with a newline and uses 4-space indentation
  let raw = workspace.read_file("modules.json")?;
  assert!(raw.ends_with('\n'));
  assert!(raw.contains("\n    \"repos\""));

  Ok(())
}

#[test]
fn test_missing_and_corrupt_manifest_errors() -> Result<()> {
  let registry = TestRegistry::new()?;
  let workspace = TestWorkspace::new(&registry)?;
  let ctx = workspace.context()?;

  let err = ManifestStore::open(&ctx).unwrap_err();
  assert_eq!(err.exit_code().as_i32(), 1);

  workspace.write_manifest("{ not json")?;
  let err = ManifestStore::open(&ctx).unwrap_err();
  assert_eq!(err.exit_code().as_i32(), 3);

  Ok(())
}
