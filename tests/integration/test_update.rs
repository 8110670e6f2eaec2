//! Tests for the update command

use crate::helpers::*;
use anyhow::Result;
use modsync::install::FsInstaller;
use modsync::manifest::ManifestStore;
use modsync::registry::GitRegistryProvider;
use modsync::update::{SkipReason, UpdateEngine, UpdateOptions, UpdateOutcome, UpdateTarget};

/// Registry with two fastqc versions and one multiqc version; workspace at fastqc v1
struct Setup {
  registry: TestRegistry,
  workspace: TestWorkspace,
  v1: String,
  v2: String,
  multiqc: String,
}

fn setup(extra_config: &str) -> Result<Setup> {
  let registry = TestRegistry::new()?;
  let v1 = registry.commit_module("fastqc", &[("main.nf", "fastqc v1\n")])?;
  let multiqc = registry.commit_module("multiqc", &[("main.nf", "multiqc\n")])?;
  let v2 = registry.commit_module("fastqc", &[("main.nf", "fastqc v2\n"), ("meta.yml", "name: fastqc\n")])?;

  let workspace = TestWorkspace::with_extra_config(&registry, extra_config)?;
  workspace.install_files("fastqc", &[("main.nf", "fastqc v1\n")])?;
  workspace.install_files("multiqc", &[("main.nf", "multiqc\n")])?;
  workspace.write_manifest(&manifest_json(&registry, &[("fastqc", &v1), ("multiqc", &multiqc)]))?;

  Ok(Setup {
    registry,
    workspace,
    v1,
    v2,
    multiqc,
  })
}

#[test]
fn test_update_single_module_to_latest() -> Result<()> {
  let s = setup("")?;

  let output = run_modsync(&s.workspace.path, &["update", "fastqc"])?;
  let stdout = String::from_utf8_lossy(&output.stdout);
  assert!(stdout.contains("1 module updated"), "stdout: {}", stdout);

  assert_eq!(s.workspace.recorded_version("fastqc")?, Some(s.v2.clone()));
  assert_eq!(s.workspace.read_file("modules/test/modules/fastqc/main.nf")?, "fastqc v2\n");
  assert!(s.workspace.file_exists("modules/test/modules/fastqc/meta.yml"));
  assert_eq!(s.workspace.recorded_version("multiqc")?, Some(s.multiqc.clone()));

  Ok(())
}

#[test]
fn test_update_at_target_version_is_noop() -> Result<()> {
  let s = setup("")?;
  let before = s.workspace.read_file("modules.json")?;

  let ctx = s.workspace.context()?;
  let mut store = ManifestStore::open(&ctx)?;
  let provider = GitRegistryProvider::from_context(&ctx);
  let installer = FsInstaller::new();

  let report =
    UpdateEngine::new(&ctx, &mut store, &provider, &installer).run(&UpdateOptions::new(UpdateTarget::Module(
      "multiqc".to_string(),
    )))?;

  assert_eq!(
    report.outcome(REGISTRY_ID, "multiqc"),
    Some(&UpdateOutcome::Skipped {
      reason: SkipReason::UpToDate
    })
  );
  assert_eq!(s.workspace.read_file("modules.json")?, before);

  Ok(())
}

#[test]
fn test_update_to_explicit_sha() -> Result<()> {
  let s = setup("")?;
  run_modsync(&s.workspace.path, &["update", "fastqc"])?;
  assert_eq!(s.workspace.recorded_version("fastqc")?, Some(s.v2.clone()));

  run_modsync(&s.workspace.path, &["update", "fastqc", "--sha", &s.v1[..10]])?;
  assert_eq!(s.workspace.recorded_version("fastqc")?, Some(s.v1.clone()));
  assert_eq!(s.workspace.read_file("modules/test/modules/fastqc/main.nf")?, "fastqc v1\n");
  assert!(!s.workspace.file_exists("modules/test/modules/fastqc/meta.yml"));

  Ok(())
}

#[test]
fn test_save_diff_changes_nothing() -> Result<()> {
  let s = setup("")?;
  let manifest_before = s.workspace.read_file("modules.json")?;

  let output = run_modsync(&s.workspace.path, &["update", "--all", "--save-diff", "changes.diff"])?;
  let stdout = String::from_utf8_lossy(&output.stdout);
  assert!(stdout.contains("git apply"), "stdout: {}", stdout);

  assert_eq!(s.workspace.read_file("modules.json")?, manifest_before);
  assert_eq!(s.workspace.read_file("modules/test/modules/fastqc/main.nf")?, "fastqc v1\n");
  assert!(!s.workspace.file_exists("modules/test/modules/fastqc/meta.yml"));

  let patch = s.workspace.read_file("changes.diff")?;
  assert!(patch.contains(&format!(
    "Changes in module 'test/modules/fastqc' between ({}) and ({})",
    s.v1, s.v2
  )));
  assert!(patch.contains("-fastqc v1"));
  assert!(patch.contains("+fastqc v2"));
  assert!(patch.contains("+++ b/modules/test/modules/fastqc/meta.yml"));
  // The projected manifest change is appended
  assert!(patch.contains("Changes in 'modules.json'"));
  assert!(patch.contains(&s.v2));
  assert!(!patch.contains("Changes in module 'test/modules/multiqc'"));

  Ok(())
}

#[test]
fn test_pinned_module_follows_config() -> Result<()> {
  // The pin is only known after committing, so the pinned workspace is built second
  let s = setup("")?;
  let pin = format!("\n[update]\n\"{}\" = {{ fastqc = \"{}\" }}\n", REGISTRY_ID, s.v1);
  let pinned = TestWorkspace::with_extra_config(&s.registry, &pin)?;
  pinned.install_files("fastqc", &[("main.nf", "fastqc v1\n")])?;
  pinned.install_files("multiqc", &[("main.nf", "multiqc\n")])?;
  pinned.write_manifest(&manifest_json(&s.registry, &[("fastqc", &s.v2), ("multiqc", &s.multiqc)]))?;

  run_modsync(&pinned.path, &["update", "--all", "--force"])?;

  assert_eq!(pinned.recorded_version("fastqc")?, Some(s.v1.clone()));
  assert_eq!(pinned.read_file("modules/test/modules/fastqc/main.nf")?, "fastqc v1\n");

  Ok(())
}

#[test]
fn test_disabled_registry_is_left_alone() -> Result<()> {
  let s = setup(&format!("\n[update]\n\"{}\" = false\n", REGISTRY_ID))?;

  let output = run_modsync(&s.workspace.path, &["update", "--all", "--json"])?;
  let report: serde_json::Value = serde_json::from_slice(&output.stdout)?;
  for entry in report["modules"].as_array().cloned().unwrap_or_default() {
    assert_eq!(entry["outcome"], "skipped");
    assert_eq!(entry["reason"], "disabled");
  }

  assert_eq!(s.workspace.recorded_version("fastqc")?, Some(s.v1.clone()));
  Ok(())
}

#[test]
fn test_update_requires_module_or_all() -> Result<()> {
  let s = setup("")?;

  let output = run_modsync_unchecked(&s.workspace.path, &["update"])?;
  assert_eq!(output.status.code(), Some(1));

  let output = run_modsync_unchecked(&s.workspace.path, &["update", "bowtie2"])?;
  assert_eq!(output.status.code(), Some(1));

  Ok(())
}
