//! Tests for status, doctor, and global CLI options

use crate::helpers::*;
use anyhow::Result;

#[test]
fn test_status_json_lists_modules() -> Result<()> {
  let registry = TestRegistry::new()?;
  let fastqc = registry.commit_module("fastqc", &[("main.nf", "fastqc\n")])?;
  let multiqc = registry.commit_module("multiqc", &[("main.nf", "multiqc\n")])?;

  let workspace = TestWorkspace::new(&registry)?;
  workspace.install_files("fastqc", &[("main.nf", "fastqc\n")])?;
  workspace.write_manifest(&manifest_json(&registry, &[("fastqc", &fastqc), ("multiqc", &multiqc)]))?;

  let output = run_modsync(&workspace.path, &["status", "--json"])?;
  let statuses: serde_json::Value = serde_json::from_slice(&output.stdout)?;
  let statuses = statuses.as_array().cloned().unwrap_or_default();

  assert_eq!(statuses.len(), 2);
  assert_eq!(statuses[0]["module"], "fastqc");
  assert_eq!(statuses[0]["installed"], true);
  assert_eq!(statuses[0]["version"], fastqc.as_str());
  assert_eq!(statuses[1]["module"], "multiqc");
  assert_eq!(statuses[1]["installed"], false);

  // status never repairs
  assert!(!workspace.module_dir("multiqc").exists());

  Ok(())
}

#[test]
fn test_dir_option_selects_workspace() -> Result<()> {
  let registry = TestRegistry::new()?;
  let fastqc = registry.commit_module("fastqc", &[("main.nf", "fastqc\n")])?;

  let workspace = TestWorkspace::new(&registry)?;
  workspace.write_manifest(&manifest_json(&registry, &[("fastqc", &fastqc)]))?;

  let elsewhere = tempfile::TempDir::new()?;
  let dir = workspace.path.to_string_lossy().to_string();
  let output = run_modsync(elsewhere.path(), &["-C", &dir, "status"])?;

  let stdout = String::from_utf8_lossy(&output.stdout);
  assert!(stdout.contains("fastqc"), "stdout: {}", stdout);
  assert!(stdout.contains(&fastqc[..7]));

  Ok(())
}

#[test]
fn test_missing_manifest_is_user_error() -> Result<()> {
  let registry = TestRegistry::new()?;
  let workspace = TestWorkspace::new(&registry)?;

  let output = run_modsync_unchecked(&workspace.path, &["check"])?;
  assert_eq!(output.status.code(), Some(1));

  let stderr = String::from_utf8_lossy(&output.stderr);
  assert!(stderr.contains("modules.json"), "stderr: {}", stderr);
  assert!(stderr.contains("💡 Help:"));

  Ok(())
}

#[test]
fn test_doctor_reports_local_changes() -> Result<()> {
  let registry = TestRegistry::new()?;
  let fastqc = registry.commit_module("fastqc", &[("main.nf", "fastqc\n")])?;

  let workspace = TestWorkspace::new(&registry)?;
  workspace.install_files("fastqc", &[("main.nf", "fastqc\n")])?;
  workspace.write_manifest(&manifest_json(&registry, &[("fastqc", &fastqc)]))?;

  let output = run_modsync(&workspace.path, &["doctor", "--thorough"])?;
  let stdout = String::from_utf8_lossy(&output.stdout);
  assert!(stdout.contains("Running health checks"));
  assert!(stdout.contains("All checks passed"), "stdout: {}", stdout);

  workspace.install_files("fastqc", &[("main.nf", "edited locally\n")])?;
  let output = run_modsync_unchecked(&workspace.path, &["doctor", "--thorough", "--json"])?;
  let results: serde_json::Value = serde_json::from_slice(&output.stdout)?;
  let local = results
    .as_array()
    .cloned()
    .unwrap_or_default()
    .into_iter()
    .find(|r| r["check_name"] == "local-changes");

  let local = local.ok_or_else(|| anyhow::anyhow!("local-changes check missing"))?;
  assert_eq!(local["passed"], false);

  Ok(())
}

#[test]
fn test_doctor_does_not_repair() -> Result<()> {
  let registry = TestRegistry::new()?;
  let fastqc = registry.commit_module("fastqc", &[("main.nf", "fastqc\n")])?;

  let workspace = TestWorkspace::new(&registry)?;
  workspace.write_manifest(&manifest_json(&registry, &[("fastqc", &fastqc)]))?;

  let output = run_modsync_unchecked(&workspace.path, &["doctor"])?;
  assert_eq!(output.status.code(), Some(3));
  assert!(!workspace.module_dir("fastqc").exists());

  Ok(())
}
