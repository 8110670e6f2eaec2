//! Test helpers for integration tests

use anyhow::{Context, Result};
use modsync::core::context::WorkspaceContext;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};
use tempfile::TempDir;

/// Registry identifier used by every test workspace
pub const REGISTRY_ID: &str = "test/modules";

/// A module registry: a git repository with modules under `modules/`
pub struct TestRegistry {
  _root: TempDir,
  pub path: PathBuf,
}

impl TestRegistry {
  pub fn new() -> Result<Self> {
    let root = TempDir::new()?;
    let path = root.path().join("registry");
    std::fs::create_dir_all(&path)?;

    git(&path, &["init", "--initial-branch=main"])?;
    git(&path, &["config", "user.name", "Test User"])?;
    git(&path, &["config", "user.email", "test@example.com"])?;
    git(&path, &["config", "commit.gpgsign", "false"])?;

    std::fs::write(path.join("README.md"), "# Test registry\n")?;
    git(&path, &["add", "."])?;
    git(&path, &["commit", "-m", "Initial registry"])?;

    Ok(Self { _root: root, path })
  }

  /// Write the given files of a module and commit them, returning the commit SHA
  pub fn commit_module(&self, module: &str, files: &[(&str, &str)]) -> Result<String> {
    let dir = self.path.join("modules").join(module);
    for (rel, content) in files {
      let file = dir.join(rel);
      if let Some(parent) = file.parent() {
        std::fs::create_dir_all(parent)?;
      }
      std::fs::write(file, content)?;
    }
    git(&self.path, &["add", "."])?;
    git(&self.path, &["commit", "-m", &format!("Update {}", module)])?;
    self.head()
  }

  pub fn head(&self) -> Result<String> {
    let output = git(&self.path, &["rev-parse", "HEAD"])?;
    Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
  }

  pub fn remote(&self) -> String {
    self.path.to_string_lossy().to_string()
  }
}

/// A workspace configured against a `TestRegistry`
pub struct TestWorkspace {
  _root: TempDir,
  pub path: PathBuf,
}

impl TestWorkspace {
  pub fn new(registry: &TestRegistry) -> Result<Self> {
    Self::with_extra_config(registry, "")
  }

  /// Workspace whose modsync.toml gets `extra` appended
  pub fn with_extra_config(registry: &TestRegistry, extra: &str) -> Result<Self> {
    let root = TempDir::new()?;
    let path = root.path().to_path_buf();

    let config = format!(
      r#"[workspace]
name = "test-pipeline"

[registry]
name = "{}"
remote = '{}'
base_path = "modules"
{}"#,
      REGISTRY_ID,
      registry.remote(),
      extra
    );
    std::fs::write(path.join("modsync.toml"), config)?;

    Ok(Self { _root: root, path })
  }

  pub fn context(&self) -> Result<WorkspaceContext> {
    Ok(WorkspaceContext::build(&self.path)?)
  }

  /// Installed location of a module
  pub fn module_dir(&self, module: &str) -> PathBuf {
    self.path.join("modules").join(REGISTRY_ID).join(module)
  }

  /// Copy files into the installed location of a module
  pub fn install_files(&self, module: &str, files: &[(&str, &str)]) -> Result<()> {
    let dir = self.module_dir(module);
    for (rel, content) in files {
      let file = dir.join(rel);
      if let Some(parent) = file.parent() {
        std::fs::create_dir_all(parent)?;
      }
      std::fs::write(file, content)?;
    }
    Ok(())
  }

  pub fn write_manifest(&self, json: &str) -> Result<()> {
    std::fs::write(self.path.join("modules.json"), json)?;
    Ok(())
  }

  pub fn read_manifest(&self) -> Result<serde_json::Value> {
    let content = std::fs::read_to_string(self.path.join("modules.json")).context("Failed to read modules.json")?;
    Ok(serde_json::from_str(&content)?)
  }

  /// Recorded version of a module, None if absent or null
  pub fn recorded_version(&self, module: &str) -> Result<Option<String>> {
    let manifest = self.read_manifest()?;
    Ok(
      manifest["repos"][REGISTRY_ID]["modules"][module]["git_sha"]
        .as_str()
        .map(str::to_string),
    )
  }

  pub fn file_exists(&self, path: &str) -> bool {
    self.path.join(path).exists()
  }

  pub fn read_file(&self, path: &str) -> Result<String> {
    Ok(std::fs::read_to_string(self.path.join(path))?)
  }
}

/// Manifest with one registry record pointing at `registry`
pub fn manifest_json(registry: &TestRegistry, modules: &[(&str, &str)]) -> String {
  let mut module_map = serde_json::Map::new();
  for (name, sha) in modules {
    module_map.insert(name.to_string(), serde_json::json!({ "git_sha": sha }));
  }
  let manifest = serde_json::json!({
    "name": "test-pipeline",
    "repos": {
      REGISTRY_ID: {
        "git_url": registry.remote(),
        "base_path": "modules",
        "modules": module_map,
      }
    }
  });
  serde_json::to_string_pretty(&manifest).unwrap_or_default()
}

/// Run git command in a directory
pub fn git(cwd: &Path, args: &[&str]) -> Result<Output> {
  let output = Command::new("git")
    .current_dir(cwd)
    .args(args)
    .output()
    .context("Failed to run git command")?;

  if !output.status.success() {
    let stderr = String::from_utf8_lossy(&output.stderr);
    anyhow::bail!("Git command failed: git {}\n{}", args.join(" "), stderr);
  }

  Ok(output)
}

/// Run the modsync binary, failing on a non-zero exit
pub fn run_modsync(cwd: &Path, args: &[&str]) -> Result<Output> {
  let output = run_modsync_unchecked(cwd, args)?;

  if !output.status.success() {
    let stderr = String::from_utf8_lossy(&output.stderr);
    let stdout = String::from_utf8_lossy(&output.stdout);
    anyhow::bail!(
      "modsync command failed: modsync {}\nstdout: {}\nstderr: {}",
      args.join(" "),
      stdout,
      stderr
    );
  }

  Ok(output)
}

/// Run the modsync binary and return its output whatever the exit status
pub fn run_modsync_unchecked(cwd: &Path, args: &[&str]) -> Result<Output> {
  let modsync_bin = env!("CARGO_BIN_EXE_modsync");

  Command::new(modsync_bin)
    .current_dir(cwd)
    .args(args)
    .output()
    .context("Failed to run modsync")
}
