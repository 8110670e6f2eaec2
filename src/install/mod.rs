//! Installing module trees into the workspace
//!
//! The `Installer` trait is the seam between the update/reconcile logic and
//! the filesystem. `FsInstaller` writes into a staging directory next to the
//! destination and swaps it in, so a failed write never leaves a half-written
//! module behind.

pub mod diff;
pub mod tree;

pub use diff::{DiffStatus, FileDiff, ModulePatch, diff_trees};
pub use tree::ModuleTree;

use crate::core::error::{ModError, ModResult, ModuleError, ResultExt};
use std::fs;
use std::path::{Path, PathBuf};

/// Places module trees on disk
pub trait Installer: Send + Sync {
  /// Replace whatever is at `dest` with `tree`
  fn install(&self, tree: &ModuleTree, dest: &Path) -> ModResult<()>;

  /// Delete the module directory at `dest`, if present
  fn remove(&self, dest: &Path) -> ModResult<()>;

  /// Snapshot the files currently at `dest`
  fn read_tree(&self, dest: &Path) -> ModResult<ModuleTree> {
    ModuleTree::read_dir(dest)
  }

  /// File-by-file comparison of two trees
  fn diff(&self, from: &ModuleTree, to: &ModuleTree) -> Vec<FileDiff> {
    diff_trees(from, to)
  }
}

/// Filesystem installer with stage-then-swap replacement
#[derive(Debug, Default, Clone, Copy)]
pub struct FsInstaller;

impl FsInstaller {
  pub fn new() -> Self {
    Self
  }
}

/// Names of the module trees installed below a registry directory
///
/// A directory holding at least one file is a module. A directory holding
/// only directories groups modules (`samtools/sort`). Dot-directories are
/// skipped, including staging leftovers.
pub fn scan_modules(registry_dir: &Path) -> ModResult<Vec<String>> {
  let mut modules = Vec::new();
  if registry_dir.is_dir() {
    scan_into(registry_dir, registry_dir, &mut modules)?;
  }
  modules.sort();
  Ok(modules)
}

fn scan_into(root: &Path, dir: &Path, modules: &mut Vec<String>) -> ModResult<()> {
  let mut subdirs = Vec::new();
  let mut has_file = false;

  for entry in fs::read_dir(dir).with_context(|| format!("Failed to read directory {}", dir.display()))? {
    let entry = entry?;
    if entry.file_name().to_string_lossy().starts_with('.') {
      continue;
    }
    let file_type = entry.file_type()?;
    if file_type.is_dir() {
      subdirs.push(entry.path());
    } else if file_type.is_file() {
      has_file = true;
    }
  }

  if dir != root && has_file {
    let rel = dir.strip_prefix(root)?;
    modules.push(crate::utils::path_to_git_format(rel));
    return Ok(());
  }

  for sub in subdirs {
    scan_into(root, &sub, modules)?;
  }
  Ok(())
}

/// Sibling path `.<name>.<suffix>` used during the swap
fn sibling(dest: &Path, suffix: &str) -> ModResult<PathBuf> {
  let name = dest
    .file_name()
    .ok_or_else(|| ModError::message(format!("Invalid module path: {}", dest.display())))?;
  let parent = dest.parent().unwrap_or_else(|| Path::new("."));
  Ok(parent.join(format!(".{}.{}", name.to_string_lossy(), suffix)))
}

fn install_failed(dest: &Path, reason: impl std::fmt::Display) -> ModError {
  let module = dest
    .file_name()
    .map(|n| n.to_string_lossy().into_owned())
    .unwrap_or_default();
  ModError::Module(ModuleError::InstallFailed {
    module,
    path: dest.to_path_buf(),
    reason: reason.to_string(),
  })
}

fn write_tree(tree: &ModuleTree, dir: &Path) -> ModResult<()> {
  fs::create_dir_all(dir).with_context(|| format!("Failed to create {}", dir.display()))?;
  for (rel, contents) in tree.iter() {
    let path = dir.join(rel);
    if let Some(parent) = path.parent() {
      fs::create_dir_all(parent).with_context(|| format!("Failed to create {}", parent.display()))?;
    }
    fs::write(&path, contents).with_context(|| format!("Failed to write {}", path.display()))?;
  }
  Ok(())
}

impl Installer for FsInstaller {
  fn install(&self, tree: &ModuleTree, dest: &Path) -> ModResult<()> {
    let staging = sibling(dest, "staging")?;
    let backup = sibling(dest, "old")?;

    // Leftovers from an interrupted run
    for leftover in [&staging, &backup] {
      if leftover.exists() {
        fs::remove_dir_all(leftover).map_err(|e| install_failed(dest, e))?;
      }
    }

    if let Err(e) = write_tree(tree, &staging) {
      let _ = fs::remove_dir_all(&staging);
      return Err(install_failed(dest, e));
    }

    let had_previous = dest.exists();
    if had_previous {
      fs::rename(dest, &backup).map_err(|e| install_failed(dest, e))?;
    }

    if let Err(e) = fs::rename(&staging, dest) {
      // Put the previous tree back
      if had_previous {
        let _ = fs::rename(&backup, dest);
      }
      let _ = fs::remove_dir_all(&staging);
      return Err(install_failed(dest, e));
    }

    if had_previous && let Err(e) = fs::remove_dir_all(&backup) {
      tracing::warn!(path = %backup.display(), error = %e, "failed to clean up previous module tree");
    }

    tracing::debug!(dest = %dest.display(), files = tree.len(), "installed module tree");
    Ok(())
  }

  fn remove(&self, dest: &Path) -> ModResult<()> {
    if dest.exists() {
      fs::remove_dir_all(dest).with_context(|| format!("Failed to remove {}", dest.display()))?;
      tracing::debug!(dest = %dest.display(), "removed module tree");
    }
    Ok(())
  }
}
