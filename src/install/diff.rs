//! File-level diffs between two module trees
//!
//! Patches are rendered as unified diffs with `a/` and `b/` prefixes so the
//! resulting file can be fed to `git apply` from the workspace root.

use super::tree::ModuleTree;
use crate::utils::path_to_git_format;
use serde::Serialize;
use similar::TextDiff;
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

const SEPARATOR_WIDTH: usize = 60;

/// What happened to one file between two trees
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DiffStatus {
  Unchanged,
  Changed,
  Created,
  Removed,
}

/// Diff of a single file, path relative to the module directory
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileDiff {
  pub path: PathBuf,
  pub status: DiffStatus,
  old: Option<String>,
  new: Option<String>,
}

impl FileDiff {
  /// Unified diff text, empty for unchanged files
  ///
  /// `display_dir` is the workspace-relative module directory shown in headers.
  pub fn unified(&self, display_dir: &Path) -> String {
    let shown = path_to_git_format(&display_dir.join(&self.path));
    let (from, to) = match self.status {
      DiffStatus::Unchanged => return String::new(),
      DiffStatus::Changed => (format!("a/{}", shown), format!("b/{}", shown)),
      DiffStatus::Created => ("/dev/null".to_string(), format!("b/{}", shown)),
      DiffStatus::Removed => (format!("a/{}", shown), "/dev/null".to_string()),
    };

    let old = self.old.as_deref().unwrap_or("");
    let new = self.new.as_deref().unwrap_or("");
    // Bytes differ but the lossy text does not
    if self.status == DiffStatus::Changed && old == new {
      return format!("Binary files {} and {} differ\n", from, to);
    }
    TextDiff::from_lines(old, new)
      .unified_diff()
      .context_radius(3)
      .header(&from, &to)
      .to_string()
  }
}

/// Compare two trees file by file, in path order
pub fn diff_trees(from: &ModuleTree, to: &ModuleTree) -> Vec<FileDiff> {
  let paths: BTreeSet<&PathBuf> = from.paths().chain(to.paths()).collect();

  paths
    .into_iter()
    .map(|path| {
      let (old_bytes, new_bytes) = (from.get(path), to.get(path));
      let status = match (old_bytes, new_bytes) {
        (Some(o), Some(n)) if o == n => DiffStatus::Unchanged,
        (Some(_), Some(_)) => DiffStatus::Changed,
        (None, Some(_)) => DiffStatus::Created,
        (Some(_), None) => DiffStatus::Removed,
        (None, None) => DiffStatus::Unchanged,
      };
      // Decoded only for rendering
      let old = old_bytes.map(|b| String::from_utf8_lossy(b).into_owned());
      let new = new_bytes.map(|b| String::from_utf8_lossy(b).into_owned());
      FileDiff {
        path: path.clone(),
        status,
        old,
        new,
      }
    })
    .collect()
}

/// All changes of one module between its installed and target versions
#[derive(Debug, Clone)]
pub struct ModulePatch {
  pub registry: String,
  pub module: String,
  pub from_version: Option<String>,
  pub to_version: String,
  /// Workspace-relative module directory used in diff headers
  pub display_dir: PathBuf,
  pub files: Vec<FileDiff>,
}

impl ModulePatch {
  pub fn has_changes(&self) -> bool {
    self.files.iter().any(|f| f.status != DiffStatus::Unchanged)
  }

  /// Render header, per-file unified diffs, and a separator line
  pub fn render(&self) -> String {
    let mut out = String::new();
    let name = format!("{}/{}", self.registry, self.module);
    match &self.from_version {
      Some(from) => out.push_str(&format!(
        "Changes in module '{}' between ({}) and ({})\n",
        name, from, self.to_version
      )),
      None => out.push_str(&format!("Changes in module '{}'\n", name)),
    }

    for file in &self.files {
      if file.status == DiffStatus::Unchanged {
        continue;
      }
      out.push_str(&file.unified(&self.display_dir));
      out.push('\n');
    }

    out.push_str(&"*".repeat(SEPARATOR_WIDTH));
    out.push('\n');
    out
  }
}

/// Unified diff of two renderings of the manifest document
pub fn render_manifest_diff(manifest_path: &Path, old: &str, new: &str) -> String {
  let shown = path_to_git_format(manifest_path);
  let mut out = format!("Changes in '{}'\n", shown);
  out.push_str(
    &TextDiff::from_lines(old, new)
      .unified_diff()
      .header(&format!("a/{}", shown), &format!("b/{}", shown))
      .to_string(),
  );
  out.push_str(&"*".repeat(SEPARATOR_WIDTH));
  out.push('\n');
  out
}
