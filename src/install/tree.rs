//! In-memory snapshot of a module's files

use crate::core::error::{ModResult, ResultExt};
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

/// A module's file tree: relative path -> contents
///
/// Ordered so that digests, diffs, and installs are deterministic.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ModuleTree {
  files: BTreeMap<PathBuf, Vec<u8>>,
}

impl ModuleTree {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn from_files(files: impl IntoIterator<Item = (PathBuf, Vec<u8>)>) -> Self {
    Self {
      files: files.into_iter().collect(),
    }
  }

  /// Read every regular file below `dir`
  ///
  /// A missing directory yields an empty tree.
  pub fn read_dir(dir: &Path) -> ModResult<Self> {
    let mut tree = Self::new();
    if dir.is_dir() {
      collect_files(dir, dir, &mut tree.files)?;
    }
    Ok(tree)
  }

  pub fn insert(&mut self, path: impl Into<PathBuf>, contents: impl Into<Vec<u8>>) {
    self.files.insert(path.into(), contents.into());
  }

  pub fn get(&self, path: &Path) -> Option<&[u8]> {
    self.files.get(path).map(Vec::as_slice)
  }

  pub fn paths(&self) -> impl Iterator<Item = &PathBuf> {
    self.files.keys()
  }

  pub fn iter(&self) -> impl Iterator<Item = (&PathBuf, &Vec<u8>)> {
    self.files.iter()
  }

  pub fn len(&self) -> usize {
    self.files.len()
  }

  pub fn is_empty(&self) -> bool {
    self.files.is_empty()
  }

  /// SHA-256 over every (path, contents) pair, hex encoded
  pub fn digest(&self) -> String {
    let mut hasher = Sha256::new();
    for (path, contents) in &self.files {
      let path = crate::utils::path_to_git_format(path);
      hasher.update((path.len() as u64).to_le_bytes());
      hasher.update(path.as_bytes());
      hasher.update((contents.len() as u64).to_le_bytes());
      hasher.update(contents);
    }
    hasher
      .finalize()
      .iter()
      .map(|b| format!("{:02x}", b))
      .collect()
  }
}

fn collect_files(root: &Path, dir: &Path, files: &mut BTreeMap<PathBuf, Vec<u8>>) -> ModResult<()> {
  let entries = fs::read_dir(dir).with_context(|| format!("Failed to read directory {}", dir.display()))?;

  for entry in entries {
    let entry = entry?;
    let path = entry.path();
    let file_type = entry.file_type()?;

    if file_type.is_dir() {
      collect_files(root, &path, files)?;
    } else if file_type.is_file() {
      let contents = fs::read(&path).with_context(|| format!("Failed to read {}", path.display()))?;
      files.insert(path.strip_prefix(root)?.to_path_buf(), contents);
    }
  }

  Ok(())
}
