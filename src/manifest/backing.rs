//! Where the manifest document is persisted

use crate::core::error::{ModResult, ResultExt};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

/// Storage for the serialized manifest
pub trait ManifestBacking: Send + Sync {
  /// Path shown in messages and diff headers
  fn location(&self) -> &Path;

  /// Current document, None when no manifest exists
  fn read(&self) -> ModResult<Option<String>>;

  /// Replace the stored document
  fn write(&self, contents: &str) -> ModResult<()>;
}

/// Manifest file on disk, replaced atomically
#[derive(Debug, Clone)]
pub struct FileBacking {
  path: PathBuf,
}

impl FileBacking {
  pub fn new(path: impl Into<PathBuf>) -> Self {
    Self { path: path.into() }
  }

  fn temp_path(&self) -> PathBuf {
    let name = self
      .path
      .file_name()
      .map(|n| n.to_string_lossy().into_owned())
      .unwrap_or_else(|| "manifest".to_string());
    self.path.with_file_name(format!(".{}.tmp", name))
  }
}

impl ManifestBacking for FileBacking {
  fn location(&self) -> &Path {
    &self.path
  }

  fn read(&self) -> ModResult<Option<String>> {
    if !self.path.exists() {
      return Ok(None);
    }
    let content =
      fs::read_to_string(&self.path).with_context(|| format!("Failed to read {}", self.path.display()))?;
    Ok(Some(content))
  }

  fn write(&self, contents: &str) -> ModResult<()> {
    if let Some(parent) = self.path.parent()
      && !parent.as_os_str().is_empty()
    {
      fs::create_dir_all(parent).with_context(|| format!("Failed to create {}", parent.display()))?;
    }

    let tmp = self.temp_path();
    fs::write(&tmp, contents).with_context(|| format!("Failed to write {}", tmp.display()))?;
    fs::rename(&tmp, &self.path).with_context(|| format!("Failed to replace {}", self.path.display()))?;
    Ok(())
  }
}

/// In-memory manifest; clones share the same document
#[derive(Debug, Clone, Default)]
pub struct MemoryBacking {
  location: PathBuf,
  contents: Arc<Mutex<Option<String>>>,
}

impl MemoryBacking {
  pub fn new() -> Self {
    Self {
      location: PathBuf::from("modules.json"),
      contents: Arc::new(Mutex::new(None)),
    }
  }

  pub fn with_contents(contents: impl Into<String>) -> Self {
    let backing = Self::new();
    if let Ok(mut slot) = backing.contents.lock() {
      *slot = Some(contents.into());
    }
    backing
  }

  /// Last written document
  pub fn contents(&self) -> Option<String> {
    self.contents.lock().ok().and_then(|c| c.clone())
  }
}

impl ManifestBacking for MemoryBacking {
  fn location(&self) -> &Path {
    &self.location
  }

  fn read(&self) -> ModResult<Option<String>> {
    Ok(self.contents())
  }

  fn write(&self, contents: &str) -> ModResult<()> {
    let mut slot = self
      .contents
      .lock()
      .map_err(|_| crate::core::error::ModError::message("manifest lock poisoned"))?;
    *slot = Some(contents.to_string());
    Ok(())
  }
}
