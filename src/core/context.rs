//! Unified workspace context - build once, pass everywhere
//!
//! `WorkspaceContext` resolves the workspace root and configuration once in
//! `main.rs` and is passed by reference to every command. It also owns the
//! path layout: where the manifest lives and where each installed module tree
//! is expected on disk.

use crate::core::config::ModConfig;
use crate::core::error::ModResult;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Unified workspace context containing all shared workspace-level data.
#[derive(Debug, Clone)]
pub struct WorkspaceContext {
  /// Workspace root directory
  pub root: PathBuf,

  /// Configuration (defaults when no modsync.toml exists)
  pub config: Arc<ModConfig>,

  /// Where the configuration was loaded from, if anywhere
  pub config_path: Option<PathBuf>,
}

impl WorkspaceContext {
  /// Build workspace context from a root directory.
  pub fn build(workspace_root: &Path) -> ModResult<Self> {
    let root = workspace_root.to_path_buf();
    let config_path = ModConfig::find_config_path(&root);
    let config = match &config_path {
      Some(path) => ModConfig::load_from(path)?,
      None => ModConfig::default(),
    };

    Ok(Self {
      root,
      config: Arc::new(config),
      config_path,
    })
  }

  /// Context with an explicit configuration (tests, embedding)
  pub fn with_config(workspace_root: &Path, config: ModConfig) -> Self {
    Self {
      root: workspace_root.to_path_buf(),
      config: Arc::new(config),
      config_path: None,
    }
  }

  /// Get workspace root as Path reference (convenience)
  pub fn workspace_root(&self) -> &Path {
    &self.root
  }

  /// Absolute path of the manifest file
  pub fn manifest_path(&self) -> PathBuf {
    self.root.join(&self.config.workspace.manifest)
  }

  /// Directory holding every installed module of one registry
  pub fn registry_dir(&self, registry: &str) -> PathBuf {
    self.root.join(&self.config.workspace.modules_dir).join(registry)
  }

  /// Expected location of an installed module tree
  pub fn module_dir(&self, registry: &str, module: &str) -> PathBuf {
    self.registry_dir(registry).join(module)
  }

  /// Directory for clones of remote registries
  pub fn cache_dir(&self) -> PathBuf {
    self.root.join(&self.config.workspace.cache_dir)
  }

  /// Identifier of the default registry
  pub fn default_registry(&self) -> String {
    self.config.registry.id()
  }
}
