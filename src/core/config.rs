//! Workspace configuration (modsync.toml)
//!
//! Every section is optional; a workspace without a config file gets the defaults
//! below. The `[update]` section is the update configuration consulted by the
//! update engine: registry identifiers map to `true`/`false`, a pinned version,
//! or a table of per-module entries.

use crate::core::error::{ConfigError, ModError, ModResult, ResultExt};
use crate::utils;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

pub const DEFAULT_REGISTRY_REMOTE: &str = "https://github.com/nf-core/modules.git";
pub const DEFAULT_REGISTRY_BASE_PATH: &str = "modules";

/// Configuration for modsync
/// Searched in order: modsync.toml, .modsync.toml, .config/modsync.toml
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ModConfig {
  #[serde(default)]
  pub workspace: WorkspaceConfig,
  #[serde(default)]
  pub registry: RegistryConfig,
  #[serde(default)]
  pub update: UpdateConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkspaceConfig {
  /// Workspace name recorded in newly created manifests
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub name: Option<String>,

  /// Home page recorded in newly created manifests
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub home_page: Option<String>,

  /// Directory holding installed modules: `<modules_dir>/<registry>/<module>`
  #[serde(default = "default_modules_dir")]
  pub modules_dir: PathBuf,

  /// Manifest file, relative to the workspace root
  #[serde(default = "default_manifest")]
  pub manifest: PathBuf,

  /// Where clones of remote registries are kept
  #[serde(default = "default_cache_dir")]
  pub cache_dir: PathBuf,
}

fn default_modules_dir() -> PathBuf {
  PathBuf::from("modules")
}

fn default_manifest() -> PathBuf {
  PathBuf::from("modules.json")
}

fn default_cache_dir() -> PathBuf {
  PathBuf::from(".modsync").join("cache")
}

impl Default for WorkspaceConfig {
  fn default() -> Self {
    Self {
      name: None,
      home_page: None,
      modules_dir: default_modules_dir(),
      manifest: default_manifest(),
      cache_dir: default_cache_dir(),
    }
  }
}

/// The default registry new modules are resolved against
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegistryConfig {
  /// Registry identifier (default: derived from the remote URL)
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub name: Option<String>,

  #[serde(default = "default_remote")]
  pub remote: String,

  /// Path prefix of module directories inside the registry
  #[serde(default = "default_base_path")]
  pub base_path: String,

  /// Branch to read history from (default: the registry HEAD)
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub branch: Option<String>,
}

fn default_remote() -> String {
  DEFAULT_REGISTRY_REMOTE.to_string()
}

fn default_base_path() -> String {
  DEFAULT_REGISTRY_BASE_PATH.to_string()
}

impl Default for RegistryConfig {
  fn default() -> Self {
    Self {
      name: None,
      remote: default_remote(),
      base_path: default_base_path(),
      branch: None,
    }
  }
}

impl RegistryConfig {
  /// Registry identifier used as the manifest key
  pub fn id(&self) -> String {
    match &self.name {
      Some(name) if !name.is_empty() => name.clone(),
      _ => utils::path_from_remote(&self.remote),
    }
  }

  pub fn validate(&self) -> ModResult<()> {
    if self.remote.trim().is_empty() {
      return Err(ModError::Config(ConfigError::MissingField {
        field: "registry.remote".to_string(),
      }));
    }
    if self.id().is_empty() {
      return Err(ModError::Config(ConfigError::Invalid {
        field: "registry.name".to_string(),
        reason: format!("cannot derive a registry name from '{}'", self.remote),
      }));
    }
    Ok(())
  }
}

/// A per-module `[update]` entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ModuleUpdateEntry {
  Enabled(bool),
  Pinned(String),
}

/// A per-registry `[update]` entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum UpdateEntry {
  /// `true` updates everything, `false` skips the whole registry
  Enabled(bool),
  /// Every module of the registry pinned to one version
  Pinned(String),
  /// Per-module entries; modules without an entry update normally
  Modules(BTreeMap<String, ModuleUpdateEntry>),
}

/// What the update engine should do with one module
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UpdatePolicy {
  Latest,
  Pinned(String),
  Disabled,
}

/// The `[update]` section
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UpdateConfig {
  pub entries: BTreeMap<String, UpdateEntry>,
}

impl UpdateConfig {
  /// Resolve the update policy for a module of a registry
  pub fn policy(&self, registry: &str, module: &str) -> UpdatePolicy {
    match self.entries.get(registry) {
      None | Some(UpdateEntry::Enabled(true)) => UpdatePolicy::Latest,
      Some(UpdateEntry::Enabled(false)) => UpdatePolicy::Disabled,
      Some(UpdateEntry::Pinned(version)) => UpdatePolicy::Pinned(version.clone()),
      Some(UpdateEntry::Modules(modules)) => match modules.get(module) {
        None | Some(ModuleUpdateEntry::Enabled(true)) => UpdatePolicy::Latest,
        Some(ModuleUpdateEntry::Enabled(false)) => UpdatePolicy::Disabled,
        Some(ModuleUpdateEntry::Pinned(version)) => UpdatePolicy::Pinned(version.clone()),
      },
    }
  }

  pub fn validate(&self) -> ModResult<()> {
    for (registry, entry) in &self.entries {
      match entry {
        UpdateEntry::Pinned(version) if version.trim().is_empty() => {
          return Err(ModError::Config(ConfigError::Invalid {
            field: format!("update.\"{}\"", registry),
            reason: "pinned version is empty".to_string(),
          }));
        }
        UpdateEntry::Modules(modules) => {
          for (module, module_entry) in modules {
            if let ModuleUpdateEntry::Pinned(version) = module_entry
              && version.trim().is_empty()
            {
              return Err(ModError::Config(ConfigError::Invalid {
                field: format!("update.\"{}\".{}", registry, module),
                reason: "pinned version is empty".to_string(),
              }));
            }
          }
        }
        _ => {}
      }
    }
    Ok(())
  }
}

impl ModConfig {
  /// Find config file in search order: modsync.toml, .modsync.toml, .config/modsync.toml
  pub fn find_config_path(path: &Path) -> Option<PathBuf> {
    let candidates = vec![
      path.join("modsync.toml"),
      path.join(".modsync.toml"),
      path.join(".config").join("modsync.toml"),
    ];

    candidates.into_iter().find(|p| p.exists())
  }

  /// Load config if present, defaults otherwise
  pub fn load_or_default(path: &Path) -> ModResult<Self> {
    match Self::find_config_path(path) {
      Some(config_path) => Self::load_from(&config_path),
      None => Ok(Self::default()),
    }
  }

  /// Load and validate a specific config file
  pub fn load_from(config_path: &Path) -> ModResult<Self> {
    let content = fs::read_to_string(config_path)
      .with_context(|| format!("Failed to read config from {}", config_path.display()))?;
    Self::parse(&content).with_context(|| format!("Invalid configuration in {}", config_path.display()))
  }

  pub fn parse(content: &str) -> ModResult<Self> {
    let config: ModConfig = toml_edit::de::from_str(content)?;
    config.registry.validate()?;
    config.update.validate()?;
    Ok(config)
  }

  /// Save config to modsync.toml (default location)
  pub fn save(&self, path: &Path) -> ModResult<()> {
    let config_path = path.join("modsync.toml");
    let content = toml_edit::ser::to_string_pretty(self)
      .map_err(|e| ModError::message(format!("Failed to serialize config to TOML: {}", e)))?;
    fs::write(&config_path, content).with_context(|| format!("Failed to write config to {}", config_path.display()))?;
    Ok(())
  }
}
