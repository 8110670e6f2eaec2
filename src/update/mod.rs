//! Update engine: move installed modules to new registry versions
//!
//! Per module: resolve the target version (config pin, explicit version, or
//! latest), skip when already there, fetch the target tree into memory, then
//! either write a patch or replace the installed tree. A failing module never
//! aborts the batch. The manifest is written once at the end.

use crate::core::config::{DEFAULT_REGISTRY_BASE_PATH, UpdateConfig, UpdatePolicy};
use crate::core::context::WorkspaceContext;
use crate::core::error::{ModError, ModResult, ModuleError, ResultExt};
use crate::install::{Installer, ModulePatch, diff::render_manifest_diff};
use crate::manifest::{Manifest, ManifestStore, ModuleRecord, RegistryOrigin, RegistryRecord};
use crate::registry::{RegistryClient, RegistryProvider};
use crate::ui::progress::FileProgress;
use serde::Serialize;
use std::collections::BTreeMap;
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

/// Which modules to update
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UpdateTarget {
  /// One module, looked up in the default registry first
  Module(String),
  /// Every module of every registry in the manifest
  All,
}

#[derive(Debug, Clone)]
pub struct UpdateOptions {
  pub target: UpdateTarget,
  /// Explicit version; config pins take precedence
  pub sha: Option<String>,
  /// Reinstall even when already at the target version
  pub force: bool,
  /// Write patches here instead of changing anything
  pub diff_path: Option<PathBuf>,
  pub show_progress: bool,
}

impl UpdateOptions {
  pub fn new(target: UpdateTarget) -> Self {
    Self {
      target,
      sha: None,
      force: false,
      diff_path: None,
      show_progress: false,
    }
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
  /// Updates are disabled by configuration
  Disabled,
  /// Already at the target version
  UpToDate,
  /// The registry has no history for the module
  NotInRegistry,
}

impl std::fmt::Display for SkipReason {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    match self {
      SkipReason::Disabled => write!(f, "updates disabled in configuration"),
      SkipReason::UpToDate => write!(f, "already up to date"),
      SkipReason::NotInRegistry => write!(f, "not found in the registry"),
    }
  }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum UpdateOutcome {
  Applied { new_version: String },
  DiffWritten { path: PathBuf },
  Skipped { reason: SkipReason },
  Failed { error: String },
}

/// Result for one module
#[derive(Debug, Clone, Serialize)]
pub struct ModuleUpdate {
  pub registry: String,
  pub module: String,
  pub from_version: Option<String>,
  #[serde(flatten)]
  pub outcome: UpdateOutcome,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct UpdateReport {
  pub modules: Vec<ModuleUpdate>,
}

impl UpdateReport {
  /// True when no targeted module failed
  pub fn success(&self) -> bool {
    !self
      .modules
      .iter()
      .any(|m| matches!(m.outcome, UpdateOutcome::Failed { .. }))
  }

  pub fn applied(&self) -> impl Iterator<Item = &ModuleUpdate> {
    self
      .modules
      .iter()
      .filter(|m| matches!(m.outcome, UpdateOutcome::Applied { .. }))
  }

  pub fn failed(&self) -> impl Iterator<Item = &ModuleUpdate> {
    self
      .modules
      .iter()
      .filter(|m| matches!(m.outcome, UpdateOutcome::Failed { .. }))
  }

  pub fn outcome(&self, registry: &str, module: &str) -> Option<&UpdateOutcome> {
    self
      .modules
      .iter()
      .find(|m| m.registry == registry && m.module == module)
      .map(|m| &m.outcome)
  }
}

/// One module to process, with its registry origin
struct Target {
  origin: RegistryOrigin,
  module: String,
}

pub struct UpdateEngine<'a> {
  ctx: &'a WorkspaceContext,
  store: &'a mut ManifestStore,
  provider: &'a dyn RegistryProvider,
  installer: &'a dyn Installer,
  config: UpdateConfig,
}

impl<'a> UpdateEngine<'a> {
  pub fn new(
    ctx: &'a WorkspaceContext,
    store: &'a mut ManifestStore,
    provider: &'a dyn RegistryProvider,
    installer: &'a dyn Installer,
  ) -> Self {
    Self {
      ctx,
      store,
      provider,
      installer,
      config: ctx.config.update.clone(),
    }
  }

  /// Use a different update configuration than the workspace's
  pub fn with_config(mut self, config: UpdateConfig) -> Self {
    self.config = config;
    self
  }

  pub fn run(&mut self, opts: &UpdateOptions) -> ModResult<UpdateReport> {
    let targets = self.collect_targets(&opts.target)?;
    let single = matches!(opts.target, UpdateTarget::Module(_));

    // Diff runs project manifest changes onto a copy
    let original_json = self.store.render()?;
    let mut projected = self.store.get().clone();

    if let Some(path) = &opts.diff_path {
      if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
      {
        fs::create_dir_all(parent).with_context(|| format!("Failed to create {}", parent.display()))?;
      }
      fs::write(path, "").with_context(|| format!("Failed to create {}", path.display()))?;
    }

    let mut progress = if opts.show_progress && targets.len() > 1 {
      Some(FileProgress::new(
        targets.len(),
        format!("Updating {} modules", targets.len()),
      ))
    } else {
      None
    };

    let mut clients: BTreeMap<String, Result<Box<dyn RegistryClient>, String>> = BTreeMap::new();
    let mut report = UpdateReport::default();

    for target in &targets {
      let from_version = self
        .store
        .get_module_version(&target.origin.id, &target.module)
        .map(str::to_string);

      let client = clients.entry(target.origin.id.clone()).or_insert_with(|| {
        self
          .provider
          .open(&target.origin.id, &target.origin.remote, &target.origin.base_path)
          .map_err(|e| e.to_string())
      });

      let outcome = match client {
        Ok(client) => self
          .update_module(&**client, target, from_version.as_deref(), opts, single, &mut projected)
          .unwrap_or_else(|e| UpdateOutcome::Failed { error: e.to_string() }),
        Err(e) => UpdateOutcome::Failed {
          error: format!("registry '{}' unavailable: {}", target.origin.id, e),
        },
      };

      match &outcome {
        UpdateOutcome::Failed { error } => {
          tracing::warn!(registry = %target.origin.id, module = %target.module, error, "module update failed")
        }
        other => tracing::debug!(registry = %target.origin.id, module = %target.module, outcome = ?other, "module processed"),
      }

      report.modules.push(ModuleUpdate {
        registry: target.origin.id.clone(),
        module: target.module.clone(),
        from_version,
        outcome,
      });

      if let Some(ref mut p) = progress {
        p.inc();
      }
    }

    if self.store.is_dirty() {
      self.store.dump()?;
    }

    if let Some(path) = &opts.diff_path {
      let projected_json = projected.to_json()?;
      if projected_json != original_json {
        let shown = self.display_path(self.store.location());
        append(path, &render_manifest_diff(&shown, &original_json, &projected_json))?;
      }
    }

    Ok(report)
  }

  fn collect_targets(&self, target: &UpdateTarget) -> ModResult<Vec<Target>> {
    let manifest = self.store.get();
    let complete = manifest.repos.iter().filter_map(|(id, record)| {
      let remote = record.git_url.as_ref()?;
      let modules = record.modules.as_ref()?;
      let base_path = record.base_path.as_deref().unwrap_or(DEFAULT_REGISTRY_BASE_PATH);
      Some((RegistryOrigin::new(id, remote, base_path), modules))
    });

    match target {
      UpdateTarget::All => Ok(
        complete
          .flat_map(|(origin, modules)| {
            modules.keys().map(move |module| Target {
              origin: origin.clone(),
              module: module.clone(),
            })
          })
          .collect(),
      ),
      UpdateTarget::Module(name) => {
        let default = self.ctx.default_registry();
        let mut matches: Vec<_> = complete.filter(|(_, modules)| modules.contains_key(name)).collect();
        // Prefer the default registry when the name is ambiguous
        matches.sort_by_key(|(origin, _)| origin.id != default);

        let (origin, _) = matches.into_iter().next().ok_or_else(|| {
          ModError::Module(ModuleError::NotInstalled {
            module: name.clone(),
            registry: default,
          })
        })?;
        Ok(vec![Target {
          origin,
          module: name.clone(),
        }])
      }
    }
  }

  fn update_module(
    &mut self,
    client: &dyn RegistryClient,
    target: &Target,
    current: Option<&str>,
    opts: &UpdateOptions,
    single: bool,
    projected: &mut Manifest,
  ) -> ModResult<UpdateOutcome> {
    let registry = &target.origin.id;
    let module = &target.module;

    let requested = match self.config.policy(registry, module) {
      UpdatePolicy::Disabled => {
        return Ok(UpdateOutcome::Skipped {
          reason: SkipReason::Disabled,
        });
      }
      UpdatePolicy::Pinned(pin) => {
        if let Some(sha) = &opts.sha
          && sha != &pin
        {
          tracing::info!(registry = %registry, module = %module, pin, sha, "configured pin overrides requested version");
        }
        Some(pin)
      }
      UpdatePolicy::Latest => opts.sha.clone(),
    };

    let version = match requested {
      Some(requested) => client.resolve_version(&requested)?.ok_or_else(|| {
        ModError::Module(ModuleError::VersionResolutionFailed {
          module: module.clone(),
          reason: format!("version '{}' not found in {}", requested, client.remote_url()),
        })
      })?,
      None => match client.latest_version(module)? {
        Some(latest) => latest.version,
        None if single => {
          return Err(ModError::Module(ModuleError::VersionResolutionFailed {
            module: module.clone(),
            reason: format!("no history for '{}' in {}", client.module_path(module), client.remote_url()),
          }));
        }
        None => {
          return Ok(UpdateOutcome::Skipped {
            reason: SkipReason::NotInRegistry,
          });
        }
      },
    };

    if current == Some(version.as_str()) && !opts.force {
      return Ok(UpdateOutcome::Skipped {
        reason: SkipReason::UpToDate,
      });
    }

    let fetched = client.fetch_tree(&client.module_path(module), &version)?;
    let dest = self.ctx.module_dir(registry, module);

    if let Some(path) = &opts.diff_path {
      let installed = self.installer.read_tree(&dest)?;
      let patch = ModulePatch {
        registry: registry.clone(),
        module: module.clone(),
        from_version: current.map(str::to_string),
        to_version: version.clone(),
        display_dir: self.display_path(&dest),
        files: self.installer.diff(&installed, &fetched),
      };
      if patch.has_changes() {
        append(path, &patch.render())?;
      } else if current == Some(version.as_str()) {
        // Forced run against an unchanged tree has nothing to write
        return Ok(UpdateOutcome::Skipped {
          reason: SkipReason::UpToDate,
        });
      }
      project(projected, &target.origin, module, &version);
      return Ok(UpdateOutcome::DiffWritten { path: path.clone() });
    }

    self.installer.install(&fetched, &dest)?;
    self.store.update(&target.origin, module, Some(&version), false);
    Ok(UpdateOutcome::Applied { new_version: version })
  }

  /// Path relative to the workspace root when possible
  fn display_path(&self, path: &Path) -> PathBuf {
    path
      .strip_prefix(self.ctx.workspace_root())
      .map(Path::to_path_buf)
      .unwrap_or_else(|_| path.to_path_buf())
  }
}

/// Record an update in the projected manifest of a diff run
fn project(manifest: &mut Manifest, origin: &RegistryOrigin, module: &str, version: &str) {
  let record = manifest
    .repos
    .entry(origin.id.clone())
    .or_insert_with(|| RegistryRecord::new(&origin.remote, &origin.base_path));
  let entry = record
    .modules
    .get_or_insert_with(BTreeMap::new)
    .entry(module.to_string())
    .or_insert_with(|| ModuleRecord::new(None));
  entry.git_sha = Some(version.to_string());
  entry.patch_applied = false;
}

fn append(path: &Path, text: &str) -> ModResult<()> {
  let mut file = OpenOptions::new()
    .append(true)
    .create(true)
    .open(path)
    .with_context(|| format!("Failed to open {}", path.display()))?;
  file
    .write_all(text.as_bytes())
    .with_context(|| format!("Failed to write {}", path.display()))?;
  Ok(())
}
