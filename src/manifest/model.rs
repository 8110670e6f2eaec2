//! Manifest document model (modules.json)

use crate::core::error::ModResult;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// The manifest: registry identifier -> registry record
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Manifest {
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub name: Option<String>,

  #[serde(rename = "homePage", default, skip_serializing_if = "Option::is_none")]
  pub home_page: Option<String>,

  pub repos: BTreeMap<String, RegistryRecord>,
}

/// Origin metadata and installed modules of one registry
///
/// `git_url` and `modules` are required for a usable record but optional here,
/// so that an incomplete record loads and is reported as outdated instead of
/// failing the parse.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RegistryRecord {
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub git_url: Option<String>,

  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub base_path: Option<String>,

  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub modules: Option<BTreeMap<String, ModuleRecord>>,

  /// Fields written by other tools, preserved as-is
  #[serde(flatten)]
  pub extra: BTreeMap<String, Value>,
}

impl RegistryRecord {
  pub fn new(git_url: &str, base_path: &str) -> Self {
    Self {
      git_url: Some(git_url.to_string()),
      base_path: Some(base_path.to_string()),
      modules: Some(BTreeMap::new()),
      extra: BTreeMap::new(),
    }
  }

  /// Both the remote URL and the module mapping are present
  pub fn is_complete(&self) -> bool {
    self.git_url.is_some() && self.modules.is_some()
  }

  /// Names of the required fields that are absent
  pub fn missing_fields(&self) -> Vec<&'static str> {
    let mut missing = Vec::new();
    if self.git_url.is_none() {
      missing.push("git_url");
    }
    if self.modules.is_none() {
      missing.push("modules");
    }
    missing
  }
}

/// Installed version of one module
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ModuleRecord {
  /// Null while the version awaits manual resolution
  #[serde(default)]
  pub git_sha: Option<String>,

  #[serde(default, skip_serializing_if = "std::ops::Not::not")]
  pub patch_applied: bool,

  #[serde(flatten)]
  pub extra: BTreeMap<String, Value>,
}

impl ModuleRecord {
  pub fn new(git_sha: Option<String>) -> Self {
    Self {
      git_sha,
      ..Default::default()
    }
  }
}

impl Manifest {
  /// Parse a manifest document
  pub fn from_json(content: &str) -> Result<Self, serde_json::Error> {
    serde_json::from_str(content)
  }

  /// Pretty JSON with 4-space indentation and a trailing newline
  pub fn to_json(&self) -> ModResult<String> {
    let mut buf = Vec::new();
    let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
    let mut ser = serde_json::Serializer::with_formatter(&mut buf, formatter);
    self.serialize(&mut ser)?;
    let mut out = String::from_utf8(buf)?;
    out.push('\n');
    Ok(out)
  }

  /// Total number of module records across complete registries
  pub fn module_count(&self) -> usize {
    self
      .repos
      .values()
      .filter_map(|r| r.modules.as_ref())
      .map(BTreeMap::len)
      .sum()
  }
}
