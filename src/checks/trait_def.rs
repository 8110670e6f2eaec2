//! The `Check` trait and the values checks exchange with the runner
//!
//! Checks only read: they never repair the manifest or touch installed trees.

use crate::core::context::WorkspaceContext;
use crate::core::error::ModResult;
use crate::registry::RegistryProvider;
use serde::Serialize;
use std::fmt;
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
  Info,
  /// Worth fixing, does not fail `doctor`
  Warning,
  /// Fails `doctor` with the validation exit code
  Error,
}

impl fmt::Display for Severity {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let label = match self {
      Severity::Info => "INFO",
      Severity::Warning => "WARN",
      Severity::Error => "ERROR",
    };
    f.write_str(label)
  }
}

/// What one check found
#[derive(Debug, Clone, Serialize)]
pub struct CheckResult {
  pub check_name: String,
  pub passed: bool,
  pub severity: Severity,
  pub message: String,
  /// Command or edit that resolves a failure
  pub fix: Option<String>,
  /// Per-module findings for `--json`
  #[serde(skip_serializing_if = "Option::is_none")]
  pub details: Option<serde_json::Value>,
}

impl CheckResult {
  pub fn pass(check_name: impl Into<String>, message: impl Into<String>) -> Self {
    Self {
      check_name: check_name.into(),
      passed: true,
      severity: Severity::Info,
      message: message.into(),
      fix: None,
      details: None,
    }
  }

  pub fn error(check_name: impl Into<String>, message: impl Into<String>, fix: impl Into<String>) -> Self {
    Self::failed(check_name.into(), Severity::Error, message.into(), fix.into())
  }

  pub fn warning(check_name: impl Into<String>, message: impl Into<String>, fix: impl Into<String>) -> Self {
    Self::failed(check_name.into(), Severity::Warning, message.into(), fix.into())
  }

  fn failed(check_name: String, severity: Severity, message: String, fix: String) -> Self {
    Self {
      check_name,
      passed: false,
      severity,
      message,
      fix: Some(fix),
      details: None,
    }
  }

  pub fn with_details(mut self, details: serde_json::Value) -> Self {
    self.details = Some(details);
    self
  }

  /// Failed with error severity
  pub fn is_blocking(&self) -> bool {
    !self.passed && self.severity == Severity::Error
  }
}

/// Workspace and registry access shared by every check of one run
#[derive(Clone)]
pub struct CheckContext {
  pub workspace: WorkspaceContext,
  /// Restrict module-level findings to this module
  pub module_name: Option<String>,
  /// Also run checks that read registries
  pub thorough: bool,
  pub provider: Arc<dyn RegistryProvider>,
}

impl CheckContext {
  /// Whether `module` is in scope for this run
  pub fn includes(&self, module: &str) -> bool {
    self.module_name.as_deref().is_none_or(|m| m == module)
  }
}

/// A read-only workspace health check run by `modsync doctor`
///
/// `run` returns `Err` only when the check could not look at the workspace at
/// all; problems it finds are reported as failing `CheckResult`s.
pub trait Check: Send + Sync {
  /// Kebab-case identifier, also the `check_name` of its results
  fn name(&self) -> &str;

  fn description(&self) -> &str;

  fn run(&self, ctx: &CheckContext) -> ModResult<CheckResult>;

  /// Only run with `--thorough` (opens registries, fetches trees)
  fn thorough_only(&self) -> bool {
    false
  }
}
