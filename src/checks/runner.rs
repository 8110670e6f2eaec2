//! Runs the registered checks and collects a `CheckReport`

use super::trait_def::{Check, CheckContext, CheckResult, Severity};
use std::sync::Arc;

/// Ordered set of checks
#[derive(Default)]
pub struct CheckRunner {
  checks: Vec<Arc<dyn Check>>,
}

/// Results of one run plus the checks left out of it
#[derive(Debug, Default)]
pub struct CheckReport {
  pub results: Vec<CheckResult>,
  /// Names of thorough-only checks skipped by a quick run
  pub skipped: Vec<String>,
}

impl CheckReport {
  pub fn passed_count(&self) -> usize {
    self.results.iter().filter(|r| r.passed).count()
  }

  pub fn has_errors(&self) -> bool {
    self.results.iter().any(CheckResult::is_blocking)
  }

  pub fn has_warnings(&self) -> bool {
    self
      .results
      .iter()
      .any(|r| !r.passed && r.severity == Severity::Warning)
  }

  pub fn is_skipped(&self, check: &str) -> bool {
    self.skipped.iter().any(|name| name == check)
  }
}

impl CheckRunner {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn with_check(mut self, check: impl Check + 'static) -> Self {
    self.checks.push(Arc::new(check));
    self
  }

  /// Registered checks in run order
  pub fn checks(&self) -> impl Iterator<Item = &dyn Check> {
    self.checks.iter().map(|c| c.as_ref())
  }

  /// Run every applicable check
  ///
  /// A check that cannot run becomes an error result; the others still run.
  pub fn run(&self, ctx: &CheckContext) -> CheckReport {
    let mut report = CheckReport::default();

    for check in &self.checks {
      if check.thorough_only() && !ctx.thorough {
        report.skipped.push(check.name().to_string());
        continue;
      }

      let result = check.run(ctx).unwrap_or_else(|err| {
        tracing::debug!(check = check.name(), error = %err, "check could not run");
        CheckResult::error(
          check.name(),
          format!("Could not run: {}", err),
          err
            .help_message()
            .unwrap_or_else(|| "Run with -v for debug logs".to_string()),
        )
      });
      report.results.push(result);
    }

    report
  }
}

/// Runner with the built-in checks, cheapest first
pub fn create_default_runner() -> CheckRunner {
  CheckRunner::new()
    .with_check(super::manifest::ManifestPresentCheck)
    .with_check(super::manifest::ManifestEntriesCheck)
    .with_check(super::local_changes::LocalChangesCheck)
    .with_check(super::registry::RegistryAccessCheck)
}
