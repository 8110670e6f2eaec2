//! Health check command for diagnosing issues
//!
//! The doctor command runs all health checks and reports any issues found.
//! Unlike `check`, it never changes the manifest or installed modules.

use super::print_json;
use crate::checks::{CheckContext, Severity, create_default_runner};
use crate::core::context::WorkspaceContext;
use crate::core::error::{ExitCode, ModResult};
use crate::registry::GitRegistryProvider;
use std::sync::Arc;

/// Run the doctor command to diagnose issues
///
/// Returns Ok(()) if all checks pass, or exits with error code if checks fail
pub fn run_doctor(ctx: &WorkspaceContext, module: Option<String>, thorough: bool, json: bool) -> ModResult<()> {
  let check_ctx = CheckContext {
    workspace: ctx.clone(),
    module_name: module,
    thorough,
    provider: Arc::new(GitRegistryProvider::from_context(ctx)),
  };

  let runner = create_default_runner();
  let report = runner.run(&check_ctx);

  if json {
    // JSON output for CI/automation
    print_json(&report.results)?;
    if report.has_errors() {
      std::process::exit(ExitCode::Validation.as_i32());
    }
    return Ok(());
  }

  println!("🏥 Running health checks...\n");

  println!("📋 Registered checks:");
  for check in runner.checks() {
    let note = if report.is_skipped(check.name()) {
      " (skipped, use --thorough)"
    } else {
      ""
    };
    println!("   • {}: {}{}", check.name(), check.description(), note);
  }
  println!();

  for result in &report.results {
    let icon = if result.passed {
      "✅"
    } else if result.severity == Severity::Warning {
      "⚠️ "
    } else {
      "❌"
    };
    println!("{} {}: {}", icon, result.check_name, result.message);

    if !result.passed
      && let Some(ref fix) = result.fix
    {
      println!("   💡 Fix: {}", fix);
    }
    println!();
  }

  println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
  println!(
    "Summary: {}/{} checks passed",
    report.passed_count(),
    report.results.len()
  );

  if report.has_errors() {
    println!("\n⚠️  Critical issues found. Please fix errors before proceeding.");
    std::process::exit(ExitCode::Validation.as_i32());
  } else if report.has_warnings() {
    println!("\n⚠️  Some warnings found. Consider addressing them.");
  } else {
    println!("\n✨ All checks passed! Your modules look healthy.");
  }

  Ok(())
}
