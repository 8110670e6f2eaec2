//! `modsync update` - move modules to newer registry versions
//!
//! The manifest is reconciled first so updates start from a consistent state.
//! With `--save-diff` nothing is changed; patches are written instead.

use super::check::{outdated_error, print_diagnostics};
use super::{print_json, short_version};
use crate::core::context::WorkspaceContext;
use crate::core::error::{ExitCode, ModError, ModResult};
use crate::install::FsInstaller;
use crate::manifest::ManifestStore;
use crate::registry::GitRegistryProvider;
use crate::update::{UpdateEngine, UpdateOptions, UpdateOutcome, UpdateReport, UpdateTarget};
use crate::utils::plural_s;
use std::path::PathBuf;

/// Arguments of the update command, as parsed by the CLI
#[derive(Debug, Clone, Default)]
pub struct UpdateArgs {
  pub module: Option<String>,
  pub all: bool,
  pub sha: Option<String>,
  pub force: bool,
  pub save_diff: Option<PathBuf>,
  pub json: bool,
}

impl UpdateArgs {
  fn target(&self) -> ModResult<UpdateTarget> {
    match (&self.module, self.all) {
      (Some(_), true) => Err(ModError::with_help(
        "Cannot combine a module name with --all",
        "Pass either a module name or --all",
      )),
      (Some(name), false) => Ok(UpdateTarget::Module(name.clone())),
      (None, true) => Ok(UpdateTarget::All),
      (None, false) => Err(ModError::with_help(
        "Must specify a module name or use --all",
        "Usage: modsync update <MODULE> or modsync update --all",
      )),
    }
  }
}

/// Run the update command
pub fn run_update(ctx: &WorkspaceContext, args: UpdateArgs) -> ModResult<()> {
  let target = args.target()?;

  let mut store = ManifestStore::open(ctx)?;
  let provider = GitRegistryProvider::from_context(ctx);
  let installer = FsInstaller::new();

  let diagnostics = store.check_up_to_date(ctx, &provider, &installer)?;
  if diagnostics.outdated {
    if !args.json {
      print_diagnostics(&diagnostics);
    }
    return Err(outdated_error(&store));
  }
  if !args.json && !diagnostics.failed.is_empty() {
    print_diagnostics(&diagnostics);
    println!();
  }

  let diff_path = args.save_diff.as_ref().map(|p| {
    if p.is_absolute() {
      p.clone()
    } else {
      ctx.root.join(p)
    }
  });

  let mut opts = UpdateOptions::new(target);
  opts.sha = args.sha.clone();
  opts.force = args.force;
  opts.diff_path = diff_path.clone();
  opts.show_progress = !args.json;

  let report = UpdateEngine::new(ctx, &mut store, &provider, &installer).run(&opts)?;

  if args.json {
    print_json(&report)?;
  } else {
    print_report(&report);
    if let Some(path) = &diff_path
      && report
        .modules
        .iter()
        .any(|m| matches!(m.outcome, UpdateOutcome::DiffWritten { .. }))
    {
      println!("\n💡 Apply with: git apply {}", path.display());
    }
  }

  if !report.success() {
    std::process::exit(ExitCode::Validation.as_i32());
  }

  Ok(())
}

fn print_report(report: &UpdateReport) {
  for entry in &report.modules {
    let name = format!("{}/{}", entry.registry, entry.module);
    let from = entry.from_version.as_deref().map(short_version).unwrap_or("(none)");
    match &entry.outcome {
      UpdateOutcome::Applied { new_version } => {
        println!("✅ {}: {} → {}", name, from, short_version(new_version));
      }
      UpdateOutcome::DiffWritten { path } => {
        println!("📝 {}: changes written to {}", name, path.display());
      }
      UpdateOutcome::Skipped { reason } => {
        println!("   {}: {}", name, reason);
      }
      UpdateOutcome::Failed { error } => {
        println!("❌ {}: {}", name, error);
      }
    }
  }

  let applied = report.applied().count();
  let failed = report.failed().count();
  println!(
    "\nSummary: {} module{} updated, {} failed",
    applied,
    plural_s(applied),
    failed
  );
}
