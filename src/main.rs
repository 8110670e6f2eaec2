use clap::{Parser, Subcommand};
use modsync::commands::{self, UpdateArgs};
use modsync::core::context::WorkspaceContext;
use modsync::core::error::{ModError, print_error};
use modsync::logging;
use std::path::PathBuf;

/// Keep vendored registry modules in sync with a JSON manifest
#[derive(Parser)]
#[command(name = "modsync")]
#[command(version, about, long_about = None)]
#[command(propagate_version = true)]
#[command(styles = get_styles())]
struct Cli {
  /// Run as if started in this directory
  #[arg(short = 'C', long = "dir", global = true, value_name = "DIR")]
  dir: Option<PathBuf>,

  /// Show debug logs on stderr
  #[arg(short, long, global = true)]
  verbose: bool,

  #[command(subcommand)]
  command: Commands,
}

#[derive(Subcommand)]
enum Commands {
  /// Build the manifest from the installed modules
  Create {
    /// Overwrite an existing manifest
    #[arg(long)]
    force: bool,
    /// Output the result in JSON format
    #[arg(long)]
    json: bool,
  },

  /// Reconcile the manifest with installed modules (reinstalls missing trees)
  Check {
    /// Output diagnostics in JSON format
    #[arg(long)]
    json: bool,
  },

  /// Run read-only health checks and diagnostics
  Doctor {
    /// Only check this module
    #[arg(long)]
    module: Option<String>,
    /// Run thorough checks (includes registry access)
    #[arg(long)]
    thorough: bool,
    /// Output results in JSON format
    #[arg(long)]
    json: bool,
  },

  /// Update modules to a newer registry version
  Update {
    /// Name of the module to update
    module: Option<String>,
    /// Update every module in the manifest
    #[arg(short, long)]
    all: bool,
    /// Target version (commit reference) instead of the latest
    #[arg(long)]
    sha: Option<String>,
    /// Reinstall even when already at the target version
    #[arg(long)]
    force: bool,
    /// Write the changes as a patch instead of applying them
    #[arg(long, value_name = "PATH")]
    save_diff: Option<PathBuf>,
    /// Output the report in JSON format
    #[arg(long)]
    json: bool,
  },

  /// Show the modules recorded in the manifest
  Status {
    /// Output status in JSON format
    #[arg(long)]
    json: bool,
  },
}

/// Custom clap styles for better terminal output
fn get_styles() -> clap::builder::Styles {
  clap::builder::Styles::styled()
    .usage(
      anstyle::Style::new()
        .bold()
        .underline()
        .fg_color(Some(anstyle::Color::Ansi(anstyle::AnsiColor::Yellow))),
    )
    .header(
      anstyle::Style::new()
        .bold()
        .underline()
        .fg_color(Some(anstyle::Color::Ansi(anstyle::AnsiColor::Yellow))),
    )
    .literal(anstyle::Style::new().fg_color(Some(anstyle::Color::Ansi(anstyle::AnsiColor::Green))))
    .invalid(
      anstyle::Style::new()
        .bold()
        .fg_color(Some(anstyle::Color::Ansi(anstyle::AnsiColor::Red))),
    )
    .error(
      anstyle::Style::new()
        .bold()
        .fg_color(Some(anstyle::Color::Ansi(anstyle::AnsiColor::Red))),
    )
    .valid(
      anstyle::Style::new()
        .bold()
        .underline()
        .fg_color(Some(anstyle::Color::Ansi(anstyle::AnsiColor::Green))),
    )
    .placeholder(anstyle::Style::new().fg_color(Some(anstyle::Color::Ansi(anstyle::AnsiColor::White))))
}

fn main() {
  let cli = Cli::parse();
  logging::init(cli.verbose);

  let current_dir = match std::env::current_dir() {
    Ok(dir) => dir,
    Err(e) => {
      eprintln!("Error: Failed to get current directory: {}", e);
      std::process::exit(1);
    }
  };

  let workspace_root = match cli.dir {
    Some(dir) => current_dir.join(dir),
    None => current_dir,
  };

  // Built once; every command borrows it
  let ctx = match WorkspaceContext::build(&workspace_root) {
    Ok(ctx) => ctx,
    Err(e) => handle_error(e),
  };

  let result = match cli.command {
    Commands::Create { force, json } => commands::run_create(&ctx, force, json),
    Commands::Check { json } => commands::run_check(&ctx, json),
    Commands::Doctor { module, thorough, json } => commands::run_doctor(&ctx, module, thorough, json),
    Commands::Update {
      module,
      all,
      sha,
      force,
      save_diff,
      json,
    } => commands::run_update(
      &ctx,
      UpdateArgs {
        module,
        all,
        sha,
        force,
        save_diff,
        json,
      },
    ),
    Commands::Status { json } => commands::run_status(&ctx, json),
  };

  if let Err(err) = result {
    handle_error(err);
  }
}

fn handle_error(err: ModError) -> ! {
  print_error(&err);
  std::process::exit(err.exit_code().as_i32());
}
