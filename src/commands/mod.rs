//! CLI commands for modsync
//!
//! - **create**: Build the manifest from the installed modules
//! - **check**: Reconcile the manifest with installed trees (repairs drift)
//! - **doctor**: Read-only health checks
//! - **update**: Move modules to new registry versions, or write a patch
//! - **status**: List manifest modules and their install state
//!
//! All commands accept `&WorkspaceContext` to avoid redundant workspace loads.

pub mod check;
pub mod create;
pub mod doctor;
pub mod status;
pub mod update;

pub use check::run_check;
pub use create::run_create;
pub use doctor::run_doctor;
pub use status::run_status;
pub use update::{UpdateArgs, run_update};

use crate::core::error::{ModError, ModResult};
use serde::Serialize;

/// First 7 characters of a commit reference, for display
pub(crate) fn short_version(version: &str) -> &str {
  version.get(..7).unwrap_or(version)
}

pub(crate) fn print_json<T: Serialize>(value: &T) -> ModResult<()> {
  let json_output =
    serde_json::to_string_pretty(value).map_err(|e| ModError::message(format!("Failed to serialize JSON: {}", e)))?;
  println!("{}", json_output);
  Ok(())
}
