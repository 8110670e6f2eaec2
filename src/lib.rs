//! modsync - keep vendored registry modules in sync with a JSON manifest
//!
//! Modules are directory trees copied from git registries into the workspace.
//! The manifest records, per registry, which version of each module is
//! installed. `reconcile` repairs drift between the two, `update` moves
//! modules to newer versions (or writes the changes as a patch).

pub mod checks;
pub mod commands;
pub mod core;
pub mod install;
pub mod logging;
pub mod manifest;
pub mod reconcile;
pub mod registry;
pub mod ui;
pub mod update;
pub mod utils;
