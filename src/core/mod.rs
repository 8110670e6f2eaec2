//! Core building blocks shared by every modsync operation
//!
//! - **config**: modsync.toml parsing and validation
//! - **context**: Workspace context built once and passed everywhere
//! - **error**: Error types with exit codes and contextual help messages
//! - **vcs**: Git operations via the system `git` binary (SystemGit)

pub mod config;
pub mod context;
pub mod error;
pub mod vcs;
