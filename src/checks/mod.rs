//! Health checks (`modsync doctor`)
//!
//! All checks implement the `Check` trait and only read workspace state.
//!
//! # Built-in Checks
//!
//! - **manifest-present**: the manifest exists and parses
//! - **manifest-entries**: every entry has an installed tree, every installed tree an entry
//! - **local-changes** (thorough): installed files match the registry at the recorded version
//! - **registry-access** (thorough): every registry in use can be opened
//!
//! # Example
//!
//! ```rust,ignore
//! use modsync::checks::{CheckContext, create_default_runner};
//!
//! let ctx = CheckContext {
//!   workspace,
//!   module_name: None,
//!   thorough: true,
//!   provider: Arc::new(GitRegistryProvider::from_context(&workspace)),
//! };
//!
//! let runner = create_default_runner();
//! let report = runner.run(&ctx);
//! for result in &report.results {
//!   if !result.passed {
//!     println!("❌ {}: {}", result.check_name, result.message);
//!   }
//! }
//! ```

mod local_changes;
mod manifest;
mod registry;
mod runner;
mod trait_def;

pub use runner::{CheckReport, CheckRunner, create_default_runner};
pub use trait_def::{Check, CheckContext, CheckResult, Severity};
