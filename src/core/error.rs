//! Error types for modsync with contextual messages and exit codes
//!
//! This module provides a unified error type that categorizes errors and provides
//! contextual help messages to users. Manifest and module failures carry enough
//! detail for the reconciler and update engine to decide between repairing,
//! skipping, or surfacing them.

use std::fmt;
use std::io;
use std::path::PathBuf;

/// Exit codes for modsync
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitCode {
  /// User error (config, invalid args, missing manifest)
  User = 1,
  /// System error (git, network, I/O)
  System = 2,
  /// Validation failure (checks failed, modules failed to update)
  Validation = 3,
}

impl ExitCode {
  /// Convert to i32 for process exit
  pub fn as_i32(self) -> i32 {
    self as i32
  }
}

/// Main error type for modsync
#[derive(Debug)]
pub enum ModError {
  /// Manifest (modules.json) errors
  Manifest(ManifestError),

  /// Per-module resolution/fetch/install errors
  Module(ModuleError),

  /// Configuration errors
  Config(ConfigError),

  /// Git operation errors
  Git(GitError),

  /// I/O errors
  Io(io::Error),

  /// Generic error with message and optional context
  Message {
    message: String,
    context: Option<String>,
    help: Option<String>,
  },
}

impl ModError {
  /// Create a simple error message
  pub fn message(msg: impl Into<String>) -> Self {
    ModError::Message {
      message: msg.into(),
      context: None,
      help: None,
    }
  }

  /// Create an error with help text
  pub fn with_help(msg: impl Into<String>, help: impl Into<String>) -> Self {
    ModError::Message {
      message: msg.into(),
      context: None,
      help: Some(help.into()),
    }
  }

  /// Add context to an existing error
  pub fn context(self, ctx: impl Into<String>) -> Self {
    let ctx_str = ctx.into();
    match self {
      ModError::Message { message, context, help } => ModError::Message {
        message,
        context: Some(context.map(|c| format!("{}\n{}", ctx_str, c)).unwrap_or(ctx_str)),
        help,
      },
      ModError::Io(err) => ModError::Message {
        message: format!("I/O error: {}", err),
        context: Some(ctx_str),
        help: None,
      },
      _ => self,
    }
  }

  /// Get the appropriate exit code for this error
  pub fn exit_code(&self) -> ExitCode {
    match self {
      ModError::Manifest(ManifestError::Missing { .. }) => ExitCode::User,
      ModError::Manifest(_) => ExitCode::Validation,
      ModError::Module(ModuleError::NotInstalled { .. }) => ExitCode::User,
      ModError::Module(_) => ExitCode::System,
      ModError::Config(_) => ExitCode::User,
      ModError::Git(_) => ExitCode::System,
      ModError::Io(_) => ExitCode::System,
      ModError::Message { .. } => ExitCode::User,
    }
  }

  /// Get contextual help message for this error
  pub fn help_message(&self) -> Option<String> {
    match self {
      ModError::Manifest(e) => e.help_message(),
      ModError::Module(e) => e.help_message(),
      ModError::Config(e) => e.help_message(),
      ModError::Git(e) => e.help_message(),
      ModError::Message { help, .. } => help.clone(),
      _ => None,
    }
  }

  /// Whether this error means the requested version does not exist in the registry
  pub fn is_unresolvable(&self) -> bool {
    matches!(
      self,
      ModError::Module(ModuleError::VersionResolutionFailed { .. }) | ModError::Module(ModuleError::FetchFailed { .. })
    )
  }
}

impl fmt::Display for ModError {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      ModError::Manifest(e) => write!(f, "{}", e),
      ModError::Module(e) => write!(f, "{}", e),
      ModError::Config(e) => write!(f, "{}", e),
      ModError::Git(e) => write!(f, "{}", e),
      ModError::Io(e) => write!(f, "I/O error: {}", e),
      ModError::Message { message, context, .. } => {
        write!(f, "{}", message)?;
        if let Some(ctx) = context {
          write!(f, "\n{}", ctx)?;
        }
        Ok(())
      }
    }
  }
}

impl std::error::Error for ModError {
  fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
    match self {
      ModError::Io(e) => Some(e),
      _ => None,
    }
  }
}

impl From<io::Error> for ModError {
  fn from(err: io::Error) -> Self {
    ModError::Io(err)
  }
}

impl From<String> for ModError {
  fn from(msg: String) -> Self {
    ModError::message(msg)
  }
}

impl From<&str> for ModError {
  fn from(msg: &str) -> Self {
    ModError::message(msg)
  }
}

impl From<toml_edit::de::Error> for ModError {
  fn from(err: toml_edit::de::Error) -> Self {
    ModError::message(format!("TOML deserialization error: {}", err))
  }
}

impl From<serde_json::Error> for ModError {
  fn from(err: serde_json::Error) -> Self {
    ModError::message(format!("JSON error: {}", err))
  }
}

impl From<std::string::FromUtf8Error> for ModError {
  fn from(err: std::string::FromUtf8Error) -> Self {
    ModError::message(format!("UTF-8 conversion error: {}", err))
  }
}

impl From<std::path::StripPrefixError> for ModError {
  fn from(err: std::path::StripPrefixError) -> Self {
    ModError::message(format!("Path strip prefix error: {}", err))
  }
}

/// Manifest (modules.json) errors
#[derive(Debug)]
pub enum ManifestError {
  /// No manifest file at the expected path
  Missing { path: PathBuf },

  /// Manifest exists but cannot be parsed
  Corrupt { path: PathBuf, reason: String },

  /// Manifest parses but a registry record is structurally invalid
  Outdated { registry: String },
}

impl ManifestError {
  fn help_message(&self) -> Option<String> {
    match self {
      ManifestError::Missing { .. } => Some("Run `modsync create` to build one from the installed modules.".to_string()),
      ManifestError::Corrupt { path, .. } => Some(format!(
        "Delete {} and run `modsync create` to regenerate it.",
        path.display()
      )),
      ManifestError::Outdated { .. } => {
        Some("Remove the manifest and run `modsync create` to regenerate it.".to_string())
      }
    }
  }
}

impl fmt::Display for ManifestError {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      ManifestError::Missing { path } => write!(f, "No module manifest found at {}", path.display()),
      ManifestError::Corrupt { path, reason } => {
        write!(f, "Module manifest {} could not be parsed: {}", path.display(), reason)
      }
      ManifestError::Outdated { registry } => {
        write!(f, "Manifest entry for registry '{}' is missing required fields", registry)
      }
    }
  }
}

/// Per-module errors raised while resolving, fetching, or installing
#[derive(Debug)]
pub enum ModuleError {
  /// Module has no manifest entry / installed tree
  NotInstalled { module: String, registry: String },

  /// Version could not be resolved against the registry
  VersionResolutionFailed { module: String, reason: String },

  /// Module tree could not be fetched at the requested version
  FetchFailed {
    module: String,
    version: String,
    reason: String,
  },

  /// Writing or replacing the installed tree failed
  InstallFailed {
    module: String,
    path: PathBuf,
    reason: String,
  },
}

impl ModuleError {
  fn help_message(&self) -> Option<String> {
    match self {
      ModuleError::NotInstalled { .. } => Some("List installed modules with `modsync status`.".to_string()),
      ModuleError::VersionResolutionFailed { .. } => {
        Some("Check the pin in modsync.toml `[update]` or the --sha value against the registry history.".to_string())
      }
      ModuleError::FetchFailed { .. } => Some("Run `modsync doctor --thorough` to test registry access.".to_string()),
      ModuleError::InstallFailed { .. } => None,
    }
  }
}

impl fmt::Display for ModuleError {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      ModuleError::NotInstalled { module, registry } => {
        write!(f, "Module '{}' is not installed from '{}'", module, registry)
      }
      ModuleError::VersionResolutionFailed { module, reason } => {
        write!(f, "Could not resolve a version for '{}': {}", module, reason)
      }
      ModuleError::FetchFailed {
        module,
        version,
        reason,
      } => write!(f, "Failed to fetch '{}' at {}: {}", module, version, reason),
      ModuleError::InstallFailed { module, path, reason } => {
        write!(f, "Failed to install '{}' into {}: {}", module, path.display(), reason)
      }
    }
  }
}

/// Configuration-related errors
#[derive(Debug)]
pub enum ConfigError {
  /// Missing required field
  MissingField { field: String },

  /// Field present but not acceptable
  Invalid { field: String, reason: String },
}

impl ConfigError {
  fn help_message(&self) -> Option<String> {
    match self {
      ConfigError::MissingField { .. } => Some("See the `[registry]` section of modsync.toml.".to_string()),
      ConfigError::Invalid { field, .. } if field.starts_with("update") => Some(
        "Update entries must be `true`, `false`, a version string, or a table of module entries.".to_string(),
      ),
      ConfigError::Invalid { .. } => None,
    }
  }
}

impl fmt::Display for ConfigError {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      ConfigError::MissingField { field } => {
        write!(f, "Missing required field in config: {}", field)
      }
      ConfigError::Invalid { field, reason } => {
        write!(f, "Invalid value for '{}': {}", field, reason)
      }
    }
  }
}

/// Git operation errors
#[derive(Debug)]
pub enum GitError {
  /// Git command failed
  CommandFailed { command: String, stderr: String },

  /// Repository not found
  RepoNotFound { path: PathBuf },

  /// Clone of a remote registry failed
  CloneFailed { url: String, reason: String },
}

impl GitError {
  fn help_message(&self) -> Option<String> {
    match self {
      GitError::RepoNotFound { path } => Some(format!(
        "Check the registry remote in modsync.toml or the manifest: {}",
        path.display()
      )),
      GitError::CloneFailed { reason, .. } if reason.contains("Permission denied") => {
        Some("Check your credentials for the registry remote.".to_string())
      }
      _ => None,
    }
  }
}

impl fmt::Display for GitError {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      GitError::CommandFailed { command, stderr } => {
        write!(f, "Git command failed: {}\n{}", command, stderr)
      }
      GitError::RepoNotFound { path } => {
        write!(f, "Git repository not found at: {}", path.display())
      }
      GitError::CloneFailed { url, reason } => {
        write!(f, "Failed to clone registry {}: {}", url, reason)
      }
    }
  }
}

/// Result type alias for modsync
pub type ModResult<T> = Result<T, ModError>;

/// Helper trait to add context to Results
pub trait ResultExt<T> {
  /// Add context to an error result
  fn context(self, ctx: impl Into<String>) -> ModResult<T>;

  /// Add context using a closure (lazy evaluation)
  fn with_context<F>(self, f: F) -> ModResult<T>
  where
    F: FnOnce() -> String;
}

impl<T, E> ResultExt<T> for Result<T, E>
where
  E: Into<ModError>,
{
  fn context(self, ctx: impl Into<String>) -> ModResult<T> {
    self.map_err(|e| e.into().context(ctx))
  }

  fn with_context<F>(self, f: F) -> ModResult<T>
  where
    F: FnOnce() -> String,
  {
    self.map_err(|e| e.into().context(f()))
  }
}

/// Pretty-print an error to stderr with help text
pub fn print_error(error: &ModError) {
  eprintln!("\n❌ {}\n", error);

  if let Some(help) = error.help_message() {
    eprintln!("💡 Help: {}\n", help);
  }
}
