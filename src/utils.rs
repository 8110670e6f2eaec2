//! Utility functions for cross-platform path handling and remote URLs

use std::path::Path;

/// Check if a path is a local filesystem path (not a remote URL)
///
/// Returns true for:
/// - Absolute paths on Unix: /path/to/repo
/// - Absolute paths on Windows: C:\path\to\repo or C:/path/to/repo
/// - Relative paths: ./path or ../path
/// - UNC paths on Windows: \\server\share
///
/// Returns false for:
/// - SSH URLs: git@github.com:user/repo.git
/// - HTTPS URLs: <https://github.com/user/repo.git>
pub fn is_local_path(path: &str) -> bool {
  let p = Path::new(path);

  if path.starts_with("./") || path.starts_with("../") {
    return true;
  }

  // Windows drive letter (C:\ or C:/), checked before the URL heuristics since it contains ':'
  if path.len() >= 3 {
    let bytes = path.as_bytes();
    if bytes[0].is_ascii_alphabetic() && bytes[1] == b':' && (bytes[2] == b'\\' || bytes[2] == b'/') {
      return true;
    }
  }

  if path.starts_with("\\\\") {
    return true;
  }

  // Path::is_absolute() is false for Unix-style paths on Windows
  if path.starts_with('/') && !path.contains("://") && !path.contains('@') {
    return true;
  }

  if p.is_absolute() {
    return true;
  }

  if path.contains("://") || path.contains('@') {
    return false;
  }

  false
}

/// Extract the repository path from a remote URL
///
/// `https://github.com/nf-core/modules.git` and `git@github.com:nf-core/modules.git`
/// both become `nf-core/modules`. Local paths yield their last two components.
pub fn path_from_remote(remote_url: &str) -> String {
  let trimmed = remote_url.trim_end_matches('/');

  let path = if let Some((_, rest)) = trimmed.split_once("://") {
    // scheme://host[:port]/path
    rest.split_once('/').map(|(_, p)| p).unwrap_or("")
  } else if let Some((_, rest)) = trimmed.rsplit_once('@') {
    // user@host:path
    rest.split_once(':').map(|(_, p)| p).unwrap_or(rest)
  } else {
    let components: Vec<&str> = trimmed.split(['/', '\\']).filter(|c| !c.is_empty()).collect();
    let start = components.len().saturating_sub(2);
    return components[start..].join("/").trim_end_matches(".git").to_string();
  };

  path.trim_start_matches('/').trim_end_matches(".git").to_string()
}

/// Turn a registry identifier into a single directory name
pub fn sanitize_component(id: &str) -> String {
  id.chars()
    .map(|c| if c.is_ascii_alphanumeric() || c == '-' || c == '_' || c == '.' { c } else { '_' })
    .collect()
}

/// Convert a path to Git format (always forward slashes)
pub fn path_to_git_format(path: &Path) -> String {
  #[cfg(target_os = "windows")]
  {
    path.to_string_lossy().replace('\\', "/")
  }
  #[cfg(not(target_os = "windows"))]
  {
    path.to_string_lossy().to_string()
  }
}

/// "s" suffix for counts other than one
pub fn plural_s(count: usize) -> &'static str {
  if count == 1 { "" } else { "s" }
}
