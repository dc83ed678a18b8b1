//! Path utilities for gofar

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

/// Ensure a directory exists; an existing directory is not an error
pub fn ensure_dir(path: &Path) -> Result<()> {
    if !path.is_dir() {
        std::fs::create_dir_all(path)
            .with_context(|| format!("Failed to create directory: {}", path.display()))?;
    }
    Ok(())
}

/// Whether a file name starts with the hidden-file marker
pub fn is_hidden(name: &std::ffi::OsStr) -> bool {
    name.to_string_lossy().starts_with('.')
}

/// Final path segment as an owned string
pub fn base_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| path.to_string_lossy().to_string())
}

/// `path` relative to `base`, joined with forward slashes
///
/// Returns `None` for `base` itself or for paths outside it.
pub fn relative_slash_path(base: &Path, path: &Path) -> Option<String> {
    let relative = path.strip_prefix(base).ok()?;
    if relative.as_os_str().is_empty() {
        return None;
    }
    let parts: Vec<String> = relative
        .components()
        .map(|c| c.as_os_str().to_string_lossy().to_string())
        .collect();
    Some(parts.join("/"))
}

/// Mark a file executable (0755); no-op on non-unix hosts
pub fn make_executable(path: &Path) -> Result<()> {
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o755))
            .with_context(|| format!("Failed to chmod {}", path.display()))?;
    }
    #[cfg(not(unix))]
    let _ = path;
    Ok(())
}

/// Dedupe a list of directories while keeping first-seen order
pub fn dedup_paths(paths: impl IntoIterator<Item = PathBuf>) -> Vec<PathBuf> {
    let mut out: Vec<PathBuf> = Vec::new();
    for p in paths {
        if !p.as_os_str().is_empty() && !out.contains(&p) {
            out.push(p);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_ensure_dir_is_idempotent() {
        let temp = TempDir::new().unwrap();
        let dir = temp.path().join("a/b/c");
        ensure_dir(&dir).unwrap();
        ensure_dir(&dir).unwrap();
        assert!(dir.is_dir());
    }

    #[test]
    fn test_relative_slash_path() {
        let base = Path::new("/stage");
        assert_eq!(
            relative_slash_path(base, Path::new("/stage/platform/linux_amd64/api")),
            Some("platform/linux_amd64/api".to_string())
        );
        assert_eq!(relative_slash_path(base, base), None);
        assert_eq!(relative_slash_path(base, Path::new("/other/x")), None);
    }

    #[test]
    fn test_is_hidden() {
        assert!(is_hidden(std::ffi::OsStr::new(".git")));
        assert!(!is_hidden(std::ffi::OsStr::new("app.yaml")));
    }

    #[test]
    fn test_dedup_paths_keeps_order() {
        let paths = vec![
            PathBuf::from("/b"),
            PathBuf::from("/a"),
            PathBuf::from("/b"),
            PathBuf::new(),
        ];
        assert_eq!(
            dedup_paths(paths),
            vec![PathBuf::from("/b"), PathBuf::from("/a")]
        );
    }

    #[cfg(unix)]
    #[test]
    fn test_make_executable() {
        use std::os::unix::fs::PermissionsExt;
        let temp = TempDir::new().unwrap();
        let file = temp.path().join("run.sh");
        std::fs::write(&file, "#!/bin/sh\n").unwrap();
        make_executable(&file).unwrap();
        let mode = std::fs::metadata(&file).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o755);
    }
}
