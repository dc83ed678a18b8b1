//! Resource collection into the staging root
//!
//! Two mutually exclusive modes:
//!
//! - designated directory: `cp -r * <staging>` from the resource directory;
//!   any output from `cp` is a failure even when it exits 0
//! - project scan: every non-hidden file under the project root whose name
//!   ends in a recognized suffix, flattened into the staging root by basename

use std::path::{Path, PathBuf};

use walkdir::WalkDir;

use crate::error::FarError;
use crate::exec::subprocess::run_shell;
use crate::utils::paths::{is_hidden, make_executable};

/// File suffixes collected in project-scan mode
pub const RESOURCE_SUFFIXES: &[&str] = &["properties", "xml", "json", "yaml", "yml", "sh"];

/// How resources are gathered
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResourceSource {
    /// Copy the whole tree of this directory
    Designated(PathBuf),
    /// Scan this project root for recognized files
    ProjectScan(PathBuf),
}

/// Populate `staging` from `source`, returning the number of files copied
/// (directory mode reports 0, `cp` does not enumerate)
pub fn collect(source: &ResourceSource, staging: &Path) -> Result<usize, FarError> {
    match source {
        ResourceSource::Designated(dir) => {
            copy_designated_dir(dir, staging)?;
            Ok(0)
        }
        ResourceSource::ProjectScan(root) => {
            let copied = copy_from_project(root, staging)?;
            Ok(copied.len())
        }
    }
}

/// Copies the resource directory contents; `$1` is the staging root
const COPY_SCRIPT: &str = "cp -r * \"$1\"";

fn copy_designated_dir(dir: &Path, staging: &Path) -> Result<(), FarError> {
    copy_designated_dir_with(COPY_SCRIPT, dir, staging)
}

fn copy_designated_dir_with(script: &str, dir: &Path, staging: &Path) -> Result<(), FarError> {
    let result = run_shell(dir, script, [staging]).map_err(|e| {
        FarError::resource_copy(dir, "failed to execute copy command", Some(e))
    })?;

    if !result.success {
        return Err(FarError::resource_copy(
            dir,
            format!(
                "copy exited with status {}: {}",
                result.exit_code,
                result.combined_output().trim()
            ),
            None,
        ));
    }
    if result.has_output() {
        return Err(FarError::resource_copy(
            dir,
            format!("copy reported: {}", result.combined_output().trim()),
            None,
        ));
    }
    Ok(())
}

fn copy_from_project(root: &Path, staging: &Path) -> Result<Vec<PathBuf>, FarError> {
    let files = find_resource_files(root)?;
    let mut copied = Vec::with_capacity(files.len());

    for file in &files {
        let Some(name) = file.file_name() else {
            continue;
        };
        let target = staging.join(name);
        // Same basename from another directory overwrites the earlier copy
        std::fs::copy(file, &target).map_err(|e| {
            FarError::resource_copy(
                file,
                format!("copy to {} failed", target.display()),
                Some(e.into()),
            )
        })?;
        if target.to_string_lossy().ends_with(".sh") {
            make_executable(&target).map_err(|e| {
                FarError::resource_copy(&target, "failed to mark script executable", Some(e))
            })?;
        }
        tracing::debug!("copy : {}", file.display());
        copied.push(target);
    }

    Ok(copied)
}

/// Recognized resource files under `root`, hidden entries skipped, in
/// file-name order per directory
pub fn find_resource_files(root: &Path) -> Result<Vec<PathBuf>, FarError> {
    let walker = WalkDir::new(root)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|e| e.depth() == 0 || !is_hidden(e.file_name()));

    let mut files = Vec::new();
    for entry in walker {
        let entry = entry.map_err(|e| {
            let path = e.path().map(Path::to_path_buf).unwrap_or_else(|| root.to_path_buf());
            FarError::resource_copy(path, "failed to scan project", Some(e.into()))
        })?;
        // `path().is_file()` follows symlinks to regular files
        if entry.path().is_file() && is_resource_name(&entry.file_name().to_string_lossy()) {
            files.push(entry.into_path());
        }
    }
    Ok(files)
}

/// Whether a file name carries one of [`RESOURCE_SUFFIXES`]
pub fn is_resource_name(name: &str) -> bool {
    RESOURCE_SUFFIXES.iter().any(|suffix| {
        name.len() > suffix.len() + 1 && name.ends_with(suffix) && {
            let dot = name.len() - suffix.len() - 1;
            name.as_bytes()[dot] == b'.'
        }
    })
}
