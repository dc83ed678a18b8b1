//! .far artifact creation
//!
//! The artifact is a deflate-compressed ZIP of the whole staging tree:
//!
//! ```text
//! billing.far
//! ├── deployment.json
//! ├── app.properties
//! └── platform/
//!     ├── linux_amd64/api     (0755)
//!     └── linux_arm64/api     (0755)
//! ```
//!
//! Every entry is stamped with the archival time. Entries under `platform/`
//! always get 0755, whatever their on-disk mode.

use std::collections::BTreeMap;
use std::fs::File;
use std::io;
use std::path::Path;

use anyhow::Context;
use chrono::{Datelike, Local, Timelike};
use tempfile::NamedTempFile;
use walkdir::WalkDir;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, DateTime, ZipWriter};

use super::staging::PLATFORM_DIR_NAME;
use crate::error::FarError;
use crate::utils::paths::{ensure_dir, relative_slash_path};

const EXECUTABLE_MODE: u32 = 0o755;
#[cfg(unix)]
const ARTIFACT_MODE: u32 = 0o644;

/// What went into an artifact
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ArchiveSummary {
    pub files: usize,
    pub directories: usize,
    pub size: u64,
}

/// Serialize `source_dir` into `archive_path`, replacing any existing file
///
/// The archive is written to a sibling temporary file and renamed over
/// `archive_path` only once complete; on failure the previous artifact, if
/// any, is left untouched.
pub fn create_archive(
    source_dir: &Path,
    archive_path: &Path,
) -> Result<ArchiveSummary, FarError> {
    let parent = match archive_path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    ensure_dir(parent)
        .map_err(|e| FarError::archive(archive_path, "fail to prepare far dir", Some(e)))?;

    write_archive(source_dir, parent, archive_path)
        .map_err(|e| FarError::archive(archive_path, format!("{e:#}"), Some(e)))
}

fn write_archive(
    source_dir: &Path,
    parent: &Path,
    archive_path: &Path,
) -> anyhow::Result<ArchiveSummary> {
    let partial = NamedTempFile::new_in(parent)
        .with_context(|| format!("Failed to create temporary archive in {}", parent.display()))?;

    let mut zip = ZipWriter::new(partial);
    let base = SimpleFileOptions::default()
        .compression_method(CompressionMethod::Deflated)
        .last_modified_time(archival_time());
    let mut summary = ArchiveSummary::default();

    for entry in WalkDir::new(source_dir).sort_by_file_name() {
        let entry = entry.context("Failed to read directory entry")?;
        let path = entry.path();
        let Some(relative) = relative_slash_path(source_dir, path) else {
            continue;
        };

        let options = match entry_mode(&relative, &entry)? {
            Some(mode) => base.unix_permissions(mode),
            None => base,
        };

        if entry.file_type().is_dir() {
            zip.add_directory(format!("{relative}/"), options)
                .with_context(|| format!("Failed to add directory to archive: {}", relative))?;
            summary.directories += 1;
        } else {
            zip.start_file(relative.as_str(), options)
                .with_context(|| format!("Failed to start file in archive: {}", relative))?;
            let mut input = File::open(path)
                .with_context(|| format!("Failed to open file: {}", path.display()))?;
            summary.size += io::copy(&mut input, &mut zip)
                .with_context(|| format!("Failed to write file to archive: {}", relative))?;
            summary.files += 1;
        }
    }

    let partial = zip.finish().context("Failed to finish ZIP archive")?;
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        partial
            .as_file()
            .set_permissions(std::fs::Permissions::from_mode(ARTIFACT_MODE))
            .context("Failed to set archive permissions")?;
    }
    partial
        .persist(archive_path)
        .with_context(|| format!("Failed to move archive into {}", archive_path.display()))?;
    Ok(summary)
}

/// Whether a relative entry path lies in the platform-output subtree
pub fn is_platform_entry(relative: &str) -> bool {
    relative == PLATFORM_DIR_NAME
        || relative
            .strip_prefix(PLATFORM_DIR_NAME)
            .is_some_and(|rest| rest.starts_with('/'))
}

/// Permission bits for an entry; `None` leaves the zip default
fn entry_mode(relative: &str, entry: &walkdir::DirEntry) -> anyhow::Result<Option<u32>> {
    if is_platform_entry(relative) {
        return Ok(Some(EXECUTABLE_MODE));
    }
    disk_mode(entry)
}

#[cfg(unix)]
fn disk_mode(entry: &walkdir::DirEntry) -> anyhow::Result<Option<u32>> {
    use std::os::unix::fs::PermissionsExt;
    let metadata = entry
        .metadata()
        .with_context(|| format!("Failed to stat {}", entry.path().display()))?;
    Ok(Some(metadata.permissions().mode() & 0o777))
}

#[cfg(not(unix))]
fn disk_mode(_entry: &walkdir::DirEntry) -> anyhow::Result<Option<u32>> {
    Ok(None)
}

/// Current local time in ZIP's DOS representation
fn archival_time() -> DateTime {
    let now = Local::now();
    DateTime::from_date_and_time(
        now.year().clamp(1980, 2107) as u16,
        now.month() as u8,
        now.day() as u8,
        now.hour() as u8,
        now.minute() as u8,
        now.second() as u8,
    )
    .unwrap_or_default()
}

/// Print the tree structure of an artifact
///
/// ```text
///     billing.far:
///     ├── deployment.json (0.21 KB)
///     └── platform/
///         └── linux_amd64/
///             └── api (1.52 MB)
/// ```
pub fn print_zip_tree(archive_path: &Path, indent: &str) -> anyhow::Result<()> {
    use zip::ZipArchive;

    let file = File::open(archive_path)
        .with_context(|| format!("Failed to open archive: {}", archive_path.display()))?;
    let mut zip = ZipArchive::new(file)
        .with_context(|| format!("Failed to read ZIP archive: {}", archive_path.display()))?;

    let mut tree: BTreeMap<String, TreeNode> = BTreeMap::new();

    for i in 0..zip.len() {
        let file = zip.by_index(i)?;
        let is_dir = file.is_dir();
        let size = file.size();
        let parts: Vec<&str> = file.name().split('/').filter(|p| !p.is_empty()).collect();

        let mut current = &mut tree;
        for (idx, part) in parts.iter().enumerate() {
            let is_leaf = idx == parts.len() - 1 && !is_dir;
            if is_leaf {
                current.insert(part.to_string(), TreeNode::File { size });
                break;
            }
            let node = current
                .entry(part.to_string())
                .or_insert_with(|| TreeNode::Dir(BTreeMap::new()));
            current = match node {
                TreeNode::Dir(children) => children,
                TreeNode::File { .. } => break,
            };
        }
    }

    let name = archive_path
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_default();
    println!("{}{}:", indent, name);
    print_tree_level(&tree, indent, "");

    Ok(())
}

enum TreeNode {
    File { size: u64 },
    Dir(BTreeMap<String, TreeNode>),
}

fn print_tree_level(tree: &BTreeMap<String, TreeNode>, base_indent: &str, prefix: &str) {
    let len = tree.len();

    for (i, (name, node)) in tree.iter().enumerate() {
        let is_last = i == len - 1;
        let connector = if is_last { "└── " } else { "├── " };

        match node {
            TreeNode::File { size } => {
                println!(
                    "{}{}{}{} ({})",
                    base_indent,
                    prefix,
                    connector,
                    name,
                    format_size(*size)
                );
            }
            TreeNode::Dir(children) => {
                println!("{}{}{}{}/", base_indent, prefix, connector, name);
                let child_prefix = if is_last {
                    format!("{}    ", prefix)
                } else {
                    format!("{}│   ", prefix)
                };
                print_tree_level(children, base_indent, &child_prefix);
            }
        }
    }
}

fn format_size(size: u64) -> String {
    if size >= 1024 * 1024 {
        format!("{:.2} MB", size as f64 / (1024.0 * 1024.0))
    } else if size >= 1024 {
        format!("{:.2} KB", size as f64 / 1024.0)
    } else {
        format!("{} B", size)
    }
}
