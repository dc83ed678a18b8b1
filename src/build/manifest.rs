//! deployment.json: build provenance stamped into every artifact
//!
//! ```json
//! {
//!   "process": "billing",
//!   "process_type": "GENERAL",
//!   "build": {
//!     "time": "2026-10-14 09:30:00 KST",
//!     "user": "jin",
//!     "git": { "repo": "...", "branch": "main", "commit": "...", "message": "..." }
//!   }
//! }
//! ```

use std::fmt;
use std::path::{Path, PathBuf};

use chrono::Local;
use serde::Serialize;

use crate::error::FarError;
use crate::exec::subprocess::run_shell;
use crate::utils::git::{GitSnapshot, SourceControl};
use crate::utils::terminal::print_warning;

/// Manifest file name at the staging root
pub const MANIFEST_FILE: &str = "deployment.json";
/// Identity used when the lookup fails
pub const UNKNOWN_USER: &str = "unknown";
/// `2006-01-02 15:04:05`, followed by the zone abbreviation
pub const BUILD_TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Process classification recorded in the manifest
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ProcessType {
    #[default]
    General,
    UserInteractive,
}

impl ProcessType {
    /// Marker file that reclassifies a process as user-interactive
    pub fn ui_descriptor_name(process_name: &str) -> String {
        format!("{process_name}.ui.xml")
    }
}

impl fmt::Display for ProcessType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProcessType::General => write!(f, "GENERAL"),
            ProcessType::UserInteractive => write!(f, "USER_INTERACTIVE"),
        }
    }
}

/// Provenance record
#[derive(Debug, Clone, Serialize)]
pub struct Manifest {
    pub process: String,
    pub process_type: ProcessType,
    pub build: BuildStamp,
}

/// Nested build block
#[derive(Debug, Clone, Serialize)]
pub struct BuildStamp {
    pub time: String,
    pub user: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub git: Option<GitSnapshot>,
}

impl Manifest {
    /// Stamp a manifest for `process_name` now
    ///
    /// `source_control` is consulted only when the project root was found
    /// through the repository marker. Any read failure drops the git block.
    pub fn stamp(
        process_name: &str,
        process_type: ProcessType,
        project_root: &Path,
        source_control: Option<&dyn SourceControl>,
    ) -> Self {
        let git = source_control.and_then(|sc| match sc.snapshot(project_root) {
            Ok(snapshot) => Some(snapshot),
            Err(e) => {
                tracing::warn!(root = %project_root.display(), "git info unavailable: {e:#}");
                print_warning(&format!("fail to read git info : {e}"));
                None
            }
        });

        Self {
            process: process_name.to_string(),
            process_type,
            build: BuildStamp {
                time: build_time(),
                user: resolve_operator(),
                git,
            },
        }
    }

    /// Write as `deployment.json` under `dir`
    pub fn write(&self, dir: &Path) -> Result<PathBuf, FarError> {
        let path = dir.join(MANIFEST_FILE);
        let json = serde_json::to_string_pretty(self).map_err(|e| {
            FarError::manifest_write(&path, "failed to serialize deployment", Some(e.into()))
        })?;
        std::fs::write(&path, json).map_err(|e| {
            FarError::manifest_write(&path, "failed to write deployment.json", Some(e.into()))
        })?;
        Ok(path)
    }
}

/// Local time with zone abbreviation, e.g. `2026-10-14 09:30:00 KST`
///
/// Falls back to the numeric offset (`+09:00`) when the abbreviation cannot
/// be resolved.
pub fn build_time() -> String {
    let now = Local::now();
    let zone = zone_abbreviation().unwrap_or_else(|| now.format("%:z").to_string());
    format!("{} {}", now.format(BUILD_TIME_FORMAT), zone)
}

/// Local zone abbreviation as reported by `date +%Z`
pub fn zone_abbreviation() -> Option<String> {
    let result = match run_shell(&std::env::temp_dir(), "date +%Z", std::iter::empty::<&str>()) {
        Ok(result) => result,
        Err(e) => {
            tracing::debug!("date failed: {e:#}");
            return None;
        }
    };
    let zone = result.stdout.trim();
    if !result.success || zone.is_empty() || zone.contains(char::is_whitespace) {
        tracing::debug!("zone abbreviation unavailable: {}", result.combined_output().trim());
        return None;
    }
    Some(zone.to_string())
}

/// Invoking operator via `whoami`, or [`UNKNOWN_USER`]
pub fn resolve_operator() -> String {
    let cwd = std::env::temp_dir();
    match run_shell(&cwd, "whoami", std::iter::empty::<&str>()) {
        Ok(result) if result.success && !result.stdout.trim().is_empty() => {
            result.stdout.trim().to_string()
        }
        Ok(result) => {
            tracing::warn!("whoami failed: {}", result.combined_output().trim());
            UNKNOWN_USER.to_string()
        }
        Err(e) => {
            tracing::warn!("whoami error : {e:#}");
            UNKNOWN_USER.to_string()
        }
    }
}
