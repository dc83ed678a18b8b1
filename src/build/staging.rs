//! Ephemeral staging tree assembled before archival
//!
//! Removal is tied to `Drop`, so the directory disappears on every exit path
//! of the session that owns it.

use std::path::{Path, PathBuf};

use tempfile::TempDir;

use crate::config::PlatformTarget;
use crate::error::FarError;

/// Subtree holding per-platform binaries
pub const PLATFORM_DIR_NAME: &str = "platform";

/// Temporary assembly area for one packaging session
#[derive(Debug)]
pub struct StagingTree {
    dir: TempDir,
}

impl StagingTree {
    /// Create a fresh directory in the system temp location
    pub fn allocate(process_name: &str) -> Result<Self, FarError> {
        let dir = tempfile::Builder::new()
            .prefix(&format!("{process_name}-"))
            .tempdir()
            .map_err(|e| FarError::StagingAllocation {
                process: process_name.to_string(),
                message: e.to_string(),
                source: Some(e.into()),
            })?;
        tracing::debug!(dir = %dir.path().display(), "staging directory allocated");
        Ok(Self { dir })
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// `<staging>/platform/<os>_<arch>`
    pub fn platform_dir(&self, platform: &PlatformTarget) -> PathBuf {
        self.path().join(PLATFORM_DIR_NAME).join(platform.dir_name())
    }

    /// Whether a file of this name sits at the staging root
    pub fn contains_file(&self, name: &str) -> bool {
        self.path().join(name).is_file()
    }

    /// Remove the directory now, reporting failure instead of ignoring it
    pub fn close(self) -> std::io::Result<()> {
        let path = self.path().to_path_buf();
        self.dir.close()?;
        tracing::debug!(dir = %path.display(), "staging directory removed");
        Ok(())
    }
}
