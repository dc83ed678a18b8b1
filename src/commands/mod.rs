//! Command implementations
//!
//! Each command module provides a clap-derived struct and execute method.

pub mod package;
pub mod platforms;

use std::path::{Path, PathBuf};

use anyhow::Result;

use crate::config::PlatformConfig;

/// `--config` value, or `~/.fatima/gofar.toml`
pub(crate) fn platform_config_path(explicit: Option<&Path>) -> Result<PathBuf> {
    match explicit {
        Some(path) => Ok(path.to_path_buf()),
        None => Ok(PlatformConfig::default_path()?),
    }
}
