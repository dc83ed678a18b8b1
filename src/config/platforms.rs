//! Platform registry: the ordered list of {os, arch} build targets
//!
//! Stored as TOML under the user's home directory:
//!
//! ```toml
//! [[platform_list]]
//! os = "linux"
//! arch = "amd64"
//!
//! [[platform_list]]
//! os = "linux"
//! arch = "arm64"
//! ```
//!
//! A missing file is generated with the defaults on first load.

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{hints, FarError};

/// Directory under the home directory holding gofar configuration
pub const CONFIG_DIR: &str = ".fatima";
/// Platform list file name
pub const PLATFORM_CONFIG_FILE: &str = "gofar.toml";

const CONFIG_HEADER: &str = "# gofar build platforms\n\
# to check the platform support list of your toolchain, run\n\
# $ go tool dist list\n\n";

/// One (operating system, architecture) pair to compile for
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PlatformTarget {
    pub os: String,
    pub arch: String,
}

impl PlatformTarget {
    pub fn new(os: impl Into<String>, arch: impl Into<String>) -> Self {
        Self {
            os: os.into(),
            arch: arch.into(),
        }
    }

    /// The platform the packager itself runs on, in toolchain vocabulary
    pub fn host() -> Self {
        Self::new(host_os(), host_arch())
    }

    /// Platform directory name, `os_arch`
    pub fn dir_name(&self) -> String {
        format!("{}_{}", self.os, self.arch)
    }

    pub fn is_host(&self) -> bool {
        *self == Self::host()
    }
}

impl fmt::Display for PlatformTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.os, self.arch)
    }
}

impl FromStr for PlatformTarget {
    type Err = String;

    /// Parse `os/arch` (also accepts `os_arch`)
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let (os, arch) = s
            .split_once('/')
            .or_else(|| s.split_once('_'))
            .ok_or_else(|| format!("invalid platform '{s}', expected <os>/<arch>"))?;
        let (os, arch) = (os.trim(), arch.trim());
        if os.is_empty() || arch.is_empty() || arch.contains('/') {
            return Err(format!("invalid platform '{s}', expected <os>/<arch>"));
        }
        Ok(Self::new(os, arch))
    }
}

/// Ordered, non-empty list of build platforms
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlatformConfig {
    #[serde(rename = "platform_list", default)]
    pub platforms: Vec<PlatformTarget>,
}

impl PlatformConfig {
    /// Build a config from an explicit list, rejecting an empty one
    pub fn from_platforms(platforms: Vec<PlatformTarget>) -> Result<Self, FarError> {
        let config = Self { platforms };
        config.validate()?;
        Ok(config)
    }

    /// linux/amd64 and linux/arm64, plus the host when it is not linux
    pub fn default_for_host() -> Self {
        let mut platforms = vec![
            PlatformTarget::new("linux", "amd64"),
            PlatformTarget::new("linux", "arm64"),
        ];
        let host = PlatformTarget::host();
        if host.os != "linux" && !platforms.contains(&host) {
            platforms.push(host);
        }
        Self { platforms }
    }

    /// `~/.fatima/gofar.toml`
    pub fn default_path() -> Result<PathBuf, FarError> {
        let base_dirs = directories::BaseDirs::new().ok_or_else(|| {
            FarError::config_error("Not found user home directory")
        })?;
        Ok(base_dirs
            .home_dir()
            .join(CONFIG_DIR)
            .join(PLATFORM_CONFIG_FILE))
    }

    /// Load the platform list at `path`, writing the defaults first if absent
    pub fn load_or_init(path: &Path) -> Result<Self, FarError> {
        if !path.exists() {
            tracing::debug!(path = %path.display(), "platform config missing, writing defaults");
            Self::default_for_host().write(path)?;
        }
        Self::load(path)
    }

    /// Load and validate the platform list at `path`
    pub fn load(path: &Path) -> Result<Self, FarError> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            FarError::config_error_with_hint(
                format!("Failed to read platform config {}", path.display()),
                Some(e.into()),
                hints::platform_config(),
            )
        })?;
        let config: Self = toml::from_str(&content).map_err(|e| {
            FarError::config_error_with_hint(
                format!("Invalid platform config {}", path.display()),
                Some(e.into()),
                hints::platform_config(),
            )
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Write this list to `path` with the explanatory header
    pub fn write(&self, path: &Path) -> Result<(), FarError> {
        let body = toml::to_string_pretty(self).map_err(|e| {
            FarError::config_error_with_hint(
                "Failed to serialize platform config",
                Some(e.into()),
                hints::platform_config(),
            )
        })?;
        if let Some(parent) = path.parent() {
            crate::utils::paths::ensure_dir(parent).map_err(|e| {
                FarError::config_error_with_hint(
                    format!("Failed to create {}", parent.display()),
                    Some(e),
                    hints::platform_config(),
                )
            })?;
        }
        std::fs::write(path, format!("{CONFIG_HEADER}{body}")).map_err(|e| {
            FarError::config_error_with_hint(
                format!("Failed to create default config file {}", path.display()),
                Some(e.into()),
                hints::platform_config(),
            )
        })
    }

    fn validate(&self) -> Result<(), FarError> {
        if self.platforms.is_empty() {
            return Err(FarError::config_error_with_hint(
                "Platform list is empty",
                None,
                hints::platform_config(),
            ));
        }
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.platforms.len()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, PlatformTarget> {
        self.platforms.iter()
    }

    /// The configured entry matching the host, or the host itself
    pub fn local_platform(&self) -> PlatformTarget {
        let host = PlatformTarget::host();
        self.platforms
            .iter()
            .find(|p| **p == host)
            .cloned()
            .unwrap_or(host)
    }

    /// Every configured platform other than the host
    pub fn additional_platforms(&self) -> Vec<PlatformTarget> {
        self.platforms.iter().filter(|p| !p.is_host()).cloned().collect()
    }
}

/// Host OS in toolchain vocabulary
pub fn host_os() -> &'static str {
    match std::env::consts::OS {
        "macos" => "darwin",
        other => other,
    }
}

/// Host architecture in toolchain vocabulary
pub fn host_arch() -> &'static str {
    match std::env::consts::ARCH {
        "x86_64" => "amd64",
        "aarch64" => "arm64",
        "x86" => "386",
        "powerpc64" => "ppc64",
        other => other,
    }
}
