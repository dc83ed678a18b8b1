//! Environment-derived locations: source roots and the build-output root

use std::ffi::OsString;
use std::path::{Path, PathBuf};

use crate::utils::paths::dedup_paths;

/// Path-list variable naming the toolchain workspaces
pub const GOPATH_ENV: &str = "GOPATH";
/// Override for the shared build-output root
pub const BUILD_ROOT_ENV: &str = "GOFAR_BUILD_ROOT";
/// Directory under the first workspace that collects artifacts
pub const FAR_DIR_NAME: &str = "far";
/// Source directory inside each workspace
pub const SRC_DIR_NAME: &str = "src";

/// Workspace roots resolved from the environment
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceRoots {
    roots: Vec<PathBuf>,
}

impl SourceRoots {
    pub fn new(roots: Vec<PathBuf>) -> Self {
        Self {
            roots: dedup_paths(roots),
        }
    }

    /// Read `GOPATH`, falling back to the toolchain default `~/go`
    pub fn from_env() -> Self {
        Self::from_value(std::env::var_os(GOPATH_ENV))
    }

    fn from_value(value: Option<OsString>) -> Self {
        let roots = Self::new(
            value
                .map(|v| std::env::split_paths(&v).collect())
                .unwrap_or_default(),
        );
        if !roots.roots.is_empty() {
            return roots;
        }

        let fallback = directories::BaseDirs::new()
            .map(|dirs| vec![dirs.home_dir().join("go")])
            .unwrap_or_default();
        Self { roots: fallback }
    }

    #[cfg(test)]
    pub fn roots(&self) -> &[PathBuf] {
        &self.roots
    }

    /// `<root>/src` for every workspace, in order
    pub fn src_dirs(&self) -> Vec<PathBuf> {
        self.roots.iter().map(|r| r.join(SRC_DIR_NAME)).collect()
    }

    /// Whether `dir` is one of the workspace `src` directories
    pub fn is_src_dir(&self, dir: &Path) -> bool {
        self.roots.iter().any(|r| r.join(SRC_DIR_NAME) == dir)
    }

    /// `<first root>/far`
    pub fn default_build_root(&self) -> Option<PathBuf> {
        self.roots.first().map(|r| r.join(FAR_DIR_NAME))
    }
}

/// Resolve the build-output root: explicit value, then `GOFAR_BUILD_ROOT`,
/// then `<first GOPATH entry>/far`
pub fn resolve_build_root(explicit: Option<PathBuf>, roots: &SourceRoots) -> Option<PathBuf> {
    explicit
        .or_else(|| std::env::var_os(BUILD_ROOT_ENV).map(PathBuf::from))
        .filter(|p| !p.as_os_str().is_empty())
        .or_else(|| roots.default_build_root())
}

/// `<buildRoot>/<process>/<process>.far`
pub fn artifact_path(build_root: &Path, process_name: &str) -> PathBuf {
    build_root
        .join(process_name)
        .join(format!("{process_name}.far"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[test]
    fn test_split_path_list() {
        let value = std::env::join_paths([
            PathBuf::from("/work/go"),
            PathBuf::from("/opt/go"),
            PathBuf::from("/work/go"),
        ])
        .unwrap();
        let roots = SourceRoots::from_value(Some(value));
        assert_eq!(
            roots.roots(),
            &[PathBuf::from("/work/go"), PathBuf::from("/opt/go")]
        );
        assert!(roots.is_src_dir(Path::new("/opt/go/src")));
        assert!(!roots.is_src_dir(Path::new("/opt/go")));
        assert_eq!(
            roots.default_build_root(),
            Some(PathBuf::from("/work/go/far"))
        );
    }

    #[test]
    fn test_unset_falls_back_to_home() {
        let roots = SourceRoots::from_value(None);
        if let Some(dirs) = directories::BaseDirs::new() {
            assert_eq!(roots.roots(), &[dirs.home_dir().join("go")]);
        }
    }

    #[test]
    fn test_artifact_path() {
        assert_eq!(
            artifact_path(Path::new("/go/far"), "billing"),
            PathBuf::from("/go/far/billing/billing.far")
        );
    }

    #[test]
    #[serial]
    fn test_build_root_precedence() {
        let roots = SourceRoots::new(vec![PathBuf::from("/work/go")]);
        std::env::remove_var(BUILD_ROOT_ENV);
        assert_eq!(
            resolve_build_root(None, &roots),
            Some(PathBuf::from("/work/go/far"))
        );

        std::env::set_var(BUILD_ROOT_ENV, "/env/far");
        assert_eq!(
            resolve_build_root(None, &roots),
            Some(PathBuf::from("/env/far"))
        );
        assert_eq!(
            resolve_build_root(Some(PathBuf::from("/cli/far")), &roots),
            Some(PathBuf::from("/cli/far"))
        );
        std::env::remove_var(BUILD_ROOT_ENV);
    }
}
