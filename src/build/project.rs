//! Project discovery: locate the project root and its command units
//!
//! ```text
//! <root>/
//! ├── .git/config        # repository marker (enables provenance)
//! ├── resources/         # optional designated resource directory
//! └── commands/
//!     ├── api/           # one CommandUnit -> binary "api"
//!     └── worker/        # one CommandUnit -> binary "worker"
//! ```
//!
//! Without a `commands/` directory the root itself is the single unit.

use std::path::{Path, PathBuf};

use crate::config::SourceRoots;
use crate::error::{hints, FarError};
use crate::utils::paths::base_name;

/// Directory holding one subdirectory per binary
pub const COMMANDS_DIR_NAME: &str = "commands";
/// Auto-detected designated resource directory
pub const RESOURCES_DIR_NAME: &str = "resources";
/// Repository marker directory
pub const VCS_DIR_NAME: &str = ".git";
/// File that must exist inside the marker directory
pub const VCS_CONFIG_FILE: &str = "config";

/// One buildable binary
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandUnit {
    path: PathBuf,
    name: String,
}

impl CommandUnit {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let name = base_name(&path);
        Self { path, name }
    }

    /// Source directory
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Binary name: the final segment of the source directory
    pub fn binary_name(&self) -> &str {
        &self.name
    }
}

/// Result of project discovery
#[derive(Debug, Clone)]
pub struct Project {
    /// Project root directory
    pub root: PathBuf,
    /// Whether the root was found through the repository marker
    pub vcs_available: bool,
    /// `<root>/resources` when it exists
    pub resource_dir: Option<PathBuf>,
    /// Units in discovery order
    pub commands: Vec<CommandUnit>,
}

impl Project {
    /// Describe an already-known root (no upward search)
    pub fn at(root: impl Into<PathBuf>, vcs_available: bool) -> Self {
        let root = root.into();
        let resource_dir = detect_resource_dir(&root);
        let commands = discover_commands(&root);
        Self {
            root,
            vcs_available,
            resource_dir,
            commands,
        }
    }
}

/// Locates project roots using the repository marker or the source roots
#[derive(Debug, Clone)]
pub struct ProjectLocator {
    source_roots: SourceRoots,
}

impl ProjectLocator {
    pub fn new(source_roots: SourceRoots) -> Self {
        Self { source_roots }
    }

    /// Resolve the project for `process_name`, searching upward from `start`
    pub fn locate(&self, start: &Path, process_name: &str) -> Result<Project, FarError> {
        if let Some(root) = self.find_vcs_root(start) {
            tracing::debug!(root = %root.display(), "project root found via repository marker");
            return Ok(Project::at(root, true));
        }

        let src_dirs = self.source_roots.src_dirs();
        for src in &src_dirs {
            if let Some(root) = find_directory(src, process_name) {
                tracing::debug!(root = %root.display(), "project root found under source root");
                return Ok(Project::at(root, false));
            }
        }

        let mut searched = vec![start.to_path_buf()];
        searched.extend(src_dirs);
        Err(FarError::ProjectNotFound {
            process: process_name.to_string(),
            searched,
            hint: hints::project_not_found().to_string(),
        })
    }

    /// Climb from `start` to the filesystem root looking for `.git/config`
    ///
    /// Reaching a workspace `src` directory stops the climb with "not found".
    pub fn find_vcs_root(&self, start: &Path) -> Option<PathBuf> {
        let mut current = Some(start);
        while let Some(dir) = current {
            if self.source_roots.is_src_dir(dir) {
                return None;
            }
            if has_vcs_marker(dir) {
                return Some(dir.to_path_buf());
            }
            current = dir.parent();
        }
        None
    }
}

/// `<dir>/.git` is a directory containing a regular `config` file
pub fn has_vcs_marker(dir: &Path) -> bool {
    let marker = dir.join(VCS_DIR_NAME);
    marker.is_dir() && marker.join(VCS_CONFIG_FILE).is_file()
}

/// Depth-first search below `base` for a directory named `target`
///
/// Each level is scanned for a direct match before descending, children are
/// visited in name order. Uses an explicit stack.
pub fn find_directory(base: &Path, target: &str) -> Option<PathBuf> {
    let mut stack = vec![base.to_path_buf()];
    while let Some(dir) = stack.pop() {
        let subdirs = sorted_subdirectories(&dir);
        if let Some(found) = subdirs.iter().find(|d| base_name(d) == target) {
            return Some(found.clone());
        }
        stack.extend(subdirs.into_iter().rev());
    }
    None
}

/// Enumerate command units under `root`
pub fn discover_commands(root: &Path) -> Vec<CommandUnit> {
    let commands_dir = root.join(COMMANDS_DIR_NAME);
    if !commands_dir.is_dir() {
        return vec![CommandUnit::new(root)];
    }
    sorted_subdirectories(&commands_dir)
        .into_iter()
        .map(CommandUnit::new)
        .collect()
}

fn detect_resource_dir(root: &Path) -> Option<PathBuf> {
    let dir = root.join(RESOURCES_DIR_NAME);
    dir.is_dir().then_some(dir)
}

/// Immediate subdirectories in name order; unreadable directories are empty
fn sorted_subdirectories(dir: &Path) -> Vec<PathBuf> {
    let entries = match std::fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) => {
            tracing::debug!(dir = %dir.display(), "skipping unreadable directory: {e}");
            return Vec::new();
        }
    };
    let mut dirs: Vec<PathBuf> = entries
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().map(|t| t.is_dir()).unwrap_or(false))
        .map(|e| e.path())
        .collect();
    dirs.sort();
    dirs
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn make_git_marker(dir: &Path) {
        fs::create_dir_all(dir.join(".git")).unwrap();
        fs::write(dir.join(".git/config"), "[core]\n").unwrap();
    }

    fn locator_without_roots() -> ProjectLocator {
        ProjectLocator::new(SourceRoots::new(vec![]))
    }

    #[test]
    fn test_commands_dir_yields_one_unit_per_subdir() {
        let temp = TempDir::new().unwrap();
        let root = temp.path();
        for name in ["worker", "api", "cron"] {
            fs::create_dir_all(root.join("commands").join(name)).unwrap();
        }
        fs::write(root.join("commands/README"), "not a unit").unwrap();

        let units = discover_commands(root);
        let names: Vec<_> = units.iter().map(|u| u.binary_name()).collect();
        assert_eq!(names, vec!["api", "cron", "worker"]);
        assert_eq!(units[0].path(), root.join("commands/api"));
    }

    #[test]
    fn test_no_commands_dir_uses_root() {
        let temp = TempDir::new().unwrap();
        let root = temp.path().join("billing");
        fs::create_dir_all(root.join("internal")).unwrap();

        let units = discover_commands(&root);
        assert_eq!(units.len(), 1);
        assert_eq!(units[0].path(), root);
        assert_eq!(units[0].binary_name(), "billing");
    }

    #[test]
    fn test_empty_commands_dir_yields_nothing() {
        let temp = TempDir::new().unwrap();
        fs::create_dir_all(temp.path().join("commands")).unwrap();
        assert!(discover_commands(temp.path()).is_empty());
    }

    #[test]
    fn test_vcs_root_found_from_nested_dir() {
        let temp = TempDir::new().unwrap();
        let root = temp.path().join("proj");
        let nested = root.join("commands/api/handlers");
        fs::create_dir_all(&nested).unwrap();
        make_git_marker(&root);

        let locator = locator_without_roots();
        assert_eq!(locator.find_vcs_root(&nested), Some(root.clone()));

        let project = locator.locate(&nested, "proj").unwrap();
        assert!(project.vcs_available);
        assert_eq!(project.root, root);
    }

    #[test]
    fn test_git_dir_without_config_is_not_a_marker() {
        let temp = TempDir::new().unwrap();
        fs::create_dir_all(temp.path().join(".git")).unwrap();
        assert!(!has_vcs_marker(temp.path()));
    }

    #[test]
    fn test_climb_stops_at_src_dir() {
        let temp = TempDir::new().unwrap();
        let gopath = temp.path().join("go");
        let project = gopath.join("src/example.com/billing");
        fs::create_dir_all(&project).unwrap();
        // Marker above src must never be reached
        make_git_marker(temp.path());
        make_git_marker(&gopath);

        let locator = ProjectLocator::new(SourceRoots::new(vec![gopath.clone()]));
        assert_eq!(locator.find_vcs_root(&project), None);
    }

    #[test]
    fn test_fallback_to_source_root_search() {
        let temp = TempDir::new().unwrap();
        let gopath = temp.path().join("go");
        let project = gopath.join("src/example.com/team/billing");
        fs::create_dir_all(project.join("commands/api")).unwrap();
        fs::create_dir_all(project.join("resources")).unwrap();
        let start = gopath.join("src/example.com");

        let locator = ProjectLocator::new(SourceRoots::new(vec![gopath]));
        let found = locator.locate(&start, "billing").unwrap();
        assert!(!found.vcs_available);
        assert_eq!(found.root, project);
        assert_eq!(found.resource_dir, Some(project.join("resources")));
        assert_eq!(found.commands.len(), 1);
        assert_eq!(found.commands[0].binary_name(), "api");
    }

    #[test]
    fn test_project_not_found() {
        let temp = TempDir::new().unwrap();
        let gopath = temp.path().join("go");
        fs::create_dir_all(gopath.join("src/other")).unwrap();

        let locator = ProjectLocator::new(SourceRoots::new(vec![gopath.clone()]));
        let err = locator.locate(&gopath.join("src"), "billing").unwrap_err();
        match err {
            FarError::ProjectNotFound { process, searched, .. } => {
                assert_eq!(process, "billing");
                assert!(searched.contains(&gopath.join("src")));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_find_directory_prefers_shallow_match() {
        let temp = TempDir::new().unwrap();
        let base = temp.path();
        fs::create_dir_all(base.join("a/deep/target")).unwrap();
        fs::create_dir_all(base.join("b/target")).unwrap();
        fs::create_dir_all(base.join("target")).unwrap();
        assert_eq!(find_directory(base, "target"), Some(base.join("target")));
    }

    #[test]
    fn test_find_directory_depth_first_in_name_order() {
        let temp = TempDir::new().unwrap();
        let base = temp.path();
        fs::create_dir_all(base.join("a/deep/target")).unwrap();
        fs::create_dir_all(base.join("b/target")).unwrap();
        assert_eq!(
            find_directory(base, "target"),
            Some(base.join("a/deep/target"))
        );
    }

    #[test]
    fn test_find_directory_ignores_files() {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join("target"), "file").unwrap();
        assert_eq!(find_directory(temp.path(), "target"), None);
    }
}
