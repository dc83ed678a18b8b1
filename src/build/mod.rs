//! Packaging session orchestration
//!
//! A [`BuildContext`] drives one packaging session through a fixed, linear
//! sequence of steps:
//!
//! ```text
//! Created → StagingAllocated → ResourcesStaged → ProcessTypeClassified
//!         → BinariesCompiled → ManifestWritten → Archived → Complete
//! ```
//!
//! Any step error moves the session to `Failed` and aborts the rest. The
//! staging tree is removed when the session leaves [`BuildContext::package`],
//! on success and on failure alike.
//!
//! ## Modules
//!
//! - `project` - project root and command unit discovery
//! - `resources` - resource collection into the staging root
//! - `compile` - parallel cross-compilation behind a per-unit barrier
//! - `manifest` - deployment.json provenance
//! - `archive` - .far artifact creation
//! - `staging` - the temporary staging tree

pub mod archive;
pub mod compile;
pub mod manifest;
pub mod project;
pub mod resources;
pub mod staging;

use std::fmt;
#[cfg(test)]
use std::path::Path;
use std::path::PathBuf;

use console::style;

use crate::config::env::{artifact_path, resolve_build_root, BUILD_ROOT_ENV};
use crate::config::{PlatformConfig, SourceRoots};
use crate::error::FarError;
use crate::utils::git::{GitCli, SourceControl};
use crate::utils::terminal::{create_spinner, print_rule, print_step, print_success, print_warning};

use compile::{CrossCompiler, Toolchain};
use manifest::{Manifest, ProcessType};
use project::{CommandUnit, Project, ProjectLocator};
use resources::ResourceSource;
use staging::StagingTree;

/// Where a session currently stands
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Created,
    StagingAllocated,
    ResourcesStaged,
    ProcessTypeClassified,
    BinariesCompiled,
    ManifestWritten,
    Archived,
    Complete,
    Failed,
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// Per-invocation packaging options
#[derive(Debug, Clone, Default)]
pub struct BuildOptions {
    /// Foreign-linker override, enables interop compilation
    pub linker: Option<String>,
    /// Explicit designated resource directory
    pub resource_dir: Option<PathBuf>,
    /// Shared build-output root
    pub build_root: Option<PathBuf>,
    /// Verbose output
    pub verbose: bool,
    /// Print the artifact tree after archival
    pub show_tree: bool,
}

/// One packaging session
pub struct BuildContext {
    /// Project root directory
    pub project_root: PathBuf,
    /// Designated resource directory; `None` selects project scan
    pub resource_dir: Option<PathBuf>,
    /// Units in discovery order
    pub commands: Vec<CommandUnit>,
    /// Whether provenance may be read from source control
    pub vcs_available: bool,
    /// Exposed process name
    pub process_name: String,
    /// Foreign-linker override
    pub linker: Option<String>,
    process_type: ProcessType,
    platforms: PlatformConfig,
    toolchain: Box<dyn Toolchain>,
    source_control: Box<dyn SourceControl>,
    artifact_path: PathBuf,
    staging_dir: Option<PathBuf>,
    state: SessionState,
    verbose: bool,
    show_tree: bool,
}

impl BuildContext {
    /// Create a session for an already-located project
    pub fn new(
        project: Project,
        process_name: &str,
        options: BuildOptions,
        platforms: PlatformConfig,
        toolchain: Box<dyn Toolchain>,
    ) -> Result<Self, FarError> {
        let build_root = resolve_build_root(options.build_root, &SourceRoots::from_env())
            .ok_or_else(|| {
                FarError::config_error_with_hint(
                    "cannot determine the build output root",
                    None,
                    format!("Pass --build-root or set {BUILD_ROOT_ENV}"),
                )
            })?;

        Ok(Self {
            resource_dir: options.resource_dir.or(project.resource_dir),
            project_root: project.root,
            commands: project.commands,
            vcs_available: project.vcs_available,
            process_name: process_name.to_string(),
            linker: options.linker,
            process_type: ProcessType::General,
            platforms,
            toolchain,
            source_control: Box::new(GitCli),
            artifact_path: artifact_path(&build_root, process_name),
            staging_dir: None,
            state: SessionState::Created,
            verbose: options.verbose,
            show_tree: options.show_tree,
        })
    }

    /// Locate the project from the current directory and create a session
    pub fn discover(
        process_name: &str,
        options: BuildOptions,
        platforms: PlatformConfig,
        toolchain: Box<dyn Toolchain>,
    ) -> Result<Self, FarError> {
        let cwd = std::env::current_dir().map_err(|e| {
            FarError::config_error_with_hint(
                "cannot read the current directory",
                Some(e.into()),
                "Run gofar from inside the project tree",
            )
        })?;
        let project = ProjectLocator::new(SourceRoots::from_env()).locate(&cwd, process_name)?;
        Self::new(project, process_name, options, platforms, toolchain)
    }

    #[cfg(test)]
    /// Replace the source-control provider
    pub fn with_source_control(mut self, source_control: Box<dyn SourceControl>) -> Self {
        self.source_control = source_control;
        self
    }

    #[cfg(test)]
    pub fn state(&self) -> SessionState {
        self.state
    }

    #[cfg(test)]
    pub fn process_type(&self) -> ProcessType {
        self.process_type
    }

    #[cfg(test)]
    /// `<buildRoot>/<process>/<process>.far`
    pub fn artifact_path(&self) -> &Path {
        &self.artifact_path
    }

    #[cfg(test)]
    /// Staging directory of the last session, if one was allocated
    pub fn staging_dir(&self) -> Option<&Path> {
        self.staging_dir.as_deref()
    }

    /// Print the session summary
    pub fn print(&self) {
        let binaries: Vec<&str> = self.commands.iter().map(CommandUnit::binary_name).collect();
        let platforms: Vec<String> = self.platforms.iter().map(ToString::to_string).collect();
        let resources = self
            .resource_dir
            .as_ref()
            .map(|d| d.display().to_string())
            .unwrap_or_else(|| "project scan".to_string());

        print_rule();
        println!("{:<12}: {}", "process", style(&self.process_name).bold());
        println!("{:<12}: {}", "project", self.project_root.display());
        println!("{:<12}: {}", "resources", resources);
        println!("{:<12}: {}", "binaries", binaries.join(", "));
        println!("{:<12}: {}", "platforms", platforms.join(", "));
        if let Some(linker) = &self.linker {
            println!("{:<12}: {}", "linker", linker);
        }
        println!("{:<12}: {}", "artifact", self.artifact_path.display());
        print_rule();
    }

    /// Run the whole session, returning the artifact path
    pub fn package(&mut self) -> Result<PathBuf, FarError> {
        let result = self.run();
        match &result {
            Ok(_) => self.transition(SessionState::Complete),
            Err(e) => {
                tracing::debug!(state = %self.state, "session aborted: {e}");
                self.transition(SessionState::Failed);
            }
        }
        result
    }

    fn run(&mut self) -> Result<PathBuf, FarError> {
        let staging = StagingTree::allocate(&self.process_name)?;
        self.staging_dir = Some(staging.path().to_path_buf());
        self.transition(SessionState::StagingAllocated);

        let outcome = self.assemble(&staging);

        if let Err(e) = staging.close() {
            print_warning(&format!("fail to remove staging directory : {e}"));
        }
        outcome
    }

    fn assemble(&mut self, staging: &StagingTree) -> Result<PathBuf, FarError> {
        let source = match &self.resource_dir {
            Some(dir) => ResourceSource::Designated(dir.clone()),
            None => ResourceSource::ProjectScan(self.project_root.clone()),
        };
        print_step("collecting resources...");
        let copied = resources::collect(&source, staging.path())?;
        tracing::debug!(copied, "resources staged");
        self.transition(SessionState::ResourcesStaged);

        if staging.contains_file(&ProcessType::ui_descriptor_name(&self.process_name)) {
            self.process_type = ProcessType::UserInteractive;
        }
        self.transition(SessionState::ProcessTypeClassified);

        let names: Vec<&str> = self.commands.iter().map(CommandUnit::binary_name).collect();
        print_step(&format!("compiling {}...", names.join(", ")));
        let reports =
            CrossCompiler::new(self.toolchain.as_ref(), &self.platforms, self.linker.as_deref())
                .compile_all(&self.commands, staging, &self.project_root)?;
        for report in &reports {
            tracing::debug!(
                binary = %report.binary_name,
                built = report.total - report.failed,
                total = report.total,
                "unit compiled"
            );
        }
        self.transition(SessionState::BinariesCompiled);

        print_step("writing deployment.json...");
        let source_control = if self.vcs_available {
            Some(self.source_control.as_ref())
        } else {
            None
        };
        Manifest::stamp(
            &self.process_name,
            self.process_type,
            &self.project_root,
            source_control,
        )
        .write(staging.path())?;
        self.transition(SessionState::ManifestWritten);

        let spinner = create_spinner(&format!("compressing {}...", self.artifact_path.display()));
        let archived = archive::create_archive(staging.path(), &self.artifact_path);
        spinner.finish_and_clear();
        let summary = archived?;
        self.transition(SessionState::Archived);

        print_success(&format!(
            "{} ({} files, {} directories, {} bytes)",
            self.artifact_path.display(),
            summary.files,
            summary.directories,
            summary.size
        ));
        if self.show_tree || self.verbose {
            if let Err(e) = archive::print_zip_tree(&self.artifact_path, "  ") {
                print_warning(&format!("fail to list artifact : {e:#}"));
            }
        }

        Ok(self.artifact_path.clone())
    }

    fn transition(&mut self, next: SessionState) {
        tracing::debug!(from = %self.state, to = %next, "session state");
        self.state = next;
    }
}
