//! Cross-compilation of command units for every target platform
//!
//! For one unit, every platform compile runs at once on its own worker and
//! the unit is done only when all of them have returned. Units are processed
//! one after another. A failing task bumps a shared counter but never cancels
//! its siblings; the counter is checked after the barrier.
//!
//! ```text
//! <staging>/platform/
//! ├── linux_amd64/{api,worker}
//! └── linux_arm64/{api,worker}
//! ```

use std::path::{Path, PathBuf};
use std::process::Command;
use std::sync::atomic::{AtomicUsize, Ordering};

use anyhow::Result;

use super::project::CommandUnit;
use super::staging::StagingTree;
use crate::config::{PlatformConfig, PlatformTarget};
use crate::error::FarError;
use crate::exec::subprocess::{run_command, CommandResult};
use crate::utils::paths::{ensure_dir, make_executable};
use crate::utils::terminal::print_error;

/// One unit × platform compile
#[derive(Debug, Clone)]
pub struct CompileTask {
    /// Unit source directory (toolchain working directory)
    pub source_dir: PathBuf,
    /// Binary name
    pub binary_name: String,
    /// Where the binary must be written
    pub output_path: PathBuf,
    /// Target platform
    pub platform: PlatformTarget,
    /// Foreign-linker override, enables interop compilation
    pub linker: Option<String>,
}

impl CompileTask {
    pub fn new(
        unit: &CommandUnit,
        platform: &PlatformTarget,
        platform_dir: &Path,
        linker: Option<&str>,
    ) -> Self {
        Self {
            source_dir: unit.path().to_path_buf(),
            binary_name: unit.binary_name().to_string(),
            output_path: platform_dir.join(unit.binary_name()),
            platform: platform.clone(),
            linker: linker.map(String::from),
        }
    }

    /// Directory the binary lands in
    pub fn target_dir(&self) -> &Path {
        self.output_path.parent().unwrap_or(&self.output_path)
    }
}

/// Native toolchain capable of building one task
pub trait Toolchain: Send + Sync {
    /// Display name
    fn name(&self) -> &str;

    /// Build `task`, blocking until the toolchain exits
    fn compile(&self, task: &CompileTask) -> Result<CommandResult>;
}

/// `go build` driven through `GOOS`/`GOARCH`
#[derive(Debug, Clone)]
pub struct GoToolchain {
    program: PathBuf,
}

impl GoToolchain {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
        }
    }

    /// Resolve `program` on `PATH`, failing with an install hint
    pub fn discover(program: &str) -> Result<Self, FarError> {
        let info = crate::utils::tools::require_tool(program, "compiling command binaries")?;
        tracing::debug!(
            tool = %info.name,
            path = %info.path.display(),
            version = info.version.as_deref().unwrap_or("unknown"),
            "toolchain resolved"
        );
        Ok(Self::new(info.path))
    }

    /// Assemble the toolchain invocation for `task`
    pub fn command(&self, task: &CompileTask) -> Command {
        let mut cmd = Command::new(&self.program);
        cmd.current_dir(&task.source_dir)
            .env("GOOS", &task.platform.os)
            .env("GOARCH", &task.platform.arch)
            .arg("build")
            .arg("-o")
            .arg(&task.output_path);

        if let Some(linker) = &task.linker {
            cmd.env("CC", linker)
                .env("CGO_ENABLED", "1")
                .arg("-ldflags=-s -w");
        }
        cmd
    }
}

impl Toolchain for GoToolchain {
    fn name(&self) -> &str {
        "go"
    }

    fn compile(&self, task: &CompileTask) -> Result<CommandResult> {
        let mut cmd = self.command(task);
        tracing::debug!(
            platform = %task.platform,
            binary = %task.binary_name,
            linker = task.linker.as_deref().unwrap_or("-"),
            "{:?}",
            cmd
        );
        run_command(&mut cmd)
    }
}

/// Outcome of compiling one unit
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnitReport {
    pub binary_name: String,
    pub total: usize,
    pub failed: usize,
}

/// Compiles units across the configured platforms
pub struct CrossCompiler<'a> {
    toolchain: &'a dyn Toolchain,
    platforms: &'a PlatformConfig,
    linker: Option<&'a str>,
}

impl<'a> CrossCompiler<'a> {
    pub fn new(
        toolchain: &'a dyn Toolchain,
        platforms: &'a PlatformConfig,
        linker: Option<&'a str>,
    ) -> Self {
        Self {
            toolchain,
            platforms,
            linker,
        }
    }

    /// Compile every unit in order, stopping at the first failed unit
    pub fn compile_all(
        &self,
        units: &[CommandUnit],
        staging: &StagingTree,
        root: &Path,
    ) -> Result<Vec<UnitReport>, FarError> {
        if units.is_empty() {
            return Err(FarError::NoBuildTargets {
                root: root.to_path_buf(),
            });
        }
        units
            .iter()
            .map(|unit| self.compile_unit(unit, staging))
            .collect()
    }

    /// Fan out one task per platform, join, then check the failure counter
    pub fn compile_unit(
        &self,
        unit: &CommandUnit,
        staging: &StagingTree,
    ) -> Result<UnitReport, FarError> {
        let tasks: Vec<CompileTask> = self
            .platforms
            .iter()
            .map(|p| CompileTask::new(unit, p, &staging.platform_dir(p), self.linker))
            .collect();
        let total = tasks.len();
        let failures = AtomicUsize::new(0);

        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(total.max(1))
            .thread_name(|i| format!("compile-{i}"))
            .build()
            .map_err(|e| FarError::CompileFailed {
                units: vec![unit.binary_name().to_string()],
                failed: total,
                total,
                diagnostics: vec![format!("failed to start compile workers: {e}")],
            })?;

        // One diagnostic slot per task; each worker writes only its own
        let mut slots: Vec<Option<String>> = vec![None; total];
        let toolchain = self.toolchain;
        pool.scope(|scope| {
            for (task, slot) in tasks.iter().zip(slots.iter_mut()) {
                let failures = &failures;
                scope.spawn(move |_| {
                    if let Err(reason) = run_task(toolchain, task) {
                        print_error(&reason);
                        failures.fetch_add(1, Ordering::SeqCst);
                        *slot = Some(reason);
                    }
                });
            }
        });

        let failed = failures.load(Ordering::SeqCst);
        if failed > 0 {
            return Err(FarError::CompileFailed {
                units: vec![unit.binary_name().to_string()],
                failed,
                total,
                diagnostics: slots.into_iter().flatten().collect(),
            });
        }

        Ok(UnitReport {
            binary_name: unit.binary_name().to_string(),
            total,
            failed,
        })
    }
}

/// Run one task; the error message is prefixed with `<binary> for <platform>`
///
/// Output written by the toolchain counts as failure even on exit 0. A failed
/// build removes its partial output.
fn run_task(toolchain: &dyn Toolchain, task: &CompileTask) -> Result<(), String> {
    let failure = |reason: String| format!("{} for {}: {reason}", task.binary_name, task.platform);

    let target_dir = task.target_dir();
    ensure_dir(target_dir).map_err(|e| {
        failure(format!("fail to prepare platform dir {} : {e:#}", target_dir.display()))
    })?;

    println!("{} {} -> {}", toolchain.name(), task.binary_name, task.platform);

    let result = toolchain
        .compile(task)
        .map_err(|e| failure(format!("fail to execute {} : {e:#}", toolchain.name())))?;

    if !result.is_clean() {
        let _ = std::fs::remove_file(&task.output_path);
        return Err(failure(format!(
            "build reported (exit {})\n{}",
            result.exit_code,
            result.combined_output().trim_end()
        )));
    }

    make_executable(&task.output_path).map_err(|e| failure(format!("{e:#}")))?;

    tracing::debug!(
        platform = %task.platform,
        binary = %task.binary_name,
        elapsed_ms = result.duration.as_millis() as u64,
        "compiled"
    );
    Ok(())
}
