//! Package command implementation

use anyhow::Result;
use clap::Args;
use std::path::PathBuf;

use crate::build::compile::GoToolchain;
use crate::build::{BuildContext, BuildOptions};
use crate::config::env::BUILD_ROOT_ENV;
use crate::config::{PlatformConfig, PlatformTarget};

/// Build every command binary for every platform and bundle them as <name>.far
#[derive(Args, Debug)]
pub struct PackageCommand {
    /// Exposed process name (artifact name, fallback project directory name)
    pub process_name: String,

    /// Foreign C linker, enables cgo and strips debug symbols
    #[arg(long, value_name = "CC")]
    pub linker: Option<String>,

    /// Designated resource directory copied as a whole into the artifact
    #[arg(long, value_name = "DIR")]
    pub resources: Option<PathBuf>,

    /// Shared build-output root (default: <first GOPATH entry>/far)
    #[arg(long, value_name = "DIR", env = BUILD_ROOT_ENV)]
    pub build_root: Option<PathBuf>,

    /// Target platform as os/arch, repeatable; overrides the platform list
    #[arg(long = "platform", value_name = "OS/ARCH")]
    pub platforms: Vec<PlatformTarget>,

    /// Platform list file (default: ~/.fatima/gofar.toml)
    #[arg(long, value_name = "PATH", env = "GOFAR_CONFIG")]
    pub config: Option<PathBuf>,

    /// Go toolchain executable
    #[arg(long, value_name = "PROGRAM", env = "GOFAR_GO", default_value = "go")]
    pub go: String,

    /// Print the artifact contents after packaging
    #[arg(long)]
    pub tree: bool,
}

impl PackageCommand {
    /// Execute the package command
    pub fn execute(self, verbose: bool) -> Result<()> {
        let platforms = self.load_platforms()?;
        let toolchain = GoToolchain::discover(&self.go)?;

        let options = BuildOptions {
            linker: self.linker,
            resource_dir: self.resources,
            build_root: self.build_root,
            verbose,
            show_tree: self.tree,
        };

        let mut ctx =
            BuildContext::discover(&self.process_name, options, platforms, Box::new(toolchain))?;
        ctx.print();
        ctx.package()?;
        Ok(())
    }

    fn load_platforms(&self) -> Result<PlatformConfig> {
        if !self.platforms.is_empty() {
            return Ok(PlatformConfig::from_platforms(self.platforms.clone())?);
        }
        let path = super::platform_config_path(self.config.as_deref())?;
        tracing::debug!(path = %path.display(), "loading platform list");
        Ok(PlatformConfig::load_or_init(&path)?)
    }
}
