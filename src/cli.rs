//! CLI argument parsing using clap derive macros

use anyhow::Result;
use clap::{Parser, Subcommand};

use crate::commands::{package::PackageCommand, platforms::PlatformsCommand};

/// gofar - Go multi-platform process packager
///
/// Cross-compiles a project's command binaries for every configured platform
/// and bundles them with their resources into a `.far` deployment archive.
#[derive(Parser, Debug)]
#[command(name = "gofar")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Build and package a process into <name>.far
    Package(PackageCommand),

    /// Show or initialize the build platform list
    Platforms(PlatformsCommand),
}

impl Cli {
    /// Execute the CLI command
    pub fn execute(self) -> Result<()> {
        if self.no_color {
            console::set_colors_enabled(false);
            console::set_colors_enabled_stderr(false);
        }

        match self.command {
            Commands::Package(cmd) => cmd.execute(self.verbose),
            Commands::Platforms(cmd) => cmd.execute(self.verbose),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_package() {
        let cli = Cli::try_parse_from([
            "gofar",
            "-v",
            "package",
            "billing",
            "--platform",
            "linux/amd64",
            "--platform",
            "darwin_arm64",
            "--linker",
            "aarch64-linux-gnu-gcc",
        ])
        .unwrap();
        assert!(cli.verbose);
        match cli.command {
            Commands::Package(cmd) => {
                assert_eq!(cmd.process_name, "billing");
                assert_eq!(cmd.platforms.len(), 2);
                assert_eq!(cmd.platforms[1].dir_name(), "darwin_arm64");
                assert_eq!(cmd.linker.as_deref(), Some("aarch64-linux-gnu-gcc"));
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_bad_platform_is_rejected() {
        let parsed = Cli::try_parse_from(["gofar", "package", "billing", "--platform", "linux"]);
        assert!(parsed.is_err());
    }
}
