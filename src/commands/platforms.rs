//! Platforms command implementation

use anyhow::Result;
use clap::Args;
use console::style;
use std::path::PathBuf;

use crate::config::PlatformConfig;
use crate::utils::terminal::{print_info, print_success};

/// Show the build platform list
#[derive(Args, Debug)]
pub struct PlatformsCommand {
    /// Rewrite the platform list file with the defaults
    #[arg(long)]
    pub init: bool,

    /// Platform list file (default: ~/.fatima/gofar.toml)
    #[arg(long, value_name = "PATH", env = "GOFAR_CONFIG")]
    pub config: Option<PathBuf>,
}

impl PlatformsCommand {
    /// Execute the platforms command
    pub fn execute(self, verbose: bool) -> Result<()> {
        let path = super::platform_config_path(self.config.as_deref())?;

        if self.init {
            PlatformConfig::default_for_host().write(&path)?;
            print_success(&format!("wrote {}", path.display()));
        }

        let config = PlatformConfig::load_or_init(&path)?;
        if verbose {
            print_info(&format!("platform list: {}", path.display()));
        }

        let local = config.local_platform();
        for platform in config.iter() {
            if *platform == local {
                println!("  {} {}", platform, style("(local)").green());
            } else {
                println!("  {}", platform);
            }
        }
        let additional = config.additional_platforms().len();
        println!(
            "\n{} platform(s), {} besides the local host",
            config.len(),
            additional
        );
        Ok(())
    }
}
