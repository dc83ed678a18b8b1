//! gofar - Go multi-platform process packager
//!
//! Locates a Go project, cross-compiles each of its command binaries for every
//! configured platform, stamps build provenance and bundles the result into a
//! single `<process>.far` deployment archive.
//!
//! ## Architecture
//!
//! ```text
//! cli → commands/ → build::BuildContext → resources → compile → manifest → archive
//! ```

mod build;
mod cli;
mod commands;
mod config;
mod error;
mod exec;
mod utils;

use clap::Parser;
use tracing::Level;
use tracing_subscriber::EnvFilter;

use cli::Cli;
use error::FarError;
use utils::terminal::print_error;

fn main() {
    let cli = Cli::parse();

    let level = if cli.verbose { Level::DEBUG } else { Level::WARN };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive(level.into()))
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();

    if let Err(e) = cli.execute() {
        match e.downcast_ref::<FarError>() {
            Some(far) => far.display_with_hints(),
            None => print_error(&format!("{e:#}")),
        }
        std::process::exit(1);
    }
}
