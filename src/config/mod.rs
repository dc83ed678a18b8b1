//! Configuration: platform registry file and environment-derived locations

pub mod env;
pub mod platforms;

pub use env::SourceRoots;
pub use platforms::{PlatformConfig, PlatformTarget};
