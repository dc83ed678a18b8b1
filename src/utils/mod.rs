//! Shared utilities: paths, terminal output, tool detection, git provenance

pub mod git;
pub mod paths;
pub mod terminal;
pub mod tools;
