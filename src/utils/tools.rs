//! Tool detection with actionable errors
//!
//! The packager shells out to a compiler toolchain, `git` and a few POSIX
//! utilities. Missing required tools are reported before any work starts.

use std::path::{Path, PathBuf};
use std::process::Command;

use which::which;

use crate::error::{hints, FarError};

/// Tool detection result
#[derive(Debug, Clone)]
pub struct ToolInfo {
    /// Tool name as requested
    pub name: String,
    /// Path to the tool executable
    pub path: PathBuf,
    /// Tool version string (if available)
    pub version: Option<String>,
}

/// Check if a tool exists and return its information
///
/// `tool_name` may be a bare program name looked up on `PATH` or a path to an
/// executable.
pub fn check_tool(tool_name: &str) -> Option<ToolInfo> {
    let path = which(tool_name).ok()?;
    let version = get_tool_version(&path);
    Some(ToolInfo {
        name: tool_name.to_string(),
        path,
        version,
    })
}

/// Get tool version, trying `version` (go style) and `--version`
fn get_tool_version(path: &Path) -> Option<String> {
    for arg in ["version", "--version"] {
        if let Ok(output) = Command::new(path).arg(arg).output() {
            if output.status.success() {
                let version = String::from_utf8_lossy(&output.stdout);
                let first = version.lines().next().unwrap_or("").trim();
                if !first.is_empty() {
                    return Some(first.to_string());
                }
            }
        }
    }
    None
}

/// Require a tool to exist, return error with hint if missing
pub fn require_tool(tool_name: &str, required_for: &str) -> Result<ToolInfo, FarError> {
    check_tool(tool_name).ok_or_else(|| {
        FarError::missing_tool(tool_name, required_for, get_tool_hint(tool_name))
    })
}

/// Get installation hint for a tool
fn get_tool_hint(tool_name: &str) -> &'static str {
    let base = Path::new(tool_name)
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or(tool_name);
    match base {
        "go" => hints::go(),
        _ => "Install this tool and ensure it's in your PATH",
    }
}
