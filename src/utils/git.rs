// Source-control snapshot for build provenance
// Read-only: nothing here ever writes to the repository.

use std::path::Path;
use std::process::Command;

use anyhow::{bail, Context, Result};
use serde::Serialize;

use crate::exec::subprocess::run_command;

/// Prefix git uses for local branch refs
pub const REF_HEADS_PREFIX: &str = "refs/heads/";

/// Repository state recorded in the manifest's `build.git` block
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GitSnapshot {
    /// Remote `origin` URL, when one is configured
    #[serde(skip_serializing_if = "Option::is_none")]
    pub repo: Option<String>,
    /// Branch name with the local-heads prefix stripped
    pub branch: String,
    /// Full revision hash of HEAD
    pub commit: String,
    /// Message of the HEAD commit
    pub message: String,
}

/// Provider of source-control metadata for a project root
pub trait SourceControl: Send + Sync {
    /// Read the current snapshot; errors mean "no valid snapshot"
    fn snapshot(&self, project_root: &Path) -> Result<GitSnapshot>;
}

/// Reads the snapshot through the `git` executable
#[derive(Debug, Clone, Default)]
pub struct GitCli;

impl SourceControl for GitCli {
    fn snapshot(&self, project_root: &Path) -> Result<GitSnapshot> {
        let commit = git_output(project_root, &["rev-parse", "HEAD"])
            .context("Failed to resolve git HEAD")?;
        if commit.is_empty() {
            bail!("git HEAD resolved to an empty revision");
        }

        // Detached HEAD has no symbolic ref
        let head_ref = git_output(project_root, &["symbolic-ref", "-q", "HEAD"])
            .unwrap_or_else(|_| "HEAD".to_string());

        let repo = git_output(project_root, &["remote", "get-url", "origin"])
            .ok()
            .filter(|url| !url.is_empty());

        let message = match git_output(project_root, &["log", "-1", "--format=%B"]) {
            Ok(message) => message,
            Err(e) => {
                tracing::warn!("commit log unavailable: {e:#}");
                String::new()
            }
        };

        Ok(GitSnapshot {
            repo,
            branch: normalize_branch(&head_ref),
            commit,
            message,
        })
    }
}

/// Strip `refs/heads/` from a ref name, leaving anything else untouched
///
/// `refs/heads/enhancement/commit_message` becomes `enhancement/commit_message`.
pub fn normalize_branch(ref_name: &str) -> String {
    match ref_name.strip_prefix(REF_HEADS_PREFIX) {
        Some(branch) if !branch.is_empty() => branch.to_string(),
        _ => ref_name.to_string(),
    }
}

/// Run a git subcommand in `dir` and return trimmed stdout
fn git_output(dir: &Path, args: &[&str]) -> Result<String> {
    let mut cmd = Command::new("git");
    cmd.args(args).current_dir(dir);
    let result = run_command(&mut cmd)?;
    if !result.success {
        bail!(
            "git {} failed ({}): {}",
            args.join(" "),
            result.exit_code,
            result.stderr.trim()
        );
    }
    Ok(result.stdout.trim().to_string())
}
