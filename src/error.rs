//! Error types and helpers for user-friendly error messages
//!
//! Every packaging step reports failures through [`FarError`]. Variants carry
//! the failing path or target along with the underlying message so the
//! orchestrator can abort with enough detail to identify the step.

use std::path::PathBuf;

use thiserror::Error;

/// Packaging errors with helpful context and suggestions
#[derive(Error, Debug)]
pub enum FarError {
    /// Neither a repository root nor a source-root directory matched
    #[error("Cannot find project base directory for process '{process}'")]
    ProjectNotFound {
        process: String,
        searched: Vec<PathBuf>,
        hint: String,
    },

    /// Discovery produced nothing to compile
    #[error("Not found target process list in {}", root.display())]
    NoBuildTargets { root: PathBuf },

    /// Resource collection failed
    #[error("Failed to copy resources from {}: {message}", path.display())]
    ResourceCopy {
        path: PathBuf,
        message: String,
        #[source]
        source: Option<anyhow::Error>,
    },

    /// One or more compile tasks failed
    #[error(
        "Failed to prepare binary {}: {failed} of {total} platform build(s) failed",
        units.join(", ")
    )]
    CompileFailed {
        units: Vec<String>,
        failed: usize,
        total: usize,
        diagnostics: Vec<String>,
    },

    /// deployment.json could not be produced
    #[error("Failed to write manifest {}: {message}", path.display())]
    ManifestWrite {
        path: PathBuf,
        message: String,
        #[source]
        source: Option<anyhow::Error>,
    },

    /// The staging tree could not be serialized
    #[error("Failed to compress {}: {message}", path.display())]
    Archive {
        path: PathBuf,
        message: String,
        #[source]
        source: Option<anyhow::Error>,
    },

    /// The temporary staging directory could not be created
    #[error("Failed to create staging directory for '{process}': {message}")]
    StagingAllocation {
        process: String,
        message: String,
        #[source]
        source: Option<anyhow::Error>,
    },

    /// Tool/executable not found or misconfigured
    #[error("Missing tool: {tool}")]
    MissingTool {
        tool: String,
        required_for: String,
        hint: String,
    },

    /// Configuration file errors
    #[error("Configuration error: {message}")]
    Config {
        message: String,
        #[source]
        source: Option<anyhow::Error>,
        hint: Option<String>,
    },
}

impl FarError {
    /// Create a configuration error
    pub fn config_error(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
            source: None,
            hint: None,
        }
    }

    /// Create a configuration error with source and hint
    pub fn config_error_with_hint(
        message: impl Into<String>,
        source: Option<anyhow::Error>,
        hint: impl Into<String>,
    ) -> Self {
        Self::Config {
            message: message.into(),
            source,
            hint: Some(hint.into()),
        }
    }

    /// Create a resource copy error
    pub fn resource_copy(
        path: impl Into<PathBuf>,
        message: impl Into<String>,
        source: Option<anyhow::Error>,
    ) -> Self {
        Self::ResourceCopy {
            path: path.into(),
            message: message.into(),
            source,
        }
    }

    /// Create a manifest write error
    pub fn manifest_write(
        path: impl Into<PathBuf>,
        message: impl Into<String>,
        source: Option<anyhow::Error>,
    ) -> Self {
        Self::ManifestWrite {
            path: path.into(),
            message: message.into(),
            source,
        }
    }

    /// Create an archive error
    pub fn archive(
        path: impl Into<PathBuf>,
        message: impl Into<String>,
        source: Option<anyhow::Error>,
    ) -> Self {
        Self::Archive {
            path: path.into(),
            message: message.into(),
            source,
        }
    }

    /// Create a missing tool error
    pub fn missing_tool(
        tool: impl Into<String>,
        required_for: impl Into<String>,
        hint: impl Into<String>,
    ) -> Self {
        Self::MissingTool {
            tool: tool.into(),
            required_for: required_for.into(),
            hint: hint.into(),
        }
    }

    /// Display error with formatting and hints
    pub fn display_with_hints(&self) {
        use console::style;

        eprintln!("\n{} {}", style("ERROR:").red().bold(), self);

        let mut cause = std::error::Error::source(self);
        while let Some(err) = cause {
            eprintln!("  caused by: {}", err);
            cause = err.source();
        }

        match self {
            FarError::ProjectNotFound { hint, .. } | FarError::MissingTool { hint, .. } => {
                eprintln!("\n{} {}", style("HINT:").yellow().bold(), hint);
            }
            FarError::Config { hint: Some(h), .. } => {
                eprintln!("\n{} {}", style("HINT:").yellow().bold(), h);
            }
            FarError::NoBuildTargets { .. } => {
                eprintln!("\n{} {}", style("HINT:").yellow().bold(), hints::no_build_targets());
            }
            _ => {}
        }

        if let FarError::ProjectNotFound { searched, .. } = self {
            if !searched.is_empty() {
                eprintln!("\n{}", style("SEARCHED:").cyan().bold());
                for dir in searched {
                    eprintln!("  • {}", dir.display());
                }
            }
        }

        if let FarError::CompileFailed { diagnostics, .. } = self {
            if !diagnostics.is_empty() {
                eprintln!("\n{}", style("DIAGNOSTICS:").cyan().bold());
                for diag in diagnostics {
                    eprintln!("  • {}", diag);
                }
            }
        }

        eprintln!();
    }
}

/// Common error hints
pub mod hints {
    /// Get hint for a project that could not be located
    pub fn project_not_found() -> &'static str {
        "Run gofar from inside the project's git checkout, or place the project\n\
         under $GOPATH/src in a directory named after the process."
    }

    /// Get hint for a project without buildable commands
    pub fn no_build_targets() -> &'static str {
        "Put each binary's sources in its own directory under commands/,\n\
         or keep a single main package at the project root."
    }

    /// Get hint for missing Go toolchain
    pub fn go() -> &'static str {
        "Install Go from https://go.dev/dl/ or use your package manager:\n\
         • macOS: brew install go\n\
         • Ubuntu: sudo apt install golang-go\n\
         \n\
         Or point GOFAR_GO at the toolchain executable."
    }

    /// Get hint for invalid platform configuration
    pub fn platform_config() -> &'static str {
        "The platform list must contain at least one entry, for example:\n\
         \n\
         [[platform_list]]\n\
         os = \"linux\"\n\
         arch = \"amd64\"\n\
         \n\
         Run: gofar platforms --init to regenerate the defaults."
    }
}
