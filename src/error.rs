//! Errors that end a build invocation.

use crate::build::{BuildStage, CompileFailure};
use crate::toolchain::ToolchainError;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum BuildError {
    #[error(transparent)]
    Toolchain(#[from] ToolchainError),

    #[error("external tool '{name}' is unavailable: {message}")]
    Tool { name: String, message: String },

    #[error("could not prepare build directory {}: {source}", path.display())]
    OutputDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Every source failed; the linker is never invoked
    #[error("no object files were produced, nothing to link")]
    NoObjectsProduced { failures: Vec<CompileFailure> },

    #[error("{} source file(s) failed to compile", failures.len())]
    CompileFailed { failures: Vec<CompileFailure> },

    #[error("linking {} failed", executable.display())]
    LinkFailed {
        executable: PathBuf,
        diagnostic: String,
    },

    #[error("could not start compile workers: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),
}

impl BuildError {
    /// The stage the pipeline had reached when it aborted.
    pub fn stage(&self) -> BuildStage {
        match self {
            BuildError::Toolchain(_) => BuildStage::Init,
            BuildError::Tool { .. } => BuildStage::ToolchainResolved,
            BuildError::OutputDir { .. } | BuildError::ThreadPool(_) => BuildStage::SourcesDiscovered,
            BuildError::NoObjectsProduced { .. }
            | BuildError::CompileFailed { .. }
            | BuildError::LinkFailed { .. } => BuildStage::Compiled,
        }
    }

    /// Per-source compile failures carried by this error, if any.
    pub fn compile_failures(&self) -> &[CompileFailure] {
        match self {
            BuildError::NoObjectsProduced { failures } | BuildError::CompileFailed { failures } => {
                failures
            }
            _ => &[],
        }
    }
}
