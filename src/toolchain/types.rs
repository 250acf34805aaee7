use std::path::PathBuf;
use thiserror::Error;

/// Represents a located compiler
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolchainInfo {
    /// Absolute path to the compiler driver
    pub executable_path: PathBuf,

    /// Version parsed from `--version`, if it could be determined
    pub version: Option<String>,
}

impl ToolchainInfo {
    pub fn new(executable_path: PathBuf, version: Option<String>) -> Self {
        Self {
            executable_path,
            version,
        }
    }

    /// Version for display, `"unknown"` when the probe could not parse one
    pub fn version_or_unknown(&self) -> &str {
        self.version.as_deref().unwrap_or("unknown")
    }
}

/// Error type for toolchain operations
#[derive(Debug, Error)]
pub enum ToolchainError {
    /// No compiler with that name could be located
    #[error("Toolchain not found: '{0}' is not on PATH or is not a file")]
    NotFound(String),

    /// Compiler lookup is not implemented for this OS
    #[error("Toolchain lookup is not implemented on {0}")]
    PlatformUnsupported(&'static str),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}
