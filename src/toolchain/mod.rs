//! Toolchain discovery
//!
//! Locates the compiler driver named in `kiln.toml` and extracts its version.
//! Each probe spawns one short-lived subprocess and runs before any parallel
//! work starts.

pub mod types;

pub mod install; // External tool downloader

pub use types::{ToolchainError, ToolchainInfo};

use regex::Regex;
use std::path::{Path, PathBuf};
use std::process::Command;
use std::sync::LazyLock;

static VERSION_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"version\s([0-9]+\.[0-9]+\.[0-9]+)").expect("version pattern is valid")
});

/// Locate `compiler` and probe its version.
///
/// Relative paths such as `./tools/cc` resolve against `base_dir`; bare names
/// are searched on `PATH`. A missing version is logged and tolerated; a
/// missing compiler is not.
pub fn locate(compiler: &str, base_dir: &Path) -> Result<ToolchainInfo, ToolchainError> {
    let executable_path = find_executable(compiler, base_dir)?;
    tracing::info!("Found compiler at {}", executable_path.display());

    let version = query_version(&executable_path);
    match &version {
        Some(v) => tracing::debug!("Compiler version is {}", v),
        None => tracing::warn!(
            "Could not determine version of {}",
            executable_path.display()
        ),
    }

    Ok(ToolchainInfo::new(executable_path, version))
}

/// Run `<path> --version` and pull out the first `version X.Y.Z`.
pub fn query_version(path: &Path) -> Option<String> {
    let output = Command::new(path).arg("--version").output().ok()?;
    parse_version(&String::from_utf8_lossy(&output.stdout))
}

pub fn parse_version(text: &str) -> Option<String> {
    VERSION_RE
        .captures(text)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
}

/// `true` when `name` is a path rather than a bare program name.
pub fn is_explicit_path(name: &str) -> bool {
    name.contains('/') || name.contains(std::path::MAIN_SEPARATOR)
}

/// Join a relative explicit path onto `base_dir`; bare names and absolute
/// paths are returned unchanged.
pub fn resolve_program(name: &str, base_dir: &Path) -> PathBuf {
    let path = Path::new(name);
    if is_explicit_path(name) && path.is_relative() {
        base_dir.join(path)
    } else {
        path.to_path_buf()
    }
}

fn find_executable(compiler: &str, base_dir: &Path) -> Result<PathBuf, ToolchainError> {
    // Explicit paths skip the PATH search entirely
    if is_explicit_path(compiler) {
        let path = resolve_program(compiler, base_dir);
        if path.is_file() {
            return Ok(path.canonicalize()?);
        }
        return Err(ToolchainError::NotFound(path.display().to_string()));
    }

    find_on_path(compiler)
}

#[cfg(not(windows))]
fn find_on_path(compiler: &str) -> Result<PathBuf, ToolchainError> {
    let output = Command::new("which").arg(compiler).output()?;
    if !output.status.success() {
        return Err(ToolchainError::NotFound(compiler.to_string()));
    }

    let path_str = String::from_utf8_lossy(&output.stdout).trim().to_string();
    if path_str.is_empty() {
        return Err(ToolchainError::NotFound(compiler.to_string()));
    }
    Ok(PathBuf::from(path_str))
}

#[cfg(windows)]
fn find_on_path(_compiler: &str) -> Result<PathBuf, ToolchainError> {
    Err(ToolchainError::PlatformUnsupported("windows"))
}
