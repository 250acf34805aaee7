//! Project configuration (`kiln.toml`).
//!
//! [`KilnConfig`] mirrors the file on disk. [`BuildConfig`] is the resolved,
//! immutable view the build pipeline works from: paths are absolute, flag
//! lists are never absent, and the toolchain has been located.

use crate::toolchain::{ToolchainInfo, resolve_program};
use serde::Deserialize;
use std::fmt;
use std::path::{Path, PathBuf};

#[derive(Deserialize, Debug, Default, Clone)]
pub struct KilnConfig {
    pub package: PackageConfig,
    #[serde(default)]
    pub build: BuildSection,
    #[serde(default)]
    pub tools: Vec<ToolConfig>,
}

#[derive(Deserialize, Debug, Default, Clone)]
pub struct PackageConfig {
    pub name: String,
}

#[derive(Deserialize, Debug, Clone)]
pub struct BuildSection {
    #[serde(default = "default_compiler")]
    pub compiler: String,
    /// Defaults to the located compiler driver
    pub linker: Option<String>,
    #[serde(default = "default_sources")]
    pub sources: Vec<String>,
    #[serde(default = "default_extensions")]
    pub extensions: Vec<String>,
    #[serde(default = "default_build_dir")]
    pub build_dir: String,
    pub bin: Option<String>,
    pub jobs: Option<usize>,
    #[serde(default)]
    pub clean: bool,
    #[serde(default)]
    pub keep_going: bool,
    #[serde(default = "default_true")]
    pub sort_sources: bool,
    #[serde(default)]
    pub compile_commands: bool,
    pub flags: Option<FlagTable>,
    pub link_flags: Option<FlagTable>,
}

impl Default for BuildSection {
    fn default() -> Self {
        Self {
            compiler: default_compiler(),
            linker: None,
            sources: default_sources(),
            extensions: default_extensions(),
            build_dir: default_build_dir(),
            bin: None,
            jobs: None,
            clean: false,
            keep_going: false,
            sort_sources: true,
            compile_commands: false,
            flags: None,
            link_flags: None,
        }
    }
}

/// A flag table as written in the file; any list may be missing.
#[derive(Deserialize, Debug, Default, Clone)]
pub struct FlagTable {
    pub base: Option<Vec<String>>,
    pub debug: Option<Vec<String>>,
    pub release: Option<Vec<String>>,
}

/// An external tool that must be present before building.
#[derive(Deserialize, Debug, Clone)]
pub struct ToolConfig {
    pub name: String,
    pub url: String,
    /// Directory the archive is downloaded to and extracted into
    #[serde(default = "default_tools_dir")]
    pub dir: String,
    /// Executable path relative to `dir`; `{platform}` expands to linux/win/mac
    pub executable: String,
    #[serde(default)]
    pub required: bool,
}

fn default_compiler() -> String {
    "clang++".to_string()
}

fn default_sources() -> Vec<String> {
    vec!["src".to_string()]
}

fn default_extensions() -> Vec<String> {
    vec![".cpp".to_string()]
}

fn default_build_dir() -> String {
    "build".to_string()
}

fn default_tools_dir() -> String {
    "tools".to_string()
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BuildMode {
    #[default]
    Debug,
    Release,
}

impl fmt::Display for BuildMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BuildMode::Debug => write!(f, "debug"),
            BuildMode::Release => write!(f, "release"),
        }
    }
}

/// What to do when some, but not all, sources fail to compile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FailurePolicy {
    /// Any compile failure aborts before linking
    #[default]
    Strict,
    /// Link whatever compiled
    KeepGoing,
}

/// Base flags plus one overlay per build mode. Lists are never absent.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FlagSet {
    pub base: Vec<String>,
    pub debug: Vec<String>,
    pub release: Vec<String>,
}

impl FlagSet {
    /// Fill in missing lists, logging under `what` ("compiler" / "linker").
    pub fn from_table(table: Option<&FlagTable>, what: &str) -> Self {
        let Some(table) = table else {
            tracing::warn!("No {} flags specified.", what);
            return Self::default();
        };

        let base = table.base.clone().unwrap_or_else(|| {
            tracing::warn!("No {} base flags specified.", what);
            Vec::new()
        });
        let debug = table.debug.clone().unwrap_or_else(|| {
            tracing::debug!("No {} debug flags specified.", what);
            Vec::new()
        });
        let release = table.release.clone().unwrap_or_else(|| {
            tracing::debug!("No {} release flags specified.", what);
            Vec::new()
        });

        Self {
            base,
            debug,
            release,
        }
    }

    pub fn overlay(&self, mode: BuildMode) -> &[String] {
        match mode {
            BuildMode::Debug => &self.debug,
            BuildMode::Release => &self.release,
        }
    }

    /// `base ++ overlay(mode)`
    pub fn resolve(&self, mode: BuildMode) -> Vec<String> {
        let overlay = self.overlay(mode);
        let mut flags = Vec::with_capacity(self.base.len() + overlay.len());
        flags.extend(self.base.iter().cloned());
        flags.extend(overlay.iter().cloned());
        flags
    }
}

/// Composed flags for one build mode.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedFlags {
    pub compile: Vec<String>,
    pub link: Vec<String>,
}

pub fn resolve_flags(config: &BuildConfig, mode: BuildMode) -> ResolvedFlags {
    ResolvedFlags {
        compile: config.compile_flags.resolve(mode),
        link: config.link_flags.resolve(mode),
    }
}

/// Values from the command line that win over `kiln.toml`.
#[derive(Debug, Clone, Default)]
pub struct BuildOverrides {
    pub jobs: Option<usize>,
    pub keep_going: bool,
    pub compile_commands: bool,
}

/// Resolved configuration for one build invocation.
#[derive(Debug, Clone)]
pub struct BuildConfig {
    pub project_dir: PathBuf,
    pub compiler: PathBuf,
    pub linker: PathBuf,
    pub compile_flags: FlagSet,
    pub link_flags: FlagSet,
    pub source_roots: Vec<PathBuf>,
    pub extensions: Vec<String>,
    pub output_dir: PathBuf,
    pub executable_name: String,
    pub workers: usize,
    pub policy: FailurePolicy,
    pub sort_sources: bool,
    pub clean_output_dir: bool,
    pub compile_commands: bool,
}

impl BuildConfig {
    /// Build the resolved config. Relative paths are joined onto `project_dir`.
    pub fn resolve(
        config: &KilnConfig,
        project_dir: &Path,
        toolchain: &ToolchainInfo,
        overrides: &BuildOverrides,
    ) -> Self {
        let build = &config.build;

        let linker = match &build.linker {
            Some(linker) => resolve_program(linker, project_dir),
            None => toolchain.executable_path.clone(),
        };

        let executable_name = build
            .bin
            .clone()
            .unwrap_or_else(|| config.package.name.clone());
        let executable_name = if cfg!(target_os = "windows") && !executable_name.ends_with(".exe")
        {
            format!("{}.exe", executable_name)
        } else {
            executable_name
        };

        let workers = overrides
            .jobs
            .or(build.jobs)
            .unwrap_or_else(default_workers)
            .max(1);

        let policy = if overrides.keep_going || build.keep_going {
            FailurePolicy::KeepGoing
        } else {
            FailurePolicy::Strict
        };

        Self {
            project_dir: project_dir.to_path_buf(),
            compiler: toolchain.executable_path.clone(),
            linker,
            compile_flags: FlagSet::from_table(build.flags.as_ref(), "compiler"),
            link_flags: FlagSet::from_table(build.link_flags.as_ref(), "linker"),
            source_roots: build
                .sources
                .iter()
                .map(|s| project_dir.join(s))
                .collect(),
            extensions: build.extensions.clone(),
            output_dir: project_dir.join(&build.build_dir),
            executable_name,
            workers,
            policy,
            sort_sources: build.sort_sources,
            clean_output_dir: build.clean,
            compile_commands: overrides.compile_commands || build.compile_commands,
        }
    }

    pub fn executable_path(&self) -> PathBuf {
        self.output_dir.join(&self.executable_name)
    }

    pub fn object_dir(&self) -> PathBuf {
        self.output_dir.join("obj")
    }
}

/// Host parallelism, at least one.
pub fn default_workers() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1)
        .max(1)
}
