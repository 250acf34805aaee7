//! Fixtures for build tests: a throwaway project and a shell-script compiler.
//!
//! The fake compiler copies sources to objects, concatenates objects when
//! linking, fails on sources containing `BROKEN` and on link inputs containing
//! `LINKFAIL`. Every invocation is appended to `calls.log` beside the script.

use crate::config::{BuildConfig, FailurePolicy, FlagSet};
use std::fs;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

use super::discovery::{self, SourceFile};

pub const FAKE_COMPILER: &str = include_str!("../../tests/fixtures/fakecc.sh");

pub fn write_fake_compiler(dir: &Path) -> PathBuf {
    let path = dir.join("fakecc");
    fs::write(&path, FAKE_COMPILER).unwrap();
    fs::set_permissions(&path, fs::Permissions::from_mode(0o755)).unwrap();
    path
}

fn calls(dir: &Path) -> Vec<String> {
    fs::read_to_string(dir.join("calls.log"))
        .unwrap_or_default()
        .lines()
        .map(str::to_string)
        .collect()
}

pub fn compile_calls(dir: &Path) -> Vec<String> {
    calls(dir)
        .into_iter()
        .filter(|c| c.starts_with("-c "))
        .collect()
}

pub fn link_calls(dir: &Path) -> Vec<String> {
    calls(dir)
        .into_iter()
        .filter(|c| c.starts_with("-o "))
        .collect()
}

pub struct FakeProject {
    dir: TempDir,
    compiler: PathBuf,
}

impl FakeProject {
    pub fn new() -> Self {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir_all(dir.path().join("src")).unwrap();
        let compiler = write_fake_compiler(dir.path());
        Self { dir, compiler }
    }

    pub fn root(&self) -> &Path {
        self.dir.path()
    }

    pub fn src_dir(&self) -> PathBuf {
        self.root().join("src")
    }

    pub fn source(&self, rel: &str, body: &str) -> PathBuf {
        let path = self.src_dir().join(rel);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(&path, body).unwrap();
        path
    }

    pub fn config(&self, workers: usize) -> BuildConfig {
        BuildConfig {
            project_dir: self.root().to_path_buf(),
            compiler: self.compiler.clone(),
            linker: self.compiler.clone(),
            compile_flags: FlagSet::default(),
            link_flags: FlagSet::default(),
            source_roots: vec![self.src_dir()],
            extensions: vec![".cpp".to_string()],
            output_dir: self.root().join("build"),
            executable_name: "app".to_string(),
            workers,
            policy: FailurePolicy::Strict,
            sort_sources: true,
            clean_output_dir: false,
            compile_commands: false,
        }
    }

    /// Discover sources and create the object directory.
    pub fn discover(&self, config: &BuildConfig) -> Vec<SourceFile> {
        fs::create_dir_all(config.object_dir()).unwrap();
        discovery::discover(
            &config.source_roots,
            &config.extensions,
            &config.project_dir,
            &config.object_dir(),
            config.sort_sources,
        )
    }
}
