//! Shared fixtures: a temp project with a `kiln.toml` pointing at a
//! shell-script compiler.
//!
//! The fake compiler copies sources to objects and concatenates objects when
//! linking. Sources containing `BROKEN` fail to compile; objects containing
//! `LINKFAIL` fail to link. Every call is appended to `calls.log`.

#![allow(dead_code)]

use std::fs;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

const FAKE_COMPILER: &str = include_str!("../fixtures/fakecc.sh");

pub struct TestProject {
    dir: TempDir,
}

impl TestProject {
    /// Project named `app` with sources under `src/` and `extra` appended to `[build]`.
    pub fn new(extra_build: &str) -> Self {
        let dir = tempfile::tempdir().expect("Failed to create temp dir");
        let root = dir.path();
        fs::create_dir_all(root.join("src")).unwrap();

        let cc = root.join("fakecc");
        fs::write(&cc, FAKE_COMPILER).unwrap();
        fs::set_permissions(&cc, fs::Permissions::from_mode(0o755)).unwrap();

        let manifest = format!(
            r#"[package]
name = "app"

[build]
compiler = "{cc}"
{extra_build}

[build.flags]
base = ["-Wall"]
debug = ["-g", "-O0"]
release = ["-O3"]

[build.link_flags]
base = []
debug = ["-g"]
release = ["-O3"]
"#,
            cc = cc.display()
        );
        fs::write(root.join("kiln.toml"), manifest).unwrap();

        Self { dir }
    }

    pub fn root(&self) -> &Path {
        self.dir.path()
    }

    pub fn manifest(&self) -> PathBuf {
        self.root().join("kiln.toml")
    }

    /// Point `compiler` at `value` instead of the absolute script path.
    pub fn set_compiler(&self, value: &str) {
        let text = fs::read_to_string(self.manifest()).unwrap();
        let text = text
            .lines()
            .map(|line| {
                if line.starts_with("compiler = ") {
                    format!("compiler = \"{}\"", value)
                } else {
                    line.to_string()
                }
            })
            .collect::<Vec<_>>()
            .join("\n");
        fs::write(self.manifest(), text + "\n").unwrap();
    }

    /// Append whole tables (e.g. `[[tools]]`) after the generated ones.
    pub fn append_manifest(&self, extra: &str) {
        let mut text = fs::read_to_string(self.manifest()).unwrap();
        text.push_str(extra);
        fs::write(self.manifest(), text).unwrap();
    }

    pub fn source(&self, rel: &str, body: &str) -> PathBuf {
        let path = self.root().join("src").join(rel);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(&path, body).unwrap();
        path
    }

    pub fn exe(&self) -> PathBuf {
        self.root().join("build").join("app")
    }

    fn calls(&self) -> Vec<String> {
        fs::read_to_string(self.root().join("calls.log"))
            .unwrap_or_default()
            .lines()
            .map(str::to_string)
            .collect()
    }

    pub fn compile_calls(&self) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter(|c| c.starts_with("-c "))
            .collect()
    }

    pub fn link_calls(&self) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter(|c| c.starts_with("-o "))
            .collect()
    }
}
