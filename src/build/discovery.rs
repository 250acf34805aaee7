//! Source discovery.
//!
//! Walks every configured source root and collects files whose name ends in
//! one of the configured extensions. Each source gets an object path derived
//! from its full project-relative path, so `a/util.cpp` and `b/util.cpp`
//! never share an object file.

use std::ffi::OsStr;
use std::path::{Component, Path, PathBuf};
use walkdir::WalkDir;

/// A compilable unit and the object file it compiles to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceFile {
    pub path: PathBuf,
    pub object_path: PathBuf,
}

/// Find sources under `roots`.
///
/// Missing roots are logged and skipped. `project_dir` is stripped from each
/// path before it is encoded into an object name.
pub fn discover(
    roots: &[PathBuf],
    extensions: &[String],
    project_dir: &Path,
    object_dir: &Path,
    sort: bool,
) -> Vec<SourceFile> {
    let mut paths = Vec::new();

    for root in roots {
        tracing::info!("Searching for source files in {}", root.display());

        if !root.is_dir() {
            tracing::error!("Could not find source directory {}", root.display());
            continue;
        }

        for entry in WalkDir::new(root) {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    tracing::warn!("Skipping unreadable entry: {}", e);
                    continue;
                }
            };
            // Symlinks to files count as sources; links into directories are not followed
            let is_file = entry.file_type().is_file()
                || (entry.path_is_symlink() && entry.path().is_file());
            if !is_file {
                continue;
            }

            let name = entry.file_name().to_string_lossy();
            if matches_extension(&name, extensions) {
                tracing::info!("Found {}", entry.path().display());
                paths.push(entry.into_path());
            }
        }
    }

    if sort {
        paths.sort();
    }

    tracing::debug!("Found {} total source files.", paths.len());

    paths
        .into_iter()
        .map(|path| {
            let rel = path.strip_prefix(project_dir).unwrap_or(path.as_path());
            let object_path = object_dir.join(object_file_name(rel));
            SourceFile { path, object_path }
        })
        .collect()
}

/// Exact, case-sensitive suffix match.
pub fn matches_extension(file_name: &str, extensions: &[String]) -> bool {
    extensions.iter().any(|ext| file_name.ends_with(ext.as_str()))
}

/// Encode a source path as a flat object file name.
///
/// `%` becomes `%25`, separators become `%2F` and bytes that are not UTF-8
/// become `%XX`, which keeps the mapping injective. `sub/z.cpp` →
/// `sub%2Fz.cpp.o`.
pub fn object_file_name(rel: &Path) -> String {
    let parts: Vec<String> = rel
        .components()
        .filter_map(|c| match c {
            Component::Normal(s) => Some(encode_component(s)),
            Component::ParentDir => Some("..".to_string()),
            Component::CurDir | Component::RootDir | Component::Prefix(_) => None,
        })
        .collect();

    format!("{}.o", parts.join("%2F"))
}

fn encode_component(name: &OsStr) -> String {
    let mut out = String::new();
    for chunk in name.as_encoded_bytes().utf8_chunks() {
        out.push_str(&chunk.valid().replace('%', "%25"));
        for byte in chunk.invalid() {
            out.push_str(&format!("%{:02X}", byte));
        }
    }
    out
}
