//! `compile_commands.json` for editors and clangd.

use anyhow::{Context, Result};
use serde_json::{Value, json};
use std::fs;
use std::path::{Path, PathBuf};

use super::discovery::SourceFile;
use super::scheduler::compile_command;

pub fn entries(directory: &Path, compiler: &Path, flags: &[String], sources: &[SourceFile]) -> Vec<Value> {
    let directory = directory.to_string_lossy();
    sources
        .iter()
        .map(|src| {
            json!({
                "directory": directory,
                "arguments": compile_command(compiler, flags, src),
                "file": src.path.to_string_lossy(),
                "output": src.object_path.to_string_lossy(),
            })
        })
        .collect()
}

/// Write the database into `output_dir`, returning its path.
pub fn write_compile_commands(output_dir: &Path, entries: &[Value]) -> Result<PathBuf> {
    let path = output_dir.join("compile_commands.json");
    let json_str = serde_json::to_string_pretty(entries)?;
    fs::write(&path, json_str).with_context(|| format!("Failed to write {}", path.display()))?;
    Ok(path)
}
