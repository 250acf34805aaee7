//! Build artifact cleanup.
//!
//! - `kiln clean` removes the whole build directory
//! - `clean = true` in `[build]` empties it before every build

use anyhow::{Context, Result};
use colored::*;

use std::fs;
use std::path::Path;

/// Remove `build_dir` entirely. Returns whether anything was removed.
pub fn clean(build_dir: &Path) -> Result<bool> {
    if !build_dir.exists() {
        println!("{} Nothing to clean", "!".yellow());
        return Ok(false);
    }

    fs::remove_dir_all(build_dir)
        .with_context(|| format!("Failed to remove {}", build_dir.display()))?;
    println!("{} Removed {}", "✓".green(), build_dir.display());
    Ok(true)
}

/// Delete everything inside `dir` but keep the directory itself.
pub fn clean_output_dir(dir: &Path) -> std::io::Result<()> {
    if !dir.is_dir() {
        return Ok(());
    }

    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        tracing::debug!("Removing {}", path.display());
        if path.is_dir() {
            fs::remove_dir_all(&path)?;
        } else {
            fs::remove_file(&path)?;
        }
    }
    Ok(())
}
