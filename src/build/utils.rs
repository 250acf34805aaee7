use crate::config::KilnConfig;
use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};

/// A parsed `kiln.toml` and the directory its relative paths resolve against.
#[derive(Debug, Clone)]
pub struct Project {
    pub config: KilnConfig,
    pub dir: PathBuf,
}

// --- Helper: Load Config ---
pub fn load_config(manifest: &Path) -> Result<Project> {
    if !manifest.exists() {
        return Err(anyhow::anyhow!(
            "{} not found.\n\n\
            💡 Tip: create one with a [package] name and a [build] section, \
            or pass --manifest <path>.",
            manifest.display()
        ));
    }

    let config_str = fs::read_to_string(manifest)
        .with_context(|| format!("Failed to read {}", manifest.display()))?;
    let config = parse_config(&config_str)
        .with_context(|| format!("Failed to parse {}", manifest.display()))?;

    let manifest = manifest
        .canonicalize()
        .with_context(|| format!("Failed to resolve {}", manifest.display()))?;
    let dir = manifest
        .parent()
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from("."));

    Ok(Project { config, dir })
}

pub fn parse_config(text: &str) -> Result<KilnConfig> {
    let config: KilnConfig =
        toml::from_str(text).context("check for syntax errors (missing quotes, brackets)")?;

    if config.package.name.trim().is_empty() && config.build.bin.is_none() {
        anyhow::bail!("[package] name must not be empty");
    }
    if config.build.extensions.is_empty() {
        tracing::warn!("No source extensions configured; nothing will be compiled.");
    }

    Ok(config)
}
