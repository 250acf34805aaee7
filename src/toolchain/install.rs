//! External tool installer.
//!
//! Some projects need a helper executable (an assembler, a code generator)
//! that is not part of the compiler toolchain. Each `[[tools]]` entry names a
//! zip archive and the executable expected inside it; if the executable is
//! missing the archive is downloaded once and extracted in place.

use crate::config::ToolConfig;
use anyhow::{Context, Result};
use indicatif::{ProgressBar, ProgressStyle};
use std::fs::{self, File};
use std::io::{Read, Write};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ToolStatus {
    AlreadyPresent(PathBuf),
    Installed(PathBuf),
}

impl ToolStatus {
    pub fn path(&self) -> &Path {
        match self {
            ToolStatus::AlreadyPresent(p) | ToolStatus::Installed(p) => p,
        }
    }
}

/// Per-OS directory name used inside tool archives.
pub fn platform_dir() -> &'static str {
    if cfg!(target_os = "windows") {
        "win"
    } else if cfg!(target_os = "macos") {
        "mac"
    } else {
        "linux"
    }
}

/// Where the tool's executable should live once installed.
pub fn executable_path(tool: &ToolConfig, base_dir: &Path) -> PathBuf {
    base_dir
        .join(&tool.dir)
        .join(tool.executable.replace("{platform}", platform_dir()))
}

fn archive_path(tool: &ToolConfig, tool_dir: &Path) -> PathBuf {
    let from_url = tool
        .url
        .split(['?', '#'])
        .next()
        .and_then(|u| u.rsplit('/').next())
        .filter(|name| name.ends_with(".zip"));

    match from_url {
        Some(name) => tool_dir.join(name),
        None => tool_dir.join(format!("{}.zip", tool.name)),
    }
}

/// Make sure `tool` exists under `base_dir`, downloading it if needed.
pub fn ensure_tool(tool: &ToolConfig, base_dir: &Path) -> Result<ToolStatus> {
    let exe = executable_path(tool, base_dir);
    if exe.is_file() {
        tracing::debug!("{} found at {}", tool.name, exe.display());
        return Ok(ToolStatus::AlreadyPresent(exe));
    }

    let tool_dir = base_dir.join(&tool.dir);
    fs::create_dir_all(&tool_dir)
        .with_context(|| format!("Failed to create {}", tool_dir.display()))?;

    let zip_path = archive_path(tool, &tool_dir);
    if !zip_path.is_file() {
        tracing::info!("Downloading {} from {}", tool.name, tool.url);
        download_file(&tool.url, &zip_path)?;
    }

    tracing::info!("Extracting {}", zip_path.display());
    extract_zip(&zip_path, &tool_dir)?;

    if !exe.is_file() {
        anyhow::bail!(
            "{} is not in {} after extraction",
            exe.display(),
            zip_path.display()
        );
    }

    tracing::info!("{} installed at {}", tool.name, exe.display());
    Ok(ToolStatus::Installed(exe))
}

fn download_file(url: &str, path: &Path) -> Result<()> {
    let response = ureq::get(url)
        .call()
        .map_err(|e| anyhow::anyhow!("Download failed: {}", e))?;

    let total_size = response
        .headers()
        .get("content-length")
        .and_then(|v| v.to_str().ok())
        .and_then(|s| s.parse::<u64>().ok())
        .unwrap_or(0);

    let pb = ProgressBar::new(total_size);
    pb.set_style(ProgressStyle::default_bar()
        .template("{spinner:.blue} [{elapsed_precise}] [{bar:40.green/black}] {bytes}/{total_bytes} ({eta})")
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .tick_chars("◐◓◑◒")
        .progress_chars("━━╸"));

    // Only complete downloads land at `path`
    let partial = path.with_extension("zip.part");
    let mut file = File::create(&partial)
        .with_context(|| format!("Failed to create {}", partial.display()))?;
    let mut reader = response.into_body().into_reader();
    let mut buffer = [0; 8192];

    loop {
        let n = reader.read(&mut buffer)?;
        if n == 0 {
            break;
        }
        file.write_all(&buffer[..n])?;
        pb.inc(n as u64);
    }
    file.flush()?;
    drop(file);

    fs::rename(&partial, path)?;
    pb.finish_with_message("Download complete");
    Ok(())
}

fn extract_zip(archive_path: &Path, target_dir: &Path) -> Result<()> {
    let file = File::open(archive_path)
        .with_context(|| format!("Failed to open {}", archive_path.display()))?;
    let mut archive = zip::ZipArchive::new(file)?;

    for i in 0..archive.len() {
        let mut file = archive.by_index(i)?;
        let outpath = match file.enclosed_name() {
            Some(path) => target_dir.join(path),
            None => continue,
        };

        if file.name().ends_with('/') {
            fs::create_dir_all(&outpath)?;
        } else {
            if let Some(p) = outpath.parent()
                && !p.exists()
            {
                fs::create_dir_all(p)?;
            }
            let mut outfile = File::create(&outpath)?;
            std::io::copy(&mut file, &mut outfile)?;

            #[cfg(unix)]
            if let Some(mode) = file.unix_mode() {
                use std::os::unix::fs::PermissionsExt;
                fs::set_permissions(&outpath, fs::Permissions::from_mode(mode))?;
            }
        }
    }
    Ok(())
}
