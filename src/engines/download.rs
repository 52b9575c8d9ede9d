//! Model and traineddata download helpers shared by the engines

use crate::error::PipelineError;
use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};

/// Cache directory for downloaded engine assets
pub fn cache_dir(subdir: Option<&str>) -> Result<PathBuf, PipelineError> {
    let mut dir = dirs::cache_dir()
        .unwrap_or_else(std::env::temp_dir)
        .join("pii-discovery");
    if let Some(subdir) = subdir {
        dir = dir.join(subdir);
    }

    std::fs::create_dir_all(&dir).map_err(|e| {
        PipelineError::InitializationError(format!("Failed to create cache directory: {}", e))
    })?;

    Ok(dir)
}

/// Ensure `filename` exists in `dir`, downloading it from `url` if needed
pub fn ensure_downloaded(url: &str, dir: &Path, filename: &str) -> Result<PathBuf, PipelineError> {
    let path = dir.join(filename);

    if !path.exists() {
        tracing::info!("Downloading {} (this may take a moment)...", filename);
        download_file(url, &path)?;
        tracing::info!("Downloaded {} to {:?}", filename, path);
    } else {
        tracing::info!("Using cached {} from {:?}", filename, path);
    }

    Ok(path)
}

/// Download a file from URL to path using ureq
fn download_file(url: &str, path: &Path) -> Result<(), PipelineError> {
    let response = ureq::get(url).call().map_err(|e| {
        PipelineError::InitializationError(format!("Failed to download {}: {}", url, e))
    })?;

    let buffer = response
        .into_body()
        .with_config()
        .limit(512 * 1024 * 1024)
        .read_to_vec()
        .map_err(|e| {
            PipelineError::InitializationError(format!("Failed to read response body: {}", e))
        })?;

    // Only complete downloads may appear under the final name
    let partial = path.with_extension("partial");
    let mut file = File::create(&partial).map_err(|e| {
        PipelineError::InitializationError(format!("Failed to create {:?}: {}", partial, e))
    })?;
    file.write_all(&buffer).map_err(|e| {
        PipelineError::InitializationError(format!("Failed to write {:?}: {}", partial, e))
    })?;
    std::fs::rename(&partial, path).map_err(|e| {
        PipelineError::InitializationError(format!("Failed to move {:?}: {}", partial, e))
    })?;

    Ok(())
}
