//! Command-line interface

use crate::config::Config;
use crate::engines::EngineRegistry;
use crate::pipeline::Pipeline;
use crate::report::{PdfReportGenerator, LOCAL_REPORT_NAME};
use crate::segmentation::RegionOrder;
use crate::source::{ImageSource, LocalFile};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// File extensions picked up by `scan`
pub const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "bmp", "tiff", "tif"];

#[derive(Parser, Debug)]
#[command(name = "pii-discovery")]
#[command(about = "Find personal data in scanned document images")]
#[command(version)]
pub struct Args {
    #[command(subcommand)]
    pub command: Option<Command>,

    /// Host address to bind to
    #[arg(long, global = true, env = "PII_HOST", default_value = "127.0.0.1")]
    pub host: String,

    /// Port to listen on
    #[arg(long, global = true, env = "PII_PORT", default_value = "5000")]
    pub port: u16,

    /// Text recognition engine (ocrs, leptess); first compiled engine if unset
    #[arg(long, global = true, env = "PII_ENGINE")]
    pub engine: Option<String>,

    /// Recognition languages as ISO 639-1 codes, comma separated
    #[arg(
        long,
        global = true,
        env = "PII_LANGUAGES",
        value_delimiter = ',',
        default_values = ["en", "es"]
    )]
    pub languages: Vec<String>,

    /// Language used for PII analysis
    #[arg(long, global = true, env = "PII_ANALYSIS_LANGUAGE", default_value = "en")]
    pub analysis_language: String,

    /// Maximum upload size in bytes (default: 50MB)
    #[arg(long, global = true, env = "PII_MAX_FILE_SIZE", default_value = "52428800")]
    pub max_file_size: usize,

    /// Recognized fragments at or below this confidence are discarded
    #[arg(long, global = true, env = "PII_MIN_FRAGMENT_CONFIDENCE", default_value = "0.25")]
    pub min_fragment_confidence: f32,

    /// Text regions must be wider than this (pixels)
    #[arg(long, global = true, env = "PII_MIN_REGION_WIDTH", default_value = "50")]
    pub min_region_width: u32,

    /// Text regions must be taller than this (pixels)
    #[arg(long, global = true, env = "PII_MIN_REGION_HEIGHT", default_value = "20")]
    pub min_region_height: u32,

    /// Order in which regions are read
    #[arg(long, global = true, env = "PII_REGION_ORDER", value_enum, default_value = "discovery")]
    pub region_order: RegionOrder,

    /// Entities scoring below this are left out of records
    #[arg(long, global = true, env = "PII_SCORE_THRESHOLD", default_value = "0.0")]
    pub score_threshold: f32,

    /// Per-image processing timeout in seconds
    #[arg(long, global = true, env = "PII_IMAGE_TIMEOUT", default_value = "120")]
    pub image_timeout: u64,

    /// Images processed concurrently within a batch
    #[arg(long, global = true, env = "PII_MAX_CONCURRENT_IMAGES", default_value = "1")]
    pub max_concurrent_images: usize,

    /// Directory reports are written to
    #[arg(long, global = true, env = "PII_REPORT_DIR", default_value = ".")]
    pub report_dir: PathBuf,

    /// TOML file with extra pattern recognizers
    #[arg(long, global = true, env = "PII_PATTERNS_FILE")]
    pub patterns_file: Option<PathBuf>,

    /// Path to tessdata directory (uses TESSDATA_PREFIX env var if not set)
    #[arg(long, global = true, env = "TESSDATA_PREFIX")]
    pub tessdata_path: Option<String>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, global = true, env = "RUST_LOG", default_value = "info")]
    pub log_level: String,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Run the HTTP server (default)
    Serve,
    /// Scan a directory of images and write a PDF report
    Scan {
        /// Directory searched recursively for images
        directory: PathBuf,

        /// Report file name
        #[arg(long, default_value = LOCAL_REPORT_NAME)]
        report: String,
    },
}

/// Image files under `dir`, recursively, sorted by path.
/// Symlinks to files are included; symlinks to directories are skipped.
pub fn collect_images(dir: &Path) -> std::io::Result<Vec<PathBuf>> {
    let mut found = Vec::new();
    let mut pending = vec![dir.to_path_buf()];

    while let Some(current) = pending.pop() {
        for entry in std::fs::read_dir(&current)? {
            let entry = entry?;
            // Symlinked directories are not followed
            let file_type = entry.file_type()?;
            let path = entry.path();
            if file_type.is_dir() {
                pending.push(path);
            } else if is_image(&path) && path.is_file() {
                found.push(path);
            }
        }
    }

    found.sort();
    Ok(found)
}

fn is_image(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| IMAGE_EXTENSIONS.contains(&e.to_ascii_lowercase().as_str()))
        .unwrap_or(false)
}

/// Process every image under `directory` and write a report
pub async fn run_scan(config: Config, directory: &Path, report: &str) -> anyhow::Result<PathBuf> {
    let reports = PdfReportGenerator::new(&config.report_dir);
    // Fail on a bad report name before any image is processed
    reports.path_for(report)?;

    let images = collect_images(directory)?;
    tracing::info!("Found {} images under {}", images.len(), directory.display());

    let engines = EngineRegistry::new(&config)?;
    let pipeline = Arc::new(Pipeline::from_config(&config, &engines)?);

    let sources: Vec<Box<dyn ImageSource>> = images
        .into_iter()
        .map(|path| Box::new(LocalFile::new(path)) as Box<dyn ImageSource>)
        .collect();
    let outcome = pipeline.process_batch(sources).await;

    for failure in &outcome.errors {
        tracing::error!(
            "{} failed ({:?}): {}",
            failure.image_name,
            failure.kind,
            failure.message
        );
    }

    let path = reports.generate(report, &outcome.records, &outcome.errors)?;
    Ok(path)
}
