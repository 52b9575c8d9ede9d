//! Image sources: where the bytes of one document image come from

use crate::error::PipelineError;
use image::DynamicImage;
use std::path::PathBuf;

/// Largest remote image body accepted by default
pub const DEFAULT_MAX_REMOTE_BYTES: u64 = 50 * 1024 * 1024;

/// Something that can produce one decoded image.
///
/// Loading is blocking; the pipeline calls it from a blocking task.
pub trait ImageSource: Send + Sync {
    /// Name used for the document record
    fn name(&self) -> &str;

    /// Fetch and decode the image, normalized to 8-bit RGB
    fn load(&self) -> Result<DynamicImage, PipelineError>;
}

/// Decode encoded image bytes (PNG, JPEG, BMP, TIFF, ...)
pub fn decode(bytes: &[u8]) -> Result<DynamicImage, PipelineError> {
    let image = image::load_from_memory(bytes)
        .map_err(|e| PipelineError::DecodeFailure(e.to_string()))?;
    Ok(DynamicImage::ImageRgb8(image.to_rgb8()))
}

/// Image file on the local filesystem
pub struct LocalFile {
    name: String,
    path: PathBuf,
}

impl LocalFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        Self { name, path }
    }
}

impl ImageSource for LocalFile {
    fn name(&self) -> &str {
        &self.name
    }

    fn load(&self) -> Result<DynamicImage, PipelineError> {
        let bytes = std::fs::read(&self.path).map_err(|e| {
            PipelineError::FetchFailure(format!("{}: {}", self.path.display(), e))
        })?;
        decode(&bytes)
    }
}

/// Image bytes already held in memory, e.g. an uploaded file
pub struct MemoryImage {
    name: String,
    bytes: Vec<u8>,
}

impl MemoryImage {
    pub fn new(name: impl Into<String>, bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            name: name.into(),
            bytes: bytes.into(),
        }
    }
}

impl ImageSource for MemoryImage {
    fn name(&self) -> &str {
        &self.name
    }

    fn load(&self) -> Result<DynamicImage, PipelineError> {
        decode(&self.bytes)
    }
}

/// Image fetched over HTTP(S)
pub struct RemoteImage {
    name: String,
    url: String,
    max_bytes: u64,
}

impl RemoteImage {
    pub fn new(url: impl Into<String>) -> Self {
        let url = url.into();
        Self {
            name: name_from_url(&url),
            url,
            max_bytes: DEFAULT_MAX_REMOTE_BYTES,
        }
    }

    /// Object `key` in a bucket served at `https://{bucket_host}/{key}`
    pub fn from_object(bucket_host: &str, key: &str) -> Self {
        Self::new(format!(
            "https://{}/{}",
            bucket_host.trim_end_matches('/'),
            key.trim_start_matches('/')
        ))
    }

    pub fn with_max_bytes(mut self, max_bytes: u64) -> Self {
        self.max_bytes = max_bytes;
        self
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

impl ImageSource for RemoteImage {
    fn name(&self) -> &str {
        &self.name
    }

    fn load(&self) -> Result<DynamicImage, PipelineError> {
        tracing::debug!("Fetching {}", self.url);

        let response = ureq::get(&self.url).call().map_err(|e| match e {
            ureq::Error::StatusCode(status) => {
                PipelineError::FetchFailure(format!("{} returned HTTP {}", self.url, status))
            }
            other => PipelineError::FetchFailure(format!("{}: {}", self.url, other)),
        })?;

        let bytes = response
            .into_body()
            .with_config()
            .limit(self.max_bytes)
            .read_to_vec()
            .map_err(|e| PipelineError::FetchFailure(format!("{}: {}", self.url, e)))?;

        decode(&bytes)
    }
}

/// Last path segment of a URL, without query or fragment
fn name_from_url(url: &str) -> String {
    let path = url.split(['?', '#']).next().unwrap_or(url);
    let path = path.split_once("://").map(|(_, rest)| rest).unwrap_or(path);
    match path.split_once('/') {
        Some((host, tail)) => tail
            .rsplit('/')
            .find(|segment| !segment.is_empty())
            .unwrap_or(host)
            .to_string(),
        None => path.to_string(),
    }
}
