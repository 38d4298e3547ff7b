//! Downloads of story PDFs and cover images from Google Drive.

use std::path::{Path, PathBuf};
use std::time::Duration;

use thiserror::Error;

use crate::config::Settings;
use crate::drive;
use crate::http_client::HttpClient;
use crate::rate_limit::linear_delay;

/// Errors from fetching story assets.
#[derive(Debug, Error)]
pub enum AssetError {
    #[error("Could not extract file ID from URL: {0}")]
    NoFileId(String),

    #[error("All download attempts failed after {attempts} tries")]
    DownloadFailed { attempts: u32 },

    #[error("Failed to download image: {0}")]
    ImageDownload(String),

    #[error("Downloaded file is not a valid image")]
    NotAnImage,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Where a story's cover image came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CoverSource {
    /// Already present in the bundle directory.
    Cached(PathBuf),
    /// Freshly downloaded into the temp directory.
    Downloaded(PathBuf),
}

impl CoverSource {
    pub fn path(&self) -> &Path {
        match self {
            CoverSource::Cached(p) | CoverSource::Downloaded(p) => p,
        }
    }
}

/// Existing `cover.*` file in a bundle directory.
pub fn find_cover(dir: &Path) -> Option<PathBuf> {
    let mut covers: Vec<PathBuf> = std::fs::read_dir(dir)
        .ok()?
        .filter_map(|e| e.ok())
        .map(|e| e.path())
        .filter(|p| {
            p.is_file()
                && p.file_stem().and_then(|s| s.to_str()) == Some("cover")
                && p.extension().is_some()
        })
        .collect();
    covers.sort();
    covers.into_iter().next()
}

/// Image file extension sniffed from magic bytes.
pub fn image_extension(bytes: &[u8]) -> Option<&'static str> {
    infer::get(bytes)
        .filter(|kind| kind.matcher_type() == infer::MatcherType::Image)
        .map(|kind| kind.extension())
}

/// Fetches story assets into a scratch directory.
pub struct AssetFetcher {
    client: HttpClient,
    temp_dir: PathBuf,
    download_base: String,
    attempts: u32,
    retry_step: Duration,
    pause: Duration,
}

impl AssetFetcher {
    pub fn new(client: HttpClient, settings: &Settings) -> Self {
        Self {
            client,
            temp_dir: settings.temp_dir.clone(),
            download_base: drive::DOWNLOAD_BASE.to_string(),
            attempts: settings.download_attempts.max(1),
            retry_step: Duration::from_secs(3),
            pause: Duration::from_millis(settings.download_pause_ms),
        }
    }

    /// Override retry spacing and the pause after a successful download.
    pub fn with_timing(mut self, retry_step: Duration, pause: Duration) -> Self {
        self.retry_step = retry_step;
        self.pause = pause;
        self
    }

    /// Fetch file contents from another endpoint than Drive's.
    pub fn with_download_base(mut self, base: impl Into<String>) -> Self {
        self.download_base = base.into();
        self
    }

    pub fn temp_dir(&self) -> &Path {
        &self.temp_dir
    }

    /// Download a shared PDF to `dest`.
    ///
    /// Attempt N waits N x 3s before the next one. An empty or HTML body
    /// counts as a failed attempt.
    pub async fn download_pdf(&self, share_url: &str, dest: &Path) -> Result<(), AssetError> {
        let file_id = drive::extract_file_id(share_url)
            .ok_or_else(|| AssetError::NoFileId(share_url.to_string()))?;
        let url = drive::download_url(&self.download_base, &file_id);

        for attempt in 0..self.attempts {
            match self.fetch_pdf_bytes(&url).await {
                Ok(bytes) if !bytes.is_empty() => {
                    tokio::fs::write(dest, &bytes).await?;
                    tracing::debug!("Downloaded {} bytes to {}", bytes.len(), dest.display());
                    tokio::time::sleep(self.pause).await;
                    return Ok(());
                }
                Ok(_) => tracing::warn!("Download attempt {} produced empty file", attempt + 1),
                Err(e) => tracing::warn!("Download attempt {} failed: {}", attempt + 1, e),
            }

            if attempt + 1 < self.attempts {
                let wait = linear_delay(attempt, self.retry_step);
                tracing::info!("Retrying in {:?}...", wait);
                tokio::time::sleep(wait).await;
            }
        }

        Err(AssetError::DownloadFailed {
            attempts: self.attempts,
        })
    }

    async fn fetch_pdf_bytes(&self, url: &str) -> Result<Vec<u8>, String> {
        let response = self.client.get(url).await.map_err(|e| e.to_string())?;
        if !response.is_success() {
            return Err(format!("HTTP {}", response.status));
        }
        if response
            .content_type()
            .is_some_and(|ct| ct.contains("text/html"))
        {
            return Err("Drive returned an HTML page (file not shared?)".to_string());
        }
        response.bytes().await.map_err(|e| e.to_string())
    }

    /// Obtain a story's cover image.
    ///
    /// Unless `force` is set, a `cover.*` already in `story_dir` is reused
    /// without any network access. Downloads land in the temp dir as
    /// `{slug}_cover.{ext}`.
    pub async fn fetch_cover(
        &self,
        share_url: &str,
        slug: &str,
        story_dir: &Path,
        force: bool,
    ) -> Result<CoverSource, AssetError> {
        if !force {
            if let Some(existing) = find_cover(story_dir) {
                tracing::info!("Using existing image: {}", existing.display());
                return Ok(CoverSource::Cached(existing));
            }
        }

        let file_id = drive::extract_file_id(share_url)
            .ok_or_else(|| AssetError::NoFileId(share_url.to_string()))?;

        tokio::fs::create_dir_all(&self.temp_dir).await?;
        let temp_file = self.temp_dir.join(format!("{}_cover_temp", slug));

        tracing::info!("Downloading image from Google Drive...");
        let bytes = self
            .fetch_image_bytes(&drive::download_url(&self.download_base, &file_id))
            .await
            .map_err(AssetError::ImageDownload)?;
        tokio::fs::write(&temp_file, &bytes).await?;

        let Some(ext) = image_extension(&bytes) else {
            let _ = tokio::fs::remove_file(&temp_file).await;
            return Err(AssetError::NotAnImage);
        };

        let final_file = self.temp_dir.join(format!("{}_cover.{}", slug, ext));
        tokio::fs::rename(&temp_file, &final_file).await?;
        tracing::info!("Downloaded image: {}", final_file.display());
        Ok(CoverSource::Downloaded(final_file))
    }

    async fn fetch_image_bytes(&self, url: &str) -> Result<Vec<u8>, String> {
        let response = self.client.get(url).await.map_err(|e| e.to_string())?;
        if !response.is_success() {
            return Err(format!("HTTP {}", response.status));
        }
        response.bytes().await.map_err(|e| e.to_string())
    }

    /// Remove the scratch directory. Errors are ignored.
    pub async fn cleanup(&self) {
        if tokio::fs::metadata(&self.temp_dir).await.is_ok() {
            if let Err(e) = tokio::fs::remove_dir_all(&self.temp_dir).await {
                tracing::debug!("Ignoring temp cleanup error: {}", e);
            }
        }
    }
}
