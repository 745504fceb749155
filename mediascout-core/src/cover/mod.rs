//! Cover download, resize and persistence.

mod encode;
mod store;

use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use mediascout_model::{Candidate, MediaFile, Outcome};
use tracing::{debug, error, info};

use crate::error::{Result, ScoutError};
use crate::metadata::tmdb::TMDB_IMAGE_BASE;

pub use encode::encode_cover_jpeg;
pub use store::write_atomic;

/// Where artwork bytes come from.
#[async_trait]
pub trait ArtworkSource: Send + Sync + fmt::Debug {
    /// Download the bytes at `url`.
    async fn fetch(&self, url: &str) -> Result<Vec<u8>>;
}

/// Fetches artwork over HTTP.
#[derive(Debug, Clone)]
pub struct HttpArtworkSource {
    http: reqwest::Client,
}

impl HttpArtworkSource {
    /// A source whose requests give up after `timeout`.
    pub fn new(timeout: Duration) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(crate::USER_AGENT)
            .build()
            .map_err(|e| {
                ScoutError::Internal(format!("failed to build HTTP client: {e}"))
            })?;
        Ok(Self { http })
    }
}

#[async_trait]
impl ArtworkSource for HttpArtworkSource {
    async fn fetch(&self, url: &str) -> Result<Vec<u8>> {
        debug!("Fetching artwork from {}", url);
        let response = self
            .http
            .get(url)
            .send()
            .await
            .map_err(|e| ScoutError::Fetch(format!("{url}: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            return Err(ScoutError::Fetch(format!("{url}: HTTP {status}")));
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| ScoutError::Fetch(format!("{url}: {e}")))?;
        Ok(bytes.to_vec())
    }
}

/// Where artwork comes from and how covers are encoded.
#[derive(Debug, Clone)]
pub struct CoverSettings {
    /// Image host prefix for relative poster references.
    pub image_base: String,
    /// Artwork size segment requested from the image host, e.g. `w500`.
    pub poster_size: String,
    /// Edge length of the square cover in pixels.
    pub size: u32,
    /// JPEG quality, 1 to 100.
    pub quality: u8,
}

impl Default for CoverSettings {
    fn default() -> Self {
        Self {
            image_base: TMDB_IMAGE_BASE.to_string(),
            poster_size: "w500".to_string(),
            size: 160,
            quality: 90,
        }
    }
}

impl CoverSettings {
    /// Resolve a poster reference; absolute URLs are used as given.
    pub fn artwork_url(&self, reference: &str) -> String {
        let reference = reference.trim();
        if reference.starts_with("http://") || reference.starts_with("https://")
        {
            return reference.to_string();
        }
        format!(
            "{}/{}/{}",
            self.image_base.trim_end_matches('/'),
            self.poster_size.trim_matches('/'),
            reference.trim_start_matches('/')
        )
    }
}

/// Writes `{stem}.jpg` next to a media file.
#[derive(Debug, Clone)]
pub struct CoverWriter {
    source: Arc<dyn ArtworkSource>,
    settings: CoverSettings,
}

impl CoverWriter {
    /// A writer fetching from `source`.
    pub fn new(source: Arc<dyn ArtworkSource>, settings: CoverSettings) -> Self {
        Self { source, settings }
    }

    /// Encoding and URL settings.
    pub fn settings(&self) -> &CoverSettings {
        &self.settings
    }

    /// Fetch, resize and store the candidate's artwork. Never fails: errors
    /// come back as a `failed` outcome naming the file.
    pub async fn write(&self, media_file: &MediaFile, candidate: &Candidate) -> Outcome {
        match self.try_write(media_file, candidate).await {
            Ok(path) => {
                info!("Wrote cover {}", path.display());
                Outcome::written(media_file.clone(), path)
            }
            Err(e) => {
                error!("Cover for {} failed: {}", media_file, e);
                Outcome::failed(media_file.clone(), e.to_string())
            }
        }
    }

    /// Like [`CoverWriter::write`] but returns the error.
    pub async fn try_write(
        &self,
        media_file: &MediaFile,
        candidate: &Candidate,
    ) -> Result<PathBuf> {
        let reference = candidate
            .poster_reference
            .as_deref()
            .filter(|_| candidate.has_poster())
            .ok_or_else(|| {
                ScoutError::Fetch(format!("{} has no poster", candidate.title))
            })?;

        let bytes = self.source.fetch(&self.settings.artwork_url(reference)).await?;

        let target = media_file.cover_path();
        let size = self.settings.size;
        let quality = self.settings.quality;
        let stored = target.clone();
        tokio::task::spawn_blocking(move || {
            let jpeg = encode_cover_jpeg(&bytes, size, quality)?;
            write_atomic(&stored, &jpeg)
        })
        .await
        .map_err(|e| ScoutError::Internal(format!("cover task failed: {e}")))??;

        Ok(target)
    }
}
