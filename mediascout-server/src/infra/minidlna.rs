//! minidlna status checks and rescans through a Portainer webhook.

use std::sync::Arc;
use std::time::Duration;

use reqwest::StatusCode;
use thiserror::Error;
use tokio::sync::Mutex;
use tokio::time::Instant;
use tracing::{debug, info, warn};

use mediascout_config::MinidlnaConfig;

#[derive(Debug, Error)]
pub enum MinidlnaError {
    #[error("minidlna rescan is not configured")]
    NotConfigured,
    #[error("rescan webhook failed: {0}")]
    Webhook(String),
    #[error("failed to build HTTP client: {0}")]
    Client(String),
}

#[derive(Debug, Clone)]
pub struct MinidlnaSettings {
    pub status_url: Option<String>,
    pub webhook_url: Option<String>,
    pub status_timeout: Duration,
    /// A status answer younger than this is reused.
    pub status_ttl: Duration,
    pub webhook_timeout: Duration,
    pub accept_invalid_certs: bool,
}

impl From<&MinidlnaConfig> for MinidlnaSettings {
    fn from(config: &MinidlnaConfig) -> Self {
        Self {
            status_url: config.url.clone(),
            webhook_url: config.webhook_url.clone(),
            status_timeout: Duration::from_secs(config.status_timeout_secs),
            status_ttl: Duration::from_secs(config.status_ttl_secs),
            webhook_timeout: Duration::from_secs(config.webhook_timeout_secs),
            accept_invalid_certs: config.accept_invalid_certs,
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct CachedStatus {
    up: bool,
    checked_at: Instant,
}

/// Shared handle; clones see the same status cache.
#[derive(Debug, Clone)]
pub struct MinidlnaClient {
    status_http: reqwest::Client,
    webhook_http: reqwest::Client,
    settings: MinidlnaSettings,
    cache: Arc<Mutex<Option<CachedStatus>>>,
}

impl MinidlnaClient {
    pub fn new(settings: MinidlnaSettings) -> Result<Self, MinidlnaError> {
        let build_err = |e: reqwest::Error| MinidlnaError::Client(e.to_string());
        let status_http = reqwest::Client::builder()
            .timeout(settings.status_timeout)
            .user_agent(mediascout_core::USER_AGENT)
            .build()
            .map_err(build_err)?;
        let webhook_http = reqwest::Client::builder()
            .timeout(settings.webhook_timeout)
            .user_agent(mediascout_core::USER_AGENT)
            .danger_accept_invalid_certs(settings.accept_invalid_certs)
            .build()
            .map_err(build_err)?;

        Ok(Self {
            status_http,
            webhook_http,
            settings,
            cache: Arc::new(Mutex::new(None)),
        })
    }

    pub fn settings(&self) -> &MinidlnaSettings {
        &self.settings
    }

    /// `None` when no status URL is configured, otherwise whether minidlna
    /// answered 200 within the timeout.
    pub async fn status(&self) -> Option<bool> {
        let url = self.settings.status_url.as_deref()?;

        let mut cache = self.cache.lock().await;
        let fresh = (*cache)
            .filter(|cached| cached.checked_at.elapsed() < self.settings.status_ttl);
        if let Some(cached) = fresh {
            return Some(cached.up);
        }

        let up = match self.status_http.get(url).send().await {
            Ok(response) => response.status() == StatusCode::OK,
            Err(e) => {
                debug!("minidlna status check failed: {}", e);
                false
            }
        };
        *cache = Some(CachedStatus {
            up,
            checked_at: Instant::now(),
        });
        Some(up)
    }

    /// POST the Portainer webhook. Any non-2xx answer is a failure.
    pub async fn trigger_rescan(&self) -> Result<(), MinidlnaError> {
        let url = self
            .settings
            .webhook_url
            .as_deref()
            .ok_or(MinidlnaError::NotConfigured)?;

        let response = self
            .webhook_http
            .post(url)
            .send()
            .await
            .map_err(|e| MinidlnaError::Webhook(e.to_string()))?;
        let status = response.status();
        if !status.is_success() {
            warn!("Rescan webhook answered {}", status);
            return Err(MinidlnaError::Webhook(format!("HTTP {status}")));
        }

        self.cache.lock().await.take();
        info!("Triggered minidlna rescan");
        Ok(())
    }
}
