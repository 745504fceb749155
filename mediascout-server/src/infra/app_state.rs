use std::{fmt, path::PathBuf, sync::Arc, time::Duration};

use tokio_util::sync::CancellationToken;

use super::minidlna::{MinidlnaClient, MinidlnaSettings};

use mediascout_config::Config;
use mediascout_core::{
    CoverSettings, CoverWriter, HttpArtworkSource, RateLimitRule, RateLimiter,
    RetryPolicy, ScoutError, SelectionWorkflow, TitleParser, TmdbClient,
    TmdbSettings, WorkflowOptions,
};

#[derive(Clone)]
pub struct AppState {
    pub workflow: Arc<SelectionWorkflow>,
    /// Configured media roots; requests may only touch paths below these.
    pub directories: Arc<Vec<PathBuf>>,
    pub extensions: Arc<Vec<String>>,
    /// Present when the provider is the live TMDB client.
    pub limiter: Option<RateLimiter>,
    /// Fires on shutdown; in-flight cover batches stop starting new writes.
    pub shutdown: CancellationToken,
    /// Present when a minidlna status URL or rescan webhook is configured.
    pub minidlna: Option<MinidlnaClient>,
}

impl fmt::Debug for AppState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AppState")
            .field("directories", &self.directories)
            .field("extensions", &self.extensions)
            .field("minidlna", &self.minidlna.is_some())
            .finish_non_exhaustive()
    }
}

impl AppState {
    pub fn new(
        workflow: SelectionWorkflow,
        directories: Vec<PathBuf>,
        extensions: Vec<String>,
    ) -> Self {
        Self {
            workflow: Arc::new(workflow),
            directories: Arc::new(directories),
            extensions: Arc::new(extensions),
            limiter: None,
            shutdown: CancellationToken::new(),
            minidlna: None,
        }
    }

    pub fn with_limiter(mut self, limiter: RateLimiter) -> Self {
        self.limiter = Some(limiter);
        self
    }

    pub fn with_shutdown(mut self, shutdown: CancellationToken) -> Self {
        self.shutdown = shutdown;
        self
    }

    pub fn with_minidlna(mut self, minidlna: MinidlnaClient) -> Self {
        self.minidlna = Some(minidlna);
        self
    }

    /// Wire the live TMDB client and HTTP artwork source from configuration.
    pub fn from_config(config: &Config) -> Result<Self, ScoutError> {
        let tmdb = TmdbClient::new(tmdb_settings(config))?;
        let limiter = tmdb.limiter().clone();
        let artwork = HttpArtworkSource::new(Duration::from_secs(
            config.artwork.timeout_secs,
        ))?;

        let workflow = SelectionWorkflow::new(
            TitleParser::default(),
            Arc::new(tmdb),
            CoverWriter::new(Arc::new(artwork), cover_settings(config)),
            workflow_options(config),
        );

        let mut state = Self::new(
            workflow,
            config.media.directories.clone(),
            config.media.extensions.clone(),
        )
        .with_limiter(limiter);

        if config.minidlna.is_enabled() {
            let minidlna = MinidlnaClient::new(MinidlnaSettings::from(&config.minidlna))
                .map_err(|e| ScoutError::Internal(e.to_string()))?;
            state = state.with_minidlna(minidlna);
        }
        Ok(state)
    }

    /// The configured root matching `directory` exactly, if any.
    pub fn configured_directory(&self, directory: &str) -> Option<&PathBuf> {
        let wanted = directory.trim_end_matches('/');
        self.directories.iter().find(|root| {
            root.to_str()
                .is_some_and(|root| root.trim_end_matches('/') == wanted)
        })
    }
}

pub fn tmdb_settings(config: &Config) -> TmdbSettings {
    let tmdb = &config.tmdb;
    TmdbSettings {
        language: tmdb.locale.clone(),
        base_url: tmdb.base_url.clone(),
        image_base: tmdb.image_base.clone(),
        max_results: tmdb.max_results,
        timeout: Duration::from_secs(tmdb.timeout_secs),
        rate_limit: RateLimitRule {
            limit: tmdb.requests_per_window,
            window: Duration::from_secs(tmdb.window_secs),
        },
        retry: RetryPolicy {
            max_attempts: tmdb.max_attempts,
            ..RetryPolicy::default()
        },
        ..TmdbSettings::new(tmdb.api_key.clone())
    }
}

pub fn cover_settings(config: &Config) -> CoverSettings {
    CoverSettings {
        image_base: config.tmdb.image_base.clone(),
        poster_size: config.artwork.poster_size.clone(),
        size: config.artwork.cover_size,
        quality: config.artwork.jpeg_quality,
    }
}

pub fn workflow_options(config: &Config) -> WorkflowOptions {
    WorkflowOptions {
        lookup_concurrency: config.workflow.lookup_concurrency,
        write_concurrency: config.workflow.write_concurrency,
    }
}
