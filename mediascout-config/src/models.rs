use std::fmt;
use std::path::PathBuf;

/// TMDB locale used when none is configured.
pub const DEFAULT_LOCALE: &str = "en-US";
/// Listen on every interface by default.
pub const DEFAULT_HOST: &str = "0.0.0.0";
/// Default HTTP port.
pub const DEFAULT_PORT: u16 = 8000;
/// Public TMDB v3 API root.
pub const DEFAULT_TMDB_BASE_URL: &str = "https://api.themoviedb.org/3";
/// Public TMDB image host.
pub const DEFAULT_TMDB_IMAGE_BASE: &str = "https://image.tmdb.org/t/p";
/// Artwork size requested for covers.
pub const DEFAULT_POSTER_SIZE: &str = "w500";

/// Fully resolved runtime configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// Directories and extensions to scan.
    pub media: MediaConfig,
    /// Metadata service access.
    pub tmdb: TmdbConfig,
    /// Artwork download and cover encoding.
    pub artwork: ArtworkConfig,
    /// Concurrency bounds.
    pub workflow: WorkflowConfig,
    /// HTTP listener.
    pub server: ServerConfig,
    /// Optional minidlna integration.
    pub minidlna: MinidlnaConfig,
    /// Where the values came from.
    pub metadata: ConfigMetadata,
}

/// Media roots to scan.
#[derive(Debug, Clone, Default)]
pub struct MediaConfig {
    /// Only paths below these are ever read or written.
    pub directories: Vec<PathBuf>,
    /// Lower-case, without a leading dot.
    pub extensions: Vec<String>,
}

/// TMDB access settings.
#[derive(Clone)]
pub struct TmdbConfig {
    /// v3 API key.
    pub api_key: String,
    /// Locale such as `en-US`.
    pub locale: String,
    /// API root.
    pub base_url: String,
    /// Image host.
    pub image_base: String,
    /// Candidates kept per search.
    pub max_results: usize,
    /// Per-request timeout.
    pub timeout_secs: u64,
    /// Requests allowed per window.
    pub requests_per_window: u32,
    /// Rate-limit window length.
    pub window_secs: u64,
    /// Attempts per request, including the first.
    pub max_attempts: u32,
}

impl fmt::Debug for TmdbConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TmdbConfig")
            .field("api_key", &if self.api_key.is_empty() { "" } else { "<redacted>" })
            .field("locale", &self.locale)
            .field("base_url", &self.base_url)
            .field("image_base", &self.image_base)
            .field("max_results", &self.max_results)
            .field("timeout_secs", &self.timeout_secs)
            .field("requests_per_window", &self.requests_per_window)
            .field("window_secs", &self.window_secs)
            .field("max_attempts", &self.max_attempts)
            .finish()
    }
}

impl Default for TmdbConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            locale: DEFAULT_LOCALE.to_string(),
            base_url: DEFAULT_TMDB_BASE_URL.to_string(),
            image_base: DEFAULT_TMDB_IMAGE_BASE.to_string(),
            max_results: 10,
            timeout_secs: 10,
            requests_per_window: 40,
            window_secs: 10,
            max_attempts: 3,
        }
    }
}

/// Artwork download and cover encoding settings.
#[derive(Debug, Clone)]
pub struct ArtworkConfig {
    /// Size segment requested from the image host.
    pub poster_size: String,
    /// Download timeout.
    pub timeout_secs: u64,
    /// Edge length of the square cover.
    pub cover_size: u32,
    /// JPEG quality, 1 to 100.
    pub jpeg_quality: u8,
}

impl Default for ArtworkConfig {
    fn default() -> Self {
        Self {
            poster_size: DEFAULT_POSTER_SIZE.to_string(),
            timeout_secs: 15,
            cover_size: 160,
            jpeg_quality: 90,
        }
    }
}

/// Concurrency bounds for one request.
#[derive(Debug, Clone)]
pub struct WorkflowConfig {
    /// Metadata lookups in flight at once.
    pub lookup_concurrency: usize,
    /// Cover writes in flight at once.
    pub write_concurrency: usize,
}

impl Default for WorkflowConfig {
    fn default() -> Self {
        Self {
            lookup_concurrency: 4,
            write_concurrency: 4,
        }
    }
}

/// HTTP listener settings.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Interface to bind.
    pub host: String,
    /// Port to bind.
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
        }
    }
}

impl ServerConfig {
    /// `host:port`.
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// minidlna status checks and rescans. Both parts are optional.
#[derive(Debug, Clone)]
pub struct MinidlnaConfig {
    /// URL answering 200 while minidlna is up, usually its status page.
    pub url: Option<String>,
    /// Portainer webhook that restarts the minidlna container.
    pub webhook_url: Option<String>,
    /// Timeout for the status request.
    pub status_timeout_secs: u64,
    /// How long a status answer is reused.
    pub status_ttl_secs: u64,
    /// Timeout for the webhook call.
    pub webhook_timeout_secs: u64,
    /// Accept self-signed certificates on the webhook.
    pub accept_invalid_certs: bool,
}

impl Default for MinidlnaConfig {
    fn default() -> Self {
        Self {
            url: None,
            webhook_url: None,
            status_timeout_secs: 5,
            status_ttl_secs: 60,
            webhook_timeout_secs: 10,
            accept_invalid_certs: false,
        }
    }
}

impl MinidlnaConfig {
    /// Whether any part of the integration is configured.
    pub fn is_enabled(&self) -> bool {
        self.url.is_some() || self.webhook_url.is_some()
    }
}

/// Where the configuration came from.
#[derive(Debug, Clone, Default)]
pub struct ConfigMetadata {
    /// The TOML file read, if any.
    pub config_path: Option<PathBuf>,
    /// Whether a `.env` file was found and applied.
    pub env_file_loaded: bool,
}

/// Split a comma separated list, trimming entries and dropping empty ones.
pub fn split_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .map(str::to_string)
        .collect()
}

/// `.MKV` and `mkv` are the same extension.
pub fn normalize_extension(raw: &str) -> String {
    raw.trim().trim_start_matches('.').to_lowercase()
}
