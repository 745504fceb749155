use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::models::split_list;

/// Raw configuration as written in `mediascout.toml`.
#[derive(Debug, Default, Clone, Deserialize, Serialize)]
#[serde(rename_all = "snake_case", deny_unknown_fields)]
pub struct FileConfig {
    /// `[media]`
    #[serde(default)]
    pub media: FileMediaConfig,
    /// `[tmdb]`
    #[serde(default)]
    pub tmdb: FileTmdbConfig,
    /// `[artwork]`
    #[serde(default)]
    pub artwork: FileArtworkConfig,
    /// `[workflow]`
    #[serde(default)]
    pub workflow: FileWorkflowConfig,
    /// `[server]`
    #[serde(default)]
    pub server: FileServerConfig,
    /// `[minidlna]`
    #[serde(default)]
    pub minidlna: FileMinidlnaConfig,
}

/// `[media]` section.
#[derive(Debug, Default, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct FileMediaConfig {
    /// Media roots.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub directories: Option<Vec<PathBuf>>,
    /// Eligible extensions.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub extensions: Option<Vec<String>>,
}

/// `[tmdb]` section. Field meanings match [`crate::TmdbConfig`].
#[allow(missing_docs)]
#[derive(Debug, Default, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct FileTmdbConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub locale: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_base: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_results: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timeout_secs: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub requests_per_window: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub window_secs: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_attempts: Option<u32>,
}

/// `[artwork]` section. Field meanings match [`crate::ArtworkConfig`].
#[allow(missing_docs)]
#[derive(Debug, Default, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct FileArtworkConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub poster_size: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timeout_secs: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cover_size: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub jpeg_quality: Option<u8>,
}

/// `[workflow]` section. Field meanings match [`crate::WorkflowConfig`].
#[allow(missing_docs)]
#[derive(Debug, Default, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct FileWorkflowConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lookup_concurrency: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub write_concurrency: Option<usize>,
}

/// `[server]` section.
#[derive(Debug, Default, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct FileServerConfig {
    /// Interface to bind.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub host: Option<String>,
    /// Port to bind.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub port: Option<u16>,
}

/// `[minidlna]` section. Field meanings match [`crate::MinidlnaConfig`].
#[allow(missing_docs)]
#[derive(Debug, Default, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct FileMinidlnaConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub webhook_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status_timeout_secs: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status_ttl_secs: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub webhook_timeout_secs: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub accept_invalid_certs: Option<bool>,
}

/// Environment-derived configuration values.
#[derive(Debug, Default, Clone)]
pub struct EnvConfig {
    /// `MEDIASCOUT_CONFIG`
    pub config_path: Option<PathBuf>,
    /// `MEDIA_DIRECTORIES`, comma separated.
    pub media_directories: Option<Vec<PathBuf>>,
    /// `FILE_EXTENSIONS`, comma separated.
    pub file_extensions: Option<Vec<String>>,
    /// `TMDB_API_KEY`
    pub tmdb_api_key: Option<String>,
    /// `TMDB_LOCALE`
    pub tmdb_locale: Option<String>,
    /// `TMDB_BASE_URL`
    pub tmdb_base_url: Option<String>,
    /// `TMDB_IMAGE_BASE`
    pub tmdb_image_base: Option<String>,
    /// `SERVER_HOST`
    pub server_host: Option<String>,
    /// `SERVER_PORT`
    pub server_port: Option<u16>,
    /// `MINIDLNA_URL`
    pub minidlna_url: Option<String>,
    /// `PORTAINER_WEBHOOK_URL`
    pub portainer_webhook_url: Option<String>,
    /// Variables that were set but could not be parsed.
    pub problems: Vec<String>,
}

impl EnvConfig {
    /// Read the process environment.
    pub fn gather() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build from an arbitrary variable source. Empty values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |name: &str| {
            lookup(name)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };

        let mut problems = Vec::new();
        let server_port = var("SERVER_PORT").and_then(|raw| match raw.parse::<u16>() {
            Ok(port) => Some(port),
            Err(_) => {
                problems.push(format!(
                    "Invalid SERVER_PORT value '{raw}': expected a port number"
                ));
                None
            }
        });

        Self {
            config_path: var("MEDIASCOUT_CONFIG").map(PathBuf::from),
            media_directories: var("MEDIA_DIRECTORIES").map(|raw| {
                split_list(&raw).into_iter().map(PathBuf::from).collect()
            }),
            file_extensions: var("FILE_EXTENSIONS").map(|raw| split_list(&raw)),
            tmdb_api_key: var("TMDB_API_KEY"),
            tmdb_locale: var("TMDB_LOCALE"),
            tmdb_base_url: var("TMDB_BASE_URL"),
            tmdb_image_base: var("TMDB_IMAGE_BASE"),
            server_host: var("SERVER_HOST"),
            server_port,
            minidlna_url: var("MINIDLNA_URL"),
            portainer_webhook_url: var("PORTAINER_WEBHOOK_URL"),
            problems,
        }
    }
}
