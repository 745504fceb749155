use once_cell::sync::Lazy;
use std::{
    fs,
    path::{Path, PathBuf},
};
use thiserror::Error;
use tracing::debug;

use crate::cli::CliOverrides;
use crate::models::{
    ArtworkConfig, Config, ConfigMetadata, MediaConfig, MinidlnaConfig,
    ServerConfig, TmdbConfig, WorkflowConfig, normalize_extension,
};
use crate::sources::{EnvConfig, FileConfig};
use crate::validation::{self, ConfigValidationError, ConfigWarnings};

static DEFAULT_CONFIG_LOCATIONS: Lazy<Vec<PathBuf>> = Lazy::new(|| {
    vec![
        PathBuf::from("mediascout.toml"),
        PathBuf::from("config/mediascout.toml"),
    ]
});

/// Inputs to [`ConfigLoader`] that come from the command line.
#[derive(Debug, Default, Clone)]
pub struct ConfigLoaderOptions {
    /// Explicit `mediascout.toml`; must exist when given.
    pub config_path: Option<PathBuf>,
    /// `.env` file to load instead of `./.env`.
    pub env_file: Option<PathBuf>,
    /// Flag values, highest precedence.
    pub overrides: CliOverrides,
}

/// Composes defaults, `mediascout.toml`, the environment and CLI flags, in
/// increasing order of precedence.
#[derive(Debug, Default)]
pub struct ConfigLoader {
    options: ConfigLoaderOptions,
}

/// A validated configuration and the warnings found on the way.
#[derive(Debug)]
pub struct ConfigLoad {
    /// The composed configuration.
    pub config: Config,
    /// Non-fatal findings to log at startup.
    pub warnings: ConfigWarnings,
}

/// Why configuration could not be loaded.
#[derive(Debug, Error)]
pub enum ConfigLoadError {
    /// An explicitly named file does not exist.
    #[error("configuration file missing: {}", path.display())]
    MissingConfig {
        /// The missing file.
        path: PathBuf,
    },
    /// The file exists but could not be read.
    #[error("failed to read configuration {}", path.display())]
    Io {
        /// The unreadable file.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: std::io::Error,
    },
    /// The file is not valid TOML or has unknown keys.
    #[error("failed to parse configuration {}", path.display())]
    Parse {
        /// The malformed file.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: toml::de::Error,
    },
    /// The `.env` file is malformed.
    #[error("failed to load env file")]
    EnvFile(#[from] dotenvy::Error),
    /// The composed values failed validation.
    #[error(transparent)]
    Invalid(#[from] ConfigValidationError),
}

impl ConfigLoader {
    /// A loader using default file locations and no flags.
    pub fn new() -> Self {
        Self::default()
    }

    /// A loader for the given command-line inputs.
    pub fn with_options(options: ConfigLoaderOptions) -> Self {
        Self { options }
    }

    /// Read this file instead of searching the default locations.
    pub fn with_config_path<P: Into<PathBuf>>(mut self, path: P) -> Self {
        self.options.config_path = Some(path.into());
        self
    }

    /// Load this `.env` file instead of `./.env`.
    pub fn with_env_file<P: Into<PathBuf>>(mut self, path: P) -> Self {
        self.options.env_file = Some(path.into());
        self
    }

    /// Apply these flag values on top of everything else.
    pub fn with_overrides(mut self, overrides: CliOverrides) -> Self {
        self.options.overrides = overrides;
        self
    }

    /// Load `.env`, read the process environment and compose.
    pub fn load(&self) -> Result<ConfigLoad, ConfigLoadError> {
        let env_file_loaded = match &self.options.env_file {
            Some(path) => dotenvy::from_path(path).map(|_| true).or_else(
                |err| match err {
                    dotenvy::Error::Io(_) => Ok(false),
                    _ => Err(err),
                },
            )?,
            None => {
                dotenvy::dotenv().map(|_| true).or_else(|err| match err {
                    dotenvy::Error::Io(_) => Ok(false),
                    _ => Err(err),
                })?
            }
        };

        self.load_with_env(EnvConfig::gather(), env_file_loaded)
    }

    /// Compose from an already gathered environment. Does not touch the
    /// process environment.
    pub fn load_with_env(
        &self,
        mut env: EnvConfig,
        env_file_loaded: bool,
    ) -> Result<ConfigLoad, ConfigLoadError> {
        let env_problems = std::mem::take(&mut env.problems);
        let (file_config, config_path) = self.load_file_config(&env)?;
        let mut warnings = ConfigWarnings::default();
        if config_path.is_none() {
            warnings.push_with_hint(
                "No mediascout.toml detected; using environment and flags only",
                "Pass --config or set MEDIASCOUT_CONFIG to use a file",
            );
        }

        let config = self.compose(
            file_config.unwrap_or_default(),
            env,
            ConfigMetadata {
                config_path,
                env_file_loaded,
            },
        );

        let validation_warnings = match validation::validate(&config) {
            Ok(found) if env_problems.is_empty() => found,
            Ok(_) => {
                return Err(ConfigValidationError {
                    problems: env_problems,
                }
                .into());
            }
            Err(mut invalid) => {
                invalid.problems.splice(0..0, env_problems);
                return Err(invalid.into());
            }
        };
        warnings.items.extend(validation_warnings.items);

        Ok(ConfigLoad { config, warnings })
    }

    fn load_file_config(
        &self,
        env: &EnvConfig,
    ) -> Result<(Option<FileConfig>, Option<PathBuf>), ConfigLoadError> {
        let explicit = self
            .options
            .config_path
            .clone()
            .or_else(|| env.config_path.clone());

        let path = match explicit {
            Some(path) if !path.exists() => {
                return Err(ConfigLoadError::MissingConfig { path });
            }
            Some(path) => path,
            None => match DEFAULT_CONFIG_LOCATIONS.iter().find(|p| p.exists()) {
                Some(path) => path.clone(),
                None => return Ok((None, None)),
            },
        };

        debug!("Reading configuration from {}", path.display());
        let file_config = read_file_config(&path)?;
        Ok((Some(file_config), Some(path)))
    }

    fn compose(
        &self,
        file: FileConfig,
        env: EnvConfig,
        metadata: ConfigMetadata,
    ) -> Config {
        let cli = &self.options.overrides;
        let FileConfig {
            media: file_media,
            tmdb: file_tmdb,
            artwork: file_artwork,
            workflow: file_workflow,
            server: file_server,
            minidlna: file_minidlna,
        } = file;

        let media = MediaConfig {
            directories: cli
                .media_directories
                .clone()
                .or(env.media_directories)
                .or(file_media.directories)
                .unwrap_or_default(),
            extensions: normalize_extensions(
                cli.file_extensions
                    .clone()
                    .or(env.file_extensions)
                    .or(file_media.extensions)
                    .unwrap_or_default(),
            ),
        };

        let defaults = TmdbConfig::default();
        let tmdb = TmdbConfig {
            api_key: cli
                .tmdb_api_key
                .clone()
                .or(env.tmdb_api_key)
                .or(file_tmdb.api_key)
                .unwrap_or_default(),
            locale: cli
                .tmdb_locale
                .clone()
                .or(env.tmdb_locale)
                .or(file_tmdb.locale)
                .unwrap_or(defaults.locale),
            base_url: env
                .tmdb_base_url
                .or(file_tmdb.base_url)
                .unwrap_or(defaults.base_url),
            image_base: env
                .tmdb_image_base
                .or(file_tmdb.image_base)
                .unwrap_or(defaults.image_base),
            max_results: file_tmdb.max_results.unwrap_or(defaults.max_results),
            timeout_secs: file_tmdb.timeout_secs.unwrap_or(defaults.timeout_secs),
            requests_per_window: file_tmdb
                .requests_per_window
                .unwrap_or(defaults.requests_per_window),
            window_secs: file_tmdb.window_secs.unwrap_or(defaults.window_secs),
            max_attempts: file_tmdb.max_attempts.unwrap_or(defaults.max_attempts),
        };

        let defaults = ArtworkConfig::default();
        let artwork = ArtworkConfig {
            poster_size: file_artwork.poster_size.unwrap_or(defaults.poster_size),
            timeout_secs: file_artwork.timeout_secs.unwrap_or(defaults.timeout_secs),
            cover_size: file_artwork.cover_size.unwrap_or(defaults.cover_size),
            jpeg_quality: file_artwork.jpeg_quality.unwrap_or(defaults.jpeg_quality),
        };

        let defaults = WorkflowConfig::default();
        let workflow = WorkflowConfig {
            lookup_concurrency: file_workflow
                .lookup_concurrency
                .unwrap_or(defaults.lookup_concurrency),
            write_concurrency: file_workflow
                .write_concurrency
                .unwrap_or(defaults.write_concurrency),
        };

        let defaults = ServerConfig::default();
        let server = ServerConfig {
            host: cli
                .server_host
                .clone()
                .or(env.server_host)
                .or(file_server.host)
                .unwrap_or(defaults.host),
            port: cli
                .server_port
                .or(env.server_port)
                .or(file_server.port)
                .unwrap_or(defaults.port),
        };

        let defaults = MinidlnaConfig::default();
        let minidlna = MinidlnaConfig {
            url: cli
                .minidlna_url
                .clone()
                .or(env.minidlna_url)
                .or(file_minidlna.url),
            webhook_url: cli
                .portainer_webhook_url
                .clone()
                .or(env.portainer_webhook_url)
                .or(file_minidlna.webhook_url),
            status_timeout_secs: file_minidlna
                .status_timeout_secs
                .unwrap_or(defaults.status_timeout_secs),
            status_ttl_secs: file_minidlna
                .status_ttl_secs
                .unwrap_or(defaults.status_ttl_secs),
            webhook_timeout_secs: file_minidlna
                .webhook_timeout_secs
                .unwrap_or(defaults.webhook_timeout_secs),
            accept_invalid_certs: file_minidlna
                .accept_invalid_certs
                .unwrap_or(defaults.accept_invalid_certs),
        };

        Config {
            media,
            tmdb,
            artwork,
            workflow,
            server,
            minidlna,
            metadata,
        }
    }
}

fn read_file_config(path: &Path) -> Result<FileConfig, ConfigLoadError> {
    let contents =
        fs::read_to_string(path).map_err(|err| ConfigLoadError::Io {
            path: path.to_path_buf(),
            source: err,
        })?;
    toml::from_str(&contents).map_err(|err| ConfigLoadError::Parse {
        path: path.to_path_buf(),
        source: err,
    })
}

fn normalize_extensions(raw: Vec<String>) -> Vec<String> {
    let mut out: Vec<String> = Vec::with_capacity(raw.len());
    for ext in raw.iter().map(|e| normalize_extension(e)) {
        if !ext.is_empty() && !out.contains(&ext) {
            out.push(ext);
        }
    }
    out
}
