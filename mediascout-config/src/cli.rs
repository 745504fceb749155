use std::path::PathBuf;

use clap::Args;

use crate::models::split_list;

/// Command-line configuration flags. These win over every other source.
#[derive(Args, Debug, Clone, Default)]
pub struct ConfigArgs {
    /// Path to a mediascout.toml file
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Path to a .env file (defaults to ./.env when present)
    #[arg(long, value_name = "PATH")]
    pub env_file: Option<PathBuf>,

    /// Comma-separated list of media directories
    #[arg(long, value_name = "DIRS")]
    pub directories: Option<String>,

    /// Comma-separated list of file extensions (e.g. mkv,mp4,avi)
    #[arg(long, value_name = "EXTS")]
    pub extensions: Option<String>,

    /// TMDB API key
    #[arg(long, value_name = "KEY")]
    pub tmdb_key: Option<String>,

    /// TMDB locale for movie info (e.g. en-US, fr-FR, de-DE)
    #[arg(long, value_name = "LOCALE")]
    pub tmdb_locale: Option<String>,

    /// Host to bind to
    #[arg(long)]
    pub host: Option<String>,

    /// Port to listen on
    #[arg(short, long)]
    pub port: Option<u16>,

    /// URL answering 200 while minidlna is up
    #[arg(long, value_name = "URL")]
    pub minidlna_url: Option<String>,

    /// Portainer webhook that triggers a minidlna rescan
    #[arg(long, value_name = "URL")]
    pub portainer_webhook_url: Option<String>,
}

/// Values taken from the command line, already split into lists.
#[derive(Debug, Clone, Default)]
pub struct CliOverrides {
    /// `--directories`
    pub media_directories: Option<Vec<PathBuf>>,
    /// `--extensions`
    pub file_extensions: Option<Vec<String>>,
    /// `--tmdb-key`
    pub tmdb_api_key: Option<String>,
    /// `--tmdb-locale`
    pub tmdb_locale: Option<String>,
    /// `--host`
    pub server_host: Option<String>,
    /// `--port`
    pub server_port: Option<u16>,
    /// `--minidlna-url`
    pub minidlna_url: Option<String>,
    /// `--portainer-webhook-url`
    pub portainer_webhook_url: Option<String>,
}

impl ConfigArgs {
    /// Blank flags count as absent.
    pub fn overrides(&self) -> CliOverrides {
        let non_empty = |value: &Option<String>| {
            value
                .as_deref()
                .map(str::trim)
                .filter(|v| !v.is_empty())
                .map(str::to_string)
        };

        CliOverrides {
            media_directories: non_empty(&self.directories).map(|raw| {
                split_list(&raw).into_iter().map(PathBuf::from).collect()
            }),
            file_extensions: non_empty(&self.extensions).map(|raw| split_list(&raw)),
            tmdb_api_key: non_empty(&self.tmdb_key),
            tmdb_locale: non_empty(&self.tmdb_locale),
            server_host: non_empty(&self.host),
            server_port: self.port,
            minidlna_url: non_empty(&self.minidlna_url),
            portainer_webhook_url: non_empty(&self.portainer_webhook_url),
        }
    }
}
