use std::fmt;
use std::fs;

use once_cell::sync::Lazy;
use regex::Regex;

use crate::models::Config;

static LOCALE_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[a-z]{2}-[A-Z]{2}").expect("locale regex should compile")
});

/// Every problem found in a configuration, reported together.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigValidationError {
    /// One human-readable line per problem.
    pub problems: Vec<String>,
}

impl fmt::Display for ConfigValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid configuration:")?;
        for problem in &self.problems {
            write!(f, "\n  - {problem}")?;
        }
        Ok(())
    }
}

impl std::error::Error for ConfigValidationError {}

/// Something worth logging that does not stop startup.
#[derive(Debug, Clone)]
pub struct ConfigWarning {
    /// What is off.
    pub message: String,
    /// How to fix it.
    pub hint: Option<String>,
}

/// Warnings gathered while loading.
#[derive(Debug, Default, Clone)]
pub struct ConfigWarnings {
    /// In the order they were found.
    pub items: Vec<ConfigWarning>,
}

impl ConfigWarnings {
    /// Add a warning without a hint.
    pub fn push<S: Into<String>>(&mut self, message: S) {
        self.items.push(ConfigWarning {
            message: message.into(),
            hint: None,
        });
    }

    /// Add a warning with a hint.
    pub fn push_with_hint<S: Into<String>, H: Into<String>>(
        &mut self,
        message: S,
        hint: H,
    ) {
        self.items.push(ConfigWarning {
            message: message.into(),
            hint: Some(hint.into()),
        });
    }

    /// Whether nothing was reported.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

/// `en-US` style: a lower-case language and upper-case region prefix.
pub fn is_valid_locale(locale: &str) -> bool {
    LOCALE_PATTERN.is_match(locale)
}

/// Check a composed configuration once, before anything starts.
pub fn validate(config: &Config) -> Result<ConfigWarnings, ConfigValidationError> {
    let mut problems = Vec::new();
    let mut warnings = ConfigWarnings::default();

    if config.media.directories.is_empty() {
        problems.push("No media directories specified".to_string());
    }
    if config.media.extensions.is_empty() {
        problems.push("No file extensions specified".to_string());
    }
    if config.tmdb.api_key.trim().is_empty() {
        problems.push("No TMDB API key specified".to_string());
    }
    if !is_valid_locale(&config.tmdb.locale) {
        problems.push(format!(
            "Invalid TMDB locale format: '{}'. Expected format: 'en-US', 'fr-FR', 'de-DE', etc.",
            config.tmdb.locale
        ));
    }

    for directory in &config.media.directories {
        match fs::metadata(directory) {
            Err(_) => problems.push(format!(
                "Directory does not exist: {}",
                directory.display()
            )),
            Ok(meta) if !meta.is_dir() => {
                problems.push(format!("Not a directory: {}", directory.display()))
            }
            Ok(meta) if meta.permissions().readonly() => warnings.push_with_hint(
                format!("Directory is read-only: {}", directory.display()),
                "Covers cannot be written there until it is made writable",
            ),
            Ok(_) => {}
        }
    }

    if config.artwork.cover_size == 0 {
        problems.push("Cover size must be greater than zero".to_string());
    }
    if !(1..=100).contains(&config.artwork.jpeg_quality) {
        problems.push(format!(
            "JPEG quality must be between 1 and 100, got {}",
            config.artwork.jpeg_quality
        ));
    }
    if config.tmdb.requests_per_window == 0 || config.tmdb.window_secs == 0 {
        problems.push("TMDB rate limit must allow at least one request per window".to_string());
    }
    if config.tmdb.max_attempts == 0 {
        problems.push("TMDB max_attempts must be at least 1".to_string());
    }
    if config.tmdb.timeout_secs == 0 {
        problems.push("TMDB timeout_secs must be greater than zero".to_string());
    }
    if config.artwork.timeout_secs == 0 {
        problems.push("Artwork timeout_secs must be greater than zero".to_string());
    }

    let minidlna = &config.minidlna;
    for (name, url) in [
        ("minidlna url", &minidlna.url),
        ("Portainer webhook url", &minidlna.webhook_url),
    ] {
        if let Some(url) = url.as_deref().filter(|url| !is_http_url(url)) {
            problems.push(format!("Invalid {name}: '{url}'. Expected an http:// or https:// URL"));
        }
    }
    if minidlna.url.is_some() && minidlna.status_timeout_secs == 0 {
        problems.push("minidlna status_timeout_secs must be greater than zero".to_string());
    }
    if minidlna.webhook_url.is_some() && minidlna.webhook_timeout_secs == 0 {
        problems.push("minidlna webhook_timeout_secs must be greater than zero".to_string());
    }
    if minidlna.accept_invalid_certs && minidlna.webhook_url.is_some() {
        warnings.push_with_hint(
            "Portainer webhook certificates are not verified",
            "Set accept_invalid_certs = false once the certificate is trusted",
        );
    }

    let lookups = config.workflow.lookup_concurrency;
    if lookups as u64 > u64::from(config.tmdb.requests_per_window) {
        warnings.push_with_hint(
            format!("lookup_concurrency ({lookups}) exceeds the TMDB request budget"),
            "Extra lookups just wait on the rate limiter",
        );
    }

    if problems.is_empty() {
        Ok(warnings)
    } else {
        Err(ConfigValidationError { problems })
    }
}

fn is_http_url(url: &str) -> bool {
    let rest = url
        .strip_prefix("http://")
        .or_else(|| url.strip_prefix("https://"));
    rest.is_some_and(|host| !host.is_empty())
}
