//! Configuration for Mediascout.
//!
//! Values are composed from built-in defaults, an optional `mediascout.toml`,
//! the process environment (including `.env`) and command-line flags, in that
//! order of precedence. The result is validated once at startup so the rest
//! of the program can trust it.

/// Command-line flags.
pub mod cli;
/// Source composition.
pub mod loader;
/// Resolved configuration types.
pub mod models;
/// Raw file and environment values.
pub mod sources;
/// Startup checks.
pub mod validation;

pub use cli::{CliOverrides, ConfigArgs};
pub use loader::{ConfigLoad, ConfigLoadError, ConfigLoader, ConfigLoaderOptions};
pub use models::{
    ArtworkConfig, Config, ConfigMetadata, MediaConfig, MinidlnaConfig,
    ServerConfig, TmdbConfig, WorkflowConfig,
};
pub use validation::{ConfigValidationError, ConfigWarning, ConfigWarnings};
