//! Layered configuration for snapfetch.
//!
//! Settings resolve in order: environment (after `.env`), then
//! `snapfetch.toml`, then built-in defaults. Command-line overrides are the
//! binary's business; call [`Config::validate`] after applying them.

pub mod loader;
pub mod models;
pub mod sources;
pub mod validation;

pub use loader::{
    ConfigLoad, ConfigLoadError, ConfigLoader, ConfigLoaderOptions,
    DEFAULT_STORAGE_DIR,
};
pub use models::{Config, ConfigMetadata, FetchConfig, StorageConfig};
pub use sources::{EnvConfig, FileConfig};
pub use validation::{ConfigGuardRailError, ConfigWarning, ConfigWarnings};
