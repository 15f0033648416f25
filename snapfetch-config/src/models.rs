use std::{
    path::PathBuf,
    time::Duration,
};

use snapfetch_core::{FetchOptions, PngFileStore};

use crate::validation::{self, ConfigGuardRailError, ConfigWarnings};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub fetch: FetchConfig,
    pub storage: StorageConfig,
    pub metadata: ConfigMetadata,
}

impl Config {
    pub fn fetch_options(&self) -> FetchOptions {
        FetchOptions {
            request_timeout: self.fetch.timeout,
            connect_timeout: self.fetch.connect_timeout,
        }
    }

    /// Persist destination for every fetch made under this config.
    pub fn file_store(&self) -> PngFileStore {
        PngFileStore::new(self.storage.dir.clone())
            .with_file_name(self.storage.file_name.clone())
    }

    pub fn output_path(&self) -> PathBuf {
        self.storage.dir.join(&self.storage.file_name)
    }

    /// Re-run the guard rails, e.g. after command-line overrides.
    pub fn validate(&self) -> Result<ConfigWarnings, ConfigGuardRailError> {
        validation::apply_guard_rails(self)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FetchConfig {
    pub timeout: Duration,
    pub connect_timeout: Duration,
}

impl Default for FetchConfig {
    fn default() -> Self {
        let defaults = FetchOptions::default();
        Self {
            timeout: defaults.request_timeout,
            connect_timeout: defaults.connect_timeout,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorageConfig {
    pub dir: PathBuf,
    pub file_name: String,
}

/// Where the effective configuration came from.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConfigMetadata {
    pub config_path: Option<PathBuf>,
    pub env_file_loaded: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn maps_onto_core_types() {
        let config = Config {
            fetch: FetchConfig {
                timeout: Duration::from_secs(5),
                connect_timeout: Duration::from_secs(2),
            },
            storage: StorageConfig {
                dir: PathBuf::from("/data/images"),
                file_name: "latest.png".into(),
            },
            metadata: ConfigMetadata::default(),
        };

        let options = config.fetch_options();
        assert_eq!(options.request_timeout, Duration::from_secs(5));
        assert_eq!(options.connect_timeout, Duration::from_secs(2));

        let store = config.file_store();
        assert_eq!(store.path(), PathBuf::from("/data/images/latest.png"));
        assert_eq!(config.output_path(), store.path());
    }
}
