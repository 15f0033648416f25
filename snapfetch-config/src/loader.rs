use once_cell::sync::Lazy;
use std::{
    fs,
    path::{Path, PathBuf},
    time::Duration,
};
use thiserror::Error;
use tracing::debug;

use snapfetch_core::DEFAULT_FILE_NAME;

use crate::{
    models::{Config, ConfigMetadata, FetchConfig, StorageConfig},
    sources::{
        ENV_CONNECT_TIMEOUT, ENV_TIMEOUT, EnvConfig, FileConfig,
        FileFetchConfig, FileStorageConfig,
    },
    validation::{self, ConfigGuardRailError, ConfigWarnings},
};

static DEFAULT_CONFIG_LOCATIONS: Lazy<Vec<PathBuf>> = Lazy::new(|| {
    vec![
        PathBuf::from("snapfetch.toml"),
        PathBuf::from("config/snapfetch.toml"),
    ]
});

pub const DEFAULT_STORAGE_DIR: &str = "./cache/images";

#[derive(Debug, Default, Clone)]
pub struct ConfigLoaderOptions {
    pub config_path: Option<PathBuf>,
    pub env_file: Option<PathBuf>,
}

#[derive(Debug, Default)]
pub struct ConfigLoader {
    options: ConfigLoaderOptions,
}

impl ConfigLoader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_options(options: ConfigLoaderOptions) -> Self {
        Self { options }
    }

    pub fn with_config_path<P: Into<PathBuf>>(mut self, path: P) -> Self {
        self.options.config_path = Some(path.into());
        self
    }

    pub fn with_env_file<P: Into<PathBuf>>(mut self, path: P) -> Self {
        self.options.env_file = Some(path.into());
        self
    }

    /// Load `.env`, then the process environment, then the TOML file.
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

    /// Same as [`ConfigLoader::load`] with an explicit environment snapshot.
    pub fn load_with_env(
        &self,
        env: EnvConfig,
        env_file_loaded: bool,
    ) -> Result<ConfigLoad, ConfigLoadError> {
        let (file_config, config_path) = self.load_file_config(&env)?;

        let (config, warnings) =
            self.compose_config(file_config, env, config_path, env_file_loaded)?;

        Ok(ConfigLoad { config, warnings })
    }

    fn load_file_config(
        &self,
        env: &EnvConfig,
    ) -> Result<(Option<FileConfig>, Option<PathBuf>), ConfigLoadError> {
        let mut source = ConfigPathSource::default();

        if let Some(explicit) = &self.options.config_path {
            source.explicit = Some(explicit.clone());
        } else if let Some(from_env) = &env.config_path {
            source.env = Some(from_env.clone());
        }

        if source.is_empty() {
            source.default = DEFAULT_CONFIG_LOCATIONS
                .iter()
                .find(|candidate| candidate.exists())
                .cloned();
        }

        let Some((path, provenance)) = source.resolved_path() else {
            return Ok((None, None));
        };

        if !path.exists() {
            if provenance.is_explicit() {
                return Err(ConfigLoadError::MissingConfig { path });
            }
            return Ok((None, None));
        }

        let contents =
            fs::read_to_string(&path).map_err(|err| ConfigLoadError::Io {
                path: path.clone(),
                source: err,
            })?;
        let file_config: FileConfig =
            toml::from_str(&contents).map_err(|err| {
                ConfigLoadError::Parse {
                    path: path.clone(),
                    source: err,
                }
            })?;

        debug!("[load_file_config] Loaded config from {}", path.display());

        Ok((Some(file_config), Some(path)))
    }

    fn compose_config(
        &self,
        file_config: Option<FileConfig>,
        env: EnvConfig,
        config_path: Option<PathBuf>,
        env_file_loaded: bool,
    ) -> Result<(Config, ConfigWarnings), ConfigLoadError> {
        let mut warnings = ConfigWarnings::default();

        if config_path.is_none() {
            warnings.push_with_hint(
                "No snapfetch.toml detected; using environment variables and defaults",
                "Create snapfetch.toml or pass --config to pin settings",
            );
        }

        let FileConfig {
            fetch: file_fetch,
            storage: file_storage,
        } = file_config.unwrap_or_default();
        let FileFetchConfig {
            timeout: file_timeout,
            connect_timeout: file_connect_timeout,
        } = file_fetch;
        let FileStorageConfig {
            dir: file_dir,
            file_name: file_name_cfg,
        } = file_storage;

        let defaults = FetchConfig::default();
        let fetch = FetchConfig {
            timeout: parse_env_duration(ENV_TIMEOUT, env.timeout.as_deref())?
                .or(file_timeout)
                .unwrap_or(defaults.timeout),
            connect_timeout: parse_env_duration(
                ENV_CONNECT_TIMEOUT,
                env.connect_timeout.as_deref(),
            )?
            .or(file_connect_timeout)
            .unwrap_or(defaults.connect_timeout),
        };

        let file_dir =
            file_dir.map(|dir| resolve_relative(dir, config_path.as_deref()));
        let storage = StorageConfig {
            dir: env
                .output_dir
                .or(file_dir)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_STORAGE_DIR)),
            file_name: env
                .file_name
                .or(file_name_cfg)
                .unwrap_or_else(|| DEFAULT_FILE_NAME.to_string()),
        };

        let config = Config {
            fetch,
            storage,
            metadata: ConfigMetadata {
                config_path,
                env_file_loaded,
            },
        };

        let guard_warnings = validation::apply_guard_rails(&config)?;
        warnings.extend(guard_warnings);

        Ok((config, warnings))
    }
}

fn parse_env_duration(
    key: &'static str,
    raw: Option<&str>,
) -> Result<Option<Duration>, ConfigLoadError> {
    raw.map(|value| {
        humantime::parse_duration(value).map_err(|source| {
            ConfigLoadError::InvalidDuration {
                key,
                value: value.to_string(),
                source,
            }
        })
    })
    .transpose()
}

/// Relative `storage.dir` values are anchored next to the file declaring them.
fn resolve_relative(dir: PathBuf, config_path: Option<&Path>) -> PathBuf {
    if dir.is_absolute() {
        return dir;
    }
    match config_path.and_then(Path::parent) {
        Some(base) if !base.as_os_str().is_empty() => base.join(dir),
        _ => dir,
    }
}

#[derive(Debug, Error)]
pub enum ConfigLoadError {
    #[error("configuration file missing: {path}")]
    MissingConfig { path: PathBuf },
    #[error("failed to read configuration {path}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse configuration {path}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
    #[error("invalid duration '{value}' in {key}")]
    InvalidDuration {
        key: &'static str,
        value: String,
        #[source]
        source: humantime::DurationError,
    },
    #[error(transparent)]
    GuardRail(#[from] ConfigGuardRailError),
    #[error(transparent)]
    EnvFile(#[from] dotenvy::Error),
}

#[derive(Debug, Default)]
struct ConfigPathSource {
    explicit: Option<PathBuf>,
    env: Option<PathBuf>,
    default: Option<PathBuf>,
}

impl ConfigPathSource {
    fn is_empty(&self) -> bool {
        self.explicit.is_none() && self.env.is_none() && self.default.is_none()
    }

    fn resolved_path(&self) -> Option<(PathBuf, ConfigPathProvenance)> {
        if let Some(path) = &self.explicit {
            return Some((path.clone(), ConfigPathProvenance::Explicit));
        }
        if let Some(path) = &self.env {
            return Some((path.clone(), ConfigPathProvenance::Env));
        }
        if let Some(path) = &self.default {
            return Some((path.clone(), ConfigPathProvenance::Default));
        }
        None
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ConfigPathProvenance {
    Explicit,
    Env,
    Default,
}

impl ConfigPathProvenance {
    fn is_explicit(self) -> bool {
        matches!(
            self,
            ConfigPathProvenance::Explicit | ConfigPathProvenance::Env
        )
    }
}

#[derive(Debug)]
pub struct ConfigLoad {
    pub config: Config,
    pub warnings: ConfigWarnings,
}
