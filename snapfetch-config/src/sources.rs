use serde::{Deserialize, Serialize};
use std::{path::PathBuf, time::Duration};

/// Raw configuration as defined in a TOML file.
#[derive(Debug, Default, Clone, Deserialize, Serialize)]
#[serde(rename_all = "snake_case", deny_unknown_fields)]
pub struct FileConfig {
    #[serde(default)]
    pub fetch: FileFetchConfig,
    #[serde(default)]
    pub storage: FileStorageConfig,
}

#[derive(Debug, Default, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct FileFetchConfig {
    #[serde(
        default,
        with = "humantime_serde",
        skip_serializing_if = "Option::is_none"
    )]
    pub timeout: Option<Duration>,
    #[serde(
        default,
        with = "humantime_serde",
        skip_serializing_if = "Option::is_none"
    )]
    pub connect_timeout: Option<Duration>,
}

#[derive(Debug, Default, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct FileStorageConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dir: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file_name: Option<String>,
}

/// Values taken from the process environment (after `.env` loading).
///
/// Durations stay raw here so the loader can report which variable was bad.
#[derive(Debug, Default, Clone)]
pub struct EnvConfig {
    pub config_path: Option<PathBuf>,
    pub timeout: Option<String>,
    pub connect_timeout: Option<String>,
    pub output_dir: Option<PathBuf>,
    pub file_name: Option<String>,
}

pub const ENV_CONFIG_PATH: &str = "SNAPFETCH_CONFIG";
pub const ENV_TIMEOUT: &str = "SNAPFETCH_TIMEOUT";
pub const ENV_CONNECT_TIMEOUT: &str = "SNAPFETCH_CONNECT_TIMEOUT";
pub const ENV_OUTPUT_DIR: &str = "SNAPFETCH_OUTPUT_DIR";
pub const ENV_FILE_NAME: &str = "SNAPFETCH_FILE_NAME";

impl EnvConfig {
    pub fn gather() -> Self {
        Self {
            config_path: non_empty_var(ENV_CONFIG_PATH).map(PathBuf::from),
            timeout: non_empty_var(ENV_TIMEOUT),
            connect_timeout: non_empty_var(ENV_CONNECT_TIMEOUT),
            output_dir: non_empty_var(ENV_OUTPUT_DIR).map(PathBuf::from),
            file_name: non_empty_var(ENV_FILE_NAME),
        }
    }
}

fn non_empty_var(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}
