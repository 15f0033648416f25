use std::path::{Component, Path};

use thiserror::Error;

use crate::models::Config;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigWarning {
    pub message: String,
    pub hint: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConfigWarnings {
    pub items: Vec<ConfigWarning>,
}

impl ConfigWarnings {
    pub fn push(&mut self, message: impl Into<String>) {
        self.items.push(ConfigWarning {
            message: message.into(),
            hint: None,
        });
    }

    pub fn push_with_hint(
        &mut self,
        message: impl Into<String>,
        hint: impl Into<String>,
    ) {
        self.items.push(ConfigWarning {
            message: message.into(),
            hint: Some(hint.into()),
        });
    }

    pub fn extend(&mut self, other: ConfigWarnings) {
        self.items.extend(other.items);
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigGuardRailError {
    #[error("{key} must be greater than zero")]
    ZeroTimeout { key: &'static str },
    #[error("invalid output file name '{name}': must be a single path component")]
    InvalidFileName { name: String },
}

/// Reject settings that can never work; warn about ones that look wrong.
pub fn apply_guard_rails(
    config: &Config,
) -> Result<ConfigWarnings, ConfigGuardRailError> {
    let mut warnings = ConfigWarnings::default();

    if config.fetch.timeout.is_zero() {
        return Err(ConfigGuardRailError::ZeroTimeout {
            key: "fetch.timeout",
        });
    }
    if config.fetch.connect_timeout.is_zero() {
        return Err(ConfigGuardRailError::ZeroTimeout {
            key: "fetch.connect_timeout",
        });
    }

    let name = config.storage.file_name.as_str();
    if !is_single_component(name) {
        return Err(ConfigGuardRailError::InvalidFileName {
            name: name.to_string(),
        });
    }

    if config.fetch.connect_timeout > config.fetch.timeout {
        warnings.push_with_hint(
            "fetch.connect_timeout exceeds fetch.timeout; the request timeout wins",
            "Lower connect_timeout or raise timeout",
        );
    }

    let has_png_ext = Path::new(name)
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("png"));
    if !has_png_ext {
        warnings.push_with_hint(
            format!("output file '{name}' has no .png extension"),
            "The file is always PNG-encoded regardless of its name",
        );
    }

    Ok(warnings)
}

fn is_single_component(name: &str) -> bool {
    if name.trim().is_empty() {
        return false;
    }
    let mut components = Path::new(name).components();
    matches!(
        (components.next(), components.next()),
        (Some(Component::Normal(_)), None)
    ) && !name.contains(['/', '\\'])
}
