//! Configuration management with layered loading
//!
//! Precedence (lowest to highest):
//! 1. Compiled defaults
//! 2. Global config: `$XDG_CONFIG_HOME/srtree/srtree.toml`
//! 3. Explicit config file (`--config`)
//! 4. Environment variables: `SRTREE_*` prefix, `__` between sections

use std::path::{Path, PathBuf};

use config::{Config, ConfigError, Environment};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::application::{ApplicationError, IoResultExt, RenderSettings};
use crate::domain::DocumentType;

/// Raw render flags for intermediate parsing (`None` = not specified).
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default, deny_unknown_fields)]
pub struct RawRenderSettings {
    pub show_ids: Option<bool>,
    pub show_relationships: Option<bool>,
    pub show_values: Option<bool>,
}

/// Raw settings for intermediate parsing.
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default, deny_unknown_fields)]
pub struct RawSettings {
    pub document_type: Option<DocumentType>,
    pub render: RawRenderSettings,
}

/// Unified configuration for srtree.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct Settings {
    /// Content constraints for documents whose description names none
    pub document_type: DocumentType,
    /// Outline label contents
    pub render: RenderSettings,
}

/// Get the XDG config directory for srtree.
pub fn global_config_dir() -> Option<PathBuf> {
    ProjectDirs::from("", "", "srtree").map(|dirs| dirs.config_dir().to_path_buf())
}

/// Get the path to the global config file.
pub fn global_config_path() -> Option<PathBuf> {
    global_config_dir().map(|dir| dir.join("srtree.toml"))
}

/// Load a TOML file into RawSettings for manual merging.
fn load_raw_settings(path: &Path) -> Result<RawSettings, ApplicationError> {
    let content = std::fs::read_to_string(path).with_path(path)?;
    toml::from_str(&content).map_err(|e| ApplicationError::Config {
        message: format!("parse {}: {}", path.display(), e),
    })
}

impl Settings {
    /// Overlay wins where it specifies a value.
    fn merge_with(&self, overlay: &RawSettings) -> Self {
        Self {
            document_type: overlay.document_type.unwrap_or(self.document_type),
            render: RenderSettings {
                show_ids: overlay.render.show_ids.unwrap_or(self.render.show_ids),
                show_relationships: overlay
                    .render
                    .show_relationships
                    .unwrap_or(self.render.show_relationships),
                show_values: overlay.render.show_values.unwrap_or(self.render.show_values),
            },
        }
    }

    /// Load settings with layered precedence.
    ///
    /// # Arguments
    /// * `config_file` - Optional explicit config file, must exist when given
    pub fn load(config_file: Option<&Path>) -> Result<Self, ApplicationError> {
        let global = global_config_path().filter(|path| path.exists());
        Self::load_from(global.as_deref(), config_file)
    }

    /// Layered load with an explicit global file, used by [`load`](Self::load).
    pub fn load_from(
        global_file: Option<&Path>,
        config_file: Option<&Path>,
    ) -> Result<Self, ApplicationError> {
        // 1. Start with defaults
        let mut current = Self::default();

        // 2. Global config
        if let Some(global_path) = global_file {
            debug!(path = %global_path.display(), "loading global config");
            current = current.merge_with(&load_raw_settings(global_path)?);
        }

        // 3. Explicit config file
        if let Some(path) = config_file {
            debug!(path = %path.display(), "loading config file");
            current = current.merge_with(&load_raw_settings(path)?);
        }

        // 4. Environment variables (explicit override)
        Self::apply_env_overrides(current)
    }

    /// Apply SRTREE_* environment variables as explicit overrides.
    fn apply_env_overrides(mut settings: Self) -> Result<Self, ApplicationError> {
        // Use config crate just for env var parsing
        let config = Config::builder()
            .add_source(
                Environment::with_prefix("SRTREE")
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .map_err(config_err)?;

        if let Ok(val) = config.get_string("document_type") {
            settings.document_type = val.parse().map_err(|e| ApplicationError::Config {
                message: format!("SRTREE_DOCUMENT_TYPE: {e}"),
            })?;
        }
        if let Ok(val) = config.get_bool("render.show_ids") {
            settings.render.show_ids = val;
        }
        if let Ok(val) = config.get_bool("render.show_relationships") {
            settings.render.show_relationships = val;
        }
        if let Ok(val) = config.get_bool("render.show_values") {
            settings.render.show_values = val;
        }
        Ok(settings)
    }

    /// Show the effective configuration as TOML.
    pub fn to_toml(&self) -> Result<String, ApplicationError> {
        toml::to_string_pretty(self).map_err(|e| ApplicationError::Config {
            message: format!("serialize config: {e}"),
        })
    }
}

fn config_err(e: ConfigError) -> ApplicationError {
    ApplicationError::Config {
        message: e.to_string(),
    }
}
