//! fleetimage.toml configuration parser.

use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

/// Data type marker carried by image-parameter change notifications.
pub const IMAGE_DATA_TYPE: &str = "aws:ec2:image";

/// Source version new launch configuration versions inherit from.
pub const LATEST_VERSION: &str = "$Latest";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: String,
        source: std::io::Error,
    },

    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("failed to render config: {0}")]
    Render(#[from] toml::ser::Error),
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FleetImageConfig {
    pub trigger: TriggerConfig,
    pub update: UpdateConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TriggerConfig {
    /// Notifications whose `dataType` differs from this are ignored.
    pub image_data_type: String,
}

impl Default for TriggerConfig {
    fn default() -> Self {
        Self {
            image_data_type: IMAGE_DATA_TYPE.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct UpdateConfig {
    pub source_version: String,
    pub dry_run: bool,
}

impl Default for UpdateConfig {
    fn default() -> Self {
        Self {
            source_version: LATEST_VERSION.to_string(),
            dry_run: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// `EnvFilter` directives used when `RUST_LOG` is unset.
    pub filter: String,
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: "info,fleetimage=debug".to_string(),
            json: false,
        }
    }
}

impl FleetImageConfig {
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(content)?)
    }

    pub fn to_toml_string(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_file_uses_defaults() {
        let config = FleetImageConfig::from_toml_str("").unwrap();
        assert_eq!(config, FleetImageConfig::default());
        assert_eq!(config.trigger.image_data_type, "aws:ec2:image");
        assert_eq!(config.update.source_version, "$Latest");
        assert!(!config.update.dry_run);
    }

    #[test]
    fn partial_section_keeps_other_defaults() {
        let toml_str = r#"
[update]
dry_run = true
"#;
        let config = FleetImageConfig::from_toml_str(toml_str).unwrap();
        assert!(config.update.dry_run);
        assert_eq!(config.update.source_version, "$Latest");
        assert_eq!(config.logging, LoggingConfig::default());
    }

    #[test]
    fn render_and_reload_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("fleetimage.toml");

        let mut config = FleetImageConfig::default();
        config.trigger.image_data_type = "custom:image".to_string();
        std::fs::write(&path, config.to_toml_string().unwrap()).unwrap();

        let loaded = FleetImageConfig::from_file(&path).unwrap();
        assert_eq!(loaded.trigger.image_data_type, "custom:image");
    }

    #[test]
    fn missing_file_reports_path() {
        let err = FleetImageConfig::from_file(Path::new("/nonexistent/fleetimage.toml"))
            .unwrap_err();
        assert!(err.to_string().contains("/nonexistent/fleetimage.toml"));
    }

    #[test]
    fn rejects_malformed_toml() {
        let err = FleetImageConfig::from_toml_str("[update\ndry_run = 1").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }
}
