//! CLI configuration file
//!
//! ```toml
//! [evidence]
//! authority_version = "2.1.0"
//!
//! [log]
//! level = "debug"
//! format = "json"
//! ```

use anyhow::Context as _;
use serde::{Deserialize, Serialize};
use std::path::Path;
use warden_evidence::EvidenceConfig;

/// Log output format
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Human-readable lines
    #[default]
    Text,
    /// One JSON object per event
    Json,
}

impl std::str::FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "text" => Ok(Self::Text),
            "json" => Ok(Self::Json),
            other => Err(format!("unknown log format: {other}")),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    /// Filter directive, e.g. `info` or `warden_evidence=debug`
    pub level: String,
    /// Output format
    pub format: LogFormat,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::Text,
        }
    }
}

/// Top-level configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct WardenConfig {
    /// Evidence settings
    pub evidence: EvidenceConfig,
    /// Logging settings
    pub log: LogConfig,
}

impl WardenConfig {
    /// Parse TOML text
    ///
    /// # Errors
    /// Returns error on malformed TOML, unknown sections or empty evidence fields
    pub fn from_toml(text: &str) -> anyhow::Result<Self> {
        let config: Self = toml::from_str(text).context("invalid warden configuration")?;
        config
            .evidence
            .validate()
            .context("invalid [evidence] section")?;
        Ok(config)
    }

    /// Load from `path`, or defaults when no path is given
    ///
    /// # Errors
    /// Returns error if the file cannot be read or parsed
    pub fn load(path: Option<&Path>) -> anyhow::Result<Self> {
        let Some(path) = path else {
            return Ok(Self::default());
        };
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config {}", path.display()))?;
        Self::from_toml(&text).with_context(|| format!("in {}", path.display()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn empty_file_is_default() {
        assert_eq!(WardenConfig::from_toml("").unwrap(), WardenConfig::default());
    }

    #[test]
    fn partial_sections_fill_defaults() {
        let config = WardenConfig::from_toml(
            r#"
            [evidence]
            authority_version = "2.1.0"

            [log]
            format = "json"
            "#,
        )
        .unwrap();
        assert_eq!(config.evidence.authority_version, "2.1.0");
        assert_eq!(config.evidence.principal_key, "principal_id");
        assert_eq!(config.log.format, LogFormat::Json);
        assert_eq!(config.log.level, "info");
    }

    #[test]
    fn empty_authority_version_rejected() {
        let err = WardenConfig::from_toml("[evidence]\nauthority_version = \"\"\n").unwrap_err();
        assert!(format!("{err:#}").contains("authority_version must be non-empty"));
    }

    #[test]
    fn unknown_section_rejected() {
        assert!(WardenConfig::from_toml("[metrics]\nenabled = true").is_err());
    }

    #[test]
    fn load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("warden.toml");
        std::fs::write(&path, "[log]\nlevel = \"debug\"\n").unwrap();
        let config = WardenConfig::load(Some(&path)).unwrap();
        assert_eq!(config.log.level, "debug");

        assert!(WardenConfig::load(Some(&dir.path().join("missing.toml"))).is_err());
        assert_eq!(WardenConfig::load(None).unwrap(), WardenConfig::default());
    }
}
