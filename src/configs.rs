use anyhow::{Context, Result};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::exporter::ExportFormat;
use crate::request::KeyType;

#[derive(Debug, Deserialize, Clone, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub certgen: CertgenConfig,
    #[serde(default)]
    pub defaults: RequestDefaults,
    #[serde(default)]
    pub export: ExportDefaults,
}

#[derive(Debug, Deserialize, Clone)]
pub struct CertgenConfig {
    /// Backend binary; a bare name is resolved through `PATH`.
    #[serde(default = "default_certgen_binary")]
    pub binary_path: PathBuf,
}

impl Default for CertgenConfig {
    fn default() -> Self {
        Self {
            binary_path: default_certgen_binary(),
        }
    }
}

fn default_certgen_binary() -> PathBuf {
    PathBuf::from("certgen")
}

/// Defaults applied to newly created certificate requests.
#[derive(Debug, Deserialize, Clone)]
pub struct RequestDefaults {
    #[serde(default = "default_validity_days")]
    pub validity_days: u32,
    #[serde(default)]
    pub key_type: KeyType,
}

impl Default for RequestDefaults {
    fn default() -> Self {
        Self {
            validity_days: default_validity_days(),
            key_type: KeyType::default(),
        }
    }
}

fn default_validity_days() -> u32 {
    365
}

/// Defaults for the export dialog and the `export` subcommand.
#[derive(Debug, Deserialize, Clone)]
pub struct ExportDefaults {
    #[serde(default = "default_export_directory")]
    pub directory: PathBuf,
    #[serde(default)]
    pub format: ExportFormat,
    #[serde(default = "default_include_ca")]
    pub include_ca: bool,
}

impl Default for ExportDefaults {
    fn default() -> Self {
        Self {
            directory: default_export_directory(),
            format: ExportFormat::default(),
            include_ca: default_include_ca(),
        }
    }
}

fn default_export_directory() -> PathBuf {
    PathBuf::from("exports")
}

fn default_include_ca() -> bool {
    true
}

impl AppConfig {
    /// Load configuration from a TOML file
    pub fn from_file(path: &Path) -> Result<Self> {
        let config_str = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: AppConfig =
            toml::from_str(&config_str).context("Failed to parse config file")?;

        Ok(config)
    }

    /// Load configuration, falling back to defaults when the file does
    /// not exist.
    pub fn load_or_default(path: &Path) -> Result<Self> {
        if path.exists() {
            Self::from_file(path)
        } else {
            debug!(path = %path.display(), "no config file found, using defaults");
            Ok(Self::default())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = AppConfig::default();
        assert_eq!(config.certgen.binary_path, PathBuf::from("certgen"));
        assert_eq!(config.defaults.validity_days, 365);
        assert_eq!(config.defaults.key_type, KeyType::Ecdsa);
        assert_eq!(config.export.directory, PathBuf::from("exports"));
        assert_eq!(config.export.format, ExportFormat::Pem);
        assert!(config.export.include_ca);
    }

    #[test]
    fn test_empty_document_uses_defaults() {
        let config: AppConfig = toml::from_str("").unwrap();
        assert_eq!(config.defaults.validity_days, 365);
    }

    #[test]
    fn test_full_document() {
        let config: AppConfig = toml::from_str(
            r#"
            [certgen]
            binary_path = "/opt/certgen/bin/certgen"

            [defaults]
            validity_days = 730
            key_type = "RSA"

            [export]
            directory = "/srv/certs"
            format = "PKCS12"
            include_ca = false
            "#,
        )
        .unwrap();
        assert_eq!(
            config.certgen.binary_path,
            PathBuf::from("/opt/certgen/bin/certgen")
        );
        assert_eq!(config.defaults.validity_days, 730);
        assert_eq!(config.defaults.key_type, KeyType::Rsa);
        assert_eq!(config.export.directory, PathBuf::from("/srv/certs"));
        assert_eq!(config.export.format, ExportFormat::Pkcs12);
        assert!(!config.export.include_ca);
    }

    #[test]
    fn test_partial_section() {
        let config: AppConfig = toml::from_str(
            r#"
            [defaults]
            validity_days = 90
            "#,
        )
        .unwrap();
        assert_eq!(config.defaults.validity_days, 90);
        assert_eq!(config.defaults.key_type, KeyType::Ecdsa);
        assert_eq!(config.certgen.binary_path, PathBuf::from("certgen"));
    }
}
