//! Certificate Export
//!
//! Turns a set of validated certificate requests into one
//! `EXPORT_CERTIFICATES` round trip against the backend. The exporter is
//! the only gate between the editing surface and the backend: it refuses
//! to run while any request is invalid, creates the destination directory,
//! and hands the caller the list of files the backend wrote.

use std::fmt;
use std::fs;
use std::path::PathBuf;
use std::str::FromStr;

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::certgen::Certgen;
use crate::protocol::{ExportCertificatesRequest, ExportedCertificate};
use crate::request::{Certificate, CertificateRequest};
use crate::validator;
use crate::workspace::Workspace;

/// On-disk format the backend writes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum ExportFormat {
    #[default]
    #[serde(rename = "PEM")]
    Pem,
    #[serde(rename = "PKCS12")]
    Pkcs12,
}

impl fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExportFormat::Pem => write!(f, "PEM"),
            ExportFormat::Pkcs12 => write!(f, "PKCS12"),
        }
    }
}

impl FromStr for ExportFormat {
    type Err = anyhow::Error;

    fn from_str(value: &str) -> Result<Self> {
        match value.to_ascii_lowercase().as_str() {
            "pem" => Ok(ExportFormat::Pem),
            "pkcs12" | "p12" => Ok(ExportFormat::Pkcs12),
            other => bail!("unknown export format '{}' (expected pem or pkcs12)", other),
        }
    }
}

/// Where and how to export.
#[derive(Debug, Clone)]
pub struct ExportOptions {
    pub export_dir: PathBuf,
    pub format: ExportFormat,
    /// Protects exported private keys; empty means unprotected.
    pub password: String,
    /// Also write the CA certificate next to the leaves.
    pub include_ca: bool,
}

impl ExportOptions {
    pub fn from_config(defaults: &crate::configs::ExportDefaults) -> Self {
        Self {
            export_dir: defaults.directory.clone(),
            format: defaults.format,
            password: String::new(),
            include_ca: defaults.include_ca,
        }
    }
}

/// Export a slice of requests through the backend.
///
/// Every non-imported request must pass validation; the first failure
/// aborts the export before the backend is touched.
pub fn export_requests(
    certgen: &Certgen,
    requests: &[CertificateRequest],
    imported_root: Option<&Certificate>,
    options: &ExportOptions,
) -> Result<ExportedCertificate> {
    if requests.is_empty() {
        bail!("there are no certificate requests to export");
    }
    for (index, request) in requests.iter().enumerate() {
        if let Some(reason) = validator::validate_request(request) {
            bail!(
                "certificate {} is not ready to export: {}",
                index + 1,
                reason
            );
        }
    }

    fs::create_dir_all(&options.export_dir).with_context(|| {
        format!(
            "failed to create export directory {}",
            options.export_dir.display()
        )
    })?;

    let request = ExportCertificatesRequest {
        export_dir: options.export_dir.display().to_string(),
        requests: requests.to_vec(),
        imported_root: imported_root.cloned(),
        include_ca: options.include_ca,
        format: options.format,
        password: options.password.clone(),
    };

    let exported = certgen
        .export_certificates(&request)
        .context("certgen backend failed to export the certificates")?;

    info!(
        count = exported.files.len(),
        directory = %options.export_dir.display(),
        "exported certificates"
    );
    Ok(exported)
}

/// Export the whole workspace.
pub fn export_workspace(
    certgen: &Certgen,
    workspace: &Workspace,
    options: &ExportOptions,
) -> Result<ExportedCertificate> {
    export_requests(
        certgen,
        workspace.certificates(),
        workspace.imported_root(),
        options,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::configs::RequestDefaults;
    use tempfile::TempDir;

    #[test]
    fn test_format_parsing() {
        assert_eq!("pem".parse::<ExportFormat>().unwrap(), ExportFormat::Pem);
        assert_eq!("PEM".parse::<ExportFormat>().unwrap(), ExportFormat::Pem);
        assert_eq!(
            "pkcs12".parse::<ExportFormat>().unwrap(),
            ExportFormat::Pkcs12
        );
        assert_eq!("p12".parse::<ExportFormat>().unwrap(), ExportFormat::Pkcs12);
        assert!("der".parse::<ExportFormat>().is_err());
    }

    #[test]
    fn test_format_wire_encoding() {
        assert_eq!(serde_json::to_string(&ExportFormat::Pem).unwrap(), "\"PEM\"");
        assert_eq!(
            serde_json::to_string(&ExportFormat::Pkcs12).unwrap(),
            "\"PKCS12\""
        );
    }

    #[test]
    fn test_invalid_request_blocks_export() {
        let dir = TempDir::new().unwrap();
        // blank root: no common name yet, so the backend must not even be
        // looked up (the path does not exist)
        let requests = vec![CertificateRequest::root(&RequestDefaults::default())];
        let certgen = Certgen::new(dir.path().join("missing-backend"));
        let options = ExportOptions {
            export_dir: dir.path().join("out"),
            format: ExportFormat::Pem,
            password: String::new(),
            include_ca: true,
        };

        let error = export_requests(&certgen, &requests, None, &options).unwrap_err();
        assert!(error.to_string().contains("certificate 1 is not ready"));
        assert!(!dir.path().join("out").exists());
    }

    #[test]
    fn test_empty_request_list_rejected() {
        let dir = TempDir::new().unwrap();
        let certgen = Certgen::new(dir.path().join("missing-backend"));
        let options = ExportOptions {
            export_dir: dir.path().join("out"),
            format: ExportFormat::Pem,
            password: String::new(),
            include_ca: true,
        };
        assert!(export_requests(&certgen, &[], None, &options).is_err());
    }
}
