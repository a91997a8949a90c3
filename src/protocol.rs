//! Certgen Wire Protocol
//!
//! Request and response types for the certgen backend. The backend is
//! invoked as `certgen <ACTION>`, reads exactly one JSON document from
//! stdin, and writes exactly one JSON document to stdout before exiting.
//! A non-zero exit code means the request was rejected and stderr carries
//! the reason.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::exporter::ExportFormat;
use crate::request::{Certificate, CertificateRequest};

/// The actions the certgen backend understands. The action name is passed
/// as the single command-line argument.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Ping,
    ImportCertificate,
    ExportCertificates,
    GetVersion,
}

impl Action {
    pub fn as_str(&self) -> &'static str {
        match self {
            Action::Ping => "PING",
            Action::ImportCertificate => "IMPORT_CERTIFICATE",
            Action::ExportCertificates => "EXPORT_CERTIFICATES",
            Action::GetVersion => "GET_VERSION",
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// `PING` request. The backend must echo the nonce back.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PingRequest {
    #[serde(rename = "Nonce")]
    pub nonce: String,
}

/// `PING` response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PingResponse {
    #[serde(rename = "OK")]
    pub ok: bool,
    #[serde(rename = "Nonce")]
    pub nonce: String,
}

/// `IMPORT_CERTIFICATE` request. `Data` is the hex-encoded certificate
/// container read from disk; `Password` unlocks it when encrypted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImportCertificateRequest {
    #[serde(rename = "Data")]
    pub data: String,
    #[serde(rename = "Password")]
    pub password: String,
}

/// `EXPORT_CERTIFICATES` request: every composed request plus the export
/// destination and output options. `ImportedRoot` is present only when the
/// root slot holds an imported certificate; the backend then signs the
/// leaves with it instead of generating a root.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ExportCertificatesRequest {
    pub export_dir: String,
    pub requests: Vec<CertificateRequest>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub imported_root: Option<Certificate>,
    #[serde(rename = "IncludeCA")]
    pub include_ca: bool,
    pub format: ExportFormat,
    pub password: String,
}

/// `EXPORT_CERTIFICATES` response: the files written, relative to the
/// export directory.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExportedCertificate {
    #[serde(rename = "Files")]
    pub files: Vec<String>,
}

/// `GET_VERSION` response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VersionResponse {
    #[serde(rename = "Version")]
    pub version: String,
}
