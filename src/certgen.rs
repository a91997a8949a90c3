//! Certgen Backend Bridge
//!
//! Spawns the external `certgen` tool for each operation and speaks the
//! JSON-on-stdio protocol defined in [`crate::protocol`]. One invocation is
//! one request/response round trip: the action goes on the command line,
//! the request document on stdin, and the response document comes back on
//! stdout once the process exits. There is no queuing, retry, or timeout;
//! a failed process is reported with its exit code and stderr text.

use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use serde::Serialize;
use thiserror::Error;
use tracing::{debug, trace};
use uuid::Uuid;

use crate::protocol::{
    Action, ExportCertificatesRequest, ExportedCertificate, ImportCertificateRequest, PingRequest,
    PingResponse, VersionResponse,
};
use crate::request::Certificate;

/// Errors from a certgen invocation.
#[derive(Debug, Error)]
pub enum CertgenError {
    /// The backend binary could not be started at all.
    #[error("failed to launch certgen backend at '{path}': {source}")]
    Spawn {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// I/O failed while feeding stdin or collecting output.
    #[error("i/o failure while talking to the certgen backend: {0}")]
    Io(#[from] std::io::Error),

    /// The backend exited non-zero; `message` is its trimmed stderr.
    #[error("certgen backend rejected the request: {message}")]
    Backend { code: Option<i32>, message: String },

    /// The backend exited cleanly but its output was not valid JSON for
    /// the expected response type.
    #[error("certgen backend returned malformed JSON: {0}")]
    Json(#[from] serde_json::Error),

    /// The backend answered with something structurally valid but wrong,
    /// such as a ping that does not echo the nonce.
    #[error("certgen protocol violation: {0}")]
    Protocol(String),
}

/// Handle on the certgen backend binary.
#[derive(Debug, Clone)]
pub struct Certgen {
    binary_path: PathBuf,
}

impl Certgen {
    pub fn new<P: Into<PathBuf>>(binary_path: P) -> Self {
        Self {
            binary_path: binary_path.into(),
        }
    }

    pub fn binary_path(&self) -> &Path {
        &self.binary_path
    }

    /// Run one action against the backend and return its raw stdout.
    fn run<T: Serialize>(&self, action: Action, payload: &T) -> Result<String, CertgenError> {
        let body = serde_json::to_string(payload)?;

        debug!(action = %action, backend = %self.binary_path.display(), "invoking certgen backend");
        let mut child = Command::new(&self.binary_path)
            .arg(action.as_str())
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|source| CertgenError::Spawn {
                path: self.binary_path.clone(),
                source,
            })?;

        let mut stdin = child
            .stdin
            .take()
            .ok_or_else(|| CertgenError::Protocol("backend stdin was not captured".to_string()))?;
        stdin.write_all(body.as_bytes())?;
        // closing stdin signals the backend that the request is complete
        drop(stdin);

        let output = child.wait_with_output()?;
        let stdout = String::from_utf8_lossy(&output.stdout).into_owned();
        let stderr = String::from_utf8_lossy(&output.stderr);
        trace!(action = %action, stdout = %stdout, stderr = %stderr, "certgen backend replied");

        if output.status.success() {
            Ok(stdout)
        } else {
            debug!(action = %action, code = ?output.status.code(), "certgen backend failed");
            Err(CertgenError::Backend {
                code: output.status.code(),
                message: stderr.trim().to_string(),
            })
        }
    }

    /// Liveness check: the backend must echo a random nonce back.
    pub fn ping(&self) -> Result<(), CertgenError> {
        let request = PingRequest {
            nonce: Uuid::new_v4().to_string(),
        };
        let response: PingResponse = serde_json::from_str(&self.run(Action::Ping, &request)?)?;
        if !response.ok || response.nonce != request.nonce {
            return Err(CertgenError::Protocol(
                "ping response did not echo the nonce".to_string(),
            ));
        }
        Ok(())
    }

    /// Parse a certificate container. `data` is the hex-encoded file
    /// content, `password` unlocks it when encrypted.
    pub fn import_certificate(
        &self,
        data: &str,
        password: &str,
    ) -> Result<Certificate, CertgenError> {
        let request = ImportCertificateRequest {
            data: data.to_string(),
            password: password.to_string(),
        };
        Ok(serde_json::from_str(
            &self.run(Action::ImportCertificate, &request)?,
        )?)
    }

    /// Generate and write every requested certificate; returns the files
    /// the backend produced.
    pub fn export_certificates(
        &self,
        request: &ExportCertificatesRequest,
    ) -> Result<ExportedCertificate, CertgenError> {
        Ok(serde_json::from_str(
            &self.run(Action::ExportCertificates, request)?,
        )?)
    }

    pub fn version(&self) -> Result<String, CertgenError> {
        let response: VersionResponse =
            serde_json::from_str(&self.run(Action::GetVersion, &serde_json::json!({}))?)?;
        Ok(response.version)
    }
}
