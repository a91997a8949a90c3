//! Root Certificate Import
//!
//! Reads an existing certificate container from disk and asks the backend
//! to parse it. The file bytes travel hex-encoded inside the JSON request;
//! the backend handles every container format it supports and returns the
//! parsed [`Certificate`](crate::request::Certificate).

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use tracing::debug;

use crate::certgen::Certgen;
use crate::request::Certificate;

/// Import a certificate container for use as the workspace root.
///
/// `password` unlocks encrypted containers and may be empty for
/// unprotected ones.
pub fn import_from_file(certgen: &Certgen, path: &Path, password: &str) -> Result<Certificate> {
    let raw = fs::read(path)
        .with_context(|| format!("failed to read certificate file {}", path.display()))?;
    debug!(path = %path.display(), bytes = raw.len(), "importing certificate");

    let data = hex::encode(raw);
    certgen
        .import_certificate(&data, password)
        .with_context(|| format!("certgen backend could not import {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_file_reports_path() {
        let certgen = Certgen::new("certgen");
        let error =
            import_from_file(&certgen, Path::new("/nonexistent/root.p12"), "").unwrap_err();
        assert!(error.to_string().contains("/nonexistent/root.p12"));
    }

    #[cfg(unix)]
    #[test]
    fn test_import_reaches_backend_with_hex_payload() {
        use std::os::unix::fs::PermissionsExt;
        use tempfile::TempDir;

        let dir = TempDir::new().unwrap();
        let container = dir.path().join("root.p12");
        fs::write(&container, [0x30, 0x82, 0x01, 0x02]).unwrap();

        // the fake backend verifies that stdin contains the hex of the
        // container bytes before answering
        let backend = dir.path().join("certgen");
        fs::write(
            &backend,
            "#!/bin/sh\n\
             grep -q 30820102 || exit 1\n\
             echo '{\"CertificateAuthority\":true,\"Subject\":{\"CommonName\":\"Hex Root\"}}'\n",
        )
        .unwrap();
        let mut perms = fs::metadata(&backend).unwrap().permissions();
        perms.set_mode(0o755);
        fs::set_permissions(&backend, perms).unwrap();

        let certgen = Certgen::new(&backend);
        let certificate = import_from_file(&certgen, &container, "hunter2").unwrap();
        assert_eq!(certificate.subject.common_name, "Hex Root");
    }
}
