//! Non-interactive export of a saved workspace file.

use std::fs;
use std::path::Path;

use anyhow::{bail, Context, Result};

use certsmith::certgen::Certgen;
use certsmith::exporter::{self, ExportOptions};
use certsmith::request::CertificateRequest;
use certsmith::validator;

/// Handle the `export` subcommand.
///
/// Reads the certificate requests saved from the UI (a JSON array), runs
/// them through validation, and performs one export round trip. Imported
/// roots are a UI-session concept and are not part of saved workspaces,
/// so the backend always generates the root here.
pub fn handle_export(certgen: &Certgen, requests_path: &Path, options: &ExportOptions) -> Result<()> {
    let raw = fs::read_to_string(requests_path)
        .with_context(|| format!("failed to read workspace file {}", requests_path.display()))?;
    let requests: Vec<CertificateRequest> = serde_json::from_str(&raw)
        .with_context(|| format!("{} is not a valid workspace file", requests_path.display()))?;

    if requests.is_empty() {
        bail!("{} contains no certificate requests", requests_path.display());
    }

    let problems: Vec<String> = requests
        .iter()
        .enumerate()
        .filter_map(|(index, request)| {
            validator::validate_request(request)
                .map(|reason| format!("  certificate {}: {}", index + 1, reason))
        })
        .collect();
    if !problems.is_empty() {
        bail!(
            "cannot export, {} request(s) failed validation:\n{}",
            problems.len(),
            problems.join("\n")
        );
    }

    println!(
        "Exporting {} certificate request(s) to {}...",
        requests.len(),
        options.export_dir.display()
    );

    let exported = exporter::export_requests(certgen, &requests, None, options)?;

    println!("✓ Export complete, {} file(s) written:", exported.files.len());
    for file in &exported.files {
        println!("  {}", file);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use certsmith::configs::RequestDefaults;
    use certsmith::exporter::ExportFormat;
    use tempfile::TempDir;

    fn options(dir: &TempDir) -> ExportOptions {
        ExportOptions {
            export_dir: dir.path().join("out"),
            format: ExportFormat::Pem,
            password: String::new(),
            include_ca: true,
        }
    }

    #[test]
    fn test_missing_file() {
        let dir = TempDir::new().unwrap();
        let certgen = Certgen::new(dir.path().join("missing-backend"));
        let error = handle_export(&certgen, &dir.path().join("nope.json"), &options(&dir))
            .unwrap_err();
        assert!(error.to_string().contains("nope.json"));
    }

    #[test]
    fn test_invalid_requests_listed_before_backend_runs() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("workspace.json");
        // a blank root request is not exportable: no common name
        let requests = vec![CertificateRequest::root(&RequestDefaults::default())];
        fs::write(&path, serde_json::to_string(&requests).unwrap()).unwrap();

        // the backend path does not exist, so reaching it would error
        // differently than the validation failure asserted here
        let certgen = Certgen::new(dir.path().join("missing-backend"));
        let error = handle_export(&certgen, &path, &options(&dir)).unwrap_err();
        assert!(error.to_string().contains("failed validation"));
        assert!(error.to_string().contains("common name"));
    }

    #[test]
    fn test_empty_workspace_rejected() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("workspace.json");
        fs::write(&path, "[]").unwrap();

        let certgen = Certgen::new(dir.path().join("missing-backend"));
        let error = handle_export(&certgen, &path, &options(&dir)).unwrap_err();
        assert!(error.to_string().contains("no certificate requests"));
    }
}
