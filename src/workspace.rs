//! Certificate Workspace
//!
//! Owns the ordered list of certificate requests being composed, the
//! selection, and the optional imported root certificate. Slot 0 is always
//! the root of the hierarchy (either a request the user is composing or a
//! read-only placeholder for an imported certificate) and every later slot
//! is a leaf signed by it.
//!
//! The workspace enforces the structural rules (the root cannot be removed
//! or duplicated, at most [`MAX_REQUESTS`] entries) while
//! [`crate::validator`] covers per-request field rules.

use std::fs;
use std::path::Path;

use anyhow::{bail, Context, Result};

use crate::configs::RequestDefaults;
use crate::request::{Certificate, CertificateRequest};
use crate::validator;

/// Upper bound on requests in a single workspace.
pub const MAX_REQUESTS: usize = 128;

#[derive(Debug, Clone)]
pub struct Workspace {
    certificates: Vec<CertificateRequest>,
    imported_root: Option<Certificate>,
    selected: usize,
    defaults: RequestDefaults,
}

impl Workspace {
    /// A fresh workspace holding one blank root request.
    pub fn new(defaults: RequestDefaults) -> Self {
        Self {
            certificates: vec![CertificateRequest::root(&defaults)],
            imported_root: None,
            selected: 0,
            defaults,
        }
    }

    pub fn certificates(&self) -> &[CertificateRequest] {
        &self.certificates
    }

    pub fn selected_index(&self) -> usize {
        self.selected
    }

    pub fn selected_request(&self) -> &CertificateRequest {
        &self.certificates[self.selected]
    }

    pub fn imported_root(&self) -> Option<&Certificate> {
        self.imported_root.as_ref()
    }

    pub fn select(&mut self, index: usize) -> Result<()> {
        if index >= self.certificates.len() {
            bail!("no certificate at position {}", index + 1);
        }
        self.selected = index;
        Ok(())
    }

    /// Append a blank leaf request and select it.
    pub fn add_leaf(&mut self) -> Result<usize> {
        if self.certificates.len() >= MAX_REQUESTS {
            bail!(
                "a workspace cannot hold more than {} certificates",
                MAX_REQUESTS
            );
        }
        self.certificates
            .push(CertificateRequest::leaf(&self.defaults));
        self.selected = self.certificates.len() - 1;
        Ok(self.selected)
    }

    /// Replace the selected request with an edited copy.
    pub fn replace_selected(&mut self, request: CertificateRequest) {
        self.certificates[self.selected] = request;
    }

    /// Deep-copy a leaf to the end of the list. The selection stays put.
    pub fn duplicate(&mut self, index: usize) -> Result<usize> {
        let Some(request) = self.certificates.get(index) else {
            bail!("no certificate at position {}", index + 1);
        };
        if request.is_certificate_authority {
            bail!("the root certificate cannot be duplicated");
        }
        if self.certificates.len() >= MAX_REQUESTS {
            bail!(
                "a workspace cannot hold more than {} certificates",
                MAX_REQUESTS
            );
        }
        let copy = request.clone();
        self.certificates.push(copy);
        Ok(self.certificates.len() - 1)
    }

    /// Remove a leaf. Removing at or below the selection moves the
    /// selection down one so it keeps pointing at the same request.
    pub fn remove(&mut self, index: usize) -> Result<()> {
        if index == 0 {
            bail!("the root certificate cannot be removed");
        }
        if index >= self.certificates.len() {
            bail!("no certificate at position {}", index + 1);
        }
        self.certificates.remove(index);
        if index <= self.selected {
            self.selected -= 1;
        }
        Ok(())
    }

    /// Replace the root slot with an imported certificate.
    pub fn import_root(&mut self, certificate: Certificate) {
        self.certificates[0] = CertificateRequest::imported(&certificate);
        self.imported_root = Some(certificate);
    }

    /// Throw away the imported root and restore a blank root request.
    pub fn cancel_import(&mut self) {
        self.certificates[0] = CertificateRequest::root(&self.defaults);
        self.imported_root = None;
    }

    /// `(index, reason)` for every request that is not ready to export.
    pub fn invalid_requests(&self) -> Vec<(usize, String)> {
        self.certificates
            .iter()
            .enumerate()
            .filter_map(|(index, request)| {
                validator::validate_request(request).map(|reason| (index, reason))
            })
            .collect()
    }

    pub fn is_exportable(&self) -> bool {
        self.invalid_requests().is_empty()
    }

    /// Persist the request list as a JSON array.
    pub fn save(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(&self.certificates)
            .context("failed to serialize the workspace")?;
        fs::write(path, json)
            .with_context(|| format!("failed to write workspace file {}", path.display()))?;
        Ok(())
    }

    /// Load a request list saved with [`Workspace::save`]. The selection
    /// resets to the root and any previous import is forgotten.
    pub fn load(path: &Path, defaults: RequestDefaults) -> Result<Self> {
        let raw = fs::read_to_string(path)
            .with_context(|| format!("failed to read workspace file {}", path.display()))?;
        let certificates: Vec<CertificateRequest> = serde_json::from_str(&raw)
            .with_context(|| format!("{} is not a valid workspace file", path.display()))?;
        if certificates.is_empty() {
            bail!("{} contains no certificate requests", path.display());
        }
        Ok(Self {
            certificates,
            imported_root: None,
            selected: 0,
            defaults,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::request::Name;
    use tempfile::TempDir;

    fn workspace() -> Workspace {
        Workspace::new(RequestDefaults::default())
    }

    #[test]
    fn test_new_workspace_has_root() {
        let workspace = workspace();
        assert_eq!(workspace.certificates().len(), 1);
        assert!(workspace.certificates()[0].is_certificate_authority);
        assert_eq!(workspace.selected_index(), 0);
    }

    #[test]
    fn test_add_leaf_selects_it() {
        let mut workspace = workspace();
        let index = workspace.add_leaf().unwrap();
        assert_eq!(index, 1);
        assert_eq!(workspace.selected_index(), 1);
        assert!(!workspace.selected_request().is_certificate_authority);
    }

    #[test]
    fn test_request_cap() {
        let mut workspace = workspace();
        for _ in 1..MAX_REQUESTS {
            workspace.add_leaf().unwrap();
        }
        assert_eq!(workspace.certificates().len(), MAX_REQUESTS);
        assert!(workspace.add_leaf().is_err());
    }

    #[test]
    fn test_remove_adjusts_selection() {
        let mut workspace = workspace();
        workspace.add_leaf().unwrap();
        workspace.add_leaf().unwrap();
        workspace.add_leaf().unwrap();
        workspace.select(2).unwrap();

        // removing below the selection shifts it down
        workspace.remove(1).unwrap();
        assert_eq!(workspace.selected_index(), 1);

        // removing above the selection leaves it alone
        workspace.remove(2).unwrap();
        assert_eq!(workspace.selected_index(), 1);
    }

    #[test]
    fn test_remove_selected_moves_to_previous() {
        let mut workspace = workspace();
        workspace.add_leaf().unwrap();
        workspace.remove(1).unwrap();
        assert_eq!(workspace.selected_index(), 0);
        assert_eq!(workspace.certificates().len(), 1);
    }

    #[test]
    fn test_root_cannot_be_removed_or_duplicated() {
        let mut workspace = workspace();
        assert!(workspace.remove(0).is_err());
        assert!(workspace.duplicate(0).is_err());
    }

    #[test]
    fn test_duplicate_leaf() {
        let mut workspace = workspace();
        workspace.add_leaf().unwrap();
        let mut request = workspace.selected_request().clone();
        request.subject.common_name = "copy-me.example.com".to_string();
        workspace.replace_selected(request);

        let index = workspace.duplicate(1).unwrap();
        assert_eq!(index, 2);
        assert_eq!(
            workspace.certificates()[2].subject.common_name,
            "copy-me.example.com"
        );
        // duplication does not steal the selection
        assert_eq!(workspace.selected_index(), 1);
    }

    #[test]
    fn test_import_and_cancel() {
        let mut workspace = workspace();
        workspace.import_root(Certificate {
            certificate_authority: true,
            subject: Name {
                common_name: "Imported Root".to_string(),
                ..Name::default()
            },
            certificate_data: "3082".to_string(),
            key_data: String::new(),
        });
        assert!(workspace.certificates()[0].imported);
        assert!(workspace.imported_root().is_some());
        assert_eq!(
            workspace.certificates()[0].subject.common_name,
            "Imported Root"
        );

        workspace.cancel_import();
        assert!(!workspace.certificates()[0].imported);
        assert!(workspace.imported_root().is_none());
        assert!(workspace.certificates()[0].subject.common_name.is_empty());
    }

    #[test]
    fn test_invalid_requests_reported_by_index() {
        let mut workspace = workspace();
        let mut root = workspace.selected_request().clone();
        root.subject.common_name = "Test Root".to_string();
        workspace.replace_selected(root);
        workspace.add_leaf().unwrap();

        // the fresh leaf has no common name yet
        let invalid = workspace.invalid_requests();
        assert_eq!(invalid.len(), 1);
        assert_eq!(invalid[0].0, 1);
        assert!(!workspace.is_exportable());
    }

    #[test]
    fn test_save_load_round_trip() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("workspace.json");

        let mut workspace = workspace();
        let mut root = workspace.selected_request().clone();
        root.subject.common_name = "Round Trip CA".to_string();
        workspace.replace_selected(root);
        workspace.add_leaf().unwrap();
        workspace.save(&path).unwrap();

        let loaded = Workspace::load(&path, RequestDefaults::default()).unwrap();
        assert_eq!(loaded.certificates().len(), 2);
        assert_eq!(
            loaded.certificates()[0].subject.common_name,
            "Round Trip CA"
        );
        assert_eq!(loaded.selected_index(), 0);
    }

    #[test]
    fn test_load_rejects_empty_list() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("workspace.json");
        fs::write(&path, "[]").unwrap();
        assert!(Workspace::load(&path, RequestDefaults::default()).is_err());
    }
}
