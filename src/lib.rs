//! certsmith - Certificate Request Workbench
//!
//! A workbench for composing X.509 certificate requests and exporting the
//! resulting certificates. certsmith never touches key material itself:
//! every cryptographic operation is delegated to the external `certgen`
//! tool, spoken to over a small JSON-on-stdio protocol. What lives here is
//! the request model, validation, workspace state, the subprocess bridge,
//! and the interactive surface around them.
//!
//! # Architecture
//!
//! ```text
//! TUI / CLI
//!   └── Workspace (request list, selection, imported root)
//!         └── Validator (per-request field rules)
//!         └── Exporter / Importer (orchestration)
//!               └── Certgen bridge ── spawns ──► certgen <ACTION>
//!                                                 stdin:  one JSON request
//!                                                 stdout: one JSON response
//! ```
//!
//! Each backend call is a single request/response round trip: spawn the
//! process with the action as its argument, write the request document to
//! stdin, collect stdout until exit, and parse. A non-zero exit code
//! rejects the call with the backend's stderr text.
//!
//! # Module Overview
//!
//! - [`request`]: the certificate request model and its wire encoding.
//! - [`validator`]: field rules a request must pass before export.
//! - [`workspace`]: the ordered request list being composed (one root,
//!   any number of leaves) with selection and import state.
//! - [`protocol`]: request/response types for the four backend actions
//!   (`PING`, `IMPORT_CERTIFICATE`, `EXPORT_CERTIFICATES`, `GET_VERSION`).
//! - [`certgen`]: the subprocess bridge.
//! - [`exporter`] / [`importer`]: export and import orchestration.
//! - [`configs`]: TOML configuration (backend path, request and export
//!   defaults).
//! - [`updates`]: startup check for a newer published release.
//!
//! # Example
//!
//! ```no_run
//! use certsmith::certgen::Certgen;
//! use certsmith::configs::AppConfig;
//! use certsmith::exporter::{self, ExportOptions};
//! use certsmith::workspace::Workspace;
//! use anyhow::Result;
//!
//! fn main() -> Result<()> {
//!     let config = AppConfig::load_or_default("config.toml".as_ref())?;
//!     let certgen = Certgen::new(config.certgen.binary_path.clone());
//!     certgen.ping()?;
//!
//!     let mut workspace = Workspace::new(config.defaults.clone());
//!     let mut root = workspace.selected_request().clone();
//!     root.subject.common_name = "Example Root CA".to_string();
//!     workspace.replace_selected(root);
//!
//!     let options = ExportOptions::from_config(&config.export);
//!     let exported = exporter::export_workspace(&certgen, &workspace, &options)?;
//!     for file in exported.files {
//!         println!("wrote {}", file);
//!     }
//!     Ok(())
//! }
//! ```

pub mod certgen;
pub mod configs;
pub mod exporter;
pub mod importer;
pub mod protocol;
pub mod request;
pub mod updates;
pub mod validator;
pub mod workspace;
