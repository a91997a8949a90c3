//! Terminal User Interface Module
//!
//! Interactive cursive interface for composing a certificate workspace:
//! the certificate list, the request edit form with alternate-name and
//! key-usage sub-dialogs, plus import, export, and backend-info dialogs.
//!
//! # Architecture
//!
//! Application state lives in the Cursive user-data slot as [`App`]:
//! the [`Workspace`] being composed, the backend bridge, and the draft of
//! the request currently open in the edit form. Form fields are named
//! `EditView`s read back with `call_on_name` when the user saves; list
//! refreshes rebuild the workspace layer from the current state.
//!
//! # Validation
//!
//! Field-level problems never block editing. The workspace list shows a
//! `✗` marker with the first problem per request, and the export dialog
//! refuses to run until every marker is gone. Only structural mistakes in
//! the form itself (an unparseable date) interrupt with an error dialog.

use std::path::Path;

use anyhow::{Context, Result};
use chrono::{DateTime, NaiveDate, Utc};
use cursive::view::{Nameable, Resizable, Scrollable};
use cursive::views::{
    Checkbox, Dialog, EditView, LinearLayout, Panel, ScrollView, SelectView, TextView,
};
use cursive::{Cursive, CursiveExt};

use certsmith::certgen::Certgen;
use certsmith::configs::AppConfig;
use certsmith::exporter::{self, ExportFormat, ExportOptions};
use certsmith::importer;
use certsmith::request::{AlternateName, AlternateNameType, CertificateRequest, KeyType};
use certsmith::updates;
use certsmith::workspace::Workspace;

struct App {
    workspace: Workspace,
    certgen: Certgen,
    config: AppConfig,
    /// Request currently open in the edit form.
    draft: Option<CertificateRequest>,
    update_url: Option<String>,
}

/// Initialize and run the TUI application
pub fn run_ui(config: AppConfig, certgen: Certgen, workspace: Workspace) {
    let update_url = updates::check_for_newer_release().unwrap_or_else(|error| {
        tracing::debug!(error = %error, "release check failed");
        None
    });

    let mut siv = Cursive::default();

    siv.set_user_data(App {
        workspace,
        certgen,
        config,
        draft: None,
        update_url,
    });

    build_workspace_view(&mut siv);

    siv.run();
}

fn show_error(siv: &mut Cursive, message: &str) {
    siv.add_layer(Dialog::text(message).title("Error").button("OK", |s| {
        s.pop_layer();
    }));
}

// ============================================================================
// Workspace list
// ============================================================================

fn certificate_label(
    index: usize,
    request: &CertificateRequest,
    selected: usize,
    problem: Option<&String>,
) -> String {
    let name = if request.subject.common_name.is_empty() {
        "(unnamed)".to_string()
    } else {
        request.subject.common_name.clone()
    };
    let kind = if request.imported {
        "imported root"
    } else if request.is_certificate_authority {
        "root"
    } else {
        "leaf"
    };
    let marker = if index == selected { "▶" } else { " " };
    match problem {
        Some(reason) => format!("{} {:<24} [{}] ✗ {}", marker, name, kind, reason),
        None => format!("{} {:<24} [{}] ✓", marker, name, kind),
    }
}

fn build_workspace_view(siv: &mut Cursive) {
    let (labels, update_url) = match siv.user_data::<App>() {
        Some(app) => {
            let problems: std::collections::HashMap<usize, String> =
                app.workspace.invalid_requests().into_iter().collect();
            let selected = app.workspace.selected_index();
            let labels: Vec<(usize, String)> = app
                .workspace
                .certificates()
                .iter()
                .enumerate()
                .map(|(index, request)| {
                    (
                        index,
                        certificate_label(index, request, selected, problems.get(&index)),
                    )
                })
                .collect();
            (labels, app.update_url.clone())
        }
        None => return,
    };

    let mut list = SelectView::new();
    for (index, label) in labels {
        list.add_item(label, index);
    }
    list.set_on_submit(|s, index: &usize| {
        let index = *index;
        if let Some(app) = s.user_data::<App>() {
            let _ = app.workspace.select(index);
        }
        show_certificate_actions(s, index);
    });

    let mut layout = LinearLayout::vertical();
    if let Some(url) = update_url {
        layout.add_child(TextView::new(format!(
            "A newer release is available: {}",
            url
        )));
        layout.add_child(TextView::new(""));
    }
    layout.add_child(Panel::new(list.scrollable().fixed_height(14)).title("Certificates"));
    layout.add_child(TextView::new(
        "Select a certificate to edit, duplicate, or delete it.",
    ));

    let dialog = Dialog::around(layout)
        .title("certsmith")
        .button("Add", add_certificate)
        .button("Import Root", show_import_form)
        .button("Export", show_export_form)
        .button("Save", show_save_form)
        .button("Backend", show_backend_info)
        .button("Quit", |s| s.quit());

    siv.add_layer(dialog);
}

/// Replace the workspace layer after a state change. Callers must have
/// popped every dialog above it first.
fn rebuild_workspace_view(siv: &mut Cursive) {
    siv.pop_layer();
    build_workspace_view(siv);
}

fn add_certificate(siv: &mut Cursive) {
    let result = match siv.user_data::<App>() {
        Some(app) => app.workspace.add_leaf(),
        None => return,
    };
    match result {
        Ok(_) => rebuild_workspace_view(siv),
        Err(error) => show_error(siv, &error.to_string()),
    }
}

fn show_certificate_actions(siv: &mut Cursive, index: usize) {
    let (is_root, is_imported, name) = match siv.user_data::<App>() {
        Some(app) => {
            let request = &app.workspace.certificates()[index];
            (
                request.is_certificate_authority,
                request.imported,
                request.subject.common_name.clone(),
            )
        }
        None => return,
    };

    let title = if name.is_empty() {
        format!("Certificate {}", index + 1)
    } else {
        name
    };

    let mut dialog = Dialog::text("Choose an action").title(title);

    if is_imported {
        dialog = dialog.button("Cancel Import", |s| {
            s.pop_layer();
            if let Some(app) = s.user_data::<App>() {
                app.workspace.cancel_import();
            }
            rebuild_workspace_view(s);
        });
    } else {
        dialog = dialog.button("Edit", |s| {
            s.pop_layer();
            show_edit_form(s);
        });
    }

    if !is_root {
        dialog = dialog
            .button("Duplicate", move |s| {
                s.pop_layer();
                let result = match s.user_data::<App>() {
                    Some(app) => app.workspace.duplicate(index),
                    None => return,
                };
                match result {
                    Ok(_) => rebuild_workspace_view(s),
                    Err(error) => show_error(s, &error.to_string()),
                }
            })
            .button("Delete", move |s| {
                s.pop_layer();
                let result = match s.user_data::<App>() {
                    Some(app) => app.workspace.remove(index),
                    None => return,
                };
                match result {
                    Ok(()) => rebuild_workspace_view(s),
                    Err(error) => show_error(s, &error.to_string()),
                }
            });
    }

    dialog = dialog.button("Close", |s| {
        s.pop_layer();
    });
    siv.add_layer(dialog);
}

// ============================================================================
// Edit form
// ============================================================================

fn edit_content(siv: &mut Cursive, name: &str) -> String {
    siv.call_on_name(name, |view: &mut EditView| view.get_content().to_string())
        .unwrap_or_default()
}

fn checkbox_state(siv: &mut Cursive, name: &str) -> bool {
    siv.call_on_name(name, |view: &mut Checkbox| view.is_checked())
        .unwrap_or(false)
}

fn parse_date(value: &str) -> Result<DateTime<Utc>> {
    let date = NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d")
        .with_context(|| format!("'{}' is not a valid date (expected YYYY-MM-DD)", value.trim()))?;
    let midnight = date
        .and_hms_opt(0, 0, 0)
        .context("invalid time of day")?;
    Ok(DateTime::from_naive_utc_and_offset(midnight, Utc))
}

fn show_edit_form(siv: &mut Cursive) {
    let request = match siv.user_data::<App>() {
        Some(app) => {
            let request = app.workspace.selected_request().clone();
            app.draft = Some(request.clone());
            request
        }
        None => return,
    };

    let mut key_type = SelectView::new();
    key_type.add_item("ECDSA", KeyType::Ecdsa);
    key_type.add_item("RSA", KeyType::Rsa);
    let _ = key_type.set_selection(match request.key_type {
        KeyType::Ecdsa => 0,
        KeyType::Rsa => 1,
    });

    let form = LinearLayout::vertical()
        .child(TextView::new("Common Name (CN):"))
        .child(
            EditView::new()
                .content(request.subject.common_name.clone())
                .with_name("cn")
                .fixed_width(40),
        )
        .child(TextView::new("Organization (O):"))
        .child(
            EditView::new()
                .content(request.subject.organization.clone())
                .with_name("organization")
                .fixed_width(40),
        )
        .child(TextView::new("City (L):"))
        .child(
            EditView::new()
                .content(request.subject.city.clone())
                .with_name("city")
                .fixed_width(40),
        )
        .child(TextView::new("Province (ST):"))
        .child(
            EditView::new()
                .content(request.subject.province.clone())
                .with_name("province")
                .fixed_width(40),
        )
        .child(TextView::new("Country (C) - 2 letter code:"))
        .child(
            EditView::new()
                .content(request.subject.country.clone())
                .with_name("country")
                .fixed_width(40),
        )
        .child(TextView::new("Not Before (YYYY-MM-DD):"))
        .child(
            EditView::new()
                .content(request.validity.not_before.format("%Y-%m-%d").to_string())
                .with_name("not_before")
                .fixed_width(40),
        )
        .child(TextView::new("Not After (YYYY-MM-DD):"))
        .child(
            EditView::new()
                .content(request.validity.not_after.format("%Y-%m-%d").to_string())
                .with_name("not_after")
                .fixed_width(40),
        )
        .child(TextView::new("Key Type:"))
        .child(Panel::new(key_type.with_name("key_type")).fixed_width(40));

    let title = if request.is_certificate_authority {
        "Edit Root Certificate"
    } else {
        "Edit Leaf Certificate"
    };

    siv.add_layer(
        Dialog::around(ScrollView::new(form))
            .title(title)
            .button("Names", show_alternate_names_form)
            .button("Usage", show_key_usage_form)
            .button("Save", save_edit_form)
            .button("Cancel", |s| {
                if let Some(app) = s.user_data::<App>() {
                    app.draft = None;
                }
                s.pop_layer();
            }),
    );
}

fn save_edit_form(siv: &mut Cursive) {
    let not_before = match parse_date(&edit_content(siv, "not_before")) {
        Ok(date) => date,
        Err(error) => {
            show_error(siv, &error.to_string());
            return;
        }
    };
    let not_after = match parse_date(&edit_content(siv, "not_after")) {
        Ok(date) => date,
        Err(error) => {
            show_error(siv, &error.to_string());
            return;
        }
    };

    let common_name = edit_content(siv, "cn");
    let organization = edit_content(siv, "organization");
    let city = edit_content(siv, "city");
    let province = edit_content(siv, "province");
    let country = edit_content(siv, "country");
    let key_type = siv
        .call_on_name("key_type", |view: &mut SelectView<KeyType>| view.selection())
        .flatten()
        .map(|selection| *selection)
        .unwrap_or_default();

    let saved = match siv.user_data::<App>() {
        Some(app) => match app.draft.take() {
            Some(mut draft) => {
                draft.subject.common_name = common_name;
                draft.subject.organization = organization;
                draft.subject.city = city;
                draft.subject.province = province;
                draft.subject.country = country;
                draft.validity.not_before = not_before;
                draft.validity.not_after = not_after;
                draft.key_type = key_type;
                app.workspace.replace_selected(draft);
                true
            }
            None => false,
        },
        None => false,
    };

    if saved {
        siv.pop_layer();
        rebuild_workspace_view(siv);
    }
}

// ============================================================================
// Alternate names sub-dialog
// ============================================================================

fn show_alternate_names_form(siv: &mut Cursive) {
    let names = match siv.user_data::<App>().and_then(|app| app.draft.as_ref()) {
        Some(draft) => draft.alternate_names.clone(),
        None => return,
    };

    let mut list = SelectView::new();
    for (index, name) in names.iter().enumerate() {
        let value = if name.value.is_empty() {
            "(empty)"
        } else {
            name.value.as_str()
        };
        list.add_item(format!("{:<5} {}", name.kind.to_string(), value), index);
    }

    let layout = LinearLayout::vertical()
        .child(TextView::new(
            "Alternate names identify the endpoints this certificate covers.",
        ))
        .child(Panel::new(list.with_name("san_list").scrollable().fixed_height(8)));

    siv.add_layer(
        Dialog::around(layout)
            .title("Alternate Names")
            .button("Add", show_add_alternate_name_form)
            .button("Remove", remove_selected_alternate_name)
            .button("Done", |s| {
                s.pop_layer();
            }),
    );
}

fn show_add_alternate_name_form(siv: &mut Cursive) {
    let mut kind = SelectView::new();
    kind.add_item("DNS", AlternateNameType::Dns);
    kind.add_item("IP", AlternateNameType::Ip);
    kind.add_item("Email", AlternateNameType::Email);
    kind.add_item("URI", AlternateNameType::Uri);

    let form = LinearLayout::vertical()
        .child(TextView::new("Type:"))
        .child(Panel::new(kind.with_name("san_kind")).fixed_width(30))
        .child(TextView::new("Value:"))
        .child(EditView::new().with_name("san_value").fixed_width(40));

    siv.add_layer(
        Dialog::around(form)
            .title("Add Alternate Name")
            .button("Add", |s| {
                let kind = s
                    .call_on_name("san_kind", |view: &mut SelectView<AlternateNameType>| {
                        view.selection()
                    })
                    .flatten()
                    .map(|selection| *selection)
                    .unwrap_or(AlternateNameType::Dns);
                let value = edit_content(s, "san_value");

                if let Some(draft) = s.user_data::<App>().and_then(|app| app.draft.as_mut()) {
                    draft.alternate_names.push(AlternateName { kind, value });
                }

                // close both dialogs and reopen the list on the new state
                s.pop_layer();
                s.pop_layer();
                show_alternate_names_form(s);
            })
            .button("Cancel", |s| {
                s.pop_layer();
            }),
    );
}

fn remove_selected_alternate_name(siv: &mut Cursive) {
    let selected = siv
        .call_on_name("san_list", |view: &mut SelectView<usize>| view.selection())
        .flatten()
        .map(|selection| *selection);

    let Some(index) = selected else {
        return;
    };

    if let Some(draft) = siv.user_data::<App>().and_then(|app| app.draft.as_mut()) {
        if index < draft.alternate_names.len() {
            draft.alternate_names.remove(index);
        }
    }

    siv.pop_layer();
    show_alternate_names_form(siv);
}

// ============================================================================
// Key usage sub-dialog
// ============================================================================

fn usage_row(label: &str, name: &'static str, checked: bool) -> LinearLayout {
    let mut checkbox = Checkbox::new();
    let _ = checkbox.set_checked(checked);
    LinearLayout::horizontal()
        .child(checkbox.with_name(name))
        .child(TextView::new(format!(" {}", label)))
}

fn show_key_usage_form(siv: &mut Cursive) {
    let usage = match siv.user_data::<App>().and_then(|app| app.draft.as_ref()) {
        Some(draft) => draft.usage,
        None => return,
    };

    let form = LinearLayout::vertical()
        .child(TextView::new("Key usage:"))
        .child(usage_row("Digital Signature", "u_digital_signature", usage.digital_signature))
        .child(usage_row("Content Commitment", "u_content_commitment", usage.content_commitment))
        .child(usage_row("Key Encipherment", "u_key_encipherment", usage.key_encipherment))
        .child(usage_row("Data Encipherment", "u_data_encipherment", usage.data_encipherment))
        .child(usage_row("Key Agreement", "u_key_agreement", usage.key_agreement))
        .child(usage_row("Certificate Signing", "u_cert_sign", usage.cert_sign))
        .child(usage_row("CRL Signing", "u_crl_sign", usage.crl_sign))
        .child(usage_row("Encipher Only", "u_encipher_only", usage.encipher_only))
        .child(usage_row("Decipher Only", "u_decipher_only", usage.decipher_only))
        .child(TextView::new(""))
        .child(TextView::new("Extended key usage:"))
        .child(usage_row("Server Authentication", "u_server_auth", usage.server_auth))
        .child(usage_row("Client Authentication", "u_client_auth", usage.client_auth))
        .child(usage_row("Code Signing", "u_code_signing", usage.code_signing))
        .child(usage_row("Email Protection", "u_email_protection", usage.email_protection))
        .child(usage_row("Time Stamping", "u_time_stamping", usage.time_stamping))
        .child(usage_row("OCSP Signing", "u_ocsp_signing", usage.ocsp_signing));

    siv.add_layer(
        Dialog::around(ScrollView::new(form))
            .title("Key Usage")
            .button("OK", |s| {
                let digital_signature = checkbox_state(s, "u_digital_signature");
                let content_commitment = checkbox_state(s, "u_content_commitment");
                let key_encipherment = checkbox_state(s, "u_key_encipherment");
                let data_encipherment = checkbox_state(s, "u_data_encipherment");
                let key_agreement = checkbox_state(s, "u_key_agreement");
                let cert_sign = checkbox_state(s, "u_cert_sign");
                let crl_sign = checkbox_state(s, "u_crl_sign");
                let encipher_only = checkbox_state(s, "u_encipher_only");
                let decipher_only = checkbox_state(s, "u_decipher_only");
                let server_auth = checkbox_state(s, "u_server_auth");
                let client_auth = checkbox_state(s, "u_client_auth");
                let code_signing = checkbox_state(s, "u_code_signing");
                let email_protection = checkbox_state(s, "u_email_protection");
                let time_stamping = checkbox_state(s, "u_time_stamping");
                let ocsp_signing = checkbox_state(s, "u_ocsp_signing");

                if let Some(draft) = s.user_data::<App>().and_then(|app| app.draft.as_mut()) {
                    draft.usage.digital_signature = digital_signature;
                    draft.usage.content_commitment = content_commitment;
                    draft.usage.key_encipherment = key_encipherment;
                    draft.usage.data_encipherment = data_encipherment;
                    draft.usage.key_agreement = key_agreement;
                    draft.usage.cert_sign = cert_sign;
                    draft.usage.crl_sign = crl_sign;
                    draft.usage.encipher_only = encipher_only;
                    draft.usage.decipher_only = decipher_only;
                    draft.usage.server_auth = server_auth;
                    draft.usage.client_auth = client_auth;
                    draft.usage.code_signing = code_signing;
                    draft.usage.email_protection = email_protection;
                    draft.usage.time_stamping = time_stamping;
                    draft.usage.ocsp_signing = ocsp_signing;
                }
                s.pop_layer();
            })
            .button("Cancel", |s| {
                s.pop_layer();
            }),
    );
}

// ============================================================================
// Import / export / workspace dialogs
// ============================================================================

fn show_import_form(siv: &mut Cursive) {
    let form = LinearLayout::vertical()
        .child(TextView::new("Certificate file:"))
        .child(EditView::new().with_name("import_path").fixed_width(48))
        .child(TextView::new("Password:"))
        .child(
            EditView::new()
                .secret()
                .with_name("import_password")
                .fixed_width(48),
        );

    siv.add_layer(
        Dialog::around(form)
            .title("Import Root Certificate")
            .button("Import", |s| {
                let path = edit_content(s, "import_path");
                let password = edit_content(s, "import_password");
                if path.trim().is_empty() {
                    show_error(s, "Enter the path of the certificate file to import");
                    return;
                }

                let outcome = match s.user_data::<App>() {
                    Some(app) => {
                        match importer::import_from_file(
                            &app.certgen,
                            Path::new(path.trim()),
                            &password,
                        ) {
                            Ok(certificate) => {
                                app.workspace.import_root(certificate);
                                Ok(())
                            }
                            Err(error) => Err(error),
                        }
                    }
                    None => return,
                };

                s.pop_layer();
                match outcome {
                    Ok(()) => rebuild_workspace_view(s),
                    Err(error) => show_error(s, &format!("{:#}", error)),
                }
            })
            .button("Cancel", |s| {
                s.pop_layer();
            }),
    );
}

fn show_export_form(siv: &mut Cursive) {
    let (directory, include_ca, format) = match siv.user_data::<App>() {
        Some(app) => (
            app.config.export.directory.display().to_string(),
            app.config.export.include_ca,
            app.config.export.format,
        ),
        None => return,
    };

    let mut format_select = SelectView::new();
    format_select.add_item("PEM", ExportFormat::Pem);
    format_select.add_item("PKCS#12", ExportFormat::Pkcs12);
    let _ = format_select.set_selection(match format {
        ExportFormat::Pem => 0,
        ExportFormat::Pkcs12 => 1,
    });

    let mut include_ca_box = Checkbox::new();
    let _ = include_ca_box.set_checked(include_ca);

    let form = LinearLayout::vertical()
        .child(TextView::new("Export directory:"))
        .child(
            EditView::new()
                .content(directory)
                .with_name("export_dir")
                .fixed_width(48),
        )
        .child(TextView::new("Format:"))
        .child(Panel::new(format_select.with_name("export_format")).fixed_width(30))
        .child(TextView::new("Private key password (optional):"))
        .child(
            EditView::new()
                .secret()
                .with_name("export_password")
                .fixed_width(48),
        )
        .child(
            LinearLayout::horizontal()
                .child(include_ca_box.with_name("export_include_ca"))
                .child(TextView::new(" Include CA certificate")),
        );

    siv.add_layer(
        Dialog::around(form)
            .title("Export Certificates")
            .button("Export", |s| {
                let options = ExportOptions {
                    export_dir: edit_content(s, "export_dir").trim().to_string().into(),
                    format: s
                        .call_on_name("export_format", |view: &mut SelectView<ExportFormat>| {
                            view.selection()
                        })
                        .flatten()
                        .map(|selection| *selection)
                        .unwrap_or_default(),
                    password: edit_content(s, "export_password"),
                    include_ca: checkbox_state(s, "export_include_ca"),
                };

                let result = match s.user_data::<App>() {
                    Some(app) => exporter::export_workspace(&app.certgen, &app.workspace, &options),
                    None => return,
                };

                s.pop_layer();
                match result {
                    Ok(exported) => {
                        let mut message = format!(
                            "✓ Exported {} file(s) to {}\n",
                            exported.files.len(),
                            options.export_dir.display()
                        );
                        for file in &exported.files {
                            message.push_str(&format!("\n  {}", file));
                        }
                        s.add_layer(
                            Dialog::around(ScrollView::new(TextView::new(message)))
                                .title("Export Complete")
                                .button("OK", |s| {
                                    s.pop_layer();
                                }),
                        );
                    }
                    Err(error) => show_error(s, &format!("{:#}", error)),
                }
            })
            .button("Cancel", |s| {
                s.pop_layer();
            }),
    );
}

fn show_save_form(siv: &mut Cursive) {
    let form = LinearLayout::vertical()
        .child(TextView::new("Workspace file:"))
        .child(
            EditView::new()
                .content("workspace.json")
                .with_name("save_path")
                .fixed_width(48),
        );

    siv.add_layer(
        Dialog::around(form)
            .title("Save Workspace")
            .button("Save", |s| {
                let path = edit_content(s, "save_path");
                let result = match s.user_data::<App>() {
                    Some(app) => app.workspace.save(Path::new(path.trim())),
                    None => return,
                };
                s.pop_layer();
                match result {
                    Ok(()) => s.add_layer(
                        Dialog::text(format!("✓ Workspace saved to {}", path.trim()))
                            .title("Saved")
                            .button("OK", |s| {
                                s.pop_layer();
                            }),
                    ),
                    Err(error) => show_error(s, &format!("{:#}", error)),
                }
            })
            .button("Cancel", |s| {
                s.pop_layer();
            }),
    );
}

fn show_backend_info(siv: &mut Cursive) {
    let info = match siv.user_data::<App>() {
        Some(app) => {
            let ping = match app.certgen.ping() {
                Ok(()) => "✓ responding".to_string(),
                Err(error) => format!("✗ {}", error),
            };
            let version = match app.certgen.version() {
                Ok(version) => version,
                Err(error) => format!("unknown ({})", error),
            };
            format!(
                "Backend: {}\nStatus:  {}\nVersion: {}\n\ncertsmith {}",
                app.certgen.binary_path().display(),
                ping,
                version,
                env!("CARGO_PKG_VERSION"),
            )
        }
        None => return,
    };

    siv.add_layer(
        Dialog::around(ScrollView::new(TextView::new(info)))
            .title("Backend")
            .button("OK", |s| {
                s.pop_layer();
            }),
    );
}
