//! Certificate Request Model
//!
//! Defines the certificate request records the application edits and the
//! wire shapes the certgen backend consumes. A request describes everything
//! the backend needs to mint a certificate: key type, subject name,
//! validity window, alternate names, and key usage. Requests are plain data,
//! the backend owns every cryptographic decision derived from them.
//!
//! Field names serialize in the PascalCase form the backend expects
//! (`CommonName`, `NotBefore`, `IsCertificateAuthority`, ...), so the same
//! types double as the UI model and the protocol payload.

use std::fmt;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::configs::RequestDefaults;

fn is_false(value: &bool) -> bool {
    !*value
}

/// Key algorithm for a generated certificate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum KeyType {
    #[default]
    #[serde(rename = "ECDSA")]
    Ecdsa,
    #[serde(rename = "RSA")]
    Rsa,
}

impl fmt::Display for KeyType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            KeyType::Ecdsa => write!(f, "ECDSA"),
            KeyType::Rsa => write!(f, "RSA"),
        }
    }
}

/// X.509 subject distinguished name fields.
///
/// All fields may be empty while a request is being edited; the validator
/// decides what is required before export.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "PascalCase", default)]
pub struct Name {
    pub common_name: String,
    pub organization: String,
    pub city: String,
    pub province: String,
    pub country: String,
}

/// Validity window of a certificate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct DateRange {
    pub not_before: DateTime<Utc>,
    pub not_after: DateTime<Utc>,
}

impl DateRange {
    /// A window opening now and closing `validity_days` from now.
    pub fn starting_now(validity_days: u32) -> Self {
        let now = Utc::now();
        Self {
            not_before: now,
            not_after: now + Duration::days(i64::from(validity_days)),
        }
    }
}

/// Kind of a subject alternate name entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AlternateNameType {
    #[serde(rename = "DNS")]
    Dns,
    #[serde(rename = "IP")]
    Ip,
    #[serde(rename = "Email")]
    Email,
    #[serde(rename = "URI")]
    Uri,
}

impl fmt::Display for AlternateNameType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AlternateNameType::Dns => write!(f, "DNS"),
            AlternateNameType::Ip => write!(f, "IP"),
            AlternateNameType::Email => write!(f, "Email"),
            AlternateNameType::Uri => write!(f, "URI"),
        }
    }
}

/// A single subject alternate name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AlternateName {
    #[serde(rename = "Type")]
    pub kind: AlternateNameType,
    #[serde(rename = "Value")]
    pub value: String,
}

/// Key usage and extended key usage flags.
///
/// Unset flags are omitted from the wire encoding, so the backend only ever
/// sees the usages the user actually selected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "PascalCase", default)]
pub struct KeyUsage {
    #[serde(skip_serializing_if = "is_false")]
    pub digital_signature: bool,
    #[serde(skip_serializing_if = "is_false")]
    pub content_commitment: bool,
    #[serde(skip_serializing_if = "is_false")]
    pub key_encipherment: bool,
    #[serde(skip_serializing_if = "is_false")]
    pub data_encipherment: bool,
    #[serde(skip_serializing_if = "is_false")]
    pub key_agreement: bool,
    #[serde(skip_serializing_if = "is_false")]
    pub cert_sign: bool,
    #[serde(rename = "CRLSign", skip_serializing_if = "is_false")]
    pub crl_sign: bool,
    #[serde(skip_serializing_if = "is_false")]
    pub encipher_only: bool,
    #[serde(skip_serializing_if = "is_false")]
    pub decipher_only: bool,
    #[serde(skip_serializing_if = "is_false")]
    pub server_auth: bool,
    #[serde(skip_serializing_if = "is_false")]
    pub client_auth: bool,
    #[serde(skip_serializing_if = "is_false")]
    pub code_signing: bool,
    #[serde(skip_serializing_if = "is_false")]
    pub email_protection: bool,
    #[serde(skip_serializing_if = "is_false")]
    pub time_stamping: bool,
    #[serde(rename = "OCSPSigning", skip_serializing_if = "is_false")]
    pub ocsp_signing: bool,
}

impl KeyUsage {
    /// True when at least one flag is selected.
    pub fn any(&self) -> bool {
        self.digital_signature
            || self.content_commitment
            || self.key_encipherment
            || self.data_encipherment
            || self.key_agreement
            || self.cert_sign
            || self.crl_sign
            || self.encipher_only
            || self.decipher_only
            || self.server_auth
            || self.client_auth
            || self.code_signing
            || self.email_protection
            || self.time_stamping
            || self.ocsp_signing
    }
}

/// A certificate request as edited in the workspace and shipped to the
/// backend on export.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct CertificateRequest {
    pub key_type: KeyType,
    pub subject: Name,
    pub validity: DateRange,
    pub alternate_names: Vec<AlternateName>,
    pub usage: KeyUsage,
    pub is_certificate_authority: bool,
    /// Set when this slot holds an imported certificate rather than a
    /// request the user composed. Imported slots are read-only.
    #[serde(default, skip_serializing_if = "is_false")]
    pub imported: bool,
}

impl CertificateRequest {
    /// Blank root CA request: signing usages, no alternate names.
    pub fn root(defaults: &RequestDefaults) -> Self {
        Self {
            key_type: defaults.key_type,
            subject: Name::default(),
            validity: DateRange::starting_now(defaults.validity_days),
            alternate_names: Vec::new(),
            usage: KeyUsage {
                digital_signature: true,
                cert_sign: true,
                ..KeyUsage::default()
            },
            is_certificate_authority: true,
            imported: false,
        }
    }

    /// Blank leaf request: one empty DNS alternate name and the usual
    /// TLS endpoint usages.
    pub fn leaf(defaults: &RequestDefaults) -> Self {
        Self {
            key_type: defaults.key_type,
            subject: Name::default(),
            validity: DateRange::starting_now(defaults.validity_days),
            alternate_names: vec![AlternateName {
                kind: AlternateNameType::Dns,
                value: String::new(),
            }],
            usage: KeyUsage {
                digital_signature: true,
                key_encipherment: true,
                server_auth: true,
                client_auth: true,
                ..KeyUsage::default()
            },
            is_certificate_authority: false,
            imported: false,
        }
    }

    /// Read-only placeholder occupying the root slot after an import.
    pub fn imported(certificate: &Certificate) -> Self {
        Self {
            key_type: KeyType::default(),
            subject: certificate.subject.clone(),
            validity: DateRange::starting_now(365),
            alternate_names: Vec::new(),
            usage: KeyUsage::default(),
            is_certificate_authority: true,
            imported: true,
        }
    }
}

/// A certificate parsed by the backend, as returned from
/// `IMPORT_CERTIFICATE`. `CertificateData` and `KeyData` are hex-encoded
/// DER; `KeyData` is empty when the imported container held no key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Certificate {
    pub certificate_authority: bool,
    pub subject: Name,
    #[serde(default)]
    pub certificate_data: String,
    #[serde(default)]
    pub key_data: String,
}
