//! Certificate Request Validation
//!
//! Checks a request against the rules the backend enforces at export time,
//! so problems surface while the user is still editing. Returns the first
//! problem found as a human-readable reason; the UI shows it next to the
//! offending entry and export refuses to run until the workspace is clean.

use std::net::IpAddr;

use chrono::Utc;

use crate::request::{AlternateNameType, CertificateRequest};

/// Validate a certificate request.
///
/// Returns `None` when the request can be exported, or the first problem as
/// a message suitable for direct display. Imported slots are never
/// validated; their content came from a real certificate.
pub fn validate_request(request: &CertificateRequest) -> Option<String> {
    if request.imported {
        return None;
    }

    if request.subject.common_name.trim().is_empty() {
        return Some("Certificate subject must include a common name".to_string());
    }

    let country = request.subject.country.trim();
    if !country.is_empty()
        && (country.len() != 2 || !country.chars().all(|c| c.is_ascii_alphabetic()))
    {
        return Some("Country must be a two letter ISO 3166 code".to_string());
    }

    if request.validity.not_after <= request.validity.not_before {
        return Some("Certificate expiry must be after the start date".to_string());
    }
    if request.validity.not_after <= Utc::now() {
        return Some("Certificate expiry must be in the future".to_string());
    }

    if !request.is_certificate_authority {
        if request.alternate_names.is_empty() {
            return Some("Leaf certificates must include at least one alternate name".to_string());
        }
        for name in &request.alternate_names {
            if let Some(reason) = validate_alternate_name(name.kind, name.value.trim()) {
                return Some(reason);
            }
        }
    }

    if !request.usage.any() {
        return Some("At least one key usage must be selected".to_string());
    }
    if request.is_certificate_authority && !request.usage.cert_sign {
        return Some(
            "Certificate authorities must include the certificate signing usage".to_string(),
        );
    }

    None
}

fn validate_alternate_name(kind: AlternateNameType, value: &str) -> Option<String> {
    if value.is_empty() {
        return Some("Alternate names cannot be empty".to_string());
    }
    match kind {
        AlternateNameType::Dns => None,
        AlternateNameType::Ip => {
            if value.parse::<IpAddr>().is_err() {
                Some(format!("'{}' is not a valid IP address", value))
            } else {
                None
            }
        }
        AlternateNameType::Email => {
            let mut parts = value.splitn(2, '@');
            let local = parts.next().unwrap_or_default();
            let domain = parts.next().unwrap_or_default();
            if local.is_empty() || domain.is_empty() {
                Some(format!("'{}' is not a valid email address", value))
            } else {
                None
            }
        }
        AlternateNameType::Uri => match value.split_once("://") {
            Some((scheme, rest)) if !scheme.is_empty() && !rest.is_empty() => None,
            _ => Some(format!("'{}' is not a valid URI", value)),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::configs::RequestDefaults;
    use crate::request::{AlternateName, Certificate, Name};
    use chrono::Duration;

    fn root() -> CertificateRequest {
        let mut request = CertificateRequest::root(&RequestDefaults::default());
        request.subject.common_name = "Test Root CA".to_string();
        request
    }

    fn leaf() -> CertificateRequest {
        let mut request = CertificateRequest::leaf(&RequestDefaults::default());
        request.subject.common_name = "test.example.com".to_string();
        request.alternate_names[0].value = "test.example.com".to_string();
        request
    }

    #[test]
    fn test_valid_root_and_leaf() {
        assert_eq!(validate_request(&root()), None);
        assert_eq!(validate_request(&leaf()), None);
    }

    #[test]
    fn test_common_name_required() {
        let mut request = root();
        request.subject.common_name = "  ".to_string();
        assert!(validate_request(&request)
            .unwrap()
            .contains("common name"));
    }

    #[test]
    fn test_country_must_be_two_letters() {
        let mut request = root();
        request.subject.country = "USA".to_string();
        assert!(validate_request(&request).unwrap().contains("two letter"));

        request.subject.country = "us".to_string();
        assert_eq!(validate_request(&request), None);
    }

    #[test]
    fn test_expiry_after_start() {
        let mut request = root();
        request.validity.not_after = request.validity.not_before - Duration::days(1);
        assert!(validate_request(&request)
            .unwrap()
            .contains("after the start date"));
    }

    #[test]
    fn test_expiry_in_the_future() {
        let mut request = root();
        request.validity.not_before = Utc::now() - Duration::days(30);
        request.validity.not_after = Utc::now() - Duration::days(1);
        assert!(validate_request(&request).unwrap().contains("future"));
    }

    #[test]
    fn test_leaf_needs_alternate_name() {
        let mut request = leaf();
        request.alternate_names.clear();
        assert!(validate_request(&request)
            .unwrap()
            .contains("at least one alternate name"));
    }

    #[test]
    fn test_empty_alternate_name_rejected() {
        let mut request = leaf();
        request.alternate_names[0].value = String::new();
        assert!(validate_request(&request).unwrap().contains("empty"));
    }

    #[test]
    fn test_ip_alternate_name() {
        let mut request = leaf();
        request.alternate_names.push(AlternateName {
            kind: AlternateNameType::Ip,
            value: "not-an-ip".to_string(),
        });
        assert!(validate_request(&request)
            .unwrap()
            .contains("not a valid IP address"));

        request.alternate_names[1].value = "2001:db8::1".to_string();
        assert_eq!(validate_request(&request), None);
    }

    #[test]
    fn test_email_alternate_name() {
        let mut request = leaf();
        request.alternate_names.push(AlternateName {
            kind: AlternateNameType::Email,
            value: "nobody".to_string(),
        });
        assert!(validate_request(&request)
            .unwrap()
            .contains("not a valid email address"));

        request.alternate_names[1].value = "nobody@example.com".to_string();
        assert_eq!(validate_request(&request), None);
    }

    #[test]
    fn test_uri_alternate_name() {
        let mut request = leaf();
        request.alternate_names.push(AlternateName {
            kind: AlternateNameType::Uri,
            value: "example.com/path".to_string(),
        });
        assert!(validate_request(&request)
            .unwrap()
            .contains("not a valid URI"));

        request.alternate_names[1].value = "spiffe://example.com/service".to_string();
        assert_eq!(validate_request(&request), None);
    }

    #[test]
    fn test_at_least_one_usage() {
        let mut request = leaf();
        request.usage = Default::default();
        assert!(validate_request(&request)
            .unwrap()
            .contains("key usage"));
    }

    #[test]
    fn test_authority_needs_cert_sign() {
        let mut request = root();
        request.usage.cert_sign = false;
        assert!(validate_request(&request)
            .unwrap()
            .contains("certificate signing usage"));
    }

    #[test]
    fn test_imported_slot_skipped() {
        let certificate = Certificate {
            certificate_authority: true,
            subject: Name::default(),
            certificate_data: String::new(),
            key_data: String::new(),
        };
        let request = CertificateRequest::imported(&certificate);
        // no common name, no usage, still fine: the slot is read-only
        assert_eq!(validate_request(&request), None);
    }
}
