//! # Certificate Verification
//!
//! PEM/X.509 parsing and single-hop chain-of-trust checks against the
//! genesis root certificate.
//!
//! A leaf is trusted when all of the following hold:
//! 1. its issuer name equals the root subject name (byte-for-byte DER);
//! 2. the root may sign certificates (basic constraints, key usage);
//! 3. its signature verifies under the root public key;
//! 4. both certificates are inside their validity windows at the given time.
//!
//! Verification is a pure function of the two certificates and a timestamp.

use super::errors::CertificateError;
use x509_parser::pem::parse_x509_pem;
use x509_parser::prelude::*;

const CERTIFICATE_LABEL: &str = "CERTIFICATE";

/// A parsed X.509 certificate.
///
/// Owns its DER encoding; the borrowed parser view is rebuilt on demand.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Certificate {
    der: Vec<u8>,
    subject: String,
    issuer: String,
    not_before: i64,
    not_after: i64,
}

impl Certificate {
    /// Parse a PEM-encoded certificate.
    pub fn from_pem(pem: &[u8]) -> Result<Self, CertificateError> {
        let (_, block) =
            parse_x509_pem(pem).map_err(|e| CertificateError::MalformedPem(e.to_string()))?;
        if block.label != CERTIFICATE_LABEL {
            return Err(CertificateError::UnexpectedLabel(block.label));
        }
        Self::from_der(&block.contents)
    }

    /// Parse a DER-encoded certificate.
    pub fn from_der(der: &[u8]) -> Result<Self, CertificateError> {
        let cert = parse_der(der)?;
        let validity = cert.validity();
        Ok(Self {
            der: der.to_vec(),
            subject: cert.subject().to_string(),
            issuer: cert.issuer().to_string(),
            not_before: validity.not_before.timestamp(),
            not_after: validity.not_after.timestamp(),
        })
    }

    pub fn der(&self) -> &[u8] {
        &self.der
    }

    pub fn subject(&self) -> &str {
        &self.subject
    }

    pub fn issuer(&self) -> &str {
        &self.issuer
    }

    pub fn not_before(&self) -> i64 {
        self.not_before
    }

    pub fn not_after(&self) -> i64 {
        self.not_after
    }

    /// Whether `at` (unix seconds) falls inside the validity window.
    pub fn is_valid_at(&self, at: i64) -> bool {
        self.not_before <= at && at <= self.not_after
    }

    fn check_validity(&self, at: i64) -> Result<(), CertificateError> {
        if self.is_valid_at(at) {
            return Ok(());
        }
        Err(CertificateError::OutsideValidity {
            subject: self.subject.clone(),
            at,
            not_before: self.not_before,
            not_after: self.not_after,
        })
    }
}

fn parse_der(der: &[u8]) -> Result<X509Certificate<'_>, CertificateError> {
    let (_, cert) =
        X509Certificate::from_der(der).map_err(|e| CertificateError::MalformedDer(e.to_string()))?;
    Ok(cert)
}

/// Verify that `leaf` was issued by `root` and both are valid at `at`.
pub fn verify_chain(
    leaf: &Certificate,
    root: &Certificate,
    at: i64,
) -> Result<(), CertificateError> {
    let leaf_x509 = parse_der(leaf.der())?;
    let root_x509 = parse_der(root.der())?;

    if leaf_x509.issuer().as_raw() != root_x509.subject().as_raw() {
        return Err(CertificateError::IssuerMismatch {
            issuer: leaf.issuer.clone(),
            root: root.subject.clone(),
        });
    }

    let constraints = root_x509
        .basic_constraints()
        .map_err(|e| CertificateError::MalformedDer(e.to_string()))?;
    if let Some(ext) = constraints {
        if !ext.value.ca {
            return Err(CertificateError::NotCertificateAuthority);
        }
    }

    let usage = root_x509
        .key_usage()
        .map_err(|e| CertificateError::MalformedDer(e.to_string()))?;
    if let Some(ext) = usage {
        if !ext.value.key_cert_sign() {
            return Err(CertificateError::MissingKeyCertSign);
        }
    }

    leaf_x509
        .verify_signature(Some(root_x509.public_key()))
        .map_err(|e| CertificateError::BadSignature(e.to_string()))?;

    root.check_validity(at)?;
    leaf.check_validity(at)
}

/// Parse both PEM buffers and verify the leaf against the root.
pub fn verify_pem_chain(leaf_pem: &[u8], root_pem: &[u8], at: i64) -> Result<(), CertificateError> {
    let leaf = Certificate::from_pem(leaf_pem)?;
    let root = Certificate::from_pem(root_pem)?;
    verify_chain(&leaf, &root, at)
}


#[cfg(test)]
mod tests {
    use super::test_helpers::TestCa;
    use super::*;

    const NOW: i64 = 1_700_000_000;

    #[test]
    fn test_parse_root() {
        let ca = TestCa::new("Consortium Root");
        let cert = Certificate::from_pem(ca.pem().as_bytes()).unwrap();
        assert!(cert.subject().contains("Consortium Root"));
        assert_eq!(cert.subject(), cert.issuer());
        assert!(cert.is_valid_at(NOW));
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!(matches!(
            Certificate::from_pem(b"not a certificate"),
            Err(CertificateError::MalformedPem(_))
        ));
    }

    #[test]
    fn test_parse_rejects_wrong_label() {
        let pem = "-----BEGIN PUBLIC KEY-----\nAAAA\n-----END PUBLIC KEY-----\n";
        assert!(matches!(
            Certificate::from_pem(pem.as_bytes()),
            Err(CertificateError::UnexpectedLabel(_)) | Err(CertificateError::MalformedPem(_))
        ));
    }

    #[test]
    fn test_leaf_issued_by_root_verifies() {
        let ca = TestCa::new("Consortium Root");
        let leaf = ca.issue("validator-1");
        verify_pem_chain(leaf.as_bytes(), ca.pem().as_bytes(), NOW).unwrap();
    }

    #[test]
    fn test_root_verifies_against_itself() {
        let ca = TestCa::new("Consortium Root");
        verify_pem_chain(ca.pem().as_bytes(), ca.pem().as_bytes(), NOW).unwrap();
    }

    #[test]
    fn test_leaf_from_other_authority_is_rejected() {
        let ca = TestCa::new("Consortium Root");
        let rogue = TestCa::new("Rogue Root");
        let leaf = rogue.issue("validator-1");
        assert!(matches!(
            verify_pem_chain(leaf.as_bytes(), ca.pem().as_bytes(), NOW),
            Err(CertificateError::IssuerMismatch { .. })
        ));
    }

    #[test]
    fn test_forged_issuer_name_fails_signature() {
        let ca = TestCa::new("Consortium Root");
        let impostor = TestCa::new("Consortium Root");
        let leaf = impostor.issue("validator-1");
        assert!(matches!(
            verify_pem_chain(leaf.as_bytes(), ca.pem().as_bytes(), NOW),
            Err(CertificateError::BadSignature(_))
        ));
    }

    #[test]
    fn test_non_ca_root_is_rejected() {
        let not_ca = TestCa::not_ca("Plain Cert");
        let leaf = not_ca.issue("validator-1");
        assert_eq!(
            verify_pem_chain(leaf.as_bytes(), not_ca.pem().as_bytes(), NOW),
            Err(CertificateError::NotCertificateAuthority)
        );
    }

    #[test]
    fn test_expired_leaf_is_rejected() {
        let ca = TestCa::new("Consortium Root");
        let leaf = ca.issue_with("validator-1", |params| {
            params.not_after = rcgen::date_time_ymd(2001, 1, 1);
        });
        assert!(matches!(
            verify_pem_chain(leaf.as_bytes(), ca.pem().as_bytes(), NOW),
            Err(CertificateError::OutsideValidity { .. })
        ));
        verify_pem_chain(leaf.as_bytes(), ca.pem().as_bytes(), 900_000_000).unwrap();
    }
}
