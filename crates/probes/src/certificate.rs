//! X.509 certificate inspection.
//!
//! ```text
//! x509_certificate('cert.pem') should be_certificate
//! x509_certificate('cert.pem') should be_valid
//! its('signature_algorithm') { should eq 'sha256WithRSAEncryption' }
//! its('validity_in_days') { should be >= 30 }
//! its('subject') { should eq '/C=DE/ST=Berlin/CN=inspec.io' }
//! ```
//!
//! Only field extraction and the validity window are covered; the chain is
//! not verified and revocation is not checked.

use crate::answer::Answer;
use crate::dn::DistinguishedName;
use crate::error::ProbeError;
use crate::extension::{extensions_of, Extension};
use crate::key_pair::algorithm_name;
use crate::probe::{Memo, Probe, ProbeKind, Resolution};
use chrono::{DateTime, Utc};
use hostprobe_common::hash::{sha1_bytes, sha256_bytes};
use hostprobe_host::Host;
use openssl::asn1::{Asn1Time, Asn1TimeRef};
use openssl::x509::X509;
use serde::Serialize;
use std::sync::Arc;
use tracing::debug;

const SECONDS_PER_DAY: f64 = 86_400.0;

/// Fields extracted from a parsed certificate.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CertificateInfo {
    /// Raw version field: 0 for v1, 2 for v3.
    pub version: i32,
    /// Serial number in decimal.
    pub serial: String,
    /// OpenSSL long name, e.g. `sha256WithRSAEncryption`.
    pub signature_algorithm: String,
    pub subject: DistinguishedName,
    pub issuer: DistinguishedName,
    /// SHA-1 over the DER encoding, lowercase hex.
    pub fingerprint: String,
    pub sha256_fingerprint: String,
    pub key_algorithm: String,
    /// RSA modulus length in bits; `None` for other key types.
    pub key_length: Option<u32>,
    pub extensions: Vec<Extension>,
    pub not_before: DateTime<Utc>,
    pub not_after: DateTime<Utc>,
}

impl CertificateInfo {
    /// Parse PEM (first certificate in the file) or DER content.
    pub fn parse(content: &[u8]) -> Result<Self, ProbeError> {
        let cert = X509::from_pem(content).or_else(|_| X509::from_der(content))?;
        Self::from_x509(&cert)
    }

    fn from_x509(cert: &X509) -> Result<Self, ProbeError> {
        let der = cert.to_der()?;

        let signature = cert.signature_algorithm().object();
        let signature_algorithm = signature
            .nid()
            .long_name()
            .map(str::to_string)
            .unwrap_or_else(|_| signature.to_string());

        let public_key = cert.public_key()?;
        let key_length = public_key
            .rsa()
            .ok()
            .and_then(|rsa| u32::try_from(rsa.n().num_bytes()).ok())
            .map(|bytes| bytes * 8);

        Ok(Self {
            version: cert.version(),
            serial: cert.serial_number().to_bn()?.to_dec_str()?.to_string(),
            signature_algorithm,
            subject: DistinguishedName::from_x509_name(cert.subject_name()),
            issuer: DistinguishedName::from_x509_name(cert.issuer_name()),
            fingerprint: sha1_bytes(&der),
            sha256_fingerprint: sha256_bytes(&der),
            key_algorithm: algorithm_name(public_key.id()).to_string(),
            key_length,
            extensions: extensions_of(&der)?,
            not_before: to_utc(cert.not_before())?,
            not_after: to_utc(cert.not_after())?,
        })
    }

    /// Whether `now` lies inside the validity window, bounds included.
    pub fn valid_at(&self, now: DateTime<Utc>) -> bool {
        self.not_before <= now && now <= self.not_after
    }

    /// Days from `now` until expiry; negative once expired.
    pub fn validity_in_days_at(&self, now: DateTime<Utc>) -> f64 {
        let remaining = self.not_after - now;
        remaining.num_milliseconds() as f64 / 1000.0 / SECONDS_PER_DAY
    }
}

fn to_utc(time: &Asn1TimeRef) -> Result<DateTime<Utc>, ProbeError> {
    let epoch = Asn1Time::from_unix(0)?;
    let diff = epoch.diff(time)?;
    let seconds = i64::from(diff.days) * 86_400 + i64::from(diff.secs);
    DateTime::from_timestamp(seconds, 0)
        .ok_or_else(|| ProbeError::X509(format!("time out of range: {}", time)))
}

/// Probe for a certificate file.
///
/// Parsing happens locally on the bytes the host returns, so there is a single
/// provider for every OS family and construction never consults
/// `host.os_family()`.
pub struct X509Certificate {
    host: Arc<dyn Host>,
    path: String,
    cert: Memo<CertificateInfo>,
}

impl X509Certificate {
    pub fn new(host: Arc<dyn Host>, path: impl Into<String>) -> Self {
        Self {
            host,
            path: path.into(),
            cert: Memo::new(),
        }
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    /// True when the file holds a parsable certificate.
    pub fn certificate(&self) -> bool {
        self.info().is_some()
    }

    pub fn version(&self) -> Answer<i32> {
        self.field(|c| c.version)
    }

    pub fn serial(&self) -> Answer<String> {
        self.field(|c| c.serial.clone())
    }

    pub fn signature_algorithm(&self) -> Answer<String> {
        self.field(|c| c.signature_algorithm.clone())
    }

    /// Subject in `/TYPE=value/...` form, in encoding order.
    pub fn subject(&self) -> Answer<String> {
        self.field(|c| c.subject.to_string())
    }

    pub fn subject_dn(&self) -> Answer<DistinguishedName> {
        self.field(|c| c.subject.clone())
    }

    /// Issuer in `/TYPE=value/...` form, in encoding order.
    pub fn issuer(&self) -> Answer<String> {
        self.field(|c| c.issuer.to_string())
    }

    pub fn issuer_dn(&self) -> Answer<DistinguishedName> {
        self.field(|c| c.issuer.clone())
    }

    pub fn fingerprint(&self) -> Answer<String> {
        self.field(|c| c.fingerprint.clone())
    }

    pub fn sha256_fingerprint(&self) -> Answer<String> {
        self.field(|c| c.sha256_fingerprint.clone())
    }

    /// Public key size in bits, derived from the RSA modulus.
    ///
    /// Other key algorithms have no modulus; for those the answer is a skip
    /// naming the algorithm rather than a guessed number.
    pub fn key_length(&self) -> Answer<u32> {
        self.field(|c| (c.key_length, c.key_algorithm.clone()))
            .and_then(|(bits, algorithm)| match bits {
                Some(bits) => Answer::Known(bits),
                None => Answer::Skipped(format!(
                    "key length is only derived for RSA keys, this certificate carries a {} key",
                    algorithm
                )),
            })
    }

    pub fn extensions(&self) -> Answer<Vec<Extension>> {
        self.field(|c| c.extensions.clone())
    }

    /// First `emailAddress` attribute of the subject.
    pub fn email(&self) -> Answer<String> {
        self.info()
            .and_then(|c| c.subject.email())
            .map(str::to_string)
            .into()
    }

    pub fn not_before(&self) -> Answer<DateTime<Utc>> {
        self.field(|c| c.not_before)
    }

    pub fn not_after(&self) -> Answer<DateTime<Utc>> {
        self.field(|c| c.not_after)
    }

    /// Whether the certificate is inside its validity window right now.
    pub fn valid(&self) -> Answer<bool> {
        self.valid_at(Utc::now())
    }

    pub fn valid_at(&self, now: DateTime<Utc>) -> Answer<bool> {
        self.field(|c| c.valid_at(now))
    }

    /// Days until expiry, recomputed against the clock on every call.
    pub fn validity_in_days(&self) -> Answer<f64> {
        self.validity_in_days_at(Utc::now())
    }

    pub fn validity_in_days_at(&self, now: DateTime<Utc>) -> Answer<f64> {
        self.field(|c| c.validity_in_days_at(now))
    }

    /// The extracted fields, if the file held a certificate.
    pub fn info(&self) -> Option<&CertificateInfo> {
        self.resolution().value()
    }

    fn field<T>(&self, f: impl FnOnce(&CertificateInfo) -> T) -> Answer<T> {
        self.info().map(f).into()
    }

    fn resolution(&self) -> &Resolution<CertificateInfo> {
        self.cert.get_or_resolve(|| self.load())
    }

    fn load(&self) -> Resolution<CertificateInfo> {
        let file = match self.host.read_file(&self.path) {
            Ok(file) => file,
            Err(e) => return Resolution::failed(e.into()),
        };
        let Some(content) = file.non_empty_content() else {
            return Resolution::absent(format!("{} has no content", self.path));
        };

        match CertificateInfo::parse(content) {
            Ok(info) => Resolution::present(info),
            Err(e) => {
                debug!("Certificate {} failed to parse: {}", self.path, e);
                Resolution::absent(format!("{} is not a certificate", self.path))
            }
        }
    }
}

impl Probe for X509Certificate {
    fn kind(&self) -> ProbeKind {
        ProbeKind::Certificate
    }

    fn describe(&self) -> String {
        format!("x509_certificate {}", self.path)
    }

    fn skip_message(&self) -> Option<String> {
        self.resolution().skip_message.clone()
    }

    fn warnings(&self) -> Vec<String> {
        self.resolution().warnings.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures;
    use chrono::Duration;
    use hostprobe_common::OsFamily;
    use hostprobe_host::MemoryHost;
    use openssl::hash::MessageDigest;

    const PATH: &str = "/etc/ssl/cert.pem";

    fn probe(content: impl Into<Vec<u8>>) -> X509Certificate {
        let host = MemoryHost::new(OsFamily::Linux).with_file(PATH, content);
        X509Certificate::new(Arc::new(host), PATH)
    }

    #[test]
    fn test_certificate_fields() {
        let cert = fixtures::default_certificate();
        let x509 = probe(cert.to_pem().unwrap());

        assert!(x509.certificate());
        assert_eq!(x509.version(), Answer::Known(2));
        assert_eq!(x509.serial(), Answer::Known("4096".to_string()));
        assert_eq!(
            x509.signature_algorithm(),
            Answer::Known("sha256WithRSAEncryption".to_string())
        );
        assert_eq!(x509.subject(), Answer::Known(fixtures::SUBJECT.to_string()));
        assert_eq!(x509.issuer(), Answer::Known(fixtures::SUBJECT.to_string()));
        assert_eq!(x509.email(), Answer::Known("support@chef.io".to_string()));
        assert_eq!(x509.key_length(), Answer::Known(2048));
        assert_eq!(x509.extensions().into_known().unwrap().len(), 4);
    }

    #[test]
    fn test_fingerprint_is_sha1_of_der() {
        let cert = fixtures::default_certificate();
        let expected = hex_digest(&cert, MessageDigest::sha1());
        let x509 = probe(cert.to_pem().unwrap());

        let fingerprint = x509.fingerprint().into_known().unwrap();
        assert_eq!(fingerprint.len(), 40);
        assert_eq!(fingerprint, expected);
        assert_eq!(
            x509.sha256_fingerprint(),
            Answer::Known(hex_digest(&cert, MessageDigest::sha256()))
        );
    }

    fn hex_digest(cert: &X509, digest: MessageDigest) -> String {
        cert.digest(digest)
            .unwrap()
            .iter()
            .map(|b| format!("{:02x}", b))
            .collect()
    }

    #[test]
    fn test_subject_with_embedded_nul() {
        let cert = fixtures::certificate(
            &fixtures::rsa_key(1024),
            &[("CN", "www.bank.com\0.evil.com"), ("emailAddress", "a@b\0c.evil")],
            1,
            1,
        );
        let x509 = probe(cert.to_pem().unwrap());

        assert_eq!(
            x509.subject(),
            Answer::Known("/CN=www.bank.com\0.evil.com/emailAddress=a@b\0c.evil".to_string())
        );
        assert_eq!(x509.email(), Answer::Known("a@b\0c.evil".to_string()));
    }

    #[test]
    fn test_any_os_family_is_supported() {
        let pem = fixtures::default_certificate().to_pem().unwrap();
        for os in [OsFamily::Linux, OsFamily::Windows, OsFamily::Other] {
            let host = MemoryHost::new(os).with_file(PATH, pem.clone());
            let x509 = X509Certificate::new(Arc::new(host), PATH);
            assert!(x509.certificate(), "{}", os);
            assert_eq!(x509.skip_message(), None, "{}", os);
        }
    }

    #[test]
    fn test_der_content() {
        let cert = fixtures::default_certificate();
        let x509 = probe(cert.to_der().unwrap());

        assert!(x509.certificate());
        assert_eq!(x509.subject(), Answer::Known(fixtures::SUBJECT.to_string()));
    }

    #[test]
    fn test_one_year_window() {
        let x509 = probe(fixtures::default_certificate().to_pem().unwrap());

        assert_eq!(x509.valid(), Answer::Known(true));
        let days = x509.validity_in_days().into_known().unwrap();
        assert!((days - 365.0).abs() <= 1.0, "days = {}", days);
    }

    #[test]
    fn test_validity_formula() {
        let x509 = probe(fixtures::default_certificate().to_pem().unwrap());
        let not_after = x509.not_after().into_known().unwrap();

        for offset_days in [-400_i64, -10, 0, 10, 400] {
            let now = not_after - Duration::days(offset_days);
            let days = x509.validity_in_days_at(now).into_known().unwrap();
            assert!((days - offset_days as f64).abs() < 1e-6, "days = {}", days);
        }

        let after_expiry = not_after + Duration::days(3);
        assert!(x509.validity_in_days_at(after_expiry).into_known().unwrap() < 0.0);
        assert_eq!(x509.valid_at(after_expiry), Answer::Known(false));
    }

    #[test]
    fn test_window_bounds_are_inclusive() {
        let x509 = probe(fixtures::default_certificate().to_pem().unwrap());
        let not_before = x509.not_before().into_known().unwrap();
        let not_after = x509.not_after().into_known().unwrap();

        assert_eq!(x509.valid_at(not_before), Answer::Known(true));
        assert_eq!(x509.valid_at(not_after), Answer::Known(true));
        assert_eq!(
            x509.valid_at(not_before - Duration::seconds(1)),
            Answer::Known(false)
        );
        assert_eq!(
            x509.valid_at(not_after + Duration::seconds(1)),
            Answer::Known(false)
        );
    }

    #[test]
    fn test_expired_certificate() {
        let cert = fixtures::certificate(&fixtures::rsa_key(1024), &fixtures::subject_entries(), 30, -2);
        let x509 = probe(cert.to_pem().unwrap());

        assert_eq!(x509.valid(), Answer::Known(false));
        let days = x509.validity_in_days().into_known().unwrap();
        assert!(days < -1.9 && days > -2.1, "days = {}", days);
    }

    #[test]
    fn test_non_rsa_key_length_is_skipped() {
        let cert = fixtures::certificate(&fixtures::ec_key(), &[("CN", "ec.example")], 1, 1);
        let x509 = probe(cert.to_pem().unwrap());

        assert!(x509.certificate());
        let answer = x509.key_length();
        assert!(answer.is_skipped());
        assert!(answer.skip_reason().unwrap().contains("EC"));
        assert_eq!(x509.email(), Answer::Unknown);
    }

    #[test]
    fn test_malformed_certificate_is_unknown() {
        let x509 = probe("-----BEGIN CERTIFICATE-----\nnot base64!\n-----END CERTIFICATE-----\n");

        assert!(!x509.certificate());
        assert_eq!(x509.version(), Answer::Unknown);
        assert_eq!(x509.serial(), Answer::Unknown);
        assert_eq!(x509.signature_algorithm(), Answer::Unknown);
        assert_eq!(x509.subject(), Answer::Unknown);
        assert_eq!(x509.issuer(), Answer::Unknown);
        assert_eq!(x509.fingerprint(), Answer::Unknown);
        assert_eq!(x509.key_length(), Answer::Unknown);
        assert_eq!(x509.extensions(), Answer::Unknown);
        assert_eq!(x509.email(), Answer::Unknown);
        assert_eq!(x509.valid(), Answer::Unknown);
        assert_eq!(x509.validity_in_days(), Answer::Unknown);
        assert_eq!(x509.skip_message(), None);
    }

    #[test]
    fn test_missing_file_is_unknown() {
        let host = Arc::new(MemoryHost::new(OsFamily::Linux));
        let x509 = X509Certificate::new(host, "/etc/ssl/none.pem");

        assert!(!x509.certificate());
        assert_eq!(x509.subject(), Answer::Unknown);
    }

    #[test]
    fn test_certificate_read_once() {
        let host = Arc::new(
            MemoryHost::new(OsFamily::Linux)
                .with_file(PATH, fixtures::default_certificate().to_pem().unwrap()),
        );
        let x509 = X509Certificate::new(host.clone(), PATH);

        let _ = x509.subject();
        let _ = x509.validity_in_days();
        let _ = x509.validity_in_days();

        assert_eq!(host.calls(), vec![format!("read:{}", PATH)]);
    }
}
