//! Key and certificate material generated for tests.

use chrono::{Duration, Utc};
use openssl::asn1::Asn1Time;
use openssl::bn::BigNum;
use openssl::ec::{EcGroup, EcKey};
use openssl::hash::MessageDigest;
use openssl::nid::Nid;
use openssl::pkey::{PKey, Private};
use openssl::rsa::Rsa;
use openssl::symm::Cipher;
use openssl::x509::extension::{BasicConstraints, ExtendedKeyUsage, KeyUsage, SubjectAlternativeName};
use openssl::x509::{X509Name, X509NameBuilder, X509};

pub const SUBJECT: &str =
    "/C=DE/ST=Berlin/L=Berlin/O=InSpec/OU=Chef Software, Inc/CN=inspec.io/emailAddress=support@chef.io";

pub fn rsa_key(bits: u32) -> PKey<Private> {
    PKey::from_rsa(Rsa::generate(bits).unwrap()).unwrap()
}

pub fn ec_key() -> PKey<Private> {
    let group = EcGroup::from_curve_name(Nid::X9_62_PRIME256V1).unwrap();
    PKey::from_ec_key(EcKey::generate(&group).unwrap()).unwrap()
}

pub fn encrypted_pem(key: &PKey<Private>, passphrase: &str) -> Vec<u8> {
    key.private_key_to_pem_pkcs8_passphrase(Cipher::aes_256_cbc(), passphrase.as_bytes())
        .unwrap()
}

fn name(entries: &[(&str, &str)]) -> X509Name {
    let mut builder = X509NameBuilder::new().unwrap();
    for (field, value) in entries {
        builder.append_entry_by_text(field, value).unwrap();
    }
    builder.build()
}

pub fn subject_entries() -> Vec<(&'static str, &'static str)> {
    vec![
        ("C", "DE"),
        ("ST", "Berlin"),
        ("L", "Berlin"),
        ("O", "InSpec"),
        ("OU", "Chef Software, Inc"),
        ("CN", "inspec.io"),
        ("emailAddress", "support@chef.io"),
    ]
}

/// Self-signed certificate valid from `days_before` ago until `days_after`
/// from now (negative values move the window into the past).
pub fn certificate(
    key: &PKey<Private>,
    subject: &[(&str, &str)],
    days_before: i64,
    days_after: i64,
) -> X509 {
    let now = Utc::now();
    let not_before = Asn1Time::from_unix((now - Duration::days(days_before)).timestamp()).unwrap();
    let not_after = Asn1Time::from_unix((now + Duration::days(days_after)).timestamp()).unwrap();

    let mut builder = X509::builder().unwrap();
    builder.set_version(2).unwrap();
    let serial = BigNum::from_u32(4096).unwrap().to_asn1_integer().unwrap();
    builder.set_serial_number(&serial).unwrap();
    let name = name(subject);
    builder.set_subject_name(&name).unwrap();
    builder.set_issuer_name(&name).unwrap();
    builder.set_pubkey(key).unwrap();
    builder.set_not_before(&not_before).unwrap();
    builder.set_not_after(&not_after).unwrap();

    builder
        .append_extension(BasicConstraints::new().critical().ca().pathlen(0).build().unwrap())
        .unwrap();
    builder
        .append_extension(
            KeyUsage::new()
                .critical()
                .digital_signature()
                .key_cert_sign()
                .build()
                .unwrap(),
        )
        .unwrap();
    builder
        .append_extension(ExtendedKeyUsage::new().server_auth().build().unwrap())
        .unwrap();
    let san = SubjectAlternativeName::new()
        .dns("inspec.io")
        .ip("10.0.0.1")
        .build(&builder.x509v3_context(None, None))
        .unwrap();
    builder.append_extension(san).unwrap();

    builder.sign(key, MessageDigest::sha256()).unwrap();
    builder.build()
}

/// The default test certificate: RSA 2048, valid one year either side of now.
pub fn default_certificate() -> X509 {
    certificate(&rsa_key(2048), &subject_entries(), 365, 365)
}
