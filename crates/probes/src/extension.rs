//! Flattened X.509v3 extensions.

use crate::error::ProbeError;
use hostprobe_common::hash::colon_hex;
use openssl::asn1::Asn1Object;
use openssl::nid::Nid;
use serde::Serialize;
use std::net::{Ipv4Addr, Ipv6Addr};
use x509_parser::extensions::{GeneralName, KeyUsage, ParsedExtension, X509Extension};

/// One certificate extension as a flat record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Extension {
    /// OpenSSL short name (`basicConstraints`), or the dotted OID when
    /// OpenSSL has no name for it.
    pub oid: String,
    pub critical: bool,
    /// Text rendering of the extension value.
    pub value: String,
}

impl Extension {
    fn from_parsed(ext: &X509Extension<'_>) -> Self {
        let dotted = ext.oid.to_id_string();
        Self {
            oid: short_name(&dotted).unwrap_or(dotted),
            critical: ext.critical,
            value: render(ext.parsed_extension(), ext.value),
        }
    }
}

/// Enumerate the extensions of a DER-encoded certificate in encoding order.
pub fn extensions_of(der: &[u8]) -> Result<Vec<Extension>, ProbeError> {
    let (_, cert) =
        x509_parser::parse_x509_certificate(der).map_err(|e| ProbeError::X509(e.to_string()))?;
    Ok(cert.extensions().iter().map(Extension::from_parsed).collect())
}

fn short_name(dotted: &str) -> Option<String> {
    let object = Asn1Object::from_str(dotted).ok()?;
    let nid = object.nid();
    if nid == Nid::UNDEF {
        return None;
    }
    nid.short_name().ok().map(str::to_string)
}

fn render(parsed: &ParsedExtension<'_>, raw: &[u8]) -> String {
    match parsed {
        ParsedExtension::BasicConstraints(bc) => {
            let mut text = format!("CA:{}", if bc.ca { "TRUE" } else { "FALSE" });
            if let Some(len) = bc.path_len_constraint {
                text.push_str(&format!(", pathlen:{}", len));
            }
            text
        }
        ParsedExtension::KeyUsage(usage) => key_usage_names(usage).join(", "),
        ParsedExtension::ExtendedKeyUsage(eku) => {
            let mut names: Vec<String> = [
                (eku.any, "Any Extended Key Usage"),
                (eku.server_auth, "TLS Web Server Authentication"),
                (eku.client_auth, "TLS Web Client Authentication"),
                (eku.code_signing, "Code Signing"),
                (eku.email_protection, "E-mail Protection"),
                (eku.time_stamping, "Time Stamping"),
                (eku.ocsp_signing, "OCSP Signing"),
            ]
            .iter()
            .filter(|(set, _)| *set)
            .map(|(_, name)| name.to_string())
            .collect();
            names.extend(eku.other.iter().map(|oid| oid.to_id_string()));
            names.join(", ")
        }
        ParsedExtension::SubjectAlternativeName(san) => san
            .general_names
            .iter()
            .map(general_name)
            .collect::<Vec<_>>()
            .join(", "),
        ParsedExtension::SubjectKeyIdentifier(id) => colon_hex(id.0),
        ParsedExtension::AuthorityKeyIdentifier(aki) => aki
            .key_identifier
            .as_ref()
            .map(|id| format!("keyid:{}", colon_hex(id.0)))
            .unwrap_or_default(),
        _ => colon_hex(raw),
    }
}

fn key_usage_names(usage: &KeyUsage) -> Vec<&'static str> {
    [
        (usage.digital_signature(), "Digital Signature"),
        (usage.non_repudiation(), "Non Repudiation"),
        (usage.key_encipherment(), "Key Encipherment"),
        (usage.data_encipherment(), "Data Encipherment"),
        (usage.key_agreement(), "Key Agreement"),
        (usage.key_cert_sign(), "Certificate Sign"),
        (usage.crl_sign(), "CRL Sign"),
        (usage.encipher_only(), "Encipher Only"),
        (usage.decipher_only(), "Decipher Only"),
    ]
    .iter()
    .filter(|(set, _)| *set)
    .map(|(_, name)| *name)
    .collect()
}

fn general_name(name: &GeneralName<'_>) -> String {
    match name {
        GeneralName::DNSName(dns) => format!("DNS:{}", dns),
        GeneralName::RFC822Name(email) => format!("email:{}", email),
        GeneralName::URI(uri) => format!("URI:{}", uri),
        GeneralName::IPAddress(bytes) => match bytes.len() {
            4 => {
                let octets: [u8; 4] = [bytes[0], bytes[1], bytes[2], bytes[3]];
                format!("IP Address:{}", Ipv4Addr::from(octets))
            }
            16 => {
                let mut octets = [0u8; 16];
                octets.copy_from_slice(bytes);
                format!("IP Address:{}", Ipv6Addr::from(octets))
            }
            _ => format!("IP Address:{}", colon_hex(bytes)),
        },
        GeneralName::DirectoryName(dn) => format!("DirName:{}", dn),
        GeneralName::RegisteredID(oid) => format!("Registered ID:{}", oid.to_id_string()),
        _ => "othername:<unsupported>".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures;

    #[test]
    fn test_extensions_in_order() {
        let der = fixtures::default_certificate().to_der().unwrap();
        let extensions = extensions_of(&der).unwrap();

        let oids: Vec<&str> = extensions.iter().map(|e| e.oid.as_str()).collect();
        assert_eq!(
            oids,
            vec![
                "basicConstraints",
                "keyUsage",
                "extendedKeyUsage",
                "subjectAltName"
            ]
        );

        assert_eq!(
            extensions[0],
            Extension {
                oid: "basicConstraints".to_string(),
                critical: true,
                value: "CA:TRUE, pathlen:0".to_string(),
            }
        );
        assert_eq!(extensions[1].value, "Digital Signature, Certificate Sign");
        assert!(extensions[1].critical);
        assert_eq!(extensions[2].value, "TLS Web Server Authentication");
        assert!(!extensions[2].critical);
        assert_eq!(extensions[3].value, "DNS:inspec.io, IP Address:10.0.0.1");
    }

    #[test]
    fn test_short_name_lookup() {
        assert_eq!(short_name("2.5.29.19").as_deref(), Some("basicConstraints"));
        assert_eq!(short_name("1.3.6.1.4.1.99999.1"), None);
    }

    #[test]
    fn test_extensions_of_garbage() {
        assert!(matches!(extensions_of(b"nope"), Err(ProbeError::X509(_))));
    }
}
