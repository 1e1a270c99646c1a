//! Distinguished names in their canonical slash form.
//!
//! `/C=DE/ST=Berlin/CN=inspec.io` keeps the attribute order of the encoded
//! name, so string comparisons in controls see exactly what the certificate
//! carries.

use openssl::x509::X509NameRef;
use serde::Serialize;
use std::fmt;
use std::str::FromStr;

/// Attribute type of the legacy PKCS#9 e-mail address.
pub const EMAIL_ADDRESS: &str = "emailAddress";

/// Ordered `(attribute type, value)` pairs of a subject or issuer.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DistinguishedName {
    entries: Vec<(String, String)>,
}

impl DistinguishedName {
    pub fn new(entries: Vec<(String, String)>) -> Self {
        Self { entries }
    }

    /// Read the entries of an X.509 name in encoding order, using OpenSSL
    /// short names (`C`, `ST`, `CN`, `emailAddress`). Attributes without a
    /// short name fall back to their dotted OID.
    ///
    /// Values are decoded from their full encoded bytes, so an embedded NUL
    /// stays part of the value instead of ending it.
    pub fn from_x509_name(name: &X509NameRef) -> Self {
        let entries = name
            .entries()
            .map(|entry| {
                let object = entry.object();
                let kind = object
                    .nid()
                    .short_name()
                    .map(str::to_string)
                    .unwrap_or_else(|_| object.to_string());
                let value = String::from_utf8_lossy(entry.data().as_slice()).into_owned();
                (kind, value)
            })
            .collect();
        Self { entries }
    }

    pub fn entries(&self) -> &[(String, String)] {
        &self.entries
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Value of the first attribute of the given type.
    pub fn first(&self, kind: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(k, _)| k == kind)
            .map(|(_, v)| v.as_str())
    }

    /// The legacy `emailAddress` attribute, if present.
    pub fn email(&self) -> Option<&str> {
        self.first(EMAIL_ADDRESS)
    }
}

impl fmt::Display for DistinguishedName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (kind, value) in &self.entries {
            write!(f, "/{}={}", kind, value)?;
        }
        Ok(())
    }
}

/// Parse the slash form back into pairs. A segment without `=` belongs to the
/// previous value (`/OU=R/D` is one `OU` attribute with value `R/D`).
///
/// The slash form is ambiguous for values that themselves contain `/X=Y`:
/// `/O=a/b=c` always parses as two attributes, so such names do not survive
/// a round trip through their string form.
impl FromStr for DistinguishedName {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.is_empty() {
            return Ok(Self::default());
        }
        let rest = s
            .strip_prefix('/')
            .ok_or_else(|| format!("distinguished name must start with '/': {}", s))?;

        let mut entries: Vec<(String, String)> = Vec::new();
        for segment in rest.split('/') {
            match segment.split_once('=') {
                Some((kind, value)) if !kind.is_empty() => {
                    entries.push((kind.to_string(), value.to_string()));
                }
                _ => match entries.last_mut() {
                    Some((_, value)) => {
                        value.push('/');
                        value.push_str(segment);
                    }
                    None => return Err(format!("attribute without a type: {}", segment)),
                },
            }
        }
        Ok(Self { entries })
    }
}
