//! Public/private key pair validation.
//!
//! ```text
//! key_rsa('key.pem', 'passphrase') should be_valid
//! key_rsa('key.pem', 'passphrase') should be_private
//! ```

use crate::answer::Answer;
use crate::probe::{Memo, Probe, ProbeKind, Resolution};
use hostprobe_host::Host;
use openssl::error::ErrorStack;
use openssl::pkey::{HasPublic, Id, PKey, PKeyRef};
use openssl::rsa::Rsa;
use serde::Serialize;
use std::sync::Arc;
use tracing::debug;

const UNLOADABLE_KEY: &str = "Unable to load private key";

/// Classification of a parsed key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct KeyInfo {
    pub public: bool,
    pub private: bool,
    /// `RSA`, `EC`, `DSA`, `ED25519`, ...
    pub algorithm: String,
    pub bits: u32,
}

impl KeyInfo {
    fn describe<T: HasPublic>(key: &PKeyRef<T>, private: bool) -> Self {
        Self {
            public: true,
            private,
            algorithm: algorithm_name(key.id()).to_string(),
            bits: key.bits(),
        }
    }
}

/// Name of a key algorithm.
pub(crate) fn algorithm_name(id: Id) -> &'static str {
    match id {
        Id::RSA => "RSA",
        Id::DSA => "DSA",
        Id::DH => "DH",
        Id::EC => "EC",
        Id::ED25519 => "ED25519",
        Id::ED448 => "ED448",
        _ => "unknown",
    }
}

/// Parse key material: PEM private (with passphrase), PEM public (SPKI or
/// PKCS#1 RSA), then the same in DER.
pub fn parse_key(content: &[u8], passphrase: &str) -> Result<KeyInfo, ErrorStack> {
    if let Ok(key) = PKey::private_key_from_pem_passphrase(content, passphrase.as_bytes()) {
        return Ok(KeyInfo::describe(&key, true));
    }
    if let Ok(key) = PKey::public_key_from_pem(content) {
        return Ok(KeyInfo::describe(&key, false));
    }
    if let Ok(rsa) = Rsa::public_key_from_pem_pkcs1(content) {
        let key = PKey::from_rsa(rsa)?;
        return Ok(KeyInfo::describe(&key, false));
    }
    if let Ok(key) = PKey::private_key_from_der(content) {
        return Ok(KeyInfo::describe(&key, true));
    }
    let key = PKey::public_key_from_der(content)?;
    Ok(KeyInfo::describe(&key, false))
}

/// Probe for a key file, optionally protected by a passphrase.
///
/// Key material is parsed locally, so one provider serves every OS family and
/// construction never consults `host.os_family()`.
pub struct KeyPair {
    host: Arc<dyn Host>,
    path: String,
    passphrase: String,
    key: Memo<KeyInfo>,
}

impl KeyPair {
    /// Probe an unencrypted key file.
    pub fn new(host: Arc<dyn Host>, path: impl Into<String>) -> Self {
        Self::with_passphrase(host, path, "")
    }

    pub fn with_passphrase(
        host: Arc<dyn Host>,
        path: impl Into<String>,
        passphrase: impl Into<String>,
    ) -> Self {
        Self {
            host,
            path: path.into(),
            passphrase: passphrase.into(),
            key: Memo::new(),
        }
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    /// Same as [`KeyPair::public`].
    pub fn valid(&self) -> Answer<bool> {
        self.public()
    }

    pub fn public(&self) -> Answer<bool> {
        self.info().map(|k| k.public).into()
    }

    pub fn private(&self) -> Answer<bool> {
        self.info().map(|k| k.private).into()
    }

    pub fn algorithm(&self) -> Answer<String> {
        self.info().map(|k| k.algorithm.clone()).into()
    }

    /// Key size in bits.
    pub fn key_length(&self) -> Answer<u32> {
        self.info().map(|k| k.bits).into()
    }

    /// The parsed key classification, if the file held a key.
    pub fn info(&self) -> Option<&KeyInfo> {
        self.resolution().value()
    }

    fn resolution(&self) -> &Resolution<KeyInfo> {
        self.key.get_or_resolve(|| self.load())
    }

    fn load(&self) -> Resolution<KeyInfo> {
        let file = match self.host.read_file(&self.path) {
            Ok(file) => file,
            Err(e) => return Resolution::failed(e.into()),
        };
        let Some(content) = file.non_empty_content() else {
            return Resolution::absent(format!("{} has no content", self.path));
        };

        match parse_key(content, &self.passphrase) {
            Ok(info) => Resolution::present(info),
            Err(e) => {
                debug!("Key {} failed to parse: {}", self.path, e);
                Resolution::absent(format!("{} is not a readable key", self.path))
                    .with_skip_message(UNLOADABLE_KEY)
            }
        }
    }
}

impl Probe for KeyPair {
    fn kind(&self) -> ProbeKind {
        ProbeKind::KeyPair
    }

    fn describe(&self) -> String {
        format!("rsa_key {}", self.path)
    }

    fn skip_message(&self) -> Option<String> {
        self.resolution().skip_message.clone()
    }

    fn warnings(&self) -> Vec<String> {
        self.resolution().warnings.clone()
    }
}
