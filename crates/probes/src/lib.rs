//! Host-state probes for compliance audits.
//!
//! A probe is bound to one target (a bridge name, a key file, a certificate
//! file), picks an OS-specific provider when it is constructed, resolves its
//! result once on first query and answers typed questions from that cached
//! result. Failures never escape a probe: they become [`Answer::Unknown`] or
//! [`Answer::Skipped`].

pub mod answer;
pub mod bridge;
pub mod certificate;
pub mod dn;
pub mod error;
pub mod extension;
pub mod key_pair;
pub mod probe;

#[cfg(test)]
pub(crate) mod fixtures;

pub use answer::Answer;
pub use bridge::{Bridge, BridgeInfo};
pub use certificate::{CertificateInfo, X509Certificate};
pub use dn::DistinguishedName;
pub use error::ProbeError;
pub use extension::Extension;
pub use key_pair::{KeyInfo, KeyPair};
pub use probe::{Fact, Memo, Probe, ProbeKind, Resolution};
