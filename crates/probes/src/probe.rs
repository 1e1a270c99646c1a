//! The probe abstraction: tagged results, one-shot memoization and the
//! surface shared by every probe kind.

use crate::answer::Answer;
use crate::error::ProbeError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::OnceLock;
use tracing::debug;

/// Probe kinds known to hostprobe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProbeKind {
    Bridge,
    KeyPair,
    Certificate,
}

impl ProbeKind {
    /// Resource name as written in control code.
    pub fn resource_name(&self) -> &'static str {
        match self {
            ProbeKind::Bridge => "bridge",
            ProbeKind::KeyPair => "key_rsa",
            ProbeKind::Certificate => "x509_certificate",
        }
    }
}

impl fmt::Display for ProbeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.resource_name())
    }
}

/// Outcome of a provider lookup.
#[derive(Debug, Clone, PartialEq)]
pub enum Fact<T> {
    Present(T),
    /// Nothing to inspect; the reason is kept for diagnostics.
    Absent(String),
}

impl<T> Fact<T> {
    pub fn present(&self) -> Option<&T> {
        match self {
            Fact::Present(value) => Some(value),
            Fact::Absent(_) => None,
        }
    }

    pub fn is_present(&self) -> bool {
        matches!(self, Fact::Present(_))
    }
}

/// A fact plus what the provider noticed while producing it.
#[derive(Debug, Clone, PartialEq)]
pub struct Resolution<T> {
    pub fact: Fact<T>,
    /// Non-fatal anomalies, such as ambiguous backend output.
    pub warnings: Vec<String>,
    /// Set when the target exists but could not be loaded.
    pub skip_message: Option<String>,
}

impl<T> Resolution<T> {
    pub fn present(value: T) -> Self {
        Self {
            fact: Fact::Present(value),
            warnings: Vec::new(),
            skip_message: None,
        }
    }

    pub fn absent(reason: impl Into<String>) -> Self {
        let reason = reason.into();
        debug!("Result absent: {}", reason);
        Self {
            fact: Fact::Absent(reason),
            warnings: Vec::new(),
            skip_message: None,
        }
    }

    /// Absent result for a provider error.
    pub fn failed(error: ProbeError) -> Self {
        Self::absent(error.to_string())
    }

    pub fn with_warning(mut self, warning: impl Into<String>) -> Self {
        self.warnings.push(warning.into());
        self
    }

    pub fn with_skip_message(mut self, message: impl Into<String>) -> Self {
        self.skip_message = Some(message.into());
        self
    }

    pub fn value(&self) -> Option<&T> {
        self.fact.present()
    }
}

impl<T> From<Result<T, ProbeError>> for Resolution<T> {
    fn from(result: Result<T, ProbeError>) -> Self {
        match result {
            Ok(value) => Resolution::present(value),
            Err(e) => Resolution::failed(e),
        }
    }
}

/// A result computed at most once per probe instance.
///
/// Backed by [`OnceLock`]: when several threads query a fresh probe at the
/// same time, one computes and the others block until the value is stored.
#[derive(Debug)]
pub struct Memo<T> {
    cell: OnceLock<Resolution<T>>,
}

impl<T> Memo<T> {
    pub fn new() -> Self {
        Self {
            cell: OnceLock::new(),
        }
    }

    /// Return the cached resolution, computing it first if needed.
    pub fn get_or_resolve(&self, resolve: impl FnOnce() -> Resolution<T>) -> &Resolution<T> {
        self.cell.get_or_init(resolve)
    }

    /// Whether the resolution has been computed.
    pub fn is_resolved(&self) -> bool {
        self.cell.get().is_some()
    }
}

impl<T> Default for Memo<T> {
    fn default() -> Self {
        Self::new()
    }
}

/// Behavior shared by every probe, as seen by the assertion layer.
pub trait Probe {
    fn kind(&self) -> ProbeKind;

    /// Human-readable identity, e.g. `Bridge br0`.
    fn describe(&self) -> String;

    /// Why the probe cannot answer, if it was skipped.
    fn skip_message(&self) -> Option<String>;

    /// Non-fatal warnings raised while resolving.
    fn warnings(&self) -> Vec<String>;

    /// Resource name as written in control code.
    fn resource_name(&self) -> &'static str {
        self.kind().resource_name()
    }
}

/// Skip answer for a probe skipped as a whole, otherwise the lookup.
pub(crate) fn unless_skipped<T>(
    skip: &Option<String>,
    answer: impl FnOnce() -> Answer<T>,
) -> Answer<T> {
    match skip {
        Some(reason) => Answer::Skipped(reason.clone()),
        None => answer(),
    }
}
