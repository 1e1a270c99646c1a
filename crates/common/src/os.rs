//! Operating system family definitions.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Operating system family of an audited host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OsFamily {
    Linux,
    Windows,
    Other,
}

impl fmt::Display for OsFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OsFamily::Linux => write!(f, "linux"),
            OsFamily::Windows => write!(f, "windows"),
            OsFamily::Other => write!(f, "other"),
        }
    }
}

impl FromStr for OsFamily {
    type Err = crate::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "linux" => Ok(OsFamily::Linux),
            "windows" => Ok(OsFamily::Windows),
            "other" => Ok(OsFamily::Other),
            _ => Err(crate::Error::UnsupportedOs(s.to_string())),
        }
    }
}

impl OsFamily {
    /// Family of the machine this binary runs on.
    pub fn current() -> Self {
        if cfg!(target_os = "linux") {
            OsFamily::Linux
        } else if cfg!(target_os = "windows") {
            OsFamily::Windows
        } else {
            OsFamily::Other
        }
    }

    /// Classify the output of `uname -s` (or a Windows `ver` banner).
    pub fn from_uname(output: &str) -> Self {
        let kernel = output.trim().to_lowercase();
        if kernel.starts_with("linux") {
            OsFamily::Linux
        } else if kernel.contains("windows")
            || kernel.starts_with("mingw")
            || kernel.starts_with("msys")
            || kernel.starts_with("cygwin")
        {
            OsFamily::Windows
        } else {
            OsFamily::Other
        }
    }

    /// Check if the OS is Linux.
    pub fn is_linux(&self) -> bool {
        matches!(self, OsFamily::Linux)
    }

    /// Check if the OS is Windows.
    pub fn is_windows(&self) -> bool {
        matches!(self, OsFamily::Windows)
    }
}
