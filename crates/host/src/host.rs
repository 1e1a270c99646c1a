//! The host accessor trait and its value types.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use hostprobe_common::{OsFamily, Result};

/// Snapshot of a path on the audited host.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FileInfo {
    pub exists: bool,
    pub is_directory: bool,
    /// File content; `None` for directories and missing paths.
    pub content: Option<Vec<u8>>,
}

impl FileInfo {
    /// A path that does not exist.
    pub fn missing() -> Self {
        Self::default()
    }

    /// An existing directory.
    pub fn directory() -> Self {
        Self {
            exists: true,
            is_directory: true,
            content: None,
        }
    }

    /// An existing regular file with the given content.
    pub fn regular(content: impl Into<Vec<u8>>) -> Self {
        Self {
            exists: true,
            is_directory: false,
            content: Some(content.into()),
        }
    }

    /// Content of a regular file, if it has any.
    pub fn non_empty_content(&self) -> Option<&[u8]> {
        self.content.as_deref().filter(|c| !c.is_empty())
    }
}

/// Result of running a command on the audited host.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandOutput {
    pub stdout: String,
    pub stderr: String,
    /// Process exit status; `-1` when the process was terminated without one.
    pub exit_status: i32,
}

impl CommandOutput {
    /// Whether the command exited with status zero.
    pub fn success(&self) -> bool {
        self.exit_status == 0
    }
}

/// Blocking access to the file system and command line of one host.
pub trait Host: Send + Sync {
    /// Read a path. Missing paths are reported through [`FileInfo::exists`],
    /// not as errors.
    fn read_file(&self, path: &str) -> Result<FileInfo>;

    /// Run a command line in the host's native shell (`sh` on POSIX,
    /// PowerShell on Windows).
    fn run_command(&self, command: &str) -> Result<CommandOutput>;

    /// Operating system family of the host.
    fn os_family(&self) -> OsFamily;

    /// Short label used in logs and reports.
    fn label(&self) -> String;
}

/// Encode a PowerShell script for `-EncodedCommand` (UTF-16LE, base64).
pub fn powershell_encoded(script: &str) -> String {
    let utf16_bytes: Vec<u8> = script
        .encode_utf16()
        .flat_map(|c| c.to_le_bytes())
        .collect();
    STANDARD.encode(utf16_bytes)
}

/// Full PowerShell invocation for a script.
pub(crate) fn powershell_invocation(script: &str) -> String {
    format!(
        "powershell.exe -NoProfile -NonInteractive -EncodedCommand {}",
        powershell_encoded(script)
    )
}
