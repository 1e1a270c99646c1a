//! Host accessor for the machine hostprobe runs on.

use crate::host::{powershell_encoded, CommandOutput, FileInfo, Host};
use hostprobe_common::{Error, OsFamily, Result};
use std::io::ErrorKind;
use std::process::Command;
use tracing::debug;

/// Local host accessor backed by `std::fs` and `std::process`.
pub struct LocalHost {
    os: OsFamily,
}

impl LocalHost {
    pub fn new() -> Self {
        Self {
            os: OsFamily::current(),
        }
    }
}

impl Default for LocalHost {
    fn default() -> Self {
        Self::new()
    }
}

impl Host for LocalHost {
    fn read_file(&self, path: &str) -> Result<FileInfo> {
        debug!("Local read: {}", path);

        let metadata = match std::fs::metadata(path) {
            Ok(metadata) => metadata,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(FileInfo::missing()),
            Err(e) => return Err(e.into()),
        };

        if metadata.is_dir() {
            return Ok(FileInfo::directory());
        }

        let content = std::fs::read(path).map_err(|e| Error::FileRead {
            path: path.to_string(),
            reason: e.to_string(),
        })?;
        Ok(FileInfo::regular(content))
    }

    fn run_command(&self, command: &str) -> Result<CommandOutput> {
        debug!("Local exec: {}", command);

        let spawned = if self.os.is_windows() {
            let encoded = powershell_encoded(command);
            Command::new("powershell.exe")
                .args([
                    "-NoProfile",
                    "-NonInteractive",
                    "-EncodedCommand",
                    encoded.as_str(),
                ])
                .output()
        } else {
            Command::new("sh").args(["-c", command]).output()
        };
        let output = spawned.map_err(|e| Error::CommandExecution {
            cmd: command.to_string(),
            reason: e.to_string(),
        })?;

        Ok(CommandOutput {
            stdout: String::from_utf8_lossy(&output.stdout).to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).to_string(),
            exit_status: output.status.code().unwrap_or(-1),
        })
    }

    fn os_family(&self) -> OsFamily {
        self.os
    }

    fn label(&self) -> String {
        "local://".to_string()
    }
}
