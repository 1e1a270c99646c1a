//! In-memory host accessor.
//!
//! Answers file reads and commands from canned data. Used to evaluate probes
//! against captured host state and as the fixture host in tests.

use crate::host::{CommandOutput, FileInfo, Host};
use hostprobe_common::{OsFamily, Result};
use std::collections::HashMap;
use std::sync::Mutex;
use tracing::debug;

/// Host accessor serving canned files and command outputs.
pub struct MemoryHost {
    os: OsFamily,
    files: HashMap<String, FileInfo>,
    commands: HashMap<String, CommandOutput>,
    calls: Mutex<Vec<String>>,
}

impl MemoryHost {
    /// Create an empty host of the given family.
    pub fn new(os: OsFamily) -> Self {
        Self {
            os,
            files: HashMap::new(),
            commands: HashMap::new(),
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Register a regular file.
    pub fn with_file(mut self, path: &str, content: impl Into<Vec<u8>>) -> Self {
        self.files.insert(path.to_string(), FileInfo::regular(content));
        self
    }

    /// Register a directory.
    pub fn with_directory(mut self, path: &str) -> Self {
        self.files.insert(path.to_string(), FileInfo::directory());
        self
    }

    /// Register a command that succeeds with the given stdout.
    pub fn with_command(self, command: &str, stdout: &str) -> Self {
        self.with_command_output(
            command,
            CommandOutput {
                stdout: stdout.to_string(),
                stderr: String::new(),
                exit_status: 0,
            },
        )
    }

    /// Register a command with a full output record.
    pub fn with_command_output(mut self, command: &str, output: CommandOutput) -> Self {
        self.commands.insert(command.to_string(), output);
        self
    }

    /// Every read and command issued so far, prefixed `read:` or `exec:`.
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().map(|c| c.clone()).unwrap_or_default()
    }

    fn record(&self, call: String) {
        if let Ok(mut calls) = self.calls.lock() {
            calls.push(call);
        }
    }
}

impl Host for MemoryHost {
    fn read_file(&self, path: &str) -> Result<FileInfo> {
        debug!("Memory read: {}", path);
        self.record(format!("read:{}", path));
        Ok(self.files.get(path).cloned().unwrap_or_else(FileInfo::missing))
    }

    fn run_command(&self, command: &str) -> Result<CommandOutput> {
        debug!("Memory exec: {}", command);
        self.record(format!("exec:{}", command));
        Ok(self
            .commands
            .get(command)
            .cloned()
            .unwrap_or_else(|| CommandOutput {
                stdout: String::new(),
                stderr: format!("command not found: {}", command),
                exit_status: 127,
            }))
    }

    fn os_family(&self) -> OsFamily {
        self.os
    }

    fn label(&self) -> String {
        format!("memory://{}", self.os)
    }
}
