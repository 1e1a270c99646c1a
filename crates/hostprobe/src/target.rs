//! Target selection: which host the probes inspect.

use anyhow::{Context, Result};
use hostprobe_host::{Host, LocalHost, SshHost};
use std::path::PathBuf;
use std::str::FromStr;
use std::sync::Arc;
use tracing::info;

/// How the target host is reached.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TargetKind {
    /// The machine hostprobe runs on.
    Local,
    /// A remote machine over SSH.
    Ssh,
}

impl FromStr for TargetKind {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "local" | "localhost" => Ok(TargetKind::Local),
            "ssh" | "remote" => Ok(TargetKind::Ssh),
            _ => Err(anyhow::anyhow!("Invalid target: {}", s)),
        }
    }
}

/// Target configuration.
#[derive(Debug, Clone)]
pub struct TargetConfig {
    pub kind: TargetKind,
    pub host: Option<String>,
    pub ssh_port: u16,
    pub ssh_user: Option<String>,
    pub ssh_key: Option<PathBuf>,
    pub ssh_password: Option<String>,
}

impl TargetConfig {
    /// Open the host accessor for this target.
    pub fn connect(&self) -> Result<Arc<dyn Host>> {
        match self.kind {
            TargetKind::Local => {
                let host = LocalHost::new();
                info!("Inspecting {}", host.label());
                Ok(Arc::new(host))
            }
            TargetKind::Ssh => {
                let address = self
                    .host
                    .as_deref()
                    .context("--host is required for an ssh target")?;
                let host = SshHost::connect(
                    address,
                    self.ssh_port,
                    self.ssh_user.as_deref(),
                    self.ssh_key.as_deref(),
                    self.ssh_password.as_deref(),
                )
                .with_context(|| format!("Failed to connect to {}:{}", address, self.ssh_port))?;
                Ok(Arc::new(host))
            }
        }
    }
}
