//! SSH host accessor for remote targets.
//!
//! Commands run over an exec channel; files are read over SFTP so binary
//! content (DER certificates, keys) survives intact.

use crate::host::{powershell_invocation, CommandOutput, FileInfo, Host};
use anyhow::{Context, Result};
use hostprobe_common::OsFamily;
use ssh2::Session;
use std::io::Read;
use std::net::TcpStream;
use std::path::Path;
use tracing::{debug, info};

/// Host accessor for a remote system reached over SSH.
pub struct SshHost {
    session: Session,
    target: String,
    os: OsFamily,
}

impl SshHost {
    /// Connect and authenticate, then detect the remote OS family.
    pub fn connect(
        host: &str,
        port: u16,
        user: Option<&str>,
        key_path: Option<&Path>,
        password: Option<&str>,
    ) -> hostprobe_common::Result<Self> {
        let session = Self::open_session(host, port, user, key_path, password)?;
        let target = format!("ssh://{}@{}:{}", user.unwrap_or("root"), host, port);

        let os = detect_os(&session);
        info!("Connected to {} ({})", target, os);

        Ok(Self {
            session,
            target,
            os,
        })
    }

    fn open_session(
        host: &str,
        port: u16,
        user: Option<&str>,
        key_path: Option<&Path>,
        password: Option<&str>,
    ) -> hostprobe_common::Result<Session> {
        let tcp = TcpStream::connect(format!("{}:{}", host, port))
            .map_err(|e| hostprobe_common::Error::SshConnection(e.to_string()))?;

        let mut session = Session::new()
            .map_err(|e| hostprobe_common::Error::SshConnection(e.to_string()))?;
        session.set_tcp_stream(tcp);
        session
            .handshake()
            .map_err(|e| hostprobe_common::Error::SshConnection(e.to_string()))?;

        let username = user.unwrap_or("root");
        authenticate(&session, username, key_path, password)
            .map_err(|e| hostprobe_common::Error::SshAuth(format!("{:#}", e)))?;

        if !session.authenticated() {
            return Err(hostprobe_common::Error::SshAuth(
                "SSH authentication failed".to_string(),
            ));
        }

        Ok(session)
    }

    fn exec(&self, command: &str) -> Result<CommandOutput> {
        exec_on(&self.session, command)
    }

    fn stat_and_read(&self, path: &str) -> Result<FileInfo> {
        let sftp = self.session.sftp().context("Failed to open SFTP channel")?;

        let stat = match sftp.stat(Path::new(path)) {
            Ok(stat) => stat,
            Err(e) => {
                debug!("SFTP stat {} failed: {}", path, e);
                return Ok(FileInfo::missing());
            }
        };

        if stat.is_dir() {
            return Ok(FileInfo::directory());
        }

        let mut file = sftp
            .open(Path::new(path))
            .with_context(|| format!("Failed to open {}", path))?;
        let mut content = Vec::new();
        file.read_to_end(&mut content)
            .with_context(|| format!("Failed to read {}", path))?;

        Ok(FileInfo::regular(content))
    }
}

impl Host for SshHost {
    fn read_file(&self, path: &str) -> hostprobe_common::Result<FileInfo> {
        debug!("SSH read: {}", path);
        self.stat_and_read(path)
            .map_err(|e| hostprobe_common::Error::FileRead {
                path: path.to_string(),
                reason: format!("{:#}", e),
            })
    }

    fn run_command(&self, command: &str) -> hostprobe_common::Result<CommandOutput> {
        debug!("SSH exec: {}", command);
        let line = if self.os.is_windows() {
            powershell_invocation(command)
        } else {
            command.to_string()
        };
        self.exec(&line)
            .map_err(|e| hostprobe_common::Error::CommandExecution {
                cmd: command.to_string(),
                reason: format!("{:#}", e),
            })
    }

    fn os_family(&self) -> OsFamily {
        self.os
    }

    fn label(&self) -> String {
        self.target.clone()
    }
}

fn authenticate(
    session: &Session,
    username: &str,
    key_path: Option<&Path>,
    password: Option<&str>,
) -> Result<()> {
    // Try key-based auth first
    if let Some(key) = key_path {
        session
            .userauth_pubkey_file(username, None, key, None)
            .context("SSH key authentication failed")?;
    } else if let Some(pwd) = password {
        session
            .userauth_password(username, pwd)
            .context("SSH password authentication failed")?;
    } else {
        let mut agent = session.agent().context("Failed to connect to SSH agent")?;
        agent.connect().context("Failed to connect to SSH agent")?;
        agent
            .list_identities()
            .context("Failed to list SSH agent identities")?;

        let identities = agent.identities()?;
        let authenticated = identities
            .iter()
            .any(|identity| agent.userauth(username, identity).is_ok());

        if !authenticated {
            anyhow::bail!("No valid SSH authentication method available");
        }
    }
    Ok(())
}

/// Run one command on a fresh exec channel.
///
/// stdout is read to EOF before stderr is drained. A command that fills the
/// channel window with stderr while stdout is still open would stall; the
/// probe commands write at most a line of diagnostics, well under the window.
fn exec_on(session: &Session, command: &str) -> Result<CommandOutput> {
    let mut channel = session
        .channel_session()
        .context("Failed to open SSH channel")?;
    channel
        .exec(command)
        .context("Failed to execute SSH command")?;

    let mut stderr_stream = channel.stderr();
    let (stdout, stderr) = read_streams(&mut channel, &mut stderr_stream)?;

    channel.wait_close().ok();
    let exit_status = channel.exit_status().unwrap_or(-1);

    Ok(CommandOutput {
        stdout,
        stderr,
        exit_status,
    })
}

/// Read stdout to EOF, then stderr.
fn read_streams(mut stdout: impl Read, mut stderr: impl Read) -> Result<(String, String)> {
    let mut out = String::new();
    stdout
        .read_to_string(&mut out)
        .context("Failed to read stdout")?;

    let mut err = String::new();
    stderr
        .read_to_string(&mut err)
        .context("Failed to read stderr")?;

    Ok((out, err))
}

/// `uname -s` answers on POSIX systems; Windows OpenSSH lands in `cmd.exe`,
/// where `ver` prints the Windows banner.
fn detect_os(session: &Session) -> OsFamily {
    if let Ok(output) = exec_on(session, "uname -s") {
        if output.success() && !output.stdout.trim().is_empty() {
            return OsFamily::from_uname(&output.stdout);
        }
    }
    match exec_on(session, "ver") {
        Ok(output) => OsFamily::from_uname(&output.stdout),
        Err(e) => {
            debug!("OS detection failed: {:#}", e);
            OsFamily::Other
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn test_read_streams_keeps_both_outputs() {
        let stderr = "warning: ".repeat(4096);
        let (out, err) =
            read_streams(Cursor::new("eth0\neth1\n"), Cursor::new(stderr.clone())).unwrap();

        assert_eq!(out, "eth0\neth1\n");
        assert_eq!(err, stderr);
    }

    #[test]
    fn test_read_streams_rejects_invalid_utf8() {
        let err = read_streams(Cursor::new(vec![0xff, 0xfe]), Cursor::new(Vec::new()))
            .err()
            .unwrap();
        assert!(err.to_string().contains("stdout"));
    }
}
