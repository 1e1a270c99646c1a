//! Network bridge topology probe.
//!
//! ```text
//! bridge('br0') should exist
//! bridge('br0') should have_interface 'eth0'
//! ```

use crate::answer::Answer;
use crate::error::ProbeError;
use crate::probe::{unless_skipped, Memo, Probe, ProbeKind, Resolution};
use hostprobe_common::OsFamily;
use hostprobe_host::Host;
use regex::Regex;
use serde::Serialize;
use serde_json::Value;
use std::sync::{Arc, OnceLock};
use tracing::{debug, warn};

/// Bridges enabled with the `ms_bridge` binding, as JSON.
pub const WINDOWS_BRIDGE_QUERY: &str = "Get-NetAdapterBinding -ComponentID ms_bridge | Get-NetAdapter | Select-Object -Property Name, InterfaceDescription | ConvertTo-Json";

const UNSUPPORTED_OS: &str = "The `bridge` resource is not supported on your OS yet.";
const WINDOWS_NO_INTERFACES: &str =
    "The `bridge` resource does not provide interface detection for Windows yet";

/// What a provider knows about one bridge.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BridgeInfo {
    pub name: String,
    /// Attached interfaces in backend order; `None` when the provider cannot
    /// enumerate them.
    pub interfaces: Option<Vec<String>>,
    /// Adapter description, where the backend reports one.
    pub description: Option<String>,
}

/// OS-specific bridge lookup, chosen once per probe.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum BridgeProvider {
    /// `/sys/class/net/<name>/bridge` marks a bridge, `brif/` lists ports.
    Linux,
    /// `Get-NetAdapterBinding -ComponentID ms_bridge`.
    Windows,
}

impl BridgeProvider {
    fn for_os(os: OsFamily) -> Option<Self> {
        match os {
            OsFamily::Linux => Some(BridgeProvider::Linux),
            OsFamily::Windows => Some(BridgeProvider::Windows),
            OsFamily::Other => None,
        }
    }

    fn bridge_info(&self, host: &dyn Host, name: &str) -> Resolution<BridgeInfo> {
        match self {
            BridgeProvider::Linux => linux_bridge_info(host, name),
            BridgeProvider::Windows => windows_bridge_info(host, name),
        }
    }
}

/// Probe for one named bridge on a host.
pub struct Bridge {
    host: Arc<dyn Host>,
    name: String,
    provider: Option<BridgeProvider>,
    skip: Option<String>,
    info: Memo<BridgeInfo>,
}

impl Bridge {
    /// Create the probe and pick the provider for the host's OS family.
    pub fn new(host: Arc<dyn Host>, name: impl Into<String>) -> Self {
        let name = name.into();
        let os = host.os_family();
        let provider = BridgeProvider::for_os(os);
        let skip = match provider {
            Some(_) => None,
            None => {
                debug!("No bridge provider for {}", os);
                Some(UNSUPPORTED_OS.to_string())
            }
        };

        Self {
            host,
            name,
            provider,
            skip,
            info: Memo::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// True when the bridge was found.
    pub fn exists(&self) -> bool {
        self.info().is_some_and(|info| !info.name.is_empty())
    }

    /// Whether `interface` is attached to the bridge.
    ///
    /// The Windows provider cannot enumerate bridge ports, so there this is
    /// always a skip, whether or not the bridge exists.
    pub fn has_interface(&self, interface: &str) -> Answer<bool> {
        unless_skipped(&self.skip, || {
            if self.provider == Some(BridgeProvider::Windows) {
                return Answer::skipped(WINDOWS_NO_INTERFACES);
            }
            match self.info() {
                None => Answer::Known(false),
                Some(info) => Answer::Known(
                    info.interfaces
                        .as_ref()
                        .is_some_and(|list| list.iter().any(|i| i == interface)),
                ),
            }
        })
    }

    /// Attached interfaces, in the order the backend lists them.
    pub fn interfaces(&self) -> Answer<Vec<String>> {
        unless_skipped(&self.skip, || {
            self.info()
                .and_then(|info| info.interfaces.clone())
                .into()
        })
    }

    /// The resolved bridge record, if the bridge exists.
    pub fn info(&self) -> Option<&BridgeInfo> {
        self.resolution().and_then(Resolution::value)
    }

    fn resolution(&self) -> Option<&Resolution<BridgeInfo>> {
        let provider = self.provider?;
        Some(
            self.info
                .get_or_resolve(|| provider.bridge_info(self.host.as_ref(), &self.name)),
        )
    }
}

impl Probe for Bridge {
    fn kind(&self) -> ProbeKind {
        ProbeKind::Bridge
    }

    fn describe(&self) -> String {
        format!("Bridge {}", self.name)
    }

    fn skip_message(&self) -> Option<String> {
        self.skip.clone()
    }

    fn warnings(&self) -> Vec<String> {
        self.resolution()
            .map(|r| r.warnings.clone())
            .unwrap_or_default()
    }
}

fn interface_name_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^[A-Za-z0-9_.:@-]{1,15}$").expect("Invalid interface name pattern")
    })
}

/// Validate that a name can be spliced into a sysfs path and shell command.
fn is_safe_interface_name(name: &str) -> bool {
    interface_name_pattern().is_match(name) && name != "." && name != ".."
}

fn linux_bridge_info(host: &dyn Host, name: &str) -> Resolution<BridgeInfo> {
    if !is_safe_interface_name(name) {
        return Resolution::absent(format!("{:?} is not a valid interface name", name));
    }

    let marker = format!("/sys/class/net/{}/bridge", name);
    match host.read_file(&marker) {
        Ok(file) if file.exists && file.is_directory => {}
        Ok(_) => return Resolution::absent(format!("{} is not a bridge", name)),
        Err(e) => return Resolution::failed(e.into()),
    }

    let listing = format!("ls -1 /sys/class/net/{}/brif/", name);
    let output = match host.run_command(&listing) {
        Ok(output) => output,
        Err(e) => return Resolution::failed(e.into()),
    };

    let interfaces: Vec<String> = output
        .stdout
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect();

    let resolution = Resolution::present(BridgeInfo {
        name: name.to_string(),
        interfaces: Some(interfaces),
        description: None,
    });

    if output.success() {
        resolution
    } else {
        resolution.with_warning(format!(
            "listing ports of bridge {} failed: {}",
            name,
            output.stderr.trim()
        ))
    }
}

fn windows_bridge_info(host: &dyn Host, name: &str) -> Resolution<BridgeInfo> {
    let output = match host.run_command(WINDOWS_BRIDGE_QUERY) {
        Ok(output) => output,
        Err(e) => return Resolution::failed(e.into()),
    };

    let adapters = match parse_adapters(&output.stdout) {
        Ok(adapters) => adapters,
        Err(e) => return Resolution::failed(e),
    };

    let mut matches: Vec<BridgeInfo> = adapters
        .into_iter()
        .filter(|adapter| adapter.name.eq_ignore_ascii_case(name))
        .collect();

    if matches.is_empty() {
        return Resolution::absent(format!("no bridge adapter named {}", name));
    }

    let count = matches.len();
    let resolution = Resolution::present(matches.swap_remove(0));
    if count > 1 {
        warn!(
            "[Possible Error] detected {} bridge interfaces with the name {}",
            count, name
        );
        resolution.with_warning(format!(
            "detected multiple bridge interfaces with the name {}",
            name
        ))
    } else {
        resolution
    }
}

/// Parse `ConvertTo-Json` output. A single adapter serializes as an object,
/// several as an array; entries without a string `Name` are ignored.
fn parse_adapters(stdout: &str) -> Result<Vec<BridgeInfo>, ProbeError> {
    let json: Value =
        serde_json::from_str(stdout).map_err(|e| ProbeError::Backend(e.to_string()))?;

    let items = match json {
        Value::Array(items) => items,
        object @ Value::Object(_) => vec![object],
        other => {
            return Err(ProbeError::Backend(format!(
                "expected adapter objects, got {}",
                other
            )))
        }
    };

    Ok(items
        .iter()
        .filter_map(|item| {
            let name = item.get("Name")?.as_str()?;
            Some(BridgeInfo {
                name: name.to_string(),
                interfaces: None,
                description: item
                    .get("InterfaceDescription")
                    .and_then(Value::as_str)
                    .map(str::to_string),
            })
        })
        .collect())
}
