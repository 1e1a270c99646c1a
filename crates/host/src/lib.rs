//! Host accessors: the file and command primitives probes are built on.

pub mod host;
pub mod local;
pub mod memory;
pub mod ssh;

pub use host::{powershell_encoded, CommandOutput, FileInfo, Host};
pub use local::LocalHost;
pub use memory::MemoryHost;
pub use ssh::SshHost;
