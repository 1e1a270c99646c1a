//! Common utilities and types shared across hostprobe crates.

pub mod error;
pub mod hash;
pub mod os;
pub mod timestamp;

pub use error::{Error, Result};
pub use os::OsFamily;
pub use timestamp::Timestamp;
