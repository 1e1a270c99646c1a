//! Errors raised inside providers.
//!
//! These never leave a probe; [`crate::probe::Resolution`] turns them into an
//! absent result.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ProbeError {
    #[error("host access failed: {0}")]
    Host(#[from] hostprobe_common::Error),

    #[error("OpenSSL error: {0}")]
    OpenSsl(#[from] openssl::error::ErrorStack),

    #[error("unable to parse X.509 structure: {0}")]
    X509(String),

    #[error("unexpected backend output: {0}")]
    Backend(String),
}
