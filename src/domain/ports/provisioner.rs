//! Provisioner Port
//!
//! Defines the post-create hook that deploys a casker on the host,
//! and the service manager it drives.

use crate::domain::entities::{CaskerRecord, IconFile};
use async_trait::async_trait;

/// Deploys a freshly created casker.
///
/// Called once per created record, after the record store accepted it.
#[async_trait]
pub trait Provisioner: Send + Sync {
    async fn provision(&self, record: &CaskerRecord, icon: Option<&IconFile>)
        -> Result<(), ProvisionError>;
}

/// Controls host services (systemd in production).
#[async_trait]
pub trait ServiceControl: Send + Sync {
    /// Run a service manager command, e.g. `["enable", "alice.service"]`.
    async fn run(&self, args: &[&str]) -> Result<(), ProvisionError>;
}

/// Provisioning failures, tagged with the step that failed.
#[derive(Debug, thiserror::Error)]
pub enum ProvisionError {
    #[error("invalid casker name for provisioning: {0:?}")]
    InvalidName(String),
    #[error("failed to {step}: {source}")]
    Io {
        step: &'static str,
        #[source]
        source: std::io::Error,
    },
    #[error("command `{command}` failed: {message}")]
    Command { command: String, message: String },
}
