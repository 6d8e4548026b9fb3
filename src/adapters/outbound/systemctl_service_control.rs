//! systemctl Service Control
//!
//! Implements ServiceControl by spawning the service manager binary.

use crate::domain::ports::{ProvisionError, ServiceControl};
use async_trait::async_trait;
use tokio::process::Command;

/// Runs `systemctl <args>` and checks its exit status.
pub struct SystemctlServiceControl {
    program: String,
}

impl SystemctlServiceControl {
    pub fn new() -> Self {
        Self::with_program("systemctl")
    }

    /// Use another binary with the same calling convention.
    pub fn with_program(program: &str) -> Self {
        Self {
            program: program.to_string(),
        }
    }
}

impl Default for SystemctlServiceControl {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ServiceControl for SystemctlServiceControl {
    async fn run(&self, args: &[&str]) -> Result<(), ProvisionError> {
        let command = format!("{} {}", self.program, args.join(" "));
        tracing::debug!("running {}", command);

        let status = Command::new(&self.program)
            .args(args)
            .status()
            .await
            .map_err(|e| ProvisionError::Command {
                command: command.clone(),
                message: e.to_string(),
            })?;

        if !status.success() {
            return Err(ProvisionError::Command {
                command,
                message: status.to_string(),
            });
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_program() {
        let control = SystemctlServiceControl::default();
        assert_eq!(control.program, "systemctl");
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_run_success() {
        let control = SystemctlServiceControl::with_program("true");
        assert!(control.run(&["restart", "nginx"]).await.is_ok());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_run_non_zero_exit() {
        let control = SystemctlServiceControl::with_program("false");
        let err = control.run(&["start", "alice.service"]).await.unwrap_err();
        match err {
            ProvisionError::Command { command, .. } => {
                assert_eq!(command, "false start alice.service");
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_run_missing_binary() {
        let control = SystemctlServiceControl::with_program("definitely-not-a-real-binary-xyz");
        assert!(matches!(
            control.run(&["status"]).await,
            Err(ProvisionError::Command { .. })
        ));
    }
}
