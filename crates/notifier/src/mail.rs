//! Local mail command delivery.

use crate::error::NotifyError;
use crate::Notifier;
use async_trait::async_trait;
use std::process::Stdio;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tracing::{debug, instrument, warn};

/// Hands notifications to a `mail(1)`-compatible program.
///
/// Runs `<program> -s <subject> -- <recipient>` directly (no shell) and writes
/// the body to its stdin.
#[derive(Debug, Clone)]
pub struct MailCommandNotifier {
    program: String,
}

impl MailCommandNotifier {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }

    pub fn program(&self) -> &str {
        &self.program
    }
}

impl Default for MailCommandNotifier {
    fn default() -> Self {
        Self::new("mail")
    }
}

#[async_trait]
impl Notifier for MailCommandNotifier {
    #[instrument(skip(self, body))]
    async fn notify(&self, identity: &str, subject: &str, body: &str) -> Result<(), NotifyError> {
        let spawn_error = |source| NotifyError::Spawn {
            program: self.program.clone(),
            source,
        };

        let mut child = Command::new(&self.program)
            .arg("-s")
            .arg(subject)
            .arg("--")
            .arg(identity)
            .stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
            .map_err(spawn_error)?;

        if let Some(mut stdin) = child.stdin.take() {
            match stdin.write_all(body.as_bytes()).await {
                Ok(()) => {}
                // Program exited without reading; its exit status decides
                Err(e) if e.kind() == std::io::ErrorKind::BrokenPipe => {
                    debug!(program = %self.program, "Mail command closed stdin early");
                }
                Err(e) => return Err(spawn_error(e)),
            }
            // Closing stdin lets the program see end of message
            drop(stdin);
        }

        let status = child.wait().await.map_err(spawn_error)?;
        if !status.success() {
            warn!(program = %self.program, %status, "Mail command failed");
            return Err(NotifyError::CommandFailed {
                program: self.program.clone(),
                status: status.to_string(),
            });
        }

        debug!(program = %self.program, "Mail handed off");
        Ok(())
    }
}
