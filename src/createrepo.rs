// src/createrepo.rs

//! Repository metadata build over a channel export directory

use crate::config::CreaterepoSection;
use crate::error::{Error, Result};
use std::path::Path;
use std::process::{Command, Stdio};
use std::time::Duration;
use tracing::{debug, info};
use wait_timeout::ChildExt;

/// Runs the external metadata build tool
#[derive(Debug, Clone)]
pub struct MetadataBuilder {
    command: String,
    args: Vec<String>,
    timeout: Duration,
}

impl MetadataBuilder {
    pub fn new(command: impl Into<String>, args: Vec<String>, timeout: Duration) -> Self {
        Self {
            command: command.into(),
            args,
            timeout,
        }
    }

    pub fn from_config(section: &CreaterepoSection) -> Self {
        Self::new(section.command.clone(), section.args.clone(), section.timeout())
    }

    /// Build metadata for `dir`
    ///
    /// The tool's stdout is discarded and its stderr passed through. A run
    /// exceeding the timeout is killed.
    pub fn build(&self, dir: &Path) -> Result<()> {
        info!("Running {} in {}", self.command, dir.display());
        debug!("Executing: {} {:?} {}", self.command, self.args, dir.display());

        let mut child = Command::new(&self.command)
            .args(&self.args)
            .arg(dir)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::inherit())
            .spawn()
            .map_err(|e| {
                Error::CommandFailed(format!("Failed to spawn '{}': {}", self.command, e))
            })?;

        match child.wait_timeout(self.timeout)? {
            Some(status) if status.success() => Ok(()),
            Some(status) => Err(Error::CommandFailed(format!(
                "'{}' failed for {} with exit code {}",
                self.command,
                dir.display(),
                status.code().unwrap_or(-1)
            ))),
            None => {
                let _ = child.kill();
                let _ = child.wait();
                Err(Error::CommandFailed(format!(
                    "'{}' timed out after {} seconds for {}",
                    self.command,
                    self.timeout.as_secs(),
                    dir.display()
                )))
            }
        }
    }
}
