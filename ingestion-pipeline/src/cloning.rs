use std::path::PathBuf;
use std::time::Duration;

use async_trait::async_trait;
use common::error::AppError;
use tokio::process::Command;
use tracing::{debug, info};

/// Parameters for making a remote repository locally available.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CloneConfig {
    pub url: String,
    pub branch: Option<String>,
    pub dest: PathBuf,
}

/// Seam for the acquisition step so tests can observe or stub it.
#[async_trait]
pub trait RepoAcquirer: Send + Sync {
    async fn acquire(&self, config: &CloneConfig) -> Result<(), AppError>;
}

/// Shallow single-branch clone through the `git` CLI, time-bounded.
/// The child process is killed when the timeout fires.
pub struct GitCloner {
    timeout: Duration,
}

impl GitCloner {
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }
}

#[async_trait]
impl RepoAcquirer for GitCloner {
    async fn acquire(&self, config: &CloneConfig) -> Result<(), AppError> {
        if let Some(parent) = config.dest.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        let mut cmd = Command::new("git");
        cmd.args(["clone", "--single-branch", "--depth", "1"]);
        if let Some(branch) = &config.branch {
            cmd.args(["--branch", branch]);
        }
        cmd.arg(&config.url);
        cmd.arg(&config.dest);
        cmd.kill_on_drop(true);

        debug!(url = %config.url, dest = %config.dest.display(), "starting clone");

        let output = tokio::time::timeout(self.timeout, cmd.output())
            .await
            .map_err(|_| {
                AppError::Acquisition(format!(
                    "clone of {} timed out after {}s",
                    config.url,
                    self.timeout.as_secs()
                ))
            })?
            .map_err(|e| AppError::Acquisition(format!("failed to run git: {e}")))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(AppError::Acquisition(format!(
                "git clone of {} failed: {}",
                config.url,
                stderr.trim()
            )));
        }

        info!(url = %config.url, "clone finished");
        Ok(())
    }
}
