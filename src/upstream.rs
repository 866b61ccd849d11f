//! Best-effort solver checkout sync
//!
//! Pulls the latest solver sources before launch. The caller logs and drops
//! the error, the host keeps running whatever is on disk.

use std::path::Path;

use tokio::process::Command;
use tracing::info;

use crate::supervisor::SupervisorError;

/// Update the solver checkout in `dir` from its upstream remote.
pub async fn pull_latest(dir: &Path) -> Result<(), SupervisorError> {
    let output = Command::new("git")
        .arg("pull")
        .current_dir(dir)
        .output()
        .await
        .map_err(|e| SupervisorError::SyncFailed(e.to_string()))?;

    if output.status.success() {
        info!("Solver checkout up to date");
        Ok(())
    } else {
        let stderr = String::from_utf8_lossy(&output.stderr);
        Err(SupervisorError::SyncFailed(stderr.trim().to_string()))
    }
}
