//! Supervisor error types

use thiserror::Error;

/// Supervision lifecycle errors
#[derive(Error, Debug)]
pub enum SupervisorError {
    #[error("Failed to start process: {0}")]
    LaunchFailed(String),

    #[error("Upstream sync failed: {0}")]
    SyncFailed(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}
