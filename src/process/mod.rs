//! Managed process handles
//!
//! Wraps the xrdp display server and session manager as explicit handles
//! owned by the supervisor: a start command spawned without waiting, a
//! liveness probe against the process table, a graceful stop command and
//! the advisory PID file a previous instance may have left behind.

mod table;

pub use table::is_listed;

use std::path::{Path, PathBuf};
use std::process::Stdio;

use tokio::process::Command;
use tracing::{debug, info, warn};

use crate::supervisor::SupervisorError;

/// A background process owned by the supervisor for its lifetime.
#[derive(Debug, Clone)]
pub struct ManagedProcess {
    /// Name used in diagnostics
    name: String,
    /// Start command, argv[0] first
    start: Vec<String>,
    /// Graceful stop command
    stop: Vec<String>,
    /// Executable name to look for in the process table
    table_name: String,
    /// PID file the daemon binds on startup
    pid_file: PathBuf,
}

impl ManagedProcess {
    pub fn new(
        name: impl Into<String>,
        start: Vec<String>,
        stop: Vec<String>,
        table_name: impl Into<String>,
        pid_file: impl Into<PathBuf>,
    ) -> Self {
        Self {
            name: name.into(),
            start,
            stop,
            table_name: table_name.into(),
            pid_file: pid_file.into(),
        }
    }

    /// The xrdp session manager, brokers RDP sessions to the display server.
    pub fn session_manager() -> Self {
        Self::new(
            "xrdp-sesman",
            vec!["xrdp-sesman".to_string()],
            vec!["xrdp-sesman".to_string(), "--kill".to_string()],
            "xrdp-sesman",
            "/var/run/xrdp/xrdp-sesman.pid",
        )
    }

    /// The xrdp display server.
    pub fn display_server() -> Self {
        Self::new(
            "xrdp",
            vec!["xrdp".to_string()],
            vec!["xrdp".to_string(), "--kill".to_string()],
            "xrdp",
            "/var/run/xrdp/xrdp.pid",
        )
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn pid_file(&self) -> &Path {
        &self.pid_file
    }

    /// Spawn the process without waiting on it.
    ///
    /// xrdp daemonizes itself, so the direct child exits almost immediately.
    /// It is reaped in the background and the daemon is tracked through the
    /// process table rather than the child handle.
    pub fn spawn(&self) -> Result<(), SupervisorError> {
        let mut command = Command::new(&self.start[0]);
        command.args(&self.start[1..]).stdin(Stdio::null());

        let mut child = command
            .spawn()
            .map_err(|e| SupervisorError::LaunchFailed(format!("{}: {}", self.name, e)))?;

        info!("Started {}", self.name);

        tokio::spawn(async move {
            let _ = child.wait().await;
        });

        Ok(())
    }

    /// Check whether the daemon appears in the process table.
    pub async fn is_running(&self) -> bool {
        table::is_listed(&self.table_name).await
    }

    /// Issue the graceful stop command.
    ///
    /// Failures are logged and swallowed, the call stays safe to repeat
    /// against a process that already exited.
    pub async fn stop(&self) {
        match Command::new(&self.stop[0]).args(&self.stop[1..]).output().await {
            Ok(output) if output.status.success() => info!("Stopped {}", self.name),
            Ok(output) => debug!(
                "Stop command for {} exited with {}",
                self.name, output.status
            ),
            Err(e) => warn!("Failed to run stop command for {}: {}", self.name, e),
        }
    }
}
