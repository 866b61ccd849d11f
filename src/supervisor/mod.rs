//! Session supervision
//!
//! Owns the xrdp session manager and display server for the lifetime of the
//! container: clears stale PID files, starts both daemons, waits for the
//! display server to appear in the process table and stops both exactly once
//! on shutdown.

mod errors;
mod readiness;
mod signals;

pub use errors::SupervisorError;
pub use readiness::ReadinessState;
pub use signals::TerminationSignals;

use std::sync::atomic::{AtomicBool, Ordering};

use tracing::{debug, error, info};

use crate::process::ManagedProcess;
use crate::worker;
use crate::SupervisorConfig;

/// Supervises the remote-desktop session stack.
pub struct Supervisor {
    config: SupervisorConfig,
    session_manager: ManagedProcess,
    display_server: ManagedProcess,
    /// Set once the stop commands have been issued
    stopped: AtomicBool,
}

impl Supervisor {
    pub fn new(config: SupervisorConfig) -> Self {
        Self::with_processes(
            config,
            ManagedProcess::session_manager(),
            ManagedProcess::display_server(),
        )
    }

    fn with_processes(
        config: SupervisorConfig,
        session_manager: ManagedProcess,
        display_server: ManagedProcess,
    ) -> Self {
        Self {
            config,
            session_manager,
            display_server,
            stopped: AtomicBool::new(false),
        }
    }

    /// Remove PID files left behind by a previous instance.
    ///
    /// xrdp refuses to start while its PID file exists, so stale files from
    /// an unclean container stop have to go before anything is spawned. A
    /// missing file is success.
    pub fn clear_stale_state(&self) {
        for process in [&self.session_manager, &self.display_server] {
            match std::fs::remove_file(process.pid_file()) {
                Ok(()) => info!("Removed stale PID file {}", process.pid_file().display()),
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                Err(e) => debug!(
                    "Could not remove PID file {}: {}",
                    process.pid_file().display(),
                    e
                ),
            }
        }
    }

    /// Start the session manager, then the display server, without waiting
    /// on either.
    pub fn launch_session(&self) -> Result<(), SupervisorError> {
        self.session_manager.spawn()?;
        self.display_server.spawn()?;
        Ok(())
    }

    /// Poll the process table until the display server shows up or the
    /// attempt budget runs out.
    pub async fn wait_for_display(&self) -> ReadinessState {
        let display = &self.display_server;
        readiness::poll(
            display.name(),
            || display.is_running(),
            self.config.poll_attempts,
            self.config.poll_interval(),
        )
        .await
    }

    /// Issue graceful stops, display server first, then the session manager.
    ///
    /// Safe to call any number of times, concurrently included; only the
    /// first call issues the stop commands.
    pub async fn shutdown(&self) {
        if self.stopped.swap(true, Ordering::SeqCst) {
            debug!("Session stack already stopped");
            return;
        }

        info!("Stopping session stack");
        self.display_server.stop().await;
        self.session_manager.stop().await;
    }

    /// Run the full supervision lifecycle.
    ///
    /// Blocks on the solver when it is enabled, otherwise stays resident
    /// until a termination signal arrives. The stop commands run on every
    /// exit path once the session stack has been launched.
    pub async fn run(&self) -> Result<(), SupervisorError> {
        let mut signals = TerminationSignals::register()?;

        self.clear_stale_state();

        if let Err(e) = self.launch_session() {
            self.shutdown().await;
            return Err(e);
        }

        let interrupted = tokio::select! {
            _ = self.wait_for_display() => false,
            sig = signals.recv() => {
                info!("Received {} during startup", sig);
                true
            }
        };

        if !interrupted {
            if self.config.run_solver {
                tokio::select! {
                    result = worker::run(&self.config) => match result {
                        Ok(status) => info!("Solver exited with {}", status),
                        Err(e) => error!("Solver failed: {}", e),
                    },
                    sig = signals.recv() => {
                        info!("Received {}, stopping session host", sig);
                    }
                }
            } else {
                info!("Solver disabled, session host resident until a signal arrives");
                let sig = signals.recv().await;
                info!("Received {}, stopping session host", sig);
            }
        }

        self.shutdown().await;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    fn stop_recorder(name: &str, log: &Path, pid_file: &Path) -> ManagedProcess {
        ManagedProcess::new(
            name,
            vec!["true".to_string()],
            vec![
                "sh".to_string(),
                "-c".to_string(),
                format!("echo {} >> {}", name, log.display()),
            ],
            name,
            pid_file,
        )
    }

    fn stop_log(path: &Path) -> Vec<String> {
        match std::fs::read_to_string(path) {
            Ok(content) => content.lines().map(str::to_string).collect(),
            Err(_) => Vec::new(),
        }
    }

    #[tokio::test]
    async fn shutdown_stops_each_process_once_in_order() {
        let dir = tempfile::tempdir().unwrap();
        let log = dir.path().join("stops");
        let supervisor = Supervisor::with_processes(
            SupervisorConfig::default(),
            stop_recorder("sesman", &log, &dir.path().join("sesman.pid")),
            stop_recorder("xrdp", &log, &dir.path().join("xrdp.pid")),
        );

        supervisor.shutdown().await;
        supervisor.shutdown().await;

        assert_eq!(stop_log(&log), vec!["xrdp".to_string(), "sesman".to_string()]);
    }

    #[tokio::test]
    async fn concurrent_shutdown_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let log = dir.path().join("stops");
        let supervisor = Supervisor::with_processes(
            SupervisorConfig::default(),
            stop_recorder("sesman", &log, &dir.path().join("sesman.pid")),
            stop_recorder("xrdp", &log, &dir.path().join("xrdp.pid")),
        );

        tokio::join!(supervisor.shutdown(), supervisor.shutdown());

        assert_eq!(stop_log(&log).len(), 2);
    }

    #[tokio::test]
    async fn clear_stale_state_removes_present_files_and_ignores_missing() {
        let dir = tempfile::tempdir().unwrap();
        let log = dir.path().join("stops");
        let sesman_pid = dir.path().join("sesman.pid");
        let xrdp_pid = dir.path().join("xrdp.pid");

        // Only one of the two PID files survives from the previous run.
        std::fs::write(&xrdp_pid, "612\n").unwrap();

        let supervisor = Supervisor::with_processes(
            SupervisorConfig::default(),
            stop_recorder("sesman", &log, &sesman_pid),
            stop_recorder("xrdp", &log, &xrdp_pid),
        );

        supervisor.clear_stale_state();

        assert!(!sesman_pid.exists());
        assert!(!xrdp_pid.exists());

        // Nothing left behind on a second pass either.
        supervisor.clear_stale_state();
        assert!(!xrdp_pid.exists());
    }
}
