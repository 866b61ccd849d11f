//! API solver launch
//!
//! Runs the Turnstile API solver as a foreground child wrapped in xvfb-run,
//! so the browser it drives has a display surface even when no RDP client
//! ever connects.

use std::process::ExitStatus;

use tokio::process::Command;
use tracing::info;

use crate::supervisor::SupervisorError;
use crate::SupervisorConfig;

/// Browser automation backends the solver understands.
pub const BACKENDS: &[&str] = &["chromium", "chrome", "msedge", "camoufox"];

/// Build the xvfb-run argument list for the solver.
///
/// `--debug` takes a Python-style boolean and is only emitted when debugging
/// is on; the solver defaults it to False otherwise.
pub fn solver_argv(config: &SupervisorConfig) -> Vec<String> {
    let mut argv = vec![
        "-a".to_string(),
        "python3".to_string(),
        "api_solver.py".to_string(),
        "--browser_type".to_string(),
        config.browser_backend.clone(),
        "--host".to_string(),
        config.host.clone(),
        "--port".to_string(),
        config.port.to_string(),
    ];

    if config.debug {
        argv.push("--debug".to_string());
        argv.push("True".to_string());
    }

    argv
}

/// Run the solver in the foreground and wait for it to exit.
///
/// The child is killed when this future is dropped, a termination signal
/// arriving while the solver runs must not leave it behind.
pub async fn run(config: &SupervisorConfig) -> Result<ExitStatus, SupervisorError> {
    let argv = solver_argv(config);
    info!("Launching solver: xvfb-run {}", argv.join(" "));

    let mut child = Command::new("xvfb-run")
        .args(&argv)
        .kill_on_drop(true)
        .spawn()
        .map_err(|e| SupervisorError::LaunchFailed(format!("solver: {}", e)))?;

    let status = child.wait().await?;
    Ok(status)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn argv_passes_backend_host_and_port_through() {
        let config = SupervisorConfig {
            browser_backend: "chromium".to_string(),
            port: 8191,
            ..SupervisorConfig::default()
        };

        assert_eq!(
            solver_argv(&config),
            vec![
                "-a",
                "python3",
                "api_solver.py",
                "--browser_type",
                "chromium",
                "--host",
                "0.0.0.0",
                "--port",
                "8191",
            ]
        );
    }

    #[test]
    fn argv_appends_debug_flag_only_when_enabled() {
        let config = SupervisorConfig {
            debug: true,
            ..SupervisorConfig::default()
        };

        let argv = solver_argv(&config);
        assert_eq!(&argv[argv.len() - 2..], ["--debug", "True"]);

        let config = SupervisorConfig::default();
        assert!(!solver_argv(&config).contains(&"--debug".to_string()));
    }

    #[test]
    fn default_backend_is_known() {
        let config = SupervisorConfig::default();
        assert!(BACKENDS.contains(&config.browser_backend.as_str()));
    }
}
