//! Solver Host
//!
//! Supervises the remote-desktop session stack (xrdp display server and
//! session manager) inside the solver container and conditionally runs the
//! Turnstile API solver in a virtual framebuffer.

pub mod process;
pub mod supervisor;
pub mod upstream;
pub mod worker;

use std::path::PathBuf;
use std::time::Duration;

use tracing::{info, warn};

/// Supervisor configuration
///
/// Resolved once at startup (defaults, then config file, then environment)
/// and immutable afterwards.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SupervisorConfig {
    /// Run the API solver once the session stack is up
    #[serde(default)]
    pub run_solver: bool,

    /// Pass --debug through to the solver
    #[serde(default)]
    pub debug: bool,

    /// Bind host handed to the solver
    #[serde(default = "default_host")]
    pub host: String,

    /// Bind port handed to the solver
    #[serde(default = "default_port")]
    pub port: u16,

    /// Browser automation backend the solver should use
    #[serde(default = "default_backend")]
    pub browser_backend: String,

    /// Solver checkout directory
    #[serde(default = "default_workdir")]
    pub workdir: PathBuf,

    /// Display readiness poll attempts
    #[serde(default = "default_poll_attempts")]
    pub poll_attempts: u32,

    /// Seconds between readiness polls
    #[serde(default = "default_poll_interval_secs")]
    pub poll_interval_secs: u64,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    5000
}

fn default_backend() -> String {
    "camoufox".to_string()
}

fn default_workdir() -> PathBuf {
    PathBuf::from("/app")
}

fn default_poll_attempts() -> u32 {
    20
}

fn default_poll_interval_secs() -> u64 {
    1
}

impl Default for SupervisorConfig {
    fn default() -> Self {
        Self {
            run_solver: false,
            debug: false,
            host: default_host(),
            port: default_port(),
            browser_backend: default_backend(),
            workdir: default_workdir(),
            poll_attempts: default_poll_attempts(),
            poll_interval_secs: default_poll_interval_secs(),
        }
    }
}

/// Get log directory path (shared across modules)
pub fn log_dir() -> Option<PathBuf> {
    dirs::config_dir().map(|p| p.join("solver-host").join("logs"))
}

impl SupervisorConfig {
    /// Get config file path
    fn config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("solver-host").join("config.json"))
    }

    /// Load config from file
    pub fn load() -> Self {
        if let Some(path) = Self::config_path() {
            if path.exists() {
                match std::fs::read_to_string(&path) {
                    Ok(content) => match serde_json::from_str(&content) {
                        Ok(config) => {
                            info!("Loaded config from {:?}", path);
                            return config;
                        }
                        Err(e) => {
                            warn!("Failed to parse config file: {}", e);
                        }
                    },
                    Err(e) => {
                        warn!("Failed to read config file: {}", e);
                    }
                }
            }
        }
        Self::default()
    }

    /// Resolve the effective configuration: defaults, then the config file,
    /// then environment variables.
    pub fn resolve() -> Self {
        let mut config = Self::load();
        config.apply_env(|name| std::env::var(name).ok());

        if !worker::BACKENDS.contains(&config.browser_backend.as_str()) {
            warn!(
                "Unknown browser backend '{}', falling back to {}",
                config.browser_backend,
                default_backend()
            );
            config.browser_backend = default_backend();
        }

        config
    }

    /// Apply environment overrides.
    ///
    /// The solver phase is gated on `RUN_API_SOLVER` being the literal
    /// string "true"; any other value, or no value, disables it no matter
    /// what the config file says.
    fn apply_env<F>(&mut self, var: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        self.run_solver = var("RUN_API_SOLVER").map(|v| v == "true").unwrap_or(false);

        if let Some(v) = var("DEBUG") {
            self.debug = v == "true";
        }

        if let Some(v) = var("SOLVER_PORT") {
            match v.parse() {
                Ok(port) => self.port = port,
                Err(_) => warn!("Ignoring invalid SOLVER_PORT value: {}", v),
            }
        }

        if let Some(v) = var("SOLVER_BROWSER") {
            self.browser_backend = v;
        }

        if let Some(v) = var("SOLVER_DIR") {
            self.workdir = PathBuf::from(v);
        }
    }

    /// Delay between readiness polls
    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs)
    }
}

/// Initialize logging
pub fn init_logging() -> Option<tracing_appender::non_blocking::WorkerGuard> {
    use tracing_subscriber::layer::SubscriberExt;
    use tracing_subscriber::util::SubscriberInitExt;

    let env_filter = tracing_subscriber::EnvFilter::from_default_env()
        .add_directive(tracing::Level::INFO.into());

    let console_layer = tracing_subscriber::fmt::layer()
        .with_target(true)
        .with_thread_ids(false);

    if let Some(log_dir) = log_dir() {
        let _ = std::fs::create_dir_all(&log_dir);
        let file_appender = tracing_appender::rolling::daily(&log_dir, "solver-host.log");
        let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

        let file_layer = tracing_subscriber::fmt::layer()
            .with_ansi(false)
            .with_target(true)
            .with_thread_ids(true)
            .with_writer(non_blocking);

        tracing_subscriber::registry()
            .with(env_filter)
            .with(console_layer)
            .with(file_layer)
            .init();

        Some(guard)
    } else {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(console_layer)
            .init();

        None
    }
}
