//! Solver Host - session stack entry point
//!
//! Brings up the xrdp remote-desktop stack and, when enabled, the Turnstile
//! API solver inside a virtual framebuffer.
//!
//! Environment variables:
//! - `RUN_API_SOLVER` - run the solver after startup (literal "true")
//! - `DEBUG` - pass --debug through to the solver (literal "true")
//! - `SOLVER_PORT` - solver bind port (default: 5000)
//! - `SOLVER_BROWSER` - solver browser backend (default: "camoufox")
//! - `SOLVER_DIR` - solver checkout directory (default: "/app")

use anyhow::Context;
use tracing::{info, warn};

use host_lib::supervisor::Supervisor;
use host_lib::SupervisorConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _guard = host_lib::init_logging();

    info!("Starting solver session host");

    if let Some(dir) = host_lib::log_dir() {
        info!("Log files saved to: {}", dir.display());
    }

    let config = SupervisorConfig::resolve();
    info!(
        "Solver {} (backend: {}, bind: {}:{})",
        if config.run_solver { "enabled" } else { "disabled" },
        config.browser_backend,
        config.host,
        config.port
    );

    std::env::set_current_dir(&config.workdir)
        .with_context(|| format!("cannot enter solver directory {}", config.workdir.display()))?;

    if let Err(e) = host_lib::upstream::pull_latest(&config.workdir).await {
        warn!("Upstream sync failed, keeping the local solver copy: {}", e);
    }

    let supervisor = Supervisor::new(config);
    supervisor.run().await?;

    info!("Session host stopped");
    Ok(())
}
