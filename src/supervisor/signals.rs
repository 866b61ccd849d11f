//! Termination signal watch
//!
//! Registered once at startup and polled from every supervision phase, so a
//! signal arriving mid-poll or while the solver runs is never lost. SIGKILL
//! is part of the container's stop sequence too but cannot be observed, the
//! kernel tears the process down directly.

use tokio::signal::unix::{signal, Signal, SignalKind};

/// Streams for the catchable termination signals.
pub struct TerminationSignals {
    terminate: Signal,
    interrupt: Signal,
    hangup: Signal,
}

impl TerminationSignals {
    /// Register handlers for SIGTERM, SIGINT and SIGHUP.
    pub fn register() -> std::io::Result<Self> {
        Ok(Self {
            terminate: signal(SignalKind::terminate())?,
            interrupt: signal(SignalKind::interrupt())?,
            hangup: signal(SignalKind::hangup())?,
        })
    }

    /// Wait for the next termination signal and return its name.
    pub async fn recv(&mut self) -> &'static str {
        tokio::select! {
            _ = self.terminate.recv() => "SIGTERM",
            _ = self.interrupt.recv() => "SIGINT",
            _ = self.hangup.recv() => "SIGHUP",
        }
    }
}
