//! Display readiness polling
//!
//! Bounded probe of the process table: the display server either shows up
//! within the attempt budget or the session host moves on. The caller treats
//! a timeout as a diagnostic, not an error.

use std::future::Future;
use std::time::Duration;

use tracing::{debug, info, warn};

/// Outcome of the display readiness probe.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadinessState {
    /// Polling has not finished yet
    Pending,
    /// The process appeared in the process table
    Ready,
    /// The attempt budget ran out
    TimedOut,
}

/// Poll `probe` up to `attempts` times, `interval` apart.
///
/// Returns `Ready` at the first successful probe, without issuing further
/// polls, or `TimedOut` once the budget is exhausted.
pub async fn poll<F, Fut>(name: &str, mut probe: F, attempts: u32, interval: Duration) -> ReadinessState
where
    F: FnMut() -> Fut,
    Fut: Future<Output = bool>,
{
    let mut state = ReadinessState::Pending;

    for attempt in 1..=attempts {
        if probe().await {
            info!("{} is up (attempt {}/{})", name, attempt, attempts);
            state = ReadinessState::Ready;
            break;
        }

        debug!("{} not in process table yet (attempt {}/{})", name, attempt, attempts);

        if attempt < attempts {
            tokio::time::sleep(interval).await;
        }
    }

    if state == ReadinessState::Pending {
        warn!(
            "{} did not appear within {} attempts, continuing without readiness confirmation",
            name, attempts
        );
        state = ReadinessState::TimedOut;
    }

    state
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;

    fn counting_probe(
        calls: &Arc<AtomicU32>,
        ready_at: u32,
    ) -> impl FnMut() -> std::future::Ready<bool> + '_ {
        move || {
            let attempt = calls.fetch_add(1, Ordering::SeqCst) + 1;
            std::future::ready(ready_at != 0 && attempt >= ready_at)
        }
    }

    #[tokio::test]
    async fn ready_on_first_attempt() {
        let calls = Arc::new(AtomicU32::new(0));
        let state = poll("xrdp", counting_probe(&calls, 1), 20, Duration::from_millis(1)).await;
        assert_eq!(state, ReadinessState::Ready);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn stops_polling_once_ready() {
        let calls = Arc::new(AtomicU32::new(0));
        let state = poll("xrdp", counting_probe(&calls, 7), 20, Duration::from_millis(1)).await;
        assert_eq!(state, ReadinessState::Ready);
        assert_eq!(calls.load(Ordering::SeqCst), 7);
    }

    #[tokio::test]
    async fn times_out_after_exact_attempt_budget() {
        let calls = Arc::new(AtomicU32::new(0));
        let state = poll("xrdp", counting_probe(&calls, 0), 20, Duration::from_millis(1)).await;
        assert_eq!(state, ReadinessState::TimedOut);
        assert_eq!(calls.load(Ordering::SeqCst), 20);
    }

    #[tokio::test]
    async fn ready_on_last_attempt() {
        let calls = Arc::new(AtomicU32::new(0));
        let state = poll("xrdp", counting_probe(&calls, 20), 20, Duration::from_millis(1)).await;
        assert_eq!(state, ReadinessState::Ready);
        assert_eq!(calls.load(Ordering::SeqCst), 20);
    }
}
