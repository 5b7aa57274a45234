//! Graceful shutdown controller with in-flight launch tracking.
//!
//! Health state lives in an `ArcSwap` so probes read it without locking.
//! Each `POST /launch` holds an RAII guard on an atomic counter until its
//! dispatch settles, which lets shutdown wait for accepted requests to be
//! published before the store is closed.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use arc_swap::ArcSwap;
use tokio::sync::watch;

/// Server health state, transitioned by the shutdown controller.
///
/// State machine: Starting -> Ready -> Draining -> Stopped
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HealthState {
    /// Store and publisher are being built; launches are not accepted yet.
    Starting,
    /// Accepting launches.
    Ready,
    /// Waiting for in-flight launches; new ones are refused with 503.
    Draining,
    /// Every in-flight launch has settled.
    Stopped,
}

impl HealthState {
    /// Lowercase name used in health responses.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Starting => "starting",
            Self::Ready => "ready",
            Self::Draining => "draining",
            Self::Stopped => "stopped",
        }
    }

    /// Whether `POST /launch` should be served in this state.
    #[must_use]
    pub fn accepts_launches(self) -> bool {
        matches!(self, Self::Ready)
    }
}

/// Controls graceful shutdown with health state management and in-flight tracking.
///
/// The controller coordinates shutdown across the server:
/// 1. Health probes check `health_state()` to report readiness
/// 2. The launch handler refuses new launches unless the state is `Ready`
/// 3. `trigger_shutdown()` moves to Draining and signals the axum server
/// 4. `wait_for_drain()` blocks until in-flight launches settle
#[derive(Debug)]
pub struct ShutdownController {
    shutdown_signal: watch::Sender<bool>,
    in_flight: Arc<AtomicU64>,
    health_state: Arc<ArcSwap<HealthState>>,
}

impl ShutdownController {
    /// Creates a new shutdown controller in the `Starting` state.
    #[must_use]
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(false);
        Self {
            shutdown_signal: tx,
            in_flight: Arc::new(AtomicU64::new(0)),
            health_state: Arc::new(ArcSwap::from_pointee(HealthState::Starting)),
        }
    }

    /// Transitions to the `Ready` state, indicating the server can accept launches.
    pub fn set_ready(&self) {
        self.health_state.store(Arc::new(HealthState::Ready));
    }

    /// Returns a receiver that will be notified when shutdown is triggered.
    ///
    /// `NetworkModule::serve` waits on this to begin graceful teardown.
    #[must_use]
    pub fn shutdown_receiver(&self) -> watch::Receiver<bool> {
        self.shutdown_signal.subscribe()
    }

    /// Initiates graceful shutdown.
    ///
    /// Transitions to `Draining` state and signals all shutdown receivers.
    pub fn trigger_shutdown(&self) {
        self.health_state.store(Arc::new(HealthState::Draining));
        // Ignore send errors -- receivers may have been dropped
        let _ = self.shutdown_signal.send(true);
    }

    /// Returns the current health state.
    #[must_use]
    pub fn health_state(&self) -> HealthState {
        **self.health_state.load()
    }

    /// Creates an RAII guard that tracks an in-flight launch.
    ///
    /// The counter is incremented on creation and decremented when the guard
    /// is dropped, even if the dispatch task panics.
    #[must_use]
    pub fn in_flight_guard(&self) -> InFlightGuard {
        self.in_flight.fetch_add(1, Ordering::Relaxed);
        InFlightGuard {
            in_flight: Arc::clone(&self.in_flight),
        }
    }

    /// Returns the current number of in-flight launches.
    #[must_use]
    pub fn in_flight_count(&self) -> u64 {
        self.in_flight.load(Ordering::Relaxed)
    }

    /// Waits for all in-flight launches to settle, up to the given timeout.
    ///
    /// Returns `true` and moves to `Stopped` once the counter reaches zero.
    /// Returns `false` on timeout, leaving the state at `Draining`.
    pub async fn wait_for_drain(&self, timeout: Duration) -> bool {
        let deadline = tokio::time::Instant::now() + timeout;

        loop {
            if self.in_flight.load(Ordering::Relaxed) == 0 {
                self.health_state.store(Arc::new(HealthState::Stopped));
                return true;
            }

            if tokio::time::Instant::now() >= deadline {
                return false;
            }

            // Poll at 10ms intervals to avoid busy-waiting
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    }
}

impl Default for ShutdownController {
    fn default() -> Self {
        Self::new()
    }
}

/// RAII guard that decrements the in-flight counter when dropped.
///
/// Moved into the dispatch future so a launch counts as in flight until its
/// publish attempt finishes, even if the client has gone away.
#[derive(Debug)]
pub struct InFlightGuard {
    in_flight: Arc<AtomicU64>,
}

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        self.in_flight.fetch_sub(1, Ordering::Relaxed);
    }
}
