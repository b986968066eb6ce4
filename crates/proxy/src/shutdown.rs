//! Graceful shutdown coordination.
//!
//! Tracks open connections, tells them to finish their in-flight requests,
//! and bounds how long the process waits for them.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::broadcast;
use tracing::{debug, info, trace, warn};

/// Graceful shutdown coordinator
pub struct ShutdownCoordinator {
    active_connections: Arc<AtomicUsize>,
    /// Maximum wait time for draining
    max_drain_time: Duration,
    notify: broadcast::Sender<()>,
}

/// Keeps a connection counted until dropped
pub struct ConnectionGuard {
    active_connections: Arc<AtomicUsize>,
}

impl Drop for ConnectionGuard {
    fn drop(&mut self) {
        let count = self.active_connections.fetch_sub(1, Ordering::SeqCst) - 1;
        trace!(active_connections = count, "Connection closed");
    }
}

impl ShutdownCoordinator {
    pub fn new(max_drain_time: Duration) -> Self {
        debug!(
            max_drain_time_secs = max_drain_time.as_secs(),
            "Creating shutdown coordinator"
        );
        let (notify, _) = broadcast::channel(1);
        Self {
            active_connections: Arc::new(AtomicUsize::new(0)),
            max_drain_time,
            notify,
        }
    }

    /// Count a new connection until the returned guard is dropped
    pub fn track_connection(&self) -> ConnectionGuard {
        let count = self.active_connections.fetch_add(1, Ordering::SeqCst) + 1;
        trace!(active_connections = count, "Connection opened");
        ConnectionGuard {
            active_connections: Arc::clone(&self.active_connections),
        }
    }

    /// Receiver notified once when shutdown is requested
    pub fn subscribe(&self) -> broadcast::Receiver<()> {
        self.notify.subscribe()
    }

    pub fn active_count(&self) -> usize {
        self.active_connections.load(Ordering::SeqCst)
    }

    /// Ask every tracked connection to finish and close
    pub fn request_shutdown(&self) {
        info!(
            active_connections = self.active_count(),
            "Shutdown requested"
        );
        // No receivers just means no open connections
        let _ = self.notify.send(());
    }

    /// Wait for connections to drain.
    ///
    /// Returns `true` if all connections closed within the drain time,
    /// `false` if the timeout was reached with connections still open.
    pub async fn wait_for_drain(&self) -> bool {
        let start = Instant::now();
        let initial_count = self.active_count();

        info!(
            active_connections = initial_count,
            max_drain_time_secs = self.max_drain_time.as_secs(),
            "Starting connection drain"
        );

        let mut last_logged_count = initial_count;

        while self.active_count() > 0 {
            if start.elapsed() > self.max_drain_time {
                warn!(
                    remaining_connections = self.active_count(),
                    elapsed_secs = start.elapsed().as_secs(),
                    "Drain timeout reached, connections still open"
                );
                return false;
            }

            let current_count = self.active_count();
            if current_count != last_logged_count {
                debug!(
                    remaining_connections = current_count,
                    elapsed_ms = start.elapsed().as_millis() as u64,
                    "Draining connections"
                );
                last_logged_count = current_count;
            }

            tokio::time::sleep(Duration::from_millis(100)).await;
        }

        info!(
            elapsed_ms = start.elapsed().as_millis() as u64,
            initial_connections = initial_count,
            "All connections drained"
        );
        true
    }
}
