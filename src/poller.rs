//! Detection of the unified network state.
//!
//! [`StatePoller::detect_state`] is one complete, self-contained probe: it
//! holds no mutable state, so concurrent or back-to-back detections cannot
//! interfere with each other. The periodic loop driving it lives in the
//! crate root (see [`crate::watch_network_loop`]).

use crate::daemon::DaemonController;
use crate::inspect::Inspector;
use crate::state::{classify, NetworkState, NetworkStatus};
use tracing::debug;

/// Computes a fresh [`NetworkState`] from the daemon check and the adapter
/// probes.
#[derive(Debug)]
pub struct StatePoller {
    inspector: Inspector,
    daemon: DaemonController,
}

impl StatePoller {
    /// Create a poller over the given probes.
    pub fn new(inspector: Inspector, daemon: DaemonController) -> Self {
        Self { inspector, daemon }
    }

    /// Probe the system once.
    ///
    /// The daemon check comes first and short-circuits: without the helper
    /// there is nothing to toggle, so the adapters are not even probed.
    pub fn detect_state(&self) -> NetworkState {
        if !self.daemon.is_daemon_running() {
            debug!("Helper daemon is not loaded");
            return NetworkState {
                status: NetworkStatus::DaemonMissing,
                daemon_running: false,
            };
        }
        let wifi = self.inspector.read_wifi_power();
        let ethernet_active = self.inspector.is_ethernet_active();
        debug!("Probes: wifi {:?}, ethernet active {}", wifi, ethernet_active);
        NetworkState {
            status: classify(true, wifi, ethernet_active),
            daemon_running: true,
        }
    }
}
