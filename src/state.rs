//! Network status model and published-state cell.
//!
//! [`NetworkState`] is a plain value recomputed wholesale on every poll; the
//! previous value is simply replaced. [`StatusCell`] is the single shared
//! slot the rest of the system observes, with a subscribe/notify mechanism
//! so that a front end can react to changes without polling the cell.

use serde::Serialize;
use std::fmt;
use std::sync::mpsc;
use std::sync::Mutex;
use tracing::debug;

/// Raw power state of the Wi-Fi adapter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WifiPower {
    /// The adapter reports its radio as powered on.
    On,
    /// The adapter reports its radio as powered off.
    Off,
    /// No adapter, failed query, or unrecognized output.
    Unknown,
}

/// Unified status derived from the daemon check and the adapter probes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum NetworkStatus {
    /// Wired link up and Wi-Fi radio off: the failover is in its wired state.
    EthernetActiveWifiOff,
    /// Wi-Fi on and no wired link: the failover is in its wireless state.
    WifiActiveNoEthernet,
    /// The privileged helper daemon is not loaded (or launchctl failed).
    DaemonMissing,
    /// Anything else, including both adapters up and both down. These two
    /// cases collapse on purpose: only the two clean states are actionable.
    Unknown,
}

impl fmt::Display for NetworkStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            NetworkStatus::EthernetActiveWifiOff => "ethernet (wifi off)",
            NetworkStatus::WifiActiveNoEthernet => "wifi (no ethernet)",
            NetworkStatus::DaemonMissing => "daemon missing",
            NetworkStatus::Unknown => "unknown",
        };
        f.write_str(label)
    }
}

/// One complete observation of the system, produced by each poll.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct NetworkState {
    /// Derived status, see [`classify`].
    pub status: NetworkStatus,
    /// Whether the helper daemon answered the launchctl check.
    pub daemon_running: bool,
}

impl Default for NetworkState {
    fn default() -> Self {
        Self {
            status: NetworkStatus::Unknown,
            daemon_running: false,
        }
    }
}

/// Derive a [`NetworkStatus`] from the three probe results.
///
/// Total over all inputs. `daemon_running = false` short-circuits to
/// [`NetworkStatus::DaemonMissing`] whatever the other two say.
pub fn classify(daemon_running: bool, wifi: WifiPower, ethernet_active: bool) -> NetworkStatus {
    if !daemon_running {
        return NetworkStatus::DaemonMissing;
    }
    if ethernet_active && wifi == WifiPower::Off {
        NetworkStatus::EthernetActiveWifiOff
    } else if !ethernet_active && wifi == WifiPower::On {
        NetworkStatus::WifiActiveNoEthernet
    } else {
        NetworkStatus::Unknown
    }
}

/// Owned slot holding the latest published [`NetworkState`].
///
/// Publications are serialized by a mutex, so when detections overlap the
/// slot ends up with the value of whichever publish completed last.
/// Subscribers receive every published value through an [`mpsc`] channel.
pub struct StatusCell {
    current: Mutex<NetworkState>,
    subscribers: Mutex<Vec<mpsc::Sender<NetworkState>>>,
}

impl Default for StatusCell {
    fn default() -> Self {
        Self::new()
    }
}

impl StatusCell {
    /// Create a cell starting in the default `Unknown` state.
    pub fn new() -> Self {
        Self {
            current: Mutex::new(NetworkState::default()),
            subscribers: Mutex::new(Vec::new()),
        }
    }

    /// Latest published state.
    pub fn current(&self) -> NetworkState {
        *self.current.lock().expect("status cell poisoned")
    }

    /// Replace the current state and notify subscribers.
    ///
    /// Returns `true` when the value differs from the previous one.
    pub fn publish(&self, state: NetworkState) -> bool {
        let changed = {
            let mut slot = self.current.lock().expect("status cell poisoned");
            let changed = *slot != state;
            *slot = state;
            changed
        };
        debug!("Published state {:?} (changed: {})", state, changed);
        // Drop subscribers whose receiving end is gone.
        self.subscribers
            .lock()
            .expect("subscriber list poisoned")
            .retain(|tx| tx.send(state).is_ok());
        changed
    }

    /// Register an observer. Every subsequent publish is delivered on the
    /// returned channel.
    pub fn subscribe(&self) -> mpsc::Receiver<NetworkState> {
        let (tx, rx) = mpsc::channel();
        self.subscribers
            .lock()
            .expect("subscriber list poisoned")
            .push(tx);
        rx
    }
}


#[cfg(test)]
mod status_cell_should {
    use super::*;
    use test_log::test;

    fn state(status: NetworkStatus, daemon_running: bool) -> NetworkState {
        NetworkState {
            status,
            daemon_running,
        }
    }

    #[test]
    fn start_unknown_and_replace_wholesale() {
        let cell = StatusCell::new();
        assert_eq!(cell.current(), NetworkState::default());
        assert!(cell.publish(state(NetworkStatus::WifiActiveNoEthernet, true)));
        assert_eq!(
            cell.current(),
            state(NetworkStatus::WifiActiveNoEthernet, true)
        );
    }

    #[test]
    fn report_unchanged_republication() {
        let cell = StatusCell::new();
        let s = state(NetworkStatus::DaemonMissing, false);
        assert!(cell.publish(s));
        assert!(!cell.publish(s));
    }

    #[test]
    fn deliver_every_publish_to_subscribers() {
        let cell = StatusCell::new();
        let rx = cell.subscribe();
        let first = state(NetworkStatus::EthernetActiveWifiOff, true);
        let second = state(NetworkStatus::Unknown, true);
        cell.publish(first);
        cell.publish(second);
        assert_eq!(rx.try_recv(), Ok(first));
        assert_eq!(rx.try_recv(), Ok(second));
        assert_eq!(cell.current(), second);
    }

    #[test]
    fn survive_a_dropped_subscriber() {
        let cell = StatusCell::new();
        drop(cell.subscribe());
        let rx = cell.subscribe();
        let s = state(NetworkStatus::WifiActiveNoEthernet, true);
        cell.publish(s);
        assert_eq!(rx.try_recv(), Ok(s));
    }
}
