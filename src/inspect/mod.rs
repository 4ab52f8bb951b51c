//! Live inspection of the machine's network adapters.
//!
//! [`Inspector`] answers "what is the current state of the Wi-Fi and
//! Ethernet adapters?" by shelling out to `networksetup` and `ifconfig`
//! through a [`CommandRunner`]. Everything here is best-effort: a tool
//! that fails or prints something unexpected degrades to "no devices" or
//! [`WifiPower::Unknown`], never to an error.

mod parse;

pub use parse::HardwarePort;

use crate::command::CommandRunner;
use crate::state::WifiPower;
use std::fmt;
use std::sync::Arc;
use tracing::debug;

const NETWORKSETUP: &str = "/usr/sbin/networksetup";
const IFCONFIG: &str = "/sbin/ifconfig";

/// Queries the OS network-configuration tools for adapter state.
pub struct Inspector {
    runner: Arc<dyn CommandRunner>,
}

impl fmt::Debug for Inspector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Inspector").finish()
    }
}

impl Inspector {
    /// Create an inspector running commands through `runner`.
    pub fn new(runner: Arc<dyn CommandRunner>) -> Self {
        Self { runner }
    }

    /// List every hardware port known to the system, in document order of
    /// the `networksetup -listallhardwareports` output. A failing command
    /// yields an empty list.
    pub fn list_hardware_ports(&self) -> Vec<HardwarePort> {
        let res = self
            .runner
            .run(NETWORKSETUP, vec!["-listallhardwareports".into()]);
        if !res.success() {
            debug!("listallhardwareports failed with code {}", res.exit_code);
            return Vec::new();
        }
        parse::parse_hardware_ports(&res.combined_output)
    }

    /// Device identifier of the Wi-Fi adapter, if any. First match in scan
    /// order wins when the listing somehow contains several.
    pub fn find_wifi_device(&self) -> Option<String> {
        self.list_hardware_ports()
            .into_iter()
            .find(|p| parse::is_wifi_port(&p.name))
            .map(|p| p.device)
    }

    /// Device identifiers of the wired, non-virtual Ethernet adapters.
    pub fn list_ethernet_devices(&self) -> Vec<String> {
        self.list_hardware_ports()
            .into_iter()
            .filter(|p| !parse::is_wifi_port(&p.name) && !parse::is_virtual_port(&p.name))
            .map(|p| p.device)
            .collect()
    }

    /// Current power state of the Wi-Fi adapter.
    ///
    /// [`WifiPower::Unknown`] when there is no Wi-Fi device, the query
    /// fails, or its output matches neither token.
    pub fn read_wifi_power(&self) -> WifiPower {
        let device = match self.find_wifi_device() {
            Some(device) => device,
            None => {
                debug!("No Wi-Fi device found among hardware ports");
                return WifiPower::Unknown;
            }
        };
        let res = self
            .runner
            .run(NETWORKSETUP, vec!["-getairportpower".into(), device]);
        if !res.success() {
            return WifiPower::Unknown;
        }
        parse::parse_wifi_power(&res.combined_output)
    }

    /// `true` when any non-virtual Ethernet device reports an active link.
    /// Stops at the first active one.
    pub fn is_ethernet_active(&self) -> bool {
        for device in self.list_ethernet_devices() {
            let res = self.runner.run(IFCONFIG, vec![device.clone()]);
            if parse::has_active_link(&res.combined_output) {
                debug!("Ethernet device {} is active", device);
                return true;
            }
        }
        false
    }
}

#[cfg(test)]
mod inspector_should {
    use super::*;
    use crate::command::{CommandResult, MockCommandRunner};
    use mockall::predicate::eq;
    use test_log::test; // Automatically trace tests

    fn ok(output: &str) -> CommandResult {
        CommandResult {
            combined_output: output.to_string(),
            exit_code: 0,
        }
    }

    fn inspector(mock: MockCommandRunner) -> Inspector {
        Inspector::new(Arc::new(mock))
    }

    #[test]
    fn resolve_wifi_and_ethernet_devices_from_listing() {
        let mut mock = MockCommandRunner::new();
        mock.expect_run()
            .with(eq(NETWORKSETUP), eq(vec!["-listallhardwareports".to_string()]))
            .returning(|_, _| {
                ok("Hardware Port: Wi-Fi\nDevice: en0\nHardware Port: USB Ethernet\nDevice: en5\n")
            });
        let inspector = inspector(mock);
        assert_eq!(inspector.find_wifi_device(), Some("en0".to_string()));
        assert_eq!(inspector.list_ethernet_devices(), ["en5"]);
    }

    #[test]
    fn treat_failing_listing_as_no_ports() {
        let mut mock = MockCommandRunner::new();
        mock.expect_run()
            .returning(|_, _| CommandResult::spawn_failure());
        let inspector = inspector(mock);
        assert!(inspector.list_hardware_ports().is_empty());
        assert_eq!(inspector.find_wifi_device(), None);
    }

    #[test]
    fn not_query_airport_power_without_a_wifi_device() {
        let mut mock = MockCommandRunner::new();
        // Only the port listing may run; -getairportpower must not.
        mock.expect_run()
            .with(eq(NETWORKSETUP), eq(vec!["-listallhardwareports".to_string()]))
            .returning(|_, _| ok("Hardware Port: USB Ethernet\nDevice: en5\n"));
        let inspector = inspector(mock);
        assert_eq!(inspector.read_wifi_power(), WifiPower::Unknown);
    }

    #[test]
    fn read_wifi_power_from_the_resolved_device() {
        let mut mock = MockCommandRunner::new();
        mock.expect_run()
            .with(eq(NETWORKSETUP), eq(vec!["-listallhardwareports".to_string()]))
            .returning(|_, _| ok("Hardware Port: Wi-Fi\nDevice: en0\n"));
        mock.expect_run()
            .with(
                eq(NETWORKSETUP),
                eq(vec!["-getairportpower".to_string(), "en0".to_string()]),
            )
            .returning(|_, _| ok("Wi-Fi Power (en0): Off\n"));
        let inspector = inspector(mock);
        assert_eq!(inspector.read_wifi_power(), WifiPower::Off);
    }

    #[test]
    fn short_circuit_on_first_active_ethernet() {
        let mut mock = MockCommandRunner::new();
        mock.expect_run()
            .with(eq(NETWORKSETUP), eq(vec!["-listallhardwareports".to_string()]))
            .returning(|_, _| {
                ok("Hardware Port: USB Ethernet\nDevice: en5\nHardware Port: Ethernet\nDevice: en6\n")
            });
        mock.expect_run()
            .with(eq(IFCONFIG), eq(vec!["en5".to_string()]))
            .times(1)
            .returning(|_, _| ok("en5: flags=8863\n\tstatus: active\n"));
        // en6 is never probed.
        let inspector = inspector(mock);
        assert!(inspector.is_ethernet_active());
    }

    #[test]
    fn report_no_ethernet_when_all_links_are_down() {
        let mut mock = MockCommandRunner::new();
        mock.expect_run()
            .with(eq(NETWORKSETUP), eq(vec!["-listallhardwareports".to_string()]))
            .returning(|_, _| ok("Hardware Port: USB Ethernet\nDevice: en5\n"));
        mock.expect_run()
            .with(eq(IFCONFIG), eq(vec!["en5".to_string()]))
            .returning(|_, _| ok("en5: flags=8863\n\tstatus: inactive\n"));
        let inspector = inspector(mock);
        assert!(!inspector.is_ethernet_active());
    }
}
