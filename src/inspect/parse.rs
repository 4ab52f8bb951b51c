use crate::state::WifiPower;

/// Port names containing any of these tokens (case-insensitive) belong to
/// virtual adapters and are never counted as wired Ethernet.
const VIRTUAL_PORT_TOKENS: &[&str] = &[
    "bridge",
    "vpn",
    "virtual",
    "vmware",
    "parallels",
    "vnic",
    "vlan",
    "bluetooth pan",
    "thunderbolt bridge",
];

/// A hardware port as listed by `networksetup -listallhardwareports`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HardwarePort {
    /// Port name, e.g. "Wi-Fi" or "USB 10/100/1000 LAN".
    pub name: String,
    /// BSD device identifier, e.g. "en0".
    pub device: String,
}

/// Parse the line-oriented output of `networksetup -listallhardwareports`.
///
/// The grammar is a two-line pattern: a `Hardware Port: <name>` line sets the
/// current port name and the next `Device: <id>` line emits a
/// [`HardwarePort`] for it. Anything else (Ethernet Address lines, blanks,
/// noise) is ignored. Ports are returned in document order, which is the
/// scan order used everywhere else for "first match wins".
pub(crate) fn parse_hardware_ports(listing: &str) -> Vec<HardwarePort> {
    let mut ports = Vec::new();
    let mut current_name = String::new();
    for line in listing.lines() {
        if let Some(name) = line.strip_prefix("Hardware Port: ") {
            current_name = name.trim().to_owned();
        } else if let Some(device) = line.strip_prefix("Device: ") {
            ports.push(HardwarePort {
                name: current_name.clone(),
                device: device.trim().to_owned(),
            });
        }
    }
    ports
}

/// `true` for the Wi-Fi port. Older systems label it "AirPort".
pub(crate) fn is_wifi_port(name: &str) -> bool {
    name == "Wi-Fi" || name == "AirPort"
}

/// `true` when the port name matches the virtual-adapter denylist.
pub(crate) fn is_virtual_port(name: &str) -> bool {
    let lower = name.to_lowercase();
    VIRTUAL_PORT_TOKENS.iter().any(|token| lower.contains(token))
}

/// Interpret the output of `networksetup -getairportpower`.
///
/// The command prints something like `Wi-Fi Power (en0): On`; anything that
/// contains neither token reads as [`WifiPower::Unknown`].
pub(crate) fn parse_wifi_power(output: &str) -> WifiPower {
    if output.contains("On") {
        WifiPower::On
    } else if output.contains("Off") {
        WifiPower::Off
    } else {
        WifiPower::Unknown
    }
}

/// `true` when an `ifconfig <dev>` transcript reports an established link.
pub(crate) fn has_active_link(ifconfig_output: &str) -> bool {
    ifconfig_output.contains("status: active")
}
