// Net Connection - Connection Types
// Copyright (C) 2026 Christos A. Daggas
// SPDX-License-Identifier: MIT

//! Connection-level enums: the active connection type, per-technology
//! states, address families and iterator kinds.

use serde::{Deserialize, Serialize};

/// Type of the currently active (default) connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ConnectionType {
    /// No service is connected.
    #[default]
    Disconnected,
    /// Wireless (Wi-Fi) connection.
    Wifi,
    /// Cellular data connection.
    Cellular,
    /// Wired Ethernet connection.
    Ethernet,
    /// Bluetooth tethering.
    Bluetooth,
}

impl ConnectionType {
    /// Map a daemon service type (`"wifi"`, `"cellular"`, ...) to a connection type.
    pub fn from_native(service_type: &str) -> Self {
        match service_type {
            "wifi" => Self::Wifi,
            "cellular" => Self::Cellular,
            "ethernet" => Self::Ethernet,
            "bluetooth" => Self::Bluetooth,
            _ => Self::Disconnected,
        }
    }

    /// Get human-readable name for this connection type.
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::Disconnected => "Disconnected",
            Self::Wifi => "Wi-Fi",
            Self::Cellular => "Cellular",
            Self::Ethernet => "Ethernet",
            Self::Bluetooth => "Bluetooth",
        }
    }
}

/// Daemon technology a state query targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TechnologyKind {
    Wifi,
    Cellular,
    Ethernet,
    Bluetooth,
}

impl TechnologyKind {
    /// The daemon's name for this technology.
    pub fn as_native(&self) -> &'static str {
        match self {
            Self::Wifi => "wifi",
            Self::Cellular => "cellular",
            Self::Ethernet => "ethernet",
            Self::Bluetooth => "bluetooth",
        }
    }
}

/// Technology flags as reported by the daemon.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TechnologyState {
    pub powered: bool,
    pub connected: bool,
    pub tethering: bool,
}

/// Cellular network state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CellularState {
    OutOfService,
    FlightMode,
    RoamingOff,
    CallOnlyAvailable,
    Available,
    Connected,
}

/// Wi-Fi state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WifiState {
    Deactivated,
    Disconnected,
    Connected,
}

/// Ethernet state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EthernetState {
    Deactivated,
    Disconnected,
    Connected,
}

/// Bluetooth tethering state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BtState {
    Deactivated,
    Disconnected,
    Connected,
}

/// IP address family.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AddressFamily {
    Ipv4,
    Ipv6,
}

/// Which profile list an iterator walks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IteratorKind {
    /// Every profile the daemon knows about.
    Registered,
    /// Only profiles in a ready or online state.
    Connected,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_connection_type_from_native() {
        assert_eq!(ConnectionType::from_native("wifi"), ConnectionType::Wifi);
        assert_eq!(ConnectionType::from_native("cellular"), ConnectionType::Cellular);
        assert_eq!(ConnectionType::from_native("vpn"), ConnectionType::Disconnected);
    }

    #[test]
    fn test_technology_native_names() {
        assert_eq!(TechnologyKind::Bluetooth.as_native(), "bluetooth");
        assert_eq!(TechnologyKind::Wifi.as_native(), "wifi");
    }
}
