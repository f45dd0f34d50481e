// Net Connection - Profile Data Model
// Copyright (C) 2026 Christos A. Daggas
// SPDX-License-Identifier: MIT

//! Profile data model.
//!
//! A Profile is a point-in-time copy of one daemon service:
//! - Identity (identifier, display name, type)
//! - Connection state
//! - IPv4/IPv6, DNS and proxy configuration
//! - Type-specific details (cellular APN data, Wi-Fi access point data)

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::connection::AddressFamily;
use super::error::Result;
use super::validation;

/// Device type a profile belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProfileType {
    Cellular,
    Wifi,
    Ethernet,
    Bluetooth,
}

impl ProfileType {
    /// Map a daemon service type to a profile type. Unknown types yield `None`.
    pub fn from_native(service_type: &str) -> Option<Self> {
        match service_type {
            "cellular" => Some(Self::Cellular),
            "wifi" => Some(Self::Wifi),
            "ethernet" => Some(Self::Ethernet),
            "bluetooth" => Some(Self::Bluetooth),
            _ => None,
        }
    }

    pub fn as_native(&self) -> &'static str {
        match self {
            Self::Cellular => "cellular",
            Self::Wifi => "wifi",
            Self::Ethernet => "ethernet",
            Self::Bluetooth => "bluetooth",
        }
    }
}

/// Profile connection state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ProfileState {
    #[default]
    Disconnected,
    Association,
    Configuration,
    Connected,
}

impl ProfileState {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Disconnected => "disconnected",
            Self::Association => "association",
            Self::Configuration => "configuration",
            Self::Connected => "connected",
        }
    }
}

/// How an address family is configured.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum IpConfigType {
    /// Not configured.
    #[default]
    None,
    /// Manual/static configuration.
    Static,
    /// Obtain address via DHCP.
    Dynamic,
    /// Stateless autoconfiguration.
    Auto,
    /// Address fixed by the network (cellular).
    Fixed,
}

/// Per-family IP configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct IpConfig {
    /// Configuration method.
    pub config_type: IpConfigType,
    /// IP address.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    /// Netmask (IPv4) or prefix length (IPv6).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub netmask: Option<String>,
    /// Default gateway.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gateway: Option<String>,
    /// DNS servers.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub dns: Vec<String>,
}

/// Proxy configuration type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ProxyType {
    /// No proxy.
    #[default]
    Direct,
    /// Automatic (PAC URL).
    Auto,
    /// Manual proxy configuration.
    Manual,
}

/// Proxy configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct ProxySettings {
    /// Proxy mode.
    pub proxy_type: ProxyType,
    /// `host:port` for manual proxies, PAC URL for automatic ones.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
}

/// Cellular service type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum CellularServiceType {
    #[default]
    Unknown,
    Internet,
    Mms,
    PrepaidInternet,
    PrepaidMms,
    Tethering,
    Application,
}

impl CellularServiceType {
    pub fn from_native(s: &str) -> Self {
        match s {
            "internet" => Self::Internet,
            "mms" => Self::Mms,
            "prepaid_internet" => Self::PrepaidInternet,
            "prepaid_mms" => Self::PrepaidMms,
            "tethering" => Self::Tethering,
            "application" => Self::Application,
            _ => Self::Unknown,
        }
    }

    pub fn as_native(&self) -> &'static str {
        match self {
            Self::Unknown => "unknown",
            Self::Internet => "internet",
            Self::Mms => "mms",
            Self::PrepaidInternet => "prepaid_internet",
            Self::PrepaidMms => "prepaid_mms",
            Self::Tethering => "tethering",
            Self::Application => "application",
        }
    }

    /// Whether a service of this type can become the default data service.
    pub fn is_internet(&self) -> bool {
        matches!(self, Self::Internet | Self::PrepaidInternet)
    }
}

/// Cellular authentication type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum CellularAuthType {
    #[default]
    None,
    Pap,
    Chap,
}

impl CellularAuthType {
    pub fn from_native(s: &str) -> Self {
        match s {
            "pap" => Self::Pap,
            "chap" => Self::Chap,
            _ => Self::None,
        }
    }

    pub fn as_native(&self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Pap => "pap",
            Self::Chap => "chap",
        }
    }
}

/// Cellular-specific profile data.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct CellularInfo {
    pub service_type: CellularServiceType,
    pub apn: String,
    pub auth_type: CellularAuthType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub home_url: Option<String>,
    #[serde(default)]
    pub roaming: bool,
    #[serde(default)]
    pub editable: bool,
    #[serde(default)]
    pub default: bool,
}

/// Wi-Fi security type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum WifiSecurityType {
    #[default]
    None,
    Wep,
    WpaPsk,
    Wpa2Psk,
    Eap,
}

/// Wi-Fi-specific profile data.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct WifiInfo {
    pub essid: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bssid: Option<String>,
    pub rssi: i32,
    pub frequency: u32,
    pub max_speed: u32,
    pub security: WifiSecurityType,
    #[serde(default)]
    pub passphrase_required: bool,
}

/// Type-specific profile data.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum ProfileDetails {
    Cellular(CellularInfo),
    Wifi(WifiInfo),
    Ethernet,
    Bluetooth,
}

impl ProfileDetails {
    fn empty(profile_type: ProfileType) -> Self {
        match profile_type {
            ProfileType::Cellular => Self::Cellular(CellularInfo::default()),
            ProfileType::Wifi => Self::Wifi(WifiInfo::default()),
            ProfileType::Ethernet => Self::Ethernet,
            ProfileType::Bluetooth => Self::Bluetooth,
        }
    }
}

/// Prefix of identifiers given to profiles not yet known to the daemon.
pub const LOCAL_ID_PREFIX: &str = "local_";

/// A network profile snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Profile {
    /// Daemon identifier (service object path), or a provisional local id.
    pub id: String,
    /// Display name.
    pub name: String,
    /// Device type.
    pub profile_type: ProfileType,
    /// Connection state at snapshot time.
    pub state: ProfileState,
    /// Network interface name, if bound.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub interface: Option<String>,
    /// IPv4 configuration.
    #[serde(default)]
    pub ipv4: IpConfig,
    /// IPv6 configuration.
    #[serde(default)]
    pub ipv6: IpConfig,
    /// Proxy configuration.
    #[serde(default)]
    pub proxy: ProxySettings,
    /// Type-specific data.
    pub details: ProfileDetails,
}

impl Profile {
    /// Create a new profile that the daemon does not know about yet.
    pub fn new(profile_type: ProfileType, name: impl Into<String>) -> Self {
        Self {
            id: format!("{}{}", LOCAL_ID_PREFIX, Uuid::new_v4().simple()),
            name: name.into(),
            profile_type,
            state: ProfileState::Disconnected,
            interface: None,
            ipv4: IpConfig::default(),
            ipv6: IpConfig::default(),
            proxy: ProxySettings::default(),
            details: ProfileDetails::empty(profile_type),
        }
    }

    /// Whether this profile has been registered with the daemon.
    pub fn is_local(&self) -> bool {
        self.id.starts_with(LOCAL_ID_PREFIX)
    }

    pub fn is_connected(&self) -> bool {
        self.state == ProfileState::Connected
    }

    /// Get the IP configuration of one family.
    pub fn ip_config(&self, family: AddressFamily) -> &IpConfig {
        match family {
            AddressFamily::Ipv4 => &self.ipv4,
            AddressFamily::Ipv6 => &self.ipv6,
        }
    }

    fn ip_config_mut(&mut self, family: AddressFamily) -> &mut IpConfig {
        match family {
            AddressFamily::Ipv4 => &mut self.ipv4,
            AddressFamily::Ipv6 => &mut self.ipv6,
        }
    }

    pub fn cellular(&self) -> Option<&CellularInfo> {
        match &self.details {
            ProfileDetails::Cellular(info) => Some(info),
            _ => None,
        }
    }

    pub fn cellular_mut(&mut self) -> Option<&mut CellularInfo> {
        match &mut self.details {
            ProfileDetails::Cellular(info) => Some(info),
            _ => None,
        }
    }

    pub fn wifi(&self) -> Option<&WifiInfo> {
        match &self.details {
            ProfileDetails::Wifi(info) => Some(info),
            _ => None,
        }
    }

    /// Set the address of one family, validating it first.
    pub fn set_ip_address(&mut self, family: AddressFamily, address: &str) -> Result<()> {
        validate_for_family(family, address)?;
        self.ip_config_mut(family).address = Some(address.to_string());
        Ok(())
    }

    /// Set the gateway of one family, validating it first.
    pub fn set_gateway(&mut self, family: AddressFamily, gateway: &str) -> Result<()> {
        validate_for_family(family, gateway)?;
        self.ip_config_mut(family).gateway = Some(gateway.to_string());
        Ok(())
    }

    /// Set the subnet mask (IPv4 only).
    pub fn set_netmask(&mut self, netmask: &str) -> Result<()> {
        validation::validate_ipv4(netmask)?;
        self.ipv4.netmask = Some(netmask.to_string());
        Ok(())
    }

    /// Replace the DNS server at `order` (1-based), appending when `order` is one past the end.
    pub fn set_dns_address(&mut self, family: AddressFamily, order: usize, address: &str) -> Result<()> {
        validate_for_family(family, address)?;
        let dns = &mut self.ip_config_mut(family).dns;
        match order {
            0 => Err(super::Error::invalid_parameter("DNS order starts at 1")),
            n if n <= dns.len() => {
                dns[n - 1] = address.to_string();
                Ok(())
            }
            n if n == dns.len() + 1 => {
                dns.push(address.to_string());
                Ok(())
            }
            n => Err(super::Error::invalid_parameter(format!(
                "DNS order {} out of range",
                n
            ))),
        }
    }

    pub fn set_ip_config_type(&mut self, family: AddressFamily, config_type: IpConfigType) {
        self.ip_config_mut(family).config_type = config_type;
    }

    /// Set proxy type and address; manual proxies are validated as `host:port`.
    pub fn set_proxy(&mut self, proxy_type: ProxyType, address: Option<&str>) -> Result<()> {
        if proxy_type == ProxyType::Manual {
            let address = address
                .ok_or_else(|| super::Error::invalid_parameter("manual proxy needs an address"))?;
            validation::validate_proxy_address(address)?;
        }
        self.proxy = ProxySettings {
            proxy_type,
            address: address.map(str::to_string),
        };
        Ok(())
    }
}

fn validate_for_family(family: AddressFamily, address: &str) -> Result<()> {
    match family {
        AddressFamily::Ipv4 => validation::validate_ipv4(address).map(|_| ()),
        AddressFamily::Ipv6 => validation::validate_ipv6(address).map(|_| ()),
    }
}
