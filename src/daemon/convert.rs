// Net Connection - Native Translation
// Copyright (C) 2026 Christos A. Daggas
// SPDX-License-Identifier: MIT

//! Translation between daemon property maps and public types.

use std::collections::BTreeMap;

use super::{PropertyValue, ServiceRecord};
use crate::models::{
    AddressFamily, BtState, CellularAuthType, CellularInfo, CellularServiceType, CellularState,
    ConnectionType, EthernetState, IpConfig, IpConfigType, Profile, ProfileDetails, ProfileType,
    ProxySettings, ProxyType, TechnologyState, WifiInfo, WifiSecurityType, WifiState,
};

/// The daemon lists its default service first among connected ones.
pub fn default_service(services: &[ServiceRecord]) -> Option<&ServiceRecord> {
    services.iter().find(|s| s.state().is_connected())
}

/// Connection type of the default service.
pub fn connection_type(default: Option<&ServiceRecord>) -> ConnectionType {
    default
        .and_then(ServiceRecord::service_type)
        .map(ConnectionType::from_native)
        .unwrap_or(ConnectionType::Disconnected)
}

/// Build a profile snapshot; services of unsupported types yield `None`.
pub fn profile_from_service(record: &ServiceRecord) -> Option<Profile> {
    let profile_type = ProfileType::from_native(record.service_type()?)?;

    let mut profile = Profile::new(profile_type, record.name().unwrap_or_default());
    profile.id = record.identifier.clone();
    profile.state = record.state().to_profile_state();

    let nameservers = record
        .property("Nameservers")
        .and_then(PropertyValue::as_list)
        .unwrap_or_default();
    profile.ipv4 = ip_config(record.property("IPv4"), AddressFamily::Ipv4, nameservers);
    profile.ipv6 = ip_config(record.property("IPv6"), AddressFamily::Ipv6, nameservers);
    profile.proxy = proxy_settings(record.property("Proxy"));
    profile.interface = record
        .property("Ethernet")
        .and_then(|e| e.get("Interface"))
        .and_then(PropertyValue::as_str)
        .map(str::to_string);

    profile.details = match profile_type {
        ProfileType::Cellular => ProfileDetails::Cellular(cellular_info(record)),
        ProfileType::Wifi => ProfileDetails::Wifi(wifi_info(record)),
        ProfileType::Ethernet => ProfileDetails::Ethernet,
        ProfileType::Bluetooth => ProfileDetails::Bluetooth,
    };

    Some(profile)
}

fn ip_config(value: Option<&PropertyValue>, family: AddressFamily, nameservers: &[String]) -> IpConfig {
    let text = |key: &str| {
        value
            .and_then(|v| v.get(key))
            .and_then(PropertyValue::as_str)
            .map(str::to_string)
    };

    let config_type = match text("Method").as_deref() {
        Some("dhcp") => IpConfigType::Dynamic,
        Some("manual") => IpConfigType::Static,
        Some("auto") => IpConfigType::Auto,
        Some("fixed") => IpConfigType::Fixed,
        _ => IpConfigType::None,
    };

    let netmask = match family {
        AddressFamily::Ipv4 => text("Netmask"),
        AddressFamily::Ipv6 => value
            .and_then(|v| v.get("PrefixLength"))
            .and_then(PropertyValue::as_u32)
            .map(|p| p.to_string()),
    };

    let want_v6 = family == AddressFamily::Ipv6;
    let dns = nameservers
        .iter()
        .filter(|s| s.contains(':') == want_v6)
        .cloned()
        .collect();

    IpConfig {
        config_type,
        address: text("Address"),
        netmask,
        gateway: text("Gateway"),
        dns,
    }
}

fn proxy_settings(value: Option<&PropertyValue>) -> ProxySettings {
    let Some(value) = value else {
        return ProxySettings::default();
    };

    match value.get("Method").and_then(PropertyValue::as_str) {
        Some("auto") => ProxySettings {
            proxy_type: ProxyType::Auto,
            address: value
                .get("URL")
                .and_then(PropertyValue::as_str)
                .map(str::to_string),
        },
        Some("manual") => ProxySettings {
            proxy_type: ProxyType::Manual,
            address: value
                .get("Servers")
                .and_then(PropertyValue::as_list)
                .and_then(|servers| servers.first())
                .cloned(),
        },
        _ => ProxySettings::default(),
    }
}

fn cellular_info(record: &ServiceRecord) -> CellularInfo {
    let cellular = record.property("Cellular");
    let text = |key: &str| {
        cellular
            .and_then(|c| c.get(key))
            .and_then(PropertyValue::as_str)
            .map(str::to_string)
    };
    let flag = |key: &str| {
        cellular
            .and_then(|c| c.get(key))
            .and_then(PropertyValue::as_bool)
            .unwrap_or(false)
    };

    CellularInfo {
        service_type: text("ServiceType")
            .map(|s| CellularServiceType::from_native(&s))
            .unwrap_or_default(),
        apn: text("APN").unwrap_or_default(),
        auth_type: text("AuthType")
            .map(|s| CellularAuthType::from_native(&s))
            .unwrap_or_default(),
        user_name: text("Username"),
        password: text("Password"),
        home_url: text("HomeURL"),
        roaming: flag("Roaming"),
        editable: flag("Editable"),
        default: flag("Default"),
    }
}

fn wifi_info(record: &ServiceRecord) -> WifiInfo {
    let number = |key: &str| record.property(key).and_then(PropertyValue::as_u32).unwrap_or(0);

    let security = record
        .property("Security")
        .and_then(PropertyValue::as_list)
        .map(wifi_security)
        .unwrap_or_default();

    WifiInfo {
        essid: record.name().unwrap_or_default().to_string(),
        bssid: record
            .property("BSSID")
            .and_then(PropertyValue::as_str)
            .map(str::to_string),
        rssi: record
            .property("Strength")
            .and_then(PropertyValue::as_i32)
            .unwrap_or(0),
        frequency: number("Frequency"),
        max_speed: number("MaxRate"),
        security,
        passphrase_required: record
            .property("PassphraseRequired")
            .and_then(PropertyValue::as_bool)
            .unwrap_or(false),
    }
}

fn wifi_security(methods: &[String]) -> WifiSecurityType {
    let has = |m: &str| methods.iter().any(|s| s == m);
    if has("ieee8021x") {
        WifiSecurityType::Eap
    } else if has("rsn") {
        WifiSecurityType::Wpa2Psk
    } else if has("psk") {
        WifiSecurityType::WpaPsk
    } else if has("wep") {
        WifiSecurityType::Wep
    } else {
        WifiSecurityType::None
    }
}

/// Address of `family` on a service, if it has one.
pub fn address(record: &ServiceRecord, family: AddressFamily) -> Option<String> {
    let key = match family {
        AddressFamily::Ipv4 => "IPv4",
        AddressFamily::Ipv6 => "IPv6",
    };
    record
        .property(key)
        .and_then(|v| v.get("Address"))
        .and_then(PropertyValue::as_str)
        .map(str::to_string)
}

/// Proxy address of a service (manual server or PAC URL).
pub fn proxy_address(record: &ServiceRecord) -> Option<String> {
    proxy_settings(record.property("Proxy")).address
}

/// Writable `*.Configuration` properties describing a profile.
pub fn configuration_properties(profile: &Profile) -> Vec<(&'static str, PropertyValue)> {
    let mut properties = vec![
        ("IPv4.Configuration", ip_configuration(&profile.ipv4, AddressFamily::Ipv4)),
        ("IPv6.Configuration", ip_configuration(&profile.ipv6, AddressFamily::Ipv6)),
        ("Proxy.Configuration", proxy_configuration(&profile.proxy)),
    ];

    let nameservers: Vec<String> = profile
        .ipv4
        .dns
        .iter()
        .chain(profile.ipv6.dns.iter())
        .cloned()
        .collect();
    properties.push(("Nameservers.Configuration", PropertyValue::List(nameservers)));

    if let Some(cellular) = profile.cellular() {
        properties.push((
            "Cellular.Configuration",
            PropertyValue::Dict(cellular_configuration(cellular)),
        ));
    }

    properties
}

fn ip_configuration(config: &IpConfig, family: AddressFamily) -> PropertyValue {
    let method = match config.config_type {
        IpConfigType::None => "off",
        IpConfigType::Static => "manual",
        IpConfigType::Dynamic => "dhcp",
        IpConfigType::Auto => "auto",
        IpConfigType::Fixed => "fixed",
    };

    let mut dict = BTreeMap::new();
    dict.insert("Method".to_string(), PropertyValue::str(method));
    if config.config_type == IpConfigType::Static {
        if let Some(address) = &config.address {
            dict.insert("Address".to_string(), PropertyValue::str(address.as_str()));
        }
        if let Some(netmask) = &config.netmask {
            match family {
                AddressFamily::Ipv4 => {
                    dict.insert("Netmask".to_string(), PropertyValue::str(netmask.as_str()));
                }
                AddressFamily::Ipv6 => {
                    if let Ok(prefix) = netmask.parse::<u32>() {
                        dict.insert("PrefixLength".to_string(), PropertyValue::U32(prefix));
                    }
                }
            }
        }
        if let Some(gateway) = &config.gateway {
            dict.insert("Gateway".to_string(), PropertyValue::str(gateway.as_str()));
        }
    }
    PropertyValue::Dict(dict)
}

fn proxy_configuration(proxy: &ProxySettings) -> PropertyValue {
    let mut dict = BTreeMap::new();
    match proxy.proxy_type {
        ProxyType::Direct => {
            dict.insert("Method".to_string(), PropertyValue::str("direct"));
        }
        ProxyType::Auto => {
            dict.insert("Method".to_string(), PropertyValue::str("auto"));
            if let Some(url) = &proxy.address {
                dict.insert("URL".to_string(), PropertyValue::str(url.as_str()));
            }
        }
        ProxyType::Manual => {
            dict.insert("Method".to_string(), PropertyValue::str("manual"));
            let servers = proxy.address.iter().cloned().collect();
            dict.insert("Servers".to_string(), PropertyValue::List(servers));
        }
    }
    PropertyValue::Dict(dict)
}

/// Properties of a cellular service, as used when registering one.
pub fn cellular_configuration(info: &CellularInfo) -> BTreeMap<String, PropertyValue> {
    let mut dict = BTreeMap::new();
    dict.insert("APN".to_string(), PropertyValue::str(info.apn.as_str()));
    dict.insert(
        "ServiceType".to_string(),
        PropertyValue::str(info.service_type.as_native()),
    );
    dict.insert(
        "AuthType".to_string(),
        PropertyValue::str(info.auth_type.as_native()),
    );
    for (key, value) in [
        ("Username", &info.user_name),
        ("Password", &info.password),
        ("HomeURL", &info.home_url),
    ] {
        if let Some(value) = value {
            dict.insert(key.to_string(), PropertyValue::str(value.as_str()));
        }
    }
    dict
}

/// Cellular state from the cellular technology flags.
pub fn cellular_state(tech: Option<TechnologyState>) -> CellularState {
    match tech {
        None => CellularState::OutOfService,
        Some(t) if !t.powered => CellularState::FlightMode,
        Some(t) if t.connected => CellularState::Connected,
        Some(_) => CellularState::Available,
    }
}

pub fn wifi_state(tech: Option<TechnologyState>) -> WifiState {
    match tech {
        Some(t) if t.powered && t.connected => WifiState::Connected,
        Some(t) if t.powered => WifiState::Disconnected,
        _ => WifiState::Deactivated,
    }
}

pub fn ethernet_state(tech: Option<TechnologyState>) -> EthernetState {
    match tech {
        Some(t) if t.powered && t.connected => EthernetState::Connected,
        Some(t) if t.powered => EthernetState::Disconnected,
        _ => EthernetState::Deactivated,
    }
}

/// Bluetooth counts as connected while tethering too.
pub fn bt_state(tech: Option<TechnologyState>) -> BtState {
    match tech {
        Some(t) if t.powered && (t.connected || t.tethering) => BtState::Connected,
        Some(t) if t.powered => BtState::Disconnected,
        _ => BtState::Deactivated,
    }
}
