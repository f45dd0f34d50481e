// Net Connection - Validation Utilities
// Copyright (C) 2026 Christos A. Daggas
// SPDX-License-Identifier: MIT

//! Input validation for profile fields.

use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};
use std::str::FromStr;

use super::error::{Error, Result};

/// Validate an IPv4 address string.
pub fn validate_ipv4(s: &str) -> Result<Ipv4Addr> {
    Ipv4Addr::from_str(s).map_err(|_| Error::InvalidIpAddress(s.to_string()))
}

/// Validate an IPv6 address string.
pub fn validate_ipv6(s: &str) -> Result<Ipv6Addr> {
    Ipv6Addr::from_str(s).map_err(|_| Error::InvalidIpAddress(s.to_string()))
}

/// Validate an IP address string (v4 or v6).
pub fn validate_ip(s: &str) -> Result<IpAddr> {
    IpAddr::from_str(s).map_err(|_| Error::InvalidIpAddress(s.to_string()))
}

/// Validate a hostname.
pub fn validate_hostname(s: &str) -> Result<String> {
    if s.is_empty() || s.len() > 253 {
        return Err(Error::InvalidHostname(format!(
            "Hostname must be 1-253 characters: {}",
            s
        )));
    }

    for label in s.split('.') {
        if label.is_empty() || label.len() > 63 {
            return Err(Error::InvalidHostname(format!(
                "Label must be 1-63 characters: {}",
                label
            )));
        }

        if !label.chars().all(|c| c.is_ascii_alphanumeric() || c == '-') {
            return Err(Error::InvalidHostname(format!(
                "Invalid characters in label: {}",
                label
            )));
        }

        if label.starts_with('-') || label.ends_with('-') {
            return Err(Error::InvalidHostname(format!(
                "Label cannot start or end with hyphen: {}",
                label
            )));
        }
    }

    Ok(s.to_lowercase())
}

/// Validate a manual proxy address of the form `host:port`.
pub fn validate_proxy_address(s: &str) -> Result<()> {
    let (host, port) = s
        .rsplit_once(':')
        .ok_or_else(|| Error::invalid_parameter(format!("Proxy needs host:port: {}", s)))?;

    port.parse::<u16>()
        .map_err(|_| Error::invalid_parameter(format!("Invalid proxy port: {}", port)))?;

    let host = host.trim_start_matches('[').trim_end_matches(']');
    if validate_ip(host).is_ok() {
        return Ok(());
    }
    validate_hostname(host).map(|_| ())
}

/// Validate a profile keyword (cellular service name, Wi-Fi ESSID, ...).
pub fn validate_profile_name(s: &str) -> Result<String> {
    let s = s.trim();
    if s.is_empty() {
        return Err(Error::invalid_parameter("Profile name cannot be empty"));
    }
    if s.len() > 100 {
        return Err(Error::invalid_parameter(
            "Profile name must be 100 characters or less",
        ));
    }
    Ok(s.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_ipv4() {
        assert!(validate_ipv4("192.168.1.1").is_ok());
        assert!(validate_ipv4("256.1.1.1").is_err());
        assert!(validate_ipv4("not-an-ip").is_err());
    }

    #[test]
    fn test_validate_hostname() {
        assert!(validate_hostname("example.com").is_ok());
        assert!(validate_hostname("my-host").is_ok());
        assert!(validate_hostname("-invalid").is_err());
        assert!(validate_hostname("").is_err());
    }

    #[test]
    fn test_validate_proxy_address() {
        assert!(validate_proxy_address("proxy.example.com:3128").is_ok());
        assert!(validate_proxy_address("10.0.0.1:8080").is_ok());
        assert!(validate_proxy_address("[fe80::1]:8080").is_ok());
        assert!(validate_proxy_address("proxy.example.com").is_err());
        assert!(validate_proxy_address("proxy:99999").is_err());
    }

    #[test]
    fn test_validate_profile_name() {
        assert_eq!(validate_profile_name("  Internet ").unwrap(), "Internet");
        assert!(validate_profile_name("   ").is_err());
    }
}
