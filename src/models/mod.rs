// Net Connection - Shared Models
// Copyright (C) 2026 Christos A. Daggas
// SPDX-License-Identifier: MIT

//! # Shared Models
//!
//! Plain data types shared by the registry and the daemon backends:
//!
//! - **Profile**: Network profile snapshots and their type-specific details
//! - **Connection**: Connection type, technology states, address families
//! - **Statistics**: Counter selectors
//! - **Config**: Client configuration
//! - **Error**: Shared error types and public result codes

pub mod config;
pub mod connection;
pub mod error;
pub mod profile;
pub mod statistics;
pub mod validation;

pub use config::{BusType, ClientConfig};
pub use connection::{
    AddressFamily, BtState, CellularState, ConnectionType, EthernetState, IteratorKind,
    TechnologyKind, TechnologyState, WifiState,
};
pub use error::{result_code, Error, ErrorCode, Result};
pub use profile::{
    CellularAuthType, CellularInfo, CellularServiceType, IpConfig, IpConfigType, Profile,
    ProfileDetails, ProfileState, ProfileType, ProxySettings, ProxyType, WifiInfo,
    WifiSecurityType,
};
pub use statistics::{StatisticsTarget, StatisticsType};

/// Well-known bus name of the connectivity daemon.
pub const CONNMAN_SERVICE_NAME: &str = "net.connman";

/// Object path of the daemon's manager object.
pub const CONNMAN_MANAGER_PATH: &str = "/";

/// Manager interface (service and technology lists).
pub const CONNMAN_MANAGER_INTERFACE: &str = "net.connman.Manager";

/// Per-service interface (connect, disconnect, properties).
pub const CONNMAN_SERVICE_INTERFACE: &str = "net.connman.Service";

/// Well-known bus name of the statistics service.
pub const NETCONFIG_SERVICE_NAME: &str = "net.netconfig";

/// Object path of the statistics object.
pub const NETCONFIG_STATISTICS_PATH: &str = "/net/netconfig/network_statistics";

/// Statistics interface.
pub const NETCONFIG_STATISTICS_INTERFACE: &str = "net.netconfig.network_statistics";

/// Configuration directory name (under XDG_CONFIG_HOME).
pub const CONFIG_DIR_NAME: &str = "net-connection";
