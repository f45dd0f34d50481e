// Net Connection - Connection Queries
// Copyright (C) 2026 Christos A. Daggas
// SPDX-License-Identifier: MIT

//! Read-only queries about the default connection and technologies.

use super::{ConnectionContext, ConnectionHandle};
use crate::daemon::convert;
use crate::models::{
    AddressFamily, BtState, CellularState, ConnectionType, Error, EthernetState, Result,
    TechnologyKind, TechnologyState, WifiState,
};

impl ConnectionContext {
    /// Type of the default connection.
    pub fn get_type(&self, handle: ConnectionHandle) -> Result<ConnectionType> {
        self.lock().handles.ensure(handle)?;
        let services = self.services_or_empty()?;
        Ok(convert::connection_type(convert::default_service(&services)))
    }

    /// Address of the default connection; empty if it has none of `family`.
    pub fn get_ip_address(&self, handle: ConnectionHandle, family: AddressFamily) -> Result<String> {
        self.lock().handles.ensure(handle)?;
        let services = self.services_or_empty()?;
        let default = convert::default_service(&services).ok_or(Error::NoConnection)?;
        Ok(convert::address(default, family).unwrap_or_default())
    }

    /// Proxy of the default connection; IPv6 proxies are not supported.
    pub fn get_proxy(&self, handle: ConnectionHandle, family: AddressFamily) -> Result<String> {
        self.lock().handles.ensure(handle)?;
        if family == AddressFamily::Ipv6 {
            return Err(Error::NotSupported("IPv6 proxy".to_string()));
        }
        let services = self.services_or_empty()?;
        let default = convert::default_service(&services).ok_or(Error::NoConnection)?;
        Ok(convert::proxy_address(default).unwrap_or_default())
    }

    pub fn get_cellular_state(&self, handle: ConnectionHandle) -> Result<CellularState> {
        self.technology(handle, TechnologyKind::Cellular)
            .map(convert::cellular_state)
    }

    pub fn get_wifi_state(&self, handle: ConnectionHandle) -> Result<WifiState> {
        self.technology(handle, TechnologyKind::Wifi)
            .map(convert::wifi_state)
    }

    pub fn get_ethernet_state(&self, handle: ConnectionHandle) -> Result<EthernetState> {
        self.technology(handle, TechnologyKind::Ethernet)
            .map(convert::ethernet_state)
    }

    pub fn get_bt_state(&self, handle: ConnectionHandle) -> Result<BtState> {
        self.technology(handle, TechnologyKind::Bluetooth)
            .map(convert::bt_state)
    }

    fn technology(&self, handle: ConnectionHandle, kind: TechnologyKind) -> Result<Option<TechnologyState>> {
        self.lock().handles.ensure(handle)?;
        self.daemon().technology(kind)
    }
}
