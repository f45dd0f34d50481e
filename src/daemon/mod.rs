// Net Connection - Daemon Interface
// Copyright (C) 2026 Christos A. Daggas
// SPDX-License-Identifier: MIT

//! The narrow interface the registry consumes from the connectivity daemon.
//!
//! Everything here speaks the daemon's native vocabulary: service records
//! are untyped property maps and states are the daemon's own strings.
//! Translation into public types lives in [`convert`].
//!
//! # Threading contract
//!
//! The registry holds its lock across `connect`, `disconnect`, `subscribe`
//! and `unsubscribe`, so those must not deliver through the [`EventSink`]
//! before returning. Events come from the daemon's event-loop thread.
//! A [`Completion`] may fire from any thread, including synchronously.

use std::collections::BTreeMap;
use std::sync::Arc;

use crate::models::{ProfileState, Result, StatisticsType, TechnologyKind, TechnologyState};

pub mod connman;
pub mod convert;
#[cfg(test)]
pub(crate) mod mock;

pub use connman::ConnmanDaemon;

/// Change-notification kinds that need a daemon-level subscription.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    TypeChanged,
    IpChanged,
    ProxyChanged,
}

impl EventKind {
    pub const ALL: [EventKind; 3] = [Self::TypeChanged, Self::IpChanged, Self::ProxyChanged];

    /// Slot index inside a per-handle callback table.
    pub fn index(&self) -> usize {
        match self {
            Self::TypeChanged => 0,
            Self::IpChanged => 1,
            Self::ProxyChanged => 2,
        }
    }
}

/// Service state as reported by the daemon.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ServiceState {
    #[default]
    Idle,
    Failure,
    Association,
    Configuration,
    Ready,
    Disconnect,
    Online,
}

impl ServiceState {
    pub fn from_native(s: &str) -> Self {
        match s {
            "failure" => Self::Failure,
            "association" => Self::Association,
            "configuration" => Self::Configuration,
            "ready" => Self::Ready,
            "disconnect" => Self::Disconnect,
            "online" => Self::Online,
            _ => Self::Idle,
        }
    }

    pub fn as_native(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Failure => "failure",
            Self::Association => "association",
            Self::Configuration => "configuration",
            Self::Ready => "ready",
            Self::Disconnect => "disconnect",
            Self::Online => "online",
        }
    }

    /// Ready and online services carry traffic.
    pub fn is_connected(&self) -> bool {
        matches!(self, Self::Ready | Self::Online)
    }

    pub fn to_profile_state(self) -> ProfileState {
        match self {
            Self::Idle | Self::Failure | Self::Disconnect => ProfileState::Disconnected,
            Self::Association => ProfileState::Association,
            Self::Configuration => ProfileState::Configuration,
            Self::Ready | Self::Online => ProfileState::Connected,
        }
    }
}

/// A daemon property value, reduced to the shapes the daemon actually uses.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PropertyValue {
    Str(String),
    Bool(bool),
    U32(u32),
    I32(i32),
    List(Vec<String>),
    Dict(BTreeMap<String, PropertyValue>),
}

impl PropertyValue {
    pub fn str(s: impl Into<String>) -> Self {
        Self::Str(s.into())
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Str(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_u32(&self) -> Option<u32> {
        match self {
            Self::U32(n) => Some(*n),
            Self::I32(n) => u32::try_from(*n).ok(),
            _ => None,
        }
    }

    pub fn as_i32(&self) -> Option<i32> {
        match self {
            Self::I32(n) => Some(*n),
            Self::U32(n) => i32::try_from(*n).ok(),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[String]> {
        match self {
            Self::List(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_dict(&self) -> Option<&BTreeMap<String, PropertyValue>> {
        match self {
            Self::Dict(map) => Some(map),
            _ => None,
        }
    }

    /// Look up a key inside a dictionary value.
    pub fn get(&self, key: &str) -> Option<&PropertyValue> {
        self.as_dict().and_then(|map| map.get(key))
    }
}

/// One service as listed by the daemon.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceRecord {
    /// Service object path; doubles as the profile identifier.
    pub identifier: String,
    /// Raw service properties (`Type`, `Name`, `State`, `IPv4`, ...).
    pub properties: BTreeMap<String, PropertyValue>,
}

impl ServiceRecord {
    pub fn new(identifier: impl Into<String>) -> Self {
        Self {
            identifier: identifier.into(),
            properties: BTreeMap::new(),
        }
    }

    /// Builder-style property insertion.
    pub fn with_property(mut self, name: impl Into<String>, value: PropertyValue) -> Self {
        self.properties.insert(name.into(), value);
        self
    }

    pub fn property(&self, name: &str) -> Option<&PropertyValue> {
        self.properties.get(name)
    }

    pub fn service_type(&self) -> Option<&str> {
        self.property("Type").and_then(PropertyValue::as_str)
    }

    pub fn name(&self) -> Option<&str> {
        self.property("Name").and_then(PropertyValue::as_str)
    }

    pub fn state(&self) -> ServiceState {
        self.property("State")
            .and_then(PropertyValue::as_str)
            .map(ServiceState::from_native)
            .unwrap_or_default()
    }
}

/// Asynchronous events coming from the daemon, still in native form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DaemonEvent {
    /// The default service changed; `None` means nothing is connected.
    DefaultServiceChanged { service_type: Option<String> },
    /// Addresses of the default service changed.
    IpChanged {
        ipv4: Option<String>,
        ipv6: Option<String>,
    },
    /// Proxy of the default service changed.
    ProxyChanged {
        ipv4: Option<String>,
        ipv6: Option<String>,
    },
    /// A service changed state.
    ServiceStateChanged {
        identifier: String,
        state: ServiceState,
    },
}

/// Where a daemon delivers its events.
pub type EventSink = Arc<dyn Fn(DaemonEvent) + Send + Sync>;

/// Completion of an asynchronous daemon request.
pub type Completion = Box<dyn FnOnce(Result<()>) + Send>;

/// The connectivity daemon as seen by the registry.
pub trait Daemon: Send + Sync {
    /// Establish the client session. Events go to `sink` from now on.
    fn connect(&self, sink: EventSink) -> Result<()>;

    /// Tear down the client session. Pending completions may be dropped.
    fn disconnect(&self);

    /// Technology flags, or `None` if the daemon has no such technology.
    fn technology(&self, kind: TechnologyKind) -> Result<Option<TechnologyState>>;

    /// All services in daemon order (default service first).
    fn services(&self) -> Result<Vec<ServiceRecord>>;

    /// Start forwarding events of `kind`.
    fn subscribe(&self, kind: EventKind) -> Result<()>;

    /// Stop forwarding events of `kind`.
    fn unsubscribe(&self, kind: EventKind) -> Result<()>;

    /// Request a connection; `done` fires once the daemon answers.
    fn open_service(&self, identifier: &str, done: Completion) -> Result<()>;

    /// Request a disconnection; `done` fires once the daemon answers.
    fn close_service(&self, identifier: &str, done: Completion) -> Result<()>;

    /// Make a cellular service the default data service.
    fn set_default_cellular_service(&self, identifier: &str, done: Completion) -> Result<()>;

    /// Forget a service.
    fn remove_service(&self, identifier: &str) -> Result<()>;

    /// Write one service property.
    fn set_service_property(&self, identifier: &str, name: &str, value: PropertyValue) -> Result<()>;

    /// Register a new cellular service, returning its identifier.
    fn add_cellular_service(&self, properties: BTreeMap<String, PropertyValue>) -> Result<String>;

    /// Read a Wi-Fi traffic counter.
    fn wifi_statistics(&self, kind: StatisticsType) -> Result<u64>;

    /// Zero a Wi-Fi traffic counter.
    fn reset_wifi_statistics(&self, kind: StatisticsType) -> Result<()>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_service_state_translation() {
        assert!(ServiceState::Ready.is_connected());
        assert!(ServiceState::Online.is_connected());
        assert!(!ServiceState::Configuration.is_connected());
        assert_eq!(ServiceState::from_native("online").to_profile_state(), ProfileState::Connected);
        assert_eq!(ServiceState::from_native("failure").to_profile_state(), ProfileState::Disconnected);
        assert_eq!(ServiceState::from_native("garbage"), ServiceState::Idle);
    }

    #[test]
    fn test_service_record_accessors() {
        let record = ServiceRecord::new("/net/connman/service/wifi_1")
            .with_property("Type", PropertyValue::str("wifi"))
            .with_property("Name", PropertyValue::str("home"))
            .with_property("State", PropertyValue::str("ready"));
        assert_eq!(record.service_type(), Some("wifi"));
        assert_eq!(record.name(), Some("home"));
        assert_eq!(record.state(), ServiceState::Ready);
    }

    #[test]
    fn test_property_value_numbers() {
        assert_eq!(PropertyValue::I32(-3).as_u32(), None);
        assert_eq!(PropertyValue::U32(7).as_i32(), Some(7));
        assert_eq!(PropertyValue::str("x").as_bool(), None);
    }
}
