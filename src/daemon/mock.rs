// Net Connection - In-Memory Daemon
// Copyright (C) 2026 Christos A. Daggas
// SPDX-License-Identifier: MIT

//! Scriptable daemon for tests.

use std::collections::{BTreeMap, HashMap, VecDeque};
use std::sync::{Arc, Mutex, MutexGuard};

use super::{Completion, Daemon, DaemonEvent, EventKind, EventSink, PropertyValue, ServiceRecord};
use crate::models::{Error, Result, StatisticsType, TechnologyKind, TechnologyState};
use crate::registry::ConnectionContext;
use crate::storage::MemoryPreferenceStore;

/// Everything the mock records or can be told to do.
#[derive(Default)]
pub(crate) struct MockState {
    pub connects: usize,
    pub disconnects: usize,
    pub subscribes: [usize; 3],
    pub unsubscribes: [usize; 3],

    pub services: Vec<ServiceRecord>,
    pub technologies: HashMap<TechnologyKind, TechnologyState>,
    pub wifi_statistics: HashMap<StatisticsType, u64>,

    pub fail_connect: bool,
    pub fail_subscribe: bool,
    pub fail_unsubscribe: bool,
    pub fail_services: bool,
    pub fail_requests: bool,
    /// `services()` reports that the daemon has none.
    pub no_service: bool,
    /// Fire completions before the request call returns.
    pub complete_immediately: bool,

    pub pending: VecDeque<(String, Completion)>,
    pub removed: Vec<String>,
    pub properties: Vec<(String, String, PropertyValue)>,
    pub added: Vec<BTreeMap<String, PropertyValue>>,

    sink: Option<EventSink>,
}

impl MockState {
    pub fn pending_ids(&self) -> Vec<String> {
        self.pending.iter().map(|(id, _)| id.clone()).collect()
    }
}

#[derive(Default)]
pub(crate) struct MockDaemon {
    state: Mutex<MockState>,
}

impl MockDaemon {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn with_services(services: Vec<ServiceRecord>) -> Arc<Self> {
        let daemon = Self::new();
        daemon.state().services = services;
        daemon
    }

    pub fn state(&self) -> MutexGuard<'_, MockState> {
        self.state.lock().unwrap()
    }

    pub fn subscribe_count(&self, kind: EventKind) -> usize {
        self.state().subscribes[kind.index()]
    }

    pub fn unsubscribe_count(&self, kind: EventKind) -> usize {
        self.state().unsubscribes[kind.index()]
    }

    /// Deliver an event the way the event loop would.
    pub fn emit(&self, event: DaemonEvent) {
        let sink = self.state().sink.clone();
        if let Some(sink) = sink {
            sink(event);
        }
    }

    /// Complete the oldest pending request; false if none is pending.
    pub fn complete_next(&self, result: Result<()>) -> bool {
        let next = self.state().pending.pop_front();
        match next {
            Some((_, done)) => {
                done(result);
                true
            }
            None => false,
        }
    }

    fn request(&self, identifier: &str, done: Completion) -> Result<()> {
        let mut state = self.state();
        if state.fail_requests {
            return Err(Error::operation_failed("request", "mock failure"));
        }
        if state.complete_immediately {
            drop(state);
            done(Ok(()));
            return Ok(());
        }
        state.pending.push_back((identifier.to_string(), done));
        Ok(())
    }
}

impl Daemon for MockDaemon {
    fn connect(&self, sink: EventSink) -> Result<()> {
        let mut state = self.state();
        if state.fail_connect {
            return Err(Error::SessionFailed("mock refused".into()));
        }
        state.connects += 1;
        state.sink = Some(sink);
        Ok(())
    }

    fn disconnect(&self) {
        let mut state = self.state();
        state.disconnects += 1;
        state.sink = None;
        state.pending.clear();
    }

    fn technology(&self, kind: TechnologyKind) -> Result<Option<TechnologyState>> {
        Ok(self.state().technologies.get(&kind).copied())
    }

    fn services(&self) -> Result<Vec<ServiceRecord>> {
        let state = self.state();
        if state.fail_services {
            return Err(Error::operation_failed("GetServices", "mock failure"));
        }
        if state.no_service {
            return Err(Error::NoService);
        }
        Ok(state.services.clone())
    }

    fn subscribe(&self, kind: EventKind) -> Result<()> {
        let mut state = self.state();
        if state.fail_subscribe {
            return Err(Error::Dbus("mock subscribe failure".into()));
        }
        state.subscribes[kind.index()] += 1;
        Ok(())
    }

    fn unsubscribe(&self, kind: EventKind) -> Result<()> {
        let mut state = self.state();
        if state.fail_unsubscribe {
            return Err(Error::Dbus("mock unsubscribe failure".into()));
        }
        state.unsubscribes[kind.index()] += 1;
        Ok(())
    }

    fn open_service(&self, identifier: &str, done: Completion) -> Result<()> {
        self.request(identifier, done)
    }

    fn close_service(&self, identifier: &str, done: Completion) -> Result<()> {
        self.request(identifier, done)
    }

    fn set_default_cellular_service(&self, identifier: &str, done: Completion) -> Result<()> {
        self.request(identifier, done)
    }

    fn remove_service(&self, identifier: &str) -> Result<()> {
        self.state().removed.push(identifier.to_string());
        Ok(())
    }

    fn set_service_property(&self, identifier: &str, name: &str, value: PropertyValue) -> Result<()> {
        self.state()
            .properties
            .push((identifier.to_string(), name.to_string(), value));
        Ok(())
    }

    fn add_cellular_service(&self, properties: BTreeMap<String, PropertyValue>) -> Result<String> {
        let mut state = self.state();
        state.added.push(properties);
        Ok(format!("/svc/cell_added_{}", state.added.len()))
    }

    fn wifi_statistics(&self, kind: StatisticsType) -> Result<u64> {
        Ok(self.state().wifi_statistics.get(&kind).copied().unwrap_or(0))
    }

    fn reset_wifi_statistics(&self, kind: StatisticsType) -> Result<()> {
        self.state().wifi_statistics.insert(kind, 0);
        Ok(())
    }
}

/// A plain service record.
pub(crate) fn service(id: &str, kind: &str, name: &str, state: &str) -> ServiceRecord {
    ServiceRecord::new(id)
        .with_property("Type", PropertyValue::str(kind))
        .with_property("Name", PropertyValue::str(name))
        .with_property("State", PropertyValue::str(state))
}

/// A cellular service record with APN details.
pub(crate) fn cellular_service(id: &str, name: &str, state: &str, service_type: &str) -> ServiceRecord {
    let mut cellular = BTreeMap::new();
    cellular.insert("APN".to_string(), PropertyValue::str(name.to_lowercase()));
    cellular.insert("ServiceType".to_string(), PropertyValue::str(service_type));
    service(id, "cellular", name, state).with_property("Cellular", PropertyValue::Dict(cellular))
}

/// A context over `daemon` with in-memory counters.
pub(crate) fn test_context(daemon: &Arc<MockDaemon>) -> ConnectionContext {
    ConnectionContext::new(daemon.clone(), Arc::new(MemoryPreferenceStore::new()))
}
