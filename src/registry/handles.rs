// Net Connection - Handle Registry
// Copyright (C) 2026 Christos A. Daggas
// SPDX-License-Identifier: MIT

//! Live connection handles and their per-kind callback slots.

use std::fmt;
use std::sync::Arc;

use tracing::debug;

use super::fanout::ChangeEvent;
use super::requests::RequestKind;
use crate::daemon::EventKind;
use crate::models::{Error, Result};

/// Opaque token for one client registration.
///
/// A handle is valid exactly while it is registered with the context that
/// issued it. Identifiers are never reused, so a destroyed handle stays
/// invalid even after new handles are created.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ConnectionHandle(u64);

impl fmt::Display for ConnectionHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "conn-{}", self.0)
    }
}

/// Type-erased change callback stored in a slot.
pub(crate) type ChangeCallback = Arc<dyn Fn(&ChangeEvent) + Send + Sync>;

pub(crate) struct HandleRecord {
    handle: ConnectionHandle,
    slots: [Option<ChangeCallback>; 3],
    pending: [bool; 3],
}

impl HandleRecord {
    pub(crate) fn slot(&self, kind: EventKind) -> Option<&ChangeCallback> {
        self.slots[kind.index()].as_ref()
    }

    pub(crate) fn set_slot(&mut self, kind: EventKind, callback: ChangeCallback) -> Option<ChangeCallback> {
        self.slots[kind.index()].replace(callback)
    }

    pub(crate) fn take_slot(&mut self, kind: EventKind) -> Option<ChangeCallback> {
        self.slots[kind.index()].take()
    }

    pub(crate) fn is_pending(&self, kind: RequestKind) -> bool {
        self.pending[kind.index()]
    }

    pub(crate) fn set_pending(&mut self, kind: RequestKind, pending: bool) {
        self.pending[kind.index()] = pending;
    }
}

/// Registered handles in creation order.
#[derive(Default)]
pub(crate) struct HandleRegistry {
    records: Vec<HandleRecord>,
}

impl HandleRegistry {
    pub(crate) fn insert(&mut self) -> ConnectionHandle {
        let handle = ConnectionHandle(super::next_token());
        self.records.push(HandleRecord {
            handle,
            slots: Default::default(),
            pending: [false; 3],
        });
        handle
    }

    pub(crate) fn remove(&mut self, handle: ConnectionHandle) -> Option<HandleRecord> {
        let pos = self.records.iter().position(|r| r.handle == handle)?;
        Some(self.records.remove(pos))
    }

    pub(crate) fn contains(&self, handle: ConnectionHandle) -> bool {
        self.records.iter().any(|r| r.handle == handle)
    }

    /// Fail with `InvalidHandle` unless `handle` is registered.
    pub(crate) fn ensure(&self, handle: ConnectionHandle) -> Result<()> {
        if self.contains(handle) {
            Ok(())
        } else {
            debug!(handle = %handle, "Rejected unregistered handle");
            Err(Error::InvalidHandle)
        }
    }

    pub(crate) fn get(&self, handle: ConnectionHandle) -> Option<&HandleRecord> {
        self.records.iter().find(|r| r.handle == handle)
    }

    pub(crate) fn get_mut(&mut self, handle: ConnectionHandle) -> Option<&mut HandleRecord> {
        self.records.iter_mut().find(|r| r.handle == handle)
    }

    pub(crate) fn len(&self) -> usize {
        self.records.len()
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Number of handles with a callback of `kind`.
    pub(crate) fn registrants(&self, kind: EventKind) -> usize {
        self.records.iter().filter(|r| r.slot(kind).is_some()).count()
    }

    /// Point-in-time copy of every callback of `kind`, in registry order.
    pub(crate) fn recipients(&self, kind: EventKind) -> Vec<(ConnectionHandle, ChangeCallback)> {
        self.records
            .iter()
            .filter_map(|r| r.slot(kind).map(|cb| (r.handle, Arc::clone(cb))))
            .collect()
    }
}
