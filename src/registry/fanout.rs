// Net Connection - Callback Fan-out
// Copyright (C) 2026 Christos A. Daggas
// SPDX-License-Identifier: MIT

//! Per-handle change callbacks multiplexed onto daemon subscriptions.
//!
//! A daemon subscription for a kind exists while at least one handle has a
//! callback of that kind. Dispatch copies the recipient list under the lock
//! and invokes callbacks after releasing it.

use std::sync::Arc;

use tracing::{debug, info};

use super::handles::ChangeCallback;
use super::{ConnectionContext, ConnectionHandle, State};
use crate::daemon::EventKind;
use crate::models::{ConnectionType, Error, Result};

/// A change delivered to connection callbacks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChangeEvent {
    Type(ConnectionType),
    Ip {
        ipv4: Option<String>,
        ipv6: Option<String>,
    },
    Proxy {
        ipv4: Option<String>,
        ipv6: Option<String>,
    },
}

impl ConnectionContext {
    /// Be told when the default connection type changes.
    pub fn set_type_changed_cb<F>(&self, handle: ConnectionHandle, callback: F) -> Result<()>
    where
        F: Fn(ConnectionType) + Send + Sync + 'static,
    {
        self.set_change_cb(
            handle,
            EventKind::TypeChanged,
            Arc::new(move |event: &ChangeEvent| {
                if let ChangeEvent::Type(connection_type) = event {
                    callback(*connection_type);
                }
            }),
        )
    }

    pub fn unset_type_changed_cb(&self, handle: ConnectionHandle) -> Result<()> {
        self.unset_change_cb(handle, EventKind::TypeChanged)
    }

    /// Be told when the default connection's addresses change.
    ///
    /// The callback receives the IPv4 and IPv6 address, either may be absent.
    pub fn set_ip_changed_cb<F>(&self, handle: ConnectionHandle, callback: F) -> Result<()>
    where
        F: Fn(Option<&str>, Option<&str>) + Send + Sync + 'static,
    {
        self.set_change_cb(
            handle,
            EventKind::IpChanged,
            Arc::new(move |event: &ChangeEvent| {
                if let ChangeEvent::Ip { ipv4, ipv6 } = event {
                    callback(ipv4.as_deref(), ipv6.as_deref());
                }
            }),
        )
    }

    pub fn unset_ip_changed_cb(&self, handle: ConnectionHandle) -> Result<()> {
        self.unset_change_cb(handle, EventKind::IpChanged)
    }

    /// Be told when the default connection's proxy changes.
    pub fn set_proxy_changed_cb<F>(&self, handle: ConnectionHandle, callback: F) -> Result<()>
    where
        F: Fn(Option<&str>, Option<&str>) + Send + Sync + 'static,
    {
        self.set_change_cb(
            handle,
            EventKind::ProxyChanged,
            Arc::new(move |event: &ChangeEvent| {
                if let ChangeEvent::Proxy { ipv4, ipv6 } = event {
                    callback(ipv4.as_deref(), ipv6.as_deref());
                }
            }),
        )
    }

    pub fn unset_proxy_changed_cb(&self, handle: ConnectionHandle) -> Result<()> {
        self.unset_change_cb(handle, EventKind::ProxyChanged)
    }

    fn set_change_cb(&self, handle: ConnectionHandle, kind: EventKind, callback: ChangeCallback) -> Result<()> {
        let mut state = self.lock();
        state.handles.ensure(handle)?;

        if state.handles.registrants(kind) == 0 {
            self.daemon()
                .subscribe(kind)
                .map_err(|e| Error::operation_failed(format!("subscribe {:?}", kind), e.to_string()))?;
            info!(kind = ?kind, "Daemon subscription installed");
        }

        let previous = state
            .handles
            .get_mut(handle)
            .and_then(|record| record.set_slot(kind, callback));
        drop(state);

        debug!(handle = %handle, kind = ?kind, replaced = previous.is_some(), "Change callback set");
        Ok(())
    }

    fn unset_change_cb(&self, handle: ConnectionHandle, kind: EventKind) -> Result<()> {
        let mut state = self.lock();
        state.handles.ensure(handle)?;
        let (released, unsubscribed) = self.clear_change_slot(&mut state, handle, kind);
        drop(state);

        debug!(handle = %handle, kind = ?kind, cleared = released.is_some(), "Change callback unset");
        drop(released);
        unsubscribed
    }

    /// Clear one slot, tearing down the subscription if it was the last of
    /// its kind. The slot is cleared even when unsubscribing fails; the
    /// removed callback is handed back so the caller drops it unlocked.
    pub(super) fn clear_change_slot(
        &self,
        state: &mut State,
        handle: ConnectionHandle,
        kind: EventKind,
    ) -> (Option<ChangeCallback>, Result<()>) {
        let has_slot = state
            .handles
            .get(handle)
            .is_some_and(|record| record.slot(kind).is_some());

        let unsubscribed = if has_slot && state.handles.registrants(kind) == 1 {
            let result = self.daemon().unsubscribe(kind);
            if result.is_ok() {
                info!(kind = ?kind, "Daemon subscription removed");
            }
            result
        } else {
            Ok(())
        };

        let callback = state
            .handles
            .get_mut(handle)
            .and_then(|record| record.take_slot(kind));

        let unsubscribed = unsubscribed
            .map_err(|e| Error::operation_failed(format!("unsubscribe {:?}", kind), e.to_string()));
        (callback, unsubscribed)
    }

    /// Deliver `event` to every handle holding a callback of `kind`.
    ///
    /// A handle that is destroyed or re-registers after the snapshot is
    /// skipped.
    pub(super) fn dispatch(&self, kind: EventKind, event: &ChangeEvent) {
        let recipients = self.lock().handles.recipients(kind);
        debug!(kind = ?kind, recipients = recipients.len(), "Dispatching change event");

        for (handle, callback) in recipients {
            let current = self
                .lock()
                .handles
                .get(handle)
                .and_then(|record| record.slot(kind))
                .is_some_and(|slot| Arc::ptr_eq(slot, &callback));
            if current {
                callback(event);
            }
        }
    }
}
