// Net Connection - Connection Registry
// Copyright (C) 2026 Christos A. Daggas
// SPDX-License-Identifier: MIT

//! # Connection Registry
//!
//! The in-process bookkeeping in front of the daemon:
//!
//! - **Handles**: live connection handles, validated on every call
//! - **Fan-out**: per-handle change callbacks multiplexed onto one
//!   daemon subscription per event kind
//! - **Profiles**: standalone profile handles and the state-callback table
//! - **Iterator**: the single snapshot cursor over the daemon's profiles
//! - **Session**: daemon connection opened with the first handle and
//!   closed with the last
//!
//! All state sits behind one mutex owned by the [`ConnectionContext`]. The
//! lock is never held while user callbacks run.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, Weak};

use tracing::{info, warn};

use crate::daemon::{ConnmanDaemon, Daemon, DaemonEvent, EventKind, EventSink};
use crate::models::{ClientConfig, Result};
use crate::storage::{JsonPreferenceStore, PreferenceStore};

mod fanout;
mod handles;
mod iterator;
mod profiles;
mod queries;
mod requests;
mod session;
mod statistics;

pub use fanout::ChangeEvent;
pub use handles::ConnectionHandle;
pub use iterator::ProfileIterator;
pub use profiles::{AsProfileKey, OwnedProfile, ProfileKey, SnapshotProfile};
pub use requests::RequestKind;

use handles::HandleRegistry;
use iterator::IteratorSlot;
use profiles::ProfileTracker;
use session::Session;

/// Source of every handle, profile key and snapshot generation.
///
/// Ids are unique across all contexts in the process, so a token issued by
/// one context never validates in another.
static NEXT_TOKEN: AtomicU64 = AtomicU64::new(1);

pub(crate) fn next_token() -> u64 {
    NEXT_TOKEN.fetch_add(1, Ordering::Relaxed)
}

/// Everything the context lock guards.
#[derive(Default)]
struct State {
    handles: HandleRegistry,
    session: Session,
    profiles: ProfileTracker,
    iterator: IteratorSlot,
}

struct Shared {
    daemon: Arc<dyn Daemon>,
    preferences: Arc<dyn PreferenceStore>,
    state: Mutex<State>,
}

/// Entry point of the API; cheap to clone, all clones share one registry.
#[derive(Clone)]
pub struct ConnectionContext {
    shared: Arc<Shared>,
}

impl ConnectionContext {
    /// Create a context over the given daemon and counter store.
    pub fn new(daemon: Arc<dyn Daemon>, preferences: Arc<dyn PreferenceStore>) -> Self {
        Self {
            shared: Arc::new(Shared {
                daemon,
                preferences,
                state: Mutex::new(State::default()),
            }),
        }
    }

    /// Create a context talking D-Bus and persisting counters to disk.
    pub fn from_config(config: &ClientConfig) -> Result<Self> {
        let daemon = ConnmanDaemon::new(config.clone())?;
        let preferences = JsonPreferenceStore::open(config.preference_path());
        Ok(Self::new(Arc::new(daemon), Arc::new(preferences)))
    }

    fn daemon(&self) -> &dyn Daemon {
        self.shared.daemon.as_ref()
    }

    /// Lock the registry, recovering from poison if needed.
    fn lock(&self) -> MutexGuard<'_, State> {
        match self.shared.state.lock() {
            Ok(guard) => guard,
            Err(poisoned) => {
                warn!("Registry mutex poisoned, recovering");
                poisoned.into_inner()
            }
        }
    }

    /// Sink handed to the daemon; it does not keep the context alive.
    fn event_sink(&self) -> EventSink {
        let weak: Weak<Shared> = Arc::downgrade(&self.shared);
        Arc::new(move |event| {
            if let Some(shared) = weak.upgrade() {
                ConnectionContext { shared }.handle_event(event);
            }
        })
    }

    fn handle_event(&self, event: DaemonEvent) {
        match event {
            DaemonEvent::DefaultServiceChanged { service_type } => {
                let connection_type = service_type
                    .as_deref()
                    .map(crate::models::ConnectionType::from_native)
                    .unwrap_or_default();
                self.dispatch(EventKind::TypeChanged, &ChangeEvent::Type(connection_type));
            }
            DaemonEvent::IpChanged { ipv4, ipv6 } => {
                self.dispatch(EventKind::IpChanged, &ChangeEvent::Ip { ipv4, ipv6 });
            }
            DaemonEvent::ProxyChanged { ipv4, ipv6 } => {
                self.dispatch(EventKind::ProxyChanged, &ChangeEvent::Proxy { ipv4, ipv6 });
            }
            DaemonEvent::ServiceStateChanged { identifier, state } => {
                self.dispatch_profile_state(&identifier, state.to_profile_state());
            }
        }
    }

    /// Register a new connection handle, opening the daemon session if it
    /// is the first one.
    pub fn create(&self) -> Result<ConnectionHandle> {
        let mut state = self.lock();
        self.session_init(&mut state)?;
        let handle = state.handles.insert();
        info!(handle = %handle, total = state.handles.len(), "Connection handle created");
        Ok(handle)
    }

    /// Unregister a handle; the last one closes the daemon session.
    pub fn destroy(&self, handle: ConnectionHandle) -> Result<()> {
        let mut state = self.lock();
        state.handles.ensure(handle)?;

        let mut released = Vec::new();
        for kind in EventKind::ALL {
            let (callback, unsubscribed) = self.clear_change_slot(&mut state, handle, kind);
            released.extend(callback);
            if let Err(e) = unsubscribed {
                warn!(handle = %handle, kind = ?kind, "Unsubscribe failed during destroy: {}", e);
            }
        }
        state.handles.remove(handle);
        let remaining = state.handles.len();

        let teardown = if state.handles.is_empty() {
            self.session_deinit(&mut state)
        } else {
            None
        };
        drop(state);

        info!(handle = %handle, remaining, "Connection handle destroyed");
        // User closures are dropped outside the lock.
        drop(released);
        drop(teardown);
        Ok(())
    }

    /// Whether `handle` is currently registered.
    pub fn is_registered(&self, handle: ConnectionHandle) -> bool {
        self.lock().handles.contains(handle)
    }

    /// Number of registered handles.
    pub fn handle_count(&self) -> usize {
        self.lock().handles.len()
    }
}
