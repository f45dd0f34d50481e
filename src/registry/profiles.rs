// Net Connection - Profile Handle Tracker
// Copyright (C) 2026 Christos A. Daggas
// SPDX-License-Identifier: MIT

//! Profile handles and profile management.
//!
//! Two kinds of handle exist:
//! - [`OwnedProfile`]: standalone copies from create/clone/current/default
//!   lookups. Move-only; released with [`ConnectionContext::destroy_profile`].
//! - [`SnapshotProfile`]: entries of the iterator snapshot. `Copy`, never
//!   destroyed individually, invalid once the snapshot is reset.

use std::collections::HashMap;
use std::sync::Arc;

use tracing::{debug, info, warn};

use super::{ConnectionContext, ConnectionHandle, State};
use crate::daemon::convert;
use crate::models::validation::{validate_profile_name, validate_proxy_address};
use crate::models::{
    CellularServiceType, Error, IpConfigType, Profile, ProfileState, ProfileType, ProxyType,
    Result,
};

/// Standalone profile handle, owned by the caller.
#[derive(Debug, PartialEq, Eq, Hash)]
pub struct OwnedProfile {
    key: u64,
}

/// Profile handle borrowed from the iterator snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SnapshotProfile {
    pub(super) generation: u64,
    pub(super) index: usize,
}

/// Where a profile handle points.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProfileKey {
    Standalone(u64),
    Snapshot { generation: u64, index: usize },
}

/// Anything that names a profile.
pub trait AsProfileKey {
    fn profile_key(&self) -> ProfileKey;
}

impl AsProfileKey for OwnedProfile {
    fn profile_key(&self) -> ProfileKey {
        ProfileKey::Standalone(self.key)
    }
}

impl AsProfileKey for SnapshotProfile {
    fn profile_key(&self) -> ProfileKey {
        ProfileKey::Snapshot {
            generation: self.generation,
            index: self.index,
        }
    }
}

impl<T: AsProfileKey + ?Sized> AsProfileKey for &T {
    fn profile_key(&self) -> ProfileKey {
        (**self).profile_key()
    }
}

pub(crate) type ProfileStateCallback = Arc<dyn Fn(ProfileState) + Send + Sync>;

pub(crate) struct StateCallback {
    callback: ProfileStateCallback,
    last_state: ProfileState,
}

/// State callbacks keyed by profile identifier.
pub(crate) type StateCallbackTable = HashMap<String, StateCallback>;

#[derive(Default)]
pub(crate) struct ProfileTracker {
    standalone: Vec<(u64, Profile)>,
    /// Exists only while a daemon session is up.
    state_callbacks: Option<StateCallbackTable>,
}

impl ProfileTracker {
    pub(crate) fn insert(&mut self, profile: Profile) -> OwnedProfile {
        let key = super::next_token();
        self.standalone.push((key, profile));
        OwnedProfile { key }
    }

    pub(crate) fn remove(&mut self, key: u64) -> Option<Profile> {
        let pos = self.standalone.iter().position(|(k, _)| *k == key)?;
        Some(self.standalone.remove(pos).1)
    }

    pub(crate) fn get(&self, key: u64) -> Option<&Profile> {
        self.standalone.iter().find(|(k, _)| *k == key).map(|(_, p)| p)
    }

    pub(crate) fn get_mut(&mut self, key: u64) -> Option<&mut Profile> {
        self.standalone
            .iter_mut()
            .find(|(k, _)| *k == key)
            .map(|(_, p)| p)
    }

    /// Drop every standalone profile, returning how many there were.
    pub(crate) fn clear_standalone(&mut self) -> usize {
        let count = self.standalone.len();
        self.standalone.clear();
        count
    }

    pub(crate) fn enable_state_callbacks(&mut self) {
        self.state_callbacks.get_or_insert_with(HashMap::new);
    }

    pub(crate) fn disable_state_callbacks(&mut self) -> Option<StateCallbackTable> {
        self.state_callbacks.take()
    }

    fn set_state_callback(&mut self, id: &str, callback: ProfileStateCallback, state: ProfileState) -> Result<Option<StateCallback>> {
        let table = self.state_callbacks.as_mut().ok_or(Error::NoSession)?;
        Ok(table.insert(
            id.to_string(),
            StateCallback {
                callback,
                last_state: state,
            },
        ))
    }

    fn unset_state_callback(&mut self, id: &str) -> Option<StateCallback> {
        self.state_callbacks.as_mut()?.remove(id)
    }

    /// Move a state callback registration to a new identifier.
    fn rekey_state_callback(&mut self, old: &str, new: &str) {
        if let Some(table) = self.state_callbacks.as_mut() {
            if let Some(entry) = table.remove(old) {
                table.insert(new.to_string(), entry);
            }
        }
    }

    /// Record `state` for `id`; returns the callback if the state is new.
    fn observe_state(&mut self, id: &str, state: ProfileState) -> Option<ProfileStateCallback> {
        let entry = self.state_callbacks.as_mut()?.get_mut(id)?;
        if entry.last_state == state {
            return None;
        }
        entry.last_state = state;
        Some(Arc::clone(&entry.callback))
    }
}

impl State {
    /// Resolve a profile handle against both storage arenas.
    pub(super) fn profile(&self, profile: &impl AsProfileKey) -> Result<&Profile> {
        match profile.profile_key() {
            ProfileKey::Standalone(key) => self.profiles.get(key),
            ProfileKey::Snapshot { generation, index } => self.iterator.get(generation, index),
        }
        .ok_or(Error::InvalidProfile)
    }
}

impl ConnectionContext {
    /// Whether a profile handle still refers to a live profile.
    pub fn check_profile_validity(&self, profile: &impl AsProfileKey) -> bool {
        self.lock().profile(profile).is_ok()
    }

    /// Create a profile the daemon does not know about yet.
    ///
    /// `keyword` becomes the display name, and the ESSID for Wi-Fi.
    pub fn create_profile(&self, profile_type: ProfileType, keyword: &str) -> Result<OwnedProfile> {
        let keyword = validate_profile_name(keyword)?;
        let mut profile = Profile::new(profile_type, keyword.as_str());
        if let crate::models::ProfileDetails::Wifi(wifi) = &mut profile.details {
            wifi.essid = keyword;
        }

        let owned = self.lock().profiles.insert(profile);
        debug!(profile_type = ?profile_type, "Standalone profile created");
        Ok(owned)
    }

    /// Copy any valid profile into a new standalone handle.
    pub fn clone_profile(&self, profile: &impl AsProfileKey) -> Result<OwnedProfile> {
        let mut state = self.lock();
        let copy = state.profile(profile)?.clone();
        Ok(state.profiles.insert(copy))
    }

    /// Release a standalone profile.
    pub fn destroy_profile(&self, profile: OwnedProfile) -> Result<()> {
        self.lock()
            .profiles
            .remove(profile.key)
            .map(|_| ())
            .ok_or(Error::InvalidProfile)
    }

    /// A full copy of the profile data.
    pub fn profile(&self, profile: &impl AsProfileKey) -> Result<Profile> {
        self.lock().profile(profile).cloned()
    }

    pub fn profile_name(&self, profile: &impl AsProfileKey) -> Result<String> {
        self.lock().profile(profile).map(|p| p.name.clone())
    }

    pub fn profile_id(&self, profile: &impl AsProfileKey) -> Result<String> {
        self.lock().profile(profile).map(|p| p.id.clone())
    }

    pub fn profile_type(&self, profile: &impl AsProfileKey) -> Result<ProfileType> {
        self.lock().profile(profile).map(|p| p.profile_type)
    }

    pub fn profile_state(&self, profile: &impl AsProfileKey) -> Result<ProfileState> {
        self.lock().profile(profile).map(|p| p.state)
    }

    /// Edit a standalone profile locally.
    ///
    /// The closure works on a copy with the lock released; the copy is
    /// checked and written back only if the closure succeeds. Identity
    /// fields cannot be changed this way.
    pub fn update_profile_data<F>(&self, profile: &mut OwnedProfile, edit: F) -> Result<()>
    where
        F: FnOnce(&mut Profile) -> Result<()>,
    {
        let original = self.lock().profile(&*profile)?.clone();

        let mut edited = original.clone();
        edit(&mut edited)?;
        edited.id = original.id;
        edited.profile_type = original.profile_type;
        validate_profile(&edited)?;

        let mut state = self.lock();
        let slot = state.profiles.get_mut(profile.key).ok_or(Error::InvalidProfile)?;
        *slot = edited;
        Ok(())
    }

    /// Be told when a profile's connection state changes.
    ///
    /// Registrations are keyed by profile identifier, so clones of one
    /// profile share a single slot. Repeats of the last seen state are
    /// not reported.
    pub fn set_profile_state_changed_cb<F>(&self, profile: &impl AsProfileKey, callback: F) -> Result<()>
    where
        F: Fn(ProfileState) + Send + Sync + 'static,
    {
        let mut state = self.lock();
        let (id, current) = state.profile(profile).map(|p| (p.id.clone(), p.state))?;
        let previous = state
            .profiles
            .set_state_callback(&id, Arc::new(callback), current)
            .map_err(|e| Error::operation_failed("set profile state callback", e.to_string()))?;
        drop(state);

        debug!(profile = %id, replaced = previous.is_some(), "Profile state callback set");
        Ok(())
    }

    pub fn unset_profile_state_changed_cb(&self, profile: &impl AsProfileKey) -> Result<()> {
        let mut state = self.lock();
        let id = state.profile(profile)?.id.clone();
        let removed = state.profiles.unset_state_callback(&id);
        drop(state);

        match removed {
            Some(_) => Ok(()),
            None => Err(Error::invalid_parameter(format!(
                "no state callback registered for {}",
                id
            ))),
        }
    }

    pub(super) fn dispatch_profile_state(&self, id: &str, new_state: ProfileState) {
        let callback = self.lock().profiles.observe_state(id, new_state);
        if let Some(callback) = callback {
            debug!(profile = %id, state = new_state.as_str(), "Profile state changed");
            callback(new_state);
        }
    }

    /// The profile behind the default connection.
    pub fn get_current_profile(&self, handle: ConnectionHandle) -> Result<OwnedProfile> {
        self.lock().handles.ensure(handle)?;

        let services = self.services_or_empty()?;
        let profile = convert::default_service(&services)
            .and_then(convert::profile_from_service)
            .ok_or(Error::NoConnection)?;

        Ok(self.lock().profiles.insert(profile))
    }

    /// The first cellular profile of `service_type`.
    pub fn get_default_cellular_service_profile(
        &self,
        handle: ConnectionHandle,
        service_type: CellularServiceType,
    ) -> Result<OwnedProfile> {
        self.lock().handles.ensure(handle)?;

        let services = self.services_or_empty()?;
        let profile = services
            .iter()
            .filter_map(convert::profile_from_service)
            .find(|p| p.cellular().is_some_and(|c| c.service_type == service_type))
            .ok_or_else(|| {
                Error::operation_failed(
                    "default cellular profile",
                    format!("no {} service", service_type.as_native()),
                )
            })?;

        Ok(self.lock().profiles.insert(profile))
    }

    /// Register a new cellular profile with the daemon.
    pub fn add_profile(&self, handle: ConnectionHandle, profile: &OwnedProfile) -> Result<()> {
        let data = {
            let state = self.lock();
            state.handles.ensure(handle)?;
            state.profile(profile)?.clone()
        };

        let Some(cellular) = data.cellular() else {
            return Err(Error::NotSupported(format!(
                "adding {:?} profiles",
                data.profile_type
            )));
        };
        if cellular.apn.is_empty() {
            return Err(Error::invalid_parameter("cellular profile needs an APN"));
        }

        let services = self.services_or_empty()?;
        if services.iter().any(|s| s.identifier == data.id) {
            return Err(Error::AlreadyExists(data.id.clone()));
        }

        let mut properties = convert::cellular_configuration(cellular);
        properties.insert(
            "Name".to_string(),
            crate::daemon::PropertyValue::str(data.name.as_str()),
        );
        let id = self.daemon().add_cellular_service(properties)?;
        info!(profile = %id, "Cellular profile added");

        // The standalone copy now names the registered service, and any
        // state callback follows it.
        let mut state = self.lock();
        if let Some(stored) = state.profiles.get_mut(profile.key) {
            stored.id = id.clone();
        }
        state.profiles.rekey_state_callback(&data.id, &id);
        Ok(())
    }

    /// Ask the daemon to forget a profile.
    pub fn remove_profile(&self, handle: ConnectionHandle, profile: &impl AsProfileKey) -> Result<()> {
        let id = self.registered_id(handle, profile)?;
        self.daemon().remove_service(&id)?;
        info!(profile = %id, "Profile removed");
        Ok(())
    }

    /// Push a profile's configuration to the daemon.
    pub fn update_profile(&self, handle: ConnectionHandle, profile: &impl AsProfileKey) -> Result<()> {
        let data = {
            let state = self.lock();
            state.handles.ensure(handle)?;
            state.profile(profile)?.clone()
        };
        if data.is_local() {
            return Err(Error::invalid_parameter("profile is not registered with the daemon"));
        }

        for (name, value) in convert::configuration_properties(&data) {
            self.daemon().set_service_property(&data.id, name, value)?;
        }
        info!(profile = %data.id, "Profile updated");
        Ok(())
    }

    /// Identifier of a daemon-known profile, after validating both handles.
    pub(super) fn registered_id(&self, handle: ConnectionHandle, profile: &impl AsProfileKey) -> Result<String> {
        let state = self.lock();
        state.handles.ensure(handle)?;
        let profile = state.profile(profile)?;
        if profile.is_local() {
            return Err(Error::invalid_parameter("profile is not registered with the daemon"));
        }
        Ok(profile.id.clone())
    }

    /// Daemon services; "no service" counts as an empty list.
    pub(super) fn services_or_empty(&self) -> Result<Vec<crate::daemon::ServiceRecord>> {
        match self.daemon().services() {
            Ok(services) => Ok(services),
            Err(Error::NoService) => Ok(Vec::new()),
            Err(e) => {
                warn!("Service query failed: {}", e);
                Err(e)
            }
        }
    }
}

/// Field checks applied after a local edit.
fn validate_profile(profile: &Profile) -> Result<()> {
    validate_profile_name(&profile.name)?;

    for family in [crate::models::AddressFamily::Ipv4, crate::models::AddressFamily::Ipv6] {
        let config = profile.ip_config(family);
        if config.config_type == IpConfigType::Static && config.address.is_none() {
            return Err(Error::invalid_parameter(format!(
                "static {:?} configuration needs an address",
                family
            )));
        }
    }

    if profile.proxy.proxy_type == ProxyType::Manual {
        match &profile.proxy.address {
            Some(address) => validate_proxy_address(address)?,
            None => return Err(Error::invalid_parameter("manual proxy needs an address")),
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    use super::*;
    use crate::daemon::mock::{cellular_service, service, test_context, MockDaemon};
    use crate::daemon::{DaemonEvent, ServiceState};
    use crate::models::{AddressFamily, ErrorCode, IteratorKind};

    #[test]
    fn test_standalone_lifecycle() {
        let daemon = MockDaemon::new();
        let ctx = test_context(&daemon);
        let _h = ctx.create().unwrap();

        let profile = ctx.create_profile(ProfileType::Wifi, "cafe").unwrap();
        assert_eq!(ctx.profile_name(&profile).unwrap(), "cafe");
        assert_eq!(ctx.profile(&profile).unwrap().wifi().unwrap().essid, "cafe");

        let copy = ctx.clone_profile(&profile).unwrap();
        assert_ne!(copy, profile);
        assert_eq!(ctx.profile_id(&copy).unwrap(), ctx.profile_id(&profile).unwrap());

        ctx.destroy_profile(profile).unwrap();
        assert!(ctx.check_profile_validity(&copy));
        ctx.destroy_profile(copy).unwrap();
    }

    #[test]
    fn test_create_profile_rejects_empty_keyword() {
        let daemon = MockDaemon::new();
        let ctx = test_context(&daemon);
        assert_eq!(
            ctx.create_profile(ProfileType::Cellular, "  ").unwrap_err().code(),
            ErrorCode::InvalidParameter
        );
    }

    #[test]
    fn test_clone_from_snapshot_outlives_iterator() {
        let daemon = MockDaemon::with_services(vec![service("/svc/wifi_1", "wifi", "home", "online")]);
        let ctx = test_context(&daemon);
        let h = ctx.create().unwrap();

        let iter = ctx.get_profile_iterator(h, IteratorKind::Registered).unwrap();
        let snapshot = ctx.iterator_next(&iter).unwrap();
        let owned = ctx.clone_profile(&snapshot).unwrap();
        ctx.destroy_profile_iterator(iter).unwrap();

        assert!(!ctx.check_profile_validity(&snapshot));
        assert_eq!(ctx.profile_name(&owned).unwrap(), "home");
        assert_eq!(ctx.profile_state(&owned).unwrap(), ProfileState::Connected);
    }

    #[test]
    fn test_update_profile_data_validates() {
        let daemon = MockDaemon::new();
        let ctx = test_context(&daemon);
        let mut profile = ctx.create_profile(ProfileType::Ethernet, "wired").unwrap();

        ctx.update_profile_data(&mut profile, |p| {
            p.set_ip_config_type(AddressFamily::Ipv4, IpConfigType::Static);
            p.set_ip_address(AddressFamily::Ipv4, "10.1.1.5")
        })
        .unwrap();
        assert_eq!(
            ctx.profile(&profile).unwrap().ipv4.address.as_deref(),
            Some("10.1.1.5")
        );

        let err = ctx
            .update_profile_data(&mut profile, |p| {
                p.set_ip_config_type(AddressFamily::Ipv6, IpConfigType::Static);
                Ok(())
            })
            .unwrap_err();
        assert_eq!(err.code(), ErrorCode::InvalidParameter);
        assert_eq!(
            ctx.profile(&profile).unwrap().ipv6.config_type,
            IpConfigType::None
        );

        let err = ctx
            .update_profile_data(&mut profile, |p| p.set_ip_address(AddressFamily::Ipv4, "bogus"))
            .unwrap_err();
        assert_eq!(err.code(), ErrorCode::InvalidParameter);
    }

    #[test]
    fn test_update_profile_data_keeps_identity() {
        let daemon = MockDaemon::new();
        let ctx = test_context(&daemon);
        let mut profile = ctx.create_profile(ProfileType::Cellular, "Internet").unwrap();
        let id = ctx.profile_id(&profile).unwrap();

        ctx.update_profile_data(&mut profile, |p| {
            p.id = "/stolen".to_string();
            p.cellular_mut().unwrap().apn = "internet.example".to_string();
            Ok(())
        })
        .unwrap();

        let data = ctx.profile(&profile).unwrap();
        assert_eq!(data.id, id);
        assert_eq!(data.cellular().unwrap().apn, "internet.example");
    }

    #[test]
    fn test_state_callback_deduplicates() {
        let daemon = MockDaemon::with_services(vec![service("/svc/eth", "ethernet", "wired", "idle")]);
        let ctx = test_context(&daemon);
        let h = ctx.create().unwrap();
        let calls = Arc::new(Mutex::new(Vec::new()));

        let iter = ctx.get_profile_iterator(h, IteratorKind::Registered).unwrap();
        let p = ctx.iterator_next(&iter).unwrap();
        let seen = Arc::clone(&calls);
        ctx.set_profile_state_changed_cb(&p, move |s| seen.lock().unwrap().push(s))
            .unwrap();

        for state in [ServiceState::Online, ServiceState::Online, ServiceState::Idle] {
            daemon.emit(DaemonEvent::ServiceStateChanged {
                identifier: "/svc/eth".into(),
                state,
            });
        }

        assert_eq!(
            *calls.lock().unwrap(),
            vec![ProfileState::Connected, ProfileState::Disconnected]
        );
    }

    #[test]
    fn test_state_callback_is_keyed_by_identifier() {
        let daemon = MockDaemon::with_services(vec![service("/svc/eth", "ethernet", "wired", "idle")]);
        let ctx = test_context(&daemon);
        let h = ctx.create().unwrap();
        let calls = Arc::new(AtomicUsize::new(0));

        let original = ctx.get_current_profile(h);
        assert_eq!(original.unwrap_err().code(), ErrorCode::NoConnection);

        let iter = ctx.get_profile_iterator(h, IteratorKind::Registered).unwrap();
        let snapshot = ctx.iterator_next(&iter).unwrap();
        let clone = ctx.clone_profile(&snapshot).unwrap();

        let count = Arc::clone(&calls);
        ctx.set_profile_state_changed_cb(&snapshot, move |_| {
            count.fetch_add(1, Ordering::SeqCst);
        })
        .unwrap();
        // Unsetting through the clone clears the shared registration.
        ctx.unset_profile_state_changed_cb(&clone).unwrap();
        assert!(ctx.unset_profile_state_changed_cb(&clone).is_err());

        daemon.emit(DaemonEvent::ServiceStateChanged {
            identifier: "/svc/eth".into(),
            state: ServiceState::Ready,
        });
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_current_and_default_cellular_profiles() {
        let daemon = MockDaemon::with_services(vec![
            cellular_service("/svc/cell_mms", "MMS", "idle", "mms"),
            cellular_service("/svc/cell_inet", "Internet", "online", "internet"),
        ]);
        let ctx = test_context(&daemon);
        let h = ctx.create().unwrap();

        let current = ctx.get_current_profile(h).unwrap();
        assert_eq!(ctx.profile_id(&current).unwrap(), "/svc/cell_inet");

        let mms = ctx
            .get_default_cellular_service_profile(h, CellularServiceType::Mms)
            .unwrap();
        assert_eq!(ctx.profile_name(&mms).unwrap(), "MMS");

        let err = ctx
            .get_default_cellular_service_profile(h, CellularServiceType::Tethering)
            .unwrap_err();
        assert_eq!(err.code(), ErrorCode::OperationFailed);
    }

    #[test]
    fn test_add_profile() {
        let daemon = MockDaemon::new();
        let ctx = test_context(&daemon);
        let h = ctx.create().unwrap();

        let wifi = ctx.create_profile(ProfileType::Wifi, "cafe").unwrap();
        assert_eq!(ctx.add_profile(h, &wifi).unwrap_err().code(), ErrorCode::NotSupported);

        let mut cell = ctx.create_profile(ProfileType::Cellular, "Internet").unwrap();
        assert_eq!(ctx.add_profile(h, &cell).unwrap_err().code(), ErrorCode::InvalidParameter);

        ctx.update_profile_data(&mut cell, |p| {
            p.cellular_mut().unwrap().apn = "internet".into();
            Ok(())
        })
        .unwrap();
        ctx.add_profile(h, &cell).unwrap();

        let added = daemon.state().added.clone();
        assert_eq!(added.len(), 1);
        assert_eq!(added[0].get("APN").and_then(|v| v.as_str()), Some("internet"));
        assert!(!ctx.profile(&cell).unwrap().is_local());
    }

    #[test]
    fn test_state_callback_follows_added_profile() {
        let daemon = MockDaemon::new();
        let ctx = test_context(&daemon);
        let h = ctx.create().unwrap();
        let calls = Arc::new(AtomicUsize::new(0));

        let mut cell = ctx.create_profile(ProfileType::Cellular, "Internet").unwrap();
        ctx.update_profile_data(&mut cell, |p| {
            p.cellular_mut().unwrap().apn = "internet".into();
            Ok(())
        })
        .unwrap();
        let count = Arc::clone(&calls);
        ctx.set_profile_state_changed_cb(&cell, move |_| {
            count.fetch_add(1, Ordering::SeqCst);
        })
        .unwrap();

        ctx.add_profile(h, &cell).unwrap();
        let id = ctx.profile_id(&cell).unwrap();
        assert_eq!(id, "/svc/cell_added_1");

        daemon.emit(DaemonEvent::ServiceStateChanged {
            identifier: id,
            state: ServiceState::Online,
        });
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(ctx.unset_profile_state_changed_cb(&cell).is_ok());
    }

    #[test]
    fn test_add_existing_profile_rejected() {
        let daemon = MockDaemon::with_services(vec![cellular_service(
            "/svc/cell_inet",
            "Internet",
            "idle",
            "internet",
        )]);
        let ctx = test_context(&daemon);
        let h = ctx.create().unwrap();

        let existing = ctx
            .get_default_cellular_service_profile(h, CellularServiceType::Internet)
            .unwrap();
        assert_eq!(
            ctx.add_profile(h, &existing).unwrap_err().code(),
            ErrorCode::AlreadyExists
        );
    }

    #[test]
    fn test_remove_and_update_profile() {
        let daemon = MockDaemon::with_services(vec![service("/svc/wifi_1", "wifi", "home", "idle")]);
        let ctx = test_context(&daemon);
        let h = ctx.create().unwrap();

        let iter = ctx.get_profile_iterator(h, IteratorKind::Registered).unwrap();
        let p = ctx.iterator_next(&iter).unwrap();
        ctx.update_profile(h, &p).unwrap();
        ctx.remove_profile(h, &p).unwrap();

        let state = daemon.state();
        assert_eq!(state.removed, vec!["/svc/wifi_1".to_string()]);
        assert!(state
            .properties
            .iter()
            .any(|(id, name, _)| id == "/svc/wifi_1" && name == "IPv4.Configuration"));
        drop(state);

        let local = ctx.create_profile(ProfileType::Wifi, "new").unwrap();
        assert_eq!(
            ctx.remove_profile(h, &local).unwrap_err().code(),
            ErrorCode::InvalidParameter
        );
    }
}
