// Net Connection - Profile Iterator
// Copyright (C) 2026 Christos A. Daggas
// SPDX-License-Identifier: MIT

//! The single profile iterator slot.
//!
//! There is one snapshot per context. Fetching a new iterator resets it,
//! which invalidates the previous iterator and every [`SnapshotProfile`]
//! taken from it. Each reset draws a fresh generation; tokens carry the
//! generation they were issued under, so stale tokens (and tokens from
//! another context) are rejected instead of reading the new snapshot.

use tracing::debug;

use super::profiles::SnapshotProfile;
use super::{ConnectionContext, ConnectionHandle};
use crate::daemon::convert;
use crate::models::{Error, IteratorKind, Profile, Result};

/// Cursor over the snapshot taken by [`ConnectionContext::get_profile_iterator`].
#[derive(Debug, PartialEq, Eq)]
pub struct ProfileIterator {
    generation: u64,
}

#[derive(Debug, Default)]
pub(crate) struct IteratorSlot {
    generation: u64,
    profiles: Vec<Profile>,
    next_index: usize,
}

impl IteratorSlot {
    /// Drop the snapshot and invalidate outstanding tokens.
    pub(crate) fn reset(&mut self) {
        self.generation = super::next_token();
        self.profiles.clear();
        self.next_index = 0;
    }

    fn populate(&mut self, profiles: Vec<Profile>) -> u64 {
        self.reset();
        self.profiles = profiles;
        self.generation
    }

    fn is_current(&self, generation: u64) -> bool {
        generation == self.generation
    }

    pub(crate) fn get(&self, generation: u64, index: usize) -> Option<&Profile> {
        if self.is_current(generation) {
            self.profiles.get(index)
        } else {
            None
        }
    }
}

impl ConnectionContext {
    /// Snapshot the daemon's profiles and return a cursor over them.
    ///
    /// Any earlier iterator becomes invalid, whether or not it was
    /// exhausted. A daemon with no services yields an empty iterator.
    pub fn get_profile_iterator(&self, handle: ConnectionHandle, kind: IteratorKind) -> Result<ProfileIterator> {
        {
            let mut state = self.lock();
            state.handles.ensure(handle)?;
            state.iterator.reset();
        }

        let services = self.services_or_empty()?;
        let profiles: Vec<Profile> = services
            .iter()
            .filter(|s| kind == IteratorKind::Registered || s.state().is_connected())
            .filter_map(convert::profile_from_service)
            .collect();

        let mut state = self.lock();
        state.handles.ensure(handle)?;
        let count = profiles.len();
        let generation = state.iterator.populate(profiles);
        debug!(handle = %handle, kind = ?kind, count, "Profile iterator populated");
        Ok(ProfileIterator { generation })
    }

    /// Whether `iterator` has another profile; false for a stale iterator.
    pub fn iterator_has_next(&self, iterator: &ProfileIterator) -> bool {
        let state = self.lock();
        state.iterator.is_current(iterator.generation)
            && state.iterator.next_index < state.iterator.profiles.len()
    }

    /// Advance the cursor.
    pub fn iterator_next(&self, iterator: &ProfileIterator) -> Result<SnapshotProfile> {
        let mut state = self.lock();
        let slot = &mut state.iterator;
        if !slot.is_current(iterator.generation) {
            return Err(Error::InvalidIterator);
        }
        if slot.next_index >= slot.profiles.len() {
            return Err(Error::IteratorEnd);
        }

        let index = slot.next_index;
        slot.next_index += 1;
        Ok(SnapshotProfile {
            generation: slot.generation,
            index,
        })
    }

    /// Release the snapshot.
    pub fn destroy_profile_iterator(&self, iterator: ProfileIterator) -> Result<()> {
        let mut state = self.lock();
        if !state.iterator.is_current(iterator.generation) {
            return Err(Error::InvalidIterator);
        }
        state.iterator.reset();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::daemon::mock::{service, test_context, MockDaemon};
    use crate::models::ErrorCode;

    fn three_services() -> Vec<crate::daemon::ServiceRecord> {
        vec![
            service("/svc/wifi_1", "wifi", "home", "online"),
            service("/svc/eth_1", "ethernet", "wired", "idle"),
            service("/svc/bt_1", "bluetooth", "phone", "ready"),
        ]
    }

    #[test]
    fn test_iterator_exhaustion() {
        let daemon = MockDaemon::with_services(three_services());
        let ctx = test_context(&daemon);
        let h = ctx.create().unwrap();

        let iter = ctx.get_profile_iterator(h, IteratorKind::Registered).unwrap();
        let mut seen = Vec::new();
        for _ in 0..3 {
            assert!(ctx.iterator_has_next(&iter));
            seen.push(ctx.iterator_next(&iter).unwrap());
        }
        seen.dedup();
        assert_eq!(seen.len(), 3);
        assert!(!ctx.iterator_has_next(&iter));
        assert_eq!(ctx.iterator_next(&iter).unwrap_err().code(), ErrorCode::IteratorEnd);

        let names: Vec<_> = seen.iter().map(|p| ctx.profile_name(p).unwrap()).collect();
        assert_eq!(names, vec!["home", "wired", "phone"]);
    }

    #[test]
    fn test_connected_iterator_filters() {
        let daemon = MockDaemon::with_services(three_services());
        let ctx = test_context(&daemon);
        let h = ctx.create().unwrap();

        let iter = ctx.get_profile_iterator(h, IteratorKind::Connected).unwrap();
        let mut count = 0;
        while ctx.iterator_has_next(&iter) {
            ctx.iterator_next(&iter).unwrap();
            count += 1;
        }
        assert_eq!(count, 2);
    }

    #[test]
    fn test_reacquire_resets_snapshot() {
        let daemon = MockDaemon::with_services(three_services());
        let ctx = test_context(&daemon);
        let h = ctx.create().unwrap();

        let first = ctx.get_profile_iterator(h, IteratorKind::Registered).unwrap();
        let stale = ctx.iterator_next(&first).unwrap();

        daemon.state().services.truncate(2);
        let second = ctx.get_profile_iterator(h, IteratorKind::Registered).unwrap();

        assert!(!ctx.iterator_has_next(&first));
        assert_eq!(ctx.iterator_next(&first).unwrap_err().code(), ErrorCode::InvalidParameter);
        assert!(!ctx.check_profile_validity(&stale));

        let mut count = 0;
        while ctx.iterator_next(&second).is_ok() {
            count += 1;
        }
        assert_eq!(count, 2);
        assert!(ctx.destroy_profile_iterator(first).is_err());
        assert!(ctx.destroy_profile_iterator(second).is_ok());
    }

    #[test]
    fn test_no_service_yields_empty_iterator() {
        let daemon = MockDaemon::new();
        daemon.state().no_service = true;
        let ctx = test_context(&daemon);
        let h = ctx.create().unwrap();

        let iter = ctx.get_profile_iterator(h, IteratorKind::Registered).unwrap();
        assert!(!ctx.iterator_has_next(&iter));
        assert_eq!(ctx.iterator_next(&iter).unwrap_err().code(), ErrorCode::IteratorEnd);
    }

    #[test]
    fn test_query_failure_is_reported() {
        let daemon = MockDaemon::new();
        let ctx = test_context(&daemon);
        let h = ctx.create().unwrap();
        daemon.state().fail_services = true;

        let err = ctx.get_profile_iterator(h, IteratorKind::Registered).unwrap_err();
        assert_eq!(err.code(), ErrorCode::OperationFailed);
    }

    #[test]
    fn test_destroyed_iterator_invalidates_handles() {
        let daemon = MockDaemon::with_services(three_services());
        let ctx = test_context(&daemon);
        let h = ctx.create().unwrap();

        let iter = ctx.get_profile_iterator(h, IteratorKind::Registered).unwrap();
        let p = ctx.iterator_next(&iter).unwrap();
        assert!(ctx.check_profile_validity(&p));
        ctx.destroy_profile_iterator(iter).unwrap();
        assert!(!ctx.check_profile_validity(&p));
        assert_eq!(ctx.profile(&p).unwrap_err().code(), ErrorCode::InvalidParameter);
    }
}
