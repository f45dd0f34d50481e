// Net Connection - Daemon Session Lifecycle
// Copyright (C) 2026 Christos A. Daggas
// SPDX-License-Identifier: MIT

//! Daemon session tied to the number of live handles.

use tracing::{info, warn};

use super::profiles::StateCallbackTable;
use super::{ConnectionContext, State};
use crate::models::{Error, Result};

#[derive(Debug, Default)]
pub(super) struct Session {
    registered: bool,
}

impl Session {
    pub(super) fn is_registered(&self) -> bool {
        self.registered
    }
}

/// What a session teardown released; dropped once the lock is gone.
pub(super) struct Teardown {
    _state_callbacks: Option<StateCallbackTable>,
}

impl ConnectionContext {
    /// Connect to the daemon unless already connected.
    ///
    /// On failure nothing changes.
    pub(super) fn session_init(&self, state: &mut State) -> Result<()> {
        if state.session.is_registered() {
            return Ok(());
        }

        self.daemon().connect(self.event_sink()).map_err(|e| {
            warn!("Daemon session failed: {}", e);
            match e {
                Error::SessionFailed(_) => e,
                other => Error::SessionFailed(other.to_string()),
            }
        })?;

        state.session.registered = true;
        state.profiles.enable_state_callbacks();
        info!("Daemon session established");
        Ok(())
    }

    /// Disconnect and sweep everything scoped to the session.
    pub(super) fn session_deinit(&self, state: &mut State) -> Option<Teardown> {
        if !state.session.is_registered() {
            return None;
        }

        self.daemon().disconnect();
        state.session.registered = false;

        let state_callbacks = state.profiles.disable_state_callbacks();
        state.iterator.reset();
        let leaked = state.profiles.clear_standalone();
        if leaked > 0 {
            warn!(count = leaked, "Freed profile handles still alive at session end");
        }

        info!("Daemon session closed");
        Some(Teardown {
            _state_callbacks: state_callbacks,
        })
    }
}

#[cfg(test)]
mod tests {
    use crate::daemon::mock::{test_context, MockDaemon};
    use crate::models::{ErrorCode, ProfileType};
    use crate::registry::AsProfileKey;

    #[test]
    fn test_teardown_sweeps_standalone_profiles() {
        let daemon = MockDaemon::new();
        let ctx = test_context(&daemon);
        let h = ctx.create().unwrap();

        let profile = ctx.create_profile(ProfileType::Wifi, "cafe").unwrap();
        assert!(ctx.check_profile_validity(&profile));

        ctx.destroy(h).unwrap();
        assert!(!ctx.check_profile_validity(&profile));
        assert_eq!(
            ctx.destroy_profile(profile).unwrap_err().code(),
            ErrorCode::InvalidParameter
        );
    }

    #[test]
    fn test_teardown_drops_state_callbacks() {
        let daemon = MockDaemon::new();
        let ctx = test_context(&daemon);
        let h = ctx.create().unwrap();

        let profile = ctx.create_profile(ProfileType::Ethernet, "wired").unwrap();
        ctx.set_profile_state_changed_cb(&profile, |_| {}).unwrap();
        ctx.destroy(h).unwrap();

        // Without a session there is no table to register into.
        let profile = ctx.create_profile(ProfileType::Ethernet, "wired").unwrap();
        assert_eq!(
            ctx.set_profile_state_changed_cb(&profile, |_| {})
                .unwrap_err()
                .code(),
            ErrorCode::OperationFailed
        );
        assert!(matches!(profile.profile_key(), crate::registry::ProfileKey::Standalone(_)));
    }
}
