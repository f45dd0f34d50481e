// Net Connection - Asynchronous Requests
// Copyright (C) 2026 Christos A. Daggas
// SPDX-License-Identifier: MIT

//! Open, close and set-default requests with completion callbacks.
//!
//! Each handle allows one outstanding request per [`RequestKind`]. The
//! completion is delivered outside the lock, and only if the handle that
//! issued the request is still registered.

use std::sync::{Arc, Weak};

use tracing::{debug, info, warn};

use super::profiles::AsProfileKey;
use super::{ConnectionContext, ConnectionHandle, Shared};
use crate::daemon::{Completion, Daemon};
use crate::models::{result_code, CellularServiceType, Error, ErrorCode, Result};

/// Asynchronous request kinds tracked per handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RequestKind {
    Open,
    Close,
    SetDefault,
}

impl RequestKind {
    pub(crate) fn index(&self) -> usize {
        match self {
            Self::Open => 0,
            Self::Close => 1,
            Self::SetDefault => 2,
        }
    }
}

type Initiate = fn(&dyn Daemon, &str, Completion) -> Result<()>;

impl ConnectionContext {
    /// Connect a profile; `callback` gets the outcome.
    pub fn open_profile<F>(&self, handle: ConnectionHandle, profile: &impl AsProfileKey, callback: F) -> Result<()>
    where
        F: FnOnce(ErrorCode) + Send + 'static,
    {
        let id = self.registered_id(handle, profile)?;
        self.start_request(handle, RequestKind::Open, id, Box::new(callback), |d, id, done| {
            d.open_service(id, done)
        })
    }

    /// Disconnect a profile; `callback` gets the outcome.
    pub fn close_profile<F>(&self, handle: ConnectionHandle, profile: &impl AsProfileKey, callback: F) -> Result<()>
    where
        F: FnOnce(ErrorCode) + Send + 'static,
    {
        let id = self.registered_id(handle, profile)?;
        self.start_request(handle, RequestKind::Close, id, Box::new(callback), |d, id, done| {
            d.close_service(id, done)
        })
    }

    /// Make a cellular profile the default for `service_type`.
    ///
    /// Only internet service types can be made default, and the profile
    /// must be of that type.
    pub fn set_default_cellular_service<F>(
        &self,
        handle: ConnectionHandle,
        service_type: CellularServiceType,
        profile: &impl AsProfileKey,
        callback: F,
    ) -> Result<()>
    where
        F: FnOnce(ErrorCode) + Send + 'static,
    {
        if !service_type.is_internet() {
            return Err(Error::invalid_parameter(format!(
                "{} cannot be a default service",
                service_type.as_native()
            )));
        }

        let id = self.registered_id(handle, profile)?;
        let matches = self
            .lock()
            .profile(profile)?
            .cellular()
            .is_some_and(|c| c.service_type == service_type);
        if !matches {
            return Err(Error::invalid_parameter(format!(
                "profile is not a {} cellular profile",
                service_type.as_native()
            )));
        }

        self.start_request(handle, RequestKind::SetDefault, id, Box::new(callback), |d, id, done| {
            d.set_default_cellular_service(id, done)
        })
    }

    fn start_request(
        &self,
        handle: ConnectionHandle,
        kind: RequestKind,
        identifier: String,
        callback: Box<dyn FnOnce(ErrorCode) + Send>,
        initiate: Initiate,
    ) -> Result<()> {
        {
            let mut state = self.lock();
            let record = state.handles.get_mut(handle).ok_or(Error::InvalidHandle)?;
            if record.is_pending(kind) {
                debug!(handle = %handle, kind = ?kind, "Request already pending");
                return Err(Error::NowInProgress(format!("{:?}", kind)));
            }
            record.set_pending(kind, true);
        }

        let weak = Arc::downgrade(&self.shared);
        let done: Completion = Box::new(move |result| finish_request(&weak, handle, kind, result, callback));

        if let Err(e) = initiate(self.daemon(), &identifier, done) {
            warn!(handle = %handle, kind = ?kind, "Request not started: {}", e);
            if let Some(record) = self.lock().handles.get_mut(handle) {
                record.set_pending(kind, false);
            }
            return Err(e);
        }

        info!(handle = %handle, kind = ?kind, profile = %identifier, "Request started");
        Ok(())
    }
}

fn finish_request(
    shared: &Weak<Shared>,
    handle: ConnectionHandle,
    kind: RequestKind,
    result: Result<()>,
    callback: Box<dyn FnOnce(ErrorCode) + Send>,
) {
    let Some(shared) = shared.upgrade() else {
        return;
    };
    let ctx = ConnectionContext { shared };

    let deliver = match ctx.lock().handles.get_mut(handle) {
        Some(record) => {
            record.set_pending(kind, false);
            true
        }
        None => false,
    };

    let code = result_code(&result);
    if deliver {
        debug!(handle = %handle, kind = ?kind, code = %code, "Request completed");
        callback(code);
    } else {
        debug!(handle = %handle, kind = ?kind, "Dropping completion for destroyed handle");
    }
}
